use serde_json::json;

use crate::common::{MAX_BLOB_SIZE, TestApp, routes};

mod upload {
    use super::*;

    #[tokio::test]
    async fn owner_is_the_uploader() {
        let app = TestApp::spawn().await;
        let (token, alice) = app.create_authenticated_user("alice").await;

        let res = app
            .upload_with_token(
                "report.pdf",
                b"%PDF-1.7".to_vec(),
                Some("application/pdf"),
                Some("Quarterly numbers"),
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["name"], "report.pdf");
        assert_eq!(res.body["content_type"], "application/pdf");
        assert_eq!(res.body["description"], "Quarterly numbers");
        assert_eq!(res.body["size"], 8);
        assert_eq!(res.body["owner"]["id"], alice.as_str());
        assert_eq!(res.body["owner"]["username"], "alice");
        assert!(res.body["contributors"].as_array().unwrap().is_empty());
        assert_eq!(app.blobs.blob_count(), 1);
    }

    #[tokio::test]
    async fn content_type_is_guessed_from_the_name() {
        let app = TestApp::spawn().await;
        let (token, _) = app.create_authenticated_user("alice").await;

        let res = app
            .upload_with_token("notes.txt", b"hi".to_vec(), None, None, &token)
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["content_type"], "text/plain");
        assert!(res.body["description"].is_null());
    }

    #[tokio::test]
    async fn unknown_content_type_is_rejected() {
        let app = TestApp::spawn().await;
        let (token, _) = app.create_authenticated_user("alice").await;

        let res = app
            .upload_with_token("blob.zzqx", b"hi".to_vec(), None, None, &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(app.blobs.blob_count(), 0);
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let app = TestApp::spawn().await;
        let (token, _) = app.create_authenticated_user("alice").await;

        let res = app
            .upload_with_token(
                "big.txt",
                vec![b'x'; MAX_BLOB_SIZE as usize + 1],
                None,
                None,
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(app.blobs.blob_count(), 0);
    }

    #[tokio::test]
    async fn path_like_names_are_rejected() {
        let app = TestApp::spawn().await;
        let (token, _) = app.create_authenticated_user("alice").await;

        let res = app
            .upload_with_token("..", b"hi".to_vec(), Some("text/plain"), None, &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod access {
    use super::*;

    #[tokio::test]
    async fn strangers_cannot_read() {
        let app = TestApp::spawn().await;
        let (alice, _) = app.create_authenticated_user("alice").await;
        let (carol, _) = app.create_authenticated_user("carol").await;
        let file = app.create_file(&alice, "a.txt").await;

        let res = app.get_with_token(&routes::file(&file), &carol).await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");

        let res = app.get_with_token(&routes::file_download(&file), &carol).await;
        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found_for_everyone() {
        let app = TestApp::spawn().await;
        let (carol, _) = app.create_authenticated_user("carol").await;
        let missing = uuid::Uuid::now_v7().to_string();

        for res in [
            app.get_with_token(&routes::file(&missing), &carol).await,
            app.patch_with_token(&routes::file(&missing), &json!({"name": "x.txt"}), &carol)
                .await,
            app.delete_with_token(&routes::file(&missing), &carol).await,
        ] {
            assert_eq!(res.status, 404);
            assert_eq!(res.body["code"], "NOT_FOUND");
        }
    }

    #[tokio::test]
    async fn contributors_of_either_level_can_read_and_download() {
        let app = TestApp::spawn().await;
        let (alice, _) = app.create_authenticated_user("alice").await;
        let (bob, bob_id) = app.create_authenticated_user("bob").await;
        let file = app.create_file(&alice, "a.txt").await;
        app.add_contributor(&alice, &file, &bob_id, "read_only").await;

        let res = app.get_with_token(&routes::file(&file), &bob).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["contributors"][0]["user"]["username"], "bob");

        let res = app.get_with_token(&routes::file_download(&file), &bob).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.text, "hello world");
    }
}

mod listing {
    use super::*;

    fn names(body: &serde_json::Value) -> Vec<String> {
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["name"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn scopes_split_owned_and_shared() {
        let app = TestApp::spawn().await;
        let (alice, _) = app.create_authenticated_user("alice").await;
        let (bob, bob_id) = app.create_authenticated_user("bob").await;
        let shared = app.create_file(&alice, "shared.txt").await;
        app.create_file(&alice, "private.txt").await;
        app.create_file(&bob, "own.txt").await;
        app.add_contributor(&alice, &shared, &bob_id, "read_only").await;

        let owned = app.get_with_token(routes::FILES, &bob).await;
        assert_eq!(owned.status, 200);
        assert_eq!(names(&owned.body), vec!["own.txt"]);
        assert_eq!(owned.body["total"], 1);

        let res = app
            .get_with_token(&format!("{}?scope=shared", routes::FILES), &bob)
            .await;
        assert_eq!(names(&res.body), vec!["shared.txt"]);

        let res = app
            .get_with_token(&format!("{}?scope=accessible", routes::FILES), &bob)
            .await;
        assert_eq!(names(&res.body), vec!["shared.txt", "own.txt"]);
    }

    #[tokio::test]
    async fn unknown_scope_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let (alice, _) = app.create_authenticated_user("alice").await;

        let res = app
            .get_with_token(&format!("{}?scope=everything", routes::FILES), &alice)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod metadata {
    use super::*;

    #[tokio::test]
    async fn owner_field_is_ignored() {
        let app = TestApp::spawn().await;
        let (alice, alice_id) = app.create_authenticated_user("alice").await;
        let (_, bob_id) = app.create_authenticated_user("bob").await;
        let file = app.create_file(&alice, "a.txt").await;

        let res = app
            .patch_with_token(
                &routes::file(&file),
                &json!({"name": "renamed.txt", "owner": bob_id}),
                &alice,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["name"], "renamed.txt");
        assert_eq!(res.body["owner"]["id"], alice_id.as_str());
    }

    #[tokio::test]
    async fn description_can_be_cleared() {
        let app = TestApp::spawn().await;
        let (alice, _) = app.create_authenticated_user("alice").await;
        let res = app
            .upload_with_token("a.txt", b"x".to_vec(), None, Some("draft"), &alice)
            .await;
        let file = res.id();

        let res = app
            .patch_with_token(&routes::file(&file), &json!({"name": "b.txt"}), &alice)
            .await;
        assert_eq!(res.body["description"], "draft");

        let res = app
            .patch_with_token(&routes::file(&file), &json!({"description": null}), &alice)
            .await;
        assert_eq!(res.status, 200);
        assert!(res.body["description"].is_null());
        assert_eq!(res.body["name"], "b.txt");
    }

    #[tokio::test]
    async fn read_only_contributor_cannot_edit() {
        let app = TestApp::spawn().await;
        let (alice, _) = app.create_authenticated_user("alice").await;
        let (bob, bob_id) = app.create_authenticated_user("bob").await;
        let file = app.create_file(&alice, "a.txt").await;
        app.add_contributor(&alice, &file, &bob_id, "read_only").await;

        let res = app
            .patch_with_token(&routes::file(&file), &json!({"description": "mine"}), &bob)
            .await;

        assert_eq!(res.status, 403);
        let res = app.get_with_token(&routes::file(&file), &alice).await;
        assert!(res.body["description"].is_null());
    }

    #[tokio::test]
    async fn invalid_name_is_rejected() {
        let app = TestApp::spawn().await;
        let (alice, _) = app.create_authenticated_user("alice").await;
        let file = app.create_file(&alice, "a.txt").await;

        let res = app
            .patch_with_token(&routes::file(&file), &json!({"name": "dir/a.txt"}), &alice)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod download {
    use super::*;

    #[tokio::test]
    async fn streams_bytes_with_attachment_headers() {
        let app = TestApp::spawn().await;
        let (alice, _) = app.create_authenticated_user("alice").await;
        let res = app
            .upload_with_token("data.csv", b"a,b\n1,2\n".to_vec(), Some("text/csv"), None, &alice)
            .await;
        let file = res.id();

        let res = app.get_with_token(&routes::file_download(&file), &alice).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.text, "a,b\n1,2\n");
        assert_eq!(res.header("content-type"), Some("text/csv"));
        assert_eq!(res.header("content-length"), Some("8"));
        let disposition = res.header("content-disposition").unwrap();
        assert!(disposition.starts_with("attachment;"), "{disposition}");
        assert!(disposition.contains("data.csv"));
    }
}

mod deletion {
    use super::*;

    #[tokio::test]
    async fn read_write_contributor_edits_but_only_owner_deletes() {
        let app = TestApp::spawn().await;
        let (alice, _) = app.create_authenticated_user("alice").await;
        let (bob, bob_id) = app.create_authenticated_user("bob").await;
        let file = app.create_file(&alice, "f1.txt").await;
        app.add_contributor(&alice, &file, &bob_id, "read_write").await;

        let res = app
            .patch_with_token(&routes::file(&file), &json!({"description": "edited"}), &bob)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["description"], "edited");

        let res = app.delete_with_token(&routes::file(&file), &bob).await;
        assert_eq!(res.status, 403);
        assert_eq!(app.blobs.blob_count(), 1);

        let res = app.delete_with_token(&routes::file(&file), &alice).await;
        assert_eq!(res.status, 204);
        assert_eq!(app.blobs.blob_count(), 0);

        let res = app.get_with_token(&routes::file(&file), &alice).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn blob_store_outage_keeps_the_metadata() {
        let app = TestApp::spawn().await;
        let (alice, _) = app.create_authenticated_user("alice").await;
        let file = app.create_file(&alice, "f1.txt").await;

        app.blobs.fail_deletes(true);
        let res = app.delete_with_token(&routes::file(&file), &alice).await;
        assert_eq!(res.status, 502);
        assert_eq!(res.body["code"], "STORAGE_UNAVAILABLE");

        let res = app.get_with_token(&routes::file(&file), &alice).await;
        assert_eq!(res.status, 200);
        assert_eq!(app.blobs.blob_count(), 1);

        app.blobs.fail_deletes(false);
        let res = app.delete_with_token(&routes::file(&file), &alice).await;
        assert_eq!(res.status, 204);
        assert_eq!(app.blobs.blob_count(), 0);
    }
}
