//! The same store contract and HTTP flows as the in-memory suites, run
//! against a real Postgres database.

mod store {
    use chrono::Utc;
    use uuid::Uuid;

    use sharebox::records::{Contributor, FileRecord, Label, PermissionLevel, UserRecord};
    use sharebox::store::{FileStore, LabelStore, SeaOrmStore, StoreError, UserStore};

    use crate::common::fresh_database;

    async fn store() -> SeaOrmStore {
        let (_, db) = fresh_database().await;
        SeaOrmStore::new(db)
    }

    async fn user(store: &SeaOrmStore, name: &str) -> Uuid {
        store
            .insert_user(UserRecord {
                id: Uuid::now_v7(),
                username: name.into(),
                password_hash: "x".into(),
                created_at: Utc::now(),
            })
            .await
            .unwrap()
            .id
    }

    async fn file(store: &SeaOrmStore, owner: Uuid, contributors: Vec<Contributor>) -> Uuid {
        let now = Utc::now();
        store
            .insert_file(FileRecord {
                id: Uuid::now_v7(),
                url: "memory://k".into(),
                name: "a.txt".into(),
                content_type: "text/plain".into(),
                description: None,
                blob_key: "k".into(),
                size: 1,
                owner,
                contributors,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap()
            .id
    }

    async fn label(store: &SeaOrmStore, owner: Uuid, name: &str) -> Uuid {
        let now = Utc::now();
        store
            .insert_label(Label {
                id: Uuid::now_v7(),
                owner,
                name: name.into(),
                color: "red".into(),
                files: vec![],
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap()
            .id
    }

    fn ids<T>(items: &[T], id: impl Fn(&T) -> Uuid) -> Vec<Uuid> {
        items.iter().map(id).collect()
    }

    #[tokio::test]
    async fn duplicate_username_is_reported() {
        let store = store().await;
        user(&store, "alice").await;

        let err = store
            .insert_user(UserRecord {
                id: Uuid::now_v7(),
                username: "alice".into(),
                password_hash: "y".into(),
                created_at: Utc::now(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UsernameTaken));
    }

    #[tokio::test]
    async fn search_treats_wildcards_literally() {
        let store = store().await;
        for name in ["a_c", "abc", "x%y", "Alice"] {
            user(&store, name).await;
        }

        let names = |found: Vec<UserRecord>| {
            let mut names: Vec<String> = found.into_iter().map(|u| u.username).collect();
            names.sort();
            names
        };

        assert_eq!(names(store.search_users("_", 10).await.unwrap()), vec!["a_c"]);
        assert_eq!(names(store.search_users("%", 10).await.unwrap()), vec!["x%y"]);
        assert_eq!(names(store.search_users("ALI", 10).await.unwrap()), vec!["Alice"]);
        assert_eq!(store.search_users("a", 2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn shared_listing_follows_contributor_entries() {
        let store = store().await;
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let carol = user(&store, "carol").await;

        let for_bob = file(&store, alice, vec![Contributor::new(bob, PermissionLevel::ReadOnly)]).await;
        let for_carol = file(&store, alice, vec![Contributor::new(carol, PermissionLevel::ReadWrite)]).await;
        file(&store, bob, vec![]).await;

        let shared = store.files_shared_with(bob).await.unwrap();
        assert_eq!(ids(&shared, |f| f.id), vec![for_bob]);
        assert_eq!(shared[0].contributors[0].user, bob);
        assert!(store.files_shared_with(alice).await.unwrap().is_empty());

        let mut record = store.find_file(for_carol).await.unwrap().unwrap();
        record
            .contributors
            .push(Contributor::new(bob, PermissionLevel::ReadWrite));
        store.save_file(&record).await.unwrap();

        let shared = store.files_shared_with(bob).await.unwrap();
        assert_eq!(ids(&shared, |f| f.id), vec![for_bob, for_carol]);
        assert_eq!(store.files_owned_by(alice).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn saving_a_deleted_file_fails() {
        let store = store().await;
        let alice = user(&store, "alice").await;
        let id = file(&store, alice, vec![]).await;
        let record = store.find_file(id).await.unwrap().unwrap();

        assert!(store.delete_file(id).await.unwrap());
        assert!(!store.delete_file(id).await.unwrap());
        assert!(matches!(
            store.save_file(&record).await,
            Err(StoreError::Missing("File"))
        ));
    }

    #[tokio::test]
    async fn label_references_keep_append_order_and_duplicates() {
        let store = store().await;
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let f1 = file(&store, alice, vec![]).await;
        let f2 = file(&store, alice, vec![]).await;
        let urgent = label(&store, alice, "urgent").await;
        let later = label(&store, alice, "later").await;

        for file_id in [f2, f1, f2] {
            store.append_label_file(urgent, file_id).await.unwrap();
        }
        store.append_label_file(later, f2).await.unwrap();

        let found = store.find_label(urgent).await.unwrap().unwrap();
        assert_eq!(found.files, vec![f2, f1, f2]);

        let with_f1 = store.labels_with_file(alice, f1).await.unwrap();
        assert_eq!(ids(&with_f1, |l| l.id), vec![urgent]);
        let with_f2 = store.labels_with_file(alice, f2).await.unwrap();
        assert_eq!(ids(&with_f2, |l| l.id), vec![urgent, later]);
        assert_eq!(with_f2[0].files, vec![f2, f1, f2]);
        assert!(store.labels_with_file(bob, f2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn file_deletion_leaves_label_references() {
        let store = store().await;
        let alice = user(&store, "alice").await;
        let gone = file(&store, alice, vec![]).await;
        let urgent = label(&store, alice, "urgent").await;
        store.append_label_file(urgent, gone).await.unwrap();

        assert!(store.delete_file(gone).await.unwrap());

        let found = store.find_label(urgent).await.unwrap().unwrap();
        assert_eq!(found.files, vec![gone]);
        assert!(store.files_by_ids(&[gone]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn label_delete_removes_its_references_only() {
        let store = store().await;
        let alice = user(&store, "alice").await;
        let f1 = file(&store, alice, vec![]).await;
        let urgent = label(&store, alice, "urgent").await;
        let later = label(&store, alice, "later").await;
        store.append_label_file(urgent, f1).await.unwrap();
        store.append_label_file(later, f1).await.unwrap();

        assert!(store.delete_label(urgent).await.unwrap());
        assert!(!store.delete_label(urgent).await.unwrap());

        assert!(store.find_label(urgent).await.unwrap().is_none());
        let remaining = store.labels_with_file(alice, f1).await.unwrap();
        assert_eq!(ids(&remaining, |l| l.id), vec![later]);
        assert!(store.find_file(f1).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn label_save_keeps_references() {
        let store = store().await;
        let alice = user(&store, "alice").await;
        let f1 = file(&store, alice, vec![]).await;
        let urgent = label(&store, alice, "urgent").await;
        store.append_label_file(urgent, f1).await.unwrap();

        let mut record = store.find_label(urgent).await.unwrap().unwrap();
        record.name = "soon".into();
        record.color = "orange".into();
        store.save_label(&record).await.unwrap();

        let found = store.find_label(urgent).await.unwrap().unwrap();
        assert_eq!(found.name, "soon");
        assert_eq!(found.color, "orange");
        assert_eq!(found.files, vec![f1]);
    }
}

mod scenarios {
    use serde_json::json;

    use crate::common::{TestApp, routes};

    #[tokio::test]
    async fn sharing_and_labelling_over_postgres() {
        let app = TestApp::spawn_postgres().await;
        let (alice, _) = app.create_authenticated_user("alice").await;
        let (bob, bob_id) = app.create_authenticated_user("bob").await;

        let file = app.create_file(&alice, "f1.txt").await;
        app.add_contributor(&alice, &file, &bob_id, "read_only").await;

        let res = app
            .get_with_token(&format!("{}?scope=shared", routes::FILES), &bob)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["total"], 1);
        assert_eq!(res.body["data"][0]["id"], file.as_str());

        let res = app
            .patch_with_token(&routes::file(&file), &json!({"name": "mine.txt"}), &bob)
            .await;
        assert_eq!(res.status, 403);

        let res = app.get_with_token(&routes::file_download(&file), &bob).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.text, "hello world");

        let label = app.create_label(&alice, "urgent", "red").await;
        for _ in 0..2 {
            let res = app.put_with_token(&routes::label_file(&label, &file), &alice).await;
            assert_eq!(res.status, 204, "{}", res.text);
        }

        let res = app
            .get_with_token(&format!("{}?file_id={file}", routes::LABELS), &alice)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["data"][0]["file_ids"], json!([file, file]));

        let res = app.delete_with_token(&routes::file(&file), &alice).await;
        assert_eq!(res.status, 204);

        let res = app.get_with_token(&routes::label(&label), &alice).await;
        assert_eq!(res.status, 200);
        let files = res.body["files"].as_array().unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f["file"].is_null()));
    }

    #[tokio::test]
    async fn username_search_over_postgres() {
        let app = TestApp::spawn_postgres().await;
        let (token, _) = app.create_authenticated_user("alice").await;
        app.create_authenticated_user("malice").await;
        app.create_authenticated_user("bob").await;

        let res = app
            .get_with_token(&format!("{}?search=ALI", routes::USERS), &token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        let mut names: Vec<&str> = res.body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["username"].as_str().unwrap())
            .collect();
        names.sort();
        assert_eq!(names, vec!["alice", "malice"]);
    }
}
