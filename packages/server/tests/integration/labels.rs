use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn label_found_by_linked_file() {
    let app = TestApp::spawn().await;
    let (alice, alice_id) = app.create_authenticated_user("alice").await;
    let file = app.create_file(&alice, "f1.txt").await;
    let label = app.create_label(&alice, "urgent", "red").await;
    app.create_label(&alice, "later", "blue").await;

    let res = app.put_with_token(&routes::label_file(&label, &file), &alice).await;
    assert_eq!(res.status, 204, "{}", res.text);

    let res = app
        .get_with_token(&format!("{}?file_id={file}", routes::LABELS), &alice)
        .await;
    assert_eq!(res.status, 200);
    let data = res.body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["name"], "urgent");
    assert_eq!(data[0]["color"], "red");
    assert_eq!(data[0]["owner"], alice_id.as_str());
    assert_eq!(data[0]["file_ids"], json!([file]));

    let res = app.get_with_token(routes::LABELS, &alice).await;
    assert_eq!(res.body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn strangers_cannot_touch_a_label() {
    let app = TestApp::spawn().await;
    let (alice, _) = app.create_authenticated_user("alice").await;
    let (carol, _) = app.create_authenticated_user("carol").await;
    let label = app.create_label(&alice, "urgent", "red").await;
    let carol_file = app.create_file(&carol, "c.txt").await;

    let res = app
        .patch_with_token(&routes::label(&label), &json!({"name": "mine"}), &carol)
        .await;
    assert_eq!(res.status, 403);
    assert_eq!(res.body["code"], "PERMISSION_DENIED");

    let res = app
        .put_with_token(&routes::label_file(&label, &carol_file), &carol)
        .await;
    assert_eq!(res.status, 403);

    let res = app.delete_with_token(&routes::label(&label), &carol).await;
    assert_eq!(res.status, 403);

    let res = app.get_with_token(&routes::label(&label), &carol).await;
    assert_eq!(res.status, 403);

    let res = app.get_with_token(&routes::label(&label), &alice).await;
    assert_eq!(res.body["name"], "urgent");
    assert!(res.body["files"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn linking_twice_keeps_two_references() {
    let app = TestApp::spawn().await;
    let (alice, _) = app.create_authenticated_user("alice").await;
    let file = app.create_file(&alice, "f2.txt").await;
    let label = app.create_label(&alice, "urgent", "red").await;

    for _ in 0..2 {
        let res = app.put_with_token(&routes::label_file(&label, &file), &alice).await;
        assert_eq!(res.status, 204);
    }

    let res = app.get_with_token(&routes::label(&label), &alice).await;
    let files = res.body["files"].as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert!(files.iter().all(|f| f["id"] == file.as_str()));
    assert!(files.iter().all(|f| f["file"]["name"] == "f2.txt"));
}

#[tokio::test]
async fn linking_needs_label_ownership_and_an_existing_file() {
    let app = TestApp::spawn().await;
    let (alice, _) = app.create_authenticated_user("alice").await;
    let (bob, _) = app.create_authenticated_user("bob").await;
    let label = app.create_label(&alice, "urgent", "red").await;
    let bob_file = app.create_file(&bob, "b.txt").await;
    let missing = uuid::Uuid::now_v7().to_string();

    let res = app.put_with_token(&routes::label_file(&label, &missing), &alice).await;
    assert_eq!(res.status, 404);
    assert_eq!(res.body["message"], "File not found");

    let res = app.put_with_token(&routes::label_file(&label, &bob_file), &bob).await;
    assert_eq!(res.status, 403);

    let res = app.put_with_token(&routes::label_file(&label, &bob_file), &alice).await;
    assert_eq!(res.status, 204);

    let res = app.get_with_token(&routes::label(&label), &alice).await;
    assert_eq!(res.status, 200);
    let files = res.body["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["id"], bob_file.as_str());
    assert!(files[0]["file"].is_null());
}

#[tokio::test]
async fn deleted_file_leaves_a_dangling_reference() {
    let app = TestApp::spawn().await;
    let (alice, _) = app.create_authenticated_user("alice").await;
    let kept = app.create_file(&alice, "kept.txt").await;
    let gone = app.create_file(&alice, "gone.txt").await;
    let label = app.create_label(&alice, "urgent", "red").await;
    app.put_with_token(&routes::label_file(&label, &kept), &alice).await;
    app.put_with_token(&routes::label_file(&label, &gone), &alice).await;

    let res = app.delete_with_token(&routes::file(&gone), &alice).await;
    assert_eq!(res.status, 204);

    let res = app.get_with_token(&routes::label(&label), &alice).await;
    assert_eq!(res.status, 200);
    let files = res.body["files"].as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0]["file"]["name"], "kept.txt");
    assert_eq!(files[1]["id"], gone.as_str());
    assert!(files[1]["file"].is_null());
}

#[tokio::test]
async fn rename_recolor_and_delete() {
    let app = TestApp::spawn().await;
    let (alice, _) = app.create_authenticated_user("alice").await;
    let file = app.create_file(&alice, "f1.txt").await;
    let label = app.create_label(&alice, "urgent", "red").await;
    app.put_with_token(&routes::label_file(&label, &file), &alice).await;

    let res = app
        .patch_with_token(
            &routes::label(&label),
            &json!({"name": "soon", "color": "#ff8800"}),
            &alice,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["name"], "soon");
    assert_eq!(res.body["color"], "#ff8800");
    assert_eq!(res.body["file_ids"], json!([file]));

    let res = app.delete_with_token(&routes::label(&label), &alice).await;
    assert_eq!(res.status, 204);

    let res = app.get_with_token(&routes::label(&label), &alice).await;
    assert_eq!(res.status, 404);
    let res = app.get_with_token(&routes::file(&file), &alice).await;
    assert_eq!(res.status, 200);
}

#[tokio::test]
async fn invalid_label_fields_are_rejected() {
    let app = TestApp::spawn().await;
    let (alice, _) = app.create_authenticated_user("alice").await;

    for body in [
        json!({"name": "", "color": "red"}),
        json!({"name": "urgent", "color": "   "}),
        json!({"name": "n".repeat(65), "color": "red"}),
        json!({"name": "urgent"}),
    ] {
        let res = app.post_with_token(routes::LABELS, &body, &alice).await;
        assert_eq!(res.status, 400, "accepted {body}");
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}
