use serde_json::json;

use crate::common::{TestApp, routes};

mod registration {
    use super::*;

    #[tokio::test]
    async fn new_user_can_register_with_valid_credentials() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({"username": "alice", "password": "securepass"}),
            )
            .await;

        assert_eq!(res.status, 201);
        assert!(res.body["id"].is_string());
        assert_eq!(res.body["username"], "alice");
    }

    #[tokio::test]
    async fn cannot_register_with_an_already_taken_username() {
        let app = TestApp::spawn().await;
        let body = json!({"username": "alice", "password": "securepass"});

        let first = app.post_without_token(routes::REGISTER, &body).await;
        assert_eq!(first.status, 201, "First registration failed: {}", first.text);

        let res = app.post_without_token(routes::REGISTER, &body).await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "USERNAME_TAKEN");
    }

    #[tokio::test]
    async fn cannot_register_with_invalid_fields() {
        let app = TestApp::spawn().await;

        for body in [
            json!({"username": "alice", "password": "short"}),
            json!({"username": "no spaces!", "password": "securepass"}),
            json!({"username": "   ", "password": "securepass"}),
            json!({"username": "a".repeat(33), "password": "securepass"}),
        ] {
            let res = app.post_without_token(routes::REGISTER, &body).await;
            assert_eq!(res.status, 400, "accepted {body}");
            assert_eq!(res.body["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn malformed_json_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::REGISTER, &json!({"username": "alice"}))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod login {
    use super::*;

    #[tokio::test]
    async fn registered_user_receives_a_token() {
        let app = TestApp::spawn().await;
        let (token, id) = app.create_authenticated_user("alice").await;

        let me = app.get_with_token(routes::ME, &token).await;

        assert_eq!(me.status, 200);
        assert_eq!(me.body["id"], id.as_str());
        assert_eq!(me.body["username"], "alice");
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = TestApp::spawn().await;
        app.create_authenticated_user("alice").await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": "alice", "password": "wrongpass"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn unknown_user_is_rejected_like_a_wrong_password() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": "ghost", "password": "securepass"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }
}

mod tokens {
    use super::*;

    #[tokio::test]
    async fn missing_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ME).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::FILES, "not-a-jwt").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }
}

mod user_search {
    use super::*;

    #[tokio::test]
    async fn partial_case_insensitive_match() {
        let app = TestApp::spawn().await;
        let (token, _) = app.create_authenticated_user("Alice").await;
        app.create_authenticated_user("malice").await;
        app.create_authenticated_user("bob").await;

        let res = app
            .get_with_token(&format!("{}?search=ALI", routes::USERS), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let names: Vec<&str> = res.body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["username"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Alice", "malice"]);
    }

    #[tokio::test]
    async fn wildcards_are_literal() {
        let app = TestApp::spawn().await;
        let (token, _) = app.create_authenticated_user("alice").await;
        app.create_authenticated_user("bob_smith").await;

        let res = app
            .get_with_token(&format!("{}?search=%25", routes::USERS), &token)
            .await;

        assert_eq!(res.status, 200);
        assert!(res.body["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn limit_is_respected() {
        let app = TestApp::spawn().await;
        let (token, _) = app.create_authenticated_user("user_a").await;
        app.create_authenticated_user("user_b").await;
        app.create_authenticated_user("user_c").await;

        let res = app
            .get_with_token(&format!("{}?search=user&limit=2", routes::USERS), &token)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["data"].as_array().unwrap().len(), 2);
    }
}
