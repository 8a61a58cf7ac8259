//! Account registration, tokens and authentication.
//!
//! Requires `TEST_DATABASE_URL`; see the crate docs.

use estate_desk_integration_tests::{PASSWORD, TestServer};
use reqwest::{Method, StatusCode};
use serde_json::{Value, json};

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_register_never_returns_password() {
    let server = TestServer::start().await;

    let resp = server
        .request(Method::POST, "/user/create/")
        .json(&json!({"email": "Mixed.Case@EXAMPLE.com", "password": PASSWORD, "name": "Ann"}))
        .send()
        .await
        .expect("Failed to register");

    // The address may already exist from an earlier run
    if resp.status() == StatusCode::CREATED {
        let body: Value = resp.json().await.expect("Invalid body");
        assert_eq!(body["email"], "Mixed.Case@example.com");
        assert!(body.get("password").is_none());
        assert!(body.get("password_hash").is_none());
        assert!(body["team"].is_i64());
        assert_eq!(body["is_staff"], false);
    } else {
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_short_password_rejected() {
    let server = TestServer::start().await;

    let resp = server
        .request(Method::POST, "/user/create/")
        .json(&json!({"email": "short@example.com", "password": "abc", "name": "Short"}))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Invalid body");
    assert!(body["password"].is_array());
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_duplicate_email_rejected() {
    let server = TestServer::start().await;
    let email = server.register().await;

    let resp = server
        .request(Method::POST, "/user/create/")
        .json(&json!({"email": email, "password": PASSWORD, "name": "Again"}))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Invalid body");
    assert!(body["email"].is_array());
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_token_with_bad_credentials() {
    let server = TestServer::start().await;
    let email = server.register().await;

    for password in ["wrong password", ""] {
        let resp = server
            .request(Method::POST, "/user/token/")
            .json(&json!({"email": email, "password": password}))
            .send()
            .await
            .expect("Request failed");

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = resp.json().await.expect("Invalid body");
        assert!(body.get("token").is_none());
        assert!(body["non_field_errors"].is_array());
    }
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_new_token_replaces_old() {
    let server = TestServer::start().await;
    let email = server.register().await;

    let mut tokens = Vec::new();
    for _ in 0..2 {
        let resp = server
            .request(Method::POST, "/user/token/")
            .json(&json!({"email": email, "password": PASSWORD}))
            .send()
            .await
            .expect("Request failed");
        let body: Value = resp.json().await.expect("Invalid body");
        tokens.push(body["token"].as_str().unwrap_or_default().to_owned());
    }

    let (status, _) = server.send(Method::GET, "/user/me/", &tokens[0], None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = server.send(Method::GET, "/user/me/", &tokens[1], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], email.as_str());
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_unauthenticated_requests_rejected() {
    let server = TestServer::start().await;

    for path in ["/user/me/", "/user/list/", "/agencies/", "/applications/", "/estates/"] {
        let resp = server
            .request(Method::GET, path)
            .send()
            .await
            .expect("Request failed");
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{path}");
    }

    let (status, _) = server
        .send(Method::GET, "/agencies/", "not-a-real-token", None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_patch_me_rehashes_password() {
    let server = TestServer::start().await;
    let token = server.login().await;

    let (status, me) = server
        .send(
            Method::PATCH,
            "/user/me/",
            &token,
            Some(json!({"password": "another secret"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let resp = server
        .request(Method::POST, "/user/token/")
        .json(&json!({"email": me["email"], "password": "another secret"}))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::OK);
}
