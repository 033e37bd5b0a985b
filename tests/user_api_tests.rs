//! Integration tests for the user account lifecycle: signup, lookup,
//! update, cascade delete, and login.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use palaver::config::Config;
use serde_json::{Value, json};
use tower::ServiceExt;

fn test_config() -> Config {
    let mut config = Config::default();
    config.database.url = "sqlite::memory:".to_string();
    config.database.max_connections = 1;
    config.database.min_connections = 1;
    config
}

async fn spawn_app() -> Router {
    let state = palaver::api::create_app_state_from_config(test_config(), None)
        .await
        .expect("Failed to create app state");
    palaver::api::router(state)
}

/// App with the demo data applied: users admin/moderator/member (IDs 1-3,
/// password "password"), two threads, two replies on the first thread.
async fn spawn_seeded_app() -> Router {
    let state = palaver::api::create_app_state_from_config(test_config(), None)
        .await
        .expect("Failed to create app state");
    state
        .store()
        .seed_demo_data(&state.config.security)
        .await
        .expect("Failed to seed demo data");
    palaver::api::router(state)
}

async fn send_json(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, value)
}

fn valid_signup() -> Value {
    json!({ "username": "alice", "password": "secret12", "role": "member" })
}

#[tokio::test]
async fn create_user_returns_created_record_without_hash() {
    let app = spawn_app().await;

    let (status, body) = send_json(&app, "POST", "/api/users", Some(valid_signup())).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["username"], json!("alice"));
    assert_eq!(body["data"]["role"], json!("member"));
    assert_eq!(body["data"]["uuid"].as_str().unwrap().len(), 36);
    assert!(body["data"]["user_id"].as_i64().unwrap() > 0);
    assert!(!body.to_string().contains("password_hash"));
    assert!(!body.to_string().contains("secret12"));
}

#[tokio::test]
async fn create_user_requires_all_fields() {
    let app = spawn_app().await;

    for missing in ["username", "password", "role"] {
        let mut payload = valid_signup();
        payload[missing] = json!("");

        let (status, body) = send_json(&app, "POST", "/api/users", Some(payload)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            json!("Username, password, and role are required")
        );
    }
}

#[tokio::test]
async fn create_user_enforces_upper_length_bounds() {
    let app = spawn_app().await;

    let mut payload = valid_signup();
    payload["username"] = json!("a".repeat(21));
    let (status, body) = send_json(&app, "POST", "/api/users", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        json!("Username must be at most 20 characters and password at most 30 characters")
    );

    let mut payload = valid_signup();
    payload["password"] = json!("a".repeat(31));
    let (status, body) = send_json(&app, "POST", "/api/users", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        json!("Username must be at most 20 characters and password at most 30 characters")
    );
}

#[tokio::test]
async fn create_user_rejects_special_characters() {
    let app = spawn_app().await;

    let mut payload = valid_signup();
    payload["username"] = json!("bad!user");

    let (status, body) = send_json(&app, "POST", "/api/users", Some(payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        json!("Username must not contain special characters")
    );
}

#[tokio::test]
async fn create_user_enforces_lower_length_bounds() {
    let app = spawn_app().await;

    let mut payload = valid_signup();
    payload["username"] = json!("ab");
    let (status, body) = send_json(&app, "POST", "/api/users", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        json!("Username must be at least 3 characters and password at least 4 characters")
    );

    let mut payload = valid_signup();
    payload["password"] = json!("abc");
    let (status, body) = send_json(&app, "POST", "/api/users", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        json!("Username must be at least 3 characters and password at least 4 characters")
    );
}

#[tokio::test]
async fn create_user_guard_order_prefers_upper_bound_message() {
    let app = spawn_app().await;

    // Too long AND containing special characters: the length guard runs first
    let mut payload = valid_signup();
    payload["username"] = json!(format!("{}!", "a".repeat(25)));

    let (status, body) = send_json(&app, "POST", "/api/users", Some(payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        json!("Username must be at most 20 characters and password at most 30 characters")
    );
}

#[tokio::test]
async fn create_user_rejects_unknown_role() {
    let app = spawn_app().await;

    let mut payload = valid_signup();
    payload["role"] = json!("overlord");

    let (status, body) = send_json(&app, "POST", "/api/users", Some(payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        json!("Role must be one of admin, moderator, or member")
    );
}

#[tokio::test]
async fn create_user_rejects_duplicate_username() {
    let app = spawn_app().await;

    let (status, _) = send_json(&app, "POST", "/api/users", Some(valid_signup())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send_json(&app, "POST", "/api/users", Some(valid_signup())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Username is already taken"));
}

#[tokio::test]
async fn create_user_with_explicit_id_checks_for_collisions() {
    let app = spawn_app().await;

    let payload = json!({
        "user_id": 42,
        "username": "fortytwo",
        "password": "secret12",
        "role": "member"
    });
    let (status, body) = send_json(&app, "POST", "/api/users", Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["user_id"], json!(42));

    let payload = json!({
        "user_id": 42,
        "username": "other42",
        "password": "secret12",
        "role": "member"
    });
    let (status, body) = send_json(&app, "POST", "/api/users", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("User with this ID already exists"));
}

#[tokio::test]
async fn get_user_returns_seeded_admin() {
    let app = spawn_seeded_app().await;

    let (status, body) = send_json(&app, "GET", "/api/users/1", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user_id"], json!(1));
    assert_eq!(body["data"]["username"], json!("admin"));
    assert_eq!(body["data"]["role"], json!("admin"));
    assert!(!body.to_string().contains("password_hash"));
}

#[tokio::test]
async fn get_user_rejects_malformed_ids() {
    let app = spawn_seeded_app().await;

    for uri in [
        "/api/users/invalid",
        "/api/users/-12",
        "/api/users/0",
        "/api/users/100000000",
    ] {
        let (status, body) = send_json(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "uri: {uri}");
        assert_eq!(body["error"], json!("Invalid user ID"), "uri: {uri}");
    }
}

#[tokio::test]
async fn get_user_returns_404_for_absent_row() {
    let app = spawn_seeded_app().await;

    let (status, body) = send_json(&app, "GET", "/api/users/9999", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("User not found"));
}

#[tokio::test]
async fn get_user_is_idempotent() {
    let app = spawn_seeded_app().await;

    let (first_status, first_body) = send_json(&app, "GET", "/api/users/2", None).await;
    let (second_status, second_body) = send_json(&app, "GET", "/api/users/2", None).await;

    assert_eq!(first_status, StatusCode::OK);
    assert_eq!(first_status, second_status);
    assert_eq!(first_body, second_body);
}

#[tokio::test]
async fn update_user_applies_partial_patch() {
    let app = spawn_seeded_app().await;

    let (status, body) = send_json(
        &app,
        "PUT",
        "/api/users/3",
        Some(json!({ "username": "renamed" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], json!("renamed"));
    assert_eq!(body["data"]["role"], json!("member"));

    let (status, body) = send_json(&app, "GET", "/api/users/3", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], json!("renamed"));
}

#[tokio::test]
async fn update_user_rehashes_password() {
    let app = spawn_seeded_app().await;

    let (status, _) = send_json(
        &app,
        "PUT",
        "/api/users/3",
        Some(json!({ "password": "newsecret99" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/users/login",
        Some(json!({ "username": "member", "password": "password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/users/login",
        Some(json!({ "username": "member", "password": "newsecret99" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], json!("Login successful"));
}

#[tokio::test]
async fn update_user_validates_supplied_fields() {
    let app = spawn_seeded_app().await;

    let (status, body) = send_json(
        &app,
        "PUT",
        "/api/users/3",
        Some(json!({ "username": "ab" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        json!("Username must be between 3 and 20 characters")
    );

    let (status, body) = send_json(
        &app,
        "PUT",
        "/api/users/3",
        Some(json!({ "password": "short" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        json!("Password must be between 8 and 50 characters")
    );

    let (status, body) = send_json(&app, "PUT", "/api/users/3", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("At least one field is required"));
}

#[tokio::test]
async fn update_user_handles_bad_ids_and_missing_rows() {
    let app = spawn_seeded_app().await;

    let (status, body) = send_json(
        &app,
        "PUT",
        "/api/users/abc",
        Some(json!({ "username": "renamed" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Invalid user ID"));

    let (status, body) = send_json(
        &app,
        "PUT",
        "/api/users/9999",
        Some(json!({ "username": "renamed" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("User not found"));
}

#[tokio::test]
async fn delete_user_cascades_to_threads_and_replies() {
    let app = spawn_seeded_app().await;

    // Admin owns thread 1, which carries both seeded replies
    let (status, body) = send_json(&app, "DELETE", "/api/users/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], json!("User deleted successfully"));

    let (status, _) = send_json(&app, "GET", "/api/users/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send_json(&app, "GET", "/api/threads/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send_json(&app, "GET", "/api/threads", None).await;
    assert_eq!(status, StatusCode::OK);
    let remaining = body["data"].as_array().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0]["thread_id"], json!(2));
}

#[tokio::test]
async fn delete_user_removes_replies_authored_on_other_threads() {
    let app = spawn_seeded_app().await;

    // The moderator owns thread 2 and wrote one reply on thread 1
    let (status, _) = send_json(&app, "DELETE", "/api/users/2", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send_json(&app, "GET", "/api/threads/2", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send_json(&app, "GET", "/api/threads/1/replies", None).await;
    assert_eq!(status, StatusCode::OK);
    let replies = body["data"].as_array().unwrap();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0]["user_id"], json!(3));
}

#[tokio::test]
async fn delete_user_twice_returns_404() {
    let app = spawn_seeded_app().await;

    let (status, _) = send_json(&app, "DELETE", "/api/users/1", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send_json(&app, "DELETE", "/api/users/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("User not found"));
}

#[tokio::test]
async fn delete_user_rejects_malformed_id() {
    let app = spawn_seeded_app().await;

    let (status, body) = send_json(&app, "DELETE", "/api/users/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Invalid user ID"));
}

#[tokio::test]
async fn login_succeeds_with_valid_credentials() {
    let app = spawn_seeded_app().await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/users/login",
        Some(json!({ "username": "admin", "password": "password" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], json!("Login successful"));
    assert_eq!(body["data"]["user"]["username"], json!("admin"));
    assert!(body["data"]["user"]["last_login"].is_string());
    assert!(!body.to_string().contains("password_hash"));
}

#[tokio::test]
async fn login_rejects_bad_credentials_with_identical_message() {
    let app = spawn_seeded_app().await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/users/login",
        Some(json!({ "username": "admin", "password": "wrong_password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], json!("Invalid credentials"));

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/users/login",
        Some(json!({ "username": "nobody", "password": "password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], json!("Invalid credentials"));
}

#[tokio::test]
async fn login_requires_both_fields() {
    let app = spawn_seeded_app().await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/users/login",
        Some(json!({ "password": "password" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Username is required"));

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/users/login",
        Some(json!({ "username": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Password is required"));

    let (status, body) = send_json(&app, "POST", "/api/users/login", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Username and password are required"));
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn system_status_reports_row_counts() {
    let app = spawn_seeded_app().await;

    let (status, body) = send_json(&app, "GET", "/api/system/status", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["database"], json!(true));
    assert_eq!(body["data"]["users"], json!(3));
    assert_eq!(body["data"]["threads"], json!(2));
    assert_eq!(body["data"]["replies"], json!(2));
}
