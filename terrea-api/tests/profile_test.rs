/// Integration tests for the profile endpoints
///
/// These drive the real router against the in-memory store:
/// - The register / login / logout session lifecycle
/// - Duplicate and malformed registrations
/// - Profile views (own, other, after update)
/// - Token expiry and cookie rotation

mod common;

use axum::http::{Method, StatusCode};
use common::TestContext;
use serde_json::json;

#[tokio::test]
async fn test_full_session_scenario() {
    let ctx = TestContext::new().await;

    let registered = ctx.register("alice", "a@x.com", "pw123").await;
    assert_eq!(registered.status, StatusCode::OK);
    assert_eq!(registered.body["status_code"], 200);
    assert_eq!(registered.body["message"], "User has been registered");
    let set_cookie = registered.set_cookie().unwrap();
    assert!(set_cookie.starts_with("user_access_token="));
    assert!(set_cookie.contains("HttpOnly"));

    let duplicate = ctx.register("alice", "a@x.com", "pw123").await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
    assert_eq!(duplicate.body["message"], "User already exists");

    let bad_login = ctx
        .send(
            Method::POST,
            "/profile/login",
            None,
            Some(json!({ "email": "a@x.com", "password": "wrong" })),
        )
        .await;
    assert_eq!(bad_login.status, StatusCode::UNAUTHORIZED);

    let login = ctx
        .send(
            Method::POST,
            "/profile/login",
            None,
            Some(json!({ "email": "a@x.com", "password": "pw123" })),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.body["message"], "User has been logged in");
    let cookie = login.cookie();

    let me = ctx.send(Method::GET, "/profile/me", Some(&cookie), None).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["username"], "alice");
    assert_eq!(me.body["email"], "a@x.com");
    assert!(me.body.get("password").is_none());

    let project = ctx.create_project(&cookie, "p1").await;
    assert_eq!(project.status, StatusCode::OK);
    assert_eq!(project.body["message"], "Project has been created");

    let duplicate_project = ctx.create_project(&cookie, "p1").await;
    assert_eq!(duplicate_project.status, StatusCode::CONFLICT);

    let logout = ctx.send(Method::POST, "/profile/logout", Some(&cookie), None).await;
    assert_eq!(logout.status, StatusCode::OK);
    assert_eq!(logout.body["message"], "User has been logged out");
    assert!(logout.set_cookie().unwrap().contains("Max-Age=0"));

    // The browser now holds the cleared cookie.
    let cleared = logout.cookie();
    let me = ctx.send(Method::GET, "/profile/me", Some(&cleared), None).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
    assert_eq!(me.body["message"], "Token not found");

    let again = ctx.send(Method::POST, "/profile/logout", Some(&cleared), None).await;
    assert_eq!(again.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let ctx = TestContext::new().await;
    ctx.signed_up("alice").await;

    let unknown = ctx
        .send(
            Method::POST,
            "/profile/login",
            None,
            Some(json!({ "email": "nobody@example.com", "password": "secret1" })),
        )
        .await;
    let wrong = ctx
        .send(
            Method::POST,
            "/profile/login",
            None,
            Some(json!({ "email": "alice@example.com", "password": "secret2" })),
        )
        .await;

    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status, wrong.status);
    assert_eq!(unknown.body, wrong.body);
    assert!(unknown.set_cookie().is_none());
}

#[tokio::test]
async fn test_login_with_live_session_is_conflict() {
    let ctx = TestContext::new().await;
    let cookie = ctx.signed_up("alice").await;

    let response = ctx
        .send(
            Method::POST,
            "/profile/login",
            Some(&cookie),
            Some(json!({ "email": "alice@example.com", "password": "secret1" })),
        )
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["message"], "User is already login");
}

#[tokio::test]
async fn test_login_reactivates_logged_out_user() {
    let ctx = TestContext::new().await;
    let cookie = ctx.signed_up("alice").await;
    ctx.send(Method::POST, "/profile/logout", Some(&cookie), None).await;

    let other = ctx.send(Method::GET, "/profile/@alice", None, None).await;
    assert_eq!(other.body["is_active"], false);

    let login = ctx
        .send(
            Method::POST,
            "/profile/login",
            None,
            Some(json!({ "email": "alice@example.com", "password": "secret1" })),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);

    let me = ctx.send(Method::GET, "/profile/me", Some(&login.cookie()), None).await;
    assert_eq!(me.body["is_active"], true);
}

#[tokio::test]
async fn test_register_rejects_taken_username() {
    let ctx = TestContext::new().await;
    ctx.signed_up("alice").await;

    let response = ctx.register("alice", "other@example.com", "secret1").await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["message"], "Username is already taken");
}

#[tokio::test]
async fn test_register_rejects_disallowed_characters() {
    let ctx = TestContext::new().await;

    let response = ctx.register("al ice!", "a@x.com", "pw123").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "Use only alphabet letters and numbers");
}

#[tokio::test]
async fn test_register_rejects_malformed_email() {
    let ctx = TestContext::new().await;

    let response = ctx.register("alice", "not-an-email", "pw123").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "validation_error");
    assert_eq!(response.body["details"][0]["field"], "email");
}

#[tokio::test]
async fn test_other_profile_lookup() {
    let ctx = TestContext::new().await;
    ctx.signed_up("alice").await;

    let found = ctx.send(Method::GET, "/profile/@alice", None, None).await;
    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(found.body["username"], "alice");
    assert!(found.body.get("password").is_none());

    let missing = ctx.send(Method::GET, "/profile/@ghost", None, None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["message"], "User doesn't exist");

    let malformed = ctx.send(Method::GET, "/profile/@bad-name", None, None).await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);

    let no_prefix = ctx.send(Method::GET, "/profile/alice", None, None).await;
    assert_eq!(no_prefix.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let ctx = TestContext::new().await;

    for (method, uri) in [
        (Method::GET, "/profile/me"),
        (Method::POST, "/profile/logout"),
        (Method::DELETE, "/profile/delete_account"),
        (Method::GET, "/projects/p1"),
    ] {
        let response = ctx.send(method, uri, None, None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(response.body["message"], "Token not found");
    }
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let ctx = TestContext::new().await;
    ctx.signed_up("alice").await;

    let token = ctx
        .state
        .tokens
        .issue_with_ttl("alice@example.com", chrono::Duration::seconds(-60))
        .unwrap();
    let cookie = format!("user_access_token={}", token);

    let response = ctx.send(Method::GET, "/profile/me", Some(&cookie), None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], "Token has expired");
}

#[tokio::test]
async fn test_forged_token_is_rejected() {
    let ctx = TestContext::new().await;
    ctx.signed_up("alice").await;

    let forged = terrea_shared::auth::token::TokenManager::new("another-secret-that-is-32-bytes-long!", 7)
        .issue("alice@example.com")
        .unwrap();
    let cookie = format!("user_access_token={}", forged);

    let response = ctx.send(Method::GET, "/profile/me", Some(&cookie), None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], "Token is invalid");
}

#[tokio::test]
async fn test_update_profile_rotates_cookie() {
    let ctx = TestContext::new().await;
    let cookie = ctx.signed_up("alice").await;

    let response = ctx
        .send(
            Method::PATCH,
            "/profile/update_profile",
            Some(&cookie),
            Some(json!({
                "username": "alicia",
                "email": "alicia@example.com",
                "password": "secret2",
                "is_active": true
            })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["username"], "alicia");
    assert_eq!(response.body["email"], "alicia@example.com");
    assert!(response.body.get("password").is_none());

    // The old token names an e-mail no user has any more.
    let stale = ctx.send(Method::GET, "/profile/me", Some(&cookie), None).await;
    assert_eq!(stale.status, StatusCode::UNAUTHORIZED);
    assert_eq!(stale.body["message"], "User not found");

    let fresh = ctx
        .send(Method::GET, "/profile/me", Some(&response.cookie()), None)
        .await;
    assert_eq!(fresh.status, StatusCode::OK);
    assert_eq!(fresh.body["username"], "alicia");

    let login = ctx
        .send(
            Method::POST,
            "/profile/login",
            None,
            Some(json!({ "email": "alicia@example.com", "password": "secret2" })),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
}

#[tokio::test]
async fn test_update_profile_defaults_to_active() {
    let ctx = TestContext::new().await;
    let cookie = ctx.signed_up("alice").await;

    let response = ctx
        .send(
            Method::PATCH,
            "/profile/update_profile",
            Some(&cookie),
            Some(json!({
                "username": "alice",
                "email": "alice@example.com",
                "password": "secret2"
            })),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["is_active"], true);
}

#[tokio::test]
async fn test_update_profile_rejects_taken_username() {
    let ctx = TestContext::new().await;
    let cookie = ctx.signed_up("alice").await;
    ctx.signed_up("bob").await;

    let response = ctx
        .send(
            Method::PATCH,
            "/profile/update_profile",
            Some(&cookie),
            Some(json!({
                "username": "bob",
                "email": "alice@example.com",
                "password": "secret1",
                "is_active": true
            })),
        )
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_delete_account() {
    let ctx = TestContext::new().await;
    let cookie = ctx.signed_up("alice").await;

    let response = ctx
        .send(Method::DELETE, "/profile/delete_account", Some(&cookie), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "User has been deleted");
    assert!(response.set_cookie().unwrap().contains("Max-Age=0"));

    let other = ctx.send(Method::GET, "/profile/@alice", None, None).await;
    assert_eq!(other.status, StatusCode::NOT_FOUND);

    let me = ctx.send(Method::GET, "/profile/me", Some(&cookie), None).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
    assert_eq!(me.body["message"], "User not found");
}

#[tokio::test]
async fn test_health_reports_in_memory_store() {
    let ctx = TestContext::new().await;

    let response = ctx.send(Method::GET, "/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");
    assert_eq!(response.body["database"], "in_memory");
    assert_eq!(response.body["redis"], "disabled");
    assert!(response.body.get("database_pool").is_none());
}

#[tokio::test]
async fn test_register_without_password_is_bad_request() {
    let ctx = TestContext::new().await;

    let response = ctx
        .send(
            Method::POST,
            "/profile/register",
            None,
            Some(json!({ "username": "alice", "email": "a@x.com" })),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["status_code"], 400);
    assert_eq!(response.body["error"], "bad_request");
    assert!(response.body["message"].as_str().unwrap().contains("password"));

    let lookup = ctx.send(Method::GET, "/profile/@alice", None, None).await;
    assert_eq!(lookup.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_register_rejects_overlong_email() {
    let ctx = TestContext::new().await;
    let label = "d".repeat(60);
    let email = format!("{}@{}.{}.{}.{}.com", "a".repeat(60), label, label, label, label);
    assert!(email.len() > 255);

    let response = ctx.register("alice", &email, "secret1").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let details = response.body["details"].as_array().unwrap();
    assert!(details
        .iter()
        .any(|d| d["field"] == "email" && d["message"] == "Email must be at most 255 characters"));
}
