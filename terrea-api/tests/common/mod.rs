#![allow(dead_code)]

/// Common test utilities for integration tests
///
/// Every context gets its own in-memory store and a cheap hasher, so
/// tests run without PostgreSQL or Redis and never share state.

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use serde_json::{json, Value};
use terrea_api::app::{build_router, AppState, Dependencies};
use terrea_api::config::{AccountConfig, ApiConfig, Config, JwtConfig};
use terrea_shared::auth::password::{CredentialHasher, HashCost};
use terrea_shared::db::memory::MemoryStore;
use terrea_shared::models::role::ensure_default_role;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Test context containing the router and its state
pub struct TestContext {
    pub app: axum::Router,
    pub state: AppState,
    pub store: MemoryStore,
}

/// A response with its body parsed as JSON (`Null` when empty)
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// `name=value` pair of the `Set-Cookie` header, ready for a `Cookie` header
    pub fn cookie(&self) -> String {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .expect("response has no Set-Cookie header")
            .to_string()
    }

    pub fn set_cookie(&self) -> Option<String> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["http://localhost:3000".to_string()],
        },
        database: None,
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            access_token_expire_days: 7,
            cookie_secure: false,
        },
        redis: None,
        accounts: AccountConfig::default(),
    }
}

impl TestContext {
    pub async fn new() -> Self {
        let store = MemoryStore::new();
        let repos = store.repositories();
        let role = ensure_default_role(repos.roles.as_ref(), "user").await.unwrap();

        let hasher = CredentialHasher::new(HashCost {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap();

        let state = AppState::new(test_config(), Dependencies::new(repos, hasher, role.id));
        let app = build_router(state.clone());

        Self { app, state, store }
    }

    /// Sends a request, optionally with a JSON body and a session cookie
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> TestResponse {
        self.send(
            Method::POST,
            "/profile/register",
            None,
            Some(json!({ "username": username, "email": email, "password": password })),
        )
        .await
    }

    /// Registers a user and returns their session cookie
    pub async fn signed_up(&self, username: &str) -> String {
        let response = self
            .register(username, &format!("{}@example.com", username), "secret1")
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        response.cookie()
    }

    pub async fn create_project(&self, cookie: &str, name: &str) -> TestResponse {
        self.send(
            Method::POST,
            "/projects/create_project",
            Some(cookie),
            Some(json!({ "name": name })),
        )
        .await
    }
}
