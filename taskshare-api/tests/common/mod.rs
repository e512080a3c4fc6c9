//! Common test utilities for integration tests
//!
//! Builds the real router over an in-memory store with a low-cost password
//! hasher, and offers JSON request helpers.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use chrono::Duration;
use serde_json::Value;
use taskshare_api::app::{build_router, AppState};
use taskshare_api::config::Config;
use taskshare_shared::auth::jwt::TokenService;
use taskshare_shared::auth::password::PasswordService;
use taskshare_shared::store::memory::MemoryStore;
use taskshare_shared::store::CredentialStore;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Router plus direct access to its store
pub struct TestContext {
    pub app: axum::Router,
    pub store: Arc<MemoryStore>,
    pub tokens: Arc<TokenService>,
}

/// Decoded response
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

pub fn test_config() -> Config {
    let vars: HashMap<&str, &str> = [
        ("DATABASE_URL", "postgresql://unused/test"),
        ("JWT_SECRET", JWT_SECRET),
    ]
    .into_iter()
    .collect();

    Config::from_vars(|key| vars.get(key).map(|v| v.to_string())).expect("valid test config")
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let passwords = PasswordService::with_cost(1024, 1, 1).expect("valid parameters");
        let tokens = TokenService::new(JWT_SECRET, Duration::minutes(30));

        let state = AppState::with_services(store.clone(), tokens, passwords, test_config());
        let tokens = state.tokens.clone();

        TestContext {
            app: build_router(state),
            store,
            tokens,
        }
    }

    /// Sends a request with an optional bearer token and JSON body
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse { status, body }
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    /// Registers `username`, logs in and returns `(user_id, token)`
    pub async fn signup(&self, username: &str) -> (i64, String) {
        let credentials = serde_json::json!({ "username": username, "password": "pw-123" });

        let response = self.post("/register", None, credentials.clone()).await;
        assert_eq!(response.status, StatusCode::CREATED, "register {}", username);

        let response = self.post("/login", None, credentials).await;
        assert_eq!(response.status, StatusCode::OK, "login {}", username);
        let token = response.body["access_token"].as_str().unwrap().to_string();

        let user = self
            .store
            .find_user_by_username(username)
            .await
            .unwrap()
            .unwrap();

        (user.id, token)
    }

    /// Creates a task and returns its id
    pub async fn create_task(&self, token: &str, title: &str) -> i64 {
        let response = self
            .post("/tasks", Some(token), serde_json::json!({ "title": title }))
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
        response.body["id"].as_i64().unwrap()
    }

    /// Grants `user_id` access to `task_id` and returns the permission id
    pub async fn grant(&self, token: &str, task_id: i64, user_id: i64, can_edit: bool) -> i64 {
        let response = self
            .post(
                "/permissions",
                Some(token),
                serde_json::json!({ "task_id": task_id, "user_id": user_id, "can_edit": can_edit }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
        response.body["id"].as_i64().unwrap()
    }
}

/// Ids of the tasks in a listing, in order
pub fn task_ids(body: &Value) -> Vec<i64> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_i64().unwrap())
        .collect()
}
