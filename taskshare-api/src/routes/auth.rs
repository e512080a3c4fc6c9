//! Registration and login
//!
//! # Endpoints
//!
//! - `POST /register` - Create an account
//! - `POST /login` - Exchange username and password for a bearer token

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use taskshare_shared::auth::credentials;
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(max = 150, message = "Username must be at most 150 characters"))]
    pub username: String,

    pub password: String,
}

/// Login request
///
/// Not validated beyond shape; any mismatch is a 401.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,

    /// Always "bearer"
    pub token_type: String,
}

/// Register a new user
///
/// ```text
/// POST /register
/// {"username": "alice", "password": "s3cret"}
///
/// 201 {"message": "User created"}
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Username already taken
/// - `422 Unprocessable Entity`: Validation failed
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    req.validate()?;

    // Cheap early answer; the store enforces uniqueness again on insert
    if state
        .store
        .find_user_by_username(&req.username)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("Username already registered".to_string()));
    }

    credentials::register(
        state.store.as_ref(),
        &state.passwords,
        &req.username,
        &req.password,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(json!({ "message": "User created" }))))
}

/// Exchange credentials for a bearer token
///
/// ```text
/// POST /login
/// {"username": "alice", "password": "s3cret"}
///
/// 200 {"access_token": "eyJ...", "token_type": "bearer"}
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown username or wrong password
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = credentials::authenticate(
        state.store.as_ref(),
        &state.passwords,
        &req.username,
        &req.password,
    )
    .await?
    .ok_or_else(|| ApiError::Unauthorized("Invalid username or password".to_string()))?;

    let access_token = state.tokens.issue(&user.username)?;
    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(LoginResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}
