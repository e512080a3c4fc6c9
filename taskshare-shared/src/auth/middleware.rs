//! Bearer authentication for Axum
//!
//! Resolves `Authorization: Bearer <token>` to an [`AuthContext`]: the token
//! must verify and its subject must still name an existing user. The context
//! is added to request extensions, and handlers receive it either through
//! `Extension<AuthContext>` or by taking `AuthContext` as an extractor.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use axum::{middleware, routing::get, Router};
//! use chrono::Duration;
//! use taskshare_shared::auth::jwt::TokenService;
//! use taskshare_shared::auth::middleware::{jwt_auth_middleware, AuthContext};
//! use taskshare_shared::store::memory::MemoryStore;
//!
//! async fn whoami(auth: AuthContext) -> String {
//!     auth.username
//! }
//!
//! let store = Arc::new(MemoryStore::new());
//! let tokens = Arc::new(TokenService::new("a-secret-key-of-at-least-32-bytes!", Duration::minutes(30)));
//!
//! let app: Router = Router::new()
//!     .route("/whoami", get(whoami))
//!     .layer(middleware::from_fn(move |req, next| {
//!         jwt_auth_middleware(store.clone(), tokens.clone(), req, next)
//!     }));
//! ```

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::jwt::{JwtError, TokenService};
use crate::store::CredentialStore;

/// Authenticated requester added to request extensions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: i64,

    /// Username the token was issued for
    pub username: String,
}

/// Error type for authentication middleware
#[derive(Debug)]
pub enum AuthError {
    /// Missing authorization header
    MissingCredentials,

    /// Header present but not `Bearer <token>`
    InvalidFormat(String),

    /// Token validation failed
    InvalidToken(String),

    /// Token is valid but its subject no longer exists
    UnknownSubject(String),

    /// Store lookup failed
    Store(String),
}

impl AuthError {
    fn status(&self) -> StatusCode {
        match self {
            AuthError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    fn message(&self) -> &str {
        match self {
            AuthError::MissingCredentials => "Not authenticated",
            AuthError::InvalidFormat(msg) | AuthError::InvalidToken(msg) => msg,
            AuthError::UnknownSubject(_) => "Could not validate credentials",
            AuthError::Store(_) => "Internal server error",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let AuthError::Store(msg) = &self {
            tracing::error!("Authentication lookup failed: {}", msg);
        }

        let error = if status == StatusCode::UNAUTHORIZED {
            "unauthorized"
        } else {
            "internal_error"
        };
        let body = Json(json!({
            "error": error,
            "message": self.message(),
        }));

        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// Resolves an `Authorization` header value to the requesting user
///
/// # Errors
///
/// - `MissingCredentials` if there is no header
/// - `InvalidFormat` if it is not a bearer credential
/// - `InvalidToken` if the token fails verification
/// - `UnknownSubject` if the token names a user that does not exist
pub async fn authenticate<S>(
    store: &S,
    tokens: &TokenService,
    authorization: Option<&str>,
) -> Result<AuthContext, AuthError>
where
    S: CredentialStore + ?Sized,
{
    let authorization = authorization.ok_or(AuthError::MissingCredentials)?;

    // Scheme is case-insensitive
    let token = authorization
        .split_once(' ')
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    let claims = tokens.verify(token).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer { .. } => AuthError::InvalidToken("Invalid issuer".to_string()),
        _ => AuthError::InvalidToken("Could not validate credentials".to_string()),
    })?;

    let user = store
        .find_user_by_username(&claims.sub)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?
        .ok_or_else(|| AuthError::UnknownSubject(claims.sub.clone()))?;

    Ok(AuthContext {
        user_id: user.id,
        username: user.username,
    })
}

/// JWT authentication middleware
///
/// Adds [`AuthContext`] to the request extensions on success and answers
/// 401 otherwise.
pub async fn jwt_auth_middleware<S>(
    store: Arc<S>,
    tokens: Arc<TokenService>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    S: CredentialStore + ?Sized,
{
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let auth_context = authenticate(store.as_ref(), &tokens, header.as_deref()).await?;
    tracing::debug!(user_id = auth_context.user_id, "Request authenticated");

    req.extensions_mut().insert(auth_context);
    Ok(next.run(req).await)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AuthError::MissingCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::CreateUser;
    use crate::store::memory::MemoryStore;
    use chrono::Duration;

    fn tokens() -> TokenService {
        TokenService::new("test-secret-key-at-least-32-bytes-long", Duration::minutes(30))
    }

    async fn store_with_alice() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .create_user(CreateUser {
                username: "alice".to_string(),
                password_digest: "digest".to_string(),
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_valid_token_resolves_user() {
        let store = store_with_alice().await;
        let tokens = tokens();
        let header = format!("Bearer {}", tokens.issue("alice").unwrap());

        let context = authenticate(&store, &tokens, Some(&header)).await.unwrap();
        assert_eq!(context.username, "alice");
        assert_eq!(context.user_id, 1);
    }

    #[tokio::test]
    async fn test_missing_and_malformed_headers() {
        let store = store_with_alice().await;
        let tokens = tokens();

        assert!(matches!(
            authenticate(&store, &tokens, None).await,
            Err(AuthError::MissingCredentials)
        ));
        assert!(matches!(
            authenticate(&store, &tokens, Some("Basic abc")).await,
            Err(AuthError::InvalidFormat(_))
        ));
        assert!(matches!(
            authenticate(&store, &tokens, Some("Bearer ")).await,
            Err(AuthError::InvalidFormat(_))
        ));
        assert!(matches!(
            authenticate(&store, &tokens, Some("Bearer garbage")).await,
            Err(AuthError::InvalidToken(_))
        ));
        assert!(matches!(
            authenticate(&store, &tokens, Some("Bearertoken")).await,
            Err(AuthError::InvalidFormat(_))
        ));
    }

    #[tokio::test]
    async fn test_scheme_is_case_insensitive() {
        let store = store_with_alice().await;
        let tokens = tokens();
        let token = tokens.issue("alice").unwrap();

        for scheme in ["bearer", "BEARER", "Bearer"] {
            let header = format!("{} {}", scheme, token);
            let context = authenticate(&store, &tokens, Some(&header)).await.unwrap();
            assert_eq!(context.username, "alice");
        }
    }

    #[tokio::test]
    async fn test_token_for_unknown_user() {
        let store = store_with_alice().await;
        let tokens = tokens();
        let header = format!("Bearer {}", tokens.issue("ghost").unwrap());

        assert!(matches!(
            authenticate(&store, &tokens, Some(&header)).await,
            Err(AuthError::UnknownSubject(_))
        ));
    }

    #[tokio::test]
    async fn test_expired_token() {
        let store = store_with_alice().await;
        let tokens = tokens();
        let token = tokens
            .issue_with_expiration("alice", Duration::minutes(-5))
            .unwrap();
        let header = format!("Bearer {}", token);

        assert!(matches!(
            authenticate(&store, &tokens, Some(&header)).await,
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_auth_error_into_response() {
        let response = AuthError::MissingCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );

        let response = AuthError::InvalidFormat("bad".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AuthError::Store("down".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
