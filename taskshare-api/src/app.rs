//! Application state and router builder
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use taskshare_api::{app::{build_router, AppState}, config::Config};
//! use taskshare_shared::db::pool::create_pool;
//! use taskshare_shared::store::postgres::PgStore;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let pool = create_pool(config.pool_config()).await?;
//! let state = AppState::new(Arc::new(PgStore::new(pool)), config);
//! let app = build_router(state);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post},
    Router,
};
use chrono::Duration;
use taskshare_shared::auth::{
    jwt::TokenService,
    middleware::{jwt_auth_middleware, AuthError},
    password::PasswordService,
};
use taskshare_shared::store::Store;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{config::Config, middleware::security::SecurityHeadersLayer, routes};

/// Shared application state
///
/// Cloned into every handler through Axum's `State` extractor; all fields
/// are reference-counted.
#[derive(Clone)]
pub struct AppState {
    /// Users, tasks and permissions
    pub store: Arc<dyn Store>,

    /// Bearer token issuance and validation
    pub tokens: Arc<TokenService>,

    /// Password hashing
    pub passwords: Arc<PasswordService>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates state with token and password services derived from `config`
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        let tokens = TokenService::new(
            &config.jwt.secret,
            Duration::minutes(config.jwt.expiration_minutes),
        );

        Self::with_services(store, tokens, PasswordService::default(), config)
    }

    /// Creates state from explicit services
    pub fn with_services(
        store: Arc<dyn Store>,
        tokens: TokenService,
        passwords: PasswordService,
        config: Config,
    ) -> Self {
        Self {
            store,
            tokens: Arc::new(tokens),
            passwords: Arc::new(passwords),
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET    /                  # Service banner (public)
/// ├── GET    /health            # Health check (public)
/// ├── POST   /register          # Create account (public)
/// ├── POST   /login             # Exchange credentials for a token (public)
/// ├── /tasks                    # Bearer token required
/// │   ├── POST   /              # Create task
/// │   ├── GET    /              # Owned tasks, then shared tasks
/// │   ├── GET    /:id           # View
/// │   ├── PUT    /:id           # Edit
/// │   └── DELETE /:id           # Delete (owner only)
/// └── /permissions              # Bearer token required
///     ├── POST   /              # Grant (owner only)
///     └── DELETE /:id           # Revoke (owner only)
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Security headers
/// 4. Authentication (protected routes only)
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health_check))
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    let protected_routes = Router::new()
        .route(
            "/tasks",
            post(routes::tasks::create_task).get(routes::tasks::list_tasks),
        )
        .route(
            "/tasks/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/permissions", post(routes::permissions::create_permission))
        .route(
            "/permissions/:id",
            delete(routes::permissions::delete_permission),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Resolves the bearer token to an `AuthContext` in request extensions
async fn jwt_auth_layer(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    jwt_auth_middleware(state.store.clone(), state.tokens.clone(), req, next).await
}
