//! Internal expense-reporting API: authenticated staff submit payment
//! requests split across store locations, with attachment upload to object
//! storage and best-effort email notification to an approvals inbox.

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod services;

use auth::rate_limit::{LoginRateLimitConfig, LoginRateLimiter};
use auth::AuthService;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, patch, post};
use axum::Router;
use config::AppConfig;
use db::DbPool;
use services::{Mailer, PagoService, StorageService};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Request body cap: room for five 10 MiB attachments plus form overhead.
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Everything handlers need, cloned per request. All members are cheap
/// handles over shared resources.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DbPool,
    pub auth: AuthService,
    pub pagos: PagoService,
    pub storage: StorageService,
    pub mailer: Mailer,
}

impl AppState {
    pub fn new(config: AppConfig, db: DbPool) -> Self {
        let limiter = LoginRateLimiter::new(LoginRateLimitConfig {
            max_attempts: config.login_max_attempts,
            window: Duration::from_secs(config.login_window_secs),
        });
        let auth = AuthService::new(db.clone(), config.session_ttl_hours, limiter);
        let pagos = PagoService::new(db.clone(), config.op_editor.clone());
        let storage = StorageService::from_config(&config);
        let mailer = Mailer::from_config(&config);
        Self {
            config: Arc::new(config),
            db,
            auth,
            pagos,
            storage,
            mailer,
        }
    }
}

fn cors_layer(cfg: &AppConfig) -> CorsLayer {
    match cfg.cors_allowed_origins.as_deref() {
        Some(origins) => {
            let origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods([Method::GET, Method::POST, Method::PATCH])
                .allow_headers([header::CONTENT_TYPE])
                .allow_credentials(true)
        }
        None => CorsLayer::permissive(),
    }
}

/// Builds the full application router.
pub fn app_router(state: AppState) -> Router {
    let cors = cors_layer(state.config.as_ref());
    Router::new()
        .route("/health", get(handlers::common::health))
        .route("/api/login", post(handlers::auth::login))
        .route("/api/logout", post(handlers::auth::logout))
        .route("/api/check-auth", get(handlers::auth::check_auth))
        .route(
            "/api/pagos",
            post(handlers::pagos::create_pago).get(handlers::pagos::list_pagos),
        )
        .route("/api/pagos/:id/op", patch(handlers::pagos::update_op))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
