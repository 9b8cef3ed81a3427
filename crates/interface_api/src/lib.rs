//! HTTP API Layer
//!
//! This crate provides the REST API for the ledger engine using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Append, reversal, balance, history and audit endpoints
//! - **Middleware**: Tracing and audit logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Consistent error responses with a retryable hint
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::new(store, config).with_pool(pool);
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use domain_ledger::{EntryStore, Ledger, LedgerConfig, QueryService};

use crate::config::ApiConfig;
use crate::handlers::{health, ledger};
use crate::middleware::audit_middleware;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Ledger>,
    pub queries: QueryService,
    pub config: ApiConfig,
    /// Present when backed by PostgreSQL; used by the readiness probe
    pub pool: Option<PgPool>,
}

impl AppState {
    /// Builds the state over any entry store
    pub fn new(store: Arc<dyn EntryStore>, config: ApiConfig) -> Self {
        let ledger_config = LedgerConfig {
            allow_chained_reversal: config.allow_chained_reversal,
            ..LedgerConfig::default()
        };

        Self {
            ledger: Arc::new(Ledger::new(Arc::clone(&store), ledger_config)),
            queries: QueryService::new(store),
            config,
            pool: None,
        }
    }

    /// Attaches the database pool for readiness checks
    pub fn with_pool(mut self, pool: PgPool) -> Self {
        self.pool = Some(pool);
        self
    }
}

/// Creates the main API router
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    // Public routes
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    // Ledger routes
    let ledger_routes = Router::new()
        .route("/entries", post(ledger::append_entry))
        .route("/entries/:id", get(ledger::get_entry))
        .route("/entries/:id/reverse", post(ledger::reverse_entry))
        .route("/owners/:kind/:id/balance", get(ledger::get_balance))
        .route("/owners/:kind/:id/history", get(ledger::get_history))
        .route("/owners/:kind/:id/audit", get(ledger::export_audit));

    let api_routes = Router::new()
        .nest("/ledger", ledger_routes)
        .layer(axum_middleware::from_fn(audit_middleware));

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
