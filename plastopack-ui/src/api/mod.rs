//! REST API implementation for the PlastoPack UI service

pub mod auth;
pub mod calculator;
pub mod rate_card;
pub mod rates;
pub mod users;

use axum::{
    extract::State,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use serde_json::json;
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database pool
    pub db: SqlitePool,
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check (no prefix for health endpoint)
        .route("/health", get(health_check))

        // Printable rate card (pure projection of calculator output)
        .route("/rate-card", get(rate_card::rate_card_page))

        // API v1 routes
        .nest("/api/v1", Router::new()
            // Authentication endpoints
            .route("/auth/login", post(auth::login))
            .route("/auth/otp", post(auth::generate_otp))
            .route("/auth/otp/revoke", post(auth::revoke_otp))

            // User administration endpoints
            .route("/users", get(users::list_users))
            .route("/users", post(users::add_user))
            .route("/users/:id", put(users::update_admin))
            .route("/users/:id", delete(users::delete_user))
            .route("/users/:id/exists", get(users::user_exists))

            // Material rate endpoints
            .route("/rates", get(rates::get_rates))
            .route("/rates/update", post(rates::update_rate))
            .route("/rates/submit", post(rates::submit_rates))
            .route("/rates/history", post(rates::record_history))
            .route("/rates/history", get(rates::get_history))

            // Pricing engine
            .route("/calculate", post(calculator::calculate))
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "module": "plastopack-ui",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
