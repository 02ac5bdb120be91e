//! Route Definitions
//!
//! Maps URLs to handlers with type-safe routing.

use super::handlers::*;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Build the API router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_handler))
        // Game play endpoints
        .route("/api/dice/play", post(play_dice))
        .route("/api/flip/play", post(play_flip))
        // Bet lookup and provably-fair verification
        .route("/api/bet/:bet_id", get(get_bet))
        .route("/api/verify/:bet_id", get(verify_bet_handler))
        // Account surface (auth handled upstream)
        .route("/api/account", post(create_account_handler))
        .route("/api/account/:id", get(get_account))
        .route("/api/account/:id/deposit", post(deposit_handler))
        .route("/api/account/:id/bets", get(bet_history_handler))
        // Platform totals
        .route("/api/stats", get(stats_handler))
        // Metrics endpoint for Prometheus
        .route("/metrics", get(metrics_handler))
        // Attach shared state
        .with_state(state)
}
