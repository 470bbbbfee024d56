use std::sync::Arc;

use axum::{
    Json, Router,
    routing::{get, post, put},
};

pub mod auth;
pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod models;
pub mod reports;
pub mod transactions;
pub mod utils;
pub mod wallets;

use auth::IdentityVerifier;
use database::Db;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub verifier: Arc<dyn IdentityVerifier>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/wallets", post(wallets::create).get(wallets::list))
        .route("/wallets/transfer", post(wallets::transfer))
        .route(
            "/wallets/{id}",
            put(wallets::update).delete(wallets::delete),
        )
        .route(
            "/transactions",
            post(transactions::create).get(transactions::list),
        )
        .route(
            "/transactions/{id}",
            put(transactions::update).delete(transactions::delete),
        )
        .route("/reports/summary", get(reports::summary))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
