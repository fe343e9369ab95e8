//! # Shared Handlers
//!
//! Endpoints that are neither pages nor admin calls.

use super::types::HealthResponse;
use axum::{Json, response::IntoResponse};

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}
