pub mod auth;
pub mod error;
pub mod extract;
pub mod follow;
pub mod likes;
pub mod posts;
pub mod search;
pub mod users;

pub use error::{ApiError, ApiResult};

use axum::Json;

/// GET /health - Liveness probe
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Fallback for unmatched routes
pub async fn not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}
