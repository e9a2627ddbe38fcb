//! Service HTTP Routes
//!
//! Liveness probe and service banner.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use super::response::{ok, ApiResponse};

/// Name reported by `GET /`; existing clients read this banner
pub const SERVICE_NAME: &str = "cloudrun-nodedb";

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Service banner
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub env: String,
}

/// Create `/health` and `/`
pub fn health_routes(env_id: &str) -> Router {
    let info = Arc::new(ServiceInfo {
        service: SERVICE_NAME,
        env: env_id.to_string(),
    });

    Router::new()
        .route("/health", get(health_handler))
        .route("/", get(info_handler))
        .with_state(info)
}

async fn health_handler() -> Json<ApiResponse<HealthResponse>> {
    ok(HealthResponse { status: "healthy" })
}

async fn info_handler(State(info): State<Arc<ServiceInfo>>) -> Json<ApiResponse<ServiceInfo>> {
    ok(info.as_ref().clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let json = serde_json::to_value(HealthResponse { status: "healthy" }).unwrap();
        assert_eq!(json["status"], "healthy");
    }
}
