//! Liveness and dependency health.

use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::AppState;

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// OK or DEGRADED
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub environment: String,
    pub services: ServiceHealth,
}

/// Individual service health status
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceHealth {
    pub database: ServiceStatus,
    pub rate_limiter: ServiceStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceStatus {
    fn from_result<E: std::fmt::Display>(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self {
                status: "healthy".to_string(),
                error: None,
            },
            Err(e) => Self {
                status: "unhealthy".to_string(),
                error: Some(e.to_string()),
            },
        }
    }

    fn is_healthy(&self) -> bool {
        self.error.is_none()
    }
}

/// API liveness plus database and rate-limit store connectivity
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses(
        (status = 200, description = "All dependencies reachable", body = HealthResponse),
        (status = 503, description = "A dependency is unreachable", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (db, limiter) = tokio::join!(state.database.ping(), state.rate_limiter.ping());
    let services = ServiceHealth {
        database: ServiceStatus::from_result(db),
        rate_limiter: ServiceStatus::from_result(limiter),
    };
    let all_healthy = services.database.is_healthy() && services.rate_limiter.is_healthy();

    let response = HealthResponse {
        status: if all_healthy { "OK" } else { "DEGRADED" }.to_string(),
        message: "Jewelry Showcase API is running".to_string(),
        timestamp: Utc::now(),
        environment: state.environment.clone(),
        services,
    };

    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}
