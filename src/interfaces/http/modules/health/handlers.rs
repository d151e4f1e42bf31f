//! Health check handler

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::ReconciliationPoller;
use crate::domain::RepositoryProvider;

#[derive(Clone)]
pub struct HealthState {
    pub repos: Arc<dyn RepositoryProvider>,
    /// `None` when the poller is disabled
    pub poller: Option<Arc<ReconciliationPoller>>,
    pub started_at: Arc<Instant>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub storage: ComponentHealth,
    pub poller: ComponentHealth,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ComponentHealth {
    pub status: String,
    pub latency_ms: Option<u64>,
}

impl ComponentHealth {
    fn status(status: &str) -> Self {
        Self {
            status: status.to_string(),
            latency_ms: None,
        }
    }
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Storage unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let storage_start = Instant::now();
    let storage = match state.repos.sectors().find_all().await {
        Ok(_) => ComponentHealth {
            status: "ok".to_string(),
            latency_ms: Some(storage_start.elapsed().as_millis() as u64),
        },
        Err(e) => {
            tracing::warn!(error = %e, "Health check: storage unreachable");
            ComponentHealth::status("error")
        }
    };

    let poller = ComponentHealth::status(match &state.poller {
        Some(p) => {
            if p.is_running().await {
                "running"
            } else {
                "stopped"
            }
        }
        None => "disabled",
    });

    let (http_status, overall) = if storage.status == "ok" {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        http_status,
        Json(HealthResponse {
            status: overall.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: state.started_at.elapsed().as_secs(),
            storage,
            poller,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::InMemoryRepositoryProvider;

    #[tokio::test]
    async fn healthy_with_disabled_poller() {
        let state = HealthState {
            repos: Arc::new(InMemoryRepositoryProvider::new()),
            poller: None,
            started_at: Arc::new(Instant::now()),
        };
        let (status, Json(body)) = health_check(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ok");
        assert_eq!(body.storage.status, "ok");
        assert_eq!(body.poller.status, "disabled");
        assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
    }
}
