//! API router and OpenAPI document

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::FromRef,
    middleware,
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use super::common::ApiResponse;
use super::modules::health::{self, HealthState};
use super::modules::metrics::{http_metrics_middleware, prometheus_metrics, MetricsState};
use super::modules::parking::{self, ParkingState};
use super::modules::webhook::{self, WebhookState};
use crate::application::{LifecycleEngine, QueryService, ReconciliationPoller};
use crate::domain::RepositoryProvider;

/// Everything the HTTP handlers need; each module extracts its own slice via `FromRef`.
#[derive(Clone)]
pub struct ApiState {
    pub engine: Arc<LifecycleEngine>,
    pub queries: Arc<QueryService>,
    pub repos: Arc<dyn RepositoryProvider>,
    pub poller: Option<Arc<ReconciliationPoller>>,
    pub started_at: Arc<Instant>,
}

impl FromRef<ApiState> for WebhookState {
    fn from_ref(s: &ApiState) -> Self {
        WebhookState {
            engine: Arc::clone(&s.engine),
        }
    }
}

impl FromRef<ApiState> for ParkingState {
    fn from_ref(s: &ApiState) -> Self {
        ParkingState {
            queries: Arc::clone(&s.queries),
        }
    }
}

impl FromRef<ApiState> for HealthState {
    fn from_ref(s: &ApiState) -> Self {
        HealthState {
            repos: Arc::clone(&s.repos),
            poller: s.poller.clone(),
            started_at: Arc::clone(&s.started_at),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        webhook::receive_event,
        parking::plate_status,
        parking::spot_status,
        parking::get_revenue,
        parking::post_revenue,
        parking::get_garage,
    ),
    components(
        schemas(
            ApiResponse<String>,
            health::HealthResponse,
            health::ComponentHealth,
            webhook::WebhookPayload,
            webhook::WebhookAck,
            parking::PlateStatusRequest,
            parking::PlateStatusResponse,
            parking::SpotStatusRequest,
            parking::SpotStatusResponse,
            parking::RevenueRequest,
            parking::RevenueResponse,
            parking::SectorDto,
            parking::SpotDto,
            parking::GarageResponse,
        )
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Webhook", description = "Vehicle events pushed by the garage simulator"),
        (name = "Parking", description = "Plate, spot, revenue and garage status queries"),
    ),
    info(
        title = "Garage Service API",
        version = "1.0.0",
        description = "Vehicle lifecycle, occupancy-tiered pricing and daily revenue for a parking garage",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the HTTP router. `/metrics` is mounted only when a Prometheus handle is given.
pub fn create_api_router(state: ApiState, metrics: Option<PrometheusHandle>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/plate-status", post(parking::plate_status))
        .route("/spot-status", post(parking::spot_status))
        .route(
            "/revenue",
            get(parking::get_revenue).post(parking::post_revenue),
        )
        .route("/garage", get(parking::get_garage));

    let mut router = Router::new()
        .route("/health", get(health::health_check))
        .route("/webhook", post(webhook::receive_event))
        .nest("/api", api_routes)
        .route("/api-docs/openapi.json", get(openapi_json))
        .with_state(state);

    if let Some(handle) = metrics {
        router = router.merge(
            Router::new()
                .route("/metrics", get(prometheus_metrics))
                .with_state(MetricsState { handle }),
        );
    }

    router
        .layer(middleware::from_fn(http_metrics_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::Service;

    use crate::application::services::test_support::Fixture;

    fn router(fx: &Fixture) -> Router {
        create_api_router(
            ApiState {
                engine: fx.engine.clone(),
                queries: fx.queries.clone(),
                repos: fx.repos.clone(),
                poller: None,
                started_at: Arc::new(Instant::now()),
            },
            None,
        )
    }

    async fn send(svc: &mut Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = svc.call(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn openapi_lists_every_route() {
        let fx = Fixture::new();
        let mut svc = router(&fx);
        let (status, doc) = send(
            &mut svc,
            Request::builder().uri("/api-docs/openapi.json").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        for path in [
            "/health",
            "/webhook",
            "/api/plate-status",
            "/api/spot-status",
            "/api/revenue",
            "/api/garage",
        ] {
            assert!(doc["paths"].get(path).is_some(), "missing {}", path);
        }
    }

    #[tokio::test]
    async fn webhook_then_status_through_full_router() {
        let fx = Fixture::with_sector("B", 2, &[(7, -23.5, -46.6)]).await;
        let mut svc = router(&fx);

        let (status, _) = send(
            &mut svc,
            post_json("/webhook", json!({"event_type": "ENTRY", "license_plate": "ABC1D23"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            &mut svc,
            post_json(
                "/webhook",
                json!({"event_type": "PARKED", "license_plate": "ABC1D23", "lat": -23.5, "lng": -46.6}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &mut svc,
            post_json("/api/spot-status", json!({"lat": -23.5, "lng": -46.6})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["license_plate"], "ABC1D23");

        let (status, body) = send(
            &mut svc,
            Request::builder().uri("/health").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["poller"]["status"], "disabled");
    }

    #[tokio::test]
    async fn metrics_route_absent_without_recorder() {
        let fx = Fixture::new();
        let mut svc = router(&fx);
        let (status, _) = send(
            &mut svc,
            Request::builder().uri("/metrics").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
