//! HTTP client for the garage occupancy feed

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::application::reconciliation::{GarageSnapshot, SnapshotSource};
use crate::shared::errors::InfraError;

/// Fetches `GET {base_url}/{path}` and decodes it as a [`GarageSnapshot`].
pub struct HttpSnapshotSource {
    client: reqwest::Client,
    url: String,
}

impl HttpSnapshotSource {
    pub fn new(base_url: &str, path: &str, timeout: Duration) -> Result<Self, InfraError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: join_url(base_url, path),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn join_url(base_url: &str, path: &str) -> String {
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return base_url.trim_end_matches('/').to_string();
    }
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

#[async_trait]
impl SnapshotSource for HttpSnapshotSource {
    async fn fetch(&self) -> Result<GarageSnapshot, InfraError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(InfraError::UnexpectedStatus {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        let body = response.bytes().await?;
        let snapshot: GarageSnapshot = serde_json::from_slice(&body)?;
        debug!(
            url = %self.url,
            sectors = snapshot.garage.len(),
            spots = snapshot.spots.len(),
            "Garage snapshot fetched"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Router};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn joins_base_and_path() {
        assert_eq!(join_url("http://sim:3000/", "/garage"), "http://sim:3000/garage");
        assert_eq!(join_url("http://sim:3000", "garage"), "http://sim:3000/garage");
        assert_eq!(join_url("http://sim:3000/garage", ""), "http://sim:3000/garage");
    }

    #[tokio::test]
    async fn fetches_and_decodes_snapshot() {
        let body = r#"{"garage":[{"sector":"A","basePrice":10.0,"max_capacity":2,
            "open_hour":"00:00","close_hour":"23:59","duration_limit_minutes":60}],
            "spots":[{"id":1,"sector":"A","lat":1.5,"lng":2.5,"occupied":true}]}"#;
        let base = serve(Router::new().route("/garage", get(move || async move { body }))).await;

        let source = HttpSnapshotSource::new(&base, "/garage", Duration::from_secs(2)).unwrap();
        let snapshot = source.fetch().await.unwrap();
        assert_eq!(snapshot.garage[0].sector, "A");
        assert!(snapshot.spots[0].occupied);
    }

    #[tokio::test]
    async fn server_errors_are_transient() {
        let base = serve(Router::new().route(
            "/garage",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
        ))
        .await;

        let source = HttpSnapshotSource::new(&base, "garage", Duration::from_secs(2)).unwrap();
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, InfraError::UnexpectedStatus { status: 503, .. }));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn malformed_body_is_a_serialization_error() {
        let base = serve(Router::new().route("/garage", get(|| async { "not json" }))).await;
        let source = HttpSnapshotSource::new(&base, "garage", Duration::from_secs(2)).unwrap();
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, InfraError::Serialization(_)));
        assert!(!err.is_transient());
    }
}
