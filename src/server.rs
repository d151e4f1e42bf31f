//! Server runtime
//!
//! [`ServerHandle`] owns the whole service lifecycle: storage (and
//! migrations), the lifecycle services, the reconciliation poller, the REST
//! API and graceful shutdown.

use std::sync::{Arc, OnceLock};
use std::time::Instant;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sea_orm::DatabaseConnection;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::application::{
    LifecycleEngine, OccupancyStore, QueryService, ReconciliationPoller, RevenueLedger,
};
use crate::config::{AppConfig, StorageBackend};
use crate::domain::RepositoryProvider;
use crate::infrastructure::{
    connect, HttpSnapshotSource, InMemoryRepositoryProvider, SeaOrmRepositoryProvider,
};
use crate::interfaces::http::modules::metrics::describe_metrics;
use crate::interfaces::http::{create_api_router, ApiState};
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};
use crate::shared::types::{SharedClock, SystemClock};

pub struct ServerOptions {
    pub config: AppConfig,
    /// Run database migrations on startup (default: true)
    pub auto_migrate: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
        }
    }
}

/// Handle to a running garage service.
///
/// ```rust,no_run
/// use garage_service::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     handle.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    pub repos: Arc<dyn RepositoryProvider>,
    pub engine: Arc<LifecycleEngine>,
    pub queries: Arc<QueryService>,
    pub poller: Option<Arc<ReconciliationPoller>>,
    pub config: AppConfig,
    /// Port the API is actually bound to (differs from config when it is 0)
    pub api_port: u16,

    db: Option<DatabaseConnection>,
    shutdown: ShutdownCoordinator,
    api_task: JoinHandle<()>,
    poller_task: Option<JoinHandle<()>>,
}

impl ServerHandle {
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let app_cfg = opts.config;
        app_cfg.validate()?;

        info!("Starting garage service...");
        let prometheus_handle = prometheus_handle();

        // ── Storage ────────────────────────────────────────────
        let (repos, db): (Arc<dyn RepositoryProvider>, Option<DatabaseConnection>) =
            match app_cfg.database.backend {
                StorageBackend::Sqlite => {
                    let db = connect(&app_cfg.database_config(), opts.auto_migrate).await?;
                    (Arc::new(SeaOrmRepositoryProvider::new(db.clone())), Some(db))
                }
                StorageBackend::Memory => {
                    info!("Using in-memory storage; state is lost on exit");
                    (Arc::new(InMemoryRepositoryProvider::new()), None)
                }
            };

        // ── Services ───────────────────────────────────────────
        let clock: SharedClock = Arc::new(SystemClock);
        let occupancy = Arc::new(OccupancyStore::new(repos.clone()));
        let ledger = Arc::new(RevenueLedger::new(repos.clone()));
        let engine = Arc::new(LifecycleEngine::new(
            repos.clone(),
            occupancy.clone(),
            ledger.clone(),
            clock.clone(),
        ));
        let queries = Arc::new(QueryService::new(
            repos.clone(),
            occupancy.clone(),
            ledger,
            clock,
            app_cfg.pricing.currency.clone(),
        ));

        let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
        let shutdown_signal = shutdown.signal();

        // ── Reconciliation poller ──────────────────────────────
        let (poller, poller_task) = if app_cfg.poller.enabled {
            let source = HttpSnapshotSource::new(
                &app_cfg.poller.base_url,
                &app_cfg.poller.garage_path,
                app_cfg.poller.request_timeout(),
            )?;
            info!(url = source.url(), "Garage feed configured");

            let poller = Arc::new(
                ReconciliationPoller::new(Arc::new(source), occupancy, engine.clone())
                    .with_config(app_cfg.poller.to_poller_config()),
            );
            let task = poller.clone().start(shutdown_signal.clone());
            (Some(poller), Some(task))
        } else {
            info!("Reconciliation poller disabled");
            (None, None)
        };

        // ── REST API ───────────────────────────────────────────
        let api_router = create_api_router(
            ApiState {
                engine: engine.clone(),
                queries: queries.clone(),
                repos: repos.clone(),
                poller: poller.clone(),
                started_at: Arc::new(Instant::now()),
            },
            prometheus_handle,
        );

        let api_addr = format!("{}:{}", app_cfg.server.api_host, app_cfg.server.api_port);
        let listener = tokio::net::TcpListener::bind(&api_addr).await?;
        let api_port = listener.local_addr()?.port();
        info!("REST API server listening on http://{}:{}", app_cfg.server.api_host, api_port);
        info!(
            "OpenAPI document at http://{}:{}/api-docs/openapi.json",
            app_cfg.server.api_host, api_port
        );

        let api_shutdown = shutdown_signal.clone();
        let api_server = axum::serve(listener, api_router).with_graceful_shutdown(async move {
            api_shutdown.wait().await;
            info!("🛑 REST API server received shutdown signal");
        });

        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("REST API server error: {}", e);
            }
        });

        info!("🚀 Garage service started");

        Ok(Self {
            repos,
            engine,
            queries,
            poller,
            config: app_cfg,
            api_port,
            db,
            shutdown,
            api_task,
            poller_task,
        })
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install SIGTERM/SIGINT listeners that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for the API server and poller to stop once shutdown was triggered.
    pub async fn wait(self) {
        info!("⏳ Waiting for server tasks to complete...");
        let timeout = self.shutdown.timeout();

        let tasks = async {
            if let Err(e) = self.api_task.await {
                error!("REST API server task panicked: {}", e);
            }
            if let Some(task) = self.poller_task {
                if let Err(e) = task.await {
                    error!("Reconciliation poller task panicked: {}", e);
                }
            }
        };
        if tokio::time::timeout(timeout, tasks).await.is_err() {
            warn!(timeout_secs = timeout.as_secs(), "Shutdown timed out, abandoning tasks");
        }

        if let Some(db) = self.db {
            if let Err(e) = db.close().await {
                warn!("Error closing database connection: {}", e);
            } else {
                info!("✅ Database connection closed");
            }
        }

        info!("👋 Garage service shutdown complete");
    }

    pub async fn shutdown(self) {
        info!("🛑 Shutting down garage service...");
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

/// The global recorder can be installed once per process; later starts reuse it.
fn prometheus_handle() -> Option<PrometheusHandle> {
    static PROM_HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

    PROM_HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                describe_metrics();
                info!("📊 Prometheus metrics recorder installed");
                Some(handle)
            }
            Err(e) => {
                warn!(error = %e, "Prometheus recorder unavailable, /metrics disabled");
                None
            }
        })
        .clone()
}

/// Initialize tracing from the logging config. `RUST_LOG` wins over `logging.level`.
///
/// Call once at process startup, before [`ServerHandle::start`].
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match config.logging.format.to_lowercase().as_str() {
        "json" => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        _ => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };
    if let Err(e) = result {
        eprintln!("tracing already initialized: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.server.api_host = "127.0.0.1".into();
        config.server.api_port = 0;
        config.server.shutdown_timeout = 5;
        config.database.backend = StorageBackend::Memory;
        config.poller.enabled = false;
        config
    }

    #[tokio::test]
    async fn serves_health_and_shuts_down() {
        let handle = ServerHandle::start(ServerOptions {
            config: memory_config(),
            auto_migrate: false,
        })
        .await
        .unwrap();
        assert!(handle.is_running());
        assert!(handle.poller.is_none());

        let url = format!("http://127.0.0.1:{}/health", handle.api_port);
        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "ok");

        let metrics = reqwest::get(format!("http://127.0.0.1:{}/metrics", handle.api_port))
            .await
            .unwrap();
        assert_eq!(metrics.status().as_u16(), 200);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn sqlite_backend_with_poller() {
        let mut config = memory_config();
        config.database.backend = StorageBackend::Sqlite;
        config.database.url = "sqlite::memory:".into();
        config.poller.enabled = true;
        config.poller.base_url = "http://127.0.0.1:9".into();
        config.poller.initial_delay_secs = 60;

        let handle = ServerHandle::start(ServerOptions {
            config,
            auto_migrate: true,
        })
        .await
        .unwrap();
        let poller = handle.poller.clone().unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(poller.is_running().await);

        handle.shutdown().await;
        assert!(!poller.is_running().await);
    }

    #[tokio::test]
    async fn rejects_invalid_config() {
        let mut config = memory_config();
        config.pricing.currency = " ".into();
        assert!(ServerHandle::start(ServerOptions {
            config,
            auto_migrate: false,
        })
        .await
        .is_err());
    }
}
