//! DrugReg HTTP Gateway
//!
//! The entry point for all external API requests.
//! Handles:
//! - Request routing to the repositories
//! - Bearer authentication (when configured)
//! - Drug-created notifications to the execution service
//! - Observability (logging, metrics, request ids)

mod extract;
mod handlers;
mod middleware;
mod routes;

use anyhow::Context;
use drugreg_common::{
    config::{AppConfig, ObservabilityConfig},
    db::{
        BatchRepository, CatalogKind, CatalogRepository, DbPool, DrugRepository,
        RegistrationRepository,
    },
    metrics as app_metrics,
    notifier::{DisabledNotifier, DrugNotifier, ExecsClient},
    ValidationEngine,
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DbPool,
    pub validator: Arc<ValidationEngine>,
    pub notifier: Arc<dyn DrugNotifier>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, db: DbPool) -> anyhow::Result<Self> {
        let notifier: Arc<dyn DrugNotifier> = match &config.notifier.base_url {
            Some(url) => {
                info!(url = %url, "Drug notifications enabled");
                Arc::new(ExecsClient::new(url.as_str(), config.notifier_timeout())?)
            }
            None => {
                warn!("No notifier base_url configured; drug notifications disabled");
                Arc::new(DisabledNotifier)
            }
        };

        Ok(Self {
            config,
            db,
            validator: Arc::new(ValidationEngine::standard()),
            notifier,
        })
    }

    pub fn catalog<K: CatalogKind>(&self) -> CatalogRepository<K> {
        CatalogRepository::new(self.db.clone(), self.validator.clone())
    }

    pub fn drugs(&self) -> DrugRepository {
        DrugRepository::new(self.db.clone(), self.validator.clone())
    }

    pub fn batches(&self) -> BatchRepository {
        BatchRepository::new(self.db.clone(), self.validator.clone())
    }

    pub fn registrations(&self) -> RegistrationRepository {
        RegistrationRepository::new(self.db.clone(), self.validator.clone())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Arc::new(AppConfig::load().context("failed to load configuration")?);

    init_tracing(&config.observability);
    info!(
        version = drugreg_common::VERSION,
        service = %config.observability.service_name,
        "Starting DrugReg gateway"
    );

    init_metrics(config.observability.metrics_port)?;

    let db = DbPool::new(&config.database).await?;
    if config.database.run_migrations {
        db.migrate().await?;
    }

    let state = AppState::new(config.clone(), db)?;
    let app = routes::create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server address")?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &ObservabilityConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    if config.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Install the Prometheus exporter; port `0` disables it
fn init_metrics(port: u16) -> anyhow::Result<()> {
    if port == 0 {
        info!("Metrics exporter disabled");
        return Ok(());
    }

    PrometheusBuilder::new()
        .with_http_listener(SocketAddr::from(([0, 0, 0, 0], port)))
        .set_buckets_for_metric(
            Matcher::Suffix("request_duration_seconds".to_string()),
            app_metrics::LATENCY_BUCKETS,
        )?
        .set_buckets_for_metric(
            Matcher::Suffix("write_duration_seconds".to_string()),
            app_metrics::LATENCY_BUCKETS,
        )?
        .set_buckets_for_metric(
            Matcher::Suffix("notification_duration_seconds".to_string()),
            app_metrics::NOTIFY_BUCKETS,
        )?
        .install()
        .context("failed to install Prometheus exporter")?;

    app_metrics::register_metrics();
    info!(port, "Metrics exporter listening");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
