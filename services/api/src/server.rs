use crate::cli::ServeArgs;
use crate::infra::{load_configured_schedule, AppState};
use crate::routes::fee_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use devfees::config::AppConfig;
use devfees::error::AppError;
use devfees::fees::FeeEngine;
use devfees::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let schedule = load_configured_schedule(&config.engine)?;
    if schedule.is_none() {
        warn!("FEE_SCHEDULE_PATH not set; requests must carry inline fees");
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        engine: Arc::new(FeeEngine::from_config(&config.engine)),
        schedule: schedule.map(Arc::new),
    };

    let app = fee_routes()
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "development fee service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
