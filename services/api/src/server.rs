use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::cli::ServeArgs;
use crate::infra::{build_fraud_service, load_users, AppState};
use crate::routes::with_fraud_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use beneficiary_fraud::config::AppConfig;
use beneficiary_fraud::error::AppError;
use beneficiary_fraud::telemetry;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let users = match args.users.take() {
        Some(path) => load_users(&path)?,
        None => Vec::new(),
    };
    info!(users = users.len(), "user directory loaded");

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let (fraud_service, _) = build_fraud_service(users, config.fraud.clone());
    let app = with_fraud_routes(Arc::new(fraud_service))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "beneficiary fraud service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
