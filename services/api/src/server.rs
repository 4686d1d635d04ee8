use crate::cli::ServeArgs;
use crate::infra::{load_portfolio, AppState, InMemoryExportArchive};
use crate::routes::with_service_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use credit_risk::config::{validate_endpoint, AppConfig};
use credit_risk::error::AppError;
use credit_risk::workflows::risk::{HttpExportSink, RiskSessionController};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut config: AppConfig, mut args: ServeArgs) -> Result<(), AppError> {
    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(endpoint) = args.export_endpoint.take() {
        config.export.endpoint = Some(validate_endpoint(&endpoint)?);
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let portfolio = load_portfolio(&config.portfolio)?;
    let endpoint = config.export.endpoint_or_local(&config.server);
    info!(
        companies = portfolio.companies().len(),
        cohorts = portfolio.cohorts().len(),
        %endpoint,
        "portfolio loaded"
    );

    let controller = Arc::new(RiskSessionController::new(
        Arc::new(portfolio),
        Arc::new(HttpExportSink::new(endpoint)),
    ));
    let archive = InMemoryExportArchive::default();

    let app = with_service_routes(controller, archive)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "credit risk service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
