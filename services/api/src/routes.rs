use crate::infra::{AppState, ArchivedExport, InMemoryExportArchive};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use credit_risk::workflows::risk::{
    session_router, ExportPayload, RiskSessionController, SinkAcknowledgement,
};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

pub(crate) fn with_service_routes(
    controller: Arc<RiskSessionController>,
    archive: InMemoryExportArchive,
) -> Router {
    session_router(controller)
        .merge(export_receiver_router(archive))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

/// Local stand-in for the external export destination.
pub(crate) fn export_receiver_router(archive: InMemoryExportArchive) -> Router {
    Router::new()
        .route("/api/exportToDrive", post(receive_export))
        .route("/api/v1/exports", get(list_exports))
        .route("/api/v1/exports/latest", get(latest_export))
        .with_state(archive)
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn receive_export(
    State(archive): State<InMemoryExportArchive>,
    Json(payload): Json<ExportPayload>,
) -> Json<SinkAcknowledgement> {
    if payload.filename.trim().is_empty() {
        return Json(SinkAcknowledgement::rejected("filename is required"));
    }
    if payload.data.is_empty() {
        return Json(SinkAcknowledgement::rejected("export data is empty"));
    }

    let stored = archive.store(payload);
    info!(filename = %stored.filename, rows = stored.rows, "export received");
    Json(SinkAcknowledgement::accepted())
}

pub(crate) async fn list_exports(
    State(archive): State<InMemoryExportArchive>,
) -> Json<Vec<ArchivedExport>> {
    Json(archive.exports())
}

pub(crate) async fn latest_export(
    State(archive): State<InMemoryExportArchive>,
) -> axum::response::Response {
    match archive.latest() {
        Some(export) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
            export.data,
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "no exports received" })),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use credit_risk::workflows::risk::{
        CompanyId, ExportSink, PortfolioSource, SeededPortfolio, TransportError,
    };
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    /// Forwards exports straight into the archive, as the HTTP sink would
    /// when pointed at this service.
    #[derive(Debug)]
    struct ArchiveSink(InMemoryExportArchive);

    #[async_trait::async_trait]
    impl ExportSink for ArchiveSink {
        async fn deliver(&self, payload: &ExportPayload) -> Result<(), TransportError> {
            self.0.store(payload.clone());
            Ok(())
        }
    }

    fn app_state() -> AppState {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        AppState {
            readiness: Arc::new(AtomicBool::new(true)),
            metrics: Arc::new(recorder.handle()),
        }
    }

    fn app() -> (Router, Arc<RiskSessionController>, InMemoryExportArchive) {
        let archive = InMemoryExportArchive::default();
        let portfolio = SeededPortfolio.load().expect("seed data is valid");
        let controller = Arc::new(RiskSessionController::new(
            Arc::new(portfolio),
            Arc::new(ArchiveSink(archive.clone())),
        ));
        let router = with_service_routes(controller.clone(), archive.clone())
            .layer(Extension(app_state()));
        (router, controller, archive)
    }

    fn request(method: Method, uri: &str, body: Body) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .expect("request builds")
    }

    #[tokio::test]
    async fn health_and_readiness_report_ok() {
        let (app, _, _) = app();
        let response = app
            .clone()
            .oneshot(request(Method::GET, "/health", Body::empty()))
            .await
            .expect("health route");
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(request(Method::GET, "/ready", Body::empty()))
            .await
            .expect("ready route");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn receiver_acknowledges_and_archives_exports() {
        let (app, _, archive) = app();
        let body = json!({
            "filename": "credit_risk_data.csv",
            "data": "cohortId,adjustedScore,companyName,pd,lgd\n\"cohort-1\",3,\"GameCo X\",0.5,0.55"
        });

        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/exportToDrive",
                Body::from(body.to_string()),
            ))
            .await
            .expect("receiver route");
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        let ack: SinkAcknowledgement = serde_json::from_slice(&bytes).expect("ack json");
        assert!(ack.success);
        assert_eq!(archive.exports()[0].rows, 1);

        let response = app
            .oneshot(request(Method::GET, "/api/v1/exports/latest", Body::empty()))
            .await
            .expect("latest route");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn receiver_rejects_empty_data() {
        let (app, _, archive) = app();
        let body = json!({ "filename": "credit_risk_data.csv", "data": "" });

        let response = app
            .oneshot(request(
                Method::POST,
                "/api/exportToDrive",
                Body::from(body.to_string()),
            ))
            .await
            .expect("receiver route");
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        let ack: SinkAcknowledgement = serde_json::from_slice(&bytes).expect("ack json");
        assert!(!ack.success);
        assert_eq!(ack.error.as_deref(), Some("export data is empty"));
        assert!(archive.exports().is_empty());
    }

    #[tokio::test]
    async fn session_export_lands_in_archive() {
        let (app, controller, archive) = app();
        controller.select_company(Some(CompanyId::new("company-2")));
        controller.calculate_risk().expect("calculation succeeds");

        let response = app
            .oneshot(request(
                Method::POST,
                "/api/v1/session/export",
                Body::empty(),
            ))
            .await
            .expect("export route");
        assert_eq!(response.status(), StatusCode::OK);

        let exports = archive.exports();
        assert_eq!(exports.len(), 1);
        assert_eq!(exports[0].filename, "credit_risk_data.csv");
        assert_eq!(exports[0].rows, 2);
        assert!(exports[0].data.contains("\"GameCo Y\""));
    }
}
