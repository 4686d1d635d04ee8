use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::domain::{Company, CompanyId};
use super::reference::{factor_catalog, FactorCatalogEntry, FactorSelection};
use super::session::{ExportReceipt, RiskSessionController};
use super::views::SessionView;
use crate::error::AppError;

/// Router exposing the session's read accessors and its two actions.
pub fn session_router(controller: Arc<RiskSessionController>) -> Router {
    Router::new()
        .route("/api/v1/companies", get(companies_handler))
        .route("/api/v1/factors", get(factors_handler))
        .route("/api/v1/session", get(session_handler))
        .route("/api/v1/session/selection", put(selection_handler))
        .route("/api/v1/session/calculate", post(calculate_handler))
        .route("/api/v1/session/export", post(export_handler))
        .with_state(controller)
}

/// Partial update; an explicit `"company": null` clears the selection.
#[derive(Debug, Default, Deserialize)]
pub struct SelectionRequest {
    #[serde(default, deserialize_with = "present_or_null")]
    pub company: Option<Option<CompanyId>>,
    #[serde(default)]
    pub factors: Option<FactorSelection>,
}

fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<CompanyId>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<CompanyId>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize)]
struct ExportResponse {
    #[serde(flatten)]
    receipt: ExportReceipt,
    session: SessionView,
}

pub(crate) async fn companies_handler(
    State(controller): State<Arc<RiskSessionController>>,
) -> Json<Vec<Company>> {
    Json(controller.companies().to_vec())
}

pub(crate) async fn factors_handler() -> Json<Vec<FactorCatalogEntry>> {
    Json(factor_catalog())
}

pub(crate) async fn session_handler(
    State(controller): State<Arc<RiskSessionController>>,
) -> Json<SessionView> {
    Json(controller.snapshot().into())
}

pub(crate) async fn selection_handler(
    State(controller): State<Arc<RiskSessionController>>,
    Json(request): Json<SelectionRequest>,
) -> Json<SessionView> {
    if let Some(company) = request.company {
        controller.select_company(company);
    }
    if let Some(factors) = request.factors {
        controller.set_factors(factors);
    }
    Json(controller.snapshot().into())
}

pub(crate) async fn calculate_handler(
    State(controller): State<Arc<RiskSessionController>>,
) -> Result<Json<SessionView>, AppError> {
    controller.calculate_risk()?;
    Ok(Json(controller.snapshot().into()))
}

pub(crate) async fn export_handler(
    State(controller): State<Arc<RiskSessionController>>,
) -> Response {
    match controller.export_results().await {
        Ok(receipt) => {
            let body = ExportResponse {
                receipt,
                session: controller.snapshot().into(),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => AppError::from(err).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::risk::error::TransportError;
    use crate::workflows::risk::export::{ExportPayload, ExportSink};
    use crate::workflows::risk::portfolio::{PortfolioSource, SeededPortfolio};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request};
    use serde_json::Value;
    use tower::ServiceExt;

    #[derive(Debug)]
    struct AcceptingSink;

    #[async_trait]
    impl ExportSink for AcceptingSink {
        async fn deliver(&self, _payload: &ExportPayload) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn router() -> Router {
        let portfolio = SeededPortfolio.load().expect("seed data is valid");
        let controller = RiskSessionController::new(Arc::new(portfolio), Arc::new(AcceptingSink));
        session_router(Arc::new(controller))
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    fn empty_request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("request builds")
    }

    async fn read_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn lists_companies_and_factor_catalog() {
        let app = router();

        let response = app
            .clone()
            .oneshot(empty_request(Method::GET, "/api/v1/companies"))
            .await
            .expect("companies route");
        assert_eq!(response.status(), StatusCode::OK);
        let companies = read_json(response).await;
        assert_eq!(companies.as_array().map(Vec::len), Some(3));
        assert_eq!(companies[0]["debtToEquityRatio"], 1.2);

        let response = app
            .oneshot(empty_request(Method::GET, "/api/v1/factors"))
            .await
            .expect("factors route");
        let catalog = read_json(response).await;
        assert_eq!(catalog.as_array().map(Vec::len), Some(5));
        assert_eq!(catalog[0]["factor"], "marketGrowthVolatility");
        assert_eq!(catalog[0]["options"][2]["label"], "High Volatility");
    }

    #[tokio::test]
    async fn calculate_without_selection_is_bad_request() {
        let response = router()
            .oneshot(empty_request(Method::POST, "/api/v1/session/calculate"))
            .await
            .expect("calculate route");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert_eq!(body["error"], "Please select a company.");
    }

    #[tokio::test]
    async fn select_calculate_and_export() {
        let app = router();

        let response = app
            .clone()
            .oneshot(json_request(
                Method::PUT,
                "/api/v1/session/selection",
                serde_json::json!({ "company": "company-1" }),
            ))
            .await
            .expect("selection route");
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(empty_request(Method::POST, "/api/v1/session/calculate"))
            .await
            .expect("calculate route");
        assert_eq!(response.status(), StatusCode::OK);
        let session = read_json(response).await;
        assert_eq!(session["results"][0]["cohortId"], "cohort-1");
        assert_eq!(session["results"][0]["adjustedScore"], 3.0);
        assert_eq!(session["rows"][1]["riskLevel"], "High Risk");
        assert_eq!(session["loading"], false);

        let response = app
            .oneshot(empty_request(Method::POST, "/api/v1/session/export"))
            .await
            .expect("export route");
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["filename"], "credit_risk_data.csv");
        assert_eq!(body["rows"], 2);
        assert_eq!(body["session"]["results"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn invalid_factor_score_is_rejected() {
        let response = router()
            .oneshot(json_request(
                Method::PUT,
                "/api/v1/session/selection",
                serde_json::json!({
                    "factors": {
                        "marketGrowthVolatility": 4,
                        "regulatoryRisk": 1,
                        "platformDependence": 1,
                        "financialStability": 1,
                        "managementStability": 1
                    }
                }),
            ))
            .await
            .expect("selection route");
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn export_with_no_results_is_bad_request() {
        let response = router()
            .oneshot(empty_request(Method::POST, "/api/v1/session/export"))
            .await
            .expect("export route");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert_eq!(body["error"], "No data to export.");
    }
}
