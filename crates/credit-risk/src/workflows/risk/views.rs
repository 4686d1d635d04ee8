use serde::Serialize;

use super::classifier::{classify, RiskTier};
use super::domain::{CompanyId, RiskAssessmentResult};
use super::reference::FactorSelection;
use super::session::SessionState;

/// One rendered row of the results table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRowView {
    pub cohort_id: String,
    pub company_name: String,
    pub adjusted_score: String,
    pub risk_tier: RiskTier,
    pub risk_level: &'static str,
    pub pd: String,
    pub lgd: String,
}

impl From<&RiskAssessmentResult> for AssessmentRowView {
    fn from(result: &RiskAssessmentResult) -> Self {
        let tier = classify(result.adjusted_score);
        Self {
            cohort_id: result.cohort_id.0.clone(),
            company_name: result.company_name.clone(),
            adjusted_score: format!("{:.2}", result.adjusted_score),
            risk_tier: tier,
            risk_level: tier.label(),
            pd: format!("{:.4}", result.pd),
            lgd: format!("{:.2}", result.lgd),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub selected_company: Option<CompanyId>,
    pub factors: FactorSelection,
    pub results: Vec<RiskAssessmentResult>,
    pub rows: Vec<AssessmentRowView>,
    pub loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<SessionState> for SessionView {
    fn from(state: SessionState) -> Self {
        let rows = state.results.iter().map(AssessmentRowView::from).collect();
        Self {
            selected_company: state.selected_company,
            factors: state.factors,
            results: state.results,
            rows,
            loading: state.loading,
            error: state.error,
        }
    }
}
