use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::{Cohort, Company, CompanyId, RiskAssessmentResult};
use super::error::ValidationError;
use super::portfolio::PortfolioSnapshot;
use super::reference::FactorSelection;

/// Coefficients of the illustrative scoring model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringModel {
    /// Risk index at which the adjustment term vanishes (all factors at 1).
    pub risk_index_baseline: u8,
    pub risk_index_step: f64,
    pub pd_steepness: f64,
    pub lgd_ceiling: f64,
    pub lgd_span: f64,
    pub lgd_steepness: f64,
}

impl Default for ScoringModel {
    fn default() -> Self {
        Self {
            risk_index_baseline: 5,
            risk_index_step: 0.075,
            pd_steepness: 0.1,
            lgd_ceiling: 0.8,
            lgd_span: 0.5,
            lgd_steepness: 0.05,
        }
    }
}

/// Sum of the five factor scores, always within `[5, 15]`.
pub fn external_risk_index(factors: &FactorSelection) -> u8 {
    factors.scores().map(|score| score.value()).sum()
}

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Stateless evaluator applying a [`ScoringModel`] to a company's cohorts.
#[derive(Debug, Clone, Default)]
pub struct RiskScoringEngine {
    model: ScoringModel,
}

impl RiskScoringEngine {
    pub fn new(model: ScoringModel) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &ScoringModel {
        &self.model
    }

    /// A zero `cac` yields an infinite or NaN score; it is passed through as-is.
    pub fn adjusted_score(&self, cohort: &Cohort, risk_index: u8) -> f64 {
        let excess = f64::from(risk_index) - f64::from(self.model.risk_index_baseline);
        (cohort.revenue / cohort.cac) * (1.0 + excess * self.model.risk_index_step)
    }

    pub fn probability_of_default(&self, adjusted_score: f64) -> f64 {
        logistic(self.model.pd_steepness * adjusted_score)
    }

    pub fn loss_given_default(&self, adjusted_score: f64) -> f64 {
        self.model.lgd_ceiling
            - self.model.lgd_span * logistic(self.model.lgd_steepness * adjusted_score)
    }

    /// Scores every cohort in order; the caller supplies cohorts already
    /// filtered to `company`.
    pub fn assess<'a, I>(
        &self,
        company: &Company,
        factors: &FactorSelection,
        cohorts: I,
    ) -> Vec<RiskAssessmentResult>
    where
        I: IntoIterator<Item = &'a Cohort>,
    {
        let risk_index = external_risk_index(factors);

        cohorts
            .into_iter()
            .map(|cohort| {
                if cohort.cac == 0.0 {
                    warn!(cohort_id = %cohort.id, "cohort has zero acquisition cost");
                }
                let adjusted_score = self.adjusted_score(cohort, risk_index);
                RiskAssessmentResult {
                    cohort_id: cohort.id.clone(),
                    adjusted_score,
                    company_name: company.name.clone(),
                    pd: self.probability_of_default(adjusted_score),
                    lgd: self.loss_given_default(adjusted_score),
                }
            })
            .collect()
    }

    /// Resolves the selected company and scores its cohorts.
    pub fn calculate(
        &self,
        portfolio: &PortfolioSnapshot,
        selected_company: Option<&CompanyId>,
        factors: &FactorSelection,
    ) -> Result<Vec<RiskAssessmentResult>, ValidationError> {
        let company_id = selected_company.ok_or(ValidationError::NoCompanySelected)?;
        let company =
            portfolio
                .company(company_id)
                .ok_or_else(|| ValidationError::CompanyNotFound {
                    company_id: company_id.0.clone(),
                })?;

        Ok(self.assess(company, factors, portfolio.cohorts_for(company_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::risk::domain::CohortId;
    use crate::workflows::risk::portfolio::{PortfolioSource, SeededPortfolio};
    use crate::workflows::risk::reference::{FactorScore, RiskFactor};

    fn cohort(revenue: f64, cac: f64) -> Cohort {
        Cohort {
            id: CohortId::new("cohort-x"),
            name: "Cohort X".to_string(),
            revenue,
            cac,
            retention_rate: 0.9,
            company_id: CompanyId::new("company-x"),
        }
    }

    fn all_selections() -> Vec<FactorSelection> {
        let mut selections = vec![FactorSelection::default()];
        for factor in RiskFactor::ALL {
            selections = selections
                .into_iter()
                .flat_map(|selection| {
                    (1..=3).map(move |value| {
                        let score = FactorScore::new(value).expect("valid score");
                        selection.with(factor, score)
                    })
                })
                .collect();
        }
        selections
    }

    #[test]
    fn risk_index_spans_five_to_fifteen() {
        let selections = all_selections();
        assert_eq!(selections.len(), 243);
        for selection in &selections {
            let index = external_risk_index(selection);
            assert!((5..=15).contains(&index), "index {index} out of range");
        }
    }

    #[test]
    fn adjusted_score_grows_with_risk_index() {
        let engine = RiskScoringEngine::default();
        let cohort = cohort(150_000.0, 50_000.0);
        let scores: Vec<f64> = (5..=15)
            .map(|index| engine.adjusted_score(&cohort, index))
            .collect();
        assert_eq!(scores[0], 3.0);
        assert!(scores.windows(2).all(|pair| pair[1] > pair[0]));
        assert!((scores[10] - 3.0 * 1.75).abs() < 1e-12);
    }

    #[test]
    fn pd_is_bounded_and_increasing() {
        let engine = RiskScoringEngine::default();
        let samples = [-200.0, -50.0, -1.0, 0.0, 1.0, 3.0, 50.0, 200.0];
        let values: Vec<f64> = samples
            .iter()
            .map(|score| engine.probability_of_default(*score))
            .collect();
        assert!(values.iter().all(|pd| *pd > 0.0 && *pd < 1.0));
        assert!(values.windows(2).all(|pair| pair[1] > pair[0]));
        assert_eq!(engine.probability_of_default(0.0), 0.5);
    }

    #[test]
    fn lgd_is_bounded_and_decreasing() {
        let engine = RiskScoringEngine::default();
        let samples = [-200.0, -50.0, -1.0, 0.0, 1.0, 3.0, 50.0, 200.0];
        let values: Vec<f64> = samples
            .iter()
            .map(|score| engine.loss_given_default(*score))
            .collect();
        assert!(values.iter().all(|lgd| *lgd > 0.3 && *lgd < 0.8));
        assert!(values.windows(2).all(|pair| pair[1] < pair[0]));
        assert!((engine.loss_given_default(0.0) - 0.55).abs() < 1e-12);
    }

    #[test]
    fn baseline_factors_leave_revenue_to_cac_untouched() {
        let engine = RiskScoringEngine::default();
        let portfolio = SeededPortfolio.load().expect("seed data is valid");
        let company_id = CompanyId::new("company-1");

        let results = engine
            .calculate(&portfolio, Some(&company_id), &FactorSelection::default())
            .expect("calculation succeeds");

        let ids: Vec<&str> = results.iter().map(|r| r.cohort_id.as_str()).collect();
        assert_eq!(ids, vec!["cohort-1", "cohort-2"]);
        assert!(results.iter().all(|r| r.adjusted_score == 3.0));
        assert!(results.iter().all(|r| r.company_name == "GameCo X"));
    }

    #[test]
    fn missing_or_unknown_company_is_a_validation_error() {
        let engine = RiskScoringEngine::default();
        let portfolio = SeededPortfolio.load().expect("seed data is valid");

        assert_eq!(
            engine.calculate(&portfolio, None, &FactorSelection::default()),
            Err(ValidationError::NoCompanySelected)
        );
        assert!(matches!(
            engine.calculate(
                &portfolio,
                Some(&CompanyId::new("company-404")),
                &FactorSelection::default()
            ),
            Err(ValidationError::CompanyNotFound { .. })
        ));
    }

    #[test]
    fn zero_cac_is_passed_through() {
        let engine = RiskScoringEngine::default();
        let score = engine.adjusted_score(&cohort(10.0, 0.0), 5);
        assert!(score.is_infinite());
        assert_eq!(engine.probability_of_default(score), 1.0);
        assert!((engine.loss_given_default(score) - 0.3).abs() < 1e-12);
    }
}
