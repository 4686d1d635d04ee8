use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::domain::{Company, CompanyId, RiskAssessmentResult};
use super::engine::RiskScoringEngine;
use super::error::{AssessmentError, ValidationError};
use super::export::{build_payload, ExportSink};
use super::portfolio::PortfolioSnapshot;
use super::reference::{FactorScore, FactorSelection, RiskFactor};

/// Everything a presentation layer needs to render one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub selected_company: Option<CompanyId>,
    pub factors: FactorSelection,
    pub results: Vec<RiskAssessmentResult>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Confirmation handed back after the sink accepted an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportReceipt {
    pub filename: String,
    pub rows: usize,
}

/// Owns the session state and runs the compute and export actions.
///
/// `loading` doubles as the lock shared by both actions: a request arriving
/// while either action is in flight is rejected instead of queued.
#[derive(Debug)]
pub struct RiskSessionController {
    portfolio: Arc<PortfolioSnapshot>,
    engine: RiskScoringEngine,
    sink: Arc<dyn ExportSink>,
    state: Mutex<SessionState>,
}

impl RiskSessionController {
    pub fn new(portfolio: Arc<PortfolioSnapshot>, sink: Arc<dyn ExportSink>) -> Self {
        Self::with_engine(portfolio, sink, RiskScoringEngine::default())
    }

    pub fn with_engine(
        portfolio: Arc<PortfolioSnapshot>,
        sink: Arc<dyn ExportSink>,
        engine: RiskScoringEngine,
    ) -> Self {
        Self {
            portfolio,
            engine,
            sink,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn companies(&self) -> &[Company] {
        self.portfolio.companies()
    }

    pub fn portfolio(&self) -> &PortfolioSnapshot {
        &self.portfolio
    }

    pub fn snapshot(&self) -> SessionState {
        self.state().clone()
    }

    /// Company ids are checked when risk is calculated, not here.
    pub fn select_company(&self, company: Option<CompanyId>) {
        debug!(company = ?company, "company selection changed");
        self.state().selected_company = company;
    }

    pub fn set_factor(&self, factor: RiskFactor, score: FactorScore) {
        debug!(?factor, score = score.value(), "factor selection changed");
        self.state().factors.set(factor, score);
    }

    pub fn set_factors(&self, factors: FactorSelection) {
        self.state().factors = factors;
    }

    /// Replaces the result set with a fresh calculation for the selection.
    pub fn calculate_risk(&self) -> Result<Vec<RiskAssessmentResult>, ValidationError> {
        let mut state = self.state();
        if state.loading {
            return Err(ValidationError::ActionInProgress);
        }
        state.loading = true;
        state.error = None;

        let outcome = self.engine.calculate(
            &self.portfolio,
            state.selected_company.as_ref(),
            &state.factors,
        );

        match &outcome {
            Ok(results) => {
                info!(
                    company = ?state.selected_company,
                    cohorts = results.len(),
                    "risk calculation complete"
                );
                state.results = results.clone();
            }
            Err(err) => {
                warn!(error = %err, "risk calculation rejected");
                state.error = Some(err.to_string());
            }
        }
        state.loading = false;

        outcome
    }

    /// Sends the current results to the export sink. Results are never
    /// modified, whatever the outcome.
    pub async fn export_results(&self) -> Result<ExportReceipt, AssessmentError> {
        let (payload, rows) = {
            let mut state = self.state();
            if state.loading {
                return Err(ValidationError::ActionInProgress.into());
            }
            let payload = match build_payload(&state.results) {
                Ok(payload) => payload,
                Err(err) => {
                    state.error = Some(err.to_string());
                    return Err(err.into());
                }
            };
            state.loading = true;
            state.error = None;
            (payload, state.results.len())
        };

        let busy = BusyGuard::new(&self.state);
        let outcome = self.sink.deliver(&payload).await;

        let mut state = self.state();
        busy.finish();
        state.loading = false;
        match outcome {
            Ok(()) => {
                info!(filename = %payload.filename, rows, "export delivered");
                Ok(ExportReceipt {
                    filename: payload.filename,
                    rows,
                })
            }
            Err(err) => {
                let err = AssessmentError::from(err);
                warn!(error = %err, "export failed");
                state.error = Some(err.user_message());
                Err(err)
            }
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        lock_state(&self.state)
    }
}

fn lock_state(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears `loading` if an export future is dropped mid-delivery. A finished
/// export clears it itself, under the same lock that records the outcome.
struct BusyGuard<'a> {
    state: &'a Mutex<SessionState>,
    finished: bool,
}

impl<'a> BusyGuard<'a> {
    fn new(state: &'a Mutex<SessionState>) -> Self {
        Self {
            state,
            finished: false,
        }
    }

    fn finish(mut self) {
        self.finished = true;
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            warn!("export interrupted before the sink answered");
            lock_state(self.state).loading = false;
        }
    }
}
