mod classifier;
pub mod domain;
mod engine;
pub mod error;
pub mod export;
mod portfolio;
pub mod reference;
mod router;
mod session;
pub mod views;

pub use classifier::{classify, RiskTier, LOW_RISK_THRESHOLD, MEDIUM_RISK_THRESHOLD};
pub use domain::{Cohort, CohortId, Company, CompanyId, RiskAssessmentResult};
pub use engine::{external_risk_index, RiskScoringEngine, ScoringModel};
pub use error::{AssessmentError, TransportError, ValidationError};
pub use export::{ExportPayload, ExportSink, HttpExportSink, SinkAcknowledgement};
pub use portfolio::{
    CsvPortfolioSource, PortfolioError, PortfolioSnapshot, PortfolioSource, SeededPortfolio,
};
pub use reference::{factor_catalog, FactorScore, FactorSelection, RiskFactor, RiskFactorOption};
pub use router::{session_router, SelectionRequest};
pub use session::{ExportReceipt, RiskSessionController, SessionState};
pub use views::{AssessmentRowView, SessionView};
