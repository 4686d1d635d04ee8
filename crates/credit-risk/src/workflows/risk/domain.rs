use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier wrapper for companies in the portfolio.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyId(pub String);

/// Identifier wrapper for acquisition cohorts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CohortId(pub String);

impl CompanyId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl CohortId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl fmt::Display for CohortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub debt_to_equity_ratio: f64,
    pub revenue: f64,
}

/// Group of players acquired together; references its company by id only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cohort {
    pub id: CohortId,
    pub name: String,
    pub revenue: f64,
    pub cac: f64,
    pub retention_rate: f64,
    pub company_id: CompanyId,
}

impl Cohort {
    pub fn belongs_to(&self, company_id: &CompanyId) -> bool {
        &self.company_id == company_id
    }
}

/// Per-cohort output of a risk calculation.
///
/// Field order is the export column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessmentResult {
    pub cohort_id: CohortId,
    pub adjusted_score: f64,
    pub company_name: String,
    pub pd: f64,
    pub lgd: f64,
}
