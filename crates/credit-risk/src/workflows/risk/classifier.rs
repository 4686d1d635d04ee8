//! Qualitative risk tiers derived from an adjusted score at display time.

use serde::Serialize;

pub const LOW_RISK_THRESHOLD: f64 = 150.0;
pub const MEDIUM_RISK_THRESHOLD: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::Low => "Low Risk",
            RiskTier::Medium => "Medium Risk",
            RiskTier::High => "High Risk",
        }
    }
}

/// Both thresholds are strict; NaN falls through to `High`.
pub fn classify(adjusted_score: f64) -> RiskTier {
    if adjusted_score > LOW_RISK_THRESHOLD {
        RiskTier::Low
    } else if adjusted_score > MEDIUM_RISK_THRESHOLD {
        RiskTier::Medium
    } else {
        RiskTier::High
    }
}
