use serde::{Deserialize, Serialize};

use super::error::ValidationError;

/// One of the five qualitative categories feeding the external risk index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RiskFactor {
    MarketGrowthVolatility,
    RegulatoryRisk,
    PlatformDependence,
    FinancialStability,
    ManagementStability,
}

impl RiskFactor {
    pub const ALL: [RiskFactor; 5] = [
        RiskFactor::MarketGrowthVolatility,
        RiskFactor::RegulatoryRisk,
        RiskFactor::PlatformDependence,
        RiskFactor::FinancialStability,
        RiskFactor::ManagementStability,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RiskFactor::MarketGrowthVolatility => "Market Growth Volatility",
            RiskFactor::RegulatoryRisk => "Regulatory Risk",
            RiskFactor::PlatformDependence => "Platform Dependence",
            RiskFactor::FinancialStability => "Financial Stability",
            RiskFactor::ManagementStability => "Management Stability",
        }
    }

    /// Ordered options for the category, lowest score first.
    pub fn options(&self) -> &'static [RiskFactorOption; 3] {
        match self {
            RiskFactor::MarketGrowthVolatility => &MARKET_GROWTH_VOLATILITY,
            RiskFactor::RegulatoryRisk => &REGULATORY_RISK,
            RiskFactor::PlatformDependence => &PLATFORM_DEPENDENCE,
            RiskFactor::FinancialStability => &FINANCIAL_STABILITY,
            RiskFactor::ManagementStability => &MANAGEMENT_STABILITY,
        }
    }

    pub fn option(&self, score: FactorScore) -> &'static RiskFactorOption {
        &self.options()[usize::from(score.value() - 1)]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RiskFactorOption {
    pub label: &'static str,
    pub score: u8,
    pub description: &'static str,
}

const fn option(label: &'static str, score: u8, description: &'static str) -> RiskFactorOption {
    RiskFactorOption {
        label,
        score,
        description,
    }
}

static MARKET_GROWTH_VOLATILITY: [RiskFactorOption; 3] = [
    option(
        "Low Volatility",
        1,
        "Companies focused on stable game genres.",
    ),
    option(
        "Medium Volatility",
        2,
        "Companies with some exposure to volatile genres.",
    ),
    option(
        "High Volatility",
        3,
        "Companies heavily invested in unproven concepts.",
    ),
];

static REGULATORY_RISK: [RiskFactorOption; 3] = [
    option(
        "Low Risk",
        1,
        "Operations in stable regulatory environments.",
    ),
    option(
        "Medium Risk",
        2,
        "Operations in evolving regulatory landscapes.",
    ),
    option(
        "High Risk",
        3,
        "Operations in regions with high regulatory uncertainty.",
    ),
];

static PLATFORM_DEPENDENCE: [RiskFactorOption; 3] = [
    option("Low Dependence", 1, "Diversified distribution channels."),
    option("Medium Dependence", 2, "Reliance on major app stores."),
    option(
        "High Dependence",
        3,
        "Exclusive reliance on a single platform.",
    ),
];

static FINANCIAL_STABILITY: [RiskFactorOption; 3] = [
    option("Low Debt", 1, "Debt-to-equity ratio < 0.75"),
    option("Medium Debt", 2, "Debt-to-equity ratio 0.75 - 1.5"),
    option("High Debt", 3, "Debt-to-equity ratio > 1.5"),
];

static MANAGEMENT_STABILITY: [RiskFactorOption; 3] = [
    option("High Experience", 1, "Avg. management tenure > 8 years"),
    option("Medium Experience", 2, "Avg. management tenure 4-8 years"),
    option("Low Experience", 3, "Avg. management tenure < 4 years"),
];

/// Ordinal factor score, always 1, 2, or 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct FactorScore(u8);

impl FactorScore {
    pub const MIN: FactorScore = FactorScore(1);
    pub const MAX: FactorScore = FactorScore(3);

    pub fn new(value: u8) -> Result<Self, ValidationError> {
        if (1..=3).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ValidationError::FactorScoreOutOfRange { value })
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for FactorScore {
    fn default() -> Self {
        Self::MIN
    }
}

impl TryFrom<u8> for FactorScore {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FactorScore> for u8 {
    fn from(value: FactorScore) -> Self {
        value.0
    }
}

/// The five factor selections held by a session; every score starts at 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorSelection {
    pub market_growth_volatility: FactorScore,
    pub regulatory_risk: FactorScore,
    pub platform_dependence: FactorScore,
    pub financial_stability: FactorScore,
    pub management_stability: FactorScore,
}

impl FactorSelection {
    pub fn get(&self, factor: RiskFactor) -> FactorScore {
        match factor {
            RiskFactor::MarketGrowthVolatility => self.market_growth_volatility,
            RiskFactor::RegulatoryRisk => self.regulatory_risk,
            RiskFactor::PlatformDependence => self.platform_dependence,
            RiskFactor::FinancialStability => self.financial_stability,
            RiskFactor::ManagementStability => self.management_stability,
        }
    }

    pub fn set(&mut self, factor: RiskFactor, score: FactorScore) {
        let slot = match factor {
            RiskFactor::MarketGrowthVolatility => &mut self.market_growth_volatility,
            RiskFactor::RegulatoryRisk => &mut self.regulatory_risk,
            RiskFactor::PlatformDependence => &mut self.platform_dependence,
            RiskFactor::FinancialStability => &mut self.financial_stability,
            RiskFactor::ManagementStability => &mut self.management_stability,
        };
        *slot = score;
    }

    pub fn with(mut self, factor: RiskFactor, score: FactorScore) -> Self {
        self.set(factor, score);
        self
    }

    pub fn scores(&self) -> impl Iterator<Item = FactorScore> + '_ {
        RiskFactor::ALL.into_iter().map(move |factor| self.get(factor))
    }
}

/// Serializable catalog entry for presentation layers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorCatalogEntry {
    pub factor: RiskFactor,
    pub label: &'static str,
    pub options: &'static [RiskFactorOption; 3],
}

pub fn factor_catalog() -> Vec<FactorCatalogEntry> {
    RiskFactor::ALL
        .into_iter()
        .map(|factor| FactorCatalogEntry {
            factor,
            label: factor.label(),
            options: factor.options(),
        })
        .collect()
}
