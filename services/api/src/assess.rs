use crate::infra::load_portfolio;
use clap::Args;
use credit_risk::config::{validate_endpoint, AppConfig};
use credit_risk::error::AppError;
use credit_risk::workflows::risk::{
    external_risk_index, factor_catalog, AssessmentRowView, CompanyId, FactorScore,
    FactorSelection, HttpExportSink, RiskSessionController,
};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct AssessArgs {
    /// Company identifier (see `companies`)
    #[arg(long)]
    pub(crate) company: String,
    /// Market growth volatility score (1-3)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=3))]
    pub(crate) market_growth_volatility: u8,
    /// Regulatory risk score (1-3)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=3))]
    pub(crate) regulatory_risk: u8,
    /// Platform dependence score (1-3)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=3))]
    pub(crate) platform_dependence: u8,
    /// Financial stability score (1-3)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=3))]
    pub(crate) financial_stability: u8,
    /// Management stability score (1-3)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=3))]
    pub(crate) management_stability: u8,
    /// POST the results table to this endpoint after scoring
    #[arg(long)]
    pub(crate) export_endpoint: Option<String>,
}

impl AssessArgs {
    fn factors(&self) -> Result<FactorSelection, AppError> {
        Ok(FactorSelection {
            market_growth_volatility: FactorScore::new(self.market_growth_volatility)?,
            regulatory_risk: FactorScore::new(self.regulatory_risk)?,
            platform_dependence: FactorScore::new(self.platform_dependence)?,
            financial_stability: FactorScore::new(self.financial_stability)?,
            management_stability: FactorScore::new(self.management_stability)?,
        })
    }
}

pub(crate) fn run_factors() {
    println!("Risk factor catalog");
    for entry in factor_catalog() {
        println!("\n{}", entry.label);
        for option in entry.options.iter() {
            println!(
                "  {} - {:<18} {}",
                option.score, option.label, option.description
            );
        }
    }
}

pub(crate) fn run_companies(config: &AppConfig) -> Result<(), AppError> {
    let portfolio = load_portfolio(&config.portfolio)?;

    println!("{:<12} {:<18} {:>6} {:>14} {:>8}", "ID", "Company", "D/E", "Revenue", "Cohorts");
    for company in portfolio.companies() {
        let cohorts = portfolio.cohorts_for(&company.id).count();
        println!(
            "{:<12} {:<18} {:>6.2} {:>14.0} {:>8}",
            company.id, company.name, company.debt_to_equity_ratio, company.revenue, cohorts
        );
    }

    Ok(())
}

pub(crate) async fn run_assessment(config: &AppConfig, args: AssessArgs) -> Result<(), AppError> {
    let factors = args.factors()?;
    let portfolio = load_portfolio(&config.portfolio)?;

    let endpoint = match &args.export_endpoint {
        Some(raw) => Some(validate_endpoint(raw)?),
        None => None,
    };
    let sink = HttpExportSink::new(
        endpoint
            .clone()
            .unwrap_or_else(|| config.export.endpoint_or_local(&config.server)),
    );

    let controller = RiskSessionController::new(Arc::new(portfolio), Arc::new(sink));
    let company_id = CompanyId::new(args.company);
    controller.select_company(Some(company_id.clone()));
    controller.set_factors(factors);
    let results = controller.calculate_risk()?;

    let company_name = controller
        .portfolio()
        .company(&company_id)
        .map(|company| company.name.clone())
        .unwrap_or_default();
    println!("Credit risk assessment for {} ({})", company_name, company_id);
    println!("External risk index: {}", external_risk_index(&factors));

    if results.is_empty() {
        println!("No cohorts recorded for this company.");
    } else {
        render_rows(results.iter().map(AssessmentRowView::from));
    }

    if let Some(endpoint) = endpoint {
        let receipt = controller.export_results().await?;
        println!(
            "\nExported {} rows as {} to {}",
            receipt.rows, receipt.filename, endpoint
        );
    }

    Ok(())
}

fn render_rows(rows: impl Iterator<Item = AssessmentRowView>) {
    println!(
        "\n{:<12} {:<18} {:>14} {:<12} {:>8} {:>6}",
        "Cohort ID", "Company", "Adjusted Score", "Risk Level", "PD", "LGD"
    );
    for row in rows {
        println!(
            "{:<12} {:<18} {:>14} {:<12} {:>8} {:>6}",
            row.cohort_id, row.company_name, row.adjusted_score, row.risk_level, row.pd, row.lgd
        );
    }
}
