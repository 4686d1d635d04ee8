use crate::assess::{run_assessment, run_companies, run_factors, AssessArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use credit_risk::config::{AppConfig, PortfolioConfig};
use credit_risk::error::AppError;
use credit_risk::telemetry;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Cohort Credit Risk",
    about = "Score gaming-company cohorts for credit risk and export the results",
    version
)]
struct Cli {
    /// Companies CSV (id,name,debtToEquityRatio,revenue) replacing the seeded portfolio
    #[arg(long, global = true, requires = "cohorts_csv")]
    companies_csv: Option<PathBuf>,
    /// Cohorts CSV (id,name,revenue,cac,retentionRate,companyId) replacing the seeded portfolio
    #[arg(long, global = true, requires = "companies_csv")]
    cohorts_csv: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// List the five risk-factor categories and their scored options
    Factors,
    /// List companies in the portfolio with their cohort counts
    Companies,
    /// Score a company's cohorts and print the results table
    Assess(AssessArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the endpoint exports are POSTed to
    #[arg(long)]
    pub(crate) export_endpoint: Option<String>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let mut config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let portfolio_override = PortfolioConfig::from_paths(cli.companies_csv, cli.cohorts_csv)?;
    if portfolio_override.csv_paths.is_some() {
        config.portfolio = portfolio_override;
    }

    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(config, args).await,
        Command::Factors => {
            run_factors();
            Ok(())
        }
        Command::Companies => run_companies(&config),
        Command::Assess(args) => run_assessment(&config, args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn csv_paths_must_be_given_together() {
        let parsed = Cli::try_parse_from(["credit-risk-api", "--companies-csv", "c.csv", "factors"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn assess_parses_factor_scores() {
        let cli = Cli::try_parse_from([
            "credit-risk-api",
            "assess",
            "--company",
            "company-1",
            "--regulatory-risk",
            "3",
        ])
        .expect("arguments parse");
        match cli.command {
            Some(Command::Assess(args)) => {
                assert_eq!(args.company, "company-1");
                assert_eq!(args.regulatory_risk, 3);
                assert_eq!(args.market_growth_volatility, 1);
            }
            other => panic!("expected assess command, got {other:?}"),
        }
    }

    #[test]
    fn assess_rejects_out_of_range_scores() {
        let parsed = Cli::try_parse_from([
            "credit-risk-api",
            "assess",
            "--company",
            "company-1",
            "--platform-dependence",
            "4",
        ]);
        assert!(parsed.is_err());
    }
}
