use reqwest::Url;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub export: ExportConfig,
    pub portfolio: PortfolioConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let ansi = env::var("APP_LOG_ANSI")
            .map(|value| matches!(value.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let endpoint = env::var("EXPORT_ENDPOINT")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(|value| validate_endpoint(&value))
            .transpose()?;

        let portfolio = PortfolioConfig::from_paths(
            env::var("PORTFOLIO_COMPANIES_CSV").ok().map(PathBuf::from),
            env::var("PORTFOLIO_COHORTS_CSV").ok().map(PathBuf::from),
        )?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level, ansi },
            export: ExportConfig { endpoint },
            portfolio,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub ansi: bool,
}

/// Where exports are POSTed.
#[derive(Debug, Clone, Default)]
pub struct ExportConfig {
    pub endpoint: Option<String>,
}

impl ExportConfig {
    /// Falls back to the receiver mounted on this service.
    pub fn endpoint_or_local(&self, server: &ServerConfig) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}/api/exportToDrive", server.host, server.port))
    }
}

pub fn validate_endpoint(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    match Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(trimmed.to_string()),
        _ => Err(ConfigError::InvalidExportEndpoint {
            value: trimmed.to_string(),
        }),
    }
}

/// Optional CSV files replacing the seeded portfolio.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortfolioConfig {
    pub csv_paths: Option<(PathBuf, PathBuf)>,
}

impl PortfolioConfig {
    pub fn from_paths(
        companies: Option<PathBuf>,
        cohorts: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        match (companies, cohorts) {
            (Some(companies), Some(cohorts)) => Ok(Self {
                csv_paths: Some((companies, cohorts)),
            }),
            (None, None) => Ok(Self::default()),
            _ => Err(ConfigError::IncompletePortfolioPaths),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidExportEndpoint { value: String },
    IncompletePortfolioPaths,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidExportEndpoint { value } => {
                write!(f, "EXPORT_ENDPOINT '{}' must be an http(s) URL", value)
            }
            ConfigError::IncompletePortfolioPaths => write!(
                f,
                "PORTFOLIO_COMPANIES_CSV and PORTFOLIO_COHORTS_CSV must be set together"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
