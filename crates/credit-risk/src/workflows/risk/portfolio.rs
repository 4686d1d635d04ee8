use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use super::domain::{Cohort, CohortId, Company, CompanyId};

/// Read-only view of companies and cohorts loaded once per session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortfolioSnapshot {
    companies: Vec<Company>,
    cohorts: Vec<Cohort>,
}

impl PortfolioSnapshot {
    /// Builds a snapshot, rejecting duplicate ids, retention outside `[0, 1]`,
    /// and cohorts pointing at companies that do not exist.
    pub fn new(companies: Vec<Company>, cohorts: Vec<Cohort>) -> Result<Self, PortfolioError> {
        let mut company_ids = HashSet::new();
        for company in &companies {
            if !company_ids.insert(&company.id) {
                return Err(PortfolioError::DuplicateCompany(company.id.clone()));
            }
        }

        let mut cohort_ids = HashSet::new();
        for cohort in &cohorts {
            if !cohort_ids.insert(&cohort.id) {
                return Err(PortfolioError::DuplicateCohort(cohort.id.clone()));
            }
            if !(0.0..=1.0).contains(&cohort.retention_rate) {
                return Err(PortfolioError::InvalidRetention {
                    cohort_id: cohort.id.clone(),
                    value: cohort.retention_rate,
                });
            }
            if !company_ids.contains(&cohort.company_id) {
                return Err(PortfolioError::UnknownCompany {
                    cohort_id: cohort.id.clone(),
                    company_id: cohort.company_id.clone(),
                });
            }
        }

        Ok(Self { companies, cohorts })
    }

    pub fn companies(&self) -> &[Company] {
        &self.companies
    }

    pub fn cohorts(&self) -> &[Cohort] {
        &self.cohorts
    }

    pub fn company(&self, id: &CompanyId) -> Option<&Company> {
        self.companies.iter().find(|company| &company.id == id)
    }

    /// Cohorts owned by `company_id`, in load order.
    pub fn cohorts_for<'a>(
        &'a self,
        company_id: &'a CompanyId,
    ) -> impl Iterator<Item = &'a Cohort> + 'a {
        self.cohorts
            .iter()
            .filter(move |cohort| cohort.belongs_to(company_id))
    }
}

/// Source of the domain data consumed at session start.
pub trait PortfolioSource {
    fn load(&self) -> Result<PortfolioSnapshot, PortfolioError>;
}

/// Fixed mock data set used when no external source is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeededPortfolio;

impl PortfolioSource for SeededPortfolio {
    fn load(&self) -> Result<PortfolioSnapshot, PortfolioError> {
        let companies = vec![
            company("company-1", "GameCo X", 1.2, 5_000_000.0),
            company("company-2", "GameCo Y", 0.5, 8_000_000.0),
            company("company-3", "Indie Games Inc", 2.0, 2_000_000.0),
        ];
        let cohorts = vec![
            cohort("cohort-1", "Cohort A", 150_000.0, 50_000.0, 0.85, "company-1"),
            cohort("cohort-2", "Cohort B", 120_000.0, 40_000.0, 0.78, "company-1"),
            cohort("cohort-3", "Cohort C", 200_000.0, 60_000.0, 0.92, "company-2"),
            cohort("cohort-4", "Cohort D", 180_000.0, 55_000.0, 0.88, "company-2"),
            cohort("cohort-5", "Cohort E", 250_000.0, 70_000.0, 0.95, "company-3"),
        ];
        PortfolioSnapshot::new(companies, cohorts)
    }
}

fn company(id: &str, name: &str, debt_to_equity_ratio: f64, revenue: f64) -> Company {
    Company {
        id: CompanyId::new(id),
        name: name.to_string(),
        debt_to_equity_ratio,
        revenue,
    }
}

fn cohort(
    id: &str,
    name: &str,
    revenue: f64,
    cac: f64,
    retention_rate: f64,
    company_id: &str,
) -> Cohort {
    Cohort {
        id: CohortId::new(id),
        name: name.to_string(),
        revenue,
        cac,
        retention_rate,
        company_id: CompanyId::new(company_id),
    }
}

/// Loads companies and cohorts from two headed CSV files.
#[derive(Debug, Clone)]
pub struct CsvPortfolioSource {
    companies_path: PathBuf,
    cohorts_path: PathBuf,
}

impl CsvPortfolioSource {
    pub fn new(companies_path: impl Into<PathBuf>, cohorts_path: impl Into<PathBuf>) -> Self {
        Self {
            companies_path: companies_path.into(),
            cohorts_path: cohorts_path.into(),
        }
    }

    pub fn from_readers<C: Read, H: Read>(
        companies: C,
        cohorts: H,
    ) -> Result<PortfolioSnapshot, PortfolioError> {
        let companies = read_rows::<Company, _>(companies)?;
        let cohorts = read_rows::<Cohort, _>(cohorts)?;
        PortfolioSnapshot::new(companies, cohorts)
    }

    fn open(path: &Path) -> Result<File, PortfolioError> {
        File::open(path).map_err(|source| PortfolioError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl PortfolioSource for CsvPortfolioSource {
    fn load(&self) -> Result<PortfolioSnapshot, PortfolioError> {
        let companies = Self::open(&self.companies_path)?;
        let cohorts = Self::open(&self.cohorts_path)?;
        Self::from_readers(companies, cohorts)
    }
}

fn read_rows<T, R>(reader: R) -> Result<Vec<T>, PortfolioError>
where
    T: serde::de::DeserializeOwned,
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for row in csv_reader.deserialize::<T>() {
        rows.push(row?);
    }
    Ok(rows)
}

#[derive(Debug)]
pub enum PortfolioError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Csv(csv::Error),
    DuplicateCompany(CompanyId),
    DuplicateCohort(CohortId),
    InvalidRetention {
        cohort_id: CohortId,
        value: f64,
    },
    UnknownCompany {
        cohort_id: CohortId,
        company_id: CompanyId,
    },
}

impl std::fmt::Display for PortfolioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortfolioError::Io { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            PortfolioError::Csv(err) => write!(f, "invalid portfolio CSV data: {}", err),
            PortfolioError::DuplicateCompany(id) => write!(f, "duplicate company id '{}'", id),
            PortfolioError::DuplicateCohort(id) => write!(f, "duplicate cohort id '{}'", id),
            PortfolioError::InvalidRetention { cohort_id, value } => write!(
                f,
                "cohort '{}' has retention rate {} outside [0, 1]",
                cohort_id, value
            ),
            PortfolioError::UnknownCompany {
                cohort_id,
                company_id,
            } => write!(
                f,
                "cohort '{}' references unknown company '{}'",
                cohort_id, company_id
            ),
        }
    }
}

impl std::error::Error for PortfolioError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PortfolioError::Io { source, .. } => Some(source),
            PortfolioError::Csv(err) => Some(err),
            _ => None,
        }
    }
}

impl From<csv::Error> for PortfolioError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}
