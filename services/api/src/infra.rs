use chrono::{DateTime, Utc};
use credit_risk::config::PortfolioConfig;
use credit_risk::workflows::risk::{
    CsvPortfolioSource, ExportPayload, PortfolioError, PortfolioSnapshot, PortfolioSource,
    SeededPortfolio,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Export as received by the built-in receiver endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ArchivedExport {
    pub(crate) filename: String,
    pub(crate) rows: usize,
    pub(crate) bytes: usize,
    pub(crate) received_at: DateTime<Utc>,
    #[serde(skip)]
    pub(crate) data: String,
}

/// Number of received exports kept before the oldest are evicted.
pub(crate) const ARCHIVE_CAPACITY: usize = 50;

#[derive(Debug, Clone)]
pub(crate) struct InMemoryExportArchive {
    exports: Arc<Mutex<VecDeque<ArchivedExport>>>,
    capacity: usize,
}

impl Default for InMemoryExportArchive {
    fn default() -> Self {
        Self::with_capacity(ARCHIVE_CAPACITY)
    }
}

impl InMemoryExportArchive {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            exports: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
        }
    }

    pub(crate) fn store(&self, payload: ExportPayload) -> ArchivedExport {
        let rows = payload.data.lines().count().saturating_sub(1);
        let archived = ArchivedExport {
            bytes: payload.data.len(),
            filename: payload.filename,
            rows,
            received_at: Utc::now(),
            data: payload.data,
        };
        let mut exports = self.exports.lock().expect("archive mutex poisoned");
        while exports.len() >= self.capacity {
            exports.pop_front();
        }
        exports.push_back(archived.clone());
        archived
    }

    pub(crate) fn exports(&self) -> Vec<ArchivedExport> {
        self.exports
            .lock()
            .expect("archive mutex poisoned")
            .iter()
            .cloned()
            .collect()
    }

    pub(crate) fn latest(&self) -> Option<ArchivedExport> {
        self.exports
            .lock()
            .expect("archive mutex poisoned")
            .back()
            .cloned()
    }
}

pub(crate) fn load_portfolio(config: &PortfolioConfig) -> Result<PortfolioSnapshot, PortfolioError> {
    match &config.csv_paths {
        Some((companies, cohorts)) => CsvPortfolioSource::new(companies, cohorts).load(),
        None => SeededPortfolio.load(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_counts_data_rows_without_header() {
        let archive = InMemoryExportArchive::default();
        let stored = archive.store(ExportPayload {
            filename: "credit_risk_data.csv".to_string(),
            data: "cohortId,adjustedScore\n\"cohort-1\",3\n\"cohort-2\",3".to_string(),
        });
        assert_eq!(stored.rows, 2);
        assert_eq!(archive.exports().len(), 1);
    }

    #[test]
    fn archive_evicts_oldest_beyond_capacity() {
        let archive = InMemoryExportArchive::with_capacity(2);
        for name in ["first.csv", "second.csv", "third.csv"] {
            archive.store(ExportPayload {
                filename: name.to_string(),
                data: "cohortId\n\"cohort-1\"".to_string(),
            });
        }

        let names: Vec<String> = archive
            .exports()
            .into_iter()
            .map(|export| export.filename)
            .collect();
        assert_eq!(names, vec!["second.csv", "third.csv"]);
        assert_eq!(
            archive.latest().map(|export| export.filename).as_deref(),
            Some("third.csv")
        );
    }

    #[test]
    fn empty_archive_has_no_latest_export() {
        assert!(InMemoryExportArchive::default().latest().is_none());
    }

    #[test]
    fn seeded_portfolio_is_the_default() {
        let snapshot = load_portfolio(&PortfolioConfig::default()).expect("seed data loads");
        assert_eq!(snapshot.companies().len(), 3);
    }
}
