use serde::{Deserialize, Serialize};

use crate::workflows::risk::domain::RiskAssessmentResult;
use crate::workflows::risk::error::ValidationError;

pub const EXPORT_FILENAME: &str = "credit_risk_data.csv";

/// Typed value of one exported column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Text(&'a str),
    Number(f64),
}

impl Cell<'_> {
    fn render(&self) -> String {
        match self {
            Cell::Text(value) => format!("\"{value}\""),
            Cell::Number(value) => format_number(*value),
        }
    }
}

/// Record with a declared column layout.
pub trait TabularRecord {
    const FIELD_NAMES: &'static [&'static str];

    /// One cell per entry of `FIELD_NAMES`, same order.
    fn cells(&self) -> Vec<Cell<'_>>;
}

impl TabularRecord for RiskAssessmentResult {
    const FIELD_NAMES: &'static [&'static str] =
        &["cohortId", "adjustedScore", "companyName", "pd", "lgd"];

    fn cells(&self) -> Vec<Cell<'_>> {
        vec![
            Cell::Text(self.cohort_id.as_str()),
            Cell::Number(self.adjusted_score),
            Cell::Text(&self.company_name),
            Cell::Number(self.pd),
            Cell::Number(self.lgd),
        ]
    }
}

/// Encodes records as a header line plus one line per record.
///
/// Text cells are wrapped in double quotes without escaping embedded commas
/// or quotes; numbers are written bare.
pub fn encode_table<T: TabularRecord>(records: &[T]) -> Result<String, ValidationError> {
    if records.is_empty() {
        return Err(ValidationError::NoDataToExport);
    }

    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(T::FIELD_NAMES.join(","));
    for record in records {
        let row: Vec<String> = record.cells().iter().map(Cell::render).collect();
        lines.push(row.join(","));
    }

    Ok(lines.join("\n"))
}

fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value.is_sign_positive() {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if value == 0.0 {
        "0".to_string()
    } else if value.abs() < 1e-6 || value.abs() >= 1e21 {
        // Exponent form for tiny and huge magnitudes, always signed.
        let formatted = format!("{value:e}");
        match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{mantissa}e+{exponent}")
            }
            _ => formatted,
        }
    } else {
        value.to_string()
    }
}

/// Body POSTed to the export sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportPayload {
    pub filename: String,
    pub data: String,
}

pub fn build_payload(results: &[RiskAssessmentResult]) -> Result<ExportPayload, ValidationError> {
    Ok(ExportPayload {
        filename: EXPORT_FILENAME.to_string(),
        data: encode_table(results)?,
    })
}
