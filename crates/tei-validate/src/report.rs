//! JSON validation report output.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;

use crate::issue::ValidationReport;

const REPORT_SCHEMA: &str = "tei-annotate.validation-report";
const REPORT_SCHEMA_VERSION: u32 = 1;

/// One validated candidate in the payload.
#[derive(Debug, Serialize)]
pub struct ReportEntry {
    /// Where the candidate came from, e.g. "queue:3 said@p1".
    pub subject: String,
    pub error_count: usize,
    pub warning_count: usize,
    #[serde(flatten)]
    pub report: ValidationReport,
}

#[derive(Debug, Serialize)]
struct ReportPayload<'a> {
    schema: &'static str,
    schema_version: u32,
    generated_at: String,
    document: &'a str,
    entries: &'a [ReportEntry],
}

impl ReportEntry {
    pub fn new(subject: impl Into<String>, report: ValidationReport) -> Self {
        Self {
            subject: subject.into(),
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        }
    }
}

/// Write the validation results for one document as pretty-printed JSON.
pub fn write_validation_report_json(
    output_dir: &Path,
    document: &str,
    entries: &[ReportEntry],
) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let output_path = output_dir.join("validation_report.json");
    let payload = ReportPayload {
        schema: REPORT_SCHEMA,
        schema_version: REPORT_SCHEMA_VERSION,
        generated_at: Utc::now().to_rfc3339(),
        document,
        entries,
    };
    let json = serde_json::to_string_pretty(&payload)?;
    std::fs::write(&output_path, format!("{json}\n"))?;
    Ok(output_path)
}
