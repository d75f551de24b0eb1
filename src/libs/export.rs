//! Violation export for external analysis.
//!
//! CSV for spreadsheets, pretty-printed JSON for everything else. Without an
//! explicit path the file is named after the current time, e.g.
//! `breakwatch_violations_20250115_143022.csv`.
//!
//! ```rust,no_run
//! use breakwatch::libs::export::{Exporter, ExportFormat};
//!
//! let exporter = Exporter::new(ExportFormat::Csv, None);
//! exporter.export_violations(&[])?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::db::violations::Violation;
use crate::libs::formatter::{format_date, format_datetime};
use anyhow::Result;
use chrono::Local;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// Flat row written for each violation.
#[derive(Debug, Serialize)]
struct ViolationRow {
    id: i64,
    date: String,
    timestamp: String,
    email: String,
    violation_type: String,
    severity: String,
    break_type: String,
    expected_duration: Option<i64>,
    actual_duration: Option<i64>,
    excess_minutes: Option<i64>,
    session_id: String,
    break_id: Option<i64>,
    details: String,
}

impl From<&Violation> for ViolationRow {
    fn from(v: &Violation) -> Self {
        ViolationRow {
            id: v.id,
            date: format_date(&v.date),
            timestamp: format_datetime(&v.timestamp),
            email: v.email.clone(),
            violation_type: v.kind.as_str().to_string(),
            severity: v.severity.as_str().to_string(),
            break_type: v.break_type.clone().unwrap_or_default(),
            expected_duration: v.expected_duration,
            actual_duration: v.actual_duration,
            excess_minutes: v.excess_minutes,
            session_id: v.session_id.clone().unwrap_or_default(),
            break_id: v.break_id,
            details: v.details.clone().unwrap_or_default(),
        }
    }
}

pub struct Exporter {
    format: ExportFormat,
    output_path: PathBuf,
}

impl Exporter {
    pub fn new(format: ExportFormat, output_path: Option<PathBuf>) -> Self {
        let output_path = output_path.unwrap_or_else(|| {
            PathBuf::from(format!(
                "breakwatch_violations_{}.{}",
                Local::now().format("%Y%m%d_%H%M%S"),
                format.extension()
            ))
        });
        Self { format, output_path }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Writes the violations and returns how many rows were written.
    pub fn export_violations(&self, violations: &[Violation]) -> Result<usize> {
        let rows: Vec<ViolationRow> = violations.iter().map(ViolationRow::from).collect();
        match self.format {
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_path(&self.output_path)?;
                for row in &rows {
                    wtr.serialize(row)?;
                }
                if rows.is_empty() {
                    wtr.write_record([
                        "id",
                        "date",
                        "timestamp",
                        "email",
                        "violation_type",
                        "severity",
                        "break_type",
                        "expected_duration",
                        "actual_duration",
                        "excess_minutes",
                        "session_id",
                        "break_id",
                        "details",
                    ])?;
                }
                wtr.flush()?;
            }
            ExportFormat::Json => {
                let json = serde_json::to_string_pretty(&rows)?;
                File::create(&self.output_path)?.write_all(json.as_bytes())?;
            }
        }
        Ok(rows.len())
    }
}
