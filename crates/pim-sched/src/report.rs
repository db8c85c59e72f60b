//! Per-job placement report.
//!
//! One row per completed job, fields in a fixed order:
//! `job_id, resource_id, resource_class, predicted_time, actual_time,
//! relative_error, threshold`. Times are written with 2 decimals, the error
//! with 4 and the threshold with 5.

use crate::{JobId, ResourceClass, ResourceId, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::Path;

/// Column names, in output order.
pub const REPORT_HEADER: [&str; 7] = [
    "job_id",
    "resource_id",
    "resource_class",
    "predicted_time",
    "actual_time",
    "relative_error",
    "threshold",
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub job_id: JobId,
    pub resource_id: ResourceId,
    pub resource_class: ResourceClass,
    pub predicted_time: f64,
    pub actual_time: f64,
    pub relative_error: f64,
    /// Threshold after this row's feedback was applied
    pub threshold: f64,
}

impl ReportRow {
    /// Fixed-precision string fields in header order.
    pub fn to_record(&self) -> [String; 7] {
        [
            self.job_id.to_string(),
            self.resource_id.to_string(),
            self.resource_class.label().to_string(),
            format!("{:.2}", self.predicted_time),
            format!("{:.2}", self.actual_time),
            format!("{:.4}", self.relative_error),
            format!("{:.5}", self.threshold),
        ]
    }
}

/// Everything that happened to one batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Zero-based batch number within the scheduler's lifetime
    pub batch: u64,
    pub rows: Vec<ReportRow>,
    /// Jobs with no resource of their decided class
    pub unplaced: Vec<JobId>,
    /// Completions whose feedback was rejected
    pub skipped: Vec<JobId>,
    pub threshold_before: f64,
    pub threshold_after: f64,
}

impl BatchReport {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Mean relative error over the reported rows.
    pub fn mean_error(&self) -> Option<f64> {
        if self.rows.is_empty() {
            None
        } else {
            Some(self.rows.iter().map(|r| r.relative_error).sum::<f64>() / self.rows.len() as f64)
        }
    }

    /// Write the rows as CSV (with header) to `writer`.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(REPORT_HEADER)?;
        for row in &self.rows {
            csv_writer.write_record(row.to_record())?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Write the rows as CSV to a file, creating parent directories.
    pub fn write_csv_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = std::fs::File::create(path)?;
        self.write_csv(file)?;
        tracing::info!(path = %path.display(), rows = self.rows.len(), "report written");
        Ok(())
    }

    /// Append several batch reports to one CSV stream under a single header.
    pub fn write_all_csv<W: Write>(reports: &[BatchReport], writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(REPORT_HEADER)?;
        for row in reports.iter().flat_map(|r| r.rows.iter()) {
            csv_writer.write_record(row.to_record())?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "========== BATCH {} ==========", self.batch)?;
        writeln!(
            f,
            "{:>6}  {:>8}  {:>5}  {:>10}  {:>10}  {:>8}  {:>9}",
            "Job", "Resource", "Class", "Predicted", "Actual", "Error", "Threshold"
        )?;
        for row in &self.rows {
            let [job, resource, class, predicted, actual, error, threshold] = row.to_record();
            writeln!(
                f,
                "{:>6}  {:>8}  {:>5}  {:>10}  {:>10}  {:>8}  {:>9}",
                job, resource, class, predicted, actual, error, threshold
            )?;
        }
        if !self.unplaced.is_empty() {
            let ids: Vec<String> = self.unplaced.iter().map(|id| id.to_string()).collect();
            writeln!(f, "Unplaceable: {}", ids.join(", "))?;
        }
        if !self.skipped.is_empty() {
            let ids: Vec<String> = self.skipped.iter().map(|id| id.to_string()).collect();
            writeln!(f, "Feedback skipped: {}", ids.join(", "))?;
        }
        write!(
            f,
            "Threshold: {:.5} -> {:.5}",
            self.threshold_before, self.threshold_after
        )
    }
}
