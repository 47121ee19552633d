//! JSON Output

use crate::events::{Exporter, FailedBenchmark};
use chrono::{DateTime, Utc};
use isobench_ipc::BenchResult;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Version of the JSON report layout
pub const SCHEMA_VERSION: u32 = 1;

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    /// Layout version, see [`SCHEMA_VERSION`]
    pub schema_version: u32,
    /// isobench version that produced the report
    pub version: String,
    /// When the report was written
    pub timestamp: DateTime<Utc>,
}

/// Report summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Benchmarks that reached a terminal state
    pub total_benchmarks: usize,
    /// Benchmarks with a result
    pub completed: usize,
    /// Results whose acceptance check never passed
    pub degraded: usize,
    /// Benchmarks without a result
    pub failed: usize,
}

/// Complete machine-readable report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonReport {
    /// Metadata
    pub meta: ReportMeta,
    /// Completed benchmarks, in completion order
    pub results: Vec<BenchResult>,
    /// Failed benchmarks, in completion order
    pub errors: Vec<FailedBenchmark>,
    /// Counts
    pub summary: ReportSummary,
}

impl JsonReport {
    /// Build a report stamped with the current time
    pub fn new(results: Vec<BenchResult>, errors: Vec<FailedBenchmark>) -> Self {
        let summary = ReportSummary {
            total_benchmarks: results.len() + errors.len(),
            completed: results.len(),
            degraded: results.iter().filter(|r| r.degraded).count(),
            failed: errors.len(),
        };
        Self {
            meta: ReportMeta {
                schema_version: SCHEMA_VERSION,
                version: env!("CARGO_PKG_VERSION").to_string(),
                timestamp: Utc::now(),
            },
            results,
            errors,
            summary,
        }
    }
}

/// Generate a prettified JSON report.
pub fn generate_json_report(report: &JsonReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Collects errors during the run and writes one JSON document when it finishes
pub struct JsonExporter<W: Write> {
    out: W,
    errors: Vec<FailedBenchmark>,
}

impl<W: Write> JsonExporter<W> {
    /// Write the report to `out`
    pub fn new(out: W) -> Self {
        Self {
            out,
            errors: Vec::new(),
        }
    }
}

impl<W: Write> Exporter for JsonExporter<W> {
    fn on_error(&mut self, failure: &FailedBenchmark) {
        self.errors.push(failure.clone());
    }

    fn on_finished(&mut self, results: &[BenchResult]) {
        let report = JsonReport::new(results.to_vec(), std::mem::take(&mut self.errors));
        let written = generate_json_report(&report)
            .map_err(std::io::Error::from)
            .and_then(|json| {
                self.out.write_all(json.as_bytes())?;
                self.out.write_all(b"\n")?;
                self.out.flush()
            });
        if let Err(e) = written {
            tracing::warn!(error = %e, "failed to write JSON report");
        }
    }
}
