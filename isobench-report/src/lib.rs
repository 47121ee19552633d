#![warn(missing_docs)]
//! isobench Report - Result Events and Exporters
//!
//! Results are published on a [`ResultEventBus`] as benchmarks finish.
//! Two exporters ship with the crate:
//! - Human (streaming terminal output)
//! - JSON (one machine-readable document at the end of the run)

mod console;
mod events;
mod json;

pub use console::{ConsoleExporter, format_duration, format_result_line, format_tree};
pub use events::{Exporter, FailedBenchmark, ResultEventBus};
pub use json::{
    JsonExporter, JsonReport, ReportMeta, ReportSummary, SCHEMA_VERSION, generate_json_report,
};

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable terminal output
    #[default]
    Human,
    /// JSON with full schema
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" | "text" => Ok(OutputFormat::Human),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("text".parse::<OutputFormat>(), Ok(OutputFormat::Human));
        assert!("csv".parse::<OutputFormat>().is_err());
    }
}
