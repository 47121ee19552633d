//! IPC Message Types
//!
//! All messages are serialized with rkyv and validated on receipt.

use isobench_stats::FullAnalysis;
use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};

/// Resolved options for one benchmark run. Every field is concrete.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Archive, RkyvSerialize,
    RkyvDeserialize,
)]
#[archive(check_bytes)]
pub struct BenchmarkOptions {
    /// Floor on the duration of one calibrated round, in nanoseconds
    pub min_time_ns: u64,
    /// Ceiling on the accumulated sample time, in nanoseconds
    pub max_time_ns: u64,
    /// Rounds always collected
    pub min_samples: u64,
    /// Rounds never exceeded
    pub max_samples: u64,
    /// Attempts allowed before settling for an unaccepted result
    pub max_tries: u32,
}

impl Default for BenchmarkOptions {
    fn default() -> Self {
        Self {
            min_time_ns: 10_000_000,   // 10 ms
            max_time_ns: 1_000_000_000, // 1 second
            min_samples: 5,
            max_samples: 100,
            max_tries: 3,
        }
    }
}

impl BenchmarkOptions {
    /// Validate option values, returning a description of the first error found.
    ///
    /// A zero `min_time_ns` is valid: the clock's resolution floor applies.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_samples == 0 {
            return Err("min_samples must be >= 1".to_string());
        }
        if self.max_samples < self.min_samples {
            return Err(format!(
                "max_samples ({}) must be >= min_samples ({})",
                self.max_samples, self.min_samples
            ));
        }
        if self.max_tries == 0 {
            return Err("max_tries must be >= 1".to_string());
        }
        Ok(())
    }
}

/// Outcome of one benchmark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct BenchResult {
    /// Benchmark identifier (`file:suite:...:name`)
    pub id: String,
    /// Benchmark name
    pub name: String,
    /// Definition file that declared the benchmark
    pub filename: String,
    /// Statistics over `times`
    pub stats: FullAnalysis,
    /// Per-invocation sample times in nanoseconds (may be elided)
    pub times: Vec<f64>,
    /// Calibrated invocations per round
    pub count: u64,
    /// Options the benchmark ran with
    pub options: BenchmarkOptions,
    /// Attempts made before this result was produced
    pub attempts: u32,
    /// `true` when retries were exhausted without passing the acceptance check
    pub degraded: bool,
}

/// Categories of benchmark failures
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Archive, RkyvSerialize,
    RkyvDeserialize,
)]
#[archive(check_bytes)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// A setup hook panicked
    Setup,
    /// A teardown hook panicked
    Teardown,
    /// The measured function panicked
    Measured,
    /// Calibration never reached the time floor
    Calibration,
    /// Statistics could not be computed over the samples
    Statistics,
    /// The options failed validation
    InvalidOptions,
    /// The definition file could not be loaded
    Load,
    /// No benchmark with the requested id exists
    NotFound,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ErrorKind::Setup => "setup failed",
            ErrorKind::Teardown => "teardown failed",
            ErrorKind::Measured => "benchmark panicked",
            ErrorKind::Calibration => "calibration failed",
            ErrorKind::Statistics => "statistics failed",
            ErrorKind::InvalidOptions => "invalid options",
            ErrorKind::Load => "definition file failed to load",
            ErrorKind::NotFound => "benchmark not found",
        };
        f.write_str(label)
    }
}

/// Error reported by a worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct ErrorInfo {
    /// Error category
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
}

impl ErrorInfo {
    /// Create an error of `kind`
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Directive sent from the supervisor to a freshly spawned worker
#[derive(Debug, Clone, PartialEq, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct StartMessage {
    /// Benchmark to run
    pub benchmark_id: String,
    /// Definition file to load in the worker
    pub filename: String,
    /// Resolved options for the run
    pub options: BenchmarkOptions,
}

/// Final message sent by a worker before it exits.
///
/// Exactly one of a result or an error is carried.
#[derive(Debug, Clone, PartialEq, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub enum ExitMessage {
    /// The benchmark produced a result (accepted or degraded)
    Completed(BenchResult),
    /// The benchmark failed
    Failed(ErrorInfo),
}

impl ExitMessage {
    /// The carried result, if any
    pub fn result(&self) -> Option<&BenchResult> {
        match self {
            ExitMessage::Completed(result) => Some(result),
            ExitMessage::Failed(_) => None,
        }
    }

    /// The carried error, if any
    pub fn error(&self) -> Option<&ErrorInfo> {
        match self {
            ExitMessage::Completed(_) => None,
            ExitMessage::Failed(error) => Some(error),
        }
    }
}
