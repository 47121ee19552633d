#![warn(missing_docs)]
//! # isobench
//!
//! Statistically adaptive benchmarking with per-benchmark process isolation.
//!
//! - **Adaptive measurement**: each benchmark is calibrated until one round
//!   outlasts the clock's resolution, then sampled until the 99.9% margin of
//!   error falls within 10% of the mean (or the attempts run out)
//! - **Process isolation**: every benchmark runs in a fresh worker process, so
//!   a panic, abort or leak in one cannot touch another's measurement
//! - **Suites**: nested suites with inherited options and setup/teardown hooks
//! - **Exporters**: streaming human output or one JSON document per run
//!
//! ## Quick Start
//!
//! ```ignore
//! use isobench::prelude::*;
//!
//! fn declare(d: &mut Declarations<'_>) {
//!     d.suite("Sorting", |d| {
//!         d.setup(|| warm_caches());
//!         d.bench("sort 1k", || {
//!             let mut v: Vec<u32> = (0..1000).rev().collect();
//!             v.sort();
//!             v
//!         });
//!     });
//! }
//!
//! isobench::definition_file!("sorting.rs", declare);
//!
//! fn main() -> anyhow::Result<()> {
//!     isobench::run()
//! }
//! ```

// Re-export core types
pub use isobench_core::{
    Benchmark, BenchmarkUnit, Clock, DeclareFn, Declarations, DefinitionFile, DefinitionSource,
    Hooks, InventorySource, MonotonicClock, Node, OptionOverrides, Registry, RegistryError,
    StaticSource, Suite, UnitError, UnitState,
};

// Re-export wire types
pub use isobench_ipc::{BenchResult, BenchmarkOptions, ErrorInfo, ErrorKind};

// Re-export stats
pub use isobench_stats::{ConfidenceLevel, FullAnalysis, StatsError};

// Re-export reporting
pub use isobench_report::{
    ConsoleExporter, Exporter, FailedBenchmark, JsonExporter, JsonReport, OutputFormat,
    ResultEventBus,
};

// Re-export the harness
pub use isobench_cli::{
    Cli, IsobenchConfig, IsolationError, Orchestrator, RunSummary, Supervisor, WorkerCommand,
};

/// Internal re-exports for macro use
#[doc(hidden)]
pub mod internal {
    pub use inventory;
}

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        BenchResult, BenchmarkOptions, Declarations, OptionOverrides, Registry, ResultEventBus,
        definition_file,
    };
}

/// Register a definition file: a file name and the function that declares
/// its suites and benchmarks.
///
/// ```ignore
/// fn declare(d: &mut isobench::Declarations<'_>) {
///     d.bench("noop", || ());
/// }
///
/// isobench::definition_file!("noop.rs", declare);
/// ```
#[macro_export]
macro_rules! definition_file {
    ($filename:expr, $declare:path $(,)?) => {
        $crate::internal::inventory::submit! {
            $crate::DefinitionFile::new($filename, $declare)
        }
    };
}

/// Run the isobench CLI harness.
///
/// Call this from your benchmark binary's `main()`:
/// ```ignore
/// fn main() -> anyhow::Result<()> {
///     isobench::run()
/// }
/// ```
pub use isobench_cli::run;
