#![warn(missing_docs)]
//! isobench Core - Measurement Engine and Worker Runtime
//!
//! This crate provides everything that runs inside a worker process:
//! - `Clock` abstraction over a monotonic nanosecond time source
//! - Calibration of the invocations per round and adaptive sampling
//! - `BenchmarkUnit`, the retrying measurement state machine
//! - `Registry`, the suite tree built from registered definition files
//! - `WorkerMain`, the one-shot worker entry point

mod calibrate;
mod measure;
mod options;
mod registry;
mod sampling;
mod unit;
mod worker;

pub use calibrate::{
    CalibrationError, MAX_CALIBRATION_COUNT, RESOLUTION_UNCERTAINTY, calibrate, effective_min_time,
};
pub use measure::{Clock, MonotonicClock, time_batch};
pub use options::OptionOverrides;
pub use registry::{
    Benchmark, DeclareFn, Declarations, DefinitionFile, DefinitionSource, Hook, Hooks, ID_SEPARATOR,
    InventorySource, Node, Registry, RegistryError, StaticSource, Suite,
};
pub use sampling::{collect_samples, sample_round};
pub use unit::{BenchmarkUnit, UnitError, UnitState, panic_message};
pub use worker::{WorkerError, WorkerMain, execute};

// Definition files registered with `inventory::submit!`
inventory::collect!(DefinitionFile);
