//! Benchmark Unit
//!
//! Drives one benchmark through calibration, sampling and analysis, retrying
//! until the acceptance check passes or the attempts run out.
//!
//! ```text
//! Idle -> Calibrating -> Sampling -> Analyzing -> Accepted
//!              ^                         |
//!              +------- Rejected <-------+
//!                          |
//!                          +-> Exhausted   (attempt == max_tries)
//! ```

use crate::calibrate::{CalibrationError, calibrate, effective_min_time};
use crate::measure::Clock;
use crate::registry::{Benchmark, Hook, Hooks};
use crate::sampling::collect_samples;
use isobench_ipc::{BenchResult, BenchmarkOptions, ErrorInfo, ErrorKind};
use isobench_stats::{ACCEPTANCE_CONFIDENCE, FullAnalysis, StatsError};
use std::panic::{AssertUnwindSafe, catch_unwind};
use thiserror::Error;
use tracing::{debug, trace};

/// Lifecycle of a benchmark unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    /// Not started
    Idle,
    /// Setup hooks ran; searching for the round size
    Calibrating {
        /// 1-based attempt number
        attempt: u32,
    },
    /// Collecting rounds of `count` invocations
    Sampling {
        /// 1-based attempt number
        attempt: u32,
        /// Invocations per round
        count: u64,
    },
    /// Computing statistics over the samples
    Analyzing {
        /// 1-based attempt number
        attempt: u32,
    },
    /// The acceptance check passed
    Accepted,
    /// The acceptance check failed
    Rejected {
        /// 1-based attempt number
        attempt: u32,
    },
    /// Every attempt was rejected
    Exhausted,
}

/// Benchmark failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitError {
    /// The resolved options are inconsistent
    #[error("invalid options: {0}")]
    InvalidOptions(String),
    /// A setup hook panicked
    #[error("setup failed: {0}")]
    Setup(String),
    /// A teardown hook panicked
    #[error("teardown failed: {0}")]
    Teardown(String),
    /// The measured function panicked
    #[error("benchmark panicked: {0}")]
    Measured(String),
    /// Calibration did not converge
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
    /// Statistics could not be computed
    #[error("statistics failed: {0}")]
    Statistics(#[from] StatsError),
}

impl UnitError {
    /// Wire category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            UnitError::InvalidOptions(_) => ErrorKind::InvalidOptions,
            UnitError::Setup(_) => ErrorKind::Setup,
            UnitError::Teardown(_) => ErrorKind::Teardown,
            UnitError::Measured(_) => ErrorKind::Measured,
            UnitError::Calibration(_) => ErrorKind::Calibration,
            UnitError::Statistics(_) => ErrorKind::Statistics,
        }
    }
}

impl From<&UnitError> for ErrorInfo {
    fn from(error: &UnitError) -> Self {
        let message = match error {
            UnitError::InvalidOptions(m)
            | UnitError::Setup(m)
            | UnitError::Teardown(m)
            | UnitError::Measured(m) => m.clone(),
            other => other.to_string(),
        };
        ErrorInfo::new(error.kind(), message)
    }
}

/// Extract the message of a caught panic
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

fn guarded<T>(f: impl FnOnce() -> T) -> Result<T, String> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|payload| panic_message(payload.as_ref()))
}

fn run_hooks(hooks: &[Hook]) -> Result<(), String> {
    for hook in hooks {
        guarded(|| hook())?;
    }
    Ok(())
}

/// One benchmark's measurement state machine
pub struct BenchmarkUnit<'a, C: Clock + ?Sized> {
    clock: &'a C,
    benchmark: &'a Benchmark,
    hooks: &'a Hooks,
    options: BenchmarkOptions,
    state: UnitState,
    history: Vec<UnitState>,
}

impl<'a, C: Clock + ?Sized> BenchmarkUnit<'a, C> {
    /// Prepare a unit; nothing runs until [`BenchmarkUnit::run`]
    pub fn new(
        clock: &'a C,
        benchmark: &'a Benchmark,
        hooks: &'a Hooks,
        options: BenchmarkOptions,
    ) -> Self {
        Self {
            clock,
            benchmark,
            hooks,
            options,
            state: UnitState::Idle,
            history: vec![UnitState::Idle],
        }
    }

    /// Current state
    pub fn state(&self) -> UnitState {
        self.state
    }

    /// Every state entered so far, in order
    pub fn history(&self) -> &[UnitState] {
        &self.history
    }

    fn transition(&mut self, next: UnitState) {
        trace!(benchmark = %self.benchmark.id, from = ?self.state, to = ?next, "unit transition");
        self.state = next;
        self.history.push(next);
    }

    /// Run every attempt and produce the final result.
    ///
    /// A panic in a hook or the measured function aborts the unit at once;
    /// no further hooks run after it.
    pub fn run(&mut self) -> Result<BenchResult, UnitError> {
        self.options.validate().map_err(UnitError::InvalidOptions)?;

        let floor = effective_min_time(self.clock, self.options.min_time_ns);
        let benchmark = self.benchmark;
        let mut attempt: u32 = 1;

        loop {
            self.transition(UnitState::Calibrating { attempt });
            run_hooks(&self.hooks.setup).map_err(UnitError::Setup)?;

            let mut invoke = || benchmark.call();
            let count = guarded(|| calibrate(self.clock, &mut invoke, floor))
                .map_err(UnitError::Measured)??;

            self.transition(UnitState::Sampling { attempt, count });
            let options = self.options;
            let samples = guarded(|| collect_samples(self.clock, &mut invoke, count, &options))
                .map_err(UnitError::Measured)?;

            self.transition(UnitState::Analyzing { attempt });
            let stats = FullAnalysis::compute(&samples, ACCEPTANCE_CONFIDENCE)?;
            debug!(
                benchmark = %benchmark.id,
                attempt,
                count,
                samples = samples.len(),
                mean = stats.mean,
                margin = stats.relative_margin(),
                "attempt analyzed"
            );

            if stats.is_stable() {
                run_hooks(&self.hooks.teardown).map_err(UnitError::Teardown)?;
                self.transition(UnitState::Accepted);
                return Ok(self.result(stats, samples, count, attempt, false));
            }

            self.transition(UnitState::Rejected { attempt });
            if attempt >= self.options.max_tries {
                run_hooks(&self.hooks.teardown).map_err(UnitError::Teardown)?;
                self.transition(UnitState::Exhausted);
                debug!(benchmark = %benchmark.id, attempt, "retries exhausted, keeping last analysis");
                return Ok(self.result(stats, samples, count, attempt, true));
            }
            attempt += 1;
        }
    }

    fn result(
        &self,
        stats: FullAnalysis,
        times: Vec<f64>,
        count: u64,
        attempts: u32,
        degraded: bool,
    ) -> BenchResult {
        BenchResult {
            id: self.benchmark.id.clone(),
            name: self.benchmark.name.clone(),
            filename: self.benchmark.filename.clone(),
            stats,
            times,
            count,
            options: self.options,
            attempts,
            degraded,
        }
    }
}
