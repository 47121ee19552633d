//! Option Overrides
//!
//! Suites and benchmarks declare partial options; anything left unset is
//! inherited from the enclosing suite, and ultimately from the registry
//! defaults.

use isobench_ipc::BenchmarkOptions;
use serde::{Deserialize, Serialize};

/// Partially specified [`BenchmarkOptions`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionOverrides {
    /// Floor on one calibrated round, in nanoseconds
    pub min_time_ns: Option<u64>,
    /// Ceiling on the accumulated sample time, in nanoseconds
    pub max_time_ns: Option<u64>,
    /// Rounds always collected
    pub min_samples: Option<u64>,
    /// Rounds never exceeded
    pub max_samples: Option<u64>,
    /// Attempts allowed
    pub max_tries: Option<u32>,
}

impl OptionOverrides {
    /// No overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Override `min_time_ns`
    pub fn min_time_ns(mut self, value: u64) -> Self {
        self.min_time_ns = Some(value);
        self
    }

    /// Override `max_time_ns`
    pub fn max_time_ns(mut self, value: u64) -> Self {
        self.max_time_ns = Some(value);
        self
    }

    /// Override `min_samples`
    pub fn min_samples(mut self, value: u64) -> Self {
        self.min_samples = Some(value);
        self
    }

    /// Override `max_samples`
    pub fn max_samples(mut self, value: u64) -> Self {
        self.max_samples = Some(value);
        self
    }

    /// Override `max_tries`
    pub fn max_tries(mut self, value: u32) -> Self {
        self.max_tries = Some(value);
        self
    }

    /// Layer `child` over `self`; every value set in `child` wins.
    pub fn merge(self, child: OptionOverrides) -> OptionOverrides {
        OptionOverrides {
            min_time_ns: child.min_time_ns.or(self.min_time_ns),
            max_time_ns: child.max_time_ns.or(self.max_time_ns),
            min_samples: child.min_samples.or(self.min_samples),
            max_samples: child.max_samples.or(self.max_samples),
            max_tries: child.max_tries.or(self.max_tries),
        }
    }

    /// Resolve against fully specified parent options.
    pub fn apply(&self, parent: &BenchmarkOptions) -> BenchmarkOptions {
        BenchmarkOptions {
            min_time_ns: self.min_time_ns.unwrap_or(parent.min_time_ns),
            max_time_ns: self.max_time_ns.unwrap_or(parent.max_time_ns),
            min_samples: self.min_samples.unwrap_or(parent.min_samples),
            max_samples: self.max_samples.unwrap_or(parent.max_samples),
            max_tries: self.max_tries.unwrap_or(parent.max_tries),
        }
    }

    /// `true` when nothing is overridden
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
