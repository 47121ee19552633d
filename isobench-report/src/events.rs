//! Result Event Bus
//!
//! Fan-out of run events to subscribers. Every event kind has its own ordered
//! subscriber list; publishing calls each subscriber synchronously on the
//! publishing thread.

use isobench_core::Node;
use isobench_ipc::BenchResult;
use serde::{Deserialize, Serialize};

/// A benchmark that produced no result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedBenchmark {
    /// Id of the failed benchmark
    pub benchmark_id: String,
    /// What went wrong
    pub message: String,
}

impl FailedBenchmark {
    /// Create a failure record
    pub fn new(benchmark_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            benchmark_id: benchmark_id.into(),
            message: message.into(),
        }
    }
}

/// A consumer of every event kind. All methods default to doing nothing.
pub trait Exporter {
    /// The suite tree, once, before any benchmark runs
    fn on_hierarchy(&mut self, _roots: &[Node]) {}

    /// One completed benchmark
    fn on_result(&mut self, _result: &BenchResult) {}

    /// Every completed benchmark, once, after the run
    fn on_finished(&mut self, _results: &[BenchResult]) {}

    /// One failed benchmark
    fn on_error(&mut self, _failure: &FailedBenchmark) {}
}

/// Per-kind subscriber lists
#[derive(Default)]
pub struct ResultEventBus<'a> {
    hierarchy: Vec<Box<dyn FnMut(&[Node]) + 'a>>,
    result: Vec<Box<dyn FnMut(&BenchResult) + 'a>>,
    finished: Vec<Box<dyn FnMut(&[BenchResult]) + 'a>>,
    error: Vec<Box<dyn FnMut(&FailedBenchmark) + 'a>>,
    exporters: Vec<Box<dyn Exporter + 'a>>,
}

impl<'a> ResultEventBus<'a> {
    /// Bus without subscribers
    pub fn new() -> Self {
        Self {
            hierarchy: Vec::new(),
            result: Vec::new(),
            finished: Vec::new(),
            error: Vec::new(),
            exporters: Vec::new(),
        }
    }

    /// Subscribe to the suite tree
    pub fn on_hierarchy(&mut self, f: impl FnMut(&[Node]) + 'a) {
        self.hierarchy.push(Box::new(f));
    }

    /// Subscribe to completed benchmarks
    pub fn on_result(&mut self, f: impl FnMut(&BenchResult) + 'a) {
        self.result.push(Box::new(f));
    }

    /// Subscribe to the end of the run
    pub fn on_finished(&mut self, f: impl FnMut(&[BenchResult]) + 'a) {
        self.finished.push(Box::new(f));
    }

    /// Subscribe to failed benchmarks
    pub fn on_error(&mut self, f: impl FnMut(&FailedBenchmark) + 'a) {
        self.error.push(Box::new(f));
    }

    /// Attach an exporter to every event kind. Exporters are notified after
    /// the plain subscribers, in attachment order.
    pub fn attach(&mut self, exporter: impl Exporter + 'a) {
        self.exporters.push(Box::new(exporter));
    }

    /// Number of subscribers and exporters
    pub fn len(&self) -> usize {
        self.hierarchy.len()
            + self.result.len()
            + self.finished.len()
            + self.error.len()
            + self.exporters.len()
    }

    /// `true` when nothing is subscribed
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Publish the suite tree
    pub fn publish_hierarchy(&mut self, roots: &[Node]) {
        for f in &mut self.hierarchy {
            f(roots);
        }
        for exporter in &mut self.exporters {
            exporter.on_hierarchy(roots);
        }
    }

    /// Publish one completed benchmark
    pub fn publish_result(&mut self, result: &BenchResult) {
        for f in &mut self.result {
            f(result);
        }
        for exporter in &mut self.exporters {
            exporter.on_result(result);
        }
    }

    /// Publish the end of the run
    pub fn publish_finished(&mut self, results: &[BenchResult]) {
        for f in &mut self.finished {
            f(results);
        }
        for exporter in &mut self.exporters {
            exporter.on_finished(results);
        }
    }

    /// Publish one failed benchmark
    pub fn publish_error(&mut self, failure: &FailedBenchmark) {
        for f in &mut self.error {
            f(failure);
        }
        for exporter in &mut self.exporters {
            exporter.on_error(failure);
        }
    }
}
