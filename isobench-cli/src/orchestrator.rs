//! Orchestrator
//!
//! Walks the registry, hands every selected benchmark to the supervisor and
//! publishes outcomes on the event bus as they arrive.

use crate::supervisor::{IsolationError, JobOutcome, Supervisor};
use isobench_core::Registry;
use isobench_ipc::{BenchResult, StartMessage};
use isobench_report::{FailedBenchmark, ResultEventBus};
use regex::Regex;

/// Counts for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Benchmarks handed to a worker
    pub selected: usize,
    /// Benchmarks with a result
    pub completed: usize,
    /// Results whose acceptance check never passed
    pub degraded: usize,
    /// Benchmarks without a result
    pub failed: usize,
}

impl RunSummary {
    /// True when any benchmark failed
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Drives one run over a loaded registry
pub struct Orchestrator {
    supervisor: Supervisor,
    filter: Option<Regex>,
    keep_times: bool,
}

impl Orchestrator {
    /// Create an orchestrator that runs everything and keeps raw times
    pub fn new(supervisor: Supervisor) -> Self {
        Self {
            supervisor,
            filter: None,
            keep_times: true,
        }
    }

    /// Only run benchmarks whose id matches `filter`
    pub fn with_filter(mut self, filter: Option<Regex>) -> Self {
        self.filter = filter;
        self
    }

    /// Drop raw per-invocation times from results before publishing
    pub fn with_keep_times(mut self, keep_times: bool) -> Self {
        self.keep_times = keep_times;
        self
    }

    /// Start messages for the selected benchmarks, in declaration order
    pub fn plan(&self, registry: &Registry) -> Vec<StartMessage> {
        registry
            .benchmarks()
            .into_iter()
            .filter(|bench| self.filter.as_ref().is_none_or(|re| re.is_match(&bench.id)))
            .map(|bench| StartMessage {
                benchmark_id: bench.id.clone(),
                filename: bench.filename.clone(),
                options: bench.options,
            })
            .collect()
    }

    /// Run every selected benchmark.
    ///
    /// Benchmark failures become error events and never abort the run; only
    /// a failure to start the worker pool is returned as an error.
    pub fn run(
        &self,
        registry: &mut Registry,
        bus: &mut ResultEventBus<'_>,
    ) -> Result<RunSummary, IsolationError> {
        bus.publish_hierarchy(registry.roots());

        let jobs = self.plan(registry);
        let mut summary = RunSummary {
            selected: jobs.len(),
            ..RunSummary::default()
        };
        tracing::info!(
            benchmarks = jobs.len(),
            workers = self.supervisor.num_workers(),
            "starting run"
        );

        let mut results: Vec<BenchResult> = Vec::with_capacity(jobs.len());
        self.supervisor.run_all(jobs, |JobOutcome { benchmark_id, outcome }| match outcome {
            Ok(mut result) => {
                if !self.keep_times {
                    result.times.clear();
                }
                summary.completed += 1;
                if result.degraded {
                    summary.degraded += 1;
                }
                bus.publish_result(&result);
                if let Err(e) = registry.attach_result(&benchmark_id, result.clone()) {
                    tracing::warn!(benchmark = %benchmark_id, error = %e, "result not attached");
                }
                results.push(result);
            }
            Err(e) => {
                summary.failed += 1;
                bus.publish_error(&FailedBenchmark::new(benchmark_id, e.to_string()));
            }
        })?;

        bus.publish_finished(&results);
        tracing::info!(
            completed = summary.completed,
            degraded = summary.degraded,
            failed = summary.failed,
            "run finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supervisor::WorkerCommand;
    use isobench_core::{DefinitionFile, Declarations, StaticSource};
    use isobench_ipc::BenchmarkOptions;
    use std::cell::RefCell;
    use std::time::Duration;

    fn declare(d: &mut Declarations<'_>) {
        d.suite("Math", |d| {
            d.bench("add", || 1 + 1);
            d.bench("mul", || 2 * 3);
        });
        d.bench("top", || ());
    }

    fn registry() -> Registry {
        let mut registry = Registry::with_source(
            BenchmarkOptions::default(),
            StaticSource::new([DefinitionFile::new("orch.rs", declare)]),
        );
        registry.add_files(["orch.rs"]).unwrap();
        registry
    }

    fn orchestrator(script: &str, jobs: usize) -> Orchestrator {
        let command = WorkerCommand::new("/bin/sh").arg("-c").arg(script);
        Orchestrator::new(Supervisor::new(command, Some(Duration::from_secs(10)), jobs))
    }

    #[test]
    fn test_plan_declaration_order() {
        let registry = registry();
        let ids: Vec<String> = orchestrator("exit 1", 1)
            .plan(&registry)
            .into_iter()
            .map(|s| s.benchmark_id)
            .collect();
        assert_eq!(ids, vec!["orch.rs:Math:add", "orch.rs:Math:mul", "orch.rs:top"]);
    }

    #[test]
    fn test_plan_filter() {
        let registry = registry();
        let plan = orchestrator("exit 1", 1)
            .with_filter(Some(Regex::new("Math:m").unwrap()))
            .plan(&registry);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].benchmark_id, "orch.rs:Math:mul");
        assert_eq!(plan[0].filename, "orch.rs");
    }

    #[test]
    fn test_crashing_workers_become_error_events() {
        let mut registry = registry();
        let hierarchy = RefCell::new(0);
        let errors = RefCell::new(Vec::new());
        let finished = RefCell::new(None);

        let summary = {
            let mut bus = ResultEventBus::new();
            bus.on_hierarchy(|roots| *hierarchy.borrow_mut() += roots.len());
            bus.on_error(|f| errors.borrow_mut().push(f.clone()));
            bus.on_finished(|results| *finished.borrow_mut() = Some(results.len()));
            orchestrator("exit 2", 2).run(&mut registry, &mut bus).unwrap()
        };

        assert_eq!(*hierarchy.borrow(), 2);
        assert_eq!(*finished.borrow(), Some(0));
        assert_eq!(
            summary,
            RunSummary {
                selected: 3,
                completed: 0,
                degraded: 0,
                failed: 3
            }
        );
        assert!(summary.has_failures());

        let errors = errors.into_inner();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().all(|f| f.message.contains("terminated unexpectedly")));
        assert!(registry.get_benchmark("orch.rs:top").unwrap().result().is_none());
    }

    #[test]
    fn test_empty_selection_still_finishes() {
        let mut registry = registry();
        let finished = RefCell::new(false);
        let summary = {
            let mut bus = ResultEventBus::new();
            bus.on_finished(|_| *finished.borrow_mut() = true);
            orchestrator("exit 1", 1)
                .with_filter(Some(Regex::new("^nothing$").unwrap()))
                .run(&mut registry, &mut bus)
                .unwrap()
        };
        assert!(finished.into_inner());
        assert_eq!(summary, RunSummary::default());
    }
}
