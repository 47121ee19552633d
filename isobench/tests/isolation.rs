//! End-to-end tests against the `isobench-selftest` fixture binary.
//!
//! Every benchmark runs in a real worker process spawned by the harness.

use isobench::prelude::*;
use isobench::{DefinitionFile, Orchestrator, StaticSource, Supervisor, WorkerCommand};
use isobench_ipc::WORKER_FLAG;
use serde_json::Value;
use std::cell::RefCell;
use std::process::{Command, Output};
use std::time::{Duration, Instant};

fn selftest(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_isobench-selftest"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run isobench-selftest")
}

fn json_run(args: &[&str]) -> (Option<i32>, Value) {
    let mut full = vec!["--format", "json"];
    full.extend_from_slice(args);
    let output = selftest(&full);
    let report: Value = serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not a JSON report ({e}):\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    });
    (output.status.code(), report)
}

fn ids(values: &Value, key: &str) -> Vec<String> {
    let mut ids: Vec<String> = values
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v[key].as_str().unwrap().to_string())
        .collect();
    ids.sort();
    ids
}

#[test]
fn list_prints_tree_without_running() {
    let output = selftest(&["--list", "stable.rs"]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Stable/"));
    assert!(stdout.contains("  sum  [stable.rs:Stable:sum]"));
    assert!(stdout.contains("    collect  [stable.rs:Stable:Nested:collect]"));
    assert!(stdout.contains("2 benchmarks selected."));
}

#[test]
fn stable_benchmarks_complete() {
    let (code, report) = json_run(&["stable.rs"]);
    assert_eq!(code, Some(0));

    assert_eq!(
        ids(&report["results"], "id"),
        vec!["stable.rs:Stable:Nested:collect", "stable.rs:Stable:sum"]
    );
    assert!(report["errors"].as_array().unwrap().is_empty());

    for result in report["results"].as_array().unwrap() {
        assert_eq!(result["filename"], "stable.rs");
        // Suite overrides reach the worker
        assert_eq!(result["options"]["max_samples"], 20);
        assert_eq!(result["options"]["min_time_ns"], 1_000_000);

        let samples = result["stats"]["sample_count"].as_u64().unwrap();
        assert!((5..=20).contains(&samples), "sample_count {samples}");
        assert_eq!(result["times"].as_array().unwrap().len() as u64, samples);
        assert!(result["count"].as_u64().unwrap() >= 1);
        assert!(result["stats"]["mean"].as_f64().unwrap() > 0.0);

        let attempts = result["attempts"].as_u64().unwrap();
        assert!((1..=2).contains(&attempts));
    }
    assert_eq!(report["summary"]["completed"], 2);
}

#[test]
fn elided_times_and_filter() {
    let (code, report) = json_run(&["stable.rs", "--filter", "Nested", "--elide-times"]);
    assert_eq!(code, Some(0));

    let results = report["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["id"], "stable.rs:Stable:Nested:collect");
    assert!(results[0]["times"].as_array().unwrap().is_empty());
    assert!(results[0]["stats"]["sample_count"].as_u64().unwrap() >= 5);
}

#[test]
fn panics_and_aborts_are_isolated() {
    let (code, report) = json_run(&["failing.rs", "--min-time", "1ms"]);
    assert_eq!(code, Some(1));
    assert!(report["results"].as_array().unwrap().is_empty());

    let errors = report["errors"].as_array().unwrap();
    assert_eq!(
        ids(&report["errors"], "benchmark_id"),
        vec!["failing.rs:Failing:aborts", "failing.rs:Failing:panics"]
    );
    for error in errors {
        let message = error["message"].as_str().unwrap();
        match error["benchmark_id"].as_str().unwrap() {
            "failing.rs:Failing:panics" => {
                assert_eq!(message, "benchmark panicked: selftest panic")
            }
            _ => assert!(message.starts_with("worker terminated unexpectedly"), "{message}"),
        }
    }
    assert_eq!(report["summary"]["failed"], 2);
}

#[test]
fn broken_setup_is_reported() {
    let (code, report) = json_run(&["hooks.rs"]);
    assert_eq!(code, Some(1));

    let errors = report["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["benchmark_id"], "hooks.rs:Hooks:never measured");
    assert_eq!(errors[0]["message"], "setup failed: fixture unavailable");
}

#[test]
fn failures_do_not_stop_other_benchmarks() {
    let (code, report) = json_run(&["stable.rs", "failing.rs", "--jobs", "2"]);
    assert_eq!(code, Some(1));
    assert_eq!(report["results"].as_array().unwrap().len(), 2);
    assert_eq!(report["errors"].as_array().unwrap().len(), 2);
    assert_eq!(report["summary"]["total_benchmarks"], 4);
}

#[test]
fn hanging_worker_times_out() {
    let started = Instant::now();
    let (code, report) = json_run(&["slow.rs", "--worker-timeout", "1"]);
    assert_eq!(code, Some(1));
    assert!(started.elapsed() < Duration::from_secs(8));

    let errors = report["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["benchmark_id"], "slow.rs:sleeps");
    assert!(errors[0]["message"].as_str().unwrap().contains("timed out"));
}

#[test]
fn human_output_streams_results() {
    let output = selftest(&["stable.rs", "failing.rs"]);
    assert_eq!(output.status.code(), Some(1));

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("stable.rs:Stable:sum"));
    assert!(stdout.contains("✗ failing.rs:Failing:panics"));
    assert!(stdout.contains("Summary: 2 completed"));
    assert!(stdout.contains("2 failed"));
}

#[test]
fn report_written_to_file() {
    let path = std::env::temp_dir()
        .join(format!("isobench-e2e-{}", std::process::id()))
        .join("report.json");
    let output = selftest(&["stable.rs", "--format", "json", "--output", path.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty());

    let report: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(report["summary"]["completed"], 2);
    std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
}

#[test]
fn unknown_file_is_an_error() {
    let output = selftest(&["missing.rs"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown definition file: missing.rs"), "{stderr}");
}

// Mirrors the selftest's `flaky.rs`; workers only need the ids to match.
fn flaky(d: &mut Declarations<'_>) {
    let options = OptionOverrides::new()
        .min_time_ns(100_000)
        .max_time_ns(1_000_000_000)
        .min_samples(5)
        .max_samples(10)
        .max_tries(3);
    d.suite_with("Flaky", options, |d| {
        d.bench("settles", || ());
    });
}

#[test]
fn unstable_first_attempt_is_retried_in_worker() {
    let mut registry = Registry::with_source(
        BenchmarkOptions::default(),
        StaticSource::new([DefinitionFile::new("flaky.rs", flaky)]),
    );
    registry.add_files(["flaky.rs"]).unwrap();

    let command = WorkerCommand::new(env!("CARGO_BIN_EXE_isobench-selftest")).arg(WORKER_FLAG);
    let orchestrator = Orchestrator::new(Supervisor::new(command, Some(Duration::from_secs(30)), 1));

    let results = RefCell::new(Vec::new());
    let errors = RefCell::new(Vec::new());
    let finished = RefCell::new(0);
    let summary = {
        let mut bus = ResultEventBus::new();
        bus.on_result(|r| results.borrow_mut().push(r.clone()));
        bus.on_error(|e| errors.borrow_mut().push(e.message.clone()));
        bus.on_finished(|_| *finished.borrow_mut() += 1);
        orchestrator.run(&mut registry, &mut bus).unwrap()
    };

    assert!(errors.borrow().is_empty(), "{:?}", errors.borrow());
    let results = results.into_inner();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "flaky.rs:Flaky:settles");
    assert_eq!(results[0].attempts, 2);
    assert!(!results[0].degraded);
    assert_eq!(finished.into_inner(), 1);
    assert_eq!((summary.completed, summary.degraded, summary.failed), (1, 0, 0));
}

#[test]
fn flaky_benchmark_reported_once_through_cli() {
    let (code, report) = json_run(&["flaky.rs"]);
    assert_eq!(code, Some(0));

    let results = report["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["attempts"], 2);
    assert_eq!(results[0]["degraded"], false);
    assert_eq!(report["summary"]["completed"], 1);
}
