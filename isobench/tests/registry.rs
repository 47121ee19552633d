//! In-process tests: definition files registered through the macro, the
//! registry built from them, and the event bus.

use isobench::prelude::*;
use isobench::{Exporter, FailedBenchmark, Node};
use isobench_core::{MonotonicClock, execute};
use isobench_ipc::{ExitMessage, StartMessage};
use std::cell::RefCell;
use std::rc::Rc;

fn parsing(d: &mut Declarations<'_>) {
    d.suite_with("Parse", OptionOverrides::new().max_samples(10), |d| {
        d.setup(|| {});
        d.bench("ints", || "12345".parse::<u64>());
        d.suite_with("Floats", OptionOverrides::new().min_time_ns(500_000), |d| {
            d.teardown(|| {});
            d.bench("short", || "1.5".parse::<f64>());
        });
    });
}

fn duplicated(d: &mut Declarations<'_>) {
    d.bench("same", || ());
    d.bench("same", || ());
}

definition_file!("parsing.rs", parsing);
definition_file!("duplicated.rs", duplicated);

#[test]
fn registered_files_are_discoverable() {
    let registry = Registry::new(BenchmarkOptions::default());
    let files = registry.available_files();
    assert!(files.contains(&"parsing.rs".to_string()));
    assert!(files.contains(&"duplicated.rs".to_string()));

    let mut sorted = files.clone();
    sorted.sort();
    assert_eq!(files, sorted);
}

#[test]
fn options_inherit_down_the_tree() {
    let defaults = BenchmarkOptions {
        max_tries: 7,
        ..BenchmarkOptions::default()
    };
    let mut registry = Registry::new(defaults);
    registry.add_files(["parsing.rs"]).unwrap();

    let ints = registry.get_benchmark("parsing.rs:Parse:ints").unwrap();
    assert_eq!(ints.options.max_samples, 10);
    assert_eq!(ints.options.max_tries, 7);

    let short = registry.get_benchmark("parsing.rs:Parse:Floats:short").unwrap();
    assert_eq!(short.options.max_samples, 10);
    assert_eq!(short.options.min_time_ns, 500_000);

    let hooks = registry.hooks_for("parsing.rs:Parse:Floats:short").unwrap();
    assert_eq!(hooks.setup.len(), 1);
    assert_eq!(hooks.teardown.len(), 1);
}

#[test]
fn duplicate_ids_fail_the_file() {
    let mut registry = Registry::new(BenchmarkOptions::default());
    let err = registry.add_files(["duplicated.rs"]).unwrap_err();
    assert_eq!(err, isobench::RegistryError::DuplicateId("duplicated.rs:same".into()));
    assert!(registry.roots().is_empty());
}

#[test]
fn worker_execution_in_process() {
    let start = StartMessage {
        benchmark_id: "parsing.rs:Parse:ints".to_string(),
        filename: "parsing.rs".to_string(),
        options: BenchmarkOptions {
            min_time_ns: 100_000,
            max_time_ns: 5_000_000,
            max_samples: 10,
            ..BenchmarkOptions::default()
        },
    };

    let mut registry = Registry::new(BenchmarkOptions::default());
    match execute(&MonotonicClock::new(), &mut registry, &start) {
        ExitMessage::Completed(result) => {
            assert_eq!(result.id, "parsing.rs:Parse:ints");
            assert_eq!(result.name, "ints");
            assert!(result.stats.sample_count >= 5);
            assert!(result.count >= 1);
        }
        ExitMessage::Failed(info) => panic!("unexpected failure: {info}"),
    }
}

#[test]
fn bus_delivers_to_exporters_and_closures() {
    #[derive(Default)]
    struct Recorder {
        events: Rc<RefCell<Vec<String>>>,
    }

    impl Exporter for Recorder {
        fn on_hierarchy(&mut self, roots: &[Node]) {
            self.events.borrow_mut().push(format!("tree {}", roots.len()));
        }

        fn on_error(&mut self, failure: &FailedBenchmark) {
            self.events.borrow_mut().push(format!("error {}", failure.benchmark_id));
        }
    }

    let mut registry = Registry::new(BenchmarkOptions::default());
    registry.add_files(["parsing.rs"]).unwrap();

    let recorder = Recorder::default();
    let events = Rc::clone(&recorder.events);
    let finished = RefCell::new(0);
    {
        let mut bus = ResultEventBus::new();
        bus.attach(recorder);
        bus.on_finished(|_| *finished.borrow_mut() += 1);

        bus.publish_hierarchy(registry.roots());
        bus.publish_error(&FailedBenchmark::new("parsing.rs:Parse:ints", "boom"));
        bus.publish_finished(&[]);
    }

    assert_eq!(
        *events.borrow(),
        vec!["tree 1".to_string(), "error parsing.rs:Parse:ints".to_string()]
    );
    assert_eq!(finished.into_inner(), 1);
}
