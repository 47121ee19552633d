//! Fixture binary for the end-to-end tests: a handful of definition files
//! covering stable, flaky, failing, crashing and hanging benchmarks.

use isobench::prelude::*;
use std::hint::black_box;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

fn stable(d: &mut Declarations<'_>) {
    let quick = OptionOverrides::new()
        .min_time_ns(1_000_000)
        .max_time_ns(100_000_000)
        .max_samples(20)
        .max_tries(2);

    d.suite_with("Stable", quick, |d| {
        d.setup(|| {
            black_box(vec![0u8; 4096]);
        });
        d.bench("sum", || (0..black_box(512u64)).sum::<u64>());
        d.suite("Nested", |d| {
            d.bench("collect", || (0..black_box(64u32)).collect::<Vec<_>>());
        });
        d.teardown(|| {});
    });
}

fn failing(d: &mut Declarations<'_>) {
    d.suite("Failing", |d| {
        d.bench("panics", || -> u64 { panic!("selftest panic") });
        d.bench("aborts", || -> u64 { std::process::abort() });
    });
}

fn broken_setup(d: &mut Declarations<'_>) {
    d.suite("Hooks", |d| {
        d.setup(|| panic!("fixture unavailable"));
        d.bench("never measured", || 1u64);
    });
}

static FLAKY_SETUPS: AtomicU32 = AtomicU32::new(0);
static FLAKY_CALLS: AtomicU64 = AtomicU64::new(0);

fn spin(d: Duration) {
    let start = Instant::now();
    while start.elapsed() < d {
        std::hint::spin_loop();
    }
}

// Every call outlasts the floor, so a round is a single invocation.
fn flaky_options() -> OptionOverrides {
    OptionOverrides::new()
        .min_time_ns(100_000)
        .max_time_ns(1_000_000_000)
        .min_samples(5)
        .max_samples(10)
        .max_tries(3)
}

fn flaky(d: &mut Declarations<'_>) {
    d.suite_with("Flaky", flaky_options(), |d| {
        d.setup(|| {
            FLAKY_SETUPS.fetch_add(1, Ordering::SeqCst);
        });
        // First attempt alternates 200us and 1ms rounds; later ones hold 200us.
        d.bench("settles", || {
            let call = FLAKY_CALLS.fetch_add(1, Ordering::SeqCst);
            let noisy = FLAKY_SETUPS.load(Ordering::SeqCst) == 1 && call % 2 == 1;
            spin(Duration::from_micros(if noisy { 1_000 } else { 200 }));
        });
    });
}

fn slow(d: &mut Declarations<'_>) {
    d.bench("sleeps", || std::thread::sleep(std::time::Duration::from_secs(10)));
}

definition_file!("stable.rs", stable);
definition_file!("failing.rs", failing);
definition_file!("hooks.rs", broken_setup);
definition_file!("slow.rs", slow);
definition_file!("flaky.rs", flaky);

fn main() -> anyhow::Result<()> {
    isobench::run()
}
