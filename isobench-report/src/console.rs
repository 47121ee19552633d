//! Console Output
//!
//! Human-readable, streaming terminal output. Results are printed as they
//! arrive; a summary follows once the run finishes.

use crate::events::{Exporter, FailedBenchmark};
use isobench_core::Node;
use isobench_ipc::BenchResult;
use std::io::Write;

/// Format nanoseconds with an adaptive unit
pub fn format_duration(ns: f64) -> String {
    if ns < 1_000.0 {
        format!("{:.2} ns", ns)
    } else if ns < 1_000_000.0 {
        format!("{:.2} µs", ns / 1_000.0)
    } else if ns < 1_000_000_000.0 {
        format!("{:.2} ms", ns / 1_000_000.0)
    } else {
        format!("{:.2} s", ns / 1_000_000_000.0)
    }
}

/// Render the suite tree, one node per line, indented by depth
pub fn format_tree(roots: &[Node]) -> String {
    fn walk(node: &Node, depth: usize, output: &mut String) {
        let indent = "  ".repeat(depth);
        match node {
            Node::Suite(suite) => {
                output.push_str(&format!("{indent}{}/\n", suite.name));
                for child in &suite.children {
                    walk(child, depth + 1, output);
                }
            }
            Node::Benchmark(bench) => {
                output.push_str(&format!("{indent}{}  [{}]\n", bench.name, bench.id));
            }
        }
    }

    let mut output = String::new();
    for root in roots {
        walk(root, 0, &mut output);
    }
    output
}

/// One line describing a completed benchmark
pub fn format_result_line(result: &BenchResult) -> String {
    let status_icon = if result.degraded { "~" } else { "✓" };
    let mut line = format!(
        "  {} {}\n      mean: {}  ± {:.2}%  median: {}  min: {}  max: {}\n      samples: {}  invocations/round: {}  attempts: {}",
        status_icon,
        result.id,
        format_duration(result.stats.mean),
        result.stats.relative_margin(),
        format_duration(result.stats.median),
        format_duration(result.stats.min),
        format_duration(result.stats.max),
        result.stats.sample_count,
        result.count,
        result.attempts,
    );
    if result.degraded {
        line.push_str("  (unstable: acceptance check never passed)");
    }
    line.push('\n');
    line
}

/// Streams human-readable output to a writer
pub struct ConsoleExporter<W: Write> {
    out: W,
    failed: usize,
}

impl<W: Write> ConsoleExporter<W> {
    /// Write to `out`
    pub fn new(out: W) -> Self {
        Self { out, failed: 0 }
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            tracing::warn!(error = %e, "failed to write console output");
        }
    }
}

impl<W: Write> Exporter for ConsoleExporter<W> {
    fn on_hierarchy(&mut self, roots: &[Node]) {
        let mut text = String::new();
        text.push('\n');
        text.push_str("isobench\n");
        text.push_str(&"=".repeat(60));
        text.push('\n');
        text.push_str(&format_tree(roots));
        text.push_str(&"-".repeat(60));
        text.push('\n');
        self.emit(&text);
    }

    fn on_result(&mut self, result: &BenchResult) {
        let line = format_result_line(result);
        self.emit(&line);
    }

    fn on_error(&mut self, failure: &FailedBenchmark) {
        self.failed += 1;
        let line = format!("  ✗ {}\n      error: {}\n", failure.benchmark_id, failure.message);
        self.emit(&line);
    }

    fn on_finished(&mut self, results: &[BenchResult]) {
        let degraded = results.iter().filter(|r| r.degraded).count();
        let text = format!(
            "\n{}\nSummary: {} completed ({} unstable), {} failed\n",
            "=".repeat(60),
            results.len(),
            degraded,
            self.failed
        );
        self.emit(&text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isobench_ipc::BenchmarkOptions;
    use isobench_stats::{ConfidenceLevel, FullAnalysis};

    fn result(degraded: bool) -> BenchResult {
        BenchResult {
            id: "c.rs:S:fast".to_string(),
            name: "fast".to_string(),
            filename: "c.rs".to_string(),
            stats: FullAnalysis::compute(&[1_500.0, 1_500.0], ConfidenceLevel::P99_9).unwrap(),
            times: vec![1_500.0, 1_500.0],
            count: 64,
            options: BenchmarkOptions::default(),
            attempts: if degraded { 3 } else { 1 },
            degraded,
        }
    }

    #[test]
    fn test_format_duration_units() {
        assert_eq!(format_duration(12.345), "12.35 ns");
        assert_eq!(format_duration(1_500.0), "1.50 µs");
        assert_eq!(format_duration(2_500_000.0), "2.50 ms");
        assert_eq!(format_duration(3_000_000_000.0), "3.00 s");
    }

    #[test]
    fn test_result_line() {
        let line = format_result_line(&result(false));
        assert!(line.starts_with("  ✓ c.rs:S:fast"));
        assert!(line.contains("mean: 1.50 µs"));
        assert!(line.contains("invocations/round: 64"));
        assert!(!line.contains("unstable"));

        let line = format_result_line(&result(true));
        assert!(line.starts_with("  ~ c.rs:S:fast"));
        assert!(line.contains("attempts: 3"));
        assert!(line.contains("unstable"));
    }

    #[test]
    fn test_console_exporter_stream() {
        let mut out = Vec::new();
        {
            let mut console = ConsoleExporter::new(&mut out);
            console.on_result(&result(false));
            console.on_error(&FailedBenchmark::new("c.rs:S:boom", "benchmark panicked: boom"));
            console.on_finished(&[result(false)]);
        }
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("✓ c.rs:S:fast"));
        assert!(text.contains("✗ c.rs:S:boom"));
        assert!(text.contains("error: benchmark panicked: boom"));
        assert!(text.contains("Summary: 1 completed (0 unstable), 1 failed"));
    }
}
