#![warn(missing_docs)]
//! isobench CLI Library
//!
//! Command line harness for benchmark binaries. Call [`run()`] from `main`
//! after registering definition files; the same binary serves as its own
//! worker process.
//!
//! # Example
//!
//! ```ignore
//! use isobench::prelude::*;
//!
//! fn declare(d: &mut Declarations<'_>) {
//!     d.suite("Vec", |d| {
//!         d.bench("push", || (0..64).collect::<Vec<u32>>());
//!     });
//! }
//!
//! isobench::definition_file!("vec.rs", declare);
//!
//! fn main() -> anyhow::Result<()> {
//!     isobench::run()
//! }
//! ```

mod config;
mod orchestrator;
mod supervisor;

pub use config::*;
pub use orchestrator::{Orchestrator, RunSummary};
pub use supervisor::*;

use clap::Parser;
use isobench_core::{OptionOverrides, Registry, WorkerMain};
use isobench_ipc::{BenchmarkOptions, EXIT_FAILED};
use isobench_report::{ConsoleExporter, JsonExporter, OutputFormat, ResultEventBus, format_tree};
use regex::Regex;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// isobench CLI arguments
#[derive(Parser, Debug)]
#[command(name = "isobench")]
#[command(author, version, about = "isobench - isolated, statistically adaptive benchmarks")]
pub struct Cli {
    /// Definition files to load (default: every registered file)
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,

    /// Only run benchmarks whose id matches this regex
    #[arg(long)]
    pub filter: Option<String>,

    /// Output format: human, json
    #[arg(long)]
    pub format: Option<String>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of parallel isolated workers
    #[arg(long, short = 'j')]
    pub jobs: Option<usize>,

    /// Worker timeout in seconds (0 disables it)
    #[arg(long)]
    pub worker_timeout: Option<u64>,

    /// Floor on the duration of one calibrated round (e.g. "10ms")
    #[arg(long)]
    pub min_time: Option<String>,

    /// Ceiling on the accumulated sample time (e.g. "1s")
    #[arg(long)]
    pub max_time: Option<String>,

    /// Rounds always collected
    #[arg(long)]
    pub min_samples: Option<u64>,

    /// Rounds never exceeded
    #[arg(long)]
    pub max_samples: Option<u64>,

    /// Attempts before settling for an unstable result
    #[arg(long)]
    pub max_tries: Option<u32>,

    /// Drop raw per-invocation times from results
    #[arg(long)]
    pub elide_times: bool,

    /// List the suite tree without running anything
    #[arg(long)]
    pub list: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Internal: Run as worker process (used by supervisor)
    #[arg(long, hide = true)]
    pub isobench_worker: bool,

    /// Internal: Absorb cargo bench's --bench flag
    #[arg(long, hide = true)]
    pub bench: bool,
}

impl Cli {
    /// Measurement options given on the command line
    pub fn overrides(&self) -> anyhow::Result<OptionOverrides> {
        Ok(OptionOverrides {
            min_time_ns: self
                .min_time
                .as_deref()
                .map(IsobenchConfig::parse_duration)
                .transpose()?,
            max_time_ns: self
                .max_time
                .as_deref()
                .map(IsobenchConfig::parse_duration)
                .transpose()?,
            min_samples: self.min_samples,
            max_samples: self.max_samples,
            max_tries: self.max_tries,
        })
    }
}

/// Everything a run needs, after layering defaults, config file and flags
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Registry defaults
    pub defaults: BenchmarkOptions,
    /// Files to load; empty means every registered file
    pub files: Vec<String>,
    /// Benchmark id filter
    pub filter: Option<Regex>,
    /// Report format
    pub format: OutputFormat,
    /// Report destination, stdout when `None`
    pub output: Option<PathBuf>,
    /// Concurrent workers
    pub jobs: usize,
    /// Per-worker time limit
    pub timeout: Option<Duration>,
    /// Keep raw times in results
    pub keep_times: bool,
    /// Only print the tree
    pub list: bool,
}

impl RunSettings {
    /// Layer built-in defaults, `config` and `cli`
    pub fn resolve(cli: &Cli, config: &IsobenchConfig) -> anyhow::Result<Self> {
        let defaults = cli.overrides()?.apply(&config.benchmark_options()?);
        defaults
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid benchmark options: {}", e))?;

        let filter = cli
            .filter
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| anyhow::anyhow!("invalid --filter: {}", e))?;

        let format: OutputFormat = cli
            .format
            .as_deref()
            .unwrap_or(config.output.format.as_str())
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))?;

        let timeout = match cli.worker_timeout {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => config.timeout_ns()?.map(Duration::from_nanos),
        };

        Ok(Self {
            defaults,
            files: cli.files.clone(),
            filter,
            format,
            output: cli
                .output
                .clone()
                .or_else(|| config.output.path.as_ref().map(PathBuf::from)),
            jobs: cli.jobs.or(config.runner.jobs).unwrap_or(1).max(1),
            timeout,
            keep_times: config.output.keep_times && !cli.elide_times,
            list: cli.list,
        })
    }
}

/// Run the isobench CLI with the process arguments.
/// This is the main entry point for benchmark binaries.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the isobench CLI with pre-parsed arguments.
///
/// Exits the process with status 1 when any benchmark failed.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    // Handle worker mode first (before any other initialization)
    if cli.isobench_worker {
        init_logging(false);
        std::process::exit(run_worker_mode());
    }

    init_logging(cli.verbose);

    let config = IsobenchConfig::discover()?.unwrap_or_default();
    let settings = RunSettings::resolve(&cli, &config)?;
    let code = run_harness(&settings)?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "isobench=debug" } else { "isobench=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // Output goes to stdout; keep diagnostics on stderr.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run as a worker process (IPC mode) and return the exit code
fn run_worker_mode() -> i32 {
    let registry = Registry::new(BenchmarkOptions::default());
    match WorkerMain::new().run(registry) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "worker error");
            EXIT_FAILED
        }
    }
}

fn load_registry(settings: &RunSettings) -> anyhow::Result<Registry> {
    let mut registry = Registry::new(settings.defaults);
    let files = if settings.files.is_empty() {
        registry.available_files()
    } else {
        settings.files.clone()
    };
    registry.add_files(&files)?;
    Ok(registry)
}

fn open_output(settings: &RunSettings) -> anyhow::Result<Box<dyn Write>> {
    Ok(match &settings.output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            Box::new(std::fs::File::create(path)?)
        }
        None => Box::new(std::io::stdout()),
    })
}

/// Load the registry, run or list, and return the process exit code
pub fn run_harness(settings: &RunSettings) -> anyhow::Result<i32> {
    let mut registry = load_registry(settings)?;

    let supervisor =
        Supervisor::new(WorkerCommand::current_exe()?, settings.timeout, settings.jobs);
    let orchestrator = Orchestrator::new(supervisor)
        .with_filter(settings.filter.clone())
        .with_keep_times(settings.keep_times);

    if settings.list {
        let mut out = open_output(settings)?;
        write!(out, "{}", format_tree(registry.roots()))?;
        writeln!(out, "{} benchmarks selected.", orchestrator.plan(&registry).len())?;
        return Ok(0);
    }

    let out = open_output(settings)?;
    let mut bus = ResultEventBus::new();
    match settings.format {
        OutputFormat::Human => bus.attach(ConsoleExporter::new(out)),
        OutputFormat::Json => bus.attach(JsonExporter::new(out)),
    }

    let summary = orchestrator.run(&mut registry, &mut bus)?;
    Ok(if summary.has_failures() { 1 } else { 0 })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("isobench").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_parse_files_and_flags() {
        let cli = parse(&["a.rs", "b.rs", "--filter", "Vec", "--jobs", "4", "--elide-times"]);
        assert_eq!(cli.files, vec!["a.rs", "b.rs"]);
        assert_eq!(cli.filter.as_deref(), Some("Vec"));
        assert_eq!(cli.jobs, Some(4));
        assert!(cli.elide_times);
        assert!(!cli.isobench_worker);
    }

    #[test]
    fn test_worker_flag_matches_protocol() {
        let cli = parse(&[isobench_ipc::WORKER_FLAG]);
        assert!(cli.isobench_worker);
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = IsobenchConfig::default();
        config.defaults.min_samples = Some(8);
        config.defaults.max_tries = Some(4);
        config.runner.jobs = Some(2);
        config.output.format = "json".to_string();

        let cli = parse(&["--max-tries", "6", "--min-time", "2ms", "--format", "human"]);
        let settings = RunSettings::resolve(&cli, &config).unwrap();

        assert_eq!(settings.defaults.min_samples, 8);
        assert_eq!(settings.defaults.max_tries, 6);
        assert_eq!(settings.defaults.min_time_ns, 2_000_000);
        assert_eq!(settings.jobs, 2);
        assert_eq!(settings.format, OutputFormat::Human);
        assert_eq!(settings.timeout, Some(Duration::from_secs(60)));
        assert!(settings.keep_times);
    }

    #[test]
    fn test_config_format_and_timeout() {
        let mut config = IsobenchConfig::default();
        config.output.format = "json".to_string();
        config.runner.timeout = "0s".to_string();

        let settings = RunSettings::resolve(&parse(&[]), &config).unwrap();
        assert_eq!(settings.format, OutputFormat::Json);
        assert_eq!(settings.timeout, None);
        assert_eq!(settings.jobs, 1);

        let cli = parse(&["--worker-timeout", "0"]);
        let settings = RunSettings::resolve(&cli, &IsobenchConfig::default()).unwrap();
        assert_eq!(settings.timeout, None);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let config = IsobenchConfig::default();
        assert!(RunSettings::resolve(&parse(&["--filter", "("]), &config).is_err());
        assert!(RunSettings::resolve(&parse(&["--format", "xml"]), &config).is_err());
        assert!(RunSettings::resolve(&parse(&["--min-samples", "0"]), &config).is_err());
        assert!(RunSettings::resolve(&parse(&["--min-time", "soon"]), &config).is_err());
    }

    #[test]
    fn test_zero_min_time_accepted() {
        let cli = parse(&["--min-time", "0ms"]);
        let settings = RunSettings::resolve(&cli, &IsobenchConfig::default()).unwrap();
        assert_eq!(settings.defaults.min_time_ns, 0);
    }
}
