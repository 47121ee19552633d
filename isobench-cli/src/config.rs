//! Configuration loading from isobench.toml
//!
//! isobench configuration can be specified in an `isobench.toml` file in the project root.
//! The configuration is automatically discovered by walking up from the current directory.
//! Values layer as: built-in defaults, then this file, then command line flags.

use isobench_core::OptionOverrides;
use isobench_ipc::BenchmarkOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file
pub const CONFIG_FILE_NAME: &str = "isobench.toml";

/// isobench configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IsobenchConfig {
    /// Runner configuration
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Measurement defaults for every root suite and benchmark
    #[serde(default)]
    pub defaults: DefaultsConfig,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// Runner configuration for benchmark execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Timeout for a single worker (e.g., "60s", "5m"); "0s" disables it
    #[serde(default = "default_timeout")]
    pub timeout: String,
    /// Number of parallel isolated workers (default: 1)
    #[serde(default)]
    pub jobs: Option<usize>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            jobs: None,
        }
    }
}

fn default_timeout() -> String {
    "60s".to_string()
}

/// Measurement defaults. Unset values keep the built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Floor on one calibrated round (e.g., "10ms")
    #[serde(default)]
    pub min_time: Option<String>,
    /// Ceiling on accumulated sample time (e.g., "1s")
    #[serde(default)]
    pub max_time: Option<String>,
    /// Rounds always collected
    #[serde(default)]
    pub min_samples: Option<u64>,
    /// Rounds never exceeded
    #[serde(default)]
    pub max_samples: Option<u64>,
    /// Attempts before settling for an unstable result
    #[serde(default)]
    pub max_tries: Option<u32>,
}

impl DefaultsConfig {
    /// Convert to option overrides, parsing the duration strings
    pub fn to_overrides(&self) -> anyhow::Result<OptionOverrides> {
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

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output format: "human" or "json"
    #[serde(default = "default_format")]
    pub format: String,
    /// Write the report to this file instead of stdout
    #[serde(default)]
    pub path: Option<String>,
    /// Keep raw per-invocation times in results
    #[serde(default = "default_keep_times")]
    pub keep_times: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            path: None,
            keep_times: default_keep_times(),
        }
    }
}

fn default_format() -> String {
    "human".to_string()
}

fn default_keep_times() -> bool {
    true
}

impl IsobenchConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Find `isobench.toml` in `start` or any of its ancestors
    pub fn find_from(start: impl Into<PathBuf>) -> Option<PathBuf> {
        let mut dir = start.into();
        loop {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.is_file() {
                return Some(config_path);
            }
            if !dir.pop() {
                return None;
            }
        }
    }

    /// Try to discover and load configuration by walking up from current directory
    pub fn discover() -> anyhow::Result<Option<Self>> {
        let Ok(cwd) = std::env::current_dir() else {
            return Ok(None);
        };
        match Self::find_from(cwd) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading configuration");
                Self::load(&path).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Built-in defaults with `[defaults]` applied
    pub fn benchmark_options(&self) -> anyhow::Result<BenchmarkOptions> {
        Ok(self.defaults.to_overrides()?.apply(&BenchmarkOptions::default()))
    }

    /// Worker timeout in nanoseconds, `None` when disabled
    pub fn timeout_ns(&self) -> anyhow::Result<Option<u64>> {
        let ns = Self::parse_duration(&self.runner.timeout)?;
        Ok((ns > 0).then_some(ns))
    }

    /// Parse duration string (e.g., "3s", "500ms", "2m") to nanoseconds
    pub fn parse_duration(s: &str) -> anyhow::Result<u64> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow::anyhow!("Empty duration string"));
        }

        // Find where the number ends and unit begins
        let (num_part, unit_part) = s
            .char_indices()
            .find(|(_, c)| c.is_alphabetic())
            .map(|(i, _)| s.split_at(i))
            .unwrap_or((s, "s"));

        let value: f64 = num_part
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid duration number: {}", num_part))?;
        if !value.is_finite() || value < 0.0 {
            return Err(anyhow::anyhow!("Invalid duration: {}", s));
        }

        let multiplier: u64 = match unit_part.to_lowercase().as_str() {
            "ns" => 1,
            "us" | "µs" => 1_000,
            "ms" => 1_000_000,
            "s" | "" => 1_000_000_000,
            "m" | "min" => 60_000_000_000,
            _ => return Err(anyhow::anyhow!("Unknown duration unit: {}", unit_part)),
        };

        Ok((value * multiplier as f64) as u64)
    }
}
