//! External configuration surface (spec §6), loaded the way the teacher's
//! `load_config()` loaded `riker.toml`/`app.toml`: a `config::Config`
//! merged from a system file and an environment override, with defaults
//! set up front so a missing file is never an error.

use std::env;
use std::path::PathBuf;

use ::config::{Config, File};
use serde::Deserialize;

/// One of the six scheduling algorithms named in spec §4.7.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SchedulerStrategy {
    Random,
    Dfs,
    Pct { k: u32 },
    FairPct { k: u32 },
    Probabilistic { p: f64 },
    Priority,
    Replay { path: PathBuf },
}

impl Default for SchedulerStrategy {
    fn default() -> Self {
        SchedulerStrategy::Random
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Off,
    Error,
    Warn,
    Info,
    Debug,
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Warn
    }
}

/// The full configuration surface enumerated in spec §6.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub testing_iterations: u64,
    pub max_unfair_scheduling_steps: u64,
    pub max_fair_scheduling_steps: u64,
    pub strategy: SchedulerStrategy,
    pub random_seed: Option<u64>,
    pub liveness_temperature_threshold: u64,
    pub timeout_delay: u64,
    pub verbosity: Verbosity,
    pub telemetry: bool,
    pub schedule_trace_path: Option<PathBuf>,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            testing_iterations: 1,
            max_unfair_scheduling_steps: 10_000,
            max_fair_scheduling_steps: 100_000,
            strategy: SchedulerStrategy::default(),
            random_seed: None,
            liveness_temperature_threshold: 1_000,
            timeout_delay: 100,
            verbosity: Verbosity::default(),
            telemetry: false,
            schedule_trace_path: None,
        }
    }
}

/// Exit codes for a host CLI (spec §6: illustrative, the binary itself is
/// out of scope).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    NoBug = 0,
    BugFound = 1,
    HarnessError = 2,
    ReplayDivergence = 3,
}

/// Loads a [`::config::Config`] merged from `config/vigil.toml` (or the
/// `VIGIL_CONF` override) plus a user application file (`config/app`, or
/// `APP_CONF`), defaults set for every key so a missing file is not an
/// error.
pub fn load_config() -> Config {
    let mut cfg = Config::new();

    cfg.set_default("testing_iterations", 1).unwrap();
    cfg.set_default("max_unfair_scheduling_steps", 10_000).unwrap();
    cfg.set_default("max_fair_scheduling_steps", 100_000).unwrap();
    cfg.set_default("liveness_temperature_threshold", 1_000).unwrap();
    cfg.set_default("timeout_delay", 100).unwrap();
    cfg.set_default("telemetry", false).unwrap();

    let path = env::var("VIGIL_CONF").unwrap_or_else(|_| "config/vigil.toml".into());
    cfg.merge(File::with_name(&path).required(false)).unwrap();

    let path = env::var("APP_CONF").unwrap_or_else(|_| "config/app".into());
    cfg.merge(File::with_name(&path).required(false)).unwrap();

    cfg
}
