//! Configuration loading: defaults, YAML file, environment overrides.
//!
//! Layering follows defaults < `.noesis/config.yaml` < `NOESIS_`-prefixed
//! environment variables, with `__` separating nested keys (e.g.
//! `NOESIS_CYCLE__MAX_ITERATIONS=20`).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;

use crate::services::config::Config;

/// Default configuration file content written by `init`.
const DEFAULT_CONFIG_TEMPLATE: &str = r"# Noesis Configuration
# Override settings by editing this file or setting environment variables
# with NOESIS_ prefix, e.g.:
#   export NOESIS_CYCLE__MAX_ITERATIONS=20
#   export NOESIS_LOGGING__LEVEL=debug

cycle:
  # Hard iteration budget per cognitive cycle
  max_iterations: 10

  # Wall-clock budget per cycle, in seconds
  cycle_timeout_secs: 30

  # Confidence thresholds: accept above theta_success, consult the
  # generative kernel below theta_disc
  theta_success: 0.8
  theta_disc: 0.3

  # Pending sub-goal queue depth per cycle
  subgoal_queue_depth: 16

registry:
  # Moving-average rate for strategy prior updates
  learning_rate: 0.1

free_energy:
  weights:
    alpha: 0.4
    beta: 0.3
    gamma: 0.2
    delta: 0.1

monitor:
  # Free-energy level above which adaptation triggers fire
  upper_bound: 10.0

resolver:
  # Knowledge-acquisition sources (optional)
  # roadmap_path: docs/roadmap.md
  # context_path: docs/contexts
  sweep_interval_secs: 300

persistence: {}
  # Append-only JSON-lines event log (optional)
  # event_log_path: .noesis/events.jsonl

logging:
  level: info
  format: pretty
";

/// Loader for the layered configuration.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Default config file location, project-local.
    pub fn default_path() -> PathBuf {
        PathBuf::from(".noesis/config.yaml")
    }

    /// Load configuration, merging defaults, the YAML file (when present),
    /// and environment overrides.
    pub fn load() -> Result<Config> {
        Self::load_from(&Self::default_path())
    }

    /// Load with an explicit file path.
    pub fn load_from(path: &Path) -> Result<Config> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if path.exists() {
            figment = figment.merge(Yaml::file(path));
        }
        let config: Config = figment
            .merge(Env::prefixed("NOESIS_").split("__"))
            .extract()
            .context("failed to load configuration")?;
        config.validate().context("configuration validation failed")?;
        Ok(config)
    }

    /// Write the commented default configuration file, creating the parent
    /// directory. Refuses to overwrite unless `force` is set.
    pub fn init(path: &Path, force: bool) -> Result<bool> {
        if path.exists() && !force {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).context("failed to create config directory")?;
            }
        }
        std::fs::write(path, DEFAULT_CONFIG_TEMPLATE).context("failed to write config file")?;
        Ok(true)
    }
}
