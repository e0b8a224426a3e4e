use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

pub mod defaults;

use defaults::*;

/// Scheduler engine configuration
///
/// Loaded from a TOML file at startup; a default file is written when none
/// exists so a fresh deployment starts with sane, visible settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Upper bound on concurrently executing jobs across all types
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,

    /// How long shutdown waits for in-flight jobs before giving up
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace: String,

    /// How often shutdown re-checks the running set while draining
    #[serde(default = "default_drain_poll_interval")]
    pub drain_poll_interval: String,
}

fn default_max_concurrent_jobs() -> usize {
    DEFAULT_MAX_CONCURRENT_JOBS
}

fn default_shutdown_grace() -> String {
    DEFAULT_SHUTDOWN_GRACE.to_string()
}

fn default_drain_poll_interval() -> String {
    DEFAULT_DRAIN_POLL_INTERVAL.to_string()
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: default_max_concurrent_jobs(),
            shutdown_grace: default_shutdown_grace(),
            drain_poll_interval: default_drain_poll_interval(),
        }
    }
}

impl SchedulerConfig {
    pub fn load() -> Result<Self> {
        let config_file =
            std::env::var("SCHEDULER_CONFIG_FILE").unwrap_or_else(|_| "scheduler.toml".to_string());
        Self::load_from_file(&config_file)
    }

    pub fn load_from_file(config_file: &str) -> Result<Self> {
        if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            Ok(toml::from_str(&contents)?)
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file);
            Ok(default_config)
        }
    }

    /// Shutdown grace period as a parsed duration
    pub fn shutdown_grace(&self) -> Duration {
        humantime::parse_duration(&self.shutdown_grace)
            .unwrap_or_else(|_| humantime::parse_duration(DEFAULT_SHUTDOWN_GRACE).unwrap())
    }

    /// Drain poll cadence as a parsed duration
    ///
    /// Clamped to a small minimum: a zero interval would panic the drain loop
    /// and anything below the floor is just a busy-wait.
    pub fn drain_poll_interval(&self) -> Duration {
        humantime::parse_duration(&self.drain_poll_interval)
            .unwrap_or_else(|_| humantime::parse_duration(DEFAULT_DRAIN_POLL_INTERVAL).unwrap())
            .max(MIN_DRAIN_POLL_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = SchedulerConfig::default();
        assert_eq!(config.max_concurrent_jobs, DEFAULT_MAX_CONCURRENT_JOBS);
        assert_eq!(config.shutdown_grace(), Duration::from_secs(30));
        assert_eq!(config.drain_poll_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: SchedulerConfig = toml::from_str("max_concurrent_jobs = 4").unwrap();
        assert_eq!(config.max_concurrent_jobs, 4);
        assert_eq!(config.shutdown_grace, DEFAULT_SHUTDOWN_GRACE);
    }

    #[test]
    fn test_zero_drain_poll_is_clamped() {
        let config = SchedulerConfig {
            drain_poll_interval: "0s".to_string(),
            ..Default::default()
        };
        assert_eq!(config.drain_poll_interval(), MIN_DRAIN_POLL_INTERVAL);
    }

    #[test]
    fn test_invalid_duration_falls_back() {
        let config = SchedulerConfig {
            shutdown_grace: "not-a-duration".to_string(),
            ..Default::default()
        };
        assert_eq!(config.shutdown_grace(), Duration::from_secs(30));
    }
}
