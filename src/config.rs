//! TOML configuration for a simulation run.
//!
//! ```toml
//! [run]
//! stop_at_secs = 20.0
//!
//! [trace]
//! enabled = true
//! checkpoint_interval = 100
//!
//! [log]
//! filter = "kairos=debug"
//! ```
//!
//! Every section and key is optional.

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::time::{SimDuration, SimTime};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimConfig {
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub trace: TraceConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Inclusive stop bound in simulated seconds.
    #[serde(default)]
    pub stop_at_secs: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TraceConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Record a checkpoint every this many events.
    #[serde(default)]
    pub checkpoint_interval: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

fn default_filter() -> String {
    "info".to_string()
}

impl RunConfig {
    /// The stop bound as a simulated instant. `None` when unset or when the
    /// value does not fit the clock.
    pub fn stop_at(&self) -> Option<SimTime> {
        self.stop_at_secs
            .and_then(SimDuration::try_from_secs_f64)
            .and_then(|delay| SimTime::ZERO.checked_add(delay))
    }
}

impl SimConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate the file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| {
            tracing::error!("failed to read config file '{}': {}", path.display(), source);
            ConfigError::Io {
                path: path.display().to_string(),
                source,
            }
        })?;
        let config = Self::from_toml_str(&contents)?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Reject values the kernel cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(secs) = self.run.stop_at_secs {
            if !secs.is_finite() || secs < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "run.stop_at_secs must be a non-negative number, got {secs}"
                )));
            }
            if self.run.stop_at().is_none() {
                return Err(ConfigError::Invalid(format!(
                    "run.stop_at_secs {secs} is beyond the clock range"
                )));
            }
        }
        if self.trace.checkpoint_interval == Some(0) {
            return Err(ConfigError::Invalid(
                "trace.checkpoint_interval must be > 0".to_string(),
            ));
        }
        if self.log.filter.trim().is_empty() {
            return Err(ConfigError::Invalid("log.filter must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = SimConfig::from_toml_str("").unwrap();
        assert_eq!(config, SimConfig::default());
        assert_eq!(config.log.filter, "info");
        assert_eq!(config.run.stop_at(), None);
        assert!(!config.trace.enabled);
    }

    #[test]
    fn test_full_config() {
        let config = SimConfig::from_toml_str(
            r#"
            [run]
            stop_at_secs = 1.5

            [trace]
            enabled = true
            checkpoint_interval = 10

            [log]
            filter = "kairos=trace"
            "#,
        )
        .unwrap();
        assert_eq!(config.run.stop_at(), Some(SimTime::from_millis(1_500)));
        assert!(config.trace.enabled);
        assert_eq!(config.trace.checkpoint_interval, Some(10));
        assert_eq!(config.log.filter, "kairos=trace");
    }

    #[test]
    fn test_rejects_negative_stop() {
        let err = SimConfig::from_toml_str("[run]\nstop_at_secs = -1.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_stop_beyond_clock_range() {
        let err = SimConfig::from_toml_str("[run]\nstop_at_secs = 1e30\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.contains("beyond the clock range")));
    }

    #[test]
    fn test_rejects_zero_checkpoint_interval() {
        let err = SimConfig::from_toml_str("[trace]\ncheckpoint_interval = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_unknown_key() {
        let err = SimConfig::from_toml_str("[run]\nstop_at = 5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[run]\nstop_at_secs = 5").unwrap();
        let config = SimConfig::load(file.path()).unwrap();
        assert_eq!(config.run.stop_at(), Some(SimTime::from_secs(5)));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SimConfig::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
