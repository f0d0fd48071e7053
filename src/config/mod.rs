//! Worker configuration from the environment.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingVar(&'static str),

    #[error("environment variable {name} has invalid value {value:?}: {message}")]
    InvalidVar {
        name: &'static str,
        value: String,
        message: String,
    },
}

/// Everything the worker binary needs from its environment.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Queue endpoint (SQLite URL).
    pub queue_url: String,
    /// Audit-record database (SQLite URL).
    pub database_url: String,
    /// Directory screenshots are written to.
    pub screenshots_dir: PathBuf,
    /// Concurrent jobs per poll cycle.
    pub concurrency: usize,
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source; lets tests avoid
    /// mutating process-wide environment state.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let queue_url = required(&lookup, "QUEUE_URL")?;
        let database_url = required(&lookup, "DATABASE_URL")?;

        let screenshots_dir = lookup("SCREENSHOTS_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("screenshots"));

        let concurrency = match lookup("AUDIT_CONCURRENCY") {
            Some(raw) if !raw.trim().is_empty() => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ConfigError::InvalidVar {
                    name: "AUDIT_CONCURRENCY",
                    value: raw,
                    message: "expected a positive integer".into(),
                })?,
            _ => 2,
        };

        Ok(Self {
            queue_url,
            database_url,
            screenshots_dir,
            concurrency,
        })
    }
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    lookup(name)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::MissingVar(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<WorkerConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        WorkerConfig::from_vars(|name| map.get(name).cloned())
    }

    #[test]
    fn minimal_environment_uses_defaults() {
        let config = config_from(&[
            ("QUEUE_URL", "sqlite://queue.db"),
            ("DATABASE_URL", "sqlite://audits.db"),
        ])
        .unwrap();

        assert_eq!(config.screenshots_dir, PathBuf::from("screenshots"));
        assert_eq!(config.concurrency, 2);
    }

    #[test]
    fn missing_queue_url_is_an_error() {
        let err = config_from(&[("DATABASE_URL", "sqlite://audits.db")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("QUEUE_URL")));
    }

    #[test]
    fn blank_required_value_counts_as_missing() {
        let err = config_from(&[
            ("QUEUE_URL", "   "),
            ("DATABASE_URL", "sqlite://audits.db"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("QUEUE_URL")));
    }

    #[test]
    fn concurrency_must_be_a_positive_integer() {
        let base = [
            ("QUEUE_URL", "sqlite://queue.db"),
            ("DATABASE_URL", "sqlite://audits.db"),
        ];

        let mut with_zero = base.to_vec();
        with_zero.push(("AUDIT_CONCURRENCY", "0"));
        assert!(matches!(
            config_from(&with_zero).unwrap_err(),
            ConfigError::InvalidVar {
                name: "AUDIT_CONCURRENCY",
                ..
            }
        ));

        let mut with_valid = base.to_vec();
        with_valid.push(("AUDIT_CONCURRENCY", "4"));
        assert_eq!(config_from(&with_valid).unwrap().concurrency, 4);
    }
}
