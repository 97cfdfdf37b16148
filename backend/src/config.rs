//! Application configuration.
//!
//! Defaults live here as constants. [`Settings::from_env`] lets the
//! environment (or a `.env` file loaded by the CLI) override the ones that
//! vary per deployment; CLI flags override both.

use std::path::PathBuf;

use crate::api::logs::log_warning;

/// HTTP port for `periodshift serve`.
pub const DEFAULT_PORT: u16 = 3000;

/// Directory where saved conversion plans are stored (relative to current dir).
pub const DEFAULT_REGISTRY_DIR: &str = ".periodshift/plans";

/// Maximum CSV upload size accepted by the HTTP API (in bytes).
///
/// 50 MB limit.
pub const MAX_UPLOAD_SIZE: usize = 50 * 1024 * 1024;

/// Log entries buffered per SSE subscriber before older ones are dropped.
pub const LOG_CHANNEL_CAPACITY: usize = 100;

/// Delimiter used when writing CSV output.
pub const DEFAULT_OUTPUT_DELIMITER: char = ',';

/// Environment variable overriding [`DEFAULT_PORT`].
pub const ENV_PORT: &str = "PERIODSHIFT_PORT";

/// Environment variable overriding [`DEFAULT_REGISTRY_DIR`].
pub const ENV_REGISTRY_DIR: &str = "PERIODSHIFT_REGISTRY_DIR";

/// Runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub port: u16,
    pub registry_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            registry_dir: PathBuf::from(DEFAULT_REGISTRY_DIR),
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary lookup (used by tests).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(raw) = lookup(ENV_PORT) {
            match raw.trim().parse::<u16>() {
                Ok(port) => settings.port = port,
                Err(_) => log_warning(format!(
                    "Ignoring {}='{}': not a port number, using {}",
                    ENV_PORT, raw, DEFAULT_PORT
                )),
            }
        }

        if let Some(dir) = lookup(ENV_REGISTRY_DIR).filter(|d| !d.trim().is_empty()) {
            settings.registry_dir = PathBuf::from(dir);
        }

        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_environment() {
        let settings = Settings::from_lookup(|_| None);
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.port, 3000);
    }

    #[test]
    fn test_environment_overrides() {
        let settings = Settings::from_lookup(|key| match key {
            ENV_PORT => Some("8081".into()),
            ENV_REGISTRY_DIR => Some("/tmp/plans".into()),
            _ => None,
        });
        assert_eq!(settings.port, 8081);
        assert_eq!(settings.registry_dir, PathBuf::from("/tmp/plans"));
    }

    #[test]
    fn test_invalid_port_falls_back() {
        let settings = Settings::from_lookup(|key| (key == ENV_PORT).then(|| "http".to_string()));
        assert_eq!(settings.port, DEFAULT_PORT);
    }
}
