//! Demo Configuration
//!
//! Configuration comes from three layers, later ones winning:
//!
//! 1. built-in defaults,
//! 2. an optional JSON file,
//! 3. `TRELLIS_*` environment variables.
//!
//! The result is validated once all layers are applied.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::fetch::DEFAULT_ENDPOINT;
use crate::platform::WindowSize;
use crate::reactive::DEFAULT_MAX_RENDER_PASSES;

/// Overrides `endpoint`.
pub const ENV_ENDPOINT: &str = "TRELLIS_ENDPOINT";
/// Overrides `tick_interval_ms`.
pub const ENV_TICK_MS: &str = "TRELLIS_TICK_MS";
/// Overrides `alert_every`.
pub const ENV_ALERT_EVERY: &str = "TRELLIS_ALERT_EVERY";

/// Settings of the demo page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoConfig {
    /// URL of the user record.
    pub endpoint: String,

    /// Period of the timer demo.
    pub tick_interval_ms: u64,

    /// The counter notifies at every positive multiple of this value.
    pub alert_every: i64,

    /// Bound on consecutive render passes.
    pub max_render_passes: usize,

    pub request_timeout_ms: u64,

    /// Viewport reported by platforms without a real window.
    pub initial_viewport: WindowSize,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            tick_interval_ms: 1000,
            alert_every: 10,
            max_render_passes: DEFAULT_MAX_RENDER_PASSES,
            request_timeout_ms: 10_000,
            initial_viewport: WindowSize::new(1280, 720),
        }
    }
}

impl DemoConfig {
    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Apply all layers: defaults, the optional file, then the process
    /// environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                debug!(path = %path.display(), "loading configuration file");
                Self::from_path(path)?
            }
            None => Self::default(),
        };
        let config = config.with_overrides(std::env::vars())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `TRELLIS_*` overrides from the given variables. Unrelated
    /// variables are ignored.
    pub fn with_overrides<I, K, V>(mut self, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in vars {
            match key.as_ref() {
                ENV_ENDPOINT => self.endpoint = value.into(),
                ENV_TICK_MS => self.tick_interval_ms = parse_env(ENV_TICK_MS, value.into())?,
                ENV_ALERT_EVERY => self.alert_every = parse_env(ENV_ALERT_EVERY, value.into())?,
                _ => {}
            }
        }
        Ok(self)
    }

    /// Reject values the demo cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "endpoint must be an http(s) URL, got {:?}",
                self.endpoint
            )));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("tick_interval_ms must be positive".into()));
        }
        if self.alert_every <= 0 {
            return Err(ConfigError::Invalid("alert_every must be positive".into()));
        }
        if self.max_render_passes == 0 {
            return Err(ConfigError::Invalid("max_render_passes must be positive".into()));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { var, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = DemoConfig::default();
        config.validate().unwrap();
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.alert_every, 10);
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config = DemoConfig::from_json_str(
            r#"{ "tick_interval_ms": 250, "initial_viewport": { "width": 800, "height": 600 } }"#,
        )
        .unwrap();

        assert_eq!(config.tick_interval_ms, 250);
        assert_eq!(config.initial_viewport, WindowSize::new(800, 600));
        assert_eq!(config.alert_every, 10);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = DemoConfig::from_json_str(r#"{ "tick": 1 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn environment_overrides_file_values() {
        let config = DemoConfig::default()
            .with_overrides([
                (ENV_ENDPOINT, "http://localhost:8080/users/1"),
                (ENV_TICK_MS, " 500 "),
                (ENV_ALERT_EVERY, "5"),
                ("PATH", "/usr/bin"),
            ])
            .unwrap();

        assert_eq!(config.endpoint, "http://localhost:8080/users/1");
        assert_eq!(config.tick_interval_ms, 500);
        assert_eq!(config.alert_every, 5);
    }

    #[test]
    fn malformed_override_names_the_variable() {
        let err = DemoConfig::default()
            .with_overrides([(ENV_TICK_MS, "soon")])
            .unwrap_err();

        assert!(matches!(err, ConfigError::Env { var: ENV_TICK_MS, .. }));
    }

    #[test]
    fn invalid_values_fail_validation() {
        let mut config = DemoConfig::default();
        config.alert_every = 0;
        assert!(config.validate().is_err());

        let mut config = DemoConfig::default();
        config.endpoint = "ftp://example.com".into();
        assert!(config.validate().is_err());

        let mut config = DemoConfig::default();
        config.tick_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = DemoConfig::from_path(Path::new("/nonexistent/trellis.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
