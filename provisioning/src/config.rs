use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_FILE: &str = "orbit-admin.toml";
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub auto_refresh: bool,
    pub interval_ms: u64,
}

/// Settings for the activation dialog, including the cosmetic progress ramp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivationDefaults {
    pub ramp_interval_ms: u64,
    pub ramp_start: u8,
    pub ramp_step: u8,
    pub ramp_ceiling: u8,
    pub default_category: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub polling: PollingConfig,
    pub activation: ActivationDefaults,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        PollingConfig {
            auto_refresh: true,
            interval_ms: 3000,
        }
    }
}

impl Default for ActivationDefaults {
    fn default() -> Self {
        ActivationDefaults {
            ramp_interval_ms: 1500,
            ramp_start: 10,
            ramp_step: 10,
            ramp_ceiling: 90,
            default_category: "E-COMMERCE".to_string(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl ActivationDefaults {
    pub fn ramp_interval(&self) -> Duration {
        Duration::from_millis(self.ramp_interval_ms)
    }
}

impl ClientConfig {
    /// Load configuration from file with environment variable overrides.
    ///
    /// The file is `ORBIT_ADMIN_CONFIG` if set, else `orbit-admin.toml` in the working
    /// directory. A missing file is not an error; a malformed one is.
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var("ORBIT_ADMIN_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

        let mut config = if path.exists() {
            Self::load_from_file(&path)?
        } else {
            warn!(path = %path.display(), "config file not found, using defaults");
            ClientConfig::default()
        };

        config.apply_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let mut config: ClientConfig =
            toml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        config.normalize();
        debug!(path = %path.display(), "loaded client config");
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in `load`).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("NEXT_PUBLIC_API_URL") {
            if !url.trim().is_empty() {
                self.api.base_url = url;
            }
        }

        if let Some(interval) = lookup("ORBIT_ADMIN_POLL_INTERVAL_MS") {
            match interval.parse::<u64>() {
                Ok(ms) if ms > 0 => self.polling.interval_ms = ms,
                _ => warn!(value = %interval, "ignoring invalid ORBIT_ADMIN_POLL_INTERVAL_MS"),
            }
        }

        if let Some(flag) = lookup("ORBIT_ADMIN_AUTO_REFRESH") {
            self.polling.auto_refresh = flag.to_lowercase() == "true" || flag == "1";
        }

        self.normalize();
    }

    fn normalize(&mut self) {
        let trimmed = self.api.base_url.trim().trim_end_matches('/');
        self.api.base_url = trimmed.to_string();
        if self.polling.interval_ms == 0 {
            self.polling.interval_ms = PollingConfig::default().interval_ms;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:5000");
        assert!(config.polling.auto_refresh);
        assert_eq!(config.polling.interval(), Duration::from_millis(3000));
        assert_eq!(config.activation.ramp_ceiling, 90);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("NEXT_PUBLIC_API_URL", "https://api.orbit360.shop/"),
            ("ORBIT_ADMIN_POLL_INTERVAL_MS", "500"),
            ("ORBIT_ADMIN_AUTO_REFRESH", "false"),
        ]
        .into_iter()
        .collect();

        let mut config = ClientConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.api.base_url, "https://api.orbit360.shop");
        assert_eq!(config.polling.interval_ms, 500);
        assert!(!config.polling.auto_refresh);
    }

    #[test]
    fn test_invalid_interval_is_ignored() {
        let mut config = ClientConfig::default();
        config.apply_overrides(|key| {
            (key == "ORBIT_ADMIN_POLL_INTERVAL_MS").then(|| "soon".to_string())
        });
        assert_eq!(config.polling.interval_ms, 3000);
    }

    #[test]
    fn test_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[polling]\ninterval_ms = 1000\n\n[api]\nbase_url = \"http://backend:5000/\"").unwrap();

        let config = ClientConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.polling.interval_ms, 1000);
        assert!(config.polling.auto_refresh);
        assert_eq!(config.api.base_url, "http://backend:5000");
        assert_eq!(config.api.timeout_secs, 30);
    }

    #[test]
    fn test_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[polling\ninterval_ms = ").unwrap();

        let err = ClientConfig::load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
