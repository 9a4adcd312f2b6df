//! Optional TOML configuration.
//!
//! Looked up at `<config dir>/trimwheel-check/config.toml` unless a file is
//! given with `-f`. Every field has a default, so a partial file is fine:
//!
//! ```toml
//! exit_key = "Q"
//!
//! [target]
//! vendor_id = 0x06A3
//! product_id = 0x0BD4
//!
//! [polling]
//! interval_ms = 1000
//! verbose_interval_ms = 250
//! max_cycles = 86400
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::input::DeviceIdentity;
use crate::monitor::{ONE_DAY_CYCLES, TRIM_WHEEL};

pub const CONFIG_DIR: &str = "trimwheel-check";
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", .path.display())]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidValue(String),
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Key that stops the poll loop, compared case-insensitively.
    pub exit_key: char,
    pub target: TargetConfig,
    pub polling: PollingConfig,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct TargetConfig {
    pub vendor_id: u16,
    pub product_id: u16,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_ms: u64,
    /// Interval used once `-v` is given.
    pub verbose_interval_ms: u64,
    /// Cycle cap, clamped to 86 400 (one day at the default interval).
    pub max_cycles: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exit_key: 'Q',
            target: TargetConfig::default(),
            polling: PollingConfig::default(),
        }
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            vendor_id: TRIM_WHEEL.vendor_id,
            product_id: TRIM_WHEEL.product_id,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            verbose_interval_ms: 250,
            max_cycles: ONE_DAY_CYCLES,
        }
    }
}

impl TargetConfig {
    pub fn identity(&self) -> DeviceIdentity {
        DeviceIdentity::new(self.vendor_id, self.product_id)
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Loads `explicit` strictly, otherwise the default file if present.
    ///
    /// A broken default file is reported and replaced by defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            info!("Loading configuration from {}", path.display());
            return Self::load_from(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => match Self::load_from(&path) {
                Ok(config) => {
                    info!("Loaded configuration from {}", path.display());
                    Ok(config)
                }
                Err(e) => {
                    warn!("{}, using defaults", e);
                    Ok(Self::default())
                }
            },
            Some(path) => {
                debug!("No config file at {}, using defaults", path.display());
                Ok(Self::default())
            }
            None => {
                debug!("No config directory on this platform, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })?;
        config.validated()
    }

    /// Checks ranges, clamps the cycle cap and upper-cases the exit key.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        if self.polling.interval_ms == 0 || self.polling.verbose_interval_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "poll intervals must be greater than zero".to_string(),
            ));
        }
        if self.polling.max_cycles == 0 {
            return Err(ConfigError::InvalidValue(
                "max_cycles must be at least 1".to_string(),
            ));
        }
        if self.polling.max_cycles > ONE_DAY_CYCLES {
            warn!(
                "max_cycles {} exceeds one day, clamped to {}",
                self.polling.max_cycles, ONE_DAY_CYCLES
            );
            self.polling.max_cycles = ONE_DAY_CYCLES;
        }
        if !self.exit_key.is_ascii_alphanumeric() {
            return Err(ConfigError::InvalidValue(format!(
                "exit_key {:?} must be a letter or digit",
                self.exit_key
            )));
        }
        self.exit_key = self.exit_key.to_ascii_uppercase();
        Ok(self)
    }

    pub fn poll_interval(&self, verbose: bool) -> Duration {
        if verbose {
            Duration::from_millis(self.polling.verbose_interval_ms)
        } else {
            Duration::from_millis(self.polling.interval_ms)
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn parse(content: &str) -> Result<Config, ConfigError> {
        let config: Config = toml::from_str(content).map_err(|source| ConfigError::ParseError {
            path: PathBuf::from("test.toml"),
            source,
        })?;
        config.validated()
    }

    #[test]
    fn empty_file_gives_trim_wheel_defaults() {
        let config = parse("").map_err(|e| e.to_string());
        assert_eq!(config, Ok(Config::default()));
        let config = Config::default();
        assert_eq!(config.target.identity(), TRIM_WHEEL);
        assert_eq!(config.poll_interval(false), Duration::from_secs(1));
        assert_eq!(config.poll_interval(true), Duration::from_millis(250));
    }

    #[test]
    fn partial_file_with_hex_ids() {
        let config = parse(
            r#"
            exit_key = "x"

            [target]
            product_id = 0x0763
            "#,
        );
        let Ok(config) = config else {
            panic!("config should parse");
        };
        assert_eq!(config.exit_key, 'X');
        assert_eq!(config.target.identity(), DeviceIdentity::new(0x06A3, 0x0763));
        assert_eq!(config.polling, PollingConfig::default());
    }

    #[test]
    fn cycle_cap_is_clamped_to_one_day() {
        let config = parse("[polling]\nmax_cycles = 1000000\n");
        assert!(matches!(config, Ok(c) if c.polling.max_cycles == ONE_DAY_CYCLES));
    }

    #[test]
    fn rejects_unusable_values() {
        assert!(matches!(
            parse("[polling]\ninterval_ms = 0\n"),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            parse("[polling]\nmax_cycles = 0\n"),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(parse("exit_key = \" \"\n"), Err(ConfigError::InvalidValue(_))));
        assert!(matches!(
            parse("[target]\nvendor_id = \"saitek\"\n"),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn explicit_file_must_exist() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            Config::load(Some(&missing)),
            Err(ConfigError::ReadError { .. })
        ));
    }

    #[test]
    fn explicit_file_is_loaded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wheel.toml");
        fs::write(&path, "[polling]\ninterval_ms = 500\n").unwrap();

        let loaded = Config::load(Some(&path));

        assert!(matches!(loaded, Ok(c) if c.polling.interval_ms == 500));
    }
}
