/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::common::UnitId;

/// Configuration for a component hosting a message bus.
///
/// Loaded from TOML files in XDG-compliant directories; every section and field
/// falls back to its default when omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Identity of the hosting component
    pub component: ComponentConfig,
    /// Command and tick settings
    pub messaging: MessagingConfig,
    /// Transport settings
    pub network: NetworkConfig,
    /// Tracing and logging configuration
    pub tracing: TracingConfig,
}

/// Identity of the hosting component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentConfig {
    /// Component type, the first unit id segment
    #[serde(rename = "type")]
    pub unit_type: String,
    /// Unit name, the second unit id segment
    pub unit: String,
    /// Optional instance, the third unit id segment
    pub instance: Option<String>,
}

/// Command and tick settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagingConfig {
    /// Timeout applied to commands that do not set one, in seconds (0 disables)
    pub command_timeout_secs: u64,
    /// Interval between `process` ticks in milliseconds
    pub tick_interval_ms: u64,
}

/// Transport settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// `host:port` of the remote peer; no connection is made when absent
    pub server_address: Option<String>,
    /// Delay before reconnecting after a lost or failed connection, in milliseconds
    pub reconnect_delay_ms: u64,
    /// Interval between keep-alive heartbeats, in milliseconds (0 disables)
    pub keepalive_interval_ms: u64,
    /// Largest accepted frame payload in bytes
    pub max_frame_size: usize,
}

/// Tracing and logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
    /// Directory for rolling log files; logs go to stdout when absent
    pub log_directory: Option<PathBuf>,
}

impl Default for ComponentConfig {
    fn default() -> Self {
        Self {
            unit_type: "component".to_string(),
            unit: "unitbus".to_string(),
            instance: None,
        }
    }
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            command_timeout_secs: 30,
            tick_interval_ms: 1_000,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            server_address: None,
            reconnect_delay_ms: 2_000,
            keepalive_interval_ms: 15_000,
            max_frame_size: 16 * 1024 * 1024,
        }
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_directory: None,
        }
    }
}

impl ComponentConfig {
    /// The unit id these settings describe.
    #[must_use]
    pub fn unit_id(&self) -> UnitId {
        match &self.instance {
            Some(instance) => UnitId::with_instance(&self.unit_type, &self.unit, instance),
            None => UnitId::new(&self.unit_type, &self.unit),
        }
    }
}

impl MessagingConfig {
    /// Tick interval as a `Duration`, never shorter than one millisecond.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

impl NetworkConfig {
    /// Reconnect delay as a `Duration`.
    #[must_use]
    pub const fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// Keep-alive interval, `None` when heartbeats are disabled.
    #[must_use]
    pub const fn keepalive_interval(&self) -> Option<Duration> {
        if self.keepalive_interval_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.keepalive_interval_ms))
        }
    }
}

/// Failure to read an explicitly named configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The file is not valid configuration TOML.
    #[error("failed to parse configuration file {path}: {source}")]
    Parse {
        /// File that was requested.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
}

impl BusConfig {
    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns the TOML error if the text is malformed.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Loads configuration from an explicit file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load configuration from XDG-compliant locations
    ///
    /// Looks for `$XDG_CONFIG_HOME/unitbus/config.toml`, falling back to the
    /// system config directories. If no configuration file is found, returns the
    /// default configuration. If a configuration file exists but is malformed, logs
    /// an error and uses defaults.
    pub fn load() -> Self {
        use tracing::{error, info};

        let xdg_dirs = match xdg::BaseDirectories::with_prefix("unitbus") {
            Ok(dirs) => dirs,
            Err(e) => {
                error!("Failed to initialize XDG directories: {}", e);
                return Self::default();
            }
        };

        match xdg_dirs.find_config_file("config.toml") {
            Some(path) => {
                info!("Loading configuration from: {}", path.display());
                match Self::load_from(&path) {
                    Ok(config) => config,
                    Err(e) => {
                        error!("{e}");
                        Self::default()
                    }
                }
            }
            None => {
                info!("No configuration file found, using defaults");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_files_keep_defaults() -> anyhow::Result<()> {
        let config = BusConfig::from_toml_str(
            r#"
            [component]
            type = "frontend"
            unit = "web"
            instance = "2"

            [messaging]
            command_timeout_secs = 5
            "#,
        )?;

        assert_eq!(config.component.unit_id().to_string(), "frontend/web/2");
        assert_eq!(config.messaging.command_timeout_secs, 5);
        assert_eq!(config.messaging.tick_interval_ms, 1_000);
        assert_eq!(config.network, NetworkConfig::default());
        assert_eq!(config.tracing.level, "info");
        Ok(())
    }

    #[test]
    fn zero_keepalive_disables_heartbeats() {
        let network = NetworkConfig {
            keepalive_interval_ms: 0,
            ..NetworkConfig::default()
        };
        assert!(network.keepalive_interval().is_none());
        assert_eq!(
            NetworkConfig::default().keepalive_interval(),
            Some(Duration::from_secs(15))
        );
    }
}
