//! CLI configuration management

use anyhow::Context;
use exo_primitives::Address;
use exo_sdk::{PipelineSettings, SchemaSelection, SchemaVersion, SimulationPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::CliError;

/// Environment variable pointing at an alternate config file
pub const CONFIG_ENV: &str = "EXO_CLI_CONFIG";

/// CLI configuration
///
/// The signing key is never stored here; it only comes from the command
/// line or `EXO_PRIVATE_KEY`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// RPC endpoint URL
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// Asset used when `--asset` is omitted
    #[serde(default)]
    pub default_asset_id: Option<String>,
    /// Client chain id passed to every call
    #[serde(default = "default_network_id")]
    pub network_id: u32,
    /// Gas limit of every transaction
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
    /// Confirmation deadline in seconds
    #[serde(default = "default_confirm_timeout_secs")]
    pub confirm_timeout_secs: u64,
    /// Receipt polling interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Dry-run policy: warn, abort or skip
    #[serde(default = "default_simulation")]
    pub simulation: String,
    /// Delegation interface version: v1 or v2
    #[serde(default = "default_delegation_schema")]
    pub delegation_schema: String,
    /// Asset precompile override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_precompile: Option<String>,
    /// Delegation precompile override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegation_precompile: Option<String>,
    /// Reward precompile override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_precompile: Option<String>,
}

fn default_rpc_url() -> String {
    "http://localhost:8545".to_string()
}

fn default_network_id() -> u32 {
    101
}

fn default_gas_limit() -> u64 {
    500_000
}

fn default_confirm_timeout_secs() -> u64 {
    300
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_simulation() -> String {
    "warn".to_string()
}

fn default_delegation_schema() -> String {
    "v2".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            default_asset_id: None,
            network_id: default_network_id(),
            gas_limit: default_gas_limit(),
            confirm_timeout_secs: default_confirm_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            simulation: default_simulation(),
            delegation_schema: default_delegation_schema(),
            asset_precompile: None,
            delegation_precompile: None,
            reward_precompile: None,
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".exocore-cli"))
    }

    /// Get the config file path; `EXO_CLI_CONFIG` wins over the home directory
    pub fn config_path() -> Option<PathBuf> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
            _ => Self::config_dir().map(|d| d.join("config.toml")),
        }
    }

    /// Load config from file, or the defaults when there is no file
    pub fn load() -> Result<Self, CliError> {
        match Self::config_path() {
            Some(path) if path.exists() => {
                Self::read_file(&path).map_err(|e| CliError::Config(format!("{:#}", e)))
            }
            _ => Ok(Self::default()),
        }
    }

    /// Parse one config file
    pub fn read_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<(), std::io::Error> {
        let path = Self::config_path().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "Cannot determine config path")
        })?;
        self.save_to(&path)
    }

    /// Save config to an explicit path
    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;

        std::fs::write(path, content)
    }

    /// Pipeline knobs described by this config
    pub fn to_settings(&self) -> Result<PipelineSettings, CliError> {
        let simulation: SimulationPolicy = self
            .simulation
            .parse()
            .map_err(|e| CliError::Config(format!("simulation: {}", e)))?;
        for (key, value) in [
            ("confirm_timeout_secs", self.confirm_timeout_secs),
            ("poll_interval_ms", self.poll_interval_ms),
            ("request_timeout_secs", self.request_timeout_secs),
        ] {
            if value == 0 {
                return Err(CliError::Config(format!("{} must be positive", key)));
            }
        }
        Ok(PipelineSettings {
            gas_limit: self.gas_limit,
            simulation,
            confirm_timeout: Duration::from_secs(self.confirm_timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        })
    }

    /// Schema versions and destinations described by this config
    pub fn to_selection(&self) -> Result<SchemaSelection, CliError> {
        let mut selection = SchemaSelection::default();
        selection.delegation.version = self
            .delegation_schema
            .parse::<SchemaVersion>()
            .map_err(|e| CliError::Config(format!("delegation_schema: {}", e)))?;

        let overrides = [
            (&self.asset_precompile, &mut selection.asset.destination),
            (&self.delegation_precompile, &mut selection.delegation.destination),
            (&self.reward_precompile, &mut selection.reward.destination),
        ];
        for (value, destination) in overrides {
            if let Some(value) = value {
                *destination = Address::from_hex(value)
                    .map_err(|e| CliError::Config(format!("precompile {}: {}", value, e)))?;
            }
        }
        Ok(selection)
    }
}
