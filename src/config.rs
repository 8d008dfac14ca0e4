//! Network profile management with validation and defaults
//!
//! Every supported chain gets a [`NetworkProfile`] carrying the lottery
//! constructor parameters and the randomness subscription wiring. Profiles
//! come from the built-in registry, a TOML file, or `TOMBOLA_*` environment
//! overrides, in that order.

use crate::errors::ConfigError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::time::Duration;

/// Chain id used by the local development chain
pub const DEV_CHAIN_ID: u64 = 31337;

/// Network names treated as development chains
pub const DEV_CHAIN_NAMES: &[&str] = &["local", "localhost"];

/// Per-chain lottery deployment parameters
///
/// Fee fields are wei as `u64`: TOML integers are signed 64-bit, and no
/// supported network charges an entrance fee anywhere near that bound.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkProfile {
    pub name: String,
    pub chain_id: u64,
    pub entrance_fee_wei: u64,
    /// Key hash selecting the gas price tier for randomness requests
    pub gas_lane: String,
    /// Funded subscription to bill randomness requests against; dev chains
    /// provision one at deploy time instead
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<u64>,
    pub callback_gas_limit: u64,
    pub interval_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinator_address: Option<String>,
}

impl NetworkProfile {
    /// Local development profile (subscription provisioned at deploy time)
    pub fn local() -> Self {
        Self {
            name: "local".to_string(),
            chain_id: DEV_CHAIN_ID,
            entrance_fee_wei: 1_000_000_000_000_000, // 0.001 ether
            gas_lane: "0xd89b2bf150e3b9e13446986e571fb9cab24b13cea0a43ea20a6049a85cc807cc"
                .to_string(),
            subscription_id: None,
            callback_gas_limit: 50_000,
            interval_secs: 30,
            coordinator_address: None,
        }
    }

    /// Goerli testnet profile
    pub fn goerli() -> Self {
        Self {
            name: "goerli".to_string(),
            chain_id: 5,
            entrance_fee_wei: 1_000_000_000_000_000, // 0.001 ether
            gas_lane: "0x79d3d8832d904592c0bf9818b621522c988bb8b0c05cdc3b15aea1b6e8db0c15"
                .to_string(),
            subscription_id: Some(10_173),
            callback_gas_limit: 500_000,
            interval_secs: 30,
            coordinator_address: Some("0x2Ca8E0C643bDe4C2E08ab1fA0da3401AdAD7734D".to_string()),
        }
    }

    /// Whether deployment should provision a mock coordinator here
    pub fn is_dev(&self) -> bool {
        self.chain_id == DEV_CHAIN_ID || DEV_CHAIN_NAMES.contains(&self.name.as_str())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Validate field values and cross-field requirements
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entrance_fee_wei == 0 {
            return Err(ConfigError::InvalidValue {
                field: "entrance_fee_wei".to_string(),
                value: "0".to_string(),
                reason: "entrance fee must be positive".to_string(),
            });
        }
        if self.interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "interval_secs".to_string(),
                value: "0".to_string(),
                reason: "draw interval must be positive".to_string(),
            });
        }
        if self.callback_gas_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "callback_gas_limit".to_string(),
                value: "0".to_string(),
                reason: "callback gas limit must be positive".to_string(),
            });
        }

        let lane = self.gas_lane.trim_start_matches("0x");
        let decoded = hex::decode(lane).map_err(|e| ConfigError::InvalidValue {
            field: "gas_lane".to_string(),
            value: self.gas_lane.clone(),
            reason: format!("not valid hex: {}", e),
        })?;
        if decoded.len() != 32 {
            return Err(ConfigError::InvalidValue {
                field: "gas_lane".to_string(),
                value: self.gas_lane.clone(),
                reason: format!("expected 32 bytes, got {}", decoded.len()),
            });
        }

        if !self.is_dev() {
            if self.subscription_id.is_none() {
                return Err(ConfigError::MissingRequired(format!(
                    "subscription_id for network {}",
                    self.name
                )));
            }
            if self.coordinator_address.is_none() {
                return Err(ConfigError::MissingRequired(format!(
                    "coordinator_address for network {}",
                    self.name
                )));
            }
        }

        Ok(())
    }
}

static BUILTIN_PROFILES: Lazy<HashMap<u64, NetworkProfile>> = Lazy::new(|| {
    let mut profiles = HashMap::new();
    for profile in [NetworkProfile::local(), NetworkProfile::goerli()] {
        profiles.insert(profile.chain_id, profile);
    }
    profiles
});

/// Look up a built-in profile by chain id
pub fn builtin_profile(chain_id: u64) -> Result<NetworkProfile, ConfigError> {
    BUILTIN_PROFILES
        .get(&chain_id)
        .cloned()
        .ok_or(ConfigError::UnknownChain(chain_id))
}

/// On-disk configuration: a set of named network profiles
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TombolaConfig {
    #[serde(default)]
    pub profiles: HashMap<String, NetworkProfile>,
}

impl TombolaConfig {
    /// Built-in profiles keyed by name
    pub fn builtin() -> Self {
        let profiles = BUILTIN_PROFILES
            .values()
            .map(|p| (p.name.clone(), p.clone()))
            .collect();
        Self { profiles }
    }

    pub fn profile_for_chain(&self, chain_id: u64) -> Result<NetworkProfile, ConfigError> {
        self.profiles
            .values()
            .find(|p| p.chain_id == chain_id)
            .cloned()
            .ok_or(ConfigError::UnknownChain(chain_id))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for profile in self.profiles.values() {
            profile.validate()?;
        }
        Ok(())
    }
}

/// Configuration loader: file, then environment overrides, then validation
pub struct ConfigLoader {
    config_path: Option<String>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    pub fn load(&self) -> Result<TombolaConfig, ConfigError> {
        let mut config = if let Some(ref path) = self.config_path {
            self.load_from_file(path)?
        } else {
            TombolaConfig::builtin()
        };

        self.apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(config)
    }

    fn load_from_file(&self, path: &str) -> Result<TombolaConfig, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("failed to read {}: {}", path, e)))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::LoadFailed(format!("failed to parse TOML: {}", e)))
    }

    /// Overrides apply to every profile; they exist for tuning a single
    /// deployment run, not for describing whole networks
    fn apply_env_overrides(&self, config: &mut TombolaConfig) -> Result<(), ConfigError> {
        if let Ok(fee) = env::var("TOMBOLA_ENTRANCE_FEE_WEI") {
            let fee: u64 = fee.parse().map_err(|_| ConfigError::InvalidValue {
                field: "TOMBOLA_ENTRANCE_FEE_WEI".to_string(),
                value: fee.clone(),
                reason: "not a valid wei amount".to_string(),
            })?;
            for profile in config.profiles.values_mut() {
                profile.entrance_fee_wei = fee;
            }
        }

        if let Ok(interval) = env::var("TOMBOLA_INTERVAL_SECS") {
            let interval: u64 = interval.parse().map_err(|_| ConfigError::InvalidValue {
                field: "TOMBOLA_INTERVAL_SECS".to_string(),
                value: interval.clone(),
                reason: "not a valid interval".to_string(),
            })?;
            for profile in config.profiles.values_mut() {
                profile.interval_secs = interval;
            }
        }

        Ok(())
    }

    pub fn save(&self, config: &TombolaConfig, path: &str) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(config)
            .map_err(|e| ConfigError::SaveFailed(format!("failed to serialize config: {}", e)))?;

        std::fs::write(path, toml_string)
            .map_err(|e| ConfigError::SaveFailed(format!("failed to write {}: {}", path, e)))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate a sample configuration file with the built-in profiles
pub fn generate_sample_config(path: &str) -> Result<(), ConfigError> {
    ConfigLoader::new().save(&TombolaConfig::builtin(), path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn builtin_profiles_are_valid() {
        let config = TombolaConfig::builtin();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn local_profile_is_dev() {
        assert!(NetworkProfile::local().is_dev());
        assert!(!NetworkProfile::goerli().is_dev());
    }

    #[test]
    fn unknown_chain_is_rejected() {
        let err = builtin_profile(424242).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownChain(424242)));
    }

    #[test]
    fn zero_fee_fails_validation() {
        let mut profile = NetworkProfile::local();
        profile.entrance_fee_wei = 0;
        assert!(profile.validate().is_err());
    }

    #[test]
    fn malformed_gas_lane_fails_validation() {
        let mut profile = NetworkProfile::local();
        profile.gas_lane = "0x1234".to_string();
        assert!(profile.validate().is_err());
    }

    #[test]
    fn live_profile_requires_subscription() {
        let mut profile = NetworkProfile::goerli();
        profile.subscription_id = None;
        let err = profile.validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(_)));
    }

    #[test]
    fn save_and_load_round_trip() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_str().unwrap();

        let original = TombolaConfig::builtin();
        let loader = ConfigLoader::new();
        loader.save(&original, path).unwrap();

        let loaded = ConfigLoader::new().with_path(path).load().unwrap();
        let local = loaded.profile_for_chain(DEV_CHAIN_ID).unwrap();
        assert_eq!(local, NetworkProfile::local());
    }
}
