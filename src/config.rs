//! Per-network contract addresses.
//!
//! Every component receives a [`NetworkConfig`] at construction; nothing in
//! the crate holds network addresses as constants. A [`NetworkRegistry`] maps
//! chain ids to configs and is usually loaded from a JSON file shaped like:
//!
//! ```json
//! { "networks": [ { "chain_id": 8453, "name": "base", "paired_asset": "0x42…06",
//!                   "v4": { "factory": "0x…", ... } } ] }
//! ```

use crate::domain::errors::ConfigError;
use crate::domain::types::SchemaVersion;
use alloy_primitives::{Address, Bytes};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_RPC_MAX_RESPONSE_BYTES: u64 = 64 * 1024;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct V4Contracts {
    pub factory: Address,
    pub locker: Address,
    pub static_fee_hook: Address,
    pub dynamic_fee_hook: Address,
    pub mev_module: Address,
    pub vault_factory: Address,
    pub tokenizer: Address,
    pub launch_buy_extension: Address,
    pub vault_extension: Address,
    pub token_creation_code: Bytes,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct V31Contracts {
    pub factory: Address,
    pub vault_factory: Address,
    pub tokenizer: Address,
    pub token_creation_code: Bytes,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NetworkConfig {
    pub chain_id: u64,
    pub name: String,
    #[serde(default)]
    pub rpc_url: Option<String>,
    #[serde(default)]
    pub fallback_rpc_url: Option<String>,
    #[serde(default = "default_rpc_max_response_bytes")]
    pub rpc_max_response_bytes: u64,
    /// Quote asset used when an intent does not override it.
    pub paired_asset: Address,
    #[serde(default)]
    pub v4: Option<V4Contracts>,
    #[serde(default, rename = "v3_1")]
    pub v3_1: Option<V31Contracts>,
}

fn default_rpc_max_response_bytes() -> u64 {
    DEFAULT_RPC_MAX_RESPONSE_BYTES
}

impl NetworkConfig {
    pub fn v4(&self) -> Result<&V4Contracts, ConfigError> {
        self.v4.as_ref().ok_or(ConfigError::MissingVersion {
            chain_id: self.chain_id,
            version: SchemaVersion::V4,
        })
    }

    pub fn v3_1(&self) -> Result<&V31Contracts, ConfigError> {
        self.v3_1.as_ref().ok_or(ConfigError::MissingVersion {
            chain_id: self.chain_id,
            version: SchemaVersion::V3_1,
        })
    }

    pub fn factory(&self, version: SchemaVersion) -> Result<Address, ConfigError> {
        match version {
            SchemaVersion::V4 => self.v4().map(|contracts| contracts.factory),
            SchemaVersion::V3_1 => self.v3_1().map(|contracts| contracts.factory),
        }
    }

    pub fn vault_factory(&self, version: SchemaVersion) -> Result<Address, ConfigError> {
        match version {
            SchemaVersion::V4 => self.v4().map(|contracts| contracts.vault_factory),
            SchemaVersion::V3_1 => self.v3_1().map(|contracts| contracts.vault_factory),
        }
    }

    pub fn tokenizer(&self, version: SchemaVersion) -> Result<Address, ConfigError> {
        match version {
            SchemaVersion::V4 => self.v4().map(|contracts| contracts.tokenizer),
            SchemaVersion::V3_1 => self.v3_1().map(|contracts| contracts.tokenizer),
        }
    }

    pub fn token_creation_code(&self, version: SchemaVersion) -> Result<&Bytes, ConfigError> {
        match version {
            SchemaVersion::V4 => self.v4().map(|contracts| &contracts.token_creation_code),
            SchemaVersion::V3_1 => self.v3_1().map(|contracts| &contracts.token_creation_code),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chain_id == 0 {
            return Err(ConfigError::Invalid(
                "chain_id must be greater than zero".to_string(),
            ));
        }
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "chain_id {} must have a non-empty name",
                self.chain_id
            )));
        }
        require_nonzero(self.chain_id, "paired_asset", self.paired_asset)?;
        if self.v4.is_none() && self.v3_1.is_none() {
            return Err(ConfigError::Invalid(format!(
                "chain_id {} must configure at least one contract version",
                self.chain_id
            )));
        }
        if let Some(contracts) = &self.v4 {
            for (field, address) in [
                ("v4.factory", contracts.factory),
                ("v4.locker", contracts.locker),
                ("v4.static_fee_hook", contracts.static_fee_hook),
                ("v4.dynamic_fee_hook", contracts.dynamic_fee_hook),
                ("v4.mev_module", contracts.mev_module),
                ("v4.vault_factory", contracts.vault_factory),
                ("v4.tokenizer", contracts.tokenizer),
                ("v4.launch_buy_extension", contracts.launch_buy_extension),
                ("v4.vault_extension", contracts.vault_extension),
            ] {
                require_nonzero(self.chain_id, field, address)?;
            }
            require_code(self.chain_id, "v4.token_creation_code", &contracts.token_creation_code)?;
        }
        if let Some(contracts) = &self.v3_1 {
            for (field, address) in [
                ("v3_1.factory", contracts.factory),
                ("v3_1.vault_factory", contracts.vault_factory),
                ("v3_1.tokenizer", contracts.tokenizer),
            ] {
                require_nonzero(self.chain_id, field, address)?;
            }
            require_code(
                self.chain_id,
                "v3_1.token_creation_code",
                &contracts.token_creation_code,
            )?;
        }
        Ok(())
    }
}

fn require_nonzero(chain_id: u64, field: &str, address: Address) -> Result<(), ConfigError> {
    if address == Address::ZERO {
        return Err(ConfigError::Invalid(format!(
            "chain_id {chain_id}: {field} must not be the zero address"
        )));
    }
    Ok(())
}

fn require_code(chain_id: u64, field: &str, code: &Bytes) -> Result<(), ConfigError> {
    if code.is_empty() {
        return Err(ConfigError::Invalid(format!(
            "chain_id {chain_id}: {field} must not be empty"
        )));
    }
    Ok(())
}

#[derive(Deserialize)]
struct RegistryFile {
    networks: Vec<NetworkConfig>,
}

#[derive(Clone, Debug, Default)]
pub struct NetworkRegistry {
    networks: BTreeMap<u64, NetworkConfig>,
}

impl NetworkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let file: RegistryFile = serde_json::from_str(raw)
            .map_err(|error| ConfigError::Invalid(format!("invalid network json: {error}")))?;
        let mut registry = Self::new();
        for network in file.networks {
            registry.insert(network)?;
        }
        Ok(registry)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|error| ConfigError::Io(format!("{}: {error}", path.display())))?;
        Self::from_json_str(&raw)
    }

    /// Validates and adds a network. Chain ids must be unique.
    pub fn insert(&mut self, network: NetworkConfig) -> Result<(), ConfigError> {
        network.validate()?;
        if self.networks.contains_key(&network.chain_id) {
            return Err(ConfigError::Invalid(format!(
                "duplicate chain_id {}",
                network.chain_id
            )));
        }
        self.networks.insert(network.chain_id, network);
        Ok(())
    }

    pub fn get(&self, chain_id: u64) -> Result<&NetworkConfig, ConfigError> {
        self.networks
            .get(&chain_id)
            .ok_or(ConfigError::UnknownChain(chain_id))
    }

    pub fn chain_ids(&self) -> Vec<u64> {
        self.networks.keys().copied().collect()
    }
}
