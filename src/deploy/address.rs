//! Counterfactual addresses.
//!
//! Token addresses are predicted offline with CREATE2. Fee vault addresses are
//! owned by the vault factory, so they are read from it: one `eth_call` per
//! distinct fee preference, issued concurrently.

use crate::deploy::abi::{keccak256, AbiType, AbiValue, FunctionSpec};
use crate::domain::errors::{EncodingError, ResolutionError};
use crate::domain::types::{FeePreference, RewardRecipient};
use crate::features::evm::ContractReader;
use alloy_primitives::{Address, B256};
use canlog::{log, GetLogFilter, LogFilter, LogPriorityLevels};
use futures::future::join_all;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, LogPriorityLevels)]
enum AddressLogPriority {
    #[log_level(capacity = 1000, name = "ADDRESS_INFO")]
    Info,
    #[log_level(capacity = 500, name = "ADDRESS_ERROR")]
    Error,
}

impl GetLogFilter for AddressLogPriority {
    fn get_log_filter() -> LogFilter {
        LogFilter::ShowAll
    }
}

const CREATE2_PREFIX: u8 = 0xff;
const PREDICT_VAULT_SIGNATURE: &str = "predictVaultAddress(address,address,uint8)";

/// 32 random bytes from the OS generator.
pub fn generate_nonce() -> B256 {
    let mut nonce = [0u8; 32];
    OsRng.fill_bytes(&mut nonce);
    B256::from(nonce)
}

/// `keccak256(abi.encode(address admin, bytes32 nonce))`.
pub fn derive_salt(admin: Address, nonce: B256) -> B256 {
    let mut encoded = [0u8; 64];
    encoded[12..32].copy_from_slice(admin.as_slice());
    encoded[32..].copy_from_slice(nonce.as_slice());
    keccak256(encoded)
}

/// `keccak256(creation_code ++ abi.encode(constructor_args))`.
pub fn token_init_code_hash(
    creation_code: &[u8],
    constructor_types: &[AbiType],
    constructor_args: &[AbiValue],
) -> Result<B256, EncodingError> {
    let encoded_args = crate::deploy::abi::encode_params(constructor_types, constructor_args)?;
    let mut hasher = Keccak256::new();
    hasher.update(creation_code);
    hasher.update(&encoded_args);
    let digest: [u8; 32] = hasher.finalize().into();
    Ok(B256::from(digest))
}

/// CREATE2: low 20 bytes of `keccak256(0xff ++ deployer ++ salt ++ init_code_hash)`.
pub fn predict_deploy_address(deployer: Address, init_code_hash: B256, salt: B256) -> Address {
    let mut hasher = Keccak256::new();
    hasher.update([CREATE2_PREFIX]);
    hasher.update(deployer.as_slice());
    hasher.update(salt.as_slice());
    hasher.update(init_code_hash.as_slice());
    let digest: [u8; 32] = hasher.finalize().into();
    Address::from_slice(&digest[12..])
}

pub struct VaultResolver<'a> {
    vault_factory: Address,
    reader: &'a dyn ContractReader,
}

impl<'a> VaultResolver<'a> {
    pub fn new(vault_factory: Address, reader: &'a dyn ContractReader) -> Self {
        Self {
            vault_factory,
            reader,
        }
    }

    fn predict_vault_function() -> Result<FunctionSpec, EncodingError> {
        Ok(FunctionSpec::parse(PREDICT_VAULT_SIGNATURE)?.with_outputs(vec![AbiType::Address]))
    }

    /// Vault for `(token, paired_asset, preference)` as reported by the factory.
    pub async fn resolve(
        &self,
        token: Address,
        paired_asset: Address,
        preference: FeePreference,
    ) -> Result<Address, ResolutionError> {
        let function = Self::predict_vault_function().map_err(ResolutionError::MalformedResponse)?;
        let calldata = function
            .encode_input(&[
                AbiValue::Address(token),
                AbiValue::Address(paired_asset),
                AbiValue::uint(u64::from(preference.as_u8())),
            ])
            .map_err(ResolutionError::MalformedResponse)?;

        let raw = self
            .reader
            .call(self.vault_factory, &calldata)
            .await
            .map_err(|error| {
                log!(
                    AddressLogPriority::Error,
                    "vault_resolve_failed token={:#x} preference={} error={}",
                    token,
                    preference,
                    error
                );
                ResolutionError::Call(error)
            })?;

        let decoded = function
            .decode_output(&raw)
            .map_err(ResolutionError::MalformedResponse)?;
        let vault = decoded
            .first()
            .and_then(AbiValue::as_address)
            .ok_or_else(|| {
                ResolutionError::MalformedResponse(EncodingError::TypeMismatch {
                    field: "predictVaultAddress.0".to_string(),
                    expected: "address".to_string(),
                    found: "nothing".to_string(),
                })
            })?;
        log!(
            AddressLogPriority::Info,
            "vault_resolved token={:#x} preference={} vault={:#x}",
            token,
            preference,
            vault
        );
        Ok(vault)
    }

    /// One lookup per distinct preference among `recipients`, run
    /// concurrently. Fails on the first error in preference order; partial
    /// results are discarded.
    pub async fn resolve_all(
        &self,
        token: Address,
        paired_asset: Address,
        recipients: &[RewardRecipient],
    ) -> Result<BTreeMap<FeePreference, Address>, ResolutionError> {
        let preferences = distinct_preferences(recipients);
        let lookups = preferences
            .iter()
            .map(|preference| self.resolve(token, paired_asset, *preference));
        let results = join_all(lookups).await;

        let mut vaults = BTreeMap::new();
        for (preference, result) in preferences.into_iter().zip(results) {
            vaults.insert(preference, result?);
        }
        Ok(vaults)
    }
}

pub fn distinct_preferences(recipients: &[RewardRecipient]) -> Vec<FeePreference> {
    recipients
        .iter()
        .map(|recipient| recipient.fee_preference)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
