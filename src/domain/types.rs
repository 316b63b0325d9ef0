use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const BPS_DENOMINATOR: u64 = 10_000;
pub const MAX_RECIPIENTS: usize = 7;
pub const TICK_SPACING: i32 = 200;
/// Largest usable tick aligned to [`TICK_SPACING`].
pub const MAX_ALIGNED_TICK: i32 = 887_200;
pub const MIN_ALIGNED_TICK: i32 = -887_200;
pub const DEFAULT_STARTING_TICK: i32 = -230_400;
pub const MIN_VAULT_LOCKUP_SECONDS: u64 = 7 * 24 * 60 * 60;

/// Receiving-contract schema generation. Selects the record layout, the
/// factory, and the tokenizer a flow targets.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SchemaVersion {
    V4,
    #[serde(rename = "V3_1")]
    V3_1,
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaVersion::V4 => f.write_str("v4"),
            SchemaVersion::V3_1 => f.write_str("v3.1"),
        }
    }
}

/// Which side of the pair a recipient's fee share is paid in.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeePreference {
    Both,
    PairedAsset,
    ProjectAsset,
}

impl FeePreference {
    pub fn as_u8(self) -> u8 {
        match self {
            FeePreference::Both => 0,
            FeePreference::PairedAsset => 1,
            FeePreference::ProjectAsset => 2,
        }
    }
}

impl fmt::Display for FeePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeePreference::Both => f.write_str("both"),
            FeePreference::PairedAsset => f.write_str("paired"),
            FeePreference::ProjectAsset => f.write_str("project"),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RewardRecipient {
    pub recipient: Address,
    pub admin: Address,
    pub bps: u16,
    pub fee_preference: FeePreference,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct LiquidityPosition {
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub bps: u16,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeePolicy {
    Static {
        clanker_fee_bps: u16,
        paired_fee_bps: u16,
    },
    Dynamic {
        start_fee_bps: u16,
        end_fee_bps: u16,
        decay_seconds: u32,
    },
}

impl Default for FeePolicy {
    fn default() -> Self {
        FeePolicy::Static {
            clanker_fee_bps: 100,
            paired_fee_bps: 100,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct VaultLockConfig {
    pub percentage: u8,
    pub lockup_seconds: u64,
    #[serde(default)]
    pub vesting_seconds: u64,
    pub recipient: Address,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LaunchBuyConfig {
    pub native_amount: U256,
    #[serde(default)]
    pub minimum_tokens_out: U256,
}

/// Token metadata blob. Omitted fields serialize as empty values.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetadata {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub social_media_urls: Vec<String>,
    #[serde(default)]
    pub audit_urls: Vec<String>,
}

/// Provenance of a deployment request.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentContext {
    #[serde(default = "default_interface")]
    pub interface: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub message_id: String,
    #[serde(default)]
    pub id: String,
}

pub(crate) fn default_interface() -> String {
    "fee-vault-launcher".to_string()
}

impl Default for DeploymentContext {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            platform: String::new(),
            message_id: String::new(),
            id: String::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DeploymentIntent {
    pub chain_id: u64,
    pub version: SchemaVersion,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub image: String,
    pub admin: Address,
    #[serde(default)]
    pub metadata: Option<TokenMetadata>,
    #[serde(default)]
    pub context: Option<DeploymentContext>,
    pub recipients: Vec<RewardRecipient>,
    #[serde(default)]
    pub fee_policy: FeePolicy,
    #[serde(default)]
    pub positions: Option<Vec<LiquidityPosition>>,
    #[serde(default)]
    pub vault: Option<VaultLockConfig>,
    #[serde(default)]
    pub launch_buy: Option<LaunchBuyConfig>,
    #[serde(default)]
    pub paired_asset: Option<Address>,
    #[serde(default)]
    pub starting_tick: Option<i32>,
    /// Replays a previously generated nonce so the predicted token address is
    /// reproducible. A fresh one is drawn when absent.
    #[serde(default)]
    pub nonce: Option<B256>,
}

impl DeploymentIntent {
    pub fn starting_tick(&self) -> i32 {
        self.starting_tick.unwrap_or(DEFAULT_STARTING_TICK)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PredictedAddresses {
    pub token: Address,
    pub vaults: BTreeMap<FeePreference, Address>,
}

/// Everything needed to submit a deploy call. Never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeploymentPlan {
    pub version: SchemaVersion,
    pub to: Address,
    pub signature: String,
    pub record: crate::deploy::abi::AbiValue,
    pub calldata: Bytes,
    pub native_value: U256,
    pub predicted: PredictedAddresses,
    pub nonce: B256,
    pub salt: B256,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TokenizationRequest {
    pub chain_id: u64,
    pub token: Address,
    pub recipients: Vec<RewardRecipient>,
    pub version: SchemaVersion,
    #[serde(default)]
    pub paired_asset: Option<Address>,
}

/// Handle for a tokenization between initialize and finalize. `pending_id`
/// stays `None` until the caller reads it from the initialize receipt.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PendingTokenization {
    pub pending_id: Option<B256>,
    pub predicted_vault: Address,
    pub source_token: Address,
    pub version: SchemaVersion,
}

impl PendingTokenization {
    pub fn with_pending_id(mut self, pending_id: B256) -> Self {
        self.pending_id = Some(pending_id);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitializeTokenization {
    pub to: Address,
    pub signature: String,
    pub record: crate::deploy::abi::AbiValue,
    pub calldata: Bytes,
    pub predicted_vault: Address,
    pub vaults: BTreeMap<FeePreference, Address>,
    pub pending: PendingTokenization,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FinalizeTokenization {
    pub to: Address,
    pub signature: String,
    pub record: crate::deploy::abi::AbiValue,
    pub calldata: Bytes,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenizationState {
    Uninitialized,
    PendingHandover(PendingTokenization),
    ReadyToFinalize(PendingTokenization),
    Finalized,
}

impl fmt::Display for TokenizationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenizationState::Uninitialized => f.write_str("Uninitialized"),
            TokenizationState::PendingHandover(_) => f.write_str("PendingHandover"),
            TokenizationState::ReadyToFinalize(_) => f.write_str("ReadyToFinalize"),
            TokenizationState::Finalized => f.write_str("Finalized"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenizationEvent {
    Initialized(PendingTokenization),
    HandoverConfirmed,
    Finalized,
}
