//! Record layouts per receiving-contract generation.
//!
//! A [`RecordSchema`] turns validated inputs into an [`EncodedCall`]: the
//! function to call plus its argument values. The builder and the
//! tokenization flow pick an implementation with [`schema_for`].

use crate::config::NetworkConfig;
use crate::deploy::abi::{encode_params, AbiType, AbiValue, FunctionSpec};
use crate::domain::errors::{BuildError, EncodingError};
use crate::domain::types::{
    DeploymentIntent, FeePolicy, FeePreference, LiquidityPosition, RewardRecipient,
    SchemaVersion, TokenizationRequest, BPS_DENOMINATOR, MAX_ALIGNED_TICK, TICK_SPACING,
};
use alloy_primitives::{Address, Bytes, B256, U256};
use std::collections::BTreeMap;

const V4_DEPLOY_SIGNATURE: &str = "deployToken(((address,string,string,bytes32,string,string,string,uint256),(address,address,int24,int24,bytes),(address,address[],address[],uint16[],int24[],int24[],uint16[],bytes),(address,bytes),(address,uint256,uint16,bytes)[]))";
const V4_INITIALIZE_SIGNATURE: &str =
    "initializeTokenization((address,address,address[],address[],uint16[],bytes))";
const V31_DEPLOY_SIGNATURE: &str = "deployToken(((string,string,bytes32,string,string,string,uint256),(uint8,uint256),(address,int24),(uint24,uint256),(uint256,address,address,address,address)))";
const V31_INITIALIZE_SIGNATURE: &str =
    "initializeTokenization(address,address,address,address,uint256,address,address)";
const FINALIZE_SIGNATURE: &str = "finalizeTokenization(bytes32)";
const TOKEN_CONSTRUCTOR_TYPES: &str =
    "(string,string,uint256,address,string,string,string,uint256)";

/// 100 billion whole tokens with 18 decimals.
pub const TOKEN_SUPPLY_WHOLE: u64 = 100_000_000_000;
pub const TOKEN_DECIMALS: u64 = 18;
/// Pool fee tier for the V3_1 initial buy swap, in hundredths of a bip.
pub const V31_INITIAL_BUY_POOL_FEE: u64 = 10_000;
/// Fee units are hundredths of a bip.
const FEE_UNITS_PER_BPS: u64 = 100;

/// A function and the argument values to call it with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedCall {
    pub function: FunctionSpec,
    pub args: Vec<AbiValue>,
}

impl EncodedCall {
    fn parse(signature: &str, args: Vec<AbiValue>) -> Result<Self, EncodingError> {
        Ok(Self {
            function: FunctionSpec::parse(signature)?,
            args,
        })
    }

    pub fn signature(&self) -> String {
        self.function.signature()
    }

    /// The single struct argument, or all arguments as one tuple for flat
    /// signatures.
    pub fn record(&self) -> AbiValue {
        match self.args.as_slice() {
            [single] => single.clone(),
            args => AbiValue::Tuple(args.to_vec()),
        }
    }

    pub fn calldata(&self) -> Result<Bytes, EncodingError> {
        self.function.encode_input(&self.args).map(Bytes::from)
    }
}

/// Values the builder has already resolved for one deployment.
pub struct DeployInputs<'a> {
    pub intent: &'a DeploymentIntent,
    pub paired_asset: Address,
    pub nonce: B256,
    pub vaults: &'a BTreeMap<FeePreference, Address>,
    pub metadata: &'a str,
    pub context: &'a str,
}

pub trait RecordSchema {
    fn version(&self) -> SchemaVersion;

    /// Rejects intents this generation cannot express.
    fn check_supported(&self, intent: &DeploymentIntent) -> Result<(), BuildError>;

    /// The factory call for a deployment. On V4 the extension list holds a
    /// vault-lock entry when the intent carries a [`VaultLockConfig`], ahead
    /// of the launch-buy entry, so it is non-empty for a vault lock even
    /// without a launch buy.
    ///
    /// [`VaultLockConfig`]: crate::domain::types::VaultLockConfig
    fn deploy_call(
        &self,
        network: &NetworkConfig,
        inputs: &DeployInputs<'_>,
    ) -> Result<EncodedCall, BuildError>;

    fn initialize_tokenization_call(
        &self,
        request: &TokenizationRequest,
        paired_asset: Address,
        vaults: &BTreeMap<FeePreference, Address>,
    ) -> Result<EncodedCall, BuildError>;

    fn finalize_tokenization_call(&self, pending_id: B256) -> Result<EncodedCall, BuildError> {
        Ok(EncodedCall::parse(
            FINALIZE_SIGNATURE,
            vec![AbiValue::bytes32(pending_id)],
        )?)
    }
}

pub struct V4Schema;
pub struct V31Schema;

static V4_SCHEMA: V4Schema = V4Schema;
static V31_SCHEMA: V31Schema = V31Schema;

pub fn schema_for(version: SchemaVersion) -> &'static dyn RecordSchema {
    match version {
        SchemaVersion::V4 => &V4_SCHEMA,
        SchemaVersion::V3_1 => &V31_SCHEMA,
    }
}

/// Constructor types and values the factory passes to the token; they are
/// part of the CREATE2 init code.
pub fn token_constructor(
    intent: &DeploymentIntent,
    metadata: &str,
    context: &str,
) -> Result<(Vec<AbiType>, Vec<AbiValue>), EncodingError> {
    let types = match AbiType::parse(TOKEN_CONSTRUCTOR_TYPES)? {
        AbiType::Tuple(types) => types,
        other => return Err(EncodingError::UnsupportedType(other.canonical())),
    };
    let values = vec![
        AbiValue::string(intent.name.as_str()),
        AbiValue::string(intent.symbol.as_str()),
        AbiValue::Uint(token_supply()),
        AbiValue::Address(intent.admin),
        AbiValue::string(intent.image.as_str()),
        AbiValue::string(metadata),
        AbiValue::string(context),
        AbiValue::uint(intent.chain_id),
    ];
    Ok((types, values))
}

pub fn token_supply() -> U256 {
    U256::from(TOKEN_SUPPLY_WHOLE) * U256::from(10u64).pow(U256::from(TOKEN_DECIMALS))
}

/// One position over `[starting_tick, MAX_ALIGNED_TICK)` holding all liquidity.
pub fn default_positions(starting_tick: i32) -> Vec<LiquidityPosition> {
    vec![LiquidityPosition {
        tick_lower: starting_tick,
        tick_upper: MAX_ALIGNED_TICK,
        bps: BPS_DENOMINATOR as u16,
    }]
}

fn vault_for(
    vaults: &BTreeMap<FeePreference, Address>,
    preference: FeePreference,
) -> Result<Address, EncodingError> {
    vaults
        .get(&preference)
        .copied()
        .ok_or_else(|| EncodingError::TypeMismatch {
            field: format!("vaults.{preference}"),
            expected: "resolved vault address".to_string(),
            found: "nothing".to_string(),
        })
}

fn uints(values: impl IntoIterator<Item = u64>) -> AbiValue {
    AbiValue::Array(values.into_iter().map(AbiValue::uint).collect())
}

fn ints(values: impl IntoIterator<Item = i32>) -> AbiValue {
    AbiValue::Array(
        values
            .into_iter()
            .map(|value| AbiValue::int(i64::from(value)))
            .collect(),
    )
}

/// Reward admins and recipients are always the vault for the recipient's
/// preference; the end-user addresses only travel in `lockerData`.
fn reward_arrays(
    recipients: &[RewardRecipient],
    vaults: &BTreeMap<FeePreference, Address>,
) -> Result<(AbiValue, AbiValue, AbiValue), EncodingError> {
    let vault_addresses = recipients
        .iter()
        .map(|recipient| vault_for(vaults, recipient.fee_preference))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((
        AbiValue::addresses(vault_addresses.iter().copied()),
        AbiValue::addresses(vault_addresses),
        uints(recipients.iter().map(|recipient| u64::from(recipient.bps))),
    ))
}

/// `abi.encode(uint8[] feePreference, address[] beneficiaries, address[] beneficiaryAdmins)`.
fn locker_data(recipients: &[RewardRecipient]) -> Result<Vec<u8>, EncodingError> {
    encode_params(
        &[
            AbiType::Array(Box::new(AbiType::Uint(8))),
            AbiType::Array(Box::new(AbiType::Address)),
            AbiType::Array(Box::new(AbiType::Address)),
        ],
        &[
            uints(
                recipients
                    .iter()
                    .map(|recipient| u64::from(recipient.fee_preference.as_u8())),
            ),
            AbiValue::addresses(recipients.iter().map(|recipient| recipient.recipient)),
            AbiValue::addresses(recipients.iter().map(|recipient| recipient.admin)),
        ],
    )
}

fn fee_data(policy: &FeePolicy) -> Result<Vec<u8>, EncodingError> {
    match policy {
        FeePolicy::Static {
            clanker_fee_bps,
            paired_fee_bps,
        } => encode_params(
            &[AbiType::Uint(24), AbiType::Uint(24)],
            &[
                AbiValue::uint(u64::from(*clanker_fee_bps) * FEE_UNITS_PER_BPS),
                AbiValue::uint(u64::from(*paired_fee_bps) * FEE_UNITS_PER_BPS),
            ],
        ),
        FeePolicy::Dynamic {
            start_fee_bps,
            end_fee_bps,
            decay_seconds,
        } => encode_params(
            &[AbiType::Uint(24), AbiType::Uint(24), AbiType::Uint(32)],
            &[
                AbiValue::uint(u64::from(*start_fee_bps) * FEE_UNITS_PER_BPS),
                AbiValue::uint(u64::from(*end_fee_bps) * FEE_UNITS_PER_BPS),
                AbiValue::uint(u64::from(*decay_seconds)),
            ],
        ),
    }
}

impl RecordSchema for V4Schema {
    fn version(&self) -> SchemaVersion {
        SchemaVersion::V4
    }

    fn check_supported(&self, _intent: &DeploymentIntent) -> Result<(), BuildError> {
        Ok(())
    }

    fn deploy_call(
        &self,
        network: &NetworkConfig,
        inputs: &DeployInputs<'_>,
    ) -> Result<EncodedCall, BuildError> {
        let contracts = network.v4()?;
        let intent = inputs.intent;

        let token = AbiValue::Tuple(vec![
            AbiValue::Address(intent.admin),
            AbiValue::string(intent.name.as_str()),
            AbiValue::string(intent.symbol.as_str()),
            AbiValue::bytes32(inputs.nonce),
            AbiValue::string(intent.image.as_str()),
            AbiValue::string(inputs.metadata),
            AbiValue::string(inputs.context),
            AbiValue::uint(intent.chain_id),
        ]);

        let hook = match intent.fee_policy {
            FeePolicy::Static { .. } => contracts.static_fee_hook,
            FeePolicy::Dynamic { .. } => contracts.dynamic_fee_hook,
        };
        let pool_data = encode_params(
            &[AbiType::Address, AbiType::Bytes, AbiType::Bytes],
            &[
                AbiValue::Address(Address::ZERO),
                AbiValue::Bytes(Vec::new()),
                AbiValue::Bytes(fee_data(&intent.fee_policy)?),
            ],
        )?;
        let pool = AbiValue::Tuple(vec![
            AbiValue::Address(hook),
            AbiValue::Address(inputs.paired_asset),
            AbiValue::int(i64::from(intent.starting_tick())),
            AbiValue::int(i64::from(TICK_SPACING)),
            AbiValue::Bytes(pool_data),
        ]);

        let positions = intent
            .positions
            .clone()
            .unwrap_or_else(|| default_positions(intent.starting_tick()));
        let (reward_admins, reward_recipients, reward_bps) =
            reward_arrays(&intent.recipients, inputs.vaults)?;
        let locker = AbiValue::Tuple(vec![
            AbiValue::Address(contracts.locker),
            reward_admins,
            reward_recipients,
            reward_bps,
            ints(positions.iter().map(|position| position.tick_lower)),
            ints(positions.iter().map(|position| position.tick_upper)),
            uints(positions.iter().map(|position| u64::from(position.bps))),
            AbiValue::Bytes(locker_data(&intent.recipients)?),
        ]);

        let mev_module = AbiValue::Tuple(vec![
            AbiValue::Address(contracts.mev_module),
            AbiValue::Bytes(Vec::new()),
        ]);

        let mut extensions = Vec::new();
        if let Some(vault) = &intent.vault {
            let extension_data = encode_params(
                &[AbiType::Address, AbiType::Uint(256), AbiType::Uint(256)],
                &[
                    AbiValue::Address(vault.recipient),
                    AbiValue::uint(vault.lockup_seconds),
                    AbiValue::uint(vault.vesting_seconds),
                ],
            )?;
            extensions.push(AbiValue::Tuple(vec![
                AbiValue::Address(contracts.vault_extension),
                AbiValue::uint(0),
                AbiValue::uint(u64::from(vault.percentage) * FEE_UNITS_PER_BPS),
                AbiValue::Bytes(extension_data),
            ]));
        }
        if let Some(launch_buy) = &intent.launch_buy {
            let empty_pool_key = AbiValue::Tuple(vec![
                AbiValue::Address(Address::ZERO),
                AbiValue::Address(Address::ZERO),
                AbiValue::uint(0),
                AbiValue::int(0),
                AbiValue::Address(Address::ZERO),
            ]);
            let extension_data = encode_params(
                &[
                    AbiType::parse("(address,address,uint24,int24,address)")?,
                    AbiType::Uint(128),
                    AbiType::Address,
                ],
                &[
                    empty_pool_key,
                    AbiValue::Uint(launch_buy.minimum_tokens_out),
                    AbiValue::Address(intent.admin),
                ],
            )?;
            extensions.push(AbiValue::Tuple(vec![
                AbiValue::Address(contracts.launch_buy_extension),
                AbiValue::Uint(launch_buy.native_amount),
                AbiValue::uint(0),
                AbiValue::Bytes(extension_data),
            ]));
        }

        let record = AbiValue::Tuple(vec![
            token,
            pool,
            locker,
            mev_module,
            AbiValue::Array(extensions),
        ]);
        Ok(EncodedCall::parse(V4_DEPLOY_SIGNATURE, vec![record])?)
    }

    fn initialize_tokenization_call(
        &self,
        request: &TokenizationRequest,
        paired_asset: Address,
        vaults: &BTreeMap<FeePreference, Address>,
    ) -> Result<EncodedCall, BuildError> {
        let (reward_admins, reward_recipients, reward_bps) =
            reward_arrays(&request.recipients, vaults)?;
        let record = AbiValue::Tuple(vec![
            AbiValue::Address(request.token),
            AbiValue::Address(paired_asset),
            reward_admins,
            reward_recipients,
            reward_bps,
            AbiValue::Bytes(locker_data(&request.recipients)?),
        ]);
        Ok(EncodedCall::parse(V4_INITIALIZE_SIGNATURE, vec![record])?)
    }
}

impl V31Schema {
    fn unsupported(reason: impl Into<String>) -> BuildError {
        BuildError::UnsupportedBySchema {
            version: SchemaVersion::V3_1,
            reason: reason.into(),
        }
    }

    fn check_recipient_count(recipients: &[RewardRecipient]) -> Result<(), BuildError> {
        if recipients.len() > 2 {
            return Err(Self::unsupported(format!(
                "at most 2 reward recipients (creator and interface), got {}",
                recipients.len()
            )));
        }
        Ok(())
    }

    /// Creator and interface reward slots. A lone recipient also fills the
    /// interface slot.
    fn rewards(
        recipients: &[RewardRecipient],
        vaults: &BTreeMap<FeePreference, Address>,
    ) -> Result<V31Rewards, BuildError> {
        let creator = recipients
            .first()
            .ok_or_else(|| Self::unsupported("a creator reward recipient is required"))?;
        let interface = recipients.get(1).unwrap_or(creator);
        Ok(V31Rewards {
            creator_reward: u64::from(creator.bps),
            creator_vault: vault_for(vaults, creator.fee_preference)?,
            interface_vault: vault_for(vaults, interface.fee_preference)?,
        })
    }
}

struct V31Rewards {
    creator_reward: u64,
    creator_vault: Address,
    interface_vault: Address,
}

impl V31Rewards {
    /// `(creatorReward, creatorAdmin, creatorRewardRecipient, interfaceAdmin, interfaceRewardRecipient)`
    fn record(&self) -> AbiValue {
        AbiValue::Tuple(vec![
            AbiValue::uint(self.creator_reward),
            AbiValue::Address(self.creator_vault),
            AbiValue::Address(self.creator_vault),
            AbiValue::Address(self.interface_vault),
            AbiValue::Address(self.interface_vault),
        ])
    }
}

impl RecordSchema for V31Schema {
    fn version(&self) -> SchemaVersion {
        SchemaVersion::V3_1
    }

    fn check_supported(&self, intent: &DeploymentIntent) -> Result<(), BuildError> {
        Self::check_recipient_count(&intent.recipients)?;
        if intent.fee_policy != FeePolicy::default() {
            return Err(Self::unsupported("only the static 1% fee policy is available"));
        }
        if intent.positions.is_some() {
            return Err(Self::unsupported("custom liquidity positions are not available"));
        }
        if intent
            .vault
            .as_ref()
            .is_some_and(|vault| vault.vesting_seconds != 0)
        {
            return Err(Self::unsupported("vault vesting is not available"));
        }
        Ok(())
    }

    fn deploy_call(
        &self,
        network: &NetworkConfig,
        inputs: &DeployInputs<'_>,
    ) -> Result<EncodedCall, BuildError> {
        network.v3_1()?;
        let intent = inputs.intent;
        self.check_supported(intent)?;

        let token = AbiValue::Tuple(vec![
            AbiValue::string(intent.name.as_str()),
            AbiValue::string(intent.symbol.as_str()),
            AbiValue::bytes32(inputs.nonce),
            AbiValue::string(intent.image.as_str()),
            AbiValue::string(inputs.metadata),
            AbiValue::string(inputs.context),
            AbiValue::uint(intent.chain_id),
        ]);
        let vault = match &intent.vault {
            Some(vault) => AbiValue::Tuple(vec![
                AbiValue::uint(u64::from(vault.percentage)),
                AbiValue::uint(vault.lockup_seconds),
            ]),
            None => AbiValue::Tuple(vec![AbiValue::uint(0), AbiValue::uint(0)]),
        };
        let pool = AbiValue::Tuple(vec![
            AbiValue::Address(inputs.paired_asset),
            AbiValue::int(i64::from(intent.starting_tick())),
        ]);
        let minimum_out = intent
            .launch_buy
            .as_ref()
            .map(|launch_buy| launch_buy.minimum_tokens_out)
            .unwrap_or(U256::ZERO);
        let initial_buy = AbiValue::Tuple(vec![
            AbiValue::uint(V31_INITIAL_BUY_POOL_FEE),
            AbiValue::Uint(minimum_out),
        ]);
        let rewards = Self::rewards(&intent.recipients, inputs.vaults)?.record();

        let record = AbiValue::Tuple(vec![token, vault, pool, initial_buy, rewards]);
        Ok(EncodedCall::parse(V31_DEPLOY_SIGNATURE, vec![record])?)
    }

    fn initialize_tokenization_call(
        &self,
        request: &TokenizationRequest,
        paired_asset: Address,
        vaults: &BTreeMap<FeePreference, Address>,
    ) -> Result<EncodedCall, BuildError> {
        Self::check_recipient_count(&request.recipients)?;
        let rewards = Self::rewards(&request.recipients, vaults)?;
        let args = vec![
            AbiValue::Address(request.token),
            AbiValue::Address(paired_asset),
            AbiValue::Address(rewards.creator_vault),
            AbiValue::Address(rewards.creator_vault),
            AbiValue::uint(rewards.creator_reward),
            AbiValue::Address(rewards.interface_vault),
            AbiValue::Address(rewards.interface_vault),
        ];
        Ok(EncodedCall::parse(V31_INITIALIZE_SIGNATURE, args)?)
    }
}
