//! Deployment parameters and address prediction for fee-vault tokens.
//!
//! Validates a [`DeploymentIntent`], predicts the token's CREATE2 address and
//! the fee vaults its rewards pay into, and encodes the factory call. The
//! same vault resolution backs the initialize/finalize tokenization flow for
//! existing tokens. Nothing here signs or submits transactions.

pub mod config;
pub mod deploy;
pub mod domain;
pub mod features;

pub use crate::config::{NetworkConfig, NetworkRegistry, V31Contracts, V4Contracts};
pub use crate::deploy::{DeploymentBuilder, TokenizationCoordinator};
pub use crate::domain::errors::{
    BuildError, ConfigError, EncodingError, ResolutionError, TokenizationError, TransitionError,
    ValidationError,
};
pub use crate::domain::types::{
    DeploymentContext, DeploymentIntent, DeploymentPlan, FeePolicy, FeePreference,
    FinalizeTokenization, InitializeTokenization, LaunchBuyConfig, LiquidityPosition,
    PendingTokenization, PredictedAddresses, RewardRecipient, SchemaVersion, TokenMetadata,
    TokenizationRequest, TokenizationState, VaultLockConfig,
};
pub use crate::features::{ContractReader, HttpContractReader, MockContractReader, RpcError};

pub fn validate_intent(intent: &DeploymentIntent) -> Result<(), ValidationError> {
    deploy::validator::validate_intent(intent)
}

pub async fn build_deployment(
    network: &NetworkConfig,
    reader: &dyn ContractReader,
    intent: &DeploymentIntent,
) -> Result<DeploymentPlan, BuildError> {
    DeploymentBuilder::new(network, reader).build(intent).await
}

pub async fn build_initialize_tokenization(
    network: &NetworkConfig,
    reader: &dyn ContractReader,
    request: &TokenizationRequest,
) -> Result<InitializeTokenization, TokenizationError> {
    deploy::tokenization::build_initialize_tokenization(network, reader, request).await
}

pub fn build_finalize_tokenization(
    network: &NetworkConfig,
    pending: &PendingTokenization,
) -> Result<FinalizeTokenization, TokenizationError> {
    deploy::tokenization::build_finalize_tokenization(network, pending)
}
