//! Error taxonomy for intent validation, encoding, address resolution and
//! record building.

use crate::domain::types::SchemaVersion;
use crate::features::evm::RpcError;
use thiserror::Error;

/// Deterministic input errors, detected before any network access.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("too many reward recipients: got {got}, max 7")]
    TooManyRecipients { got: usize },

    #[error("reward split must sum to 10000 bps, got {got}")]
    InvalidSplit { got: u64 },

    #[error("invalid pool geometry: {reason}")]
    InvalidPoolGeometry { reason: String },

    #[error("invalid vault config: {reason}")]
    InvalidVaultConfig { reason: String },

    #[error("invalid launch buy: {reason}")]
    InvalidLaunchBuy { reason: String },
}

/// Schema/value mismatches and malformed ABI data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("{field}: expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: String,
    },

    #[error("{field}: arity mismatch, expected {expected} got {got}")]
    Arity {
        field: String,
        expected: usize,
        got: usize,
    },

    #[error("{field}: value does not fit in {kind}")]
    OutOfRange { field: String, kind: String },

    #[error("unsupported abi type: {0}")]
    UnsupportedType(String),

    #[error("abi data out of bounds at offset {offset} (len {len})")]
    OutOfBounds { offset: usize, len: usize },

    #[error("non-canonical abi data: {0}")]
    NonCanonical(String),
}

/// Failure while reading a vault address from the factory.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error(transparent)]
    Call(#[from] RpcError),

    #[error("malformed vault address response: {0}")]
    MalformedResponse(EncodingError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no network configured for chain_id {0}")]
    UnknownChain(u64),

    #[error("chain_id {chain_id} has no {version} contracts configured")]
    MissingVersion {
        chain_id: u64,
        version: SchemaVersion,
    },

    #[error("invalid network config: {0}")]
    Invalid(String),

    #[error("failed to read network config: {0}")]
    Io(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{version} schema cannot express this intent: {reason}")]
    UnsupportedBySchema {
        version: SchemaVersion,
        reason: String,
    },

    #[error("failed to serialize {field}: {reason}")]
    Metadata { field: &'static str, reason: String },
}

/// Raised when a tokenization step is requested in the wrong state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid tokenization transition from {from} on {event}: {reason}")]
pub struct TransitionError {
    pub from: String,
    pub event: String,
    pub reason: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenizationError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("pending tokenization id for token {token} has not been resolved")]
    UnresolvedPendingId { token: alloy_primitives::Address },
}

impl From<ValidationError> for TokenizationError {
    fn from(error: ValidationError) -> Self {
        Self::Build(BuildError::Validation(error))
    }
}
