//! Retrofitting an existing token with vault fee sharing.
//!
//! The protocol is initialize, an out-of-band fee-admin handover to the
//! predicted vault, then finalize. Each step only produces a record for the
//! caller to submit; [`TokenizationCoordinator`] tracks which step is next.

use crate::config::NetworkConfig;
use crate::deploy::address::VaultResolver;
use crate::deploy::schema::schema_for;
use crate::deploy::validator::validate_recipients;
use crate::domain::errors::{BuildError, ConfigError, TokenizationError, TransitionError};
use crate::domain::state_machine::transition;
use crate::domain::types::{
    FinalizeTokenization, InitializeTokenization, PendingTokenization, TokenizationEvent,
    TokenizationRequest, TokenizationState,
};
use crate::features::evm::ContractReader;
use alloy_primitives::B256;
use canlog::{log, GetLogFilter, LogFilter, LogPriorityLevels};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, LogPriorityLevels)]
enum TokenizationLogPriority {
    #[log_level(capacity = 1000, name = "TOKENIZATION_INFO")]
    Info,
    #[log_level(capacity = 500, name = "TOKENIZATION_ERROR")]
    Error,
}

impl GetLogFilter for TokenizationLogPriority {
    fn get_log_filter() -> LogFilter {
        LogFilter::ShowAll
    }
}

/// Builds the initialize record. The handover target is the vault of the
/// first recipient's fee preference.
pub async fn build_initialize_tokenization(
    network: &NetworkConfig,
    reader: &dyn ContractReader,
    request: &TokenizationRequest,
) -> Result<InitializeTokenization, TokenizationError> {
    if request.chain_id != network.chain_id {
        return Err(BuildError::from(ConfigError::Invalid(format!(
            "request targets chain_id {} but network is chain_id {}",
            request.chain_id, network.chain_id
        )))
        .into());
    }
    validate_recipients(&request.recipients)?;
    let first = request
        .recipients
        .first()
        .ok_or_else(|| BuildError::UnsupportedBySchema {
            version: request.version,
            reason: "at least one reward recipient is required".to_string(),
        })?;

    let schema = schema_for(request.version);
    let tokenizer = network.tokenizer(request.version).map_err(BuildError::from)?;
    let vault_factory = network
        .vault_factory(request.version)
        .map_err(BuildError::from)?;
    let paired_asset = request.paired_asset.unwrap_or(network.paired_asset);

    let vaults = VaultResolver::new(vault_factory, reader)
        .resolve_all(request.token, paired_asset, &request.recipients)
        .await
        .map_err(BuildError::from)?;
    let predicted_vault = vaults
        .get(&first.fee_preference)
        .copied()
        .ok_or_else(|| BuildError::UnsupportedBySchema {
            version: request.version,
            reason: format!("no vault resolved for preference {}", first.fee_preference),
        })?;

    let call = schema.initialize_tokenization_call(request, paired_asset, &vaults)?;
    let calldata = call.calldata().map_err(BuildError::from)?;

    log!(
        TokenizationLogPriority::Info,
        "tokenization_initialize_built chain_id={} version={} token={:#x} predicted_vault={:#x}",
        request.chain_id,
        request.version,
        request.token,
        predicted_vault
    );

    Ok(InitializeTokenization {
        to: tokenizer,
        signature: call.signature(),
        record: call.record(),
        calldata,
        predicted_vault,
        vaults,
        pending: PendingTokenization {
            pending_id: None,
            predicted_vault,
            source_token: request.token,
            version: request.version,
        },
    })
}

/// Builds the finalize record. The pending id must have been attached from
/// the initialize receipt.
pub fn build_finalize_tokenization(
    network: &NetworkConfig,
    pending: &PendingTokenization,
) -> Result<FinalizeTokenization, TokenizationError> {
    let pending_id = pending
        .pending_id
        .ok_or(TokenizationError::UnresolvedPendingId {
            token: pending.source_token,
        })?;
    let tokenizer = network.tokenizer(pending.version).map_err(BuildError::from)?;
    let call = schema_for(pending.version).finalize_tokenization_call(pending_id)?;
    let calldata = call.calldata().map_err(BuildError::from)?;
    log!(
        TokenizationLogPriority::Info,
        "tokenization_finalize_built version={} token={:#x} pending_id={}",
        pending.version,
        pending.source_token,
        pending_id
    );
    Ok(FinalizeTokenization {
        to: tokenizer,
        signature: call.signature(),
        record: call.record(),
        calldata,
    })
}

/// Drives one tokenization flow through its states.
pub struct TokenizationCoordinator<'a> {
    network: &'a NetworkConfig,
    reader: &'a dyn ContractReader,
    state: TokenizationState,
}

impl<'a> TokenizationCoordinator<'a> {
    pub fn new(network: &'a NetworkConfig, reader: &'a dyn ContractReader) -> Self {
        Self {
            network,
            reader,
            state: TokenizationState::Uninitialized,
        }
    }

    pub fn state(&self) -> &TokenizationState {
        &self.state
    }

    /// The flow's handle while initialize has happened and finalize has not.
    pub fn pending(&self) -> Option<&PendingTokenization> {
        match &self.state {
            TokenizationState::PendingHandover(pending)
            | TokenizationState::ReadyToFinalize(pending) => Some(pending),
            TokenizationState::Uninitialized | TokenizationState::Finalized => None,
        }
    }

    fn rejected(&self, error: TransitionError) -> TokenizationError {
        log!(
            TokenizationLogPriority::Error,
            "tokenization_transition_rejected from={} event={} reason={}",
            error.from,
            error.event,
            error.reason
        );
        TokenizationError::from(error)
    }

    fn check(&self, event: &TokenizationEvent) -> Result<TokenizationState, TokenizationError> {
        transition(&self.state, event).map_err(|error| self.rejected(error))
    }

    fn apply(&mut self, event: TokenizationEvent) -> Result<(), TokenizationError> {
        let next = self.check(&event)?;
        log!(
            TokenizationLogPriority::Info,
            "tokenization_transition from={} to={}",
            self.state,
            next
        );
        self.state = next;
        Ok(())
    }

    pub async fn initialize(
        &mut self,
        request: &TokenizationRequest,
    ) -> Result<InitializeTokenization, TokenizationError> {
        if !matches!(self.state, TokenizationState::Uninitialized) {
            return Err(self.rejected(TransitionError {
                from: self.state.to_string(),
                event: "Initialized".to_string(),
                reason: "tokenization already initialized".to_string(),
            }));
        }
        let built = build_initialize_tokenization(self.network, self.reader, request).await?;
        self.apply(TokenizationEvent::Initialized(built.pending.clone()))?;
        Ok(built)
    }

    /// Attaches the on-chain handle read from the initialize receipt.
    pub fn record_pending_id(&mut self, pending_id: B256) -> Result<(), TokenizationError> {
        match &mut self.state {
            TokenizationState::PendingHandover(pending)
            | TokenizationState::ReadyToFinalize(pending) => {
                pending.pending_id = Some(pending_id);
                Ok(())
            }
            other => Err(TransitionError {
                from: other.to_string(),
                event: "RecordPendingId".to_string(),
                reason: "no tokenization is pending".to_string(),
            }
            .into()),
        }
    }

    /// Records the caller's assertion that fee-admin rights were handed to
    /// the predicted vault. Not verified on chain.
    pub fn confirm_handover(&mut self) -> Result<(), TokenizationError> {
        self.apply(TokenizationEvent::HandoverConfirmed)
    }

    pub fn finalize(&mut self) -> Result<FinalizeTokenization, TokenizationError> {
        self.check(&TokenizationEvent::Finalized)?;
        let pending = self.pending().cloned().ok_or_else(|| TransitionError {
            from: self.state.to_string(),
            event: "Finalized".to_string(),
            reason: "no tokenization is pending".to_string(),
        })?;
        let built = build_finalize_tokenization(self.network, &pending)?;
        self.apply(TokenizationEvent::Finalized)?;
        Ok(built)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::sample_network;
    use crate::deploy::abi::AbiValue;
    use crate::deploy::validator::tests::recipient;
    use crate::domain::errors::ValidationError;
    use crate::domain::types::{FeePreference, SchemaVersion};
    use crate::features::evm::MockContractReader;
    use alloy_primitives::Address;
    use futures::executor::block_on;

    fn request(version: SchemaVersion) -> TokenizationRequest {
        TokenizationRequest {
            chain_id: 8453,
            token: Address::repeat_byte(0x77),
            recipients: vec![
                recipient(1, 7_000, FeePreference::ProjectAsset),
                recipient(2, 3_000, FeePreference::Both),
            ],
            version,
            paired_asset: None,
        }
    }

    #[test]
    fn initialize_targets_first_recipients_vault() {
        let network = sample_network();
        let reader = MockContractReader::new();
        let built = block_on(build_initialize_tokenization(
            &network,
            &reader,
            &request(SchemaVersion::V4),
        ))
        .expect("initialize should build");

        assert_eq!(built.to, Address::repeat_byte(0x70));
        assert_eq!(built.predicted_vault, built.vaults[&FeePreference::ProjectAsset]);
        assert_eq!(built.pending.pending_id, None);
        assert_eq!(built.pending.source_token, Address::repeat_byte(0x77));
        assert_eq!(reader.call_count(), 2);

        let fields = built.record.items().expect("init tuple");
        assert_eq!(fields[0], AbiValue::Address(Address::repeat_byte(0x77)));
        assert_eq!(fields[1], AbiValue::Address(Address::repeat_byte(0x42)));
        assert_eq!(
            fields[2],
            AbiValue::addresses([
                built.vaults[&FeePreference::ProjectAsset],
                built.vaults[&FeePreference::Both],
            ])
        );
    }

    #[test]
    fn initialize_validates_recipients_before_reading() {
        let network = sample_network();
        let reader = MockContractReader::new();
        let mut bad = request(SchemaVersion::V4);
        bad.recipients[0].bps = 1;
        let err = block_on(build_initialize_tokenization(&network, &reader, &bad))
            .expect_err("bad split must fail");
        assert_eq!(
            err,
            TokenizationError::from(ValidationError::InvalidSplit { got: 3_001 })
        );
        assert_eq!(reader.call_count(), 0);
    }

    #[test]
    fn finalize_requires_resolved_pending_id() {
        let network = sample_network();
        let pending = PendingTokenization {
            pending_id: None,
            predicted_vault: Address::repeat_byte(0x11),
            source_token: Address::repeat_byte(0x77),
            version: SchemaVersion::V3_1,
        };
        assert_eq!(
            build_finalize_tokenization(&network, &pending),
            Err(TokenizationError::UnresolvedPendingId {
                token: Address::repeat_byte(0x77)
            })
        );

        let built = build_finalize_tokenization(&network, &pending.with_pending_id(B256::repeat_byte(0x05)))
            .expect("finalize should build");
        assert_eq!(built.to, Address::repeat_byte(0x71));
        assert_eq!(built.signature, "finalizeTokenization(bytes32)");
        assert_eq!(built.record, AbiValue::bytes32(B256::repeat_byte(0x05)));
        assert_eq!(built.calldata.len(), 36);
    }

    #[test]
    fn coordinator_walks_the_protocol_in_order() {
        let network = sample_network();
        let reader = MockContractReader::new();
        let mut coordinator = TokenizationCoordinator::new(&network, &reader);

        let err = coordinator.finalize().expect_err("finalize before initialize");
        assert!(matches!(err, TokenizationError::Transition(_)), "got {err:?}");
        assert!(coordinator.confirm_handover().is_err());

        let built = block_on(coordinator.initialize(&request(SchemaVersion::V4)))
            .expect("initialize");
        assert!(matches!(coordinator.state(), TokenizationState::PendingHandover(_)));
        let reads = reader.call_count();
        let err = block_on(coordinator.initialize(&request(SchemaVersion::V4)))
            .expect_err("second initialize must be rejected");
        assert!(matches!(err, TokenizationError::Transition(_)), "got {err:?}");
        assert_eq!(reader.call_count(), reads);
        assert_eq!(coordinator.pending(), Some(&built.pending));

        let err = coordinator.finalize().expect_err("finalize before handover");
        assert!(matches!(err, TokenizationError::Transition(_)), "got {err:?}");

        coordinator.confirm_handover().expect("handover");
        let err = coordinator
            .finalize()
            .expect_err("pending id must be attached first");
        assert_eq!(
            err,
            TokenizationError::UnresolvedPendingId {
                token: built.pending.source_token
            }
        );

        coordinator
            .record_pending_id(B256::repeat_byte(0x0a))
            .expect("pending id");
        coordinator.finalize().expect("finalize");
        assert_eq!(coordinator.state(), &TokenizationState::Finalized);
        assert!(coordinator.finalize().is_err());
        assert!(coordinator.record_pending_id(B256::ZERO).is_err());
    }
}
