use crate::config::NetworkConfig;
use crate::deploy::address::{
    derive_salt, generate_nonce, predict_deploy_address, token_init_code_hash, VaultResolver,
};
use crate::deploy::metadata::{context_json, metadata_json};
use crate::deploy::schema::{schema_for, token_constructor, DeployInputs};
use crate::deploy::validator::validate_intent;
use crate::domain::errors::{BuildError, ConfigError};
use crate::domain::types::{DeploymentIntent, DeploymentPlan, PredictedAddresses};
use crate::features::evm::ContractReader;
use alloy_primitives::U256;
use canlog::{log, GetLogFilter, LogFilter, LogPriorityLevels};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, LogPriorityLevels)]
enum BuilderLogPriority {
    #[log_level(capacity = 1000, name = "BUILDER_INFO")]
    Info,
    #[log_level(capacity = 500, name = "BUILDER_ERROR")]
    Error,
}

impl GetLogFilter for BuilderLogPriority {
    fn get_log_filter() -> LogFilter {
        LogFilter::ShowAll
    }
}

/// Turns a [`DeploymentIntent`] into a submit-ready [`DeploymentPlan`].
pub struct DeploymentBuilder<'a> {
    network: &'a NetworkConfig,
    reader: &'a dyn ContractReader,
}

impl<'a> DeploymentBuilder<'a> {
    pub fn new(network: &'a NetworkConfig, reader: &'a dyn ContractReader) -> Self {
        Self { network, reader }
    }

    pub async fn build(&self, intent: &DeploymentIntent) -> Result<DeploymentPlan, BuildError> {
        let result = self.build_inner(intent).await;
        if let Err(error) = &result {
            log!(
                BuilderLogPriority::Error,
                "deployment_build_failed chain_id={} version={} symbol={} error={}",
                intent.chain_id,
                intent.version,
                intent.symbol,
                error
            );
        }
        result
    }

    async fn build_inner(&self, intent: &DeploymentIntent) -> Result<DeploymentPlan, BuildError> {
        if intent.chain_id != self.network.chain_id {
            return Err(ConfigError::Invalid(format!(
                "intent targets chain_id {} but network is chain_id {}",
                intent.chain_id, self.network.chain_id
            ))
            .into());
        }
        validate_intent(intent)?;

        let schema = schema_for(intent.version);
        schema.check_supported(intent)?;
        let factory = self.network.factory(intent.version)?;
        let vault_factory = self.network.vault_factory(intent.version)?;
        let creation_code = self.network.token_creation_code(intent.version)?;
        let paired_asset = intent.paired_asset.unwrap_or(self.network.paired_asset);

        log!(
            BuilderLogPriority::Info,
            "deployment_build_start chain_id={} version={} symbol={} recipients={}",
            intent.chain_id,
            intent.version,
            intent.symbol,
            intent.recipients.len()
        );

        let metadata = metadata_json(intent.metadata.as_ref())?;
        let context = context_json(intent.context.as_ref())?;

        let nonce = intent.nonce.unwrap_or_else(generate_nonce);
        let salt = derive_salt(intent.admin, nonce);
        let (constructor_types, constructor_args) = token_constructor(intent, &metadata, &context)?;
        let init_code_hash =
            token_init_code_hash(creation_code, &constructor_types, &constructor_args)?;
        let token = predict_deploy_address(factory, init_code_hash, salt);

        let vaults = VaultResolver::new(vault_factory, self.reader)
            .resolve_all(token, paired_asset, &intent.recipients)
            .await?;

        let call = schema.deploy_call(
            self.network,
            &DeployInputs {
                intent,
                paired_asset,
                nonce,
                vaults: &vaults,
                metadata: &metadata,
                context: &context,
            },
        )?;
        let calldata = call.calldata()?;
        let native_value = intent
            .launch_buy
            .as_ref()
            .map(|launch_buy| launch_buy.native_amount)
            .unwrap_or(U256::ZERO);

        log!(
            BuilderLogPriority::Info,
            "deployment_plan_ready chain_id={} version={} token={:#x} vaults={} calldata_bytes={} native_value={}",
            intent.chain_id,
            intent.version,
            token,
            vaults.len(),
            calldata.len(),
            native_value
        );

        Ok(DeploymentPlan {
            version: intent.version,
            to: factory,
            signature: call.signature(),
            record: call.record(),
            calldata,
            native_value,
            predicted: PredictedAddresses { token, vaults },
            nonce,
            salt,
        })
    }
}
