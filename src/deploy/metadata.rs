//! Compact JSON blobs embedded in the token config.

use crate::domain::errors::BuildError;
use crate::domain::types::{DeploymentContext, TokenMetadata};

/// `{"description":"","socialMediaUrls":[],"auditUrls":[]}` when absent.
pub fn metadata_json(metadata: Option<&TokenMetadata>) -> Result<String, BuildError> {
    let default = TokenMetadata::default();
    serde_json::to_string(metadata.unwrap_or(&default)).map_err(|error| BuildError::Metadata {
        field: "metadata",
        reason: error.to_string(),
    })
}

/// `{"interface":"fee-vault-launcher","platform":"","messageId":"","id":""}`
/// when absent. An empty interface falls back to the default.
pub fn context_json(context: Option<&DeploymentContext>) -> Result<String, BuildError> {
    let mut context = context.cloned().unwrap_or_default();
    if context.interface.trim().is_empty() {
        context.interface = crate::domain::types::default_interface();
    }
    serde_json::to_string(&context).map_err(|error| BuildError::Metadata {
        field: "context",
        reason: error.to_string(),
    })
}
