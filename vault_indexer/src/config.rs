//! Indexer configuration
//!
//! Fixed addresses, block cutovers and api versions of the individual vault
//! deployments. Handed to the [`Indexer`](crate::Indexer) at construction.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::{
    constants::DEFAULT_API_VERSION,
    entities::VaultClassification,
    utils::error::{IndexerError, IndexerResult},
};

/// Defaults used when a vault record is created without a registry event
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VaultOrigin {
    pub registry: Option<Address>,
    pub classification: VaultClassification,
    pub api_version: String,
}

impl Default for VaultOrigin {
    fn default() -> Self {
        Self {
            registry: None,
            classification: VaultClassification::Experimental,
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }
}

/// A single vault deployment with its own handlers
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    pub name: String,
    pub vault: Address,
    #[serde(default)]
    pub registry: Option<Address>,
    pub classification: VaultClassification,
    pub api_version: String,
    /// Block from which a successor contract takes over. Inputs at or past it are ignored.
    #[serde(default)]
    pub end_block: Option<u64>,
}

impl DeploymentConfig {
    pub fn origin(&self) -> VaultOrigin {
        VaultOrigin {
            registry: self.registry,
            classification: self.classification,
            api_version: self.api_version.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Register a dynamic source for every vault created from a registry event
    #[serde(default)]
    pub create_vault_templates: bool,
    #[serde(default)]
    pub deployments: Vec<DeploymentConfig>,
}

impl IndexerConfig {
    pub fn from_json<S: AsRef<str>>(json: S) -> IndexerResult<Self> {
        serde_json::from_str(json.as_ref())
            .map_err(|err| IndexerError::DecodingError(format!("Invalid indexer config: {}", err)))
    }

    /// Deployment configured for `vault`, if any
    pub fn deployment(&self, vault: &Address) -> Option<&DeploymentConfig> {
        self.deployments.iter().find(|d| d.vault == *vault)
    }

    /// Cutover block of the deployment handling `vault`
    pub fn end_block(&self, vault: &Address) -> Option<u64> {
        self.deployment(vault).and_then(|d| d.end_block)
    }

    /// Origin used to create `vault` on demand
    pub fn origin(&self, vault: &Address) -> VaultOrigin {
        self.deployment(vault)
            .map(DeploymentConfig::origin)
            .unwrap_or_default()
    }
}
