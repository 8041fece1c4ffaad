//! # Vault Factory
//!
//! Instantiates and records campaign vaults. Each creation builds an
//! uninitialized shell, initializes it with the supplied configuration
//! (which binds that vault's admin), and registers it under a fresh id.
//!
//! Deliberately thin: the factory has no invariants of its own beyond
//! unique ids. Everything interesting happens inside the vaults.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::vault::{CampaignVault, VaultConfig, VaultError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during factory operations.
#[derive(Debug, Error)]
pub enum FactoryError {
    /// The referenced vault does not exist.
    #[error("vault not found: {0}")]
    VaultNotFound(String),

    /// Vault creation failed (almost always a config rejection).
    #[error(transparent)]
    Vault(#[from] VaultError),
}

// ---------------------------------------------------------------------------
// VaultFactory
// ---------------------------------------------------------------------------

/// Registry of campaign vaults, keyed by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultFactory {
    /// The platform operator this factory was deployed for.
    operator: String,
    /// All vaults created through this factory.
    vaults: HashMap<String, CampaignVault>,
}

impl VaultFactory {
    /// Creates an empty factory bound to an operator address.
    pub fn new(operator: &str) -> Self {
        Self {
            operator: operator.to_string(),
            vaults: HashMap::new(),
        }
    }

    /// Returns the operator's address.
    pub fn operator(&self) -> &str {
        &self.operator
    }

    /// Creates, initializes, and registers a new vault.
    ///
    /// Returns the fresh vault id. The config's `admin` field binds that
    /// vault's admin — the factory operator holds no special power over
    /// individual vaults.
    ///
    /// # Errors
    ///
    /// Propagates the vault's config validation failure; nothing is
    /// registered on rejection.
    pub fn create_vault(&mut self, config: VaultConfig) -> Result<String, FactoryError> {
        let vault_id = Uuid::new_v4().to_string();
        let mut vault = CampaignVault::new(&vault_id);
        vault.initialize(config)?;

        self.vaults.insert(vault_id.clone(), vault);
        Ok(vault_id)
    }

    /// Looks up a vault by id.
    pub fn get(&self, vault_id: &str) -> Result<&CampaignVault, FactoryError> {
        self.vaults
            .get(vault_id)
            .ok_or_else(|| FactoryError::VaultNotFound(vault_id.to_string()))
    }

    /// Looks up a vault by id for mutation.
    pub fn get_mut(&mut self, vault_id: &str) -> Result<&mut CampaignVault, FactoryError> {
        self.vaults
            .get_mut(vault_id)
            .ok_or_else(|| FactoryError::VaultNotFound(vault_id.to_string()))
    }

    /// Number of registered vaults.
    pub fn vault_count(&self) -> usize {
        self.vaults.len()
    }

    /// Iterates all vaults as `(id, vault)` pairs.
    pub fn vaults(&self) -> impl Iterator<Item = (&String, &CampaignVault)> {
        self.vaults.iter()
    }
}
