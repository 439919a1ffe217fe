//! In-memory token storage.
//!
//! Simple `HashMap`-backed implementation for unit and integration tests.
//! Tokens are stored in plain text; do NOT use in production.

use crate::error::Result;
use crate::storage::{OwnerIdentity, TokenRecord, TokenStorage};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory token storage for testing.
#[derive(Clone, Default)]
pub struct MemoryTokenStorage {
    records: Arc<Mutex<HashMap<OwnerIdentity, TokenRecord>>>,
}

impl MemoryTokenStorage {
    /// Create a new empty in-memory token storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStorage for MemoryTokenStorage {
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    #[allow(clippy::unwrap_used)] // Test store: mutex poisoning is a test failure
    async fn store(&self, owner: &OwnerIdentity, token: &TokenRecord) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        records.insert(owner.clone(), token.clone());
        Ok(())
    }

    #[allow(clippy::unwrap_used)] // Test store: mutex poisoning is a test failure
    async fn get(&self, owner: &OwnerIdentity) -> Result<Option<TokenRecord>> {
        let records = self.records.lock().unwrap();
        Ok(records.get(owner).cloned())
    }

    #[allow(clippy::unwrap_used)] // Test store: mutex poisoning is a test failure
    async fn delete(&self, owner: &OwnerIdentity) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        records.remove(owner);
        Ok(())
    }
}
