//! In-memory key-value flag store.

use std::collections::HashMap;

use async_trait::async_trait;
use content_core::{FlagError, FlagStore};
use tokio::sync::RwLock;

/// A [`FlagStore`] backed by a map. Missing keys read as `false`.
#[derive(Debug, Default)]
pub struct MemoryFlags {
    flags: RwLock<HashMap<String, bool>>,
}

impl MemoryFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a flag, bypassing the port.
    pub async fn seed(&self, key: &str, value: bool) {
        self.flags.write().await.insert(key.to_string(), value);
    }
}

#[async_trait]
impl FlagStore for MemoryFlags {
    async fn get_flag(&self, key: &str) -> Result<bool, FlagError> {
        Ok(self.flags.read().await.get(key).copied().unwrap_or(false))
    }

    async fn set_flag(&self, key: &str, value: bool) -> Result<(), FlagError> {
        self.flags.write().await.insert(key.to_string(), value);
        Ok(())
    }
}
