//! In-memory secret store.
//!
//! For tests and the demo harness only. Lock poisoning is reported as an
//! error rather than a panic.

use std::collections::HashMap;
use std::sync::RwLock;

use zeroize::Zeroize;

use super::traits::{
    SecureKeyStorage, SecureStorageError, SecureStorageErrorCode, SecureStorageResult,
    StoreOptions,
};

/// In-memory implementation of secure key storage.
///
/// **Warning**: keys are not encrypted and are lost when the process exits.
#[derive(Default)]
pub struct InMemoryKeyStorage {
    keys: RwLock<HashMap<String, Vec<u8>>>,
}

fn lock_error(context: &str) -> SecureStorageError {
    SecureStorageError::new(
        SecureStorageErrorCode::Internal,
        format!("InMemoryKeyStorage: lock poisoned during {}", context),
    )
}

impl InMemoryKeyStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys (0 if the lock is poisoned).
    pub fn len(&self) -> usize {
        self.keys.read().map(|k| k.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SecureKeyStorage for InMemoryKeyStorage {
    async fn store(
        &self,
        key_id: &str,
        key_data: &[u8],
        options: StoreOptions,
    ) -> SecureStorageResult<()> {
        let mut keys = self.keys.write().map_err(|_| lock_error("store"))?;

        if keys.contains_key(key_id) && !options.overwrite {
            return Err(SecureStorageError::already_exists(key_id));
        }

        if let Some(mut old) = keys.insert(key_id.to_string(), key_data.to_vec()) {
            old.zeroize();
        }
        Ok(())
    }

    async fn retrieve(&self, key_id: &str) -> SecureStorageResult<Option<Vec<u8>>> {
        let keys = self.keys.read().map_err(|_| lock_error("retrieve"))?;
        Ok(keys.get(key_id).cloned())
    }

    async fn delete(&self, key_id: &str) -> SecureStorageResult<()> {
        let mut keys = self.keys.write().map_err(|_| lock_error("delete"))?;

        match keys.remove(key_id) {
            Some(mut data) => {
                data.zeroize();
                Ok(())
            }
            None => Err(SecureStorageError::not_found(key_id)),
        }
    }
}
