//! Secret storage for the device notification key.
//!
//! The dispatcher never talks to a platform keystore directly. It depends on
//! the [`SecretKeyProvider`] capability, which the app backs with whatever
//! [`SecureKeyStorage`] the platform offers (Keychain, Keystore, memory).
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use bitkit_notify::secure_storage::{ensure_device_keypair, InMemoryKeyStorage, StoredKeyProvider};
//!
//! let storage = Arc::new(InMemoryKeyStorage::new());
//!
//! // First launch: create the key and register its public half with the push server
//! let pair = ensure_device_keypair(storage.as_ref(), "push_notification_private_key").await?;
//! register_device(pair.public_hex());
//!
//! // Later, inside the push handler
//! let provider = StoredKeyProvider::new(storage, "push_notification_private_key");
//! ```

mod memory;
mod traits;

use std::sync::Arc;

use async_trait::async_trait;

use crate::crypto::KeyPair;

pub use memory::InMemoryKeyStorage;
pub use traits::{
    SecureKeyStorage, SecureStorageError, SecureStorageErrorCode, SecureStorageResult,
    StoreOptions,
};

/// Secure-store entry holding the device notification private key.
pub const DEFAULT_PRIVATE_KEY_ID: &str = "push_notification_private_key";

/// Capability to load the device's long-lived notification key.
///
/// `Ok(None)` means the key has never been created; it is a recoverable
/// condition, not a crash.
#[async_trait]
pub trait SecretKeyProvider: Send + Sync {
    async fn notification_key(&self) -> SecureStorageResult<Option<KeyPair>>;
}

/// [`SecretKeyProvider`] backed by a named entry in a [`SecureKeyStorage`].
pub struct StoredKeyProvider<S> {
    storage: Arc<S>,
    key_id: String,
}

impl<S: SecureKeyStorage> StoredKeyProvider<S> {
    pub fn new(storage: Arc<S>, key_id: impl Into<String>) -> Self {
        Self {
            storage,
            key_id: key_id.into(),
        }
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }
}

#[async_trait]
impl<S: SecureKeyStorage> SecretKeyProvider for StoredKeyProvider<S> {
    async fn notification_key(&self) -> SecureStorageResult<Option<KeyPair>> {
        load_keypair(self.storage.as_ref(), &self.key_id).await
    }
}

async fn load_keypair<S: SecureKeyStorage>(
    storage: &S,
    key_id: &str,
) -> SecureStorageResult<Option<KeyPair>> {
    match storage.retrieve(key_id).await? {
        Some(bytes) => KeyPair::from_secret_bytes(&bytes)
            .map(Some)
            .map_err(|e| SecureStorageError::invalid_key(key_id, e)),
        None => Ok(None),
    }
}

/// Load the device key pair, generating and persisting one on first use.
///
/// The returned public key is what the app registers with the push server.
pub async fn ensure_device_keypair<S: SecureKeyStorage>(
    storage: &S,
    key_id: &str,
) -> SecureStorageResult<KeyPair> {
    if let Some(existing) = load_keypair(storage, key_id).await? {
        return Ok(existing);
    }

    let pair = KeyPair::generate();
    storage
        .store(key_id, &pair.secret_bytes(), StoreOptions::new())
        .await?;
    tracing::info!(key_id, public_key = %pair.public_hex(), "generated notification key pair");
    Ok(pair)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ensure_keypair_is_stable() {
        let storage = InMemoryKeyStorage::new();

        let first = ensure_device_keypair(&storage, DEFAULT_PRIVATE_KEY_ID).await.unwrap();
        let second = ensure_device_keypair(&storage, DEFAULT_PRIVATE_KEY_ID).await.unwrap();

        assert_eq!(first.public_hex(), second.public_hex());
        assert_eq!(storage.len(), 1);
    }

    #[tokio::test]
    async fn test_provider_reports_missing_key() {
        let provider = StoredKeyProvider::new(Arc::new(InMemoryKeyStorage::new()), "absent");
        assert!(provider.notification_key().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_provider_rejects_corrupt_key() {
        let storage = Arc::new(InMemoryKeyStorage::new());
        storage
            .store("k", &[0u8; 5], StoreOptions::new())
            .await
            .unwrap();

        let provider = StoredKeyProvider::new(storage, "k");
        let err = provider.notification_key().await.unwrap_err();
        assert_eq!(err.code, SecureStorageErrorCode::InvalidKey);
    }
}
