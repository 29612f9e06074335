//! Core traits for the on-device secret store.

use std::fmt;
use std::future::Future;

/// Error codes for secure storage operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum SecureStorageErrorCode {
    /// Key not found
    NotFound = 1000,
    /// Access denied (device locked, auth required)
    AccessDenied = 2000,
    /// Key already exists
    AlreadyExists = 3000,
    /// Stored bytes are not a usable key
    InvalidKey = 4000,
    /// Internal error
    Internal = 9999,
}

/// Error type for secure storage operations.
#[derive(Debug)]
pub struct SecureStorageError {
    /// Error code for FFI/mobile integration
    pub code: SecureStorageErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Key identifier related to error (if applicable)
    pub key_id: Option<String>,
}

impl SecureStorageError {
    pub fn new(code: SecureStorageErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            key_id: None,
        }
    }

    pub fn not_found(key_id: impl Into<String>) -> Self {
        let key_id = key_id.into();
        Self {
            code: SecureStorageErrorCode::NotFound,
            message: format!("Key not found: {}", key_id),
            key_id: Some(key_id),
        }
    }

    pub fn already_exists(key_id: impl Into<String>) -> Self {
        let key_id = key_id.into();
        Self {
            code: SecureStorageErrorCode::AlreadyExists,
            message: format!("Key already exists: {}", key_id),
            key_id: Some(key_id),
        }
    }

    pub fn invalid_key(key_id: impl Into<String>, reason: impl fmt::Display) -> Self {
        let key_id = key_id.into();
        Self {
            code: SecureStorageErrorCode::InvalidKey,
            message: format!("Stored key is invalid: {}", reason),
            key_id: Some(key_id),
        }
    }

    pub fn access_denied(reason: impl Into<String>) -> Self {
        Self::new(SecureStorageErrorCode::AccessDenied, reason)
    }

    pub fn is_not_found(&self) -> bool {
        self.code == SecureStorageErrorCode::NotFound
    }
}

impl fmt::Display for SecureStorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(key_id) = &self.key_id {
            write!(f, "{} (key: {})", self.message, key_id)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for SecureStorageError {}

/// Result type for secure storage operations.
pub type SecureStorageResult<T> = Result<T, SecureStorageError>;

/// Options for storing a key.
#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    /// Overwrite if key already exists
    pub overwrite: bool,
}

impl StoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow overwriting existing keys.
    pub fn overwrite(mut self) -> Self {
        self.overwrite = true;
        self
    }
}

/// Platform-agnostic secret store (Keychain, Keystore, ...).
///
/// Implementations should:
/// - Encrypt keys at rest using platform-specific secure storage
/// - Never log or expose key material
pub trait SecureKeyStorage: Send + Sync {
    /// Store a key with the given identifier.
    ///
    /// # Errors
    /// - `AlreadyExists` if key exists and overwrite is false
    fn store(
        &self,
        key_id: &str,
        key_data: &[u8],
        options: StoreOptions,
    ) -> impl Future<Output = SecureStorageResult<()>> + Send;

    /// Retrieve a key by its identifier, or `None` if absent.
    fn retrieve(
        &self,
        key_id: &str,
    ) -> impl Future<Output = SecureStorageResult<Option<Vec<u8>>>> + Send;

    /// Delete a key by its identifier.
    ///
    /// # Errors
    /// - `NotFound` if key doesn't exist
    fn delete(&self, key_id: &str) -> impl Future<Output = SecureStorageResult<()>> + Send;

    /// Check if a key exists.
    fn exists(&self, key_id: &str) -> impl Future<Output = SecureStorageResult<bool>> + Send {
        async move { Ok(self.retrieve(key_id).await?.is_some()) }
    }
}
