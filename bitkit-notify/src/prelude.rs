//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use bitkit_notify::prelude::*;
//! ```

// Configuration
pub use crate::config::{NotifyConfig, WakeConfig};

// Error handling
pub use crate::errors::{CodecError, ConfigError, DecodeError, NodeError, NotifyErrorCode};

// Key material
pub use crate::crypto::{KeyPair, NOTIFICATION_DOMAIN_LABEL};
pub use crate::secure_storage::{
    ensure_device_keypair, SecretKeyProvider, SecureKeyStorage, StoredKeyProvider,
    DEFAULT_PRIVATE_KEY_ID,
};

// Dispatch
pub use crate::dispatcher::{
    classify, DecryptedNotification, DeferredJob, Dispatch, MessageClass, NotificationDispatcher,
    NotificationKind,
};

// Wake handling
pub use crate::wake::{
    JobOutcome, NodeEvent, NotificationPresenter, OrderService, WakeCoordinator, WakeReport,
    WalletNode,
};
