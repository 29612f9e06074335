//! Encrypted push notifications for a self-custodial Lightning wallet.
//!
//! A push message may wake the app while it is in the background. If the
//! message is encrypted, the [`dispatcher`] decrypts it with the device key
//! and turns it into a deferred job; the [`wake`] coordinator then starts
//! the wallet node, waits for the event the notification announced and
//! shows exactly one local notification before stopping the node again.
//!
//! Platform concerns (keystore, node, OS notification API, LSP client) are
//! injected through traits so the pipeline can be driven by any host.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use bitkit_notify::prelude::*;
//!
//! let dispatcher = NotificationDispatcher::from_config(keys, &config);
//! if let Dispatch::Deferred { job, .. } = dispatcher.dispatch(&fields).await {
//!     let coordinator = WakeCoordinator::new(node, orders, presenter, config.wake.clone());
//!     let outcome = coordinator.run_job(&job).await;
//!     assert!(outcome.is_success());
//! }
//! ```

pub mod config;
pub mod crypto;
pub mod dispatcher;
pub mod errors;
pub mod prelude;
pub mod secure_storage;
pub mod wake;

/// Test doubles for the wake pipeline.
///
/// This module is only available with the `test-utils` feature or in test builds.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{NotifyConfig, WakeConfig};
pub use errors::{CodecError, ConfigError, DecodeError, NodeError, NotifyErrorCode};
