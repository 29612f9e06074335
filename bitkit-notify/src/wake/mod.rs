//! Wallet node wake handling for decoded notifications.
//!
//! Given a [`DecryptedNotification`](crate::dispatcher::DecryptedNotification),
//! the [`WakeCoordinator`] starts the node, listens to its events for the
//! one the notification announced, and delivers exactly one local
//! notification before stopping the node again, within a single overall
//! deadline.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use bitkit_notify::wake::WakeCoordinator;
//!
//! let coordinator = WakeCoordinator::new(node, orders, presenter, config.wake.clone());
//! let outcome = coordinator.run_job(&job).await;
//! if let JobOutcome::Failure { reason } = outcome {
//!     runner.fail(reason);
//! }
//! ```

mod context;
mod coordinator;
mod delivery;
mod node;

pub use context::{BestAttempt, Reaction, WakeContext};
pub use coordinator::{JobOutcome, TerminalState, WakeCoordinator, WakeReport, WakeState};
pub use delivery::{Delivery, DeliveryGate, DeliveryTrigger};
pub use node::{
    ChannelDetails, EventSender, NodeEvent, NotificationPresenter, OrderService, WalletNode,
};
