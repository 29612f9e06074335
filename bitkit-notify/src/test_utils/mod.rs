//! Test doubles for the wake pipeline.
//!
//! Only available with the `test-utils` feature or in test builds.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use bitkit_notify::test_utils::{payment_received, MockNode, MockOrderService, RecordingPresenter};
//!
//! let node = Arc::new(MockNode::new().with_event(payment_received(21)));
//! let presenter = Arc::new(RecordingPresenter::new());
//! let coordinator = WakeCoordinator::new(
//!     node.clone(),
//!     Arc::new(MockOrderService::succeeding()),
//!     presenter.clone(),
//!     WakeConfig::default(),
//! );
//! ```

mod fixtures;
mod mock_node;

pub use fixtures::{
    channel, channel_closed, channel_ready, payment_received, sealed_fields_for, TestDevice,
};
pub use mock_node::{MockNode, MockOrderService, PresentedNotification, RecordingPresenter};
