//! Collaborators the wake coordinator drives: the wallet node, the LSP
//! order service and the OS notification presenter.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::errors::NodeError;

/// The subset of wallet node events relevant to wake handling.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeEvent {
    PaymentReceived {
        amount_msat: u64,
    },
    ChannelPending {
        #[serde(default)]
        channel_id: String,
    },
    ChannelReady {
        channel_id: String,
    },
    ChannelClosed {
        #[serde(default)]
        channel_id: String,
        #[serde(default)]
        reason: Option<String>,
    },
    PaymentSuccessful {
        #[serde(default)]
        payment_hash: Option<String>,
    },
    PaymentClaimable {
        #[serde(default)]
        amount_msat: u64,
    },
    PaymentFailed {
        #[serde(default)]
        reason: Option<String>,
    },
}

impl NodeEvent {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PaymentReceived { .. } => "PaymentReceived",
            Self::ChannelPending { .. } => "ChannelPending",
            Self::ChannelReady { .. } => "ChannelReady",
            Self::ChannelClosed { .. } => "ChannelClosed",
            Self::PaymentSuccessful { .. } => "PaymentSuccessful",
            Self::PaymentClaimable { .. } => "PaymentClaimable",
            Self::PaymentFailed { .. } => "PaymentFailed",
        }
    }
}

/// Channel as reported by the node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelDetails {
    pub channel_id: String,
    pub outbound_capacity_msat: u64,
    #[serde(default)]
    pub inbound_capacity_msat: u64,
}

impl ChannelDetails {
    /// Spendable balance in whole sats.
    pub fn outbound_capacity_sats(&self) -> u64 {
        self.outbound_capacity_msat / 1000
    }
}

/// Sending half of the node's event stream.
pub type EventSender = mpsc::UnboundedSender<NodeEvent>;

/// The wallet node. Starting it is what the push message is for.
#[async_trait]
pub trait WalletNode: Send + Sync {
    /// Start the node and begin emitting events on `events`.
    ///
    /// The node keeps the sender for as long as it runs; dropping it ends
    /// the stream.
    async fn start(&self, events: EventSender) -> Result<(), NodeError>;

    /// Stop the node. Called exactly once per job on the delivery path.
    async fn stop(&self) -> Result<(), NodeError>;

    async fn list_channels(&self) -> Result<Vec<ChannelDetails>, NodeError>;
}

/// LSP order service used after an `orderPaymentConfirmed` wake.
#[async_trait]
pub trait OrderService: Send + Sync {
    /// Ask the LSP to open the channel for a paid order.
    async fn open_channel(&self, order_id: &str) -> Result<(), NodeError>;
}

/// Pushes a local OS notification. Fire and forget.
pub trait NotificationPresenter: Send + Sync {
    fn present(&self, title: Option<&str>, body: Option<&str>, extras: &HashMap<String, String>);
}
