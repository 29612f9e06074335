//! Fixtures for dispatcher and wake tests.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::crypto::{KeyPair, NOTIFICATION_DOMAIN_LABEL};
use crate::dispatcher::{seal_notification, NotificationKind, Preview};
use crate::secure_storage::{
    ensure_device_keypair, InMemoryKeyStorage, StoredKeyProvider, DEFAULT_PRIVATE_KEY_ID,
};
use crate::wake::{ChannelDetails, NodeEvent};

/// A device with its notification key already provisioned.
pub struct TestDevice {
    pub storage: Arc<InMemoryKeyStorage>,
    pub keypair: KeyPair,
}

impl TestDevice {
    pub async fn new() -> Self {
        let storage = Arc::new(InMemoryKeyStorage::new());
        let keypair = ensure_device_keypair(storage.as_ref(), DEFAULT_PRIVATE_KEY_ID)
            .await
            .expect("in-memory storage never fails");
        Self { storage, keypair }
    }

    pub fn provider(&self) -> Arc<StoredKeyProvider<InMemoryKeyStorage>> {
        Arc::new(StoredKeyProvider::new(
            Arc::clone(&self.storage),
            DEFAULT_PRIVATE_KEY_ID,
        ))
    }

    /// Transport fields of a notification sealed for this device.
    pub fn sealed_fields(&self, kind: NotificationKind, payload: Value) -> HashMap<String, String> {
        sealed_fields_for(&self.keypair.public_hex(), kind, payload)
    }
}

/// Seal a notification for `recipient_hex` under the default domain label.
pub fn sealed_fields_for(
    recipient_hex: &str,
    kind: NotificationKind,
    payload: Value,
) -> HashMap<String, String> {
    seal_notification(kind, payload, recipient_hex, NOTIFICATION_DOMAIN_LABEL)
        .expect("recipient key is valid")
        .with_preview(Preview {
            title: Some("Bitkit".to_string()),
            body: Some("Open Bitkit to receive".to_string()),
            sound: Some("default".to_string()),
        })
        .to_fields()
}

pub fn channel(channel_id: &str, outbound_capacity_sats: u64) -> ChannelDetails {
    ChannelDetails {
        channel_id: channel_id.to_string(),
        outbound_capacity_msat: outbound_capacity_sats * 1000,
        inbound_capacity_msat: 0,
    }
}

pub fn payment_received(amount_sats: u64) -> NodeEvent {
    NodeEvent::PaymentReceived {
        amount_msat: amount_sats * 1000,
    }
}

pub fn channel_ready(channel_id: &str) -> NodeEvent {
    NodeEvent::ChannelReady {
        channel_id: channel_id.to_string(),
    }
}

pub fn channel_closed(reason: Option<&str>) -> NodeEvent {
    NodeEvent::ChannelClosed {
        channel_id: "closed-channel".to_string(),
        reason: reason.map(str::to_string),
    }
}
