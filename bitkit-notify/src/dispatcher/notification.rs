//! Typed notifications recovered from encrypted push messages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::DecodeError;

/// Closed set of notification kinds the push server sends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationKind {
    /// An HTLC is waiting for the node to come online and claim it.
    IncomingHtlc,
    /// A channel is being cooperatively closed.
    MutualClose,
    /// An LSP order was paid; the channel can now be opened.
    OrderPaymentConfirmed,
    /// A just-in-time channel was opened to deliver a payment.
    CjitPaymentArrived,
    /// Generic wake so a pending outgoing payment can resolve.
    WakeToTimeout,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 5] = [
        Self::IncomingHtlc,
        Self::MutualClose,
        Self::OrderPaymentConfirmed,
        Self::CjitPaymentArrived,
        Self::WakeToTimeout,
    ];

    /// Wire name, as used in the decrypted document and the job input.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IncomingHtlc => "incomingHtlc",
            Self::MutualClose => "mutualClose",
            Self::OrderPaymentConfirmed => "orderPaymentConfirmed",
            Self::CjitPaymentArrived => "cjitPaymentArrived",
            Self::WakeToTimeout => "wakeToTimeout",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown notification type: {s}"))
    }
}

/// A notification after successful decryption.
#[derive(Clone, Debug, PartialEq)]
pub struct DecryptedNotification {
    pub kind: NotificationKind,
    /// Always a JSON object; absent or null payloads become `{}`.
    pub payload: Value,
}

#[derive(Deserialize)]
struct NotificationDocument {
    #[serde(rename = "type", alias = "kind")]
    kind: NotificationKind,
    #[serde(default)]
    payload: Value,
}

impl DecryptedNotification {
    pub fn new(kind: NotificationKind, payload: Value) -> Self {
        let payload = match payload {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };
        Self { kind, payload }
    }

    /// Parse the decrypted document `{"type": ..., "payload": {...}}`.
    pub fn from_json(bytes: &[u8]) -> Result<Self, DecodeError> {
        let doc: NotificationDocument =
            serde_json::from_slice(bytes).map_err(|e| DecodeError::Schema(e.to_string()))?;

        match doc.payload {
            Value::Null | Value::Object(_) => Ok(Self::new(doc.kind, doc.payload)),
            other => Err(DecodeError::Schema(format!(
                "payload must be an object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    /// The document the push server encrypts for this notification.
    pub fn to_document(&self) -> Value {
        serde_json::json!({
            "type": self.kind,
            "payload": self.payload,
        })
    }

    /// String field of the payload, if present.
    pub fn payload_str(&self, field: &str) -> Option<&str> {
        self.payload.get(field).and_then(Value::as_str)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Input handed to the background job runner when the wake cannot run inline.
///
/// `type` is the kind's wire name and `payload` a JSON string, so the job
/// input survives runners that only carry flat string maps.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredJob {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: String,
}

impl DeferredJob {
    pub fn from_notification(notification: &DecryptedNotification) -> Self {
        Self {
            kind: notification.kind.as_str().to_string(),
            payload: notification.payload.to_string(),
        }
    }

    /// Recover the notification, or a failure reason for the job result.
    pub fn parse(&self) -> Result<DecryptedNotification, String> {
        let kind: NotificationKind = self.kind.parse()?;
        let payload: Value = serde_json::from_str(&self.payload)
            .map_err(|e| format!("payload is not valid JSON: {e}"))?;
        if !(payload.is_object() || payload.is_null()) {
            return Err(format!(
                "payload must be an object, got {}",
                json_type_name(&payload)
            ));
        }
        Ok(DecryptedNotification::new(kind, payload))
    }
}

impl From<&DecryptedNotification> for DeferredJob {
    fn from(notification: &DecryptedNotification) -> Self {
        Self::from_notification(notification)
    }
}
