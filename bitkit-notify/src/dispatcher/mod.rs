//! Inbound push message classification and decryption.
//!
//! A message is either *plain* (legacy, handled inline elsewhere) or
//! *encrypted*. Encrypted messages need a decrypt-then-wake sequence that
//! can run far longer than the transport's inline budget, so a successful
//! decode is turned into a [`DeferredJob`] for the background runner.
//!
//! Every decode failure is terminal for that message: it is logged and
//! dropped, and no job is scheduled.

mod envelope;
mod notification;

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::NotifyConfig;
use crate::crypto;
use crate::errors::DecodeError;
use crate::secure_storage::SecretKeyProvider;

pub use envelope::{
    seal_notification, seal_with_key, EncryptedEnvelope, Preview, FIELD_CIPHER, FIELD_IV,
    FIELD_MESSAGE, FIELD_PUBLIC_KEY, FIELD_SOUND, FIELD_TAG, FIELD_TITLE, REQUIRED_FIELDS,
};
pub use notification::{DecryptedNotification, DeferredJob, NotificationKind};

/// Binary classification of an inbound message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageClass {
    Plain,
    Encrypted,
}

/// What the push handler should do with a message.
#[derive(Debug)]
pub enum Dispatch {
    /// Not encrypted; left to the inline path.
    Plain,
    /// Decoded; hand this to the background job runner.
    Deferred {
        job: DeferredJob,
        preview: Preview,
    },
    /// Decode failed; the message is dropped.
    Dropped(DecodeError),
}

/// Encrypted iff all of `cipher`, `iv`, `tag` and `publicKey` are present.
pub fn classify(fields: &HashMap<String, String>) -> MessageClass {
    if REQUIRED_FIELDS.iter().all(|name| fields.contains_key(*name)) {
        MessageClass::Encrypted
    } else {
        MessageClass::Plain
    }
}

/// Decodes encrypted push messages with the device key.
pub struct NotificationDispatcher {
    keys: Arc<dyn SecretKeyProvider>,
    domain_label: String,
}

impl NotificationDispatcher {
    pub fn new(keys: Arc<dyn SecretKeyProvider>, domain_label: impl Into<String>) -> Self {
        Self {
            keys,
            domain_label: domain_label.into(),
        }
    }

    pub fn from_config(keys: Arc<dyn SecretKeyProvider>, config: &NotifyConfig) -> Self {
        Self::new(keys, config.domain_label.clone())
    }

    pub fn domain_label(&self) -> &str {
        &self.domain_label
    }

    /// Decode an encrypted message into a typed notification.
    pub async fn decode(
        &self,
        fields: &HashMap<String, String>,
    ) -> Result<DecryptedNotification, DecodeError> {
        let result = self.decode_inner(fields).await;
        match &result {
            Ok(notification) => {
                tracing::debug!(kind = %notification.kind, "decoded notification");
            }
            Err(err) => {
                tracing::warn!(code = ?err.code(), "dropping push message: {err}");
            }
        }
        result
    }

    async fn decode_inner(
        &self,
        fields: &HashMap<String, String>,
    ) -> Result<DecryptedNotification, DecodeError> {
        let envelope = EncryptedEnvelope::from_fields(fields)?;

        let device_key = self.keys.notification_key().await?.ok_or_else(|| {
            DecodeError::MissingKey("no notification key in the secure store".into())
        })?;

        let key = crypto::derive_key(
            device_key.secret_key(),
            &envelope.sender_public_key,
            &self.domain_label,
        )?;
        let plaintext = crypto::decrypt(&envelope.sealed(), &key)?;

        DecryptedNotification::from_json(&plaintext)
    }

    /// Classify, decode and route a message.
    pub async fn dispatch(&self, fields: &HashMap<String, String>) -> Dispatch {
        if classify(fields) == MessageClass::Plain {
            tracing::debug!("plain push message, leaving to inline handler");
            return Dispatch::Plain;
        }

        match self.decode(fields).await {
            Ok(notification) => {
                let preview = EncryptedEnvelope::from_fields(fields)
                    .map(|envelope| envelope.preview())
                    .unwrap_or_default();
                tracing::info!(kind = %notification.kind, "scheduling wake job");
                Dispatch::Deferred {
                    job: DeferredJob::from(&notification),
                    preview,
                }
            }
            Err(err) => Dispatch::Dropped(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(names: &[&str]) -> HashMap<String, String> {
        names
            .iter()
            .map(|name| (name.to_string(), String::new()))
            .collect()
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            classify(&fields(&["cipher", "iv", "tag", "publicKey"])),
            MessageClass::Encrypted
        );
        assert_eq!(
            classify(&fields(&["cipher", "iv", "tag", "publicKey", "title", "sound"])),
            MessageClass::Encrypted
        );
        assert_eq!(classify(&fields(&["cipher", "iv", "tag"])), MessageClass::Plain);
        assert_eq!(classify(&fields(&["title", "message"])), MessageClass::Plain);
        assert_eq!(classify(&HashMap::new()), MessageClass::Plain);
    }
}
