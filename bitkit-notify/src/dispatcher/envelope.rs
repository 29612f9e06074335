//! Encrypted envelope as carried in the push transport's string map.

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::Value;

use super::notification::{DecryptedNotification, NotificationKind};
use crate::crypto::{self, KeyPair, SealedPayload};
use crate::errors::{CodecError, DecodeError};

pub const FIELD_CIPHER: &str = "cipher";
pub const FIELD_IV: &str = "iv";
pub const FIELD_TAG: &str = "tag";
pub const FIELD_PUBLIC_KEY: &str = "publicKey";
pub const FIELD_SOUND: &str = "sound";
pub const FIELD_TITLE: &str = "title";
pub const FIELD_MESSAGE: &str = "message";

/// Fields that must all be present for a message to count as encrypted.
pub const REQUIRED_FIELDS: [&str; 4] = [FIELD_CIPHER, FIELD_IV, FIELD_TAG, FIELD_PUBLIC_KEY];

/// Untrusted plaintext preview shipped next to the ciphertext.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Preview {
    pub title: Option<String>,
    pub body: Option<String>,
    pub sound: Option<String>,
}

/// Decoded (but still encrypted) notification envelope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedEnvelope {
    pub ciphertext: Vec<u8>,
    pub nonce: Vec<u8>,
    pub tag: Vec<u8>,
    /// Sender's compressed public key, hex.
    pub sender_public_key: String,
    pub clear_title: Option<String>,
    pub clear_body: Option<String>,
    pub clear_sound: Option<String>,
}

fn required<'a>(fields: &'a HashMap<String, String>, name: &str) -> Result<&'a str, DecodeError> {
    fields
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| DecodeError::Encoding(format!("missing field {name}")))
}

impl EncryptedEnvelope {
    /// Decode the transport fields: base64 `cipher`, hex `iv` and `tag`.
    pub fn from_fields(fields: &HashMap<String, String>) -> Result<Self, DecodeError> {
        let ciphertext = BASE64
            .decode(required(fields, FIELD_CIPHER)?.trim())
            .map_err(|e| DecodeError::Encoding(format!("{FIELD_CIPHER}: {e}")))?;
        let nonce = hex::decode(required(fields, FIELD_IV)?.trim())
            .map_err(|e| DecodeError::Encoding(format!("{FIELD_IV}: {e}")))?;
        let tag = hex::decode(required(fields, FIELD_TAG)?.trim())
            .map_err(|e| DecodeError::Encoding(format!("{FIELD_TAG}: {e}")))?;

        Ok(Self {
            ciphertext,
            nonce,
            tag,
            sender_public_key: required(fields, FIELD_PUBLIC_KEY)?.trim().to_string(),
            clear_title: fields.get(FIELD_TITLE).cloned(),
            clear_body: fields.get(FIELD_MESSAGE).cloned(),
            clear_sound: fields.get(FIELD_SOUND).cloned(),
        })
    }

    /// Encode back into the transport's string map.
    pub fn to_fields(&self) -> HashMap<String, String> {
        let mut fields = HashMap::from([
            (FIELD_CIPHER.to_string(), BASE64.encode(&self.ciphertext)),
            (FIELD_IV.to_string(), hex::encode(&self.nonce)),
            (FIELD_TAG.to_string(), hex::encode(&self.tag)),
            (FIELD_PUBLIC_KEY.to_string(), self.sender_public_key.clone()),
        ]);
        let optional = [
            (FIELD_TITLE, &self.clear_title),
            (FIELD_MESSAGE, &self.clear_body),
            (FIELD_SOUND, &self.clear_sound),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                fields.insert(name.to_string(), value.clone());
            }
        }
        fields
    }

    pub fn sealed(&self) -> SealedPayload {
        SealedPayload {
            ciphertext: self.ciphertext.clone(),
            nonce: self.nonce.clone(),
            tag: self.tag.clone(),
        }
    }

    /// Lock-screen preview. Carries no authenticity guarantee.
    pub fn preview(&self) -> Preview {
        Preview {
            title: self.clear_title.clone(),
            body: self.clear_body.clone(),
            sound: self.clear_sound.clone(),
        }
    }

    pub fn with_preview(mut self, preview: Preview) -> Self {
        self.clear_title = preview.title;
        self.clear_body = preview.body;
        self.clear_sound = preview.sound;
        self
    }
}

/// Encrypt a notification for a device, as the push server does.
///
/// A fresh ephemeral key pair is used per message; its public half travels
/// in `publicKey`.
pub fn seal_notification(
    kind: NotificationKind,
    payload: Value,
    recipient_public_hex: &str,
    domain_label: &str,
) -> Result<EncryptedEnvelope, CodecError> {
    let ephemeral = KeyPair::generate();
    seal_with_key(&ephemeral, kind, payload, recipient_public_hex, domain_label)
}

/// Like [`seal_notification`] with a caller-chosen sender key.
pub fn seal_with_key(
    sender: &KeyPair,
    kind: NotificationKind,
    payload: Value,
    recipient_public_hex: &str,
    domain_label: &str,
) -> Result<EncryptedEnvelope, CodecError> {
    let key = crypto::derive_key(sender.secret_key(), recipient_public_hex, domain_label)?;
    let document = DecryptedNotification::new(kind, payload).to_document();
    let sealed = crypto::encrypt(document.to_string().as_bytes(), &key)?;

    Ok(EncryptedEnvelope {
        ciphertext: sealed.ciphertext,
        nonce: sealed.nonce,
        tag: sealed.tag,
        sender_public_key: sender.public_hex(),
        clear_title: None,
        clear_body: None,
        clear_sound: None,
    })
}
