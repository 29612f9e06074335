//! AES-256-GCM sealing for notification payloads.
//!
//! # Wire Format
//!
//! Ciphertext and tag travel as separate transport fields, never
//! concatenated:
//!
//! ```text
//! cipher = base64(ciphertext)   iv = hex(12-byte nonce)   tag = hex(16-byte tag)
//! ```
//!
//! No associated data is bound.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};

use super::keys::DerivedKey;
use crate::errors::CodecError;

/// Size of the nonce in bytes (96 bits for GCM).
pub const NONCE_SIZE: usize = 12;

/// Size of the authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Ciphertext, nonce and tag as three disjoint fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SealedPayload {
    pub ciphertext: Vec<u8>,
    pub nonce: Vec<u8>,
    pub tag: Vec<u8>,
}

/// Encrypt `plaintext` under `key` with a fresh random nonce.
pub fn encrypt(plaintext: &[u8], key: &DerivedKey) -> Result<SealedPayload, CodecError> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| CodecError::MalformedInput(e.to_string()))?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut nonce_bytes);

    let mut sealed = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|_| CodecError::MalformedInput("plaintext too large".into()))?;

    // aes-gcm appends the tag; split it back out for the wire
    let tag = sealed.split_off(sealed.len() - TAG_SIZE);

    Ok(SealedPayload {
        ciphertext: sealed,
        nonce: nonce_bytes.to_vec(),
        tag,
    })
}

/// Authenticated decryption. Returns the full plaintext or an error, never partial output.
pub fn decrypt(sealed: &SealedPayload, key: &DerivedKey) -> Result<Vec<u8>, CodecError> {
    if sealed.nonce.len() != NONCE_SIZE {
        return Err(CodecError::MalformedInput(format!(
            "nonce must be {NONCE_SIZE} bytes, got {}",
            sealed.nonce.len()
        )));
    }
    if sealed.tag.len() != TAG_SIZE {
        return Err(CodecError::MalformedInput(format!(
            "tag must be {TAG_SIZE} bytes, got {}",
            sealed.tag.len()
        )));
    }

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| CodecError::MalformedInput(e.to_string()))?;

    let mut combined = Vec::with_capacity(sealed.ciphertext.len() + TAG_SIZE);
    combined.extend_from_slice(&sealed.ciphertext);
    combined.extend_from_slice(&sealed.tag);

    cipher
        .decrypt(Nonce::from_slice(&sealed.nonce), combined.as_slice())
        .map_err(|_| CodecError::AuthenticationFailed)
}
