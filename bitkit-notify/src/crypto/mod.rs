//! Crypto codec for push notifications.
//!
//! Ephemeral-static ECDH on secp256k1, a SHA-256 domain-separated key
//! derivation, and AES-256-GCM with the tag carried separately.
//!
//! # Security Properties
//!
//! - **Key agreement**: both ends derive the same key from their own private
//!   key and the other side's public key
//! - **Domain separation**: the label keeps notification keys distinct from
//!   any other use of the same ECDH product
//! - **Integrity**: the GCM tag is verified before any plaintext is returned
//! - **Unique nonces**: a random 96-bit nonce per encryption

mod aead;
mod keys;

pub use aead::{decrypt, encrypt, SealedPayload, NONCE_SIZE, TAG_SIZE};
pub use keys::{
    derive_key, derive_shared_key, domain_separate, parse_public_key_hex, shared_secret,
    DerivedKey, KeyPair, SharedKey, SharedSecret, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE,
};

/// Domain label mixed into every notification key.
pub const NOTIFICATION_DOMAIN_LABEL: &str = "bitkit-notifications";

/// Generate a new key pair. Alias kept for callers that think in codec terms.
pub fn generate_key_pair() -> KeyPair {
    KeyPair::generate()
}
