//! secp256k1 key pairs and ECDH key agreement.

use std::fmt;

use secp256k1::{PublicKey, Scalar, Secp256k1, SecretKey};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::CodecError;

/// Size of a private key in bytes.
pub const PRIVATE_KEY_SIZE: usize = 32;

/// Size of a compressed public key in bytes.
pub const PUBLIC_KEY_SIZE: usize = 33;

/// A device or ephemeral key pair on secp256k1.
#[derive(Clone)]
pub struct KeyPair {
    secret: SecretKey,
    public: PublicKey,
}

impl KeyPair {
    /// Generate a fresh key pair from the thread-local CSPRNG.
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret, public) = secp.generate_keypair(&mut rand::thread_rng());
        Self { secret, public }
    }

    /// Rebuild a key pair from 32 secret bytes.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() != PRIVATE_KEY_SIZE {
            return Err(CodecError::InvalidPrivateKey);
        }
        let secret = SecretKey::from_slice(bytes).map_err(|_| CodecError::InvalidPrivateKey)?;
        let public = PublicKey::from_secret_key(&Secp256k1::new(), &secret);
        Ok(Self { secret, public })
    }

    pub fn secret_key(&self) -> &SecretKey {
        &self.secret
    }

    /// Secret key bytes. SENSITIVE: store in the secure store only.
    pub fn secret_bytes(&self) -> [u8; PRIVATE_KEY_SIZE] {
        self.secret.secret_bytes()
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Compressed public key (33 bytes).
    pub fn public_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.public.serialize()
    }

    /// Compressed public key as lowercase hex, the form registered with the push server.
    pub fn public_hex(&self) -> String {
        hex::encode(self.public_bytes())
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public_hex())
            .finish_non_exhaustive()
    }
}

/// Raw ECDH product: the compressed point `private_local * public_remote`.
///
/// Never used directly as an encryption key outside the legacy path.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret([u8; PUBLIC_KEY_SIZE]);

impl SharedSecret {
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(..)")
    }
}

/// 32-byte symmetric key: `SHA-256(shared_secret || domain_label)`.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; 32]);

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}

/// Output of [`derive_shared_key`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SharedKey {
    /// No domain label given; the raw ECDH product (compat path).
    Raw(SharedSecret),
    /// Domain-separated symmetric key.
    Derived(DerivedKey),
}

/// Parse a hex-encoded compressed (or uncompressed) secp256k1 point.
pub fn parse_public_key_hex(public_key_hex: &str) -> Result<PublicKey, CodecError> {
    let bytes = hex::decode(public_key_hex.trim())
        .map_err(|e| CodecError::InvalidPublicKey(format!("invalid hex: {e}")))?;
    PublicKey::from_slice(&bytes).map_err(|e| CodecError::InvalidPublicKey(e.to_string()))
}

/// Compute the raw ECDH product of `private_key` and the peer's public key.
pub fn shared_secret(
    private_key: &SecretKey,
    peer_public_key_hex: &str,
) -> Result<SharedSecret, CodecError> {
    let peer = parse_public_key_hex(peer_public_key_hex)?;
    let point = peer
        .mul_tweak(&Secp256k1::new(), &Scalar::from(*private_key))
        .map_err(|e| CodecError::InvalidPublicKey(e.to_string()))?;
    Ok(SharedSecret(point.serialize()))
}

/// Hash a shared secret with a domain label into a symmetric key.
pub fn domain_separate(secret: &SharedSecret, domain_label: &str) -> DerivedKey {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(domain_label.as_bytes());
    DerivedKey(hasher.finalize().into())
}

/// ECDH followed by optional domain separation.
///
/// Symmetric: `derive_shared_key(sk_a, pk_b, d) == derive_shared_key(sk_b, pk_a, d)`.
pub fn derive_shared_key(
    private_key: &SecretKey,
    peer_public_key_hex: &str,
    domain_label: Option<&str>,
) -> Result<SharedKey, CodecError> {
    let secret = shared_secret(private_key, peer_public_key_hex)?;
    Ok(match domain_label {
        Some(label) => SharedKey::Derived(domain_separate(&secret, label)),
        None => SharedKey::Raw(secret),
    })
}

/// Shorthand for the domain-separated path, which is the only one used for notifications.
pub fn derive_key(
    private_key: &SecretKey,
    peer_public_key_hex: &str,
    domain_label: &str,
) -> Result<DerivedKey, CodecError> {
    let secret = shared_secret(private_key, peer_public_key_hex)?;
    Ok(domain_separate(&secret, domain_label))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_key_sizes() {
        let pair = KeyPair::generate();
        assert_eq!(pair.secret_bytes().len(), PRIVATE_KEY_SIZE);
        assert_eq!(pair.public_bytes().len(), PUBLIC_KEY_SIZE);
        assert!(matches!(pair.public_bytes()[0], 0x02 | 0x03));
        assert_eq!(pair.public_hex().len(), 66);
    }

    #[test]
    fn test_keypair_roundtrip_from_secret() {
        let pair = KeyPair::generate();
        let restored = KeyPair::from_secret_bytes(&pair.secret_bytes()).unwrap();
        assert_eq!(pair.public_hex(), restored.public_hex());
    }

    #[test]
    fn test_invalid_secret_rejected() {
        assert!(matches!(
            KeyPair::from_secret_bytes(&[0u8; 32]),
            Err(CodecError::InvalidPrivateKey)
        ));
        assert!(matches!(
            KeyPair::from_secret_bytes(&[1u8; 31]),
            Err(CodecError::InvalidPrivateKey)
        ));
    }

    #[test]
    fn test_ecdh_symmetry_with_label() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();

        let ab = derive_key(alice.secret_key(), &bob.public_hex(), "bitkit-notifications").unwrap();
        let ba = derive_key(bob.secret_key(), &alice.public_hex(), "bitkit-notifications").unwrap();
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_raw_path_without_label() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();

        let raw = derive_shared_key(alice.secret_key(), &bob.public_hex(), None).unwrap();
        let SharedKey::Raw(secret) = raw else {
            panic!("expected raw shared secret");
        };
        assert_eq!(secret.as_bytes().len(), PUBLIC_KEY_SIZE);
        assert_eq!(secret, shared_secret(bob.secret_key(), &alice.public_hex()).unwrap());
    }

    #[test]
    fn test_domain_label_changes_key() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();

        let one = derive_key(alice.secret_key(), &bob.public_hex(), "label-one").unwrap();
        let two = derive_key(alice.secret_key(), &bob.public_hex(), "label-two").unwrap();
        assert_ne!(one, two);
    }

    #[test]
    fn test_invalid_peer_key_rejected() {
        let alice = KeyPair::generate();

        let not_hex = derive_key(alice.secret_key(), "zz", "d");
        assert!(matches!(not_hex, Err(CodecError::InvalidPublicKey(_))));

        // Right length, not on the curve
        let off_curve = format!("02{}", "ff".repeat(32));
        let result = derive_key(alice.secret_key(), &off_curve, "d");
        assert!(matches!(result, Err(CodecError::InvalidPublicKey(_))));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let pair = KeyPair::generate();
        let secret_hex = hex::encode(pair.secret_bytes());
        assert!(!format!("{pair:?}").contains(&secret_hex));
    }
}
