//! Error types for notification decoding and wake handling.
//!
//! Every failure in the pipeline is local to one push message: decoding
//! errors cause the message to be dropped, wake errors end the job with a
//! definite failure outcome. Nothing here is meant to cross a job boundary
//! as a panic.

use crate::secure_storage::SecureStorageError;

/// Error codes for FFI and mobile integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum NotifyErrorCode {
    /// Bad base64/hex, wrong field lengths or an invalid sender key
    Encoding = 1000,
    /// The device private key is not in the secure store
    MissingKey = 2000,
    /// The secure store itself failed
    KeyStore = 2001,
    /// AEAD tag did not verify
    Authentication = 3000,
    /// Plaintext was not a valid notification document
    Schema = 4000,
    /// Node failed to start or timed out while starting
    NodeStart = 5000,
    /// A node operation other than start failed
    Node = 5001,
    /// Follow-up action after start failed
    FollowUp = 6000,
    /// The overall job deadline expired
    Deadline = 7000,
    /// Invalid configuration
    Config = 8000,
}

/// Errors produced by the crypto codec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
    #[error("invalid private key")]
    InvalidPrivateKey,
    #[error("authentication failed")]
    AuthenticationFailed,
    #[error("malformed input: {0}")]
    MalformedInput(String),
}

/// Errors produced while decoding an encrypted push message.
///
/// All variants are terminal for the message: it is logged and dropped,
/// never retried.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("encoding error: {0}")]
    Encoding(String),
    #[error("notification private key not found: {0}")]
    MissingKey(String),
    #[error("secure store error: {0}")]
    KeyStore(#[from] SecureStorageError),
    #[error("notification failed authentication")]
    Authentication,
    #[error("invalid notification document: {0}")]
    Schema(String),
}

impl DecodeError {
    /// Get the error code for FFI/mobile integration.
    pub fn code(&self) -> NotifyErrorCode {
        match self {
            Self::Encoding(_) => NotifyErrorCode::Encoding,
            Self::MissingKey(_) => NotifyErrorCode::MissingKey,
            Self::KeyStore(_) => NotifyErrorCode::KeyStore,
            Self::Authentication => NotifyErrorCode::Authentication,
            Self::Schema(_) => NotifyErrorCode::Schema,
        }
    }
}

impl From<CodecError> for DecodeError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::AuthenticationFailed => Self::Authentication,
            CodecError::InvalidPublicKey(msg) => Self::Encoding(format!("publicKey: {msg}")),
            CodecError::InvalidPrivateKey => {
                Self::MissingKey("stored private key is not a valid secret key".into())
            }
            CodecError::MalformedInput(msg) => Self::Encoding(msg),
        }
    }
}

/// Errors reported by the wallet node or order service collaborators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NodeError {
    #[error("node failed to start: {0}")]
    Start(String),
    #[error("node start timed out after {0}ms")]
    StartTimeout(u64),
    #[error("node operation failed: {0}")]
    Operation(String),
    #[error("channel open failed: {0}")]
    ChannelOpen(String),
}

impl NodeError {
    /// Get the error code for FFI/mobile integration.
    pub fn code(&self) -> NotifyErrorCode {
        match self {
            Self::Start(_) | Self::StartTimeout(_) => NotifyErrorCode::NodeStart,
            Self::Operation(_) => NotifyErrorCode::Node,
            Self::ChannelOpen(_) => NotifyErrorCode::FollowUp,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
    #[error("node start timeout ({start_secs}s) exceeds the job deadline ({deadline_secs}s)")]
    StartExceedsDeadline { start_secs: u64, deadline_secs: u64 },
    #[error("{field} must be at most {max_secs}s, got {secs}s")]
    TooLarge {
        field: &'static str,
        secs: u64,
        max_secs: u64,
    },
    #[error("domain label must not be empty")]
    EmptyDomainLabel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_errors_map_to_decode_errors() {
        let err: DecodeError = CodecError::AuthenticationFailed.into();
        assert_eq!(err.code(), NotifyErrorCode::Authentication);

        let err: DecodeError = CodecError::InvalidPublicKey("bad point".into()).into();
        assert_eq!(err.code(), NotifyErrorCode::Encoding);
        assert!(err.to_string().contains("publicKey"));

        let err: DecodeError = CodecError::MalformedInput("tag length".into()).into();
        assert_eq!(err.code(), NotifyErrorCode::Encoding);
    }

    #[test]
    fn test_node_error_codes() {
        assert_eq!(NodeError::StartTimeout(500).code(), NotifyErrorCode::NodeStart);
        assert_eq!(
            NodeError::ChannelOpen("no route".into()).code(),
            NotifyErrorCode::FollowUp
        );
        assert!(NodeError::StartTimeout(500).to_string().contains("500ms"));
    }
}
