//! # Error Types
//!
//! Error handling for the binary node codec and the session controller.
//!
//! Every fallible operation in the crate returns [`Result`], whose error side is
//! [`ProtocolError`].
//!
//! ## Error Categories
//! - **Decode Errors**: truncated input, unknown tags, structurally invalid trees
//! - **Integrity Errors**: HMAC mismatches and cipher/padding failures
//! - **Handshake Errors**: rate limiting and unexpected status codes
//! - **Collaborator Errors**: transport, inner payload decoder, configuration
//!
//! Decode errors are always fatal to the single decode attempt that produced
//! them; a node either decodes completely or not at all.
//!
//! ## Example Usage
//! ```rust
//! use wa_session::core::bytes::ByteView;
//! use wa_session::core::decoder::BinaryDecoder;
//! use wa_session::error::ProtocolError;
//!
//! let err = BinaryDecoder::new()
//!     .decode(&ByteView::from_static(&[0xF8]))
//!     .unwrap_err();
//! assert!(matches!(err, ProtocolError::TruncatedInput { .. }));
//! ```

use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Decoder errors
    pub const ERR_EMPTY_LIST: &str = "Node list size is zero";
    pub const ERR_STREAM_END: &str = "Unexpected stream end tag";
    pub const ERR_NOT_A_LIST: &str = "Expected a list size tag";
    pub const ERR_NOT_BINARY: &str = "Expected a binary length tag";

    /// Frame errors
    pub const ERR_FRAME_NO_DELIMITER: &str = "Binary frame has no tag delimiter";
    pub const ERR_FRAME_HMAC: &str = "Binary frame HMAC validation failed";
    pub const ERR_PONG_FRAME: &str = "Keep-alive pong delivered as an application frame";

    /// Handshake errors
    pub const ERR_LOGIN_SECRET_TOO_SHORT: &str = "Login secret shorter than 64 bytes";
    pub const ERR_LOGIN_HMAC: &str = "Login secret HMAC validation failed";
    pub const ERR_LOGIN_KEYS_LENGTH: &str = "Decrypted key blob shorter than 64 bytes";

    /// State errors
    pub const ERR_NOT_LOGGED_IN: &str = "Binary message received before login";
    pub const ERR_NO_SESSION_KEYS: &str = "No session keys available";
}

/// ProtocolError is the primary error type for all codec and session operations
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Truncated input: needed {needed} bytes, {available} available")]
    TruncatedInput { needed: usize, available: usize },

    #[error("Malformed tag: {0:#04x}")]
    MalformedTag(u8),

    #[error("Malformed structure: {0}")]
    MalformedStructure(String),

    #[error("Range {start}..{end} out of bounds for length {len}")]
    OutOfBounds { start: usize, end: usize, len: usize },

    #[error("Integrity error: {0}")]
    IntegrityError(String),

    #[error("Decryption failed: invalid padding or ciphertext")]
    AuthOrPaddingError,

    #[error("Out of attempts to pair this client")]
    RateLimited,

    #[error("Unexpected status {status} during {step}")]
    ProtocolStatusError { step: &'static str, status: i64 },

    #[error("Invalid session state: {0}")]
    InvalidState(&'static str),

    #[error("Invalid key length: expected {expected}, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing field in response: {0}")]
    MissingField(String),

    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Inner payload error: {0}")]
    Payload(String),

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ProtocolError {
    /// Authentication-tag mismatches and cipher failures are the same class of failure.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(
            self,
            ProtocolError::IntegrityError(_) | ProtocolError::AuthOrPaddingError
        )
    }

    /// True for errors produced by the binary node codec.
    pub fn is_decode_failure(&self) -> bool {
        matches!(
            self,
            ProtocolError::TruncatedInput { .. }
                | ProtocolError::MalformedTag(_)
                | ProtocolError::MalformedStructure(_)
                | ProtocolError::Payload(_)
        )
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
