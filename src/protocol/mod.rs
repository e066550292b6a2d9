//! # Session Protocol
//!
//! Handshake, key management, and authenticated framing for the legacy web
//! protocol, tied together by the [`session::SessionController`] state machine.
//!
//! ## Components
//! - **Keys**: identity key pair, derived session keys, key store
//! - **Response**: parsing of inbound JSON text frames
//! - **Handshake**: login key agreement and challenge signing
//! - **Frame**: HMAC verification and decryption of binary frames
//! - **Session**: the state machine consuming [`crate::transport::SessionEvent`]s
//!
//! ## Security
//! - HMAC verification happens before any decryption
//! - Session keys are zeroized on drop and redacted from debug output
//! - Revoked keys are reset before any reconnect

pub mod frame;
pub mod handshake;
pub mod keys;
pub mod response;
pub mod session;
pub mod state;
