//! # Utility Modules
//!
//! Supporting utilities for cryptography, logging, and metrics.
//!
//! ## Components
//! - **Crypto**: X25519, HKDF-SHA256, HMAC-SHA256, AES-256-CBC
//! - **Logging**: Structured logging configuration
//! - **Metrics**: Thread-safe per-session counters
//!
//! ## Security
//! - HMAC tags are compared in constant time
//! - Derived key material is zeroized on drop (zeroize crate)

pub mod crypto;
pub mod logging;
pub mod metrics;

pub use metrics::{Metrics, MetricsSnapshot};
