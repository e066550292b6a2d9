//! # wa-session
//!
//! Client-side core of the legacy WhatsApp Web protocol: the binary node
//! codec, the crypto primitives of the login handshake, and the session
//! controller that authenticates and decrypts every frame after login.
//!
//! ## Layers
//! - [`core`]: byte views, tags, token tables, node encoder and decoder
//! - [`utils`]: crypto primitives, logging setup, metrics
//! - [`protocol`]: keys, handshake, framing, and the session state machine
//! - [`transport`]: collaborator traits the controller is wired to
//! - [`service`]: tokio event loop and timers
//!
//! ## Example
//! ```rust
//! use wa_session::core::bytes::ByteView;
//! use wa_session::core::decoder::BinaryDecoder;
//! use wa_session::core::encoder::encode;
//! use wa_session::core::node::Node;
//!
//! let node = Node::new("action")
//!     .with_attribute("type", "relay")
//!     .with_text("12@c.us");
//! let bytes = encode(&node).unwrap();
//! let decoded = BinaryDecoder::new().decode(&ByteView::from(bytes)).unwrap();
//! assert_eq!(decoded, node);
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod service;
pub mod transport;
pub mod utils;

pub use crate::config::{ClientConfig, LoggingConfig, SessionConfig};
pub use crate::core::bytes::ByteView;
pub use crate::core::node::{Node, NodeContent};
pub use crate::error::{ProtocolError, Result};
pub use crate::protocol::session::{Collaborators, SessionController};
pub use crate::protocol::state::SessionState;
pub use crate::service::driver::SessionDriver;
