//! # Core Codec Components
//!
//! Byte views, tags, token tables, and the binary node codec.
//!
//! ## Components
//! - **ByteView**: immutable, sliceable byte range shared by codec and framing
//! - **Tag / Tokens**: the closed tag set and the vocabulary tables
//! - **Decoder / Encoder**: schema-free conversion between bytes and [`node::Node`] trees
//!
//! ## Wire Format
//! ```text
//! [ListSize] [Description] ([Key] [Value])* [Content]?
//! ```
//!
//! ## Security
//! - Every read is bounds checked before it happens
//! - Nesting depth is capped to keep recursion bounded
//! - Allocation hints are clamped to the bytes actually remaining

pub mod bytes;
pub mod decoder;
pub mod encoder;
pub mod node;
pub mod tag;
pub mod tokens;
