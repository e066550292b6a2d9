//! # Session Service
//!
//! Async runtime glue: the tokio event loop that owns a session controller
//! and the timers that feed it.

pub mod driver;

pub use driver::{event_channel, EventSender, SessionDriver, TokioTimers};
