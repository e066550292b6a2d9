//! # Collaborator Interfaces
//!
//! The session controller does not own a socket, build request bodies, or
//! interpret decoded trees. It talks to those concerns through the narrow
//! traits in this module.
//!
//! ## Components
//! - **Transport**: opens the socket, sends text/binary/ping, closes
//! - **RequestBuilder**: produces the opaque outbound JSON bodies
//! - **MessageDecoder**: decodes the inner payload of `message` nodes
//! - **SessionListener**: consumes decoded nodes and lifecycle notifications
//! - **ReconnectPolicy**: decides whether a server-side disconnect reconnects
//! - **Timers**: schedules keep-alive and pairing-expiry events
//!
//! Inbound transport callbacks and timer expirations are all expressed as
//! [`SessionEvent`] values delivered to one serialized handler.

use crate::core::bytes::ByteView;
use crate::core::node::Node;
use crate::error::Result;
use crate::protocol::keys::SessionKeys;
use bytes::Bytes;
use std::time::Duration;

/// Socket-level send and lifecycle primitives.
pub trait Transport: Send {
    /// Start connecting to `url`. Completion is reported with [`SessionEvent::Open`].
    fn open(&mut self, url: &str) -> Result<()>;

    fn send_text(&mut self, text: &str) -> Result<()>;

    fn send_binary(&mut self, payload: &[u8]) -> Result<()>;

    /// Transport-level ping used as keep-alive
    fn send_ping(&mut self) -> Result<()>;

    fn close(&mut self, reason: Option<&str>) -> Result<()>;
}

/// Inputs available to the request builder when it produces a body.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'a> {
    pub client_id: &'a str,
    pub identity_public: &'a [u8; 32],
    pub session: Option<&'a SessionKeys>,
}

/// Outbound handshake payloads. The bodies are opaque to the controller.
pub trait RequestBuilder: Send {
    fn initial(&self, ctx: &RequestContext<'_>) -> String;

    fn take_over(&self, ctx: &RequestContext<'_>) -> String;

    /// `signed` is the HMAC of the server challenge under the session MAC key
    fn solve_challenge(&self, ctx: &RequestContext<'_>, signed: &[u8]) -> String;

    fn logout(&self, ctx: &RequestContext<'_>) -> String;
}

/// Decoder for the inner payload carried by `message` nodes.
pub trait MessageDecoder: Send + Sync {
    fn decode_message(&self, payload: &ByteView) -> Result<serde_json::Value>;
}

/// Data a client needs to show the pairing QR code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingPayload {
    /// Server reference from the handshake response
    pub reference: String,
    /// Identity public key, base64
    pub public_key: String,
    pub client_id: String,
}

impl PairingPayload {
    /// Comma-joined text encoded into the QR code
    pub fn qr_content(&self) -> String {
        format!("{},{},{}", self.reference, self.public_key, self.client_id)
    }
}

/// Consumer of decoded nodes and session lifecycle notifications.
pub trait SessionListener: Send {
    /// A top-level node decoded from an authenticated frame
    fn on_node(&mut self, node: Node);

    fn on_connecting(&mut self) {}

    fn on_open(&mut self) {}

    /// The client must be paired; `payload` carries the QR content
    fn on_pairing(&mut self, _payload: &PairingPayload) {}

    fn on_logged_in(&mut self) {}

    fn on_close(&mut self) {}
}

/// Decides whether a server-initiated disconnect of `kind` reconnects.
pub trait ReconnectPolicy: Send + Sync {
    fn should_reconnect(&self, kind: &str) -> bool;
}

impl<F> ReconnectPolicy for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn should_reconnect(&self, kind: &str) -> bool {
        self(kind)
    }
}

/// Scheduler for the controller's timers.
///
/// Expirations must come back as [`SessionEvent::KeepAlive`] and
/// [`SessionEvent::PairingExpired`] on the controller's event queue.
pub trait Timers: Send {
    /// Start (or restart) the periodic keep-alive
    fn start_keep_alive(&mut self, interval: Duration);

    /// Start (or restart) the one-shot pairing expiry
    fn start_pairing_expiry(&mut self, ttl: Duration);

    fn cancel_pairing_expiry(&mut self);

    fn cancel_all(&mut self);
}

/// Everything that can drive the session state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Caller asks for a connection
    Connect,
    /// Transport finished opening
    Open,
    Text(String),
    Binary(Bytes),
    /// Transport closed by the remote end
    Closed,
    KeepAlive,
    PairingExpired,
    /// Caller asks to end the session
    Disconnect {
        reason: Option<String>,
        logout: bool,
        reconnect: bool,
    },
    /// Stop the event loop
    Shutdown,
}
