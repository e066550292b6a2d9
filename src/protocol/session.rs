//! Session controller state machine.
//!
//! One controller drives one session. Every input, whether it comes from the
//! transport, a timer, or the caller, arrives as a [`SessionEvent`] through
//! [`SessionController::handle`], so state and keys have a single writer.
//!
//! ```text
//! Idle --connect--> AwaitingHandshakeAck --text--> AwaitingPairing --login--> Authenticated
//!                                        \--text (restorable)--> AwaitingChallengeSolve
//!                                                 AwaitingChallengeSolve --200/405--> Authenticated
//!                                                 AwaitingChallengeSolve --challenge--> ChallengeSent --200--> Authenticated
//! ```

use crate::config::ClientConfig;
use crate::core::bytes::ByteView;
use crate::core::decoder::BinaryDecoder;
use crate::error::{constants, ProtocolError, Result};
use crate::protocol::frame;
use crate::protocol::handshake;
use crate::protocol::keys::{KeyStore, SessionKeys};
use crate::protocol::response::Response;
use crate::protocol::state::SessionState;
use crate::transport::{
    MessageDecoder, PairingPayload, ReconnectPolicy, RequestBuilder, RequestContext,
    SessionEvent, SessionListener, Timers, Transport,
};
use crate::utils::metrics::{Metrics, Timer};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Status codes that end a take-over successfully
const RESTORED: [i64; 2] = [200, 405];

/// Status codes meaning the persisted session keys were revoked
const KEYS_REVOKED: [i64; 3] = [401, 403, 409];

const RATE_LIMITED: i64 = 429;

/// Everything the controller talks to
pub struct Collaborators {
    pub transport: Box<dyn Transport>,
    pub requests: Box<dyn RequestBuilder>,
    pub key_store: Box<dyn KeyStore>,
    pub listener: Box<dyn SessionListener>,
    pub timers: Box<dyn Timers>,
    /// Defaults to the policy derived from [`ClientConfig`]
    pub reconnect_policy: Option<Arc<dyn ReconnectPolicy>>,
    /// Decoder for `message` node payloads; without one they stay binary
    pub message_decoder: Option<Arc<dyn MessageDecoder>>,
}

/// Handshake and frame processing for a single session
pub struct SessionController {
    config: ClientConfig,
    state: SessionState,
    keys: Option<SessionKeys>,
    transport: Box<dyn Transport>,
    requests: Box<dyn RequestBuilder>,
    key_store: Box<dyn KeyStore>,
    listener: Box<dyn SessionListener>,
    timers: Box<dyn Timers>,
    reconnect_policy: Arc<dyn ReconnectPolicy>,
    decoder: BinaryDecoder,
    metrics: Arc<Metrics>,
    consecutive_integrity_failures: u32,
}

impl SessionController {
    pub fn new(config: ClientConfig, collaborators: Collaborators) -> Self {
        let Collaborators {
            transport,
            requests,
            key_store,
            listener,
            timers,
            reconnect_policy,
            message_decoder,
        } = collaborators;

        let reconnect_policy = reconnect_policy.unwrap_or_else(|| config.reconnect_policy());
        let decoder = match message_decoder {
            Some(messages) => BinaryDecoder::with_message_decoder(messages),
            None => BinaryDecoder::new(),
        };
        let keys = key_store.session_keys().cloned();

        Self {
            config,
            state: SessionState::Idle,
            keys,
            transport,
            requests,
            key_store,
            listener,
            timers,
            reconnect_policy,
            decoder,
            metrics: Arc::new(Metrics::new()),
            consecutive_integrity_failures: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn session_keys(&self) -> Option<&SessionKeys> {
        self.keys.as_ref()
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Apply one event to the state machine
    pub fn handle(&mut self, event: SessionEvent) -> Result<()> {
        match event {
            SessionEvent::Connect => self.connect(),
            SessionEvent::Open => self.on_open(),
            SessionEvent::Text(text) => self.on_text(&text),
            SessionEvent::Binary(payload) => self.on_binary(ByteView::from(payload)),
            SessionEvent::Closed => {
                self.on_close();
                Ok(())
            }
            SessionEvent::KeepAlive => self.on_keep_alive(),
            SessionEvent::PairingExpired => self.on_pairing_expired(),
            SessionEvent::Disconnect {
                reason,
                logout,
                reconnect,
            } => self.disconnect(reason.as_deref(), logout, reconnect),
            SessionEvent::Shutdown => self.shutdown(),
        }
    }

    /// Open the transport and start the keep-alive.
    #[instrument(skip(self), fields(url = %self.config.url))]
    pub fn connect(&mut self) -> Result<()> {
        if self.state != SessionState::Idle {
            return Err(ProtocolError::InvalidState(
                "connect requested while a session is active",
            ));
        }

        self.keys = self.key_store.session_keys().cloned();
        self.consecutive_integrity_failures = 0;

        self.transport.open(&self.config.url)?;
        self.metrics.connection_opened();
        self.timers.start_keep_alive(self.config.keep_alive_interval);
        self.state = SessionState::AwaitingHandshakeAck;
        self.listener.on_connecting();

        info!("Connecting");
        Ok(())
    }

    /// Transport is open: send the initial handshake request.
    #[instrument(skip(self))]
    pub fn on_open(&mut self) -> Result<()> {
        if self.state != SessionState::AwaitingHandshakeAck {
            return Err(ProtocolError::InvalidState(
                "transport opened outside of a connection attempt",
            ));
        }

        let request = self.requests.initial(&self.context());
        self.transport.send_text(&request)?;
        self.metrics.handshake_attempt();
        self.listener.on_open();

        debug!("Handshake request sent");
        Ok(())
    }

    /// Route an inbound text frame by state.
    #[instrument(skip(self, text), fields(state = %self.state, len = text.len()))]
    pub fn on_text(&mut self, text: &str) -> Result<()> {
        match self.state {
            SessionState::Idle => {
                debug!("Ignoring text frame while idle");
                Ok(())
            }
            SessionState::AwaitingHandshakeAck => self.on_handshake_ack(text),
            SessionState::AwaitingPairing => self.on_login(text),
            SessionState::AwaitingChallengeSolve => self.on_challenge(text),
            SessionState::ChallengeSent => self.on_challenge_verdict(text),
            SessionState::Authenticated => self.on_server_command(text),
        }
    }

    /// Verify, decrypt, decode, and dispatch one binary frame.
    ///
    /// Integrity and decode failures drop the frame and are returned, but the
    /// session stays authenticated. Only a run of integrity failures reaching
    /// `max_consecutive_integrity_failures` forces a reconnect.
    #[instrument(skip(self, payload), fields(len = payload.len()))]
    pub fn on_binary(&mut self, payload: ByteView) -> Result<()> {
        if frame::is_keep_alive(&payload) {
            debug!("Ignoring keep-alive pong");
            return Ok(());
        }
        if self.state != SessionState::Authenticated {
            self.metrics.frame_dropped();
            return Err(ProtocolError::InvalidState(constants::ERR_NOT_LOGGED_IN));
        }
        let Some(keys) = self.keys.as_ref() else {
            self.metrics.frame_dropped();
            return Err(ProtocolError::InvalidState(constants::ERR_NO_SESSION_KEYS));
        };

        let _timer = Timer::start("frame_processing");
        self.metrics.frame_received(payload.len() as u64);

        let opened = match frame::open_frame(&payload, keys) {
            Ok(opened) => opened,
            Err(err) => return self.drop_frame(err),
        };
        let node = match self.decoder.decode(&opened.plaintext) {
            Ok(node) => node,
            Err(err) => return self.drop_frame(err),
        };

        self.consecutive_integrity_failures = 0;
        self.metrics.node_dispatched();
        debug!(description = node.description(), "Dispatching node");
        self.listener.on_node(node);
        Ok(())
    }

    /// The remote end closed the transport. No reconnect is attempted.
    pub fn on_close(&mut self) {
        self.timers.cancel_all();
        if self.state != SessionState::Idle {
            info!(state = %self.state, "Transport closed by remote");
            self.state = SessionState::Idle;
            self.listener.on_close();
        }
    }

    /// Send a transport ping. Failures are logged; a dead transport reports `Closed`.
    pub fn on_keep_alive(&mut self) -> Result<()> {
        if self.state == SessionState::Idle {
            return Ok(());
        }
        match self.transport.send_ping() {
            Ok(()) => self.metrics.ping_sent(),
            Err(err) => warn!(error = %err, "Keep-alive ping failed"),
        }
        Ok(())
    }

    /// The pairing QR code expired: start over with a fresh connection.
    pub fn on_pairing_expired(&mut self) -> Result<()> {
        if self.state != SessionState::AwaitingPairing {
            debug!(state = %self.state, "Stale pairing expiry");
            return Ok(());
        }
        info!("Pairing code expired, reconnecting");
        self.disconnect(None, false, true)
    }

    /// End the session.
    ///
    /// With `logout` the server is told (best effort) and the keys are reset.
    /// Timers are always cancelled and the transport closed before an
    /// optional reconnect.
    #[instrument(skip(self))]
    pub fn disconnect(&mut self, reason: Option<&str>, logout: bool, reconnect: bool) -> Result<()> {
        if logout {
            let request = self.requests.logout(&self.context());
            if let Err(err) = self.transport.send_text(&request) {
                warn!(error = %err, "Failed to send logout request");
            }
            self.reset_keys();
        }

        self.timers.cancel_all();
        if self.state != SessionState::Idle {
            if let Err(err) = self.transport.close(reason) {
                warn!(error = %err, "Failed to close transport");
            }
            self.state = SessionState::Idle;
            self.listener.on_close();
        }
        self.consecutive_integrity_failures = 0;
        info!(reason = reason.unwrap_or("none"), logout, reconnect, "Disconnected");

        if reconnect {
            self.metrics.reconnect();
            self.connect()?;
        }
        Ok(())
    }

    /// Close without reconnecting; no-op when already idle
    pub fn shutdown(&mut self) -> Result<()> {
        self.metrics.log_metrics();
        if self.state == SessionState::Idle {
            self.timers.cancel_all();
            return Ok(());
        }
        self.disconnect(None, false, false)
    }

    /// Drop in-memory session keys and reset the key store
    pub fn reset_keys(&mut self) {
        self.keys = None;
        self.key_store.reset();
        debug!("Session keys reset");
    }

    fn context(&self) -> RequestContext<'_> {
        RequestContext {
            client_id: self.key_store.client_id(),
            identity_public: self.key_store.identity().public_bytes(),
            session: self.keys.as_ref(),
        }
    }

    fn on_handshake_ack(&mut self, text: &str) -> Result<()> {
        if self.keys.is_some() && self.key_store.may_restore() {
            let request = self.requests.take_over(&self.context());
            self.transport.send_text(&request)?;
            self.state = SessionState::AwaitingChallengeSolve;
            debug!("Take-over request sent");
            return Ok(());
        }

        let response = Response::parse(text)?;
        if response.status() == Some(RATE_LIMITED) {
            self.metrics.handshake_failed();
            error!("Pairing rate limit reached");
            return Err(ProtocolError::RateLimited);
        }

        let ttl = response
            .ttl()
            .ok_or_else(|| ProtocolError::MissingField("ttl".into()))?;
        let pairing = PairingPayload {
            reference: response.required_string("ref")?.to_owned(),
            public_key: self.key_store.identity().public_base64(),
            client_id: self.key_store.client_id().to_owned(),
        };

        self.timers.start_pairing_expiry(Duration::from_millis(ttl));
        self.state = SessionState::AwaitingPairing;
        self.listener.on_pairing(&pairing);
        info!(ttl_ms = ttl, "Waiting for pairing");
        Ok(())
    }

    fn on_login(&mut self, text: &str) -> Result<()> {
        let response = Response::parse(text)?;
        if response.string("secret").is_none() {
            debug!("Ignoring non-login text while awaiting pairing");
            return Ok(());
        }

        let keys = match handshake::complete_login(self.key_store.identity(), &response) {
            Ok(keys) => keys,
            Err(err) => {
                self.metrics.handshake_failed();
                error!(error = %err, "Login key agreement failed");
                return Err(err);
            }
        };

        self.timers.cancel_pairing_expiry();
        self.key_store.store_session_keys(keys.clone());
        self.keys = Some(keys);
        self.logged_in();
        Ok(())
    }

    fn on_challenge(&mut self, text: &str) -> Result<()> {
        let response = Response::parse(text)?;
        match response.status() {
            Some(status) if RESTORED.contains(&status) => {
                self.logged_in();
                Ok(())
            }
            Some(status) if KEYS_REVOKED.contains(&status) => {
                warn!(status, "Session keys revoked, pairing again");
                self.metrics.handshake_failed();
                self.reset_keys();
                self.disconnect(None, false, true)
            }
            _ => {
                let keys = self
                    .keys
                    .as_ref()
                    .ok_or(ProtocolError::InvalidState(constants::ERR_NO_SESSION_KEYS))?;
                let signed = handshake::sign_challenge(&response, keys)?;
                let request = self.requests.solve_challenge(&self.context(), &signed);
                self.transport.send_text(&request)?;
                self.state = SessionState::ChallengeSent;
                debug!("Challenge solution sent");
                Ok(())
            }
        }
    }

    fn on_challenge_verdict(&mut self, text: &str) -> Result<()> {
        let status = Response::parse(text)?.status();
        if status == Some(200) {
            self.logged_in();
            return Ok(());
        }

        self.metrics.handshake_failed();
        self.reset_keys();
        error!(?status, "Challenge rejected");
        Err(ProtocolError::ProtocolStatusError {
            step: "challenge",
            status: status.unwrap_or(-1),
        })
    }

    fn on_server_command(&mut self, text: &str) -> Result<()> {
        let response = match Response::parse(text) {
            Ok(response) => response,
            Err(err) => {
                debug!(error = %err, "Ignoring unparseable text frame");
                return Ok(());
            }
        };
        let (Some(_), Some(kind)) = (response.string("type"), response.string("kind")) else {
            return Ok(());
        };

        let reconnect = self.reconnect_policy.should_reconnect(kind);
        info!(kind, reconnect, "Server ended the session");
        let kind = kind.to_owned();
        self.disconnect(Some(&kind), false, reconnect)
    }

    fn logged_in(&mut self) {
        self.state = SessionState::Authenticated;
        self.consecutive_integrity_failures = 0;
        self.metrics.handshake_success();
        self.listener.on_logged_in();
        info!("Logged in");
    }

    fn drop_frame(&mut self, err: ProtocolError) -> Result<()> {
        if err.is_integrity_failure() {
            self.metrics.integrity_failure();
            self.consecutive_integrity_failures += 1;
            warn!(
                error = %err,
                consecutive = self.consecutive_integrity_failures,
                "Dropping unauthenticated frame"
            );

            let limit = self.config.max_consecutive_integrity_failures;
            if limit > 0 && self.consecutive_integrity_failures >= limit {
                error!(limit, "Too many consecutive integrity failures, reconnecting");
                self.disconnect(Some("integrity"), false, true)?;
            }
        } else if err.is_decode_failure() {
            self.metrics.decode_failure();
            warn!(error = %err, "Dropping undecodable frame");
        } else {
            self.metrics.frame_dropped();
            warn!(error = %err, "Dropping frame");
        }
        Err(err)
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &self.state)
            .field("url", &self.config.url)
            .field("has_keys", &self.keys.is_some())
            .finish()
    }
}
