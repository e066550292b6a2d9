//! Session controller state machine driven through recording collaborators

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use bytes::Bytes;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wa_session::config::ClientConfig;
use wa_session::core::bytes::ByteView;
use wa_session::core::encoder::encode;
use wa_session::core::node::Node;
use wa_session::error::{ProtocolError, Result};
use wa_session::protocol::frame::seal_frame;
use wa_session::protocol::handshake::seal_login_secret;
use wa_session::protocol::keys::{IdentityKeys, KeyStore, MemoryKeyStore, SessionKeys};
use wa_session::protocol::session::{Collaborators, SessionController};
use wa_session::protocol::state::SessionState;
use wa_session::service::driver::{event_channel, SessionDriver, TokioTimers};
use wa_session::transport::{
    PairingPayload, RequestBuilder, RequestContext, SessionEvent, SessionListener, Timers,
    Transport,
};
use wa_session::utils::crypto;
use x25519_dalek::StaticSecret;

const ENC_KEY: [u8; 32] = [0x61; 32];
const MAC_KEY: [u8; 32] = [0x62; 32];
const CLIENT_ID: &str = "Y2xpZW50LWlk";

#[derive(Default)]
struct Log {
    opened: Vec<String>,
    texts: Vec<String>,
    pings: usize,
    closed: Vec<Option<String>>,
    nodes: Vec<Node>,
    lifecycle: Vec<&'static str>,
    pairings: Vec<PairingPayload>,
    keep_alive: Vec<Duration>,
    pairing_timers: Vec<Duration>,
    pairing_cancels: usize,
    cancels: usize,
}

type Shared = Arc<Mutex<Log>>;

struct RecordingTransport {
    log: Shared,
    fail_ping: bool,
}

impl Transport for RecordingTransport {
    fn open(&mut self, url: &str) -> Result<()> {
        self.log.lock().unwrap().opened.push(url.to_owned());
        Ok(())
    }

    fn send_text(&mut self, text: &str) -> Result<()> {
        self.log.lock().unwrap().texts.push(text.to_owned());
        Ok(())
    }

    fn send_binary(&mut self, _payload: &[u8]) -> Result<()> {
        Ok(())
    }

    fn send_ping(&mut self) -> Result<()> {
        if self.fail_ping {
            return Err(ProtocolError::ConnectionClosed);
        }
        self.log.lock().unwrap().pings += 1;
        Ok(())
    }

    fn close(&mut self, reason: Option<&str>) -> Result<()> {
        self.log.lock().unwrap().closed.push(reason.map(str::to_owned));
        Ok(())
    }
}

struct Requests;

impl RequestBuilder for Requests {
    fn initial(&self, ctx: &RequestContext<'_>) -> String {
        format!("init:{}", ctx.client_id)
    }

    fn take_over(&self, ctx: &RequestContext<'_>) -> String {
        let token = ctx.session.map(|s| s.server_token.clone()).unwrap_or_default();
        format!("takeover:{token}")
    }

    fn solve_challenge(&self, _ctx: &RequestContext<'_>, signed: &[u8]) -> String {
        format!("solve:{}", ByteView::from(signed).to_base64())
    }

    fn logout(&self, _ctx: &RequestContext<'_>) -> String {
        "logout".to_owned()
    }
}

struct RecordingListener(Shared);

impl SessionListener for RecordingListener {
    fn on_node(&mut self, node: Node) {
        self.0.lock().unwrap().nodes.push(node);
    }

    fn on_connecting(&mut self) {
        self.0.lock().unwrap().lifecycle.push("connecting");
    }

    fn on_open(&mut self) {
        self.0.lock().unwrap().lifecycle.push("open");
    }

    fn on_pairing(&mut self, payload: &PairingPayload) {
        let mut log = self.0.lock().unwrap();
        log.lifecycle.push("pairing");
        log.pairings.push(payload.clone());
    }

    fn on_logged_in(&mut self) {
        self.0.lock().unwrap().lifecycle.push("logged_in");
    }

    fn on_close(&mut self) {
        self.0.lock().unwrap().lifecycle.push("close");
    }
}

struct RecordingTimers(Shared);

impl Timers for RecordingTimers {
    fn start_keep_alive(&mut self, interval: Duration) {
        self.0.lock().unwrap().keep_alive.push(interval);
    }

    fn start_pairing_expiry(&mut self, ttl: Duration) {
        self.0.lock().unwrap().pairing_timers.push(ttl);
    }

    fn cancel_pairing_expiry(&mut self) {
        self.0.lock().unwrap().pairing_cancels += 1;
    }

    fn cancel_all(&mut self) {
        self.0.lock().unwrap().cancels += 1;
    }
}

fn identity() -> IdentityKeys {
    IdentityKeys::from_private_bytes([0x21; 32])
}

fn session_keys() -> SessionKeys {
    SessionKeys {
        enc_key: ENC_KEY,
        mac_key: MAC_KEY,
        server_token: "server-token".into(),
        client_token: "client-token".into(),
    }
}

fn controller_with(
    store: MemoryKeyStore,
    config: ClientConfig,
    fail_ping: bool,
) -> (SessionController, Shared) {
    let log = Shared::default();
    let controller = SessionController::new(
        config,
        Collaborators {
            transport: Box::new(RecordingTransport {
                log: Arc::clone(&log),
                fail_ping,
            }),
            requests: Box::new(Requests),
            key_store: Box::new(store),
            listener: Box::new(RecordingListener(Arc::clone(&log))),
            timers: Box::new(RecordingTimers(Arc::clone(&log))),
            reconnect_policy: None,
            message_decoder: None,
        },
    );
    (controller, log)
}

fn fresh() -> (SessionController, Shared) {
    controller_with(
        MemoryKeyStore::from_parts(identity(), CLIENT_ID, None),
        ClientConfig::default(),
        false,
    )
}

fn restorable() -> (SessionController, Shared) {
    controller_with(
        MemoryKeyStore::from_parts(identity(), CLIENT_ID, Some(session_keys())),
        ClientConfig::default(),
        false,
    )
}

fn pairing_text() -> String {
    r#"s1,{"status":200,"ref":"1@reference","ttl":20000}"#.to_owned()
}

fn login_text() -> String {
    let server = StaticSecret::from([0x42; 32]);
    let secret = seal_login_secret(&server, identity().public_bytes(), &ENC_KEY, &MAC_KEY).unwrap();
    format!(
        r#"s2,["Conn",{{"secret":"{}","serverToken":"server-token","clientToken":"client-token"}}]"#,
        ByteView::from(secret).to_base64()
    )
}

fn frame(plaintext: &[u8]) -> SessionEvent {
    let sealed = seal_frame("1600000000.--4", plaintext, &session_keys(), &[0x09; 16]).unwrap();
    SessionEvent::Binary(Bytes::from(sealed))
}

fn authenticate(controller: &mut SessionController) {
    controller.handle(SessionEvent::Connect).unwrap();
    controller.handle(SessionEvent::Open).unwrap();
    controller.handle(SessionEvent::Text(pairing_text())).unwrap();
    controller.handle(SessionEvent::Text(login_text())).unwrap();
    assert_eq!(controller.state(), SessionState::Authenticated);
}

// ============================================================================
// PAIRING
// ============================================================================

#[test]
fn test_pairing_flow_reaches_authenticated() {
    let (mut controller, log) = fresh();

    controller.handle(SessionEvent::Connect).unwrap();
    assert_eq!(controller.state(), SessionState::AwaitingHandshakeAck);

    controller.handle(SessionEvent::Open).unwrap();
    assert_eq!(controller.state(), SessionState::AwaitingHandshakeAck);

    controller.handle(SessionEvent::Text(pairing_text())).unwrap();
    assert_eq!(controller.state(), SessionState::AwaitingPairing);

    controller.handle(SessionEvent::Text(login_text())).unwrap();
    assert_eq!(controller.state(), SessionState::Authenticated);

    let keys = controller.session_keys().unwrap();
    assert_eq!(keys.enc_key, ENC_KEY);
    assert_eq!(keys.mac_key, MAC_KEY);
    assert_eq!(keys.server_token, "server-token");

    let log = log.lock().unwrap();
    assert_eq!(log.opened, vec![ClientConfig::default().url]);
    assert_eq!(log.texts, vec![format!("init:{CLIENT_ID}")]);
    assert_eq!(log.keep_alive, vec![Duration::from_secs(60)]);
    assert_eq!(log.pairing_timers, vec![Duration::from_millis(20_000)]);
    assert_eq!(log.pairing_cancels, 1);
    assert_eq!(
        log.lifecycle,
        vec!["connecting", "open", "pairing", "logged_in"]
    );
    assert_eq!(
        log.pairings[0].qr_content(),
        format!("1@reference,{},{CLIENT_ID}", identity().public_base64())
    );
}

#[test]
fn test_pairing_rate_limited() {
    let (mut controller, _log) = fresh();
    controller.handle(SessionEvent::Connect).unwrap();
    controller.handle(SessionEvent::Open).unwrap();

    let result = controller.handle(SessionEvent::Text(r#"s1,{"status":429}"#.into()));
    assert!(matches!(result, Err(ProtocolError::RateLimited)));
    assert_eq!(controller.metrics().snapshot().handshakes_failed, 1);
}

#[test]
fn test_pairing_expiry_reconnects() {
    let (mut controller, log) = fresh();
    controller.handle(SessionEvent::Connect).unwrap();
    controller.handle(SessionEvent::Open).unwrap();
    controller.handle(SessionEvent::Text(pairing_text())).unwrap();

    controller.handle(SessionEvent::PairingExpired).unwrap();
    assert_eq!(controller.state(), SessionState::AwaitingHandshakeAck);
    assert_eq!(log.lock().unwrap().opened.len(), 2);
    assert_eq!(controller.metrics().snapshot().reconnects, 1);
}

#[test]
fn test_stale_pairing_expiry_ignored() {
    let (mut controller, log) = fresh();
    authenticate(&mut controller);
    controller.handle(SessionEvent::PairingExpired).unwrap();
    assert_eq!(controller.state(), SessionState::Authenticated);
    assert_eq!(log.lock().unwrap().opened.len(), 1);
}

#[test]
fn test_tampered_login_secret_is_fatal() {
    let (mut controller, _log) = fresh();
    controller.handle(SessionEvent::Connect).unwrap();
    controller.handle(SessionEvent::Open).unwrap();
    controller.handle(SessionEvent::Text(pairing_text())).unwrap();

    let server = StaticSecret::from([0x42; 32]);
    let mut secret = seal_login_secret(&server, identity().public_bytes(), &ENC_KEY, &MAC_KEY).unwrap();
    secret[40] ^= 0x01;
    let text = format!(
        r#"s2,{{"secret":"{}","serverToken":"a","clientToken":"b"}}"#,
        ByteView::from(secret).to_base64()
    );

    let result = controller.handle(SessionEvent::Text(text));
    assert!(matches!(result, Err(ProtocolError::IntegrityError(_))));
    assert!(controller.session_keys().is_none());
}

// ============================================================================
// TAKE-OVER AND CHALLENGE
// ============================================================================

#[test]
fn test_take_over_restores_session() {
    let (mut controller, log) = restorable();
    controller.handle(SessionEvent::Connect).unwrap();
    controller.handle(SessionEvent::Open).unwrap();
    controller.handle(SessionEvent::Text(r#"s1,{"status":200}"#.into())).unwrap();
    assert_eq!(controller.state(), SessionState::AwaitingChallengeSolve);

    controller.handle(SessionEvent::Text(r#"s2,{"status":405}"#.into())).unwrap();
    assert_eq!(controller.state(), SessionState::Authenticated);
    assert_eq!(
        log.lock().unwrap().texts,
        vec![format!("init:{CLIENT_ID}"), "takeover:server-token".to_owned()]
    );
}

#[test]
fn test_challenge_is_signed_with_mac_key() {
    let (mut controller, log) = restorable();
    controller.handle(SessionEvent::Connect).unwrap();
    controller.handle(SessionEvent::Open).unwrap();
    controller.handle(SessionEvent::Text("s1,{}".into())).unwrap();

    controller
        .handle(SessionEvent::Text(r#"s2,["Cmd",{"type":"challenge","challenge":"AQID"}]"#.into()))
        .unwrap();
    assert_eq!(controller.state(), SessionState::ChallengeSent);

    let expected = crypto::authenticate(&[1, 2, 3], &MAC_KEY).unwrap();
    assert_eq!(
        log.lock().unwrap().texts.last().unwrap(),
        &format!("solve:{}", ByteView::from(&expected[..]).to_base64())
    );

    controller.handle(SessionEvent::Text(r#"s3,{"status":200}"#.into())).unwrap();
    assert_eq!(controller.state(), SessionState::Authenticated);
}

#[test]
fn test_rejected_challenge_resets_keys() {
    let (mut controller, _log) = restorable();
    controller.handle(SessionEvent::Connect).unwrap();
    controller.handle(SessionEvent::Open).unwrap();
    controller.handle(SessionEvent::Text("s1,{}".into())).unwrap();
    controller
        .handle(SessionEvent::Text(r#"s2,{"challenge":"AQID"}"#.into()))
        .unwrap();

    let result = controller.handle(SessionEvent::Text(r#"s3,{"status":401}"#.into()));
    assert!(matches!(
        result,
        Err(ProtocolError::ProtocolStatusError { step: "challenge", status: 401 })
    ));
    assert!(controller.session_keys().is_none());
}

#[test]
fn test_revoked_keys_reset_and_reconnect() {
    let (mut controller, log) = restorable();
    controller.handle(SessionEvent::Connect).unwrap();
    controller.handle(SessionEvent::Open).unwrap();
    controller.handle(SessionEvent::Text("s1,{}".into())).unwrap();

    controller.handle(SessionEvent::Text(r#"s2,{"status":409}"#.into())).unwrap();
    assert_eq!(controller.state(), SessionState::AwaitingHandshakeAck);
    assert!(controller.session_keys().is_none());
    assert_eq!(log.lock().unwrap().opened.len(), 2);

    // The next handshake pairs from scratch instead of taking over
    controller.handle(SessionEvent::Open).unwrap();
    controller.handle(SessionEvent::Text(pairing_text())).unwrap();
    assert_eq!(controller.state(), SessionState::AwaitingPairing);
}

// ============================================================================
// AUTHENTICATED FRAMES
// ============================================================================

#[test]
fn test_frame_dispatched_to_listener() {
    let (mut controller, log) = fresh();
    authenticate(&mut controller);

    let node = Node::new("action")
        .with_attribute("type", "relay")
        .with_children(vec![Node::new("message").with_attribute("jid", "123@c.us")]);
    controller.handle(frame(&encode(&node).unwrap())).unwrap();

    assert_eq!(log.lock().unwrap().nodes, vec![node]);
    let snapshot = controller.metrics().snapshot();
    assert_eq!(snapshot.frames_received, 1);
    assert_eq!(snapshot.nodes_dispatched, 1);
}

#[test]
fn test_undecodable_frame_keeps_session() {
    let (mut controller, log) = fresh();
    authenticate(&mut controller);

    // zero list size
    let result = controller.handle(frame(&[248, 0]));
    assert!(matches!(result, Err(ProtocolError::MalformedStructure(_))));
    assert_eq!(controller.state(), SessionState::Authenticated);
    assert!(log.lock().unwrap().nodes.is_empty());
    assert_eq!(controller.metrics().snapshot().decode_failures, 1);
}

#[test]
fn test_tampered_frame_dropped() {
    let (mut controller, _log) = fresh();
    authenticate(&mut controller);

    let SessionEvent::Binary(payload) = frame(&[248, 1, 9]) else {
        panic!("frame builds binary events");
    };
    let mut tampered = payload.to_vec();
    let last = tampered.len() - 1;
    tampered[last] ^= 0x01;

    let result = controller.handle(SessionEvent::Binary(Bytes::from(tampered)));
    assert!(matches!(result, Err(ProtocolError::IntegrityError(_))));
    assert_eq!(controller.state(), SessionState::Authenticated);
    assert_eq!(controller.metrics().snapshot().integrity_failures, 1);
}

#[test]
fn test_repeated_integrity_failures_reconnect() {
    let config = ClientConfig {
        max_consecutive_integrity_failures: 3,
        ..ClientConfig::default()
    };
    let (mut controller, log) = controller_with(
        MemoryKeyStore::from_parts(identity(), CLIENT_ID, None),
        config,
        false,
    );
    authenticate(&mut controller);

    let mut forged = b"1,".to_vec();
    forged.extend_from_slice(&[0u8; 64]);
    let garbage = || SessionEvent::Binary(Bytes::from(forged.clone()));

    assert!(controller.handle(garbage()).is_err());
    // a good frame resets the run
    controller.handle(frame(&[248, 1, 9])).unwrap();
    assert!(controller.handle(garbage()).is_err());
    assert!(controller.handle(garbage()).is_err());
    assert_eq!(controller.state(), SessionState::Authenticated);

    assert!(controller.handle(garbage()).is_err());
    assert_eq!(controller.state(), SessionState::AwaitingHandshakeAck);

    let log = log.lock().unwrap();
    assert_eq!(log.opened.len(), 2);
    assert_eq!(log.closed, vec![Some("integrity".to_owned())]);
}

#[test]
fn test_binary_before_login() {
    let (mut controller, _log) = fresh();
    controller.handle(SessionEvent::Connect).unwrap();

    controller
        .handle(SessionEvent::Binary(Bytes::from_static(b"!1600000000")))
        .unwrap();
    assert!(matches!(
        controller.handle(SessionEvent::Binary(Bytes::from_static(b"tag,body"))),
        Err(ProtocolError::InvalidState(_))
    ));
}

// ============================================================================
// SERVER COMMANDS AND DISCONNECTS
// ============================================================================

#[test]
fn test_text_without_kind_is_noop() {
    let (mut controller, log) = fresh();
    authenticate(&mut controller);

    controller
        .handle(SessionEvent::Text(r#"s9,["Presence",{"type":"available"}]"#.into()))
        .unwrap();
    controller.handle(SessionEvent::Text("s10,not json".into())).unwrap();

    assert_eq!(controller.state(), SessionState::Authenticated);
    assert!(log.lock().unwrap().closed.is_empty());
}

#[test]
fn test_replaced_session_does_not_reconnect() {
    let (mut controller, log) = fresh();
    authenticate(&mut controller);

    controller
        .handle(SessionEvent::Text(
            r#"s9,["Cmd",{"type":"disconnect","kind":"replaced"}]"#.into(),
        ))
        .unwrap();

    assert_eq!(controller.state(), SessionState::Idle);
    let log = log.lock().unwrap();
    assert_eq!(log.closed, vec![Some("replaced".to_owned())]);
    assert_eq!(log.opened.len(), 1);
    assert_eq!(log.lifecycle.last(), Some(&"close"));
}

#[test]
fn test_other_disconnect_kind_reconnects() {
    let (mut controller, log) = fresh();
    authenticate(&mut controller);

    controller
        .handle(SessionEvent::Text(
            r#"s9,["Cmd",{"type":"disconnect","kind":"timeout"}]"#.into(),
        ))
        .unwrap();

    assert_eq!(controller.state(), SessionState::AwaitingHandshakeAck);
    assert_eq!(log.lock().unwrap().opened.len(), 2);
}

#[test]
fn test_logout_resets_keys() {
    let (mut controller, log) = fresh();
    authenticate(&mut controller);

    controller
        .handle(SessionEvent::Disconnect {
            reason: None,
            logout: true,
            reconnect: false,
        })
        .unwrap();

    assert_eq!(controller.state(), SessionState::Idle);
    assert!(controller.session_keys().is_none());
    let log = log.lock().unwrap();
    assert_eq!(log.texts.last().map(String::as_str), Some("logout"));
    assert_eq!(log.closed.len(), 1);
}

#[test]
fn test_remote_close_goes_idle() {
    let (mut controller, log) = fresh();
    authenticate(&mut controller);

    controller.handle(SessionEvent::Closed).unwrap();
    assert_eq!(controller.state(), SessionState::Idle);
    assert!(controller.session_keys().is_some());

    let log = log.lock().unwrap();
    assert_eq!(log.opened.len(), 1);
    assert!(log.cancels >= 1);
}

#[test]
fn test_connect_twice_rejected() {
    let (mut controller, _log) = fresh();
    controller.handle(SessionEvent::Connect).unwrap();
    assert!(matches!(
        controller.handle(SessionEvent::Connect),
        Err(ProtocolError::InvalidState(_))
    ));
}

// ============================================================================
// KEEP-ALIVE
// ============================================================================

#[test]
fn test_keep_alive_pings() {
    let (mut controller, log) = fresh();
    controller.handle(SessionEvent::KeepAlive).unwrap();
    assert_eq!(log.lock().unwrap().pings, 0);

    controller.handle(SessionEvent::Connect).unwrap();
    controller.handle(SessionEvent::KeepAlive).unwrap();
    controller.handle(SessionEvent::KeepAlive).unwrap();
    assert_eq!(log.lock().unwrap().pings, 2);
    assert_eq!(controller.metrics().snapshot().pings_sent, 2);
}

#[test]
fn test_failed_ping_is_not_fatal() {
    let (mut controller, _log) = controller_with(
        MemoryKeyStore::from_parts(identity(), CLIENT_ID, None),
        ClientConfig::default(),
        true,
    );
    controller.handle(SessionEvent::Connect).unwrap();
    controller.handle(SessionEvent::KeepAlive).unwrap();
    assert_eq!(controller.metrics().snapshot().pings_sent, 0);
}

// ============================================================================
// DRIVER
// ============================================================================

#[tokio::test]
async fn test_driver_runs_until_shutdown() {
    let (controller, log) = fresh();
    let (sender, receiver) = event_channel();
    let driver = SessionDriver::new(controller, receiver);

    let node = Node::new("action").with_attribute("type", "relay");
    for event in [
        SessionEvent::Connect,
        SessionEvent::Open,
        SessionEvent::Text(pairing_text()),
        SessionEvent::Text(login_text()),
        SessionEvent::Binary(Bytes::from_static(b"tag,garbage")),
        frame(&encode(&node).unwrap()),
        SessionEvent::Shutdown,
    ] {
        sender.send(event).unwrap();
    }

    let controller = driver.run().await.expect("Frame errors are not fatal");
    assert_eq!(controller.state(), SessionState::Idle);
    let snapshot = controller.metrics().snapshot();
    assert_eq!(snapshot.nodes_dispatched, 1);
    assert_eq!(snapshot.frames_dropped, 1);
    assert_eq!(log.lock().unwrap().nodes, vec![node]);
}

#[tokio::test]
async fn test_driver_stops_on_handshake_error() {
    let (controller, log) = fresh();
    let (sender, receiver) = event_channel();
    let driver = SessionDriver::new(controller, receiver);

    sender.send(SessionEvent::Connect).unwrap();
    sender.send(SessionEvent::Open).unwrap();
    sender
        .send(SessionEvent::Text(r#"s1,{"status":429}"#.into()))
        .unwrap();
    sender.send(SessionEvent::KeepAlive).unwrap();

    let result = driver.run().await;
    assert!(matches!(result, Err(ProtocolError::RateLimited)));

    let log = log.lock().unwrap();
    assert_eq!(log.closed.len(), 1);
    assert_eq!(log.pings, 0);
}

#[tokio::test]
async fn test_driver_ends_when_senders_dropped() {
    let (controller, _log) = fresh();
    let (sender, receiver) = event_channel();
    let driver = SessionDriver::new(controller, receiver);

    sender.send(SessionEvent::Connect).unwrap();
    drop(sender);

    let controller = driver.run().await.unwrap();
    assert_eq!(controller.state(), SessionState::Idle);
}

#[tokio::test]
async fn test_driver_with_tokio_timers_ends_when_senders_dropped() {
    let log = Shared::default();
    let (sender, receiver) = event_channel();
    let controller = SessionController::new(
        ClientConfig::default(),
        Collaborators {
            transport: Box::new(RecordingTransport {
                log: Arc::clone(&log),
                fail_ping: false,
            }),
            requests: Box::new(Requests),
            key_store: Box::new(MemoryKeyStore::from_parts(identity(), CLIENT_ID, None)),
            listener: Box::new(RecordingListener(Arc::clone(&log))),
            timers: Box::new(TokioTimers::new(sender.clone())),
            reconnect_policy: None,
            message_decoder: None,
        },
    );
    let driver = SessionDriver::new(controller, receiver);

    sender.send(SessionEvent::Connect).unwrap();
    sender.send(SessionEvent::Open).unwrap();
    sender.send(SessionEvent::Text(pairing_text())).unwrap();
    drop(sender);

    let controller = tokio::time::timeout(Duration::from_secs(5), driver.run())
        .await
        .expect("Driver should stop once the caller's sender is gone")
        .unwrap();
    assert_eq!(controller.state(), SessionState::Idle);
    assert_eq!(log.lock().unwrap().closed.len(), 1);
}

#[test]
fn test_key_store_keeps_login_keys() {
    let mut store = MemoryKeyStore::from_parts(identity(), CLIENT_ID, None);
    assert!(!store.may_restore());
    store.store_session_keys(session_keys());
    assert!(store.may_restore());
}
