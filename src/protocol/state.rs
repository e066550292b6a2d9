use std::fmt;

/// Handshake progress of a session controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// No transport, or the last one was closed
    #[default]
    Idle,
    /// Transport opening or handshake request sent
    AwaitingHandshakeAck,
    /// Take-over sent, waiting for the server's verdict or challenge
    AwaitingChallengeSolve,
    /// Signed challenge sent
    ChallengeSent,
    /// QR code shown, waiting for the phone to scan it
    AwaitingPairing,
    Authenticated,
}

impl SessionState {
    /// True while a handshake step is outstanding
    pub fn is_handshaking(self) -> bool {
        !matches!(self, SessionState::Idle | SessionState::Authenticated)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::AwaitingHandshakeAck => "awaiting-handshake-ack",
            SessionState::AwaitingChallengeSolve => "awaiting-challenge-solve",
            SessionState::ChallengeSent => "challenge-sent",
            SessionState::AwaitingPairing => "awaiting-pairing",
            SessionState::Authenticated => "authenticated",
        };
        f.write_str(name)
    }
}
