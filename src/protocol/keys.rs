//! Identity and session key material.
//!
//! [`IdentityKeys`] is the long-lived X25519 pair the server knows this client
//! by. [`SessionKeys`] is derived once per login and authenticates every frame
//! after it. Both redact themselves in `Debug` output and the session keys are
//! zeroized on drop.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::RngCore;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of the random client id before base64 encoding
pub const CLIENT_ID_LEN: usize = 16;

/// Long-lived X25519 identity key pair
#[derive(Clone)]
pub struct IdentityKeys {
    private_key: StaticSecret,
    public_key: PublicKey,
}

impl IdentityKeys {
    /// Generate a fresh identity from the thread-local CSPRNG
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::rng().fill_bytes(&mut bytes);
        let keys = Self::from_private_bytes(bytes);
        bytes.zeroize();
        keys
    }

    /// Rebuild an identity from persisted private key bytes
    pub fn from_private_bytes(bytes: [u8; 32]) -> Self {
        let private_key = StaticSecret::from(bytes);
        let public_key = PublicKey::from(&private_key);
        Self {
            private_key,
            public_key,
        }
    }

    pub fn private_key(&self) -> &StaticSecret {
        &self.private_key
    }

    pub fn public_bytes(&self) -> &[u8; 32] {
        self.public_key.as_bytes()
    }

    /// Public key as standard base64, as shown in the pairing QR code
    pub fn public_base64(&self) -> String {
        STANDARD.encode(self.public_key.as_bytes())
    }
}

impl std::fmt::Debug for IdentityKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityKeys")
            .field("public_key", &self.public_base64())
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Per-login symmetric keys and server tokens
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SessionKeys {
    pub enc_key: [u8; 32],
    pub mac_key: [u8; 32],
    pub server_token: String,
    pub client_token: String,
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeys")
            .field("enc_key", &"<redacted>")
            .field("mac_key", &"<redacted>")
            .field("server_token", &"<redacted>")
            .field("client_token", &"<redacted>")
            .finish()
    }
}

/// Source of identity and persisted session keys.
pub trait KeyStore: Send {
    fn identity(&self) -> &IdentityKeys;

    fn client_id(&self) -> &str;

    fn session_keys(&self) -> Option<&SessionKeys>;

    fn store_session_keys(&mut self, keys: SessionKeys);

    /// Forget the session and start over as a new, unpaired client
    fn reset(&mut self);

    /// Whether a previous session can be taken over instead of pairing again
    fn may_restore(&self) -> bool {
        self.session_keys().is_some()
    }
}

/// In-memory key store
#[derive(Debug)]
pub struct MemoryKeyStore {
    identity: IdentityKeys,
    client_id: String,
    session: Option<SessionKeys>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self {
            identity: IdentityKeys::generate(),
            client_id: generate_client_id(),
            session: None,
        }
    }

    /// Restore a store from previously persisted parts
    pub fn from_parts(
        identity: IdentityKeys,
        client_id: impl Into<String>,
        session: Option<SessionKeys>,
    ) -> Self {
        Self {
            identity,
            client_id: client_id.into(),
            session,
        }
    }
}

impl Default for MemoryKeyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyStore for MemoryKeyStore {
    fn identity(&self) -> &IdentityKeys {
        &self.identity
    }

    fn client_id(&self) -> &str {
        &self.client_id
    }

    fn session_keys(&self) -> Option<&SessionKeys> {
        self.session.as_ref()
    }

    fn store_session_keys(&mut self, keys: SessionKeys) {
        self.session = Some(keys);
    }

    fn reset(&mut self) {
        self.session = None;
        self.identity = IdentityKeys::generate();
        self.client_id = generate_client_id();
    }
}

fn generate_client_id() -> String {
    let mut id = [0u8; CLIENT_ID_LEN];
    rand::rng().fill_bytes(&mut id);
    STANDARD.encode(id)
}
