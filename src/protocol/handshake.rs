//! Login key agreement and challenge signing.
//!
//! The `login` response carries a base64 `secret`:
//!
//! ```text
//! [ server public key (32) ][ HMAC (32) ][ encrypted key blob (N) ]
//! ```
//!
//! The client computes the X25519 shared secret with its identity key, expands
//! it to 80 bytes (`aes key | hmac key | iv`), checks the HMAC over
//! `public key ++ blob`, and decrypts `iv ++ blob` into `enc key | mac key`.
//!
//! Any mismatch aborts the handshake. There is no retry with the same secret.

use crate::core::bytes::ByteView;
use crate::error::{constants, ProtocolError, Result};
use crate::protocol::keys::{IdentityKeys, SessionKeys};
use crate::protocol::response::Response;
use crate::utils::crypto::{self, IV_LEN, KEY_LEN, MAC_LEN};
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

use tracing::{debug, instrument, warn};

/// Public key and HMAC prefix of the login secret
pub const LOGIN_PREFIX_LEN: usize = KEY_LEN + MAC_LEN;

/// Bytes of HKDF output needed for the login secret
pub const EXPANDED_LEN: usize = 2 * KEY_LEN + IV_LEN;

/// Symmetric keys recovered from the login secret
pub struct LoginKeys {
    pub enc_key: Zeroizing<[u8; 32]>,
    pub mac_key: Zeroizing<[u8; 32]>,
}

/// Recover the session's symmetric keys from a decoded login `secret`.
///
/// # Errors
/// - `IntegrityError` if the secret is too short or its HMAC does not match
/// - `AuthOrPaddingError` if the key blob does not decrypt
#[instrument(skip(identity, secret), fields(secret_len = secret.len()))]
pub fn derive_login_keys(identity: &IdentityKeys, secret: &ByteView) -> Result<LoginKeys> {
    if secret.len() < LOGIN_PREFIX_LEN {
        warn!(len = secret.len(), "Login secret too short");
        return Err(ProtocolError::IntegrityError(
            constants::ERR_LOGIN_SECRET_TOO_SHORT.into(),
        ));
    }

    let peer_public = secret.take(KEY_LEN)?;
    let tag = secret.slice(KEY_LEN, LOGIN_PREFIX_LEN)?;
    let blob = secret.skip(LOGIN_PREFIX_LEN)?;

    let shared = crypto::shared_secret(identity.private_key(), &peer_public)?;
    let expanded = crypto::expand(shared.as_slice(), EXPANDED_LEN)?;
    let (aes_key, rest) = expanded.split_at(KEY_LEN);
    let (hmac_key, iv) = rest.split_at(KEY_LEN);

    crypto::verify(
        &peer_public.concat(&blob),
        hmac_key,
        &tag,
        constants::ERR_LOGIN_HMAC,
    )?;

    let encrypted = ByteView::from(iv).concat(&blob);
    let keys = Zeroizing::new(crypto::decrypt_block(&encrypted, aes_key)?);
    if keys.len() < 2 * KEY_LEN {
        return Err(ProtocolError::IntegrityError(
            constants::ERR_LOGIN_KEYS_LENGTH.into(),
        ));
    }

    let mut enc_key = Zeroizing::new([0u8; 32]);
    let mut mac_key = Zeroizing::new([0u8; 32]);
    enc_key.copy_from_slice(&keys[..KEY_LEN]);
    mac_key.copy_from_slice(&keys[KEY_LEN..2 * KEY_LEN]);

    debug!("Login secret verified");
    Ok(LoginKeys { enc_key, mac_key })
}

/// Build [`SessionKeys`] from a `login` response.
///
/// `serverToken` and `clientToken` are read from the same JSON object as
/// `secret` and are kept as opaque strings.
pub fn complete_login(identity: &IdentityKeys, response: &Response) -> Result<SessionKeys> {
    let secret = ByteView::from_base64(response.required_string("secret")?)?;
    let keys = derive_login_keys(identity, &secret)?;

    Ok(SessionKeys {
        enc_key: *keys.enc_key,
        mac_key: *keys.mac_key,
        server_token: response.required_string("serverToken")?.to_owned(),
        client_token: response.required_string("clientToken")?.to_owned(),
    })
}

/// HMAC of the base64 `challenge` field under the session MAC key.
pub fn sign_challenge(response: &Response, keys: &SessionKeys) -> Result<[u8; MAC_LEN]> {
    let challenge = ByteView::from_base64(response.required_string("challenge")?)?;
    crypto::authenticate(&challenge, &keys.mac_key)
}

/// Server side of [`derive_login_keys`]: seal `enc_key | mac_key` for a client.
///
/// Produces the raw `secret` bytes a login response carries. Used by
/// simulators and tests that play the server role.
pub fn seal_login_secret(
    server_secret: &StaticSecret,
    client_public: &[u8; 32],
    enc_key: &[u8; 32],
    mac_key: &[u8; 32],
) -> Result<Vec<u8>> {
    let server_public = PublicKey::from(server_secret);
    let shared = crypto::shared_secret(server_secret, client_public)?;
    let expanded = crypto::expand(shared.as_slice(), EXPANDED_LEN)?;
    let (aes_key, rest) = expanded.split_at(KEY_LEN);
    let (hmac_key, iv) = rest.split_at(KEY_LEN);

    let mut iv_block = [0u8; IV_LEN];
    iv_block.copy_from_slice(iv);

    let mut plaintext = Zeroizing::new([0u8; 2 * KEY_LEN]);
    plaintext[..KEY_LEN].copy_from_slice(enc_key);
    plaintext[KEY_LEN..].copy_from_slice(mac_key);

    let sealed = crypto::encrypt_block(plaintext.as_slice(), aes_key, &iv_block)?;
    let blob = &sealed[IV_LEN..];

    let mut authenticated = Vec::with_capacity(KEY_LEN + blob.len());
    authenticated.extend_from_slice(server_public.as_bytes());
    authenticated.extend_from_slice(blob);
    let tag = crypto::authenticate(&authenticated, hmac_key)?;

    let mut secret = Vec::with_capacity(LOGIN_PREFIX_LEN + blob.len());
    secret.extend_from_slice(server_public.as_bytes());
    secret.extend_from_slice(&tag);
    secret.extend_from_slice(blob);
    Ok(secret)
}
