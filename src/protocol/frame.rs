//! Authenticated binary frames.
//!
//! ```text
//! [ tag ] ',' [ HMAC-SHA256 (32) ][ IV (16) ][ AES-256-CBC ciphertext ]
//! ```
//!
//! The HMAC covers `IV ++ ciphertext` under the session MAC key. The tag is
//! the request tag chosen by the sender and carries no meaning here.

use crate::core::bytes::ByteView;
use crate::error::{constants, ProtocolError, Result};
use crate::protocol::keys::SessionKeys;
use crate::utils::crypto::{self, IV_LEN, MAC_LEN};

/// First byte of a raw transport pong
pub const KEEP_ALIVE_MARKER: u8 = b'!';

/// Separates the message tag from the authenticated content
pub const TAG_DELIMITER: u8 = b',';

/// A verified and decrypted frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedFrame {
    pub tag: ByteView,
    pub plaintext: ByteView,
}

/// Whether `payload` is a transport pong rather than an application frame
pub fn is_keep_alive(payload: &[u8]) -> bool {
    payload.first() == Some(&KEEP_ALIVE_MARKER)
}

/// Verify and decrypt one inbound frame.
///
/// # Errors
/// - `TruncatedInput` if the payload is empty or the content is shorter than its HMAC
/// - `MalformedStructure` for pongs and payloads without a tag delimiter
/// - `IntegrityError` if the HMAC does not match
/// - `AuthOrPaddingError` if the body does not decrypt
pub fn open_frame(payload: &ByteView, keys: &SessionKeys) -> Result<OpenedFrame> {
    if payload.is_empty() {
        return Err(ProtocolError::TruncatedInput {
            needed: 1,
            available: 0,
        });
    }
    if is_keep_alive(payload) {
        return Err(ProtocolError::MalformedStructure(
            constants::ERR_PONG_FRAME.into(),
        ));
    }

    let (tag, content) = payload.split_once(TAG_DELIMITER).ok_or_else(|| {
        ProtocolError::MalformedStructure(constants::ERR_FRAME_NO_DELIMITER.into())
    })?;

    if content.len() < MAC_LEN {
        return Err(ProtocolError::TruncatedInput {
            needed: MAC_LEN,
            available: content.len(),
        });
    }

    let hmac = content.take(MAC_LEN)?;
    let body = content.skip(MAC_LEN)?;
    crypto::verify(&body, &keys.mac_key, &hmac, constants::ERR_FRAME_HMAC)?;

    let plaintext = crypto::decrypt_block(&body, &keys.enc_key)?;
    Ok(OpenedFrame {
        tag,
        plaintext: ByteView::from(plaintext),
    })
}

/// Encrypt and authenticate `plaintext` as a frame tagged `tag`.
pub fn seal_frame(
    tag: &str,
    plaintext: &[u8],
    keys: &SessionKeys,
    iv: &[u8; IV_LEN],
) -> Result<Vec<u8>> {
    let body = crypto::encrypt_block(plaintext, &keys.enc_key, iv)?;
    let hmac = crypto::authenticate(&body, &keys.mac_key)?;

    let mut frame = Vec::with_capacity(tag.len() + 1 + MAC_LEN + body.len());
    frame.extend_from_slice(tag.as_bytes());
    frame.push(TAG_DELIMITER);
    frame.extend_from_slice(&hmac);
    frame.extend_from_slice(&body);
    Ok(frame)
}
