//! Crypto primitives used by the handshake and frame layers.
//!
//! All functions are pure and stateless:
//! - X25519 shared secret computation
//! - HKDF-SHA256 expansion with no salt and no info
//! - HMAC-SHA256 authentication and constant-time verification
//! - AES-256-CBC with PKCS#7 padding, IV carried in the first 16 bytes

use crate::error::{ProtocolError, Result};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

pub const KEY_LEN: usize = 32;
pub const MAC_LEN: usize = 32;
pub const IV_LEN: usize = 16;
const BLOCK_LEN: usize = 16;

/// X25519 Diffie-Hellman between our private key and the peer's public key.
///
/// # Errors
/// `InvalidKeyLength` if `peer_public` is not 32 bytes, `IntegrityError` if the
/// peer key is a low-order point (all-zero shared secret).
pub fn shared_secret(private_key: &StaticSecret, peer_public: &[u8]) -> Result<Zeroizing<[u8; 32]>> {
    let peer: [u8; KEY_LEN] = peer_public
        .try_into()
        .map_err(|_| ProtocolError::InvalidKeyLength {
            expected: KEY_LEN,
            got: peer_public.len(),
        })?;
    let shared = private_key.diffie_hellman(&PublicKey::from(peer));
    if !shared.was_contributory() {
        return Err(ProtocolError::IntegrityError(
            "peer public key is a low-order point".into(),
        ));
    }
    Ok(Zeroizing::new(shared.to_bytes()))
}

/// HKDF-SHA256 (RFC 5869) with an empty salt and empty info.
pub fn expand(secret: &[u8], length: usize) -> Result<Zeroizing<Vec<u8>>> {
    let hk = Hkdf::<Sha256>::new(None, secret);
    let mut okm = Zeroizing::new(vec![0u8; length]);
    hk.expand(&[], &mut okm)
        .map_err(|_| ProtocolError::InvalidKeyLength {
            expected: 255 * 32,
            got: length,
        })?;
    Ok(okm)
}

/// HMAC-SHA256 of `data` under `key`.
pub fn authenticate(data: &[u8], key: &[u8]) -> Result<[u8; MAC_LEN]> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| ProtocolError::InvalidKeyLength {
        expected: KEY_LEN,
        got: key.len(),
    })?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().into())
}

/// Check `tag` against HMAC-SHA256 of `data`. The whole tag must match.
pub fn verify(data: &[u8], key: &[u8], tag: &[u8], context: &str) -> Result<()> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| ProtocolError::InvalidKeyLength {
        expected: KEY_LEN,
        got: key.len(),
    })?;
    mac.update(data);
    mac.verify_slice(tag)
        .map_err(|_| ProtocolError::IntegrityError(context.to_owned()))
}

/// AES-256-CBC decryption of `iv || ciphertext`.
///
/// # Errors
/// `InvalidKeyLength` for keys that are not 32 bytes, `AuthOrPaddingError`
/// when the input is not whole blocks or the padding is invalid.
pub fn decrypt_block(ciphertext: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    check_key(key)?;
    if ciphertext.len() < IV_LEN + BLOCK_LEN || ciphertext.len() % BLOCK_LEN != 0 {
        return Err(ProtocolError::AuthOrPaddingError);
    }
    let (iv, body) = ciphertext.split_at(IV_LEN);

    let mut buffer = body.to_vec();
    let plaintext_len = Aes256CbcDec::new_from_slices(key, iv)
        .map_err(|_| ProtocolError::AuthOrPaddingError)?
        .decrypt_padded_mut::<Pkcs7>(&mut buffer)
        .map_err(|_| ProtocolError::AuthOrPaddingError)?
        .len();
    buffer.truncate(plaintext_len);
    Ok(buffer)
}

/// AES-256-CBC encryption, returning `iv || ciphertext`.
pub fn encrypt_block(plaintext: &[u8], key: &[u8], iv: &[u8; IV_LEN]) -> Result<Vec<u8>> {
    check_key(key)?;
    let padded_len = plaintext.len() + BLOCK_LEN - plaintext.len() % BLOCK_LEN;
    let mut buffer = vec![0u8; padded_len];
    buffer[..plaintext.len()].copy_from_slice(plaintext);

    let ciphertext_len = Aes256CbcEnc::new_from_slices(key, iv)
        .map_err(|_| ProtocolError::InvalidKeyLength {
            expected: KEY_LEN,
            got: key.len(),
        })?
        .encrypt_padded_mut::<Pkcs7>(&mut buffer, plaintext.len())
        .map_err(|_| ProtocolError::AuthOrPaddingError)?
        .len();
    buffer.truncate(ciphertext_len);

    let mut output = Vec::with_capacity(IV_LEN + buffer.len());
    output.extend_from_slice(iv);
    output.extend_from_slice(&buffer);
    Ok(output)
}

fn check_key(key: &[u8]) -> Result<()> {
    if key.len() != KEY_LEN {
        return Err(ProtocolError::InvalidKeyLength {
            expected: KEY_LEN,
            got: key.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_secret_agrees() {
        let a = StaticSecret::from([7u8; 32]);
        let b = StaticSecret::from([9u8; 32]);
        let a_pub = PublicKey::from(&a);
        let b_pub = PublicKey::from(&b);
        let ab = shared_secret(&a, b_pub.as_bytes()).unwrap();
        let ba = shared_secret(&b, a_pub.as_bytes()).unwrap();
        assert_eq!(*ab, *ba);
    }

    #[test]
    fn test_shared_secret_rejects_bad_keys() {
        let a = StaticSecret::from([7u8; 32]);
        assert!(matches!(
            shared_secret(&a, &[1u8; 31]),
            Err(ProtocolError::InvalidKeyLength { got: 31, .. })
        ));
        assert!(matches!(
            shared_secret(&a, &[0u8; 32]),
            Err(ProtocolError::IntegrityError(_))
        ));
    }

    #[test]
    fn test_hkdf_rfc5869_case3() {
        // RFC 5869 test case 3: zero-length salt and info
        let ikm = [0x0bu8; 22];
        let okm = expand(&ikm, 42).unwrap();
        let expected = [
            0x8d, 0xa4, 0xe7, 0x75, 0xa5, 0x63, 0xc1, 0x8f, 0x71, 0x5f, 0x80, 0x2a, 0x06, 0x3c,
            0x5a, 0x31, 0xb8, 0xa1, 0x1f, 0x5c, 0x5e, 0xe1, 0x87, 0x9e, 0xc3, 0x45, 0x4e, 0x5f,
            0x3c, 0x73, 0x8d, 0x2d, 0x9d, 0x20, 0x13, 0x95, 0xfa, 0xa4, 0xb6, 0x1a, 0x96, 0xc8,
        ];
        assert_eq!(okm.as_slice(), &expected);
        assert!(expand(&ikm, 255 * 32 + 1).is_err());
    }

    #[test]
    fn test_hmac_rfc4231_case2() {
        let tag = authenticate(b"what do ya want for nothing?", b"Jefe").unwrap();
        let expected = [
            0x5b, 0xdc, 0xc1, 0x46, 0xbf, 0x60, 0x75, 0x4e, 0x6a, 0x04, 0x24, 0x26, 0x08, 0x95,
            0x75, 0xc7, 0x5a, 0x00, 0x3f, 0x08, 0x9d, 0x27, 0x39, 0x83, 0x9d, 0xec, 0x58, 0xb9,
            0x64, 0xec, 0x38, 0x43,
        ];
        assert_eq!(tag, expected);
        assert!(verify(b"what do ya want for nothing?", b"Jefe", &expected, "t").is_ok());

        let mut flipped = expected;
        flipped[31] ^= 0x01;
        assert!(matches!(
            verify(b"what do ya want for nothing?", b"Jefe", &flipped, "t"),
            Err(ProtocolError::IntegrityError(_))
        ));
        assert!(verify(b"what do ya want for nothing?", b"Jefe", &expected[..16], "t").is_err());
    }

    #[test]
    fn test_cbc_round_trip() {
        let key = [0x42u8; 32];
        let iv = [0x24u8; 16];
        for len in [0usize, 1, 15, 16, 17, 64] {
            let plaintext = vec![0xA5u8; len];
            let sealed = encrypt_block(&plaintext, &key, &iv).unwrap();
            assert_eq!(&sealed[..16], &iv);
            assert_eq!((sealed.len() - 16) % 16, 0);
            assert_eq!(decrypt_block(&sealed, &key).unwrap(), plaintext);
        }
    }

    #[test]
    fn test_cbc_failures() {
        let key = [0x42u8; 32];
        let sealed = encrypt_block(b"secret keys", &key, &[0u8; 16]).unwrap();

        assert!(matches!(
            decrypt_block(&sealed[..sealed.len() - 1], &key),
            Err(ProtocolError::AuthOrPaddingError)
        ));
        assert!(matches!(
            decrypt_block(&sealed[..16], &key),
            Err(ProtocolError::AuthOrPaddingError)
        ));
        assert!(matches!(
            decrypt_block(&sealed, &[0u8; 16]),
            Err(ProtocolError::InvalidKeyLength { got: 16, .. })
        ));
    }
}
