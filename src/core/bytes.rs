//! Immutable, cheaply sliceable view over a byte sequence.
//!
//! [`ByteView`] wraps [`bytes::Bytes`], so every sub-range shares the
//! underlying allocation. All range operations are bounds checked and fail
//! with [`ProtocolError::OutOfBounds`] instead of truncating or panicking.

use crate::error::{ProtocolError, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use bytes::{Bytes, BytesMut};
use std::fmt;
use std::ops::Deref;

#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ByteView {
    bytes: Bytes,
}

impl ByteView {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn from_static(bytes: &'static [u8]) -> Self {
        Self {
            bytes: Bytes::from_static(bytes),
        }
    }

    /// Decode a standard (padded) base64 string.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        Ok(Self::new(STANDARD.decode(encoded.trim())?))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Byte at `index`.
    pub fn at(&self, index: usize) -> Result<u8> {
        self.bytes
            .get(index)
            .copied()
            .ok_or(ProtocolError::OutOfBounds {
                start: index,
                end: index + 1,
                len: self.len(),
            })
    }

    /// Sub-view over `start..end`.
    pub fn slice(&self, start: usize, end: usize) -> Result<Self> {
        if start > end || end > self.len() {
            return Err(ProtocolError::OutOfBounds {
                start,
                end,
                len: self.len(),
            });
        }
        Ok(Self {
            bytes: self.bytes.slice(start..end),
        })
    }

    /// First `n` bytes.
    pub fn take(&self, n: usize) -> Result<Self> {
        self.slice(0, n)
    }

    /// Everything from `n` to the end.
    pub fn skip(&self, n: usize) -> Result<Self> {
        self.slice(n, self.len())
    }

    /// Split around the first occurrence of `delimiter`, excluding the delimiter itself.
    pub fn split_once(&self, delimiter: u8) -> Option<(Self, Self)> {
        let index = self.bytes.iter().position(|&b| b == delimiter)?;
        Some((
            Self {
                bytes: self.bytes.slice(..index),
            },
            Self {
                bytes: self.bytes.slice(index + 1..),
            },
        ))
    }

    /// New view holding `self` followed by `other`.
    pub fn concat(&self, other: &ByteView) -> Self {
        let mut merged = BytesMut::with_capacity(self.len() + other.len());
        merged.extend_from_slice(&self.bytes);
        merged.extend_from_slice(&other.bytes);
        Self {
            bytes: merged.freeze(),
        }
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// Lossy UTF-8 rendering.
    pub fn to_text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

impl Deref for ByteView {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl AsRef<[u8]> for ByteView {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<Vec<u8>> for ByteView {
    fn from(value: Vec<u8>) -> Self {
        Self::new(value)
    }
}

impl From<&[u8]> for ByteView {
    fn from(value: &[u8]) -> Self {
        Self::new(Bytes::copy_from_slice(value))
    }
}

impl From<Bytes> for ByteView {
    fn from(value: Bytes) -> Self {
        Self { bytes: value }
    }
}

impl fmt::Debug for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteView({} bytes)", self.len())
    }
}
