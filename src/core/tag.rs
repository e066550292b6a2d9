//! Leading-byte tags of the binary node encoding.

use crate::error::{ProtocolError, Result};

/// Lowest byte value that is a direct single-byte token index.
pub const SINGLE_BYTE_TOKEN_MIN: u8 = 3;
/// Highest byte value that is a direct single-byte token index.
pub const SINGLE_BYTE_TOKEN_MAX: u8 = 235;

/// Structural tags. Bytes in `SINGLE_BYTE_TOKEN_MIN..=SINGLE_BYTE_TOKEN_MAX`
/// are token indices and have no variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    ListEmpty = 0,
    StreamEnd = 2,
    Dictionary0 = 236,
    Dictionary1 = 237,
    Dictionary2 = 238,
    Dictionary3 = 239,
    List8 = 248,
    List16 = 249,
    JidPair = 250,
    Hex8 = 251,
    Binary8 = 252,
    Binary20 = 253,
    Binary32 = 254,
    Nibble8 = 255,
}

/// What a single leading byte means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lead {
    Token(u8),
    Tag(Tag),
}

impl Tag {
    pub fn byte(self) -> u8 {
        self as u8
    }

    /// The one mapping from byte values to structural tags.
    pub fn from_byte(byte: u8) -> Option<Self> {
        let tag = match byte {
            0 => Tag::ListEmpty,
            2 => Tag::StreamEnd,
            236 => Tag::Dictionary0,
            237 => Tag::Dictionary1,
            238 => Tag::Dictionary2,
            239 => Tag::Dictionary3,
            248 => Tag::List8,
            249 => Tag::List16,
            250 => Tag::JidPair,
            251 => Tag::Hex8,
            252 => Tag::Binary8,
            253 => Tag::Binary20,
            254 => Tag::Binary32,
            255 => Tag::Nibble8,
            _ => return None,
        };
        Some(tag)
    }

    pub fn is_list(self) -> bool {
        matches!(self, Tag::ListEmpty | Tag::List8 | Tag::List16)
    }

    pub fn is_binary(self) -> bool {
        matches!(self, Tag::Binary8 | Tag::Binary20 | Tag::Binary32)
    }

    /// Index of the double-byte dictionary this tag selects.
    pub fn dictionary(self) -> Option<usize> {
        match self {
            Tag::Dictionary0 => Some(0),
            Tag::Dictionary1 => Some(1),
            Tag::Dictionary2 => Some(2),
            Tag::Dictionary3 => Some(3),
            _ => None,
        }
    }

    pub fn for_dictionary(index: usize) -> Option<Self> {
        match index {
            0 => Some(Tag::Dictionary0),
            1 => Some(Tag::Dictionary1),
            2 => Some(Tag::Dictionary2),
            3 => Some(Tag::Dictionary3),
            _ => None,
        }
    }
}

impl Lead {
    /// Classify a leading byte, failing with `MalformedTag` for unmapped values.
    pub fn classify(byte: u8) -> Result<Self> {
        if (SINGLE_BYTE_TOKEN_MIN..=SINGLE_BYTE_TOKEN_MAX).contains(&byte) {
            return Ok(Lead::Token(byte));
        }
        Tag::from_byte(byte)
            .map(Lead::Tag)
            .ok_or(ProtocolError::MalformedTag(byte))
    }
}
