//! # Binary Node Encoder
//!
//! Inverse of [`BinaryDecoder`](crate::core::decoder::BinaryDecoder). Strings
//! use the most compact representation available, in this order: single-byte
//! token, double-byte token, packed nibbles, packed hex, JID pair, raw bytes.
//!
//! `"c.us"` is written as the token for `"s.whatsapp.net"`, mirroring the alias
//! applied on decode, while a literal `"s.whatsapp.net"` is written as raw bytes
//! so that it survives a round trip.

use crate::core::node::{Node, NodeContent};
use crate::core::tag::Tag;
use crate::core::tokens::{self, USER_SERVER, USER_SERVER_ALIAS};
use crate::error::{ProtocolError, Result};
use bytes::{BufMut, BytesMut};

/// Longest packed string, in packed bytes.
const MAX_PACKED_BYTES: usize = 0x7F;

/// Encode a node tree into its binary form.
pub fn encode(node: &Node) -> Result<Vec<u8>> {
    let mut encoder = BinaryEncoder::new();
    encoder.write_node(node)?;
    Ok(encoder.finish())
}

#[derive(Debug, Default)]
pub struct BinaryEncoder {
    buffer: BytesMut,
}

impl BinaryEncoder {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(256),
        }
    }

    pub fn finish(self) -> Vec<u8> {
        self.buffer.to_vec()
    }

    pub fn write_node(&mut self, node: &Node) -> Result<()> {
        let has_content = !matches!(node.content(), NodeContent::None);
        let size = 1 + 2 * node.attributes().len() + usize::from(has_content);
        self.write_list_size(size)?;
        self.write_string(node.description())?;
        for (key, value) in node.attributes() {
            self.write_string(key)?;
            self.write_string(value)?;
        }

        match node.content() {
            NodeContent::None => {}
            NodeContent::Text(text) => self.write_string(text)?,
            NodeContent::Binary(raw) => self.write_binary(raw)?,
            NodeContent::List(children) => {
                self.write_list_size(children.len())?;
                for child in children {
                    self.write_node(child)?;
                }
            }
            NodeContent::Message(_) => {
                return Err(ProtocolError::MalformedStructure(
                    "decoded message payloads cannot be re-encoded".into(),
                ))
            }
        }
        Ok(())
    }

    fn write_list_size(&mut self, size: usize) -> Result<()> {
        match size {
            0 => self.buffer.put_u8(Tag::ListEmpty.byte()),
            1..=0xFF => {
                self.buffer.put_u8(Tag::List8.byte());
                self.buffer.put_u8(size as u8);
            }
            0x100..=0xFFFF => {
                self.buffer.put_u8(Tag::List16.byte());
                self.buffer.put_u16(size as u16);
            }
            _ => {
                return Err(ProtocolError::MalformedStructure(format!(
                    "list of {size} entries exceeds List16"
                )))
            }
        }
        Ok(())
    }

    fn write_binary(&mut self, raw: &[u8]) -> Result<()> {
        let length = raw.len();
        if length <= 0xFF {
            self.buffer.put_u8(Tag::Binary8.byte());
            self.buffer.put_u8(length as u8);
        } else if length < 1 << 20 {
            self.buffer.put_u8(Tag::Binary20.byte());
            self.buffer.put_u8(((length >> 16) & 0x0F) as u8);
            self.buffer.put_u8((length >> 8) as u8);
            self.buffer.put_u8(length as u8);
        } else {
            let length = u32::try_from(length).map_err(|_| {
                ProtocolError::MalformedStructure(format!("{length} bytes exceeds Binary32"))
            })?;
            self.buffer.put_u8(Tag::Binary32.byte());
            self.buffer.put_u32(length);
        }
        self.buffer.put_slice(raw);
        Ok(())
    }

    fn write_string(&mut self, value: &str) -> Result<()> {
        if value == USER_SERVER_ALIAS {
            if let Some(index) = tokens::single_byte_index(USER_SERVER) {
                self.buffer.put_u8(index);
                return Ok(());
            }
        }
        if value != USER_SERVER {
            if let Some(index) = tokens::single_byte_index(value) {
                self.buffer.put_u8(index);
                return Ok(());
            }
        }
        if let Some((dictionary, index)) = tokens::double_byte_index(value) {
            if let Some(tag) = Tag::for_dictionary(dictionary) {
                self.buffer.put_u8(tag.byte());
                self.buffer.put_u8(index);
                return Ok(());
            }
        }
        if let Some(tag) = packable(value) {
            self.write_packed(tag, value);
            return Ok(());
        }
        if let Some((user, server)) = jid_parts(value) {
            self.buffer.put_u8(Tag::JidPair.byte());
            self.write_string(user)?;
            return self.write_string(server);
        }
        self.write_binary(value.as_bytes())
    }

    fn write_packed(&mut self, tag: Tag, value: &str) {
        let digits: Vec<u8> = value.bytes().filter_map(|c| pack(tag, c)).collect();
        let odd = digits.len() % 2 == 1;
        let count = digits.len().div_ceil(2);

        self.buffer.put_u8(tag.byte());
        self.buffer.put_u8(count as u8 | if odd { 0x80 } else { 0 });
        for pair in digits.chunks(2) {
            let high = pair[0];
            let low = pair.get(1).copied().unwrap_or(match tag {
                Tag::Nibble8 => 0x0F,
                _ => 0x00,
            });
            self.buffer.put_u8((high << 4) | low);
        }
    }
}

fn pack(tag: Tag, c: u8) -> Option<u8> {
    match (tag, c) {
        (_, b'0'..=b'9') => Some(c - b'0'),
        (Tag::Nibble8, b'-') => Some(10),
        (Tag::Nibble8, b'.') => Some(11),
        (Tag::Hex8, b'A'..=b'F') => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Packed tag able to carry `value`, if any.
fn packable(value: &str) -> Option<Tag> {
    if value.is_empty() || value.len().div_ceil(2) > MAX_PACKED_BYTES {
        return None;
    }
    [Tag::Nibble8, Tag::Hex8]
        .into_iter()
        .find(|&tag| value.bytes().all(|c| pack(tag, c).is_some()))
}

fn jid_parts(value: &str) -> Option<(&str, &str)> {
    let (user, server) = value.split_once('@')?;
    if user.is_empty() || server.is_empty() || server.contains('@') {
        return None;
    }
    Some((user, server))
}
