//! # Binary Node Decoder
//!
//! Turns a decrypted [`ByteView`] into a [`Node`] tree without any schema.
//!
//! ## Wire Format
//! ```text
//! node    := list-size description attribute* content?
//! attribute := string string
//! content := list-size node*  |  binary-length raw  |  string
//! ```
//! `list-size` counts the description, each attribute key and value, and the
//! content slot. An odd size means the node has no content.
//!
//! Decoding uses a single forward cursor owned by one call, so a
//! [`BinaryDecoder`] can be shared freely between threads.

use crate::core::bytes::ByteView;
use crate::core::node::{Attributes, Node, NodeContent};
use crate::core::tag::{Lead, Tag};
use crate::core::tokens::{self, USER_SERVER, USER_SERVER_ALIAS};
use crate::error::{constants, ProtocolError, Result};
use crate::transport::MessageDecoder;
use std::sync::Arc;

/// Description of nodes whose binary content is an inner application payload.
pub const MESSAGE_DESCRIPTION: &str = "message";

/// Nesting limit for nodes and JID pairs.
pub const MAX_DEPTH: usize = 256;

/// Stateless decoder; all per-call state lives in a private cursor.
#[derive(Clone, Default)]
pub struct BinaryDecoder {
    messages: Option<Arc<dyn MessageDecoder>>,
}

impl BinaryDecoder {
    pub fn new() -> Self {
        Self { messages: None }
    }

    /// Decoder that hands `message` payloads to `messages`.
    pub fn with_message_decoder(messages: Arc<dyn MessageDecoder>) -> Self {
        Self {
            messages: Some(messages),
        }
    }

    /// Decode one node tree from the start of `buffer`.
    ///
    /// # Errors
    /// `TruncatedInput` if a read runs past the end of `buffer`, `MalformedTag`
    /// for bytes outside every tag and token range, `MalformedStructure` for
    /// trees that break the node grammar.
    pub fn decode(&self, buffer: &ByteView) -> Result<Node> {
        let mut cursor = Cursor {
            buffer,
            index: 0,
            depth: 0,
            messages: self.messages.as_deref(),
        };
        cursor.read_node()
    }
}

impl std::fmt::Debug for BinaryDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinaryDecoder")
            .field("message_decoder", &self.messages.is_some())
            .finish()
    }
}

struct Cursor<'a> {
    buffer: &'a ByteView,
    index: usize,
    depth: usize,
    messages: Option<&'a dyn MessageDecoder>,
}

impl<'a> Cursor<'a> {
    fn ensure(&self, needed: usize) -> Result<()> {
        let available = self.buffer.len() - self.index;
        if needed > available {
            return Err(ProtocolError::TruncatedInput { needed, available });
        }
        Ok(())
    }

    fn remaining(&self) -> usize {
        self.buffer.len() - self.index
    }

    fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        let byte = self.buffer[self.index];
        self.index += 1;
        Ok(byte)
    }

    /// Big-endian unsigned integer of `n` bytes.
    fn read_int(&mut self, n: usize) -> Result<usize> {
        self.ensure(n)?;
        let mut value = 0usize;
        for _ in 0..n {
            value = (value << 8) | self.read_u8()? as usize;
        }
        Ok(value)
    }

    fn read_int20(&mut self) -> Result<usize> {
        self.ensure(3)?;
        let a = self.read_u8()? as usize;
        let b = self.read_u8()? as usize;
        let c = self.read_u8()? as usize;
        Ok(((a & 0x0F) << 16) | (b << 8) | c)
    }

    fn read_bytes(&mut self, n: usize) -> Result<ByteView> {
        self.ensure(n)?;
        let view = self.buffer.slice(self.index, self.index + n)?;
        self.index += n;
        Ok(view)
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= MAX_DEPTH {
            return Err(ProtocolError::MalformedStructure(format!(
                "nesting deeper than {MAX_DEPTH}"
            )));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn read_list_size(&mut self, byte: u8) -> Result<usize> {
        match Lead::classify(byte)? {
            Lead::Tag(Tag::ListEmpty) => Ok(0),
            Lead::Tag(Tag::List8) => Ok(self.read_u8()? as usize),
            Lead::Tag(Tag::List16) => self.read_int(2),
            _ => Err(ProtocolError::MalformedStructure(format!(
                "{}, got {byte:#04x}",
                constants::ERR_NOT_A_LIST
            ))),
        }
    }

    fn read_binary_length(&mut self, tag: Tag) -> Result<usize> {
        match tag {
            Tag::Binary8 => Ok(self.read_u8()? as usize),
            Tag::Binary20 => self.read_int20(),
            Tag::Binary32 => self.read_int(4),
            other => Err(ProtocolError::MalformedStructure(format!(
                "{}, got {other:?}",
                constants::ERR_NOT_BINARY
            ))),
        }
    }

    fn read_node(&mut self) -> Result<Node> {
        self.enter()?;
        let node = self.read_node_inner();
        self.leave();
        node
    }

    fn read_node_inner(&mut self) -> Result<Node> {
        let size_byte = self.read_u8()?;
        let list_size = self.read_list_size(size_byte)?;
        if list_size == 0 {
            return Err(ProtocolError::MalformedStructure(
                constants::ERR_EMPTY_LIST.into(),
            ));
        }

        let description_tag = self.read_u8()?;
        if description_tag == Tag::StreamEnd.byte() {
            return Err(ProtocolError::MalformedStructure(
                constants::ERR_STREAM_END.into(),
            ));
        }
        let description = self.read_string(description_tag)?;

        let pairs = (list_size - 1) >> 1;
        let mut attributes = Attributes::with_capacity(pairs.min(self.remaining() / 2));
        for _ in 0..pairs {
            let key_tag = self.read_u8()?;
            let key = self.read_string(key_tag)?;
            let value_tag = self.read_u8()?;
            let value = self.read_string(value_tag)?;
            attributes.insert(key, value);
        }

        if list_size % 2 == 1 {
            return Ok(Node::from_parts(description, attributes, NodeContent::None));
        }

        let content_tag = self.read_u8()?;
        let content = match Lead::classify(content_tag)? {
            Lead::Tag(tag) if tag.is_list() => {
                let count = self.read_list_size(content_tag)?;
                let mut children = Vec::with_capacity(count.min(self.remaining()));
                for _ in 0..count {
                    children.push(self.read_node()?);
                }
                NodeContent::List(children)
            }
            Lead::Tag(tag) if tag.is_binary() => {
                let length = self.read_binary_length(tag)?;
                let raw = self.read_bytes(length)?;
                self.binary_content(&description, raw)?
            }
            _ => NodeContent::Text(self.read_string(content_tag)?),
        };

        Ok(Node::from_parts(description, attributes, content))
    }

    fn binary_content(&self, description: &str, raw: ByteView) -> Result<NodeContent> {
        if description == MESSAGE_DESCRIPTION {
            return match self.messages {
                Some(messages) => Ok(NodeContent::Message(messages.decode_message(&raw)?)),
                None => Ok(NodeContent::Binary(raw)),
            };
        }
        match std::str::from_utf8(&raw) {
            Ok(text) => Ok(NodeContent::Text(text.to_owned())),
            Err(_) => Ok(NodeContent::Binary(raw)),
        }
    }

    fn read_string(&mut self, byte: u8) -> Result<String> {
        let tag = match Lead::classify(byte)? {
            Lead::Token(index) => {
                let token = tokens::single_byte(index).ok_or(ProtocolError::MalformedTag(byte))?;
                let token = if token == USER_SERVER {
                    USER_SERVER_ALIAS
                } else {
                    token
                };
                return Ok(token.to_owned());
            }
            Lead::Tag(tag) => tag,
        };

        match tag {
            Tag::Dictionary0 | Tag::Dictionary1 | Tag::Dictionary2 | Tag::Dictionary3 => {
                let dictionary = tag.dictionary().unwrap_or_default();
                let index = self.read_u8()?;
                tokens::double_byte(dictionary, index)
                    .map(str::to_owned)
                    .ok_or_else(|| {
                        ProtocolError::MalformedStructure(format!(
                            "no double-byte token at {}",
                            256 * dictionary + index as usize
                        ))
                    })
            }
            Tag::Binary8 | Tag::Binary20 | Tag::Binary32 => {
                let length = self.read_binary_length(tag)?;
                Ok(self.read_bytes(length)?.to_text())
            }
            Tag::JidPair => {
                self.enter()?;
                let jid = self.read_jid_pair();
                self.leave();
                jid
            }
            Tag::Nibble8 | Tag::Hex8 => self.read_packed(tag),
            Tag::ListEmpty | Tag::StreamEnd | Tag::List8 | Tag::List16 => Err(
                ProtocolError::MalformedStructure(format!("{tag:?} cannot start a string")),
            ),
        }
    }

    fn read_jid_pair(&mut self) -> Result<String> {
        let user_tag = self.read_u8()?;
        let user = self.read_string(user_tag)?;
        let server_tag = self.read_u8()?;
        let server = self.read_string(server_tag)?;
        Ok(format!("{user}@{server}"))
    }

    fn read_packed(&mut self, tag: Tag) -> Result<String> {
        let control = self.read_u8()?;
        let count = (control & 0x7F) as usize;
        self.ensure(count)?;

        let mut value = String::with_capacity(count * 2);
        for _ in 0..count {
            let byte = self.read_u8()?;
            value.push(unpack(tag, byte >> 4)?);
            value.push(unpack(tag, byte & 0x0F)?);
        }

        if control & 0x80 != 0 {
            value.pop();
        }
        Ok(value)
    }
}

/// Nibble8 alphabet: `0-9`, `-`, `.`, and the NUL fill nibble.
fn unpack_nibble(value: u8) -> Result<char> {
    match value {
        0..=9 => Ok((b'0' + value) as char),
        10 => Ok('-'),
        11 => Ok('.'),
        15 => Ok('\0'),
        _ => Err(ProtocolError::MalformedStructure(format!(
            "invalid nibble {value}"
        ))),
    }
}

fn unpack_hex(value: u8) -> Result<char> {
    match value {
        0..=9 => Ok((b'0' + value) as char),
        10..=15 => Ok((b'A' + value - 10) as char),
        _ => Err(ProtocolError::MalformedStructure(format!(
            "invalid hex digit {value}"
        ))),
    }
}

fn unpack(tag: Tag, value: u8) -> Result<char> {
    match tag {
        Tag::Nibble8 => unpack_nibble(value),
        Tag::Hex8 => unpack_hex(value),
        other => Err(ProtocolError::MalformedStructure(format!(
            "{other:?} is not a packed tag"
        ))),
    }
}
