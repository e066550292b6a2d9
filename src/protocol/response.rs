//! Inbound JSON text responses.
//!
//! Text frames arrive as `<tag>,<json>`. The JSON is either an object or an
//! array whose first object element carries the fields, e.g.
//! `["Cmd",{"type":"disconnect","kind":"replaced"}]`.

use crate::error::{ProtocolError, Result};
use serde_json::{Map, Value};

/// A parsed text response
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Response {
    tag: Option<String>,
    body: Map<String, Value>,
}

impl Response {
    /// Parse a raw text frame.
    ///
    /// # Errors
    /// `Json` if the body is not valid JSON, `MalformedStructure` if it is a
    /// JSON scalar rather than an object or array.
    pub fn parse(text: &str) -> Result<Self> {
        let (tag, json) = split_tag(text);

        let json = json.trim();
        if json.is_empty() {
            return Ok(Self {
                tag,
                body: Map::new(),
            });
        }

        let body = match serde_json::from_str::<Value>(json)? {
            Value::Object(map) => map,
            Value::Array(items) => items
                .into_iter()
                .find_map(|item| match item {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .unwrap_or_default(),
            other => {
                return Err(ProtocolError::MalformedStructure(format!(
                    "text response is not an object: {other}"
                )))
            }
        };

        Ok(Self { tag, body })
    }

    /// Message tag preceding the first comma, if any
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// `status` as an integer; numeric strings are accepted
    pub fn status(&self) -> Option<i64> {
        self.integer("status")
    }

    /// Pairing QR lifetime in milliseconds
    pub fn ttl(&self) -> Option<u64> {
        self.integer("ttl").and_then(|ttl| u64::try_from(ttl).ok())
    }

    pub fn string(&self, key: &str) -> Option<&str> {
        self.body.get(key).and_then(Value::as_str)
    }

    pub fn required_string(&self, key: &str) -> Result<&str> {
        self.string(key)
            .ok_or_else(|| ProtocolError::MissingField(key.to_owned()))
    }

    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    fn integer(&self, key: &str) -> Option<i64> {
        match self.body.get(key)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

fn split_tag(text: &str) -> (Option<String>, &str) {
    match text.split_once(',') {
        Some((tag, rest)) if !looks_like_json(tag) => (Some(tag.to_owned()), rest),
        _ => (None, text),
    }
}

fn looks_like_json(prefix: &str) -> bool {
    matches!(prefix.trim_start().as_bytes().first(), Some(b'{') | Some(b'['))
}
