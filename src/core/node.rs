//! Decoded protocol tree.

use crate::core::bytes::ByteView;
use indexmap::IndexMap;

/// Node attributes in wire order. Re-inserting a key replaces its value in place.
pub type Attributes = IndexMap<String, String>;

/// What a node carries after its attributes.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum NodeContent {
    #[default]
    None,
    Text(String),
    Binary(ByteView),
    List(Vec<Node>),
    /// Inner payload of a `message` node, decoded by a [`MessageDecoder`](crate::transport::MessageDecoder).
    Message(serde_json::Value),
}

/// A single node of the binary protocol tree. Built once by the decoder, then read-only.
///
/// Equality takes attribute order into account.
#[derive(Debug, Clone)]
pub struct Node {
    description: String,
    attributes: Attributes,
    content: NodeContent,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.description == other.description
            && self.attributes.iter().eq(other.attributes.iter())
            && self.content == other.content
    }
}

impl Node {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            attributes: Attributes::new(),
            content: NodeContent::None,
        }
    }

    pub fn from_parts(
        description: impl Into<String>,
        attributes: Attributes,
        content: NodeContent,
    ) -> Self {
        Self {
            description: description.into(),
            attributes,
            content,
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_content(mut self, content: NodeContent) -> Self {
        self.content = content;
        self
    }

    pub fn with_children(self, children: Vec<Node>) -> Self {
        self.with_content(NodeContent::List(children))
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_content(NodeContent::Text(text.into()))
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn content(&self) -> &NodeContent {
        &self.content
    }

    /// Child nodes, empty unless the content is a list.
    pub fn children(&self) -> &[Node] {
        match &self.content {
            NodeContent::List(children) => children,
            _ => &[],
        }
    }

    /// First child with the given description.
    pub fn child(&self, description: &str) -> Option<&Node> {
        self.children()
            .iter()
            .find(|child| child.description == description)
    }

    pub fn text(&self) -> Option<&str> {
        match &self.content {
            NodeContent::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn into_parts(self) -> (String, Attributes, NodeContent) {
        (self.description, self.attributes, self.content)
    }
}
