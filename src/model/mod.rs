//! Catalog entities and their graph representation.
//!
//! Typed entities are stored as [`Node`]s whose properties are the entity's
//! JSON serialization. [`GraphEntity`] converts in both directions.

mod bookmark;
mod comment;
mod dataset;
mod paper;
mod person;
mod venue;

use std::borrow::Cow;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entity::{EntityKind, NodeId};
use crate::storage::StorageError;

pub use bookmark::{Bookmark, BookmarkId, UserId};
pub use comment::{Comment, FlagReason, FlagReport, Moderation};
pub use dataset::Dataset;
pub use paper::Paper;
pub use person::{Person, PersonName};
pub use venue::{Venue, VenueType};

/// A raw graph record: an ID, a label and a property map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Stable node identifier
    pub id: NodeId,
    /// Node label
    pub kind: EntityKind,
    /// Stored properties
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Node {
    /// Creates a node without properties.
    #[must_use]
    pub fn new(id: NodeId, kind: EntityKind) -> Self {
        Self {
            id,
            kind,
            properties: Map::new(),
        }
    }

    /// Sets a property, returning the node for chaining.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Returns a raw property value.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Returns a property as searchable text.
    ///
    /// Strings are returned as-is, lists of strings are joined with spaces,
    /// numbers and booleans are formatted. Missing and null properties yield
    /// `None`.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<Cow<'_, str>> {
        match self.properties.get(name)? {
            Value::String(s) => Some(Cow::Borrowed(s.as_str())),
            Value::Array(items) => {
                let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
                Some(Cow::Owned(parts.join(" ")))
            }
            Value::Number(n) => Some(Cow::Owned(n.to_string())),
            Value::Bool(b) => Some(Cow::Owned(b.to_string())),
            Value::Null | Value::Object(_) => None,
        }
    }

    /// Returns a property as a list of string values.
    ///
    /// A string property yields one value, a list property yields its string
    /// elements, anything else yields nothing.
    #[must_use]
    pub fn text_values(&self, name: &str) -> Vec<&str> {
        match self.properties.get(name) {
            Some(Value::String(s)) => vec![s.as_str()],
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }
}

/// A typed entity that can be stored as a graph node.
pub trait GraphEntity: Serialize + DeserializeOwned {
    /// The node label for this entity.
    const KIND: EntityKind;

    /// The entity's node ID.
    fn id(&self) -> NodeId;

    /// Serializes the entity into a node.
    fn to_node(&self) -> Result<Node, StorageError> {
        let value = serde_json::to_value(self)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        let Value::Object(properties) = value else {
            return Err(StorageError::SerializationError(format!(
                "{} did not serialize to a property map",
                Self::KIND
            )));
        };
        Ok(Node {
            id: self.id(),
            kind: Self::KIND,
            properties,
        })
    }

    /// Builds the typed entity from a raw node.
    ///
    /// # Errors
    /// - `KindMismatch`: If the node carries another label
    /// - `SerializationError`: If the properties do not describe this entity
    fn inflate(node: &Node) -> Result<Self, StorageError> {
        if node.kind != Self::KIND {
            return Err(StorageError::KindMismatch {
                id: node.id,
                expected: Self::KIND,
                actual: node.kind,
            });
        }
        serde_json::from_value(Value::Object(node.properties.clone()))
            .map_err(|e| StorageError::SerializationError(format!("node {}: {e}", node.id)))
    }
}

/// Inflates every node, failing on the first malformed record.
pub fn inflate_all<T: GraphEntity>(nodes: &[Node]) -> Result<Vec<T>, StorageError> {
    nodes.iter().map(T::inflate).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_text_flattens_lists_and_scalars() {
        let node = Node::new(NodeId::new(), EntityKind::Person)
            .with_property("middle_name", vec!["Brewster", "M."])
            .with_property("first_name", "Grace")
            .with_property("peer_reviewed", true)
            .with_property("nothing", Value::Null);

        assert_eq!(node.text("middle_name").as_deref(), Some("Brewster M."));
        assert_eq!(node.text("first_name").as_deref(), Some("Grace"));
        assert_eq!(node.text("peer_reviewed").as_deref(), Some("true"));
        assert!(node.text("nothing").is_none());
        assert!(node.text("missing").is_none());
    }

    #[test]
    fn node_text_values() {
        let node = Node::new(NodeId::new(), EntityKind::Person)
            .with_property("middle_name", vec!["A", "B"])
            .with_property("last_name", "Hopper");
        assert_eq!(node.text_values("middle_name"), vec!["A", "B"]);
        assert_eq!(node.text_values("last_name"), vec!["Hopper"]);
        assert!(node.text_values("missing").is_empty());
    }

    #[test]
    fn inflate_rejects_wrong_kind() {
        let paper = Paper::new("Attention is all you need");
        let mut node = paper.to_node().unwrap();
        node.kind = EntityKind::Venue;
        assert!(matches!(
            Paper::inflate(&node),
            Err(StorageError::KindMismatch { .. })
        ));
    }

    #[test]
    fn inflate_rejects_malformed_properties() {
        let node = Node::new(NodeId::new(), EntityKind::Paper).with_property("title", 42);
        assert!(matches!(
            Paper::inflate(&node),
            Err(StorageError::SerializationError(_))
        ));
    }
}
