//! Node identity, entity kinds and relationship types.
//!
//! Every catalog entity is a node in the property graph. Nodes are addressed
//! by a stable [`NodeId`] and tagged with an [`EntityKind`]; edges carry a
//! [`Relationship`] whose endpoint kinds are fixed.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Globally unique, stable node identifier.
///
/// # Examples
///
/// ```
/// use gnosis::NodeId;
///
/// let id = NodeId::new();
/// assert!(!id.is_nil());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Creates a new random node ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a node ID from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Returns true if this is a nil (all zeros) UUID.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for NodeId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// The label of a graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A published or preprint paper
    Paper,
    /// An author or researcher
    Person,
    /// A conference, journal or workshop edition
    Venue,
    /// A dataset papers evaluate on
    Dataset,
    /// A user comment about a paper
    Comment,
}

impl EntityKind {
    /// The Cypher label for this kind.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Paper => "Paper",
            Self::Person => "Person",
            Self::Venue => "Venue",
            Self::Dataset => "Dataset",
            Self::Comment => "Comment",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Paper => write!(f, "paper"),
            Self::Person => write!(f, "person"),
            Self::Venue => write!(f, "venue"),
            Self::Dataset => write!(f, "dataset"),
            Self::Comment => write!(f, "comment"),
        }
    }
}

/// Typed, directed relationships between catalog nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    /// Paper → Paper
    Cites,
    /// Paper → Venue, at most one per paper
    WasPublishedAt,
    /// Paper → Dataset
    EvaluatesOn,
    /// Person → Paper
    Authors,
    /// Person → Person
    AdvisorOf,
    /// Person → Person
    CoAuthorsWith,
    /// Comment → Paper
    Discusses,
}

impl Relationship {
    /// The `(source, target)` kinds this relationship connects.
    #[must_use]
    pub const fn endpoints(self) -> (EntityKind, EntityKind) {
        match self {
            Self::Cites => (EntityKind::Paper, EntityKind::Paper),
            Self::WasPublishedAt => (EntityKind::Paper, EntityKind::Venue),
            Self::EvaluatesOn => (EntityKind::Paper, EntityKind::Dataset),
            Self::Authors => (EntityKind::Person, EntityKind::Paper),
            Self::AdvisorOf | Self::CoAuthorsWith => (EntityKind::Person, EntityKind::Person),
            Self::Discusses => (EntityKind::Comment, EntityKind::Paper),
        }
    }

    /// Whether a source node may hold at most one outgoing edge of this type.
    ///
    /// Connecting a new target replaces the previous edge.
    #[must_use]
    pub const fn is_single(self) -> bool {
        matches!(self, Self::WasPublishedAt)
    }

    /// The relationship type name as stored in the graph.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cites => "cites",
            Self::WasPublishedAt => "was_published_at",
            Self::EvaluatesOn => "evaluates_on",
            Self::Authors => "authors",
            Self::AdvisorOf => "advisor_of",
            Self::CoAuthorsWith => "co_authors_with",
            Self::Discusses => "discusses",
        }
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of an edge to traverse from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Follow edges leaving the node.
    Outgoing,
    /// Follow edges arriving at the node.
    Incoming,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_creation() {
        let id1 = NodeId::new();
        let id2 = NodeId::new();
        assert_ne!(id1, id2);
        assert!(!id1.is_nil());
    }

    #[test]
    fn test_node_id_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = NodeId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), &uuid);
        assert_eq!(id.to_string(), uuid.to_string());
    }

    #[test]
    fn test_kind_display_and_label() {
        assert_eq!(EntityKind::Paper.to_string(), "paper");
        assert_eq!(EntityKind::Dataset.label(), "Dataset");
    }

    #[test]
    fn test_relationship_endpoints() {
        assert_eq!(
            Relationship::Authors.endpoints(),
            (EntityKind::Person, EntityKind::Paper)
        );
        assert_eq!(
            Relationship::Discusses.endpoints(),
            (EntityKind::Comment, EntityKind::Paper)
        );
    }

    #[test]
    fn test_only_venue_edge_is_single() {
        assert!(Relationship::WasPublishedAt.is_single());
        assert!(!Relationship::Authors.is_single());
        assert!(!Relationship::Cites.is_single());
    }

    #[test]
    fn test_relationship_serialization() {
        let json = serde_json::to_string(&Relationship::WasPublishedAt).unwrap();
        assert_eq!(json, "\"was_published_at\"");
        assert_eq!(Relationship::CoAuthorsWith.to_string(), "co_authors_with");
    }
}
