//! Abstract storage traits for Gnosis.
//!
//! These traits define the contract that storage backends must implement.
//! By using traits, we enable:
//! - In-memory backends for testing and embedded use
//! - A property-graph database backend that executes the rendered Cypher
//! - A relational backend for bookmarks

use thiserror::Error;

use crate::entity::{Direction, EntityKind, NodeId, Relationship};
use crate::model::{Bookmark, BookmarkId, Node, UserId};
use crate::query::Query;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Node not found.
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// A node exists but carries a different label.
    #[error("Node {id} is a {actual}, expected a {expected}")]
    KindMismatch {
        /// The offending node.
        id: NodeId,
        /// Kind required by the caller.
        expected: EntityKind,
        /// Kind stored in the graph.
        actual: EntityKind,
    },

    /// Edge endpoints do not match the relationship's schema.
    #[error("Relationship {relationship} cannot connect a {from} to a {to}")]
    InvalidEdge {
        /// Requested relationship.
        relationship: Relationship,
        /// Kind of the source node.
        from: EntityKind,
        /// Kind of the target node.
        to: EntityKind,
    },

    /// Bookmark not found.
    #[error("Bookmark not found: {0}")]
    BookmarkNotFound(BookmarkId),

    /// Key already exists.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Backend error.
    #[error("Storage backend error: {0}")]
    BackendError(String),

    /// Serialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Read and write operations shared by a graph store and its transactions.
pub trait GraphOps {
    /// Run a named query and return the matching nodes.
    ///
    /// Results follow node insertion order unless the query asks for
    /// newest-first ordering, and are truncated to the query limit.
    fn execute(&self, query: &Query) -> Result<Vec<Node>, StorageError>;

    /// Get a node by ID.
    fn get(&self, id: NodeId) -> Result<Option<Node>, StorageError>;

    /// Insert a new node or replace the properties of an existing one.
    ///
    /// A node's kind never changes; saving a node under a different kind
    /// returns `KindMismatch`.
    fn save(&self, node: Node) -> Result<(), StorageError>;

    /// Add an edge. Connecting an existing edge again is a no-op.
    ///
    /// For single-cardinality relationships any previous outgoing edge of the
    /// same type is removed in the same step.
    ///
    /// # Errors
    /// - `NodeNotFound`: If either endpoint does not exist
    /// - `InvalidEdge`: If the endpoint kinds do not match the relationship
    fn connect(&self, from: NodeId, relationship: Relationship, to: NodeId)
        -> Result<(), StorageError>;

    /// Remove an edge. Returns whether an edge was removed.
    fn disconnect(
        &self,
        from: NodeId,
        relationship: Relationship,
        to: NodeId,
    ) -> Result<bool, StorageError>;

    /// Nodes on the other side of `id`'s edges of the given type, in edge
    /// creation order.
    fn related(
        &self,
        id: NodeId,
        relationship: Relationship,
        direction: Direction,
    ) -> Result<Vec<Node>, StorageError>;

    /// Number of nodes of the given kind.
    fn count(&self, kind: EntityKind) -> Result<usize, StorageError>;
}

/// A unit of work against a graph store.
///
/// Changes are visible to the transaction immediately and to everyone else
/// only after [`GraphTransaction::commit`]. Dropping an uncommitted
/// transaction discards its changes.
pub trait GraphTransaction: GraphOps {
    /// Keep every change made through the transaction.
    fn commit(self: Box<Self>) -> Result<(), StorageError>;
}

/// Storage trait for the property graph holding catalog entities.
///
/// # Safety Considerations
/// - Single operations are atomic
/// - Multi-step mutations must go through [`GraphStore::transaction`]
pub trait GraphStore: GraphOps + Send + Sync {
    /// Begin a transaction. Other writers block until it is committed or
    /// dropped.
    fn transaction(&self) -> Result<Box<dyn GraphTransaction + '_>, StorageError>;
}

/// Storage trait for user bookmarks (relational side of the catalog).
pub trait BookmarkStore: Send + Sync {
    /// Insert a new bookmark. Returns error if the ID already exists.
    fn insert(&self, bookmark: Bookmark) -> Result<(), StorageError>;

    /// Insert `bookmark` unless its owner already bookmarked the same paper,
    /// in which case the existing bookmark is returned unchanged.
    fn get_or_insert(&self, bookmark: Bookmark) -> Result<Bookmark, StorageError>;

    /// Get a bookmark by ID.
    fn get(&self, id: BookmarkId) -> Result<Option<Bookmark>, StorageError>;

    /// Delete a bookmark by ID. Returns error if not found.
    fn delete(&self, id: BookmarkId) -> Result<(), StorageError>;

    /// All bookmarks of a user, oldest first.
    fn find_by_owner(&self, owner: UserId) -> Result<Vec<Bookmark>, StorageError>;

    /// All bookmarks pointing at a paper, oldest first.
    fn find_by_paper(&self, paper: NodeId) -> Result<Vec<Bookmark>, StorageError>;
}
