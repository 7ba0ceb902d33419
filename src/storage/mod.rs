//! Storage traits and backends for Gnosis.
//!
//! The graph side holds papers, persons, venues, datasets and comments; the
//! bookmark side mirrors the relational account store.

mod memory;
mod traits;

pub use memory::{InMemoryBookmarkStore, InMemoryGraphStore, InMemoryTransaction};
pub use traits::{BookmarkStore, GraphOps, GraphStore, GraphTransaction, StorageError};
