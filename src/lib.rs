//! # Gnosis - an academic paper catalog core
//!
//! Gnosis keeps papers, people, venues, datasets and comments in a property
//! graph and bookmarks in a relational store. This crate holds the part of
//! the system that does not care about HTTP: the entity resolver and the
//! curation workflows built on top of it.
//!
//! ## Core Concepts
//!
//! - **Node**: A graph record with a stable ID, a label and a property map
//! - **TextPredicate**: "every non-stopword token occurs in the field, in any order"
//! - **EntityResolver**: Fuzzy lookups plus the find-or-create author policy
//! - **Catalog**: Paper creation, venue and author linking, comments, bookmarks
//!
//! ## Usage
//!
//! ```rust
//! use gnosis::{AuthorResolution, Catalog, Paper, PaperCreation};
//!
//! let catalog = Catalog::in_memory();
//! let outcome = catalog
//!     .create_paper(
//!         Paper::new("Sketch of the Analytical Engine"),
//!         &gnosis::split_author_list("Ada Lovelace, Luigi Menabrea"),
//!     )
//!     .unwrap();
//!
//! let PaperCreation::Created { paper, authors } = outcome else {
//!     panic!("title was new");
//! };
//! assert!(matches!(authors[0].1, AuthorResolution::Created(_)));
//!
//! let found = catalog.search_papers("analytical engine").unwrap();
//! assert_eq!(found[0].id, paper.id);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod config;
pub mod entity;
pub mod error;
pub mod model;
pub mod query;
pub mod stopwords;

// Storage, operations and services
pub mod catalog;
pub mod operations;
pub mod resolver;
pub mod storage;

// Re-export primary types at crate root for convenience
pub use catalog::{split_author_list, Catalog, PaperCreation, PaperDetail, PaperSummary, VenueLink};
pub use config::ResolverConfig;
pub use entity::{Direction, EntityKind, NodeId, Relationship};
pub use error::{ExecutionError, GnosisError, GnosisResult, ValidationError};
pub use model::{
    inflate_all, Bookmark, BookmarkId, Comment, Dataset, FlagReason, FlagReport, GraphEntity,
    Moderation, Node, Paper, Person, PersonName, UserId, Venue, VenueType,
};
pub use operations::{SearchBuilder, TextSearch};
pub use query::{CypherStatement, Filter, Query, ResultOrder, TextPredicate};
pub use resolver::{AuthorResolution, EntityResolver, PersonMatch};
pub use stopwords::{tokenize, StopwordSet};
pub use storage::{
    BookmarkStore, GraphOps, GraphStore, GraphTransaction, InMemoryBookmarkStore,
    InMemoryGraphStore, InMemoryTransaction, StorageError,
};
