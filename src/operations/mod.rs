//! Operation builders for Gnosis.
//!
//! These builders provide a fluent, type-safe API for constructing
//! catalog requests. They validate inputs before anything touches a store.

mod search;

pub use search::{SearchBuilder, TextSearch};
