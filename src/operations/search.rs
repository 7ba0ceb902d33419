//! Text search request builder.
//!
//! The SearchBuilder provides a fluent, type-safe API for constructing
//! text searches. It validates inputs and fills in per-kind default fields.

use crate::entity::EntityKind;
use crate::error::ValidationError;
use crate::query::{is_identifier, MAX_QUERY_LEN};

/// A validated text search over one entity kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSearch {
    /// Kind of node to search.
    pub kind: EntityKind,
    /// Properties to match; a node matches if any one of them holds every
    /// token, or with `join_fields` if their joined text does.
    pub fields: Vec<String>,
    /// Match against all `fields` joined with spaces instead of each one.
    pub join_fields: bool,
    /// Raw user query.
    pub query: String,
    /// Result cap; `None` uses the resolver's configured limit for the kind.
    pub limit: Option<usize>,
    /// Reject queries that are empty after stopword removal instead of
    /// matching everything.
    pub require_tokens: bool,
}

/// Builder for [`TextSearch`].
///
/// # Example
/// ```
/// use gnosis::{EntityKind, SearchBuilder};
///
/// let search = SearchBuilder::new(EntityKind::Dataset)
///     .query("yelp reviews")
///     .field("name")
///     .field("description")
///     .limit(5)
///     .build()
///     .unwrap();
/// assert_eq!(search.fields, vec!["name", "description"]);
/// ```
#[derive(Debug, Clone)]
pub struct SearchBuilder {
    kind: EntityKind,
    fields: Vec<String>,
    join_fields: bool,
    query: Option<String>,
    limit: Option<usize>,
    require_tokens: bool,
}

impl SearchBuilder {
    /// Creates a builder for the given kind.
    #[must_use]
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            fields: Vec::new(),
            join_fields: false,
            query: None,
            limit: None,
            require_tokens: false,
        }
    }

    /// Set the query text (required).
    #[must_use]
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Add a property to match against.
    #[must_use]
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.fields.push(field.into());
        self
    }

    /// Match the fields as one text, so tokens may spread across them.
    #[must_use]
    pub fn join_fields(mut self) -> Self {
        self.join_fields = true;
        self
    }

    /// Set maximum number of results.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Fail with `NoSearchTokens` instead of matching everything.
    #[must_use]
    pub fn require_tokens(mut self) -> Self {
        self.require_tokens = true;
        self
    }

    /// Build the search.
    ///
    /// Returns `ValidationError` if:
    /// - No query is specified
    /// - A field is not a plain identifier
    /// - The limit is zero
    /// - The query exceeds [`MAX_QUERY_LEN`]
    pub fn build(self) -> Result<TextSearch, ValidationError> {
        let query = self.query.ok_or_else(|| ValidationError::MissingField {
            field: "query".to_string(),
        })?;
        if query.len() > MAX_QUERY_LEN {
            return Err(ValidationError::FieldTooLong {
                field: "query".to_string(),
                max_length: MAX_QUERY_LEN,
            });
        }
        if self.limit == Some(0) {
            return Err(ValidationError::InvalidLimit {
                field: "limit".to_string(),
            });
        }

        // A person's name is searched as a whole.
        let (fields, join_fields) = if self.fields.is_empty() {
            (default_fields(self.kind), self.kind == EntityKind::Person)
        } else {
            (self.fields, self.join_fields)
        };
        if let Some(bad) = fields.iter().find(|f| !is_identifier(f)) {
            return Err(ValidationError::InvalidField { field: bad.clone() });
        }

        Ok(TextSearch {
            kind: self.kind,
            fields,
            join_fields,
            query,
            limit: self.limit,
            require_tokens: self.require_tokens,
        })
    }
}

/// The property searched when the caller names none.
fn default_fields(kind: EntityKind) -> Vec<String> {
    let fields: &[&str] = match kind {
        EntityKind::Paper => &["title"],
        EntityKind::Person => &["first_name", "middle_name", "last_name"],
        EntityKind::Venue | EntityKind::Dataset => &["name"],
        EntityKind::Comment => &["text"],
    };
    fields.iter().map(|f| (*f).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_required() {
        let result = SearchBuilder::new(EntityKind::Paper).build();
        assert!(matches!(
            result,
            Err(ValidationError::MissingField { field }) if field == "query"
        ));
    }

    #[test]
    fn test_default_fields() {
        let search = SearchBuilder::new(EntityKind::Paper)
            .query("graphs")
            .build()
            .unwrap();
        assert_eq!(search.fields, vec!["title"]);
        assert_eq!(search.limit, None);
        assert!(!search.require_tokens);

        let search = SearchBuilder::new(EntityKind::Person)
            .query("ada")
            .build()
            .unwrap();
        assert_eq!(search.fields, vec!["first_name", "middle_name", "last_name"]);
        assert!(search.join_fields);
    }

    #[test]
    fn test_explicit_fields_match_separately() {
        let search = SearchBuilder::new(EntityKind::Person)
            .query("ada")
            .field("last_name")
            .build()
            .unwrap();
        assert!(!search.join_fields);

        let search = SearchBuilder::new(EntityKind::Dataset)
            .query("yelp")
            .field("name")
            .field("keywords")
            .join_fields()
            .build()
            .unwrap();
        assert!(search.join_fields);
    }

    #[test]
    fn test_zero_limit_rejected() {
        let result = SearchBuilder::new(EntityKind::Venue)
            .query("icml")
            .limit(0)
            .build();
        assert!(matches!(result, Err(ValidationError::InvalidLimit { .. })));
    }

    #[test]
    fn test_field_must_be_identifier() {
        let result = SearchBuilder::new(EntityKind::Paper)
            .query("x")
            .field("title) DELETE n")
            .build();
        assert!(matches!(result, Err(ValidationError::InvalidField { .. })));
    }

    #[test]
    fn test_require_tokens_flag() {
        let search = SearchBuilder::new(EntityKind::Paper)
            .query("the")
            .require_tokens()
            .limit(3)
            .build()
            .unwrap();
        assert!(search.require_tokens);
        assert_eq!(search.limit, Some(3));
    }

    #[test]
    fn test_oversized_query_rejected() {
        let result = SearchBuilder::new(EntityKind::Paper)
            .query("x".repeat(MAX_QUERY_LEN + 1))
            .build();
        assert!(matches!(result, Err(ValidationError::FieldTooLong { .. })));
    }
}
