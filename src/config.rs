//! Resolver and catalog configuration.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::stopwords::StopwordSet;

/// Default cap for title, venue and dataset searches.
pub const DEFAULT_TEXT_SEARCH_LIMIT: usize = 25;

/// Default cap for person lookups.
pub const DEFAULT_PERSON_SEARCH_LIMIT: usize = 20;

/// Default number of papers on the landing listing.
pub const DEFAULT_RECENT_PAPERS_LIMIT: usize = 10;

/// Configuration for the entity resolver and the catalog workflows.
///
/// Missing keys fall back to their defaults when deserialized.
///
/// # Examples
///
/// ```
/// use gnosis::ResolverConfig;
///
/// let config = ResolverConfig::from_json(r#"{ "text_search_limit": 50 }"#).unwrap();
/// assert_eq!(config.text_search_limit, 50);
/// assert_eq!(config.person_search_limit, 20);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Max results for text searches.
    pub text_search_limit: usize,
    /// Max results for person searches.
    pub person_search_limit: usize,
    /// Max papers returned by the recent listing.
    pub recent_papers_limit: usize,
    /// Words dropped from text queries.
    pub stopwords: StopwordSet,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            text_search_limit: DEFAULT_TEXT_SEARCH_LIMIT,
            person_search_limit: DEFAULT_PERSON_SEARCH_LIMIT,
            recent_papers_limit: DEFAULT_RECENT_PAPERS_LIMIT,
            stopwords: StopwordSet::english(),
        }
    }
}

impl ResolverConfig {
    /// Parses and validates a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ValidationError::InvalidConfig {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every limit is positive.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("text_search_limit", self.text_search_limit),
            ("person_search_limit", self.person_search_limit),
            ("recent_papers_limit", self.recent_papers_limit),
        ] {
            if value == 0 {
                return Err(ValidationError::InvalidLimit {
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Replaces the stopword set.
    #[must_use]
    pub fn with_stopwords(mut self, stopwords: StopwordSet) -> Self {
        self.stopwords = stopwords;
        self
    }
}
