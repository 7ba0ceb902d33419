use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{EntityKind, NodeId};
use crate::error::ValidationError;
use crate::model::{GraphEntity, UserId};

/// A whitespace-tokenized personal name: "First [Middle...] Last".
///
/// A single token is both the first and the last name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonName {
    tokens: Vec<String>,
}

impl PersonName {
    /// Splits `name` on whitespace.
    ///
    /// # Errors
    /// Returns `ValidationError::EmptyName` if no tokens remain.
    pub fn parse(name: &str) -> Result<Self, ValidationError> {
        let tokens: Vec<String> = name.split_whitespace().map(str::to_string).collect();
        if tokens.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(Self { tokens })
    }

    /// The first token.
    #[must_use]
    pub fn first(&self) -> &str {
        &self.tokens[0]
    }

    /// The last token.
    #[must_use]
    pub fn last(&self) -> &str {
        &self.tokens[self.tokens.len() - 1]
    }

    /// The interior tokens; empty unless the name has three or more tokens.
    #[must_use]
    pub fn middle(&self) -> &[String] {
        if self.tokens.len() > 2 {
            &self.tokens[1..self.tokens.len() - 1]
        } else {
            &[]
        }
    }

    /// Whether the name carries middle names.
    #[must_use]
    pub fn has_middle(&self) -> bool {
        self.tokens.len() > 2
    }

    /// Number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Always false: a parsed name has at least one token.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Lower-cased tokens, as used in graph queries.
    #[must_use]
    pub fn lowercase_tokens(&self) -> Vec<String> {
        self.tokens.iter().map(|t| t.to_lowercase()).collect()
    }
}

/// A person (author, advisor, researcher).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    /// Node id.
    pub id: NodeId,

    /// Given name.
    pub first_name: String,

    /// Zero or more middle names.
    #[serde(default)]
    pub middle_name: Vec<String>,

    /// Family name.
    pub last_name: String,

    /// Institution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,

    /// Home page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    /// Curating user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserId>,

    /// Creation time.
    pub created: DateTime<Utc>,
}

impl Person {
    /// Creates a person from explicit name parts.
    #[must_use]
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            first_name: first_name.into(),
            middle_name: Vec::new(),
            last_name: last_name.into(),
            affiliation: None,
            website: None,
            created_by: None,
            created: Utc::now(),
        }
    }

    /// Creates a person from a parsed name.
    ///
    /// # Examples
    ///
    /// ```
    /// use gnosis::{Person, PersonName};
    ///
    /// let name = PersonName::parse("Grace Brewster Hopper").unwrap();
    /// let person = Person::from_name(&name);
    /// assert_eq!(person.first_name, "Grace");
    /// assert_eq!(person.middle_name, vec!["Brewster".to_string()]);
    /// assert_eq!(person.last_name, "Hopper");
    /// ```
    #[must_use]
    pub fn from_name(name: &PersonName) -> Self {
        let mut person = Self::new(name.first(), name.last());
        person.middle_name = name.middle().to_vec();
        person
    }

    /// Sets the middle names.
    #[must_use]
    pub fn with_middle_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.middle_name = names.into_iter().map(Into::into).collect();
        self
    }

    /// All name parts joined with spaces.
    #[must_use]
    pub fn full_name(&self) -> String {
        std::iter::once(self.first_name.as_str())
            .chain(self.middle_name.iter().map(String::as_str))
            .chain(std::iter::once(self.last_name.as_str()))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Initial and last name, e.g. "A. Lovelace".
    #[must_use]
    pub fn short_name(&self) -> String {
        match self.first_name.chars().next() {
            Some(initial) => format!("{initial}. {}", self.last_name),
            None => self.last_name.clone(),
        }
    }

    /// Field-level comparison against a parsed name, ignoring case.
    ///
    /// First and last names must equal the first and last tokens. Middle
    /// names are only compared when the query has three or more tokens.
    #[must_use]
    pub fn matches_name(&self, name: &PersonName) -> bool {
        if !eq_folded(&self.first_name, name.first()) || !eq_folded(&self.last_name, name.last()) {
            return false;
        }
        if !name.has_middle() {
            return true;
        }
        self.middle_name.len() == name.middle().len()
            && self
                .middle_name
                .iter()
                .zip(name.middle())
                .all(|(stored, wanted)| eq_folded(stored, wanted))
    }
}

fn eq_folded(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

impl GraphEntity for Person {
    const KIND: EntityKind = EntityKind::Person;

    fn id(&self) -> NodeId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_first_middle_last() {
        let name = PersonName::parse("  Grace   Brewster Murray Hopper ").unwrap();
        assert_eq!(name.first(), "Grace");
        assert_eq!(name.middle(), &["Brewster".to_string(), "Murray".to_string()]);
        assert_eq!(name.last(), "Hopper");
        assert_eq!(name.len(), 4);
    }

    #[test]
    fn parse_two_tokens_has_no_middle() {
        let name = PersonName::parse("Ada Lovelace").unwrap();
        assert!(!name.has_middle());
        assert!(name.middle().is_empty());
    }

    #[test]
    fn parse_single_token_is_first_and_last() {
        let name = PersonName::parse("Plato").unwrap();
        assert_eq!(name.first(), "Plato");
        assert_eq!(name.last(), "Plato");
    }

    #[test]
    fn parse_rejects_blank() {
        assert!(matches!(
            PersonName::parse(" \t "),
            Err(ValidationError::EmptyName)
        ));
    }

    #[test]
    fn short_and_full_names() {
        let p = Person::new("Ada", "Lovelace").with_middle_names(["King"]);
        assert_eq!(p.short_name(), "A. Lovelace");
        assert_eq!(p.full_name(), "Ada King Lovelace");
    }

    #[test]
    fn matches_name_ignores_case() {
        let p = Person::new("Ada", "Lovelace");
        assert!(p.matches_name(&PersonName::parse("ada LOVELACE").unwrap()));
        assert!(!p.matches_name(&PersonName::parse("Lovelace Ada").unwrap()));
    }

    #[test]
    fn two_token_query_ignores_stored_middle_name() {
        let p = Person::new("Grace", "Hopper").with_middle_names(["Brewster"]);
        assert!(p.matches_name(&PersonName::parse("Grace Hopper").unwrap()));
    }

    #[test]
    fn middle_names_compared_positionally() {
        let p = Person::new("Grace", "Hopper").with_middle_names(["Brewster", "Murray"]);
        assert!(p.matches_name(&PersonName::parse("Grace Brewster Murray Hopper").unwrap()));
        assert!(!p.matches_name(&PersonName::parse("Grace Murray Brewster Hopper").unwrap()));
        assert!(!p.matches_name(&PersonName::parse("Grace Brewster Hopper").unwrap()));
    }
}
