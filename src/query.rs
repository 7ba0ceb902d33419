//! Named, parameterized graph queries.
//!
//! Every lookup the catalog performs is one of the constructors on
//! [`Query`]. A query is plain data: the in-memory backend evaluates its
//! [`Filter`] directly, and a database backend runs the statement produced
//! by [`Query::to_cypher`], where user input only ever appears in the
//! parameter map.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use regex::RegexSet;
use serde_json::Value;

use crate::entity::EntityKind;
use crate::error::ValidationError;
use crate::model::Node;
use crate::stopwords::{tokenize, StopwordSet};

/// Upper bound on raw query text accepted by the resolver.
pub const MAX_QUERY_LEN: usize = 1024;

/// "Every token occurs somewhere in the text, in any order, ignoring case."
///
/// A predicate without tokens matches everything.
///
/// # Examples
///
/// ```
/// use gnosis::{StopwordSet, TextPredicate};
///
/// let p = TextPredicate::from_text("graphs of Learning", &StopwordSet::english()).unwrap();
/// assert!(p.is_match("Learning on Graphs"));
/// assert!(!p.is_match("Learning on Trees"));
/// ```
#[derive(Debug, Clone)]
pub struct TextPredicate {
    tokens: Vec<String>,
    set: Option<RegexSet>,
}

impl TextPredicate {
    /// Builds a predicate from already-normalized tokens.
    ///
    /// Tokens are escaped, so regex metacharacters in user input match
    /// literally.
    pub fn new(tokens: Vec<String>) -> Result<Self, ValidationError> {
        if tokens.is_empty() {
            return Ok(Self::match_all());
        }
        let patterns = tokens.iter().map(|t| format!("(?i){}", regex::escape(t)));
        let set = RegexSet::new(patterns).map_err(|e| ValidationError::InvalidPattern {
            reason: e.to_string(),
        })?;
        Ok(Self {
            tokens,
            set: Some(set),
        })
    }

    /// Tokenizes `text` against `stopwords` and builds the predicate.
    pub fn from_text(text: &str, stopwords: &StopwordSet) -> Result<Self, ValidationError> {
        if text.len() > MAX_QUERY_LEN {
            return Err(ValidationError::FieldTooLong {
                field: "query".to_string(),
                max_length: MAX_QUERY_LEN,
            });
        }
        Self::new(tokenize(text, stopwords))
    }

    /// A predicate that accepts any text.
    #[must_use]
    pub fn match_all() -> Self {
        Self {
            tokens: Vec::new(),
            set: None,
        }
    }

    /// Lower-cased search tokens.
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Whether the predicate degenerated to "match everything".
    #[must_use]
    pub fn matches_everything(&self) -> bool {
        self.set.is_none()
    }

    /// Whether every token occurs in `text`, ignoring case.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        match &self.set {
            None => true,
            Some(set) => set.matches(text).matched_all(),
        }
    }

    /// The equivalent single pattern for a regex engine with lookahead
    /// (the graph database's `=~` operator).
    #[must_use]
    pub fn cypher_pattern(&self) -> String {
        let mut pattern = String::from("(?is)");
        for token in &self.tokens {
            let _ = write!(pattern, "(?=.*{})", regex::escape(token));
        }
        pattern.push_str(".*");
        pattern
    }

    /// One `=~` pattern per token, each matching text that contains it.
    #[must_use]
    pub fn token_patterns(&self) -> Vec<String> {
        self.tokens
            .iter()
            .map(|token| format!("(?is).*{}.*", regex::escape(token)))
            .collect()
    }
}

impl PartialEq for TextPredicate {
    fn eq(&self, other: &Self) -> bool {
        self.tokens == other.tokens
    }
}

/// Node predicates a backend must be able to evaluate.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Accept every node.
    All,
    /// Text property satisfies a token predicate.
    Matches {
        /// Property name.
        field: String,
        /// Token predicate to satisfy.
        predicate: TextPredicate,
    },
    /// Text properties joined with spaces satisfy a token predicate.
    MatchesJoined {
        /// Property names, joined in this order.
        fields: Vec<String>,
        /// Token predicate to satisfy.
        predicate: TextPredicate,
    },
    /// Text property starts with a literal prefix.
    StartsWith {
        /// Property name.
        field: String,
        /// Required prefix.
        prefix: String,
    },
    /// Text property equals a value, ignoring case.
    EqualsIgnoreCase {
        /// Property name.
        field: String,
        /// Value to compare with.
        value: String,
    },
    /// Boolean property is set.
    IsTrue {
        /// Property name.
        field: String,
    },
    /// Lower-cased scalar property is one of `tokens`.
    InTokens {
        /// Property name.
        field: String,
        /// Accepted lower-case values.
        tokens: Vec<String>,
    },
    /// List property is non-empty and each lower-cased element is one of
    /// `tokens`.
    EachInTokens {
        /// Property name.
        field: String,
        /// Accepted lower-case values.
        tokens: Vec<String>,
    },
    /// Every sub-filter holds.
    And(Vec<Filter>),
    /// At least one sub-filter holds.
    Or(Vec<Filter>),
}

impl Filter {
    /// Evaluates the filter against a node's properties.
    #[must_use]
    pub fn evaluate(&self, node: &Node) -> bool {
        match self {
            Self::All => true,
            Self::Matches { field, predicate } => node
                .text(field)
                .map_or(false, |text| predicate.is_match(&text)),
            Self::MatchesJoined { fields, predicate } => {
                let parts: Vec<_> = fields.iter().filter_map(|f| node.text(f)).collect();
                !parts.is_empty() && predicate.is_match(&parts.join(" "))
            }
            Self::StartsWith { field, prefix } => node
                .text(field)
                .map_or(false, |text| text.starts_with(prefix.as_str())),
            Self::EqualsIgnoreCase { field, value } => node
                .text(field)
                .map_or(false, |text| text.to_lowercase() == value.to_lowercase()),
            Self::IsTrue { field } => node.property(field).and_then(Value::as_bool) == Some(true),
            Self::InTokens { field, tokens } | Self::EachInTokens { field, tokens } => {
                let values = node.text_values(field);
                !values.is_empty()
                    && values
                        .iter()
                        .all(|v| tokens.iter().any(|t| *t == v.to_lowercase()))
            }
            Self::And(filters) => filters.iter().all(|f| f.evaluate(node)),
            Self::Or(filters) => filters.iter().any(|f| f.evaluate(node)),
        }
    }

    fn render(&self, var: &str, params: &mut Params) -> String {
        match self {
            Self::All => "true".to_string(),
            Self::Matches { field, predicate } => {
                let p = params.bind(Value::String(predicate.cypher_pattern()));
                format!("{var}.{field} =~ ${p}")
            }
            // Tokens hold no whitespace, so none can straddle the joining
            // space: each token only has to occur in some field.
            Self::MatchesJoined { fields, predicate } => {
                if fields.is_empty() {
                    return "false".to_string();
                }
                let patterns = predicate.token_patterns();
                if patterns.is_empty() {
                    let present: Vec<String> = fields
                        .iter()
                        .map(|f| format!("{var}.{f} IS NOT NULL"))
                        .collect();
                    return format!("({})", present.join(" OR "));
                }
                let clauses: Vec<String> = patterns
                    .into_iter()
                    .map(|pattern| {
                        let p = params.bind(Value::String(pattern));
                        let any: Vec<String> =
                            fields.iter().map(|f| format!("{var}.{f} =~ ${p}")).collect();
                        format!("({})", any.join(" OR "))
                    })
                    .collect();
                format!("({})", clauses.join(" AND "))
            }
            Self::StartsWith { field, prefix } => {
                let p = params.bind(Value::String(prefix.clone()));
                format!("toString({var}.{field}) STARTS WITH ${p}")
            }
            Self::EqualsIgnoreCase { field, value } => {
                let p = params.bind(Value::String(value.to_lowercase()));
                format!("toLower({var}.{field}) = ${p}")
            }
            Self::IsTrue { field } => format!("{var}.{field} = true"),
            Self::InTokens { field, tokens } => {
                let p = params.bind(tokens_value(tokens));
                format!("toLower({var}.{field}) IN ${p}")
            }
            Self::EachInTokens { field, tokens } => {
                let p = params.bind(tokens_value(tokens));
                format!(
                    "(size({var}.{field}) > 0 AND all(x IN {var}.{field} WHERE toLower(x) IN ${p}))"
                )
            }
            Self::And(filters) => join_rendered(filters, " AND ", var, params),
            Self::Or(filters) => join_rendered(filters, " OR ", var, params),
        }
    }
}

fn tokens_value(tokens: &[String]) -> Value {
    Value::Array(tokens.iter().cloned().map(Value::String).collect())
}

fn join_rendered(filters: &[Filter], sep: &str, var: &str, params: &mut Params) -> String {
    if filters.is_empty() {
        return "true".to_string();
    }
    let parts: Vec<String> = filters.iter().map(|f| f.render(var, params)).collect();
    format!("({})", parts.join(sep))
}

#[derive(Default)]
struct Params {
    values: BTreeMap<String, Value>,
}

impl Params {
    fn bind(&mut self, value: Value) -> String {
        let name = format!("p{}", self.values.len());
        self.values.insert(name.clone(), value);
        name
    }
}

/// Result ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultOrder {
    /// Store insertion order.
    #[default]
    Insertion,
    /// Most recently created first.
    NewestFirst,
}

/// A parameterized Cypher statement.
#[derive(Debug, Clone, PartialEq)]
pub struct CypherStatement {
    /// Cypher text with `$name` placeholders.
    pub text: String,
    /// Bound parameter values.
    pub params: BTreeMap<String, Value>,
}

/// A typed lookup over one node label.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Label to scan.
    pub kind: EntityKind,
    /// Predicate each node must satisfy.
    pub filter: Filter,
    /// Maximum number of results.
    pub limit: Option<usize>,
    /// Result ordering.
    pub order: ResultOrder,
}

impl Query {
    /// A query over `kind` with no limit.
    #[must_use]
    pub fn new(kind: EntityKind, filter: Filter) -> Self {
        Self {
            kind,
            filter,
            limit: None,
            order: ResultOrder::Insertion,
        }
    }

    /// Caps the number of results.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Orders results newest first.
    #[must_use]
    pub fn newest_first(mut self) -> Self {
        self.order = ResultOrder::NewestFirst;
        self
    }

    /// Nodes of `kind` where any of `fields` satisfies `predicate`.
    #[must_use]
    pub fn text_search(kind: EntityKind, fields: &[String], predicate: &TextPredicate) -> Self {
        let mut clauses: Vec<Filter> = fields
            .iter()
            .map(|field| Filter::Matches {
                field: field.clone(),
                predicate: predicate.clone(),
            })
            .collect();
        let filter = if clauses.len() == 1 {
            clauses.remove(0)
        } else {
            Filter::Or(clauses)
        };
        Self::new(kind, filter)
    }

    /// Nodes of `kind` whose `fields`, joined with spaces, satisfy
    /// `predicate`.
    ///
    /// Person names use this: "Ada Lovelace" spans the first and last name.
    #[must_use]
    pub fn text_search_joined(
        kind: EntityKind,
        fields: &[String],
        predicate: &TextPredicate,
    ) -> Self {
        Self::new(
            kind,
            Filter::MatchesJoined {
                fields: fields.to_vec(),
                predicate: predicate.clone(),
            },
        )
    }

    /// Papers whose title contains every token.
    #[must_use]
    pub fn paper_by_title(predicate: &TextPredicate) -> Self {
        Self::text_search(EntityKind::Paper, &["title".to_string()], predicate)
    }

    /// Papers whose title equals `title`, ignoring case.
    #[must_use]
    pub fn paper_by_exact_title(title: &str) -> Self {
        Self::new(
            EntityKind::Paper,
            Filter::EqualsIgnoreCase {
                field: "title".to_string(),
                value: title.trim().to_string(),
            },
        )
    }

    /// Venues whose name contains every token, optionally restricted to a
    /// publication year.
    #[must_use]
    pub fn venue_by_name_and_year(predicate: &TextPredicate, year: Option<i32>) -> Self {
        let name = Filter::Matches {
            field: "name".to_string(),
            predicate: predicate.clone(),
        };
        let filter = match year {
            Some(year) => Filter::And(vec![
                Filter::StartsWith {
                    field: "publication_date".to_string(),
                    prefix: format!("{year:04}-"),
                },
                name,
            ]),
            None => name,
        };
        Self::new(EntityKind::Venue, filter)
    }

    /// Datasets by name and/or keywords; when both are given both must hold.
    #[must_use]
    pub fn dataset_by_name_and_keywords(
        name: Option<&TextPredicate>,
        keywords: Option<&TextPredicate>,
    ) -> Self {
        let mut clauses = Vec::new();
        if let Some(p) = name {
            clauses.push(Filter::Matches {
                field: "name".to_string(),
                predicate: p.clone(),
            });
        }
        if let Some(p) = keywords {
            clauses.push(Filter::Matches {
                field: "keywords".to_string(),
                predicate: p.clone(),
            });
        }
        let filter = match clauses.len() {
            0 => Filter::All,
            1 => clauses.remove(0),
            _ => Filter::And(clauses),
        };
        Self::new(EntityKind::Dataset, filter)
    }

    /// Persons with any name component among `tokens`.
    #[must_use]
    pub fn person_by_any_name(tokens: &[String]) -> Self {
        Self::new(
            EntityKind::Person,
            Filter::Or(vec![
                Filter::InTokens {
                    field: "last_name".to_string(),
                    tokens: tokens.to_vec(),
                },
                Filter::InTokens {
                    field: "first_name".to_string(),
                    tokens: tokens.to_vec(),
                },
                Filter::EachInTokens {
                    field: "middle_name".to_string(),
                    tokens: tokens.to_vec(),
                },
            ]),
        )
    }

    /// Persons whose first and last names (and middle names, for queries of
    /// more than two tokens) are each among `tokens`.
    ///
    /// Membership is checked per field, not per position.
    #[must_use]
    pub fn person_by_full_name(tokens: &[String]) -> Self {
        let mut clauses = vec![
            Filter::InTokens {
                field: "last_name".to_string(),
                tokens: tokens.to_vec(),
            },
            Filter::InTokens {
                field: "first_name".to_string(),
                tokens: tokens.to_vec(),
            },
        ];
        if tokens.len() > 2 {
            clauses.push(Filter::EachInTokens {
                field: "middle_name".to_string(),
                tokens: tokens.to_vec(),
            });
        }
        Self::new(EntityKind::Person, Filter::And(clauses))
    }

    /// All nodes of a kind, newest first.
    #[must_use]
    pub fn recent(kind: EntityKind) -> Self {
        Self::new(kind, Filter::All).newest_first()
    }

    /// Comments awaiting moderation.
    #[must_use]
    pub fn flagged_comments() -> Self {
        Self::new(
            EntityKind::Comment,
            Filter::IsTrue {
                field: "is_flagged".to_string(),
            },
        )
    }

    /// Whether a node satisfies the label and the filter.
    #[must_use]
    pub fn matches(&self, node: &Node) -> bool {
        node.kind == self.kind && self.filter.evaluate(node)
    }

    /// Renders the query as a parameterized Cypher statement.
    ///
    /// Property names come from code or from validated identifiers; values
    /// are always bound as parameters.
    #[must_use]
    pub fn to_cypher(&self) -> CypherStatement {
        let mut params = Params::default();
        let predicate = self.filter.render("n", &mut params);
        let mut text = format!("MATCH (n:{}) WHERE {predicate} RETURN n", self.kind.label());
        if self.order == ResultOrder::NewestFirst {
            text.push_str(" ORDER BY n.created DESC");
        }
        if let Some(limit) = self.limit {
            text.push_str(" LIMIT $limit");
            params.values.insert("limit".to_string(), Value::from(limit));
        }
        CypherStatement {
            text,
            params: params.values,
        }
    }
}

/// Whether `field` is safe to splice into a statement as a property name.
pub(crate) fn is_identifier(field: &str) -> bool {
    let mut chars = field.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::NodeId;

    fn predicate(text: &str) -> TextPredicate {
        TextPredicate::from_text(text, &StopwordSet::english()).unwrap()
    }

    fn person_node(first: &str, middle: &[&str], last: &str) -> Node {
        Node::new(NodeId::new(), EntityKind::Person)
            .with_property("first_name", first)
            .with_property("middle_name", middle.to_vec())
            .with_property("last_name", last)
    }

    #[test]
    fn predicate_is_order_independent_and_case_insensitive() {
        let p = predicate("GRAPH neural");
        assert!(p.is_match("Neural networks on graphs"));
        assert!(p.is_match("graph NEURAL"));
        assert!(!p.is_match("Neural networks"));
    }

    #[test]
    fn predicate_matches_substrings() {
        let p = predicate("conv net");
        assert!(p.is_match("Convolutional Networks"));
    }

    #[test]
    fn predicate_escapes_metacharacters() {
        let p = predicate("c++ (2019)");
        assert!(p.is_match("Modern C++ (2019) idioms"));
        assert!(!p.is_match("Modern C 2019 idioms"));
        let p = predicate(".*");
        assert!(!p.is_match("anything"));
    }

    #[test]
    fn all_stopword_predicate_matches_everything() {
        let p = predicate("The Of");
        assert!(p.matches_everything());
        assert!(p.is_match(""));
        assert_eq!(p.cypher_pattern(), "(?is).*");
    }

    #[test]
    fn predicate_rejects_oversized_query() {
        let long = "a".repeat(MAX_QUERY_LEN + 1);
        assert!(matches!(
            TextPredicate::from_text(&long, &StopwordSet::empty()),
            Err(ValidationError::FieldTooLong { .. })
        ));
    }

    #[test]
    fn cypher_pattern_uses_lookaheads() {
        let p = predicate("deep learning");
        assert_eq!(p.cypher_pattern(), "(?is)(?=.*deep)(?=.*learning).*");
    }

    #[test]
    fn person_by_full_name_is_set_membership() {
        let tokens: Vec<String> = ["hopper", "grace", "brewster"].map(String::from).to_vec();
        let q = Query::person_by_full_name(&tokens);
        assert!(q.matches(&person_node("Grace", &["Brewster"], "Hopper")));
        // Token order in the query does not matter.
        assert!(q.matches(&person_node("Hopper", &["Grace"], "Brewster")));
        // Without middle names a three-token query cannot match.
        assert!(!q.matches(&person_node("Grace", &[], "Hopper")));
    }

    #[test]
    fn person_by_full_name_two_tokens_ignores_middle() {
        let tokens: Vec<String> = ["ada", "lovelace"].map(String::from).to_vec();
        let q = Query::person_by_full_name(&tokens);
        assert!(q.matches(&person_node("Ada", &["King"], "Lovelace")));
        assert!(!q.matches(&person_node("Ada", &[], "Byron")));
    }

    #[test]
    fn person_by_any_name_needs_one_component() {
        let tokens: Vec<String> = ["lovelace"].map(String::from).to_vec();
        let q = Query::person_by_any_name(&tokens);
        assert!(q.matches(&person_node("Ada", &[], "Lovelace")));
        assert!(!q.matches(&person_node("Charles", &[], "Babbage")));
    }

    fn name_fields() -> Vec<String> {
        ["first_name", "middle_name", "last_name"].map(String::from).to_vec()
    }

    #[test]
    fn joined_search_spans_name_parts() {
        let q = Query::text_search_joined(
            EntityKind::Person,
            &name_fields(),
            &predicate("Ada Lovelace"),
        );
        assert!(q.matches(&person_node("Ada", &[], "Lovelace")));
        assert!(q.matches(&person_node("Augusta", &["Ada"], "Lovelace")));
        assert!(!q.matches(&person_node("Ada", &[], "Byron")));

        // Per-field matching never sees both tokens at once.
        let per_field =
            Query::text_search(EntityKind::Person, &name_fields(), &predicate("Ada Lovelace"));
        assert!(!per_field.matches(&person_node("Ada", &[], "Lovelace")));
    }

    #[test]
    fn joined_search_without_tokens_needs_a_field() {
        let fields = vec!["name".to_string(), "description".to_string()];
        let q =
            Query::text_search_joined(EntityKind::Dataset, &fields, &TextPredicate::match_all());
        let bare = Node::new(NodeId::new(), EntityKind::Dataset);
        assert!(!q.matches(&bare));
        assert!(q.matches(&bare.with_property("description", "")));
    }

    #[test]
    fn cypher_rendering_joined_search() {
        let stmt = Query::text_search_joined(
            EntityKind::Person,
            &name_fields(),
            &predicate("ada lovelace"),
        )
        .limit(20)
        .to_cypher();
        assert_eq!(
            stmt.text,
            "MATCH (n:Person) WHERE ((n.first_name =~ $p0 OR n.middle_name =~ $p0 OR n.last_name =~ $p0) \
             AND (n.first_name =~ $p1 OR n.middle_name =~ $p1 OR n.last_name =~ $p1)) \
             RETURN n LIMIT $limit"
        );
        assert_eq!(stmt.params["p0"], Value::from("(?is).*ada.*"));
        assert_eq!(stmt.params["p1"], Value::from("(?is).*lovelace.*"));
    }

    #[test]
    fn query_checks_kind() {
        let q = Query::paper_by_title(&TextPredicate::match_all());
        let venue = Node::new(NodeId::new(), EntityKind::Venue).with_property("title", "x");
        assert!(!q.matches(&venue));
    }

    #[test]
    fn venue_year_filter_uses_date_prefix() {
        let q = Query::venue_by_name_and_year(&predicate("neural"), Some(2017));
        let node = Node::new(NodeId::new(), EntityKind::Venue)
            .with_property("name", "Neural Information Processing Systems")
            .with_property("publication_date", "2017-12-15");
        assert!(q.matches(&node));

        let q = Query::venue_by_name_and_year(&predicate("neural"), Some(2016));
        assert!(!q.matches(&node));
    }

    #[test]
    fn cypher_rendering_binds_user_input() {
        let q = Query::paper_by_title(&predicate("x' OR 1=1 //")).limit(25);
        let stmt = q.to_cypher();
        assert_eq!(stmt.text, "MATCH (n:Paper) WHERE n.title =~ $p0 RETURN n LIMIT $limit");
        assert!(!stmt.text.contains("OR 1=1"));
        assert_eq!(stmt.params["limit"], Value::from(25));
        assert!(stmt.params["p0"].as_str().unwrap().contains("1=1"));
    }

    #[test]
    fn cypher_rendering_person_exact() {
        let tokens: Vec<String> = ["grace", "brewster", "hopper"].map(String::from).to_vec();
        let stmt = Query::person_by_full_name(&tokens).limit(20).to_cypher();
        assert_eq!(
            stmt.text,
            "MATCH (n:Person) WHERE (toLower(n.last_name) IN $p0 AND toLower(n.first_name) IN $p1 \
             AND (size(n.middle_name) > 0 AND all(x IN n.middle_name WHERE toLower(x) IN $p2))) \
             RETURN n LIMIT $limit"
        );
        assert_eq!(stmt.params.len(), 4);
    }

    #[test]
    fn cypher_rendering_recent() {
        let stmt = Query::recent(EntityKind::Paper).limit(10).to_cypher();
        assert_eq!(
            stmt.text,
            "MATCH (n:Paper) WHERE true RETURN n ORDER BY n.created DESC LIMIT $limit"
        );
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("title"));
        assert!(is_identifier("_x1"));
        assert!(!is_identifier("1x"));
        assert!(!is_identifier("title) DETACH DELETE n //"));
        assert!(!is_identifier(""));
    }
}
