//! Entity resolution over the catalog graph.
//!
//! The resolver turns free text (a title, a person's name, a venue name and
//! year, dataset name and keywords) into token predicates, runs them against
//! a [`GraphStore`] and classifies the candidates it gets back.
//!
//! No match and ambiguous matches are results, not errors.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::config::ResolverConfig;
use crate::entity::{EntityKind, NodeId, Relationship};
use crate::error::{ExecutionError, GnosisResult, ValidationError};
use crate::model::{inflate_all, Dataset, GraphEntity, Node, Paper, Person, PersonName, Venue};
use crate::operations::{SearchBuilder, TextSearch};
use crate::query::{Query, TextPredicate};
use crate::stopwords::tokenize;
use crate::storage::{GraphOps, GraphStore};

/// Outcome of looking a person up by name.
#[derive(Debug, Clone, PartialEq)]
pub enum PersonMatch {
    /// No stored person carries the name.
    NotFound,
    /// Exactly one stored person carries exactly this name.
    Found(Person),
    /// Several candidates, or a single near miss.
    Ambiguous(Vec<Person>),
}

impl PersonMatch {
    /// The matched person, if the lookup was conclusive.
    #[must_use]
    pub fn person(&self) -> Option<&Person> {
        match self {
            Self::Found(person) => Some(person),
            Self::NotFound | Self::Ambiguous(_) => None,
        }
    }

    /// Candidates for an ambiguous lookup; empty otherwise.
    #[must_use]
    pub fn candidates(&self) -> &[Person] {
        match self {
            Self::Ambiguous(candidates) => candidates,
            Self::NotFound | Self::Found(_) => &[],
        }
    }

    /// Whether exactly one person matched.
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Whether nobody matched.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Whether the caller has to choose.
    #[must_use]
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Ambiguous(_))
    }
}

/// Outcome of [`EntityResolver::resolve_or_create_author`].
#[derive(Debug, Clone, PartialEq)]
pub enum AuthorResolution {
    /// A new person was created and linked as an author.
    Created(Person),
    /// An existing person was linked as an author.
    Linked(Person),
    /// Nothing was written; the caller has to pick among the candidates.
    Ambiguous(Vec<Person>),
}

impl AuthorResolution {
    /// The person now linked to the paper, if any.
    #[must_use]
    pub fn person(&self) -> Option<&Person> {
        match self {
            Self::Created(person) | Self::Linked(person) => Some(person),
            Self::Ambiguous(_) => None,
        }
    }

    /// Whether an `authors` edge exists after the call.
    #[must_use]
    pub fn is_linked(&self) -> bool {
        !matches!(self, Self::Ambiguous(_))
    }

    /// Whether a new person was stored.
    #[must_use]
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Fuzzy lookups and the find-or-create author policy.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use gnosis::{EntityResolver, GraphEntity, GraphOps, InMemoryGraphStore, Paper};
///
/// let graph = Arc::new(InMemoryGraphStore::new());
/// let paper = Paper::new("Notes on the Analytical Engine");
/// graph.save(paper.to_node().unwrap()).unwrap();
///
/// let resolver = EntityResolver::new(graph);
/// let first = resolver.resolve_or_create_author("Ada Lovelace", paper.id).unwrap();
/// let again = resolver.resolve_or_create_author("ada lovelace", paper.id).unwrap();
/// assert!(first.is_created());
/// assert_eq!(first.person(), again.person());
/// ```
#[derive(Clone)]
pub struct EntityResolver {
    graph: Arc<dyn GraphStore>,
    config: ResolverConfig,
}

impl EntityResolver {
    /// Create a resolver with the default configuration.
    #[must_use]
    pub fn new(graph: Arc<dyn GraphStore>) -> Self {
        Self {
            graph,
            config: ResolverConfig::default(),
        }
    }

    /// Create a resolver with an explicit configuration.
    ///
    /// # Errors
    /// Returns `ValidationError::InvalidLimit` if any limit is zero.
    pub fn with_config(
        graph: Arc<dyn GraphStore>,
        config: ResolverConfig,
    ) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self { graph, config })
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Lower-cased, stopword-filtered tokens of `text`.
    #[must_use]
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        tokenize(text, &self.config.stopwords)
    }

    /// Runs a text search and returns raw nodes in store order.
    pub fn find_by_text(&self, search: &TextSearch) -> GnosisResult<Vec<Node>> {
        self.find_by_text_with(&*self.graph, search)
    }

    /// Runs a text search and inflates the matches.
    ///
    /// # Errors
    /// Fails with `KindMismatch` when `search` targets a kind other than `T`.
    pub fn find_entities<T: GraphEntity>(&self, search: &TextSearch) -> GnosisResult<Vec<T>> {
        let nodes = self.find_by_text(search)?;
        Ok(inflate_all(&nodes)?)
    }

    /// Papers whose title contains every non-stopword of `title`.
    pub fn find_papers(&self, title: &str) -> GnosisResult<Vec<Paper>> {
        let search = SearchBuilder::new(EntityKind::Paper).query(title).build()?;
        self.find_entities(&search)
    }

    /// Venues by name tokens, optionally restricted to a publication year.
    ///
    /// # Errors
    /// - `NoSearchTokens`: If the name is empty after stopword removal
    /// - `InvalidYear`: If `year` is outside 1..=9999
    pub fn find_venues(&self, name: &str, year: Option<i32>) -> GnosisResult<Vec<Venue>> {
        self.find_venues_with(&*self.graph, name, year)
    }

    /// Datasets by name and/or keywords. When both are given both must match.
    pub fn find_datasets(
        &self,
        name: Option<&str>,
        keywords: Option<&str>,
    ) -> GnosisResult<Vec<Dataset>> {
        let name = self.optional_predicate(name)?;
        let keywords = self.optional_predicate(keywords)?;
        let query = Query::dataset_by_name_and_keywords(name.as_ref(), keywords.as_ref())
            .limit(self.config.text_search_limit);
        let nodes = self.graph.execute(&query)?;
        Ok(inflate_all(&nodes)?)
    }

    /// Persons with any name component among the tokens of `name`.
    pub fn find_persons(&self, name: &str) -> GnosisResult<Vec<Person>> {
        self.find_persons_with(&*self.graph, name)
    }

    /// Looks a person up by full name and classifies the result.
    pub fn find_person_exact(&self, name: &str) -> GnosisResult<PersonMatch> {
        let name = PersonName::parse(name)?;
        self.find_person_exact_with(&*self.graph, &name)
    }

    /// Links `name` as an author of `paper`, creating the person when no one
    /// carries the name yet.
    ///
    /// The lookup, creation and link happen in one graph transaction.
    ///
    /// # Errors
    /// - `EmptyName`: If `name` is blank
    /// - `NodeNotFound` / `KindMismatch`: If `paper` is not a stored paper
    #[instrument(skip_all, fields(paper = %paper))]
    pub fn resolve_or_create_author(
        &self,
        name: &str,
        paper: NodeId,
    ) -> GnosisResult<AuthorResolution> {
        let name = PersonName::parse(name)?;
        let txn = self.graph.transaction()?;
        let resolution = self.resolve_author_with(&*txn, &name, paper)?;
        txn.commit()?;
        Ok(resolution)
    }

    pub(crate) fn text_predicate(
        &self,
        text: &str,
        require_tokens: bool,
    ) -> Result<TextPredicate, ValidationError> {
        let predicate = TextPredicate::from_text(text, &self.config.stopwords)?;
        if predicate.matches_everything() {
            if require_tokens {
                return Err(ValidationError::NoSearchTokens {
                    query: text.to_string(),
                });
            }
            debug!(query = text, "no searchable tokens, matching everything");
        }
        Ok(predicate)
    }

    fn optional_predicate(&self, text: Option<&str>) -> GnosisResult<Option<TextPredicate>> {
        let Some(text) = text else {
            return Ok(None);
        };
        let predicate = self.text_predicate(text, false)?;
        Ok((!predicate.matches_everything()).then_some(predicate))
    }

    pub(crate) fn find_by_text_with<G: GraphOps + ?Sized>(
        &self,
        ops: &G,
        search: &TextSearch,
    ) -> GnosisResult<Vec<Node>> {
        let predicate = self.text_predicate(&search.query, search.require_tokens)?;
        let limit = search.limit.unwrap_or(match search.kind {
            EntityKind::Person => self.config.person_search_limit,
            _ => self.config.text_search_limit,
        });
        let query = if search.join_fields {
            Query::text_search_joined(search.kind, &search.fields, &predicate)
        } else {
            Query::text_search(search.kind, &search.fields, &predicate)
        };
        Ok(ops.execute(&query.limit(limit))?)
    }

    pub(crate) fn find_venues_with<G: GraphOps + ?Sized>(
        &self,
        ops: &G,
        name: &str,
        year: Option<i32>,
    ) -> GnosisResult<Vec<Venue>> {
        if let Some(value) = year {
            if !(1..=9999).contains(&value) {
                return Err(ValidationError::InvalidYear { value }.into());
            }
        }
        let predicate = self.text_predicate(name, true)?;
        let query =
            Query::venue_by_name_and_year(&predicate, year).limit(self.config.text_search_limit);
        let nodes = ops.execute(&query)?;
        Ok(inflate_all(&nodes)?)
    }

    pub(crate) fn find_persons_with<G: GraphOps + ?Sized>(
        &self,
        ops: &G,
        name: &str,
    ) -> GnosisResult<Vec<Person>> {
        let name = PersonName::parse(name)?;
        let query = Query::person_by_any_name(&name.lowercase_tokens())
            .limit(self.config.person_search_limit);
        let nodes = ops.execute(&query)?;
        Ok(inflate_all(&nodes)?)
    }

    pub(crate) fn find_person_exact_with<G: GraphOps + ?Sized>(
        &self,
        ops: &G,
        name: &PersonName,
    ) -> GnosisResult<PersonMatch> {
        let query = Query::person_by_full_name(&name.lowercase_tokens())
            .limit(self.config.person_search_limit);
        let mut candidates: Vec<Person> = inflate_all(&ops.execute(&query)?)?;

        let outcome = match candidates.len() {
            0 => PersonMatch::NotFound,
            1 => {
                let candidate = candidates.swap_remove(0);
                if candidate.matches_name(name) {
                    PersonMatch::Found(candidate)
                } else {
                    warn!(
                        candidate = %candidate.id,
                        stored = %candidate.full_name(),
                        "single person candidate is a near miss"
                    );
                    PersonMatch::Ambiguous(vec![candidate])
                }
            }
            n => {
                warn!(candidates = n, "person name is ambiguous");
                PersonMatch::Ambiguous(candidates)
            }
        };
        Ok(outcome)
    }

    pub(crate) fn resolve_author_with<G: GraphOps + ?Sized>(
        &self,
        ops: &G,
        name: &PersonName,
        paper: NodeId,
    ) -> GnosisResult<AuthorResolution> {
        require_node(ops, paper, EntityKind::Paper)?;

        let resolution = match self.find_person_exact_with(ops, name)? {
            PersonMatch::NotFound => {
                let person = Person::from_name(name);
                ops.save(person.to_node()?)?;
                ops.connect(person.id, Relationship::Authors, paper)?;
                info!(person = %person.id, name = %person.full_name(), "created author");
                AuthorResolution::Created(person)
            }
            PersonMatch::Found(person) => {
                ops.connect(person.id, Relationship::Authors, paper)?;
                info!(person = %person.id, name = %person.full_name(), "linked existing author");
                AuthorResolution::Linked(person)
            }
            PersonMatch::Ambiguous(candidates) => {
                warn!(
                    candidates = candidates.len(),
                    "author left unlinked, name is ambiguous"
                );
                AuthorResolution::Ambiguous(candidates)
            }
        };
        Ok(resolution)
    }
}

/// Loads a node and checks its label.
pub(crate) fn require_node<G: GraphOps + ?Sized>(
    ops: &G,
    id: NodeId,
    kind: EntityKind,
) -> GnosisResult<Node> {
    let node = ops.get(id)?.ok_or(ExecutionError::NodeNotFound { id })?;
    if node.kind != kind {
        return Err(ExecutionError::KindMismatch {
            id,
            expected: kind,
            actual: node.kind,
        }
        .into());
    }
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;

    use crate::entity::Direction;
    use crate::error::GnosisError;
    use crate::storage::InMemoryGraphStore;

    fn setup() -> (Arc<InMemoryGraphStore>, EntityResolver) {
        let graph = Arc::new(InMemoryGraphStore::new());
        let resolver = EntityResolver::new(graph.clone());
        (graph, resolver)
    }

    fn store<T: GraphEntity>(graph: &InMemoryGraphStore, entity: &T) {
        graph.save(entity.to_node().unwrap()).unwrap();
    }

    #[test]
    fn find_papers_matches_tokens_in_any_order() {
        let (graph, resolver) = setup();
        store(&*graph, &Paper::new("Deep Residual Learning for Image Recognition"));
        store(&*graph, &Paper::new("Learning Deep Features"));
        store(&*graph, &Paper::new("Image Segmentation"));

        let found = resolver.find_papers("recognition of IMAGE").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Deep Residual Learning for Image Recognition");

        let found = resolver.find_papers("learning deep").unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn stopword_only_title_matches_everything() {
        let (graph, resolver) = setup();
        store(&*graph, &Paper::new("A"));
        store(&*graph, &Paper::new("B"));
        assert_eq!(resolver.find_papers("the of and").unwrap().len(), 2);
    }

    #[test]
    fn required_tokens_reject_stopword_query() {
        let (_, resolver) = setup();
        let search = SearchBuilder::new(EntityKind::Paper)
            .query("of the")
            .require_tokens()
            .build()
            .unwrap();
        let err = resolver.find_by_text(&search).unwrap_err();
        assert!(matches!(
            err,
            GnosisError::Validation(ValidationError::NoSearchTokens { .. })
        ));
    }

    #[test]
    fn text_search_uses_configured_limit() {
        let graph = Arc::new(InMemoryGraphStore::new());
        for i in 0..5 {
            store(&*graph, &Paper::new(format!("Graph paper {i}")));
        }
        let config = ResolverConfig {
            text_search_limit: 3,
            ..ResolverConfig::default()
        };
        let resolver = EntityResolver::with_config(graph, config).unwrap();
        assert_eq!(resolver.find_papers("graph").unwrap().len(), 3);
    }

    #[test]
    fn person_text_search_matches_full_name() {
        let (graph, resolver) = setup();
        let ada = Person::new("Ada", "Lovelace").with_middle_names(["King"]);
        store(&*graph, &ada);
        store(&*graph, &Person::new("Ada", "Byron"));

        for text in ["Ada Lovelace", "lovelace ada", "ada king lovelace"] {
            let search = SearchBuilder::new(EntityKind::Person).query(text).build().unwrap();
            let found = resolver.find_by_text(&search).unwrap();
            assert_eq!(found.len(), 1, "{text}");
            assert_eq!(found[0].id, ada.id);
        }
    }

    #[test]
    fn person_text_search_uses_person_limit() {
        let graph = Arc::new(InMemoryGraphStore::new());
        for i in 0..6 {
            store(&*graph, &Person::new(format!("Jo{i}"), "Smith"));
        }
        let config = ResolverConfig {
            text_search_limit: 5,
            person_search_limit: 2,
            ..ResolverConfig::default()
        };
        let resolver = EntityResolver::with_config(graph, config).unwrap();
        assert_eq!(resolver.config().person_search_limit, 2);
        let search = SearchBuilder::new(EntityKind::Person).query("smith").build().unwrap();
        assert_eq!(resolver.find_by_text(&search).unwrap().len(), 2);
    }

    #[test]
    fn with_config_validates() {
        let config = ResolverConfig {
            person_search_limit: 0,
            ..ResolverConfig::default()
        };
        let result = EntityResolver::with_config(Arc::new(InMemoryGraphStore::new()), config);
        assert!(matches!(result, Err(ValidationError::InvalidLimit { .. })));
    }

    #[test]
    fn find_venues_filters_by_year() {
        let (graph, resolver) = setup();
        let date = |y| NaiveDate::from_ymd_opt(y, 7, 1).unwrap();
        store(&*graph, &Venue::new("International Conference on Machine Learning", date(2019)));
        store(&*graph, &Venue::new("International Conference on Machine Learning", date(2020)));

        assert_eq!(resolver.find_venues("machine learning", None).unwrap().len(), 2);
        let found = resolver.find_venues("machine learning", Some(2020)).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].publication_date, date(2020));
    }

    #[test]
    fn find_venues_rejects_bad_input() {
        let (_, resolver) = setup();
        assert!(resolver.find_venues("the", None).unwrap_err().is_validation());
        assert!(matches!(
            resolver.find_venues("icml", Some(0)),
            Err(GnosisError::Validation(ValidationError::InvalidYear { value: 0 }))
        ));
    }

    #[test]
    fn find_datasets_by_name_and_keywords() {
        let (graph, resolver) = setup();
        store(&*graph, &Dataset::new("Yelp").with_keywords("reviews ratings"));
        store(&*graph, &Dataset::new("Amazon Reviews").with_keywords("products"));

        assert_eq!(resolver.find_datasets(Some("yelp"), None).unwrap().len(), 1);
        assert_eq!(resolver.find_datasets(None, Some("reviews")).unwrap().len(), 1);
        assert!(resolver
            .find_datasets(Some("amazon"), Some("ratings"))
            .unwrap()
            .is_empty());
        assert_eq!(resolver.find_datasets(None, None).unwrap().len(), 2);
    }

    #[test]
    fn find_persons_is_loose() {
        let (graph, resolver) = setup();
        store(&*graph, &Person::new("Ada", "Lovelace"));
        store(&*graph, &Person::new("Charles", "Babbage"));
        let found = resolver.find_persons("lovelace").unwrap();
        assert_eq!(found.len(), 1);
        assert!(resolver.find_persons("  ").unwrap_err().is_validation());
    }

    #[test]
    fn exact_lookup_classifies() {
        let (graph, resolver) = setup();
        assert!(resolver.find_person_exact("Ada Lovelace").unwrap().is_not_found());

        let ada = Person::new("Ada", "Lovelace");
        store(&*graph, &ada);
        let found = resolver.find_person_exact("ada lovelace").unwrap();
        assert!(found.is_found());
        assert_eq!(found, PersonMatch::Found(ada.clone()));

        store(&*graph, &Person::new("Ada", "Lovelace"));
        let result = resolver.find_person_exact("Ada Lovelace").unwrap();
        assert!(result.is_ambiguous());
        assert_eq!(result.candidates().len(), 2);
    }

    #[test]
    fn swapped_name_is_a_near_miss() {
        let (graph, resolver) = setup();
        store(&*graph, &Person::new("Lovelace", "Ada"));
        let result = resolver.find_person_exact("Ada Lovelace").unwrap();
        assert_eq!(result.candidates().len(), 1);
        assert!(result.person().is_none());
    }

    #[test]
    fn resolve_creates_then_links() {
        let (graph, resolver) = setup();
        let paper = Paper::new("COBOL");
        store(&*graph, &paper);

        let first = resolver
            .resolve_or_create_author("Grace Brewster Hopper", paper.id)
            .unwrap();
        let person = first.person().unwrap().clone();
        assert!(first.is_created());
        assert_eq!(person.middle_name, vec!["Brewster".to_string()]);

        let second = resolver
            .resolve_or_create_author("Grace Brewster Hopper", paper.id)
            .unwrap();
        assert_eq!(second, AuthorResolution::Linked(person));
        assert_eq!(graph.count(EntityKind::Person).unwrap(), 1);
        let authors = graph
            .related(paper.id, Relationship::Authors, Direction::Incoming)
            .unwrap();
        assert_eq!(authors.len(), 1);
    }

    #[test]
    fn resolve_requires_a_paper() {
        let (graph, resolver) = setup();
        let venue = Venue::new("ICML", NaiveDate::from_ymd_opt(2020, 7, 1).unwrap());
        store(&*graph, &venue);

        let err = resolver
            .resolve_or_create_author("Ada Lovelace", venue.id)
            .unwrap_err();
        assert!(matches!(
            err,
            GnosisError::Execution(ExecutionError::KindMismatch { .. })
        ));
        assert!(resolver
            .resolve_or_create_author("Ada Lovelace", NodeId::new())
            .unwrap_err()
            .is_not_found());
        assert_eq!(graph.count(EntityKind::Person).unwrap(), 0);
    }

    #[test]
    fn ambiguous_author_writes_nothing() {
        let (graph, resolver) = setup();
        let paper = Paper::new("Notes");
        store(&*graph, &paper);
        store(&*graph, &Person::new("Ada", "Lovelace"));
        store(&*graph, &Person::new("Ada", "Lovelace"));

        let result = resolver
            .resolve_or_create_author("Ada Lovelace", paper.id)
            .unwrap();
        assert!(!result.is_linked());
        assert!(graph
            .related(paper.id, Relationship::Authors, Direction::Incoming)
            .unwrap()
            .is_empty());
    }
}
