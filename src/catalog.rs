//! Catalog service.
//!
//! [`Catalog`] composes the entity resolver with the graph and bookmark
//! stores to implement the curation workflows: creating papers with their
//! authors, linking venues and authors, comments and moderation, bookmarks
//! and the listings shown to readers.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::config::ResolverConfig;
use crate::entity::{Direction, EntityKind, NodeId, Relationship};
use crate::error::{ExecutionError, GnosisResult, ValidationError};
use crate::model::{
    inflate_all, Bookmark, BookmarkId, Comment, Dataset, FlagReport, GraphEntity, Paper, Person,
    PersonName, UserId, Venue,
};
use crate::query::{Query, MAX_QUERY_LEN};
use crate::resolver::{require_node, AuthorResolution, EntityResolver, PersonMatch};
use crate::storage::{
    BookmarkStore, GraphOps, GraphStore, InMemoryBookmarkStore, InMemoryGraphStore,
};

/// Outcome of [`Catalog::create_paper`].
#[derive(Debug, Clone, PartialEq)]
pub enum PaperCreation {
    /// The paper was stored. Each author name is paired with how it resolved.
    Created {
        /// The stored paper.
        paper: Paper,
        /// Author names in input order with their resolution.
        authors: Vec<(String, AuthorResolution)>,
    },
    /// Papers with a matching title already exist; nothing was stored.
    Duplicate(Vec<Paper>),
}

impl PaperCreation {
    /// The stored paper, if one was created.
    #[must_use]
    pub fn paper(&self) -> Option<&Paper> {
        match self {
            Self::Created { paper, .. } => Some(paper),
            Self::Duplicate(_) => None,
        }
    }

    /// Whether a matching title blocked creation.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate(_))
    }
}

/// Outcome of [`Catalog::connect_venue`].
#[derive(Debug, Clone, PartialEq)]
pub enum VenueLink {
    /// The paper now points at this venue.
    Linked(Venue),
    /// Several venues matched; nothing changed.
    Ambiguous(Vec<Venue>),
    /// No venue matched; nothing changed.
    NotFound,
}

/// One row of the recent-papers listing.
#[derive(Debug, Clone, PartialEq)]
pub struct PaperSummary {
    /// The listed paper.
    pub paper: Paper,
    /// Author short names, e.g. "A. Lovelace, C. Babbage".
    pub authors: String,
    /// "Name, YYYY-MM-DD", or empty when no venue is linked.
    pub venue: String,
}

/// A paper with everything shown on its detail page.
#[derive(Debug, Clone, PartialEq)]
pub struct PaperDetail {
    /// The paper itself.
    pub paper: Paper,
    /// Linked authors in link order.
    pub authors: Vec<Person>,
    /// The linked venue, if any.
    pub venue: Option<Venue>,
    /// Comments that are not hidden, oldest first.
    pub comments: Vec<Comment>,
    /// Papers this paper cites.
    pub cites: Vec<Paper>,
    /// Papers citing this paper.
    pub cited_by: Vec<Paper>,
    /// Datasets the paper evaluates on.
    pub datasets: Vec<Dataset>,
}

/// Splits a comma-separated author list into trimmed, non-empty names.
///
/// # Examples
///
/// ```
/// use gnosis::split_author_list;
///
/// let names = split_author_list("Ada Lovelace, Charles Babbage,, ");
/// assert_eq!(names, vec!["Ada Lovelace", "Charles Babbage"]);
/// ```
#[must_use]
pub fn split_author_list(authors: &str) -> Vec<String> {
    authors
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Gnosis catalog service.
#[derive(Clone)]
pub struct Catalog {
    graph: Arc<dyn GraphStore>,
    bookmarks: Arc<dyn BookmarkStore>,
    resolver: EntityResolver,
}

impl Catalog {
    /// Create a catalog over the given stores with the default configuration.
    #[must_use]
    pub fn new(graph: Arc<dyn GraphStore>, bookmarks: Arc<dyn BookmarkStore>) -> Self {
        let resolver = EntityResolver::new(Arc::clone(&graph));
        Self {
            graph,
            bookmarks,
            resolver,
        }
    }

    /// Create a catalog with an explicit configuration.
    ///
    /// # Errors
    /// Returns a validation error if the configuration is invalid.
    pub fn with_config(
        graph: Arc<dyn GraphStore>,
        bookmarks: Arc<dyn BookmarkStore>,
        config: ResolverConfig,
    ) -> GnosisResult<Self> {
        let resolver = EntityResolver::with_config(Arc::clone(&graph), config)?;
        Ok(Self {
            graph,
            bookmarks,
            resolver,
        })
    }

    /// Create a catalog backed by fresh in-memory stores.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryGraphStore::new()),
            Arc::new(InMemoryBookmarkStore::new()),
        )
    }

    /// The resolver used for lookups.
    #[must_use]
    pub fn resolver(&self) -> &EntityResolver {
        &self.resolver
    }

    // ---------------------------------------------------------------------
    // Generic graph access
    // ---------------------------------------------------------------------

    /// Inserts or replaces an entity.
    pub fn save<T: GraphEntity>(&self, entity: &T) -> GnosisResult<()> {
        self.graph.save(entity.to_node()?)?;
        Ok(())
    }

    /// Loads an entity by ID.
    ///
    /// # Errors
    /// `NodeNotFound` if the ID is unknown, `KindMismatch` if it names
    /// another kind of entity.
    pub fn get<T: GraphEntity>(&self, id: NodeId) -> GnosisResult<T> {
        let node = require_node(&*self.graph, id, T::KIND)?;
        Ok(T::inflate(&node)?)
    }

    /// Adds an edge. Connecting an existing edge again is a no-op.
    pub fn connect(&self, from: NodeId, relationship: Relationship, to: NodeId) -> GnosisResult<()> {
        self.graph.connect(from, relationship, to)?;
        debug!(%from, %to, relationship = %relationship, "connected");
        Ok(())
    }

    /// Removes an edge, returning whether it existed.
    pub fn disconnect(
        &self,
        from: NodeId,
        relationship: Relationship,
        to: NodeId,
    ) -> GnosisResult<bool> {
        Ok(self.graph.disconnect(from, relationship, to)?)
    }

    /// Number of stored entities of a kind.
    pub fn count(&self, kind: EntityKind) -> GnosisResult<usize> {
        Ok(self.graph.count(kind)?)
    }

    // ---------------------------------------------------------------------
    // Papers
    // ---------------------------------------------------------------------

    /// Stores a new paper and resolves its authors.
    ///
    /// The duplicate check, the save and every author resolution share one
    /// graph transaction. When papers with a matching title exist nothing is
    /// written and they are returned as [`PaperCreation::Duplicate`].
    ///
    /// # Errors
    /// - `MissingField`: If the title is blank
    /// - `FieldTooLong`: If the title exceeds the query length limit
    /// - `EmptyName`: If an author name is blank
    #[instrument(skip_all, fields(paper = %paper.id, authors = authors.len()))]
    pub fn create_paper(&self, paper: Paper, authors: &[String]) -> GnosisResult<PaperCreation> {
        let title = paper.title.trim();
        if title.is_empty() {
            return Err(ValidationError::MissingField {
                field: "title".to_string(),
            }
            .into());
        }
        if title.len() > MAX_QUERY_LEN {
            return Err(ValidationError::FieldTooLong {
                field: "title".to_string(),
                max_length: MAX_QUERY_LEN,
            }
            .into());
        }
        let names = authors
            .iter()
            .map(|name| PersonName::parse(name))
            .collect::<Result<Vec<_>, _>>()?;

        let txn = self.graph.transaction()?;

        let predicate = self.resolver.text_predicate(title, false)?;
        let duplicates = if predicate.matches_everything() {
            Query::paper_by_exact_title(title)
        } else {
            Query::paper_by_title(&predicate)
        };
        let duplicates: Vec<Paper> = inflate_all(
            &txn.execute(&duplicates.limit(self.resolver.config().text_search_limit))?,
        )?;
        if !duplicates.is_empty() {
            info!(matches = duplicates.len(), "paper title already catalogued");
            return Ok(PaperCreation::Duplicate(duplicates));
        }

        txn.save(paper.to_node()?)?;
        let mut resolved = Vec::with_capacity(names.len());
        for (raw, name) in authors.iter().zip(&names) {
            let resolution = self.resolver.resolve_author_with(&*txn, name, paper.id)?;
            resolved.push((raw.trim().to_string(), resolution));
        }
        txn.commit()?;

        info!(title = %paper.title, "paper created");
        Ok(PaperCreation::Created {
            paper,
            authors: resolved,
        })
    }

    /// Most recently created papers with their author and venue lines.
    pub fn recent_papers(&self) -> GnosisResult<Vec<PaperSummary>> {
        let query = Query::recent(EntityKind::Paper).limit(self.resolver.config().recent_papers_limit);
        let papers: Vec<Paper> = inflate_all(&self.graph.execute(&query)?)?;

        papers
            .into_iter()
            .map(|paper| -> GnosisResult<PaperSummary> {
                let authors = self
                    .paper_authors(paper.id)?
                    .iter()
                    .map(Person::short_name)
                    .collect::<Vec<_>>()
                    .join(", ");
                let venue = self
                    .paper_venue(paper.id)?
                    .as_ref()
                    .map(Venue::citation_line)
                    .unwrap_or_default();
                Ok(PaperSummary {
                    paper,
                    authors,
                    venue,
                })
            })
            .collect()
    }

    /// A paper with its authors, venue, visible comments, citations and
    /// datasets.
    pub fn paper_detail(&self, id: NodeId) -> GnosisResult<PaperDetail> {
        let paper: Paper = self.get(id)?;
        let comments = self
            .related::<Comment>(id, Relationship::Discusses, Direction::Incoming)?
            .into_iter()
            .filter(|c| !c.is_hidden)
            .collect();

        Ok(PaperDetail {
            authors: self.paper_authors(id)?,
            venue: self.paper_venue(id)?,
            comments,
            cites: self.related(id, Relationship::Cites, Direction::Outgoing)?,
            cited_by: self.related(id, Relationship::Cites, Direction::Incoming)?,
            datasets: self.related(id, Relationship::EvaluatesOn, Direction::Outgoing)?,
            paper,
        })
    }

    /// Authors of a paper in the order they were linked.
    pub fn paper_authors(&self, paper: NodeId) -> GnosisResult<Vec<Person>> {
        self.related(paper, Relationship::Authors, Direction::Incoming)
    }

    /// The venue a paper was published at, if linked.
    pub fn paper_venue(&self, paper: NodeId) -> GnosisResult<Option<Venue>> {
        let mut venues: Vec<Venue> =
            self.related(paper, Relationship::WasPublishedAt, Direction::Outgoing)?;
        Ok(venues.pop())
    }

    fn related<T: GraphEntity>(
        &self,
        id: NodeId,
        relationship: Relationship,
        direction: Direction,
    ) -> GnosisResult<Vec<T>> {
        let nodes = self.graph.related(id, relationship, direction)?;
        Ok(inflate_all(&nodes)?)
    }

    // ---------------------------------------------------------------------
    // Linking
    // ---------------------------------------------------------------------

    /// Looks a venue up by name and year and makes it the paper's venue.
    ///
    /// A paper has at most one venue, so a previous link is replaced in the
    /// same transaction.
    #[instrument(skip_all, fields(paper = %paper, year = ?year))]
    pub fn connect_venue(
        &self,
        paper: NodeId,
        name: &str,
        year: Option<i32>,
    ) -> GnosisResult<VenueLink> {
        let txn = self.graph.transaction()?;
        require_node(&*txn, paper, EntityKind::Paper)?;

        let mut venues = self.resolver.find_venues_with(&*txn, name, year)?;
        let link = match venues.len() {
            0 => VenueLink::NotFound,
            1 => {
                let venue = venues.swap_remove(0);
                txn.connect(paper, Relationship::WasPublishedAt, venue.id)?;
                info!(venue = %venue.id, "venue linked");
                VenueLink::Linked(venue)
            }
            n => {
                warn!(candidates = n, "venue name is ambiguous");
                VenueLink::Ambiguous(venues)
            }
        };
        txn.commit()?;
        Ok(link)
    }

    /// Makes `venue` the paper's venue, replacing any previous one.
    pub fn set_venue(&self, paper: NodeId, venue: NodeId) -> GnosisResult<()> {
        self.connect(paper, Relationship::WasPublishedAt, venue)
    }

    /// Looks a person up by any name component and links them as an author.
    ///
    /// Returns `Found` when exactly one person matched (linking is
    /// idempotent), `Ambiguous` when several did, `NotFound` otherwise.
    #[instrument(skip_all, fields(paper = %paper))]
    pub fn connect_author(&self, paper: NodeId, name: &str) -> GnosisResult<PersonMatch> {
        let txn = self.graph.transaction()?;
        require_node(&*txn, paper, EntityKind::Paper)?;

        let mut persons = self.resolver.find_persons_with(&*txn, name)?;
        let outcome = match persons.len() {
            0 => PersonMatch::NotFound,
            1 => {
                let person = persons.swap_remove(0);
                txn.connect(person.id, Relationship::Authors, paper)?;
                info!(person = %person.id, "author linked");
                PersonMatch::Found(person)
            }
            n => {
                warn!(candidates = n, "author name is ambiguous");
                PersonMatch::Ambiguous(persons)
            }
        };
        txn.commit()?;
        Ok(outcome)
    }

    // ---------------------------------------------------------------------
    // Search
    // ---------------------------------------------------------------------

    /// Papers by title tokens.
    pub fn search_papers(&self, title: &str) -> GnosisResult<Vec<Paper>> {
        self.resolver.find_papers(title)
    }

    /// Persons by any name component.
    pub fn search_persons(&self, name: &str) -> GnosisResult<Vec<Person>> {
        self.resolver.find_persons(name)
    }

    /// Venues by name tokens and optional year.
    pub fn search_venues(&self, name: &str, year: Option<i32>) -> GnosisResult<Vec<Venue>> {
        self.resolver.find_venues(name, year)
    }

    /// Datasets by name and/or keywords.
    pub fn search_datasets(
        &self,
        name: Option<&str>,
        keywords: Option<&str>,
    ) -> GnosisResult<Vec<Dataset>> {
        self.resolver.find_datasets(name, keywords)
    }

    // ---------------------------------------------------------------------
    // Comments
    // ---------------------------------------------------------------------

    /// Adds a comment to a paper.
    #[instrument(skip_all, fields(paper = %paper))]
    pub fn add_comment(
        &self,
        paper: NodeId,
        author: &str,
        created_by: Option<UserId>,
        text: &str,
    ) -> GnosisResult<Comment> {
        let text = non_empty_text(text)?;
        let mut comment = Comment::new(author, text);
        comment.created_by = created_by;

        let txn = self.graph.transaction()?;
        require_node(&*txn, paper, EntityKind::Paper)?;
        txn.save(comment.to_node()?)?;
        txn.connect(comment.id, Relationship::Discusses, paper)?;
        txn.commit()?;

        info!(comment = %comment.id, "comment added");
        Ok(comment)
    }

    /// Replaces a comment's text.
    pub fn update_comment(&self, id: NodeId, text: &str) -> GnosisResult<Comment> {
        let text = non_empty_text(text)?;
        self.update_entity(id, |comment: &mut Comment| comment.edit(text))
    }

    /// Flags a comment for moderation.
    pub fn flag_comment(&self, id: NodeId, report: FlagReport) -> GnosisResult<Comment> {
        let comment = self.update_entity(id, |comment: &mut Comment| comment.flag(report))?;
        warn!(comment = %id, "comment flagged");
        Ok(comment)
    }

    /// Clears a comment's flag.
    pub fn dismiss_flag(&self, id: NodeId) -> GnosisResult<Comment> {
        self.update_entity(id, Comment::dismiss_flag)
    }

    /// Hides a comment from paper pages.
    pub fn hide_comment(&self, id: NodeId) -> GnosisResult<Comment> {
        self.set_comment_hidden(id, true)
    }

    /// Shows a previously hidden comment again.
    pub fn unhide_comment(&self, id: NodeId) -> GnosisResult<Comment> {
        self.set_comment_hidden(id, false)
    }

    fn set_comment_hidden(&self, id: NodeId, hidden: bool) -> GnosisResult<Comment> {
        let comment = self.update_entity(id, |comment: &mut Comment| comment.is_hidden = hidden)?;
        info!(comment = %id, hidden, "comment visibility changed");
        Ok(comment)
    }

    /// Comments awaiting moderation.
    pub fn flagged_comments(&self) -> GnosisResult<Vec<Comment>> {
        let nodes = self.graph.execute(&Query::flagged_comments())?;
        Ok(inflate_all(&nodes)?)
    }

    fn update_entity<T, F>(&self, id: NodeId, update: F) -> GnosisResult<T>
    where
        T: GraphEntity,
        F: FnOnce(&mut T),
    {
        let txn = self.graph.transaction()?;
        let node = require_node(&*txn, id, T::KIND)?;
        let mut entity = T::inflate(&node)?;
        update(&mut entity);
        txn.save(entity.to_node()?)?;
        txn.commit()?;
        Ok(entity)
    }

    // ---------------------------------------------------------------------
    // Bookmarks
    // ---------------------------------------------------------------------

    /// Bookmarks a paper. Bookmarking the same paper twice returns the
    /// existing bookmark.
    pub fn bookmark(&self, owner: UserId, paper: NodeId) -> GnosisResult<Bookmark> {
        require_node(&*self.graph, paper, EntityKind::Paper)?;
        let bookmark = self.bookmarks.get_or_insert(Bookmark::new(owner, paper))?;
        debug!(%owner, bookmark = %bookmark.id, "bookmark stored");
        Ok(bookmark)
    }

    /// A user's bookmarks, oldest first.
    pub fn bookmarks(&self, owner: UserId) -> GnosisResult<Vec<Bookmark>> {
        Ok(self.bookmarks.find_by_owner(owner)?)
    }

    /// The papers a user bookmarked, in bookmark order.
    ///
    /// Bookmarks whose paper no longer exists are skipped.
    pub fn bookmarked_papers(&self, owner: UserId) -> GnosisResult<Vec<Paper>> {
        let mut papers = Vec::new();
        for bookmark in self.bookmarks.find_by_owner(owner)? {
            match self.graph.get(bookmark.paper)? {
                Some(node) => papers.push(Paper::inflate(&node)?),
                None => debug!(bookmark = %bookmark.id, "bookmarked paper is gone"),
            }
        }
        Ok(papers)
    }

    /// Removes one of `owner`'s bookmarks.
    ///
    /// # Errors
    /// `BookmarkNotFound` if the bookmark does not exist or belongs to
    /// someone else.
    pub fn remove_bookmark(&self, owner: UserId, id: BookmarkId) -> GnosisResult<()> {
        match self.bookmarks.get(id)? {
            Some(bookmark) if bookmark.owner == owner => {
                self.bookmarks.delete(id)?;
                Ok(())
            }
            _ => Err(ExecutionError::BookmarkNotFound { id }.into()),
        }
    }
}

fn non_empty_text(text: &str) -> Result<&str, ValidationError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ValidationError::MissingField {
            field: "text".to_string(),
        });
    }
    Ok(text)
}
