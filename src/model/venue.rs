use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{EntityKind, NodeId};
use crate::model::{GraphEntity, UserId};

/// Publication venue category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VenueType {
    /// Journal.
    #[serde(rename = "J")]
    Journal,
    /// Conference.
    #[serde(rename = "C")]
    Conference,
    /// Workshop.
    #[serde(rename = "W")]
    Workshop,
    /// Anything else.
    #[serde(rename = "O")]
    Other,
}

/// A venue edition, e.g. a conference in a given year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    /// Node id.
    pub id: NodeId,

    /// Venue name.
    pub name: String,

    /// Stored as `YYYY-MM-DD`; year searches match on its prefix.
    pub publication_date: NaiveDate,

    /// Category.
    #[serde(rename = "type")]
    pub venue_type: VenueType,

    /// Publisher name.
    #[serde(default)]
    pub publisher: String,

    /// Free-text tag string.
    #[serde(default)]
    pub keywords: String,

    /// Whether submissions are peer reviewed.
    #[serde(default)]
    pub peer_reviewed: bool,

    /// Home page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    /// Curating user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserId>,

    /// Creation time.
    pub created: DateTime<Utc>,
}

impl Venue {
    /// Creates a conference venue.
    #[must_use]
    pub fn new(name: impl Into<String>, publication_date: NaiveDate) -> Self {
        Self {
            id: NodeId::new(),
            name: name.into(),
            publication_date,
            venue_type: VenueType::Conference,
            publisher: String::new(),
            keywords: String::new(),
            peer_reviewed: false,
            website: None,
            created_by: None,
            created: Utc::now(),
        }
    }

    /// Sets the category.
    #[must_use]
    pub fn with_type(mut self, venue_type: VenueType) -> Self {
        self.venue_type = venue_type;
        self
    }

    /// Sets the publisher.
    #[must_use]
    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = publisher.into();
        self
    }

    /// Sets the keywords.
    #[must_use]
    pub fn with_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = keywords.into();
        self
    }

    /// Marks the venue as peer reviewed.
    #[must_use]
    pub fn peer_reviewed(mut self) -> Self {
        self.peer_reviewed = true;
        self
    }

    /// "Name, YYYY-MM-DD", as shown next to a paper.
    #[must_use]
    pub fn citation_line(&self) -> String {
        format!("{}, {}", self.name, self.publication_date)
    }
}

impl GraphEntity for Venue {
    const KIND: EntityKind = EntityKind::Venue;

    fn id(&self) -> NodeId {
        self.id
    }
}
