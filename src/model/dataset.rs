use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{EntityKind, NodeId};
use crate::model::{GraphEntity, UserId};

/// A dataset that papers evaluate on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Node id.
    pub id: NodeId,

    /// Display name.
    pub name: String,

    /// Free-text tag string.
    #[serde(default)]
    pub keywords: String,

    /// Longer description.
    #[serde(default)]
    pub description: String,

    /// Release date, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<NaiveDate>,

    /// Short origin code supplied by the curator (e.g. "N").
    #[serde(default)]
    pub source_type: String,

    /// Home page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    /// Curating user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserId>,

    /// Creation time.
    pub created: DateTime<Utc>,
}

impl Dataset {
    /// Creates a dataset with only a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            name: name.into(),
            keywords: String::new(),
            description: String::new(),
            publication_date: None,
            source_type: String::new(),
            website: None,
            created_by: None,
            created: Utc::now(),
        }
    }

    /// Sets the keywords.
    #[must_use]
    pub fn with_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = keywords.into();
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the source code.
    #[must_use]
    pub fn with_source_type(mut self, source_type: impl Into<String>) -> Self {
        self.source_type = source_type.into();
        self
    }
}

impl GraphEntity for Dataset {
    const KIND: EntityKind = EntityKind::Dataset;

    fn id(&self) -> NodeId {
        self.id
    }
}
