use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{EntityKind, NodeId};
use crate::model::{GraphEntity, UserId};

/// A paper in the catalog.
///
/// # Examples
///
/// ```
/// use gnosis::Paper;
///
/// let paper = Paper::new("Deep Residual Learning for Image Recognition")
///     .with_keywords("computer vision, deep learning");
/// assert_eq!(paper.keywords, "computer vision, deep learning");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    /// Node id.
    pub id: NodeId,

    /// Paper title.
    pub title: String,

    /// Abstract text.
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,

    /// Free-text tag string.
    #[serde(default)]
    pub keywords: String,

    /// Link to the full text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_link: Option<String>,

    /// Curating user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserId>,

    /// Creation time.
    pub created: DateTime<Utc>,
}

impl Paper {
    /// Creates a paper with the given title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            title: title.into(),
            abstract_text: String::new(),
            keywords: String::new(),
            download_link: None,
            created_by: None,
            created: Utc::now(),
        }
    }

    /// Sets the abstract.
    #[must_use]
    pub fn with_abstract(mut self, text: impl Into<String>) -> Self {
        self.abstract_text = text.into();
        self
    }

    /// Sets the keyword string.
    #[must_use]
    pub fn with_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = keywords.into();
        self
    }

    /// Sets the download link.
    #[must_use]
    pub fn with_download_link(mut self, url: impl Into<String>) -> Self {
        self.download_link = Some(url.into());
        self
    }

    /// Records the user who created the paper.
    #[must_use]
    pub fn created_by(mut self, user: UserId) -> Self {
        self.created_by = Some(user);
        self
    }
}

impl GraphEntity for Paper {
    const KIND: EntityKind = EntityKind::Paper;

    fn id(&self) -> NodeId {
        self.id
    }
}
