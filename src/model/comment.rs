use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{EntityKind, NodeId};
use crate::model::{GraphEntity, UserId};

/// Why a reader flagged a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagReason {
    /// Unsolicited advertising.
    Spam,
    /// Abusive or offensive language.
    Offensive,
    /// Not about the paper.
    OffTopic,
    /// Anything else; see the description.
    Other,
}

/// A reader's report against a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagReport {
    /// Category of the report.
    pub reason: FlagReason,
    /// Reporter's explanation.
    pub description: String,
    /// Reporting user, if signed in.
    pub reporter: Option<UserId>,
}

impl FlagReport {
    /// Creates an anonymous report.
    #[must_use]
    pub fn new(reason: FlagReason, description: impl Into<String>) -> Self {
        Self {
            reason,
            description: description.into(),
            reporter: None,
        }
    }

    /// Attributes the report to a user.
    #[must_use]
    pub fn reported_by(mut self, user: UserId) -> Self {
        self.reporter = Some(user);
        self
    }
}

/// Moderation record attached to a flagged comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Moderation {
    /// Category of the report.
    pub reason: FlagReason,
    /// Reporter's explanation.
    pub description: String,
    /// Reporting user, if signed in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporter: Option<UserId>,
    /// When the flag was raised.
    pub flagged_at: DateTime<Utc>,
}

/// A user comment discussing a paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Node id.
    pub id: NodeId,

    /// Comment body.
    pub text: String,

    /// Display name of the author.
    #[serde(default)]
    pub author: String,

    /// Posting user, if signed in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserId>,

    /// Set while a flag is pending review.
    #[serde(default)]
    pub is_flagged: bool,

    /// Hidden comments are left out of paper detail.
    #[serde(default)]
    pub is_hidden: bool,

    /// The pending or last flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moderation: Option<Moderation>,

    /// Creation time.
    pub created: DateTime<Utc>,

    /// Last edit time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
}

impl Comment {
    /// Creates a visible, unflagged comment.
    #[must_use]
    pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            text: text.into(),
            author: author.into(),
            created_by: None,
            is_flagged: false,
            is_hidden: false,
            moderation: None,
            created: Utc::now(),
            updated: None,
        }
    }

    /// Replaces the text and stamps the update time.
    pub fn edit(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.updated = Some(Utc::now());
    }

    /// Marks the comment flagged and records the report.
    pub fn flag(&mut self, report: FlagReport) {
        self.is_flagged = true;
        self.moderation = Some(Moderation {
            reason: report.reason,
            description: report.description,
            reporter: report.reporter,
            flagged_at: Utc::now(),
        });
    }

    /// Clears the flag and its moderation record.
    pub fn dismiss_flag(&mut self) {
        self.is_flagged = false;
        self.moderation = None;
    }
}

impl GraphEntity for Comment {
    const KIND: EntityKind = EntityKind::Comment;

    fn id(&self) -> NodeId {
        self.id
    }
}
