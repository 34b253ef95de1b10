use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub user_title: Option<String>,
    pub project_name: String,
    pub project_description: Option<String>,
    pub tags: Vec<String>,
    pub rating: i16,
    pub review_type: ReviewType,
    pub review_text: Option<String>,
    pub video_url: Option<String>,
    pub status: ReviewStatus,
    pub admin_notes: Option<String>,
    pub hide_rating: Option<bool>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

/// A validated submission ready to be persisted. Always stored as `pending`.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub user_name: String,
    pub user_email: String,
    pub user_title: Option<String>,
    pub project_name: String,
    pub project_description: Option<String>,
    pub tags: Vec<String>,
    pub rating: i16,
    pub review_type: ReviewType,
    pub review_text: Option<String>,
    pub video_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewType {
    Text,
    Video,
    Both,
}

impl ReviewType {
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "text" => Some(Self::Text),
            "video" => Some(Self::Video),
            "both" => Some(Self::Both),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Video => "video",
            Self::Both => "both",
        }
    }

    pub fn needs_text(&self) -> bool {
        matches!(self, Self::Text | Self::Both)
    }

    pub fn needs_video(&self) -> bool {
        matches!(self, Self::Video | Self::Both)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Self::Approved)
    }
}

/// Moderator status decision. Any status may follow any other.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub status: ReviewStatus,
    pub admin_notes: Option<String>,
}

/// In-place moderator edit of non-status fields. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ReviewEdit {
    pub project_name: Option<String>,
    pub tags: Option<Vec<String>>,
    pub created_at: Option<OffsetDateTime>,
}
