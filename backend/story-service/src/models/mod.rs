/// Data structures for stories
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::AppError;

/// Visibility gate controlling non-owner read access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryStatus {
    Public,
    Private,
}

impl StoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoryStatus::Public => "public",
            StoryStatus::Private => "private",
        }
    }
}

impl TryFrom<&str> for StoryStatus {
    type Error = AppError;
    fn try_from(s: &str) -> std::result::Result<Self, Self::Error> {
        match s {
            "public" => Ok(StoryStatus::Public),
            "private" => Ok(StoryStatus::Private),
            _ => Err(AppError::Validation(format!("invalid status '{}'", s))),
        }
    }
}

/// A persisted story record.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Story {
    pub id: Uuid,
    pub title: String,
    pub image_url: String,
    pub media_key: String,
    pub body: String,
    pub colors: Vec<String>,
    pub likes: i32,
    pub pattern_type: Option<String>,
    pub pattern_link: Option<String>,
    pub status: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Story {
    pub fn is_private(&self) -> bool {
        self.status == StoryStatus::Private.as_str()
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

/// A story joined with its author's display data, as list and detail pages
/// need it.
#[derive(Debug, Clone, Serialize)]
pub struct StoryWithAuthor {
    #[serde(flatten)]
    pub story: Story,
    pub author_name: String,
}

/// Validated story fields as submitted through the add/edit forms.
///
/// Construction is the only path in, so a draft always carries a trimmed
/// non-empty title, a non-empty body, and a recognized status.
#[derive(Debug, Clone)]
pub struct StoryDraft {
    pub title: String,
    pub body: String,
    pub colors: Vec<String>,
    pub pattern_type: Option<String>,
    pub pattern_link: Option<String>,
    pub status: StoryStatus,
}

impl StoryDraft {
    pub fn new(
        title: &str,
        body: &str,
        colors: Option<&str>,
        pattern_type: Option<&str>,
        pattern_link: Option<&str>,
        status: Option<&str>,
    ) -> crate::Result<Self> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("title is required".into()));
        }
        if body.trim().is_empty() {
            return Err(AppError::Validation("body is required".into()));
        }

        let status = match status {
            Some(s) if !s.trim().is_empty() => StoryStatus::try_from(s.trim())?,
            _ => StoryStatus::Public,
        };

        Ok(StoryDraft {
            title: title.to_string(),
            body: body.to_string(),
            colors: parse_colors(colors.unwrap_or_default()),
            pattern_type: non_empty(pattern_type),
            pattern_link: non_empty(pattern_link),
            status,
        })
    }
}

/// Urlencoded body of the edit form; field names match the form inputs.
#[derive(Debug, Deserialize)]
pub struct StoryUpdateForm {
    pub title: String,
    pub body: String,
    pub colors: Option<String>,
    #[serde(rename = "patternType")]
    pub pattern_type: Option<String>,
    #[serde(rename = "patternLink")]
    pub pattern_link: Option<String>,
    pub status: Option<String>,
}

impl TryFrom<StoryUpdateForm> for StoryDraft {
    type Error = AppError;
    fn try_from(form: StoryUpdateForm) -> std::result::Result<Self, Self::Error> {
        StoryDraft::new(
            &form.title,
            &form.body,
            form.colors.as_deref(),
            form.pattern_type.as_deref(),
            form.pattern_link.as_deref(),
            form.status.as_deref(),
        )
    }
}

/// Colors arrive as one comma-separated input.
fn parse_colors(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
