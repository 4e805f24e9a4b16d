//! Outgoing post/event model.
//!
//! # Responsibility
//! - Define the persisted shape of a social post or event invite.
//! - Validate title and event window before persistence.
//!
//! # Invariants
//! - `id` is stable and never nil.
//! - `recipients` holds unique entries in persisted order.
//! - `event_end` is never earlier than `event_start`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type PostId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostKind {
    /// Plain social post.
    Post,
    /// Event invite; requires `event_start`.
    Event,
}

/// Persisted post record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    #[serde(rename = "type")]
    pub kind: PostKind,
    pub title: String,
    pub body: String,
    /// Unix epoch milliseconds.
    pub event_start: Option<i64>,
    /// Unix epoch milliseconds.
    pub event_end: Option<i64>,
    /// Household ids or free-form recipient labels.
    pub recipients: Vec<String>,
}

/// Caller input for a new post; recipients come from targeting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub kind: PostKind,
    pub title: String,
    pub body: String,
    pub event_start: Option<i64>,
    pub event_end: Option<i64>,
}

impl PostDraft {
    pub fn post(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind: PostKind::Post,
            title: title.into(),
            body: body.into(),
            event_start: None,
            event_end: None,
        }
    }

    pub fn event(title: impl Into<String>, start_epoch_ms: i64, end_epoch_ms: Option<i64>) -> Self {
        Self {
            kind: PostKind::Event,
            title: title.into(),
            body: String::new(),
            event_start: Some(start_epoch_ms),
            event_end: end_epoch_ms,
        }
    }
}

impl Post {
    /// Materializes a draft with a fresh id and the given recipients.
    pub fn from_draft(draft: PostDraft, recipients: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: draft.kind,
            title: draft.title.trim().to_string(),
            body: draft.body,
            event_start: draft.event_start,
            event_end: draft.event_end,
            recipients,
        }
    }

    pub fn validate(&self) -> Result<(), PostValidationError> {
        if self.id.is_nil() {
            return Err(PostValidationError::NilId);
        }
        if self.title.trim().is_empty() {
            return Err(PostValidationError::BlankTitle);
        }
        if self.kind == PostKind::Event && self.event_start.is_none() {
            return Err(PostValidationError::MissingEventStart);
        }
        if let (Some(start), Some(end)) = (self.event_start, self.event_end) {
            if end < start {
                return Err(PostValidationError::InvalidEventWindow { start, end });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostValidationError {
    NilId,
    BlankTitle,
    MissingEventStart,
    InvalidEventWindow { start: i64, end: i64 },
}

impl Display for PostValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "post id must not be nil"),
            Self::BlankTitle => write!(f, "post title must not be blank"),
            Self::MissingEventStart => write!(f, "event posts require event_start"),
            Self::InvalidEventWindow { start, end } => {
                write!(f, "event_end ({end}) must be >= event_start ({start})")
            }
        }
    }
}

impl Error for PostValidationError {}
