//! # Domain Models
//!
//! These structs represent the core entities of the community board.
//! Identifiers are store-assigned, monotonically increasing integers, so
//! id order follows creation order and doubles as the pagination cursor.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{DomainError, Result};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

define_id!(
    /// Identifier of a registered member.
    MemberId
);
define_id!(
    /// Identifier of a board; also the cursor key for the board feed.
    BoardId
);
define_id!(ImageId);
define_id!(CommentId);

/// Creation and modification times, embedded in every stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timestamps {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Timestamps {
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self {
            created_at: instant,
            updated_at: instant,
        }
    }

    pub fn now() -> Self {
        Self::at(Utc::now())
    }

    /// Moves `updated_at` forward; `created_at` never changes.
    pub fn touch(&mut self, instant: DateTime<Utc>) {
        self.updated_at = instant;
    }
}

/// A community member. The core only ever reads members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub email: String,
    pub nickname: String,
    pub timestamps: Timestamps,
}

/// Kind of board post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    /// Members vote on a single item (buy it or not).
    Vote,
    /// Members pick one of several attached items.
    Choice,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vote => "VOTE",
            Self::Choice => "CHOICE",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown board category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "VOTE" => Ok(Self::Vote),
            "CHOICE" => Ok(Self::Choice),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

/// Ordering of the board feed. Latest-first is the only ordering the
/// store supports, so it is the only one that can be requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortType {
    #[default]
    Latest,
}

/// An image attached to a board. `id` is `None` until the store persists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardImage {
    pub id: Option<ImageId>,
    pub path: String,
}

impl BoardImage {
    pub fn detached(path: impl Into<String>) -> Self {
        Self {
            id: None,
            path: path.into(),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

/// Input for [`crate::ports::BoardRepository::save`]: a board before the
/// store assigns its identifiers and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBoard {
    pub owner: MemberId,
    pub title: String,
    pub content: String,
    pub category: Category,
    pub deadline: DateTime<Utc>,
    pub images: Vec<BoardImage>,
}

/// Replacement values for every mutable field of a board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardChanges {
    pub title: String,
    pub content: String,
    pub category: Category,
    pub deadline: DateTime<Utc>,
    pub image_paths: Vec<String>,
}

/// The board aggregate: the post itself plus the images it exclusively owns.
///
/// The owner is fixed at creation. Only the owner may change the other
/// fields, see [`Board::update`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub owner: MemberId,
    pub title: String,
    pub content: String,
    pub category: Category,
    pub deadline: DateTime<Utc>,
    pub images: Vec<BoardImage>,
    pub timestamps: Timestamps,
}

impl Board {
    pub fn is_owned_by(&self, member: MemberId) -> bool {
        self.owner == member
    }

    /// Fails with [`DomainError::Unauthorized`] unless `member` owns the board.
    pub fn verify_owner(&self, member: MemberId) -> Result<()> {
        if self.is_owned_by(member) {
            Ok(())
        } else {
            Err(DomainError::Unauthorized(format!(
                "member {member} does not own board {}",
                self.id
            )))
        }
    }

    /// Applies `changes` on behalf of `requester`.
    ///
    /// The image set is replaced wholesale: every previous image is dropped
    /// and the new paths come back detached, to be persisted by the store.
    /// Nothing is modified when the ownership check fails.
    pub fn update(&mut self, requester: MemberId, changes: BoardChanges) -> Result<()> {
        self.verify_owner(requester)?;

        let BoardChanges {
            title,
            content,
            category,
            deadline,
            image_paths,
        } = changes;
        self.title = title;
        self.content = content;
        self.category = category;
        self.deadline = deadline;
        self.images = image_paths.into_iter().map(BoardImage::detached).collect();
        Ok(())
    }

    pub fn image_paths(&self) -> Vec<String> {
        self.images.iter().map(|image| image.path.clone()).collect()
    }
}

/// Input for [`crate::ports::CommentRepository::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub board_id: BoardId,
    pub author: MemberId,
    pub content: String,
}

/// A comment left by a member on a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub board_id: BoardId,
    pub author: MemberId,
    pub content: String,
    pub timestamps: Timestamps,
}

impl Comment {
    pub fn verify_author(&self, member: MemberId) -> Result<()> {
        if self.author == member {
            Ok(())
        } else {
            Err(DomainError::Unauthorized(format!(
                "member {member} did not write comment {}",
                self.id
            )))
        }
    }

    pub fn edit(&mut self, requester: MemberId, content: String) -> Result<()> {
        self.verify_author(requester)?;
        ensure_not_blank("comment content", &content)?;
        self.content = content;
        Ok(())
    }
}

/// Rejects empty or whitespace-only text.
pub fn ensure_not_blank(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DomainError::Validation(format!("{field} must not be blank")));
    }
    Ok(())
}
