//! Request and response payloads exchanged with the (external) transport layer.

use chrono::{DateTime, Utc};
use domains::{Board, BoardId, Category, Comment, CommentId, MemberId, SortType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBoardRequest {
    pub member_id: MemberId,
    pub title: String,
    pub content: String,
    pub category: Category,
    pub deadline: DateTime<Utc>,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardCreateResponse {
    pub board_id: BoardId,
    pub member_id: MemberId,
    pub created_at: DateTime<Utc>,
}

/// Read-only projection of a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardView {
    pub board_id: BoardId,
    pub member_id: MemberId,
    pub title: String,
    pub content: String,
    pub category: Category,
    pub deadline: DateTime<Utc>,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Board> for BoardView {
    fn from(board: &Board) -> Self {
        Self {
            board_id: board.id,
            member_id: board.owner,
            title: board.title.clone(),
            content: board.content.clone(),
            category: board.category,
            deadline: board.deadline,
            images: board.image_paths(),
            created_at: board.timestamps.created_at,
            updated_at: board.timestamps.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchBoardsRequest {
    /// Id of the last board of the previous page; `None` for the first page.
    pub cursor: Option<BoardId>,
    /// Falls back to the configured default when `None`.
    pub page_size: Option<usize>,
    #[serde(default)]
    pub sort: SortType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSearchResponse {
    pub boards: Vec<BoardView>,
    pub has_next: bool,
    pub next_cursor: Option<BoardId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBoardRequest {
    /// The member asking for the change; must own the board.
    pub member_id: MemberId,
    pub title: String,
    pub content: String,
    pub category: Category,
    pub deadline: DateTime<Utc>,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub member_id: MemberId,
    pub board_id: BoardId,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommentRequest {
    pub member_id: MemberId,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub comment_id: CommentId,
    pub board_id: BoardId,
    pub member_id: MemberId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Comment> for CommentView {
    fn from(comment: &Comment) -> Self {
        Self {
            comment_id: comment.id,
            board_id: comment.board_id,
            member_id: comment.author,
            content: comment.content.clone(),
            created_at: comment.timestamps.created_at,
            updated_at: comment.timestamps.updated_at,
        }
    }
}
