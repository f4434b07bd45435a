//! # Ports
//!
//! Persistence contracts the services depend on. Storage adapters implement
//! these; tests use the generated `MockXxx` types (feature `testing`).

use async_trait::async_trait;

use crate::error::RepositoryError;
use crate::models::{Board, BoardId, Comment, CommentId, Member, MemberId, NewBoard, NewComment};

/// Read-only member lookup. Members are managed elsewhere.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MemberRepository: Send + Sync {
    async fn find_by_id(&self, id: MemberId) -> Result<Option<Member>, RepositoryError>;
}

/// Persistence and feed queries for the board aggregate.
///
/// Feed queries order by `created_at DESC, id DESC`.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait BoardRepository: Send + Sync {
    /// Inserts a board with its images and returns it with identifiers and
    /// timestamps assigned.
    async fn save(&self, board: &NewBoard) -> Result<Board, RepositoryError>;

    /// Persists every mutable field. Images without an id are inserted and
    /// stored images missing from `board.images` are deleted, atomically.
    async fn update(&self, board: &Board) -> Result<Board, RepositoryError>;

    async fn find_by_id(&self, id: BoardId) -> Result<Option<Board>, RepositoryError>;

    /// Removes the board together with its images and comments.
    async fn delete(&self, id: BoardId) -> Result<(), RepositoryError>;

    /// First page of the feed, newest first.
    async fn list_latest(&self, limit: usize) -> Result<Vec<Board>, RepositoryError>;

    /// Next page of the feed: boards with `id < cursor`, newest first.
    async fn list_latest_before(
        &self,
        cursor: BoardId,
        limit: usize,
    ) -> Result<Vec<Board>, RepositoryError>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn save(&self, comment: &NewComment) -> Result<Comment, RepositoryError>;

    async fn update(&self, comment: &Comment) -> Result<Comment, RepositoryError>;

    async fn find_by_id(&self, id: CommentId) -> Result<Option<Comment>, RepositoryError>;

    async fn delete(&self, id: CommentId) -> Result<(), RepositoryError>;

    /// Comments on one board, oldest first.
    async fn list_by_board(&self, board_id: BoardId) -> Result<Vec<Comment>, RepositoryError>;
}
