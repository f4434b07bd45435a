//! # Comment Service
//!
//! Register, list, edit and remove comments on boards. Editing and removal
//! are limited to the comment's author.

use std::sync::Arc;

use domains::{
    ensure_not_blank, BoardId, BoardRepository, Comment, CommentId, CommentRepository,
    DomainError, MemberId, MemberRepository, NewComment, Result,
};
use tracing::{info, warn};

use crate::dto::{CommentView, CreateCommentRequest, UpdateCommentRequest};

#[derive(Clone)]
pub struct CommentService {
    members: Arc<dyn MemberRepository>,
    boards: Arc<dyn BoardRepository>,
    comments: Arc<dyn CommentRepository>,
}

impl CommentService {
    pub fn new(
        members: Arc<dyn MemberRepository>,
        boards: Arc<dyn BoardRepository>,
        comments: Arc<dyn CommentRepository>,
    ) -> Self {
        Self {
            members,
            boards,
            comments,
        }
    }

    pub async fn create_comment(&self, request: CreateCommentRequest) -> Result<CommentId> {
        ensure_not_blank("comment content", &request.content)?;
        if self.members.find_by_id(request.member_id).await?.is_none() {
            return Err(DomainError::MemberNotFound(request.member_id));
        }
        self.ensure_board_exists(request.board_id).await?;

        let comment = self
            .comments
            .save(&NewComment {
                board_id: request.board_id,
                author: request.member_id,
                content: request.content,
            })
            .await?;
        info!(comment_id = %comment.id, board_id = %comment.board_id, "comment created");
        Ok(comment.id)
    }

    /// Comments on the board, oldest first.
    pub async fn list_comments(&self, board_id: BoardId) -> Result<Vec<CommentView>> {
        self.ensure_board_exists(board_id).await?;
        let comments = self.comments.list_by_board(board_id).await?;
        Ok(comments.iter().map(CommentView::from).collect())
    }

    pub async fn update_comment(
        &self,
        comment_id: CommentId,
        request: UpdateCommentRequest,
    ) -> Result<bool> {
        let mut comment = self.load_comment(comment_id).await?;
        if let Err(err) = comment.edit(request.member_id, request.content) {
            warn!(comment_id = %comment_id, member_id = %request.member_id, error = %err, "comment edit rejected");
            return Err(err);
        }

        info!(comment_id = %comment.id, "updating comment");
        self.comments.update(&comment).await?;
        Ok(true)
    }

    pub async fn delete_comment(&self, comment_id: CommentId, member_id: MemberId) -> Result<bool> {
        let comment = self.load_comment(comment_id).await?;
        if let Err(err) = comment.verify_author(member_id) {
            warn!(comment_id = %comment_id, member_id = %member_id, "comment delete rejected");
            return Err(err);
        }

        info!(comment_id = %comment.id, "deleting comment");
        self.comments.delete(comment.id).await?;
        Ok(true)
    }

    async fn ensure_board_exists(&self, board_id: BoardId) -> Result<()> {
        match self.boards.find_by_id(board_id).await? {
            Some(_) => Ok(()),
            None => Err(DomainError::BoardNotFound(board_id)),
        }
    }

    async fn load_comment(&self, comment_id: CommentId) -> Result<Comment> {
        self.comments
            .find_by_id(comment_id)
            .await?
            .ok_or(DomainError::CommentNotFound(comment_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{MockBoardRepository, MockCommentRepository, MockMemberRepository, Timestamps};

    fn comment(id: i64, author: i64) -> Comment {
        Comment {
            id: CommentId(id),
            board_id: BoardId(1),
            author: MemberId(author),
            content: "buy it".to_string(),
            timestamps: Timestamps::now(),
        }
    }

    fn service(comments: MockCommentRepository) -> CommentService {
        CommentService::new(
            Arc::new(MockMemberRepository::new()),
            Arc::new(MockBoardRepository::new()),
            Arc::new(comments),
        )
    }

    #[tokio::test]
    async fn blank_comment_is_rejected_before_any_lookup() {
        let err = service(MockCommentRepository::new())
            .create_comment(CreateCommentRequest {
                member_id: MemberId(1),
                board_id: BoardId(1),
                content: "  \n".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn only_the_author_can_edit() {
        let mut comments = MockCommentRepository::new();
        comments.expect_find_by_id().returning(|id| Ok(Some(comment(id.0, 2))));
        comments.expect_update().never();

        let err = service(comments)
            .update_comment(
                CommentId(4),
                UpdateCommentRequest {
                    member_id: MemberId(3),
                    content: "skip it".to_string(),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn author_edit_is_persisted() {
        let mut comments = MockCommentRepository::new();
        comments.expect_find_by_id().returning(|id| Ok(Some(comment(id.0, 2))));
        comments
            .expect_update()
            .withf(|c| c.id == CommentId(4) && c.content == "skip it")
            .times(1)
            .returning(|c| Ok(c.clone()));

        let updated = service(comments)
            .update_comment(
                CommentId(4),
                UpdateCommentRequest {
                    member_id: MemberId(2),
                    content: "skip it".to_string(),
                },
            )
            .await
            .unwrap();

        assert!(updated);
    }

    #[tokio::test]
    async fn deleting_a_missing_comment_is_not_found() {
        let mut comments = MockCommentRepository::new();
        comments.expect_find_by_id().returning(|_| Ok(None));

        let err = service(comments)
            .delete_comment(CommentId(8), MemberId(1))
            .await
            .unwrap_err();

        assert_eq!(err, DomainError::CommentNotFound(CommentId(8)));
    }

    #[tokio::test]
    async fn listing_comments_of_a_missing_board_is_not_found() {
        let mut boards = MockBoardRepository::new();
        boards.expect_find_by_id().returning(|_| Ok(None));
        let mut comments = MockCommentRepository::new();
        comments.expect_list_by_board().never();

        let svc = CommentService::new(
            Arc::new(MockMemberRepository::new()),
            Arc::new(boards),
            Arc::new(comments),
        );
        let err = svc.list_comments(BoardId(5)).await.unwrap_err();

        assert_eq!(err, DomainError::BoardNotFound(BoardId(5)));
    }
}
