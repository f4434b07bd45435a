use domains::{BoardId, CommentId, DomainError, ErrorKind, MemberId};
use services::{CreateCommentRequest, UpdateCommentRequest};
use tokio_test::assert_ok;

use crate::Harness;

fn comment(member_id: MemberId, board_id: BoardId, content: &str) -> CreateCommentRequest {
    CreateCommentRequest {
        member_id,
        board_id,
        content: content.to_string(),
    }
}

pub async fn comments_are_listed_oldest_first(h: &Harness) {
    let owner = h.member("owner").await;
    let voter = h.member("voter").await;
    let board = h.board(owner, "A").await;

    let first = assert_ok!(h.comments.create_comment(comment(voter, board, "buy it")).await);
    let second = assert_ok!(h.comments.create_comment(comment(owner, board, "thanks")).await);

    let listed = h.comments.list_comments(board).await.unwrap();
    let ids: Vec<_> = listed.iter().map(|c| c.comment_id).collect();
    assert_eq!(ids, vec![first, second]);
    assert_eq!(listed[0].member_id, voter);
}

pub async fn commenting_requires_existing_member_and_board(h: &Harness) {
    let owner = h.member("owner").await;
    let board = h.board(owner, "A").await;

    let err = h
        .comments
        .create_comment(comment(MemberId(99), board, "hi"))
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::MemberNotFound(MemberId(99)));

    let err = h
        .comments
        .create_comment(comment(owner, BoardId(99), "hi"))
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::BoardNotFound(BoardId(99)));
}

pub async fn only_the_author_can_edit_or_delete(h: &Harness) {
    let owner = h.member("owner").await;
    let voter = h.member("voter").await;
    let board = h.board(owner, "A").await;
    let id = h
        .comments
        .create_comment(comment(voter, board, "buy it"))
        .await
        .unwrap();

    let err = h
        .comments
        .update_comment(
            id,
            UpdateCommentRequest {
                member_id: owner,
                content: "no".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let err = h.comments.delete_comment(id, owner).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    assert!(h
        .comments
        .update_comment(
            id,
            UpdateCommentRequest {
                member_id: voter,
                content: "actually, skip it".to_string(),
            },
        )
        .await
        .unwrap());
    let listed = h.comments.list_comments(board).await.unwrap();
    assert_eq!(listed[0].content, "actually, skip it");

    assert!(h.comments.delete_comment(id, voter).await.unwrap());
    assert!(h.comments.list_comments(board).await.unwrap().is_empty());
    assert_eq!(
        h.comments.delete_comment(id, voter).await.unwrap_err(),
        DomainError::CommentNotFound(CommentId(id.0))
    );
}

pub async fn deleting_a_board_removes_its_comments(h: &Harness) {
    let owner = h.member("owner").await;
    let board = h.board(owner, "A").await;
    let id = h
        .comments
        .create_comment(comment(owner, board, "bump"))
        .await
        .unwrap();

    h.boards.delete_board(board).await.unwrap();

    assert_eq!(
        h.comments.delete_comment(id, owner).await.unwrap_err(),
        DomainError::CommentNotFound(id)
    );
    assert_eq!(
        h.comments.list_comments(board).await.unwrap_err(),
        DomainError::BoardNotFound(board)
    );
}
