use domains::{BoardId, Category, DomainError, ErrorKind, MemberId};
use tokio_test::{assert_err, assert_ok};

use crate::{create_request, update_request, Harness};

pub async fn created_board_belongs_to_the_requesting_member(h: &Harness) {
    let owner = h.member("seller").await;

    let created = assert_ok!(h.boards.create_board(create_request(owner, "A")).await);
    assert_eq!(created.member_id, owner);

    let view = h.boards.get_board(created.board_id).await.unwrap();
    assert_eq!(view.member_id, owner);
    assert_eq!(view.title, "A");
    assert_eq!(view.images, vec!["boards/A/cover.png"]);
    assert_eq!(view.created_at, created.created_at);
}

pub async fn create_for_unknown_member_is_not_found_not_unauthorized(h: &Harness) {
    let err = assert_err!(h.boards.create_board(create_request(MemberId(404), "A")).await);

    assert_eq!(err, DomainError::MemberNotFound(MemberId(404)));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

pub async fn get_missing_board_is_not_found(h: &Harness) {
    let err = h.boards.get_board(BoardId(1)).await.unwrap_err();
    assert_eq!(err, DomainError::BoardNotFound(BoardId(1)));
}

pub async fn non_owner_update_is_rejected_and_board_is_unchanged(h: &Harness) {
    let owner = h.member("owner").await;
    let intruder = h.member("intruder").await;
    let id = h.board(owner, "A").await;
    let before = h.boards.get_board(id).await.unwrap();

    let err = h
        .boards
        .update_board(id, update_request(intruder, "hijacked"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(h.boards.get_board(id).await.unwrap(), before);
}

pub async fn owner_update_persists_new_fields_and_keeps_identity(h: &Harness) {
    let owner = h.member("owner").await;
    let id = h.board(owner, "A").await;

    h.boards
        .update_board(id, update_request(owner, "B"))
        .await
        .unwrap();

    let view = h.boards.get_board(id).await.unwrap();
    assert_eq!(view.board_id, id);
    assert_eq!(view.member_id, owner);
    assert_eq!(view.title, "B");
    assert_eq!(view.content, "B content (edited)");
    assert_eq!(view.category, Category::Choice);
    assert_eq!(view.images, vec!["boards/B/left.png", "boards/B/right.png"]);
    assert!(view.updated_at >= view.created_at);
}

pub async fn update_of_missing_board_is_not_found(h: &Harness) {
    let owner = h.member("owner").await;
    let err = h
        .boards
        .update_board(BoardId(3), update_request(owner, "B"))
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::BoardNotFound(BoardId(3)));
}

pub async fn deleted_board_can_no_longer_be_read(h: &Harness) {
    let owner = h.member("owner").await;
    let id = h.board(owner, "A").await;

    h.boards.delete_board(id).await.unwrap();

    assert_eq!(
        h.boards.get_board(id).await.unwrap_err(),
        DomainError::BoardNotFound(id)
    );
    assert_eq!(
        h.boards.delete_board(id).await.unwrap_err(),
        DomainError::BoardNotFound(id)
    );
}

/// `delete_board` takes no requester: a board owned by one member goes away
/// while another member's board is left alone.
pub async fn delete_takes_no_requester_and_removes_only_that_board(h: &Harness) {
    let owner = h.member("owner").await;
    let bystander = h.member("bystander").await;
    let doomed = h.board(owner, "A").await;
    let kept = h.board(bystander, "B").await;

    assert_ok!(h.boards.delete_board(doomed).await);

    assert_eq!(
        h.boards.get_board(doomed).await.unwrap_err(),
        DomainError::BoardNotFound(doomed)
    );
    assert_eq!(h.boards.get_board(kept).await.unwrap().member_id, bystander);
}
