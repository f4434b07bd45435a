//! The shared scenarios against a real PostgreSQL, plus checks of the SQL
//! the in-memory store has no counterpart for. Needs Docker.

use domains::{
    BoardImage, BoardRepository, Category, CommentRepository, ImageId, MemberRepository, NewBoard,
    NewComment, RepositoryError,
};
use integration_tests::cases::{board_feed, board_service, comment_service};
use integration_tests::deadline;
use integration_tests::postgres::PgHarness;
use services::PageLimits;
use tokio_test::assert_ok;

macro_rules! pg_cases {
    ($($module:ident :: $case:ident),+ $(,)?) => {
        $(
            #[tokio::test]
            async fn $case() {
                let pg = PgHarness::start().await;
                $module::$case(&pg).await;
            }
        )+
    };
}

pg_cases!(
    board_service::created_board_belongs_to_the_requesting_member,
    board_service::create_for_unknown_member_is_not_found_not_unauthorized,
    board_service::get_missing_board_is_not_found,
    board_service::non_owner_update_is_rejected_and_board_is_unchanged,
    board_service::owner_update_persists_new_fields_and_keeps_identity,
    board_service::update_of_missing_board_is_not_found,
    board_service::deleted_board_can_no_longer_be_read,
    board_service::delete_takes_no_requester_and_removes_only_that_board,
    board_feed::two_boards_paged_one_at_a_time,
    board_feed::first_page_is_bounded_and_strictly_descending,
    board_feed::cursor_page_only_contains_older_boards,
    board_feed::following_cursors_visits_every_board_once,
    board_feed::exact_multiple_of_page_size_ends_without_an_empty_page,
    board_feed::boards_created_mid_walk_do_not_shift_later_pages,
    comment_service::comments_are_listed_oldest_first,
    comment_service::commenting_requires_existing_member_and_board,
    comment_service::only_the_author_can_edit_or_delete,
    comment_service::deleting_a_board_removes_its_comments,
);

#[tokio::test]
async fn default_page_size_comes_from_the_limits() {
    let pg = PgHarness::with_limits(PageLimits {
        default_page_size: 3,
        max_page_size: 5,
    })
    .await;
    board_feed::default_page_size_comes_from_the_limits(&pg).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_are_walked_once_in_id_order() {
    let pg = PgHarness::start().await;
    board_feed::concurrent_creates_are_walked_once_in_id_order(&pg, 8, 40).await;
}

fn new_board(owner: domains::MemberId, paths: &[&str]) -> NewBoard {
    NewBoard {
        owner,
        title: "A".to_string(),
        content: "content".to_string(),
        category: Category::Vote,
        deadline: deadline(),
        images: paths.iter().map(|path| BoardImage::detached(*path)).collect(),
    }
}

#[tokio::test]
async fn registering_an_existing_email_refreshes_the_nickname() {
    let pg = PgHarness::start().await;

    let first = pg.store.register_member("a@example.com", "a").await.unwrap();
    let again = pg.store.register_member("a@example.com", "renamed").await.unwrap();

    assert_eq!(again.id, first.id);
    assert_eq!(again.nickname, "renamed");
    let found = MemberRepository::find_by_id(&*pg.store, first.id).await.unwrap();
    assert_eq!(found.map(|member| member.nickname), Some("renamed".to_string()));
}

#[tokio::test]
async fn update_keeps_listed_images_drops_the_rest_and_inserts_new_ones() {
    let pg = PgHarness::start().await;
    let owner = pg.store.register_member("a@example.com", "a").await.unwrap().id;
    let mut board = BoardRepository::save(&*pg.store, &new_board(owner, &["keep.png", "drop.png"]))
        .await
        .unwrap();
    let kept = board.images[0].clone();

    board.images = vec![kept.clone(), BoardImage::detached("added.png")];
    let saved = BoardRepository::update(&*pg.store, &board).await.unwrap();

    assert_eq!(saved.images.len(), 2);
    assert_eq!(saved.images[0], kept);
    assert_eq!(saved.images[1].path, "added.png");
    assert!(saved.images[1].id > kept.id);
    assert_eq!(
        BoardRepository::find_by_id(&*pg.store, board.id).await.unwrap(),
        Some(saved)
    );
}

#[tokio::test]
async fn update_with_a_foreign_image_id_rolls_back() {
    let pg = PgHarness::start().await;
    let owner = pg.store.register_member("a@example.com", "a").await.unwrap().id;
    let other = BoardRepository::save(&*pg.store, &new_board(owner, &["other.png"]))
        .await
        .unwrap();
    let mut board = BoardRepository::save(&*pg.store, &new_board(owner, &["mine.png"]))
        .await
        .unwrap();
    let before = board.clone();

    board.title = "B".to_string();
    board.images.push(other.images[0].clone());
    let err = BoardRepository::update(&*pg.store, &board).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Query(_)));

    board.images = vec![BoardImage {
        id: Some(ImageId(9_999)),
        path: "ghost.png".to_string(),
    }];
    assert!(BoardRepository::update(&*pg.store, &board).await.is_err());

    assert_eq!(
        BoardRepository::find_by_id(&*pg.store, before.id).await.unwrap(),
        Some(before)
    );
}

#[tokio::test]
async fn delete_cascades_to_images_and_comments() {
    let pg = PgHarness::start().await;
    let owner = pg.store.register_member("a@example.com", "a").await.unwrap().id;
    let board = BoardRepository::save(&*pg.store, &new_board(owner, &["a.png", "b.png"]))
        .await
        .unwrap();
    let comment = assert_ok!(
        CommentRepository::save(
            &*pg.store,
            &NewComment {
                board_id: board.id,
                author: owner,
                content: "hi".to_string(),
            },
        )
        .await
    );

    BoardRepository::delete(&*pg.store, board.id).await.unwrap();

    assert!(BoardRepository::find_by_id(&*pg.store, board.id).await.unwrap().is_none());
    assert!(CommentRepository::find_by_id(&*pg.store, comment.id).await.unwrap().is_none());
    assert!(pg.store.list_by_board(board.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn comment_on_a_missing_board_is_a_query_error() {
    let pg = PgHarness::start().await;
    let owner = pg.store.register_member("a@example.com", "a").await.unwrap().id;

    let err = CommentRepository::save(
        &*pg.store,
        &NewComment {
            board_id: domains::BoardId(42),
            author: owner,
            content: "hi".to_string(),
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, RepositoryError::Query(_)));
}
