use std::collections::HashSet;

use domains::{BoardId, DomainError, SortType};
use services::SearchBoardsRequest;
use tokio::task::JoinSet;

use crate::{create_request, Harness};

fn page(cursor: Option<BoardId>, page_size: usize) -> SearchBoardsRequest {
    SearchBoardsRequest {
        cursor,
        page_size: Some(page_size),
        sort: SortType::Latest,
    }
}

/// Follows `next_cursor` from the head of the feed until `has_next` is false.
async fn walk(h: &Harness, page_size: usize) -> Vec<BoardId> {
    let mut seen = Vec::new();
    let mut cursor = None;
    loop {
        let result = h.boards.search_boards(page(cursor, page_size)).await.unwrap();
        seen.extend(result.boards.iter().map(|b| b.board_id));
        if !result.has_next {
            return seen;
        }
        cursor = result.next_cursor;
    }
}

pub async fn two_boards_paged_one_at_a_time(h: &Harness) {
    let owner = h.member("owner").await;
    let first = h.board(owner, "A").await;
    let second = h.board(owner, "B").await;
    assert_eq!((first, second), (BoardId(1), BoardId(2)));

    let head = h.boards.search_boards(page(None, 1)).await.unwrap();
    assert_eq!(head.boards.len(), 1);
    assert_eq!(head.boards[0].board_id, BoardId(2));
    assert!(head.has_next);
    assert_eq!(head.next_cursor, Some(BoardId(2)));

    let tail = h.boards.search_boards(page(head.next_cursor, 1)).await.unwrap();
    assert_eq!(tail.boards.len(), 1);
    assert_eq!(tail.boards[0].board_id, BoardId(1));
    assert!(!tail.has_next);
    assert_eq!(tail.next_cursor, Some(BoardId(1)));
}

pub async fn first_page_is_bounded_and_strictly_descending(h: &Harness) {
    let owner = h.member("owner").await;
    for i in 0..7 {
        h.board(owner, &format!("board-{i}")).await;
    }

    let result = h.boards.search_boards(page(None, 5)).await.unwrap();

    assert_eq!(result.boards.len(), 5);
    assert!(result
        .boards
        .windows(2)
        .all(|pair| pair[0].board_id > pair[1].board_id));
}

pub async fn cursor_page_only_contains_older_boards(h: &Harness) {
    let owner = h.member("owner").await;
    for i in 0..6 {
        h.board(owner, &format!("board-{i}")).await;
    }

    let result = h.boards.search_boards(page(Some(BoardId(4)), 10)).await.unwrap();

    assert!(result.boards.iter().all(|b| b.board_id < BoardId(4)));
    assert_eq!(result.boards.len(), 3);
    assert!(!result.has_next);
}

pub async fn following_cursors_visits_every_board_once(h: &Harness) {
    let owner = h.member("owner").await;
    let mut created = HashSet::new();
    for i in 0..23 {
        created.insert(h.board(owner, &format!("board-{i}")).await);
    }

    let seen = walk(h, 5).await;

    assert_eq!(seen.len(), created.len());
    assert_eq!(seen.iter().copied().collect::<HashSet<_>>(), created);
}

pub async fn exact_multiple_of_page_size_ends_without_an_empty_page(h: &Harness) {
    let owner = h.member("owner").await;
    for i in 0..4 {
        h.board(owner, &format!("board-{i}")).await;
    }

    let head = h.boards.search_boards(page(None, 2)).await.unwrap();
    assert!(head.has_next);
    let tail = h.boards.search_boards(page(head.next_cursor, 2)).await.unwrap();
    assert_eq!(tail.boards.len(), 2);
    assert!(!tail.has_next);
}

pub async fn boards_created_mid_walk_do_not_shift_later_pages(h: &Harness) {
    let owner = h.member("owner").await;
    for i in 0..4 {
        h.board(owner, &format!("board-{i}")).await;
    }

    let head = h.boards.search_boards(page(None, 2)).await.unwrap();
    h.board(owner, "late arrival").await;
    let tail = h.boards.search_boards(page(head.next_cursor, 2)).await.unwrap();

    let ids: Vec<_> = tail.boards.iter().map(|b| b.board_id).collect();
    assert_eq!(ids, vec![BoardId(2), BoardId(1)]);
}

/// Expects a harness built with a default page size of 3 and a max of 5.
pub async fn default_page_size_comes_from_the_limits(h: &Harness) {
    let owner = h.member("owner").await;
    for i in 0..4 {
        h.board(owner, &format!("board-{i}")).await;
    }

    let result = h
        .boards
        .search_boards(SearchBoardsRequest::default())
        .await
        .unwrap();
    assert_eq!(result.boards.len(), 3);
    assert!(result.has_next);

    let err = h.boards.search_boards(page(None, 6)).await.unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

/// Creates `tasks * per_task` boards from parallel tasks, then walks the
/// whole feed. Run it on a multi-threaded runtime.
pub async fn concurrent_creates_are_walked_once_in_id_order(
    h: &Harness,
    tasks: usize,
    per_task: usize,
) {
    let owner = h.member("owner").await;

    let mut writers = JoinSet::new();
    for task in 0..tasks {
        let boards = h.boards.clone();
        writers.spawn(async move {
            for n in 0..per_task {
                boards
                    .create_board(create_request(owner, &format!("t{task}-{n}")))
                    .await
                    .expect("concurrent create should succeed");
            }
        });
    }
    while let Some(joined) = writers.join_next().await {
        joined.unwrap();
    }

    let seen = walk(h, 100).await;

    assert!(seen.windows(2).all(|pair| pair[0] > pair[1]));
    assert_eq!(seen.len(), tasks * per_task);
}
