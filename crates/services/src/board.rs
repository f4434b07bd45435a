//! # Board Service
//!
//! Orchestrates create/read/search/update/delete for boards. Each operation
//! performs at most one mutating store call, so atomicity comes from the
//! store adapter.

use std::sync::Arc;

use domains::{
    Board, BoardChanges, BoardId, BoardImage, BoardRepository, DomainError, MemberRepository,
    NewBoard, Result, SortType,
};
use tracing::{debug, info, warn};

use crate::dto::{
    BoardCreateResponse, BoardSearchResponse, BoardView, CreateBoardRequest, SearchBoardsRequest,
    UpdateBoardRequest,
};
use crate::pagination::{probe_limit, split_probe, PageLimits};

#[derive(Clone)]
pub struct BoardService {
    members: Arc<dyn MemberRepository>,
    boards: Arc<dyn BoardRepository>,
    limits: PageLimits,
}

impl BoardService {
    pub fn new(
        members: Arc<dyn MemberRepository>,
        boards: Arc<dyn BoardRepository>,
        limits: PageLimits,
    ) -> Self {
        Self {
            members,
            boards,
            limits,
        }
    }

    /// Creates a board owned by `request.member_id`.
    ///
    /// Fails with [`DomainError::MemberNotFound`] when the owner does not exist.
    pub async fn create_board(&self, request: CreateBoardRequest) -> Result<BoardCreateResponse> {
        let owner = self
            .members
            .find_by_id(request.member_id)
            .await?
            .ok_or(DomainError::MemberNotFound(request.member_id))?;

        let new_board = NewBoard {
            owner: owner.id,
            title: request.title,
            content: request.content,
            category: request.category,
            deadline: request.deadline,
            images: request.images.into_iter().map(BoardImage::detached).collect(),
        };
        let board = self.boards.save(&new_board).await?;
        info!(board_id = %board.id, member_id = %board.owner, images = board.images.len(), "board created");

        Ok(BoardCreateResponse {
            board_id: board.id,
            member_id: board.owner,
            created_at: board.timestamps.created_at,
        })
    }

    pub async fn get_board(&self, board_id: BoardId) -> Result<BoardView> {
        let board = self.load_board(board_id).await?;
        debug!(board_id = %board.id, "board loaded");
        Ok(BoardView::from(&board))
    }

    /// One page of the board feed, newest first.
    ///
    /// `next_cursor` is the id of the last board on the page (also on the
    /// final page); feed it back as `cursor` to continue.
    pub async fn search_boards(&self, request: SearchBoardsRequest) -> Result<BoardSearchResponse> {
        let page_size = self.limits.resolve(request.page_size)?;
        let limit = probe_limit(page_size);

        let rows = match request.sort {
            SortType::Latest => {
                info!(cursor = ?request.cursor, page_size, "reading boards by latest");
                match request.cursor {
                    None => self.boards.list_latest(limit).await?,
                    Some(cursor) => self.boards.list_latest_before(cursor, limit).await?,
                }
            }
        };

        let (boards, has_next) = split_probe(rows, page_size);
        let next_cursor = boards.last().map(|board| board.id);
        Ok(BoardSearchResponse {
            boards: boards.iter().map(BoardView::from).collect(),
            has_next,
            next_cursor,
        })
    }

    /// Replaces every mutable field of the board. Only the owner may do this.
    pub async fn update_board(
        &self,
        board_id: BoardId,
        request: UpdateBoardRequest,
    ) -> Result<BoardView> {
        let mut board = self.load_board(board_id).await?;
        let requester = request.member_id;

        let changes = BoardChanges {
            title: request.title,
            content: request.content,
            category: request.category,
            deadline: request.deadline,
            image_paths: request.images,
        };
        if let Err(err) = board.update(requester, changes) {
            warn!(board_id = %board_id, member_id = %requester, "rejected board update from non-owner");
            return Err(err);
        }

        info!(board_id = %board.id, "updating board");
        let saved = self.boards.update(&board).await?;
        Ok(BoardView::from(&saved))
    }

    /// Deletes the board with its images and comments.
    ///
    /// No ownership check: any caller may delete any board.
    pub async fn delete_board(&self, board_id: BoardId) -> Result<()> {
        let board = self.load_board(board_id).await?;
        info!(board_id = %board.id, "deleting board");
        self.boards.delete(board.id).await?;
        Ok(())
    }

    async fn load_board(&self, board_id: BoardId) -> Result<Board> {
        self.boards
            .find_by_id(board_id)
            .await?
            .ok_or(DomainError::BoardNotFound(board_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use domains::{
        Category, Member, MemberId, MockBoardRepository, MockMemberRepository, RepositoryError,
        Timestamps,
    };
    use mockall::predicate::eq;
    use tokio_test::{assert_err, assert_ok};

    fn member(id: i64) -> Member {
        Member {
            id: MemberId(id),
            email: format!("member{id}@example.com"),
            nickname: format!("member{id}"),
            timestamps: Timestamps::now(),
        }
    }

    fn board(id: i64, owner: i64) -> Board {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + chrono::Duration::minutes(id);
        Board {
            id: BoardId(id),
            owner: MemberId(owner),
            title: format!("board {id}"),
            content: "content".to_string(),
            category: Category::Vote,
            deadline: created + chrono::Duration::days(7),
            images: Vec::new(),
            timestamps: Timestamps::at(created),
        }
    }

    fn service(members: MockMemberRepository, boards: MockBoardRepository) -> BoardService {
        BoardService::new(Arc::new(members), Arc::new(boards), PageLimits::default())
    }

    fn update_request(member_id: i64) -> UpdateBoardRequest {
        UpdateBoardRequest {
            member_id: MemberId(member_id),
            title: "new title".to_string(),
            content: "new content".to_string(),
            category: Category::Choice,
            deadline: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            images: vec!["img/new.png".to_string()],
        }
    }

    #[tokio::test]
    async fn create_board_with_unknown_owner_is_member_not_found() {
        let mut members = MockMemberRepository::new();
        members
            .expect_find_by_id()
            .with(eq(MemberId(9)))
            .returning(|_| Ok(None));
        let mut boards = MockBoardRepository::new();
        boards.expect_save().never();

        let err = service(members, boards)
            .create_board(CreateBoardRequest {
                member_id: MemberId(9),
                title: "t".to_string(),
                content: "c".to_string(),
                category: Category::Vote,
                deadline: Utc::now(),
                images: Vec::new(),
            })
            .await
            .unwrap_err();

        assert_eq!(err, DomainError::MemberNotFound(MemberId(9)));
    }

    #[tokio::test]
    async fn create_board_returns_store_assigned_id_and_owner() {
        let mut members = MockMemberRepository::new();
        members.expect_find_by_id().returning(|id| Ok(Some(member(id.0))));
        let mut boards = MockBoardRepository::new();
        boards
            .expect_save()
            .withf(|new_board| {
                new_board.owner == MemberId(7) && new_board.images.iter().all(|i| !i.is_persisted())
            })
            .returning(|_| Ok(board(1, 7)));

        let response = assert_ok!(
            service(members, boards)
                .create_board(CreateBoardRequest {
                    member_id: MemberId(7),
                    title: "A".to_string(),
                    content: "c".to_string(),
                    category: Category::Vote,
                    deadline: Utc::now(),
                    images: vec!["a.png".to_string()],
                })
                .await
        );

        assert_eq!(response.board_id, BoardId(1));
        assert_eq!(response.member_id, MemberId(7));
    }

    #[tokio::test]
    async fn search_asks_for_one_probe_row_and_trims_it() {
        let mut boards = MockBoardRepository::new();
        boards
            .expect_list_latest()
            .with(eq(3))
            .returning(|_| Ok(vec![board(5, 1), board(4, 1), board(3, 1)]));

        let page = service(MockMemberRepository::new(), boards)
            .search_boards(SearchBoardsRequest {
                cursor: None,
                page_size: Some(2),
                sort: SortType::Latest,
            })
            .await
            .unwrap();

        let ids: Vec<_> = page.boards.iter().map(|b| b.board_id).collect();
        assert_eq!(ids, vec![BoardId(5), BoardId(4)]);
        assert!(page.has_next);
        assert_eq!(page.next_cursor, Some(BoardId(4)));
    }

    #[tokio::test]
    async fn search_with_cursor_uses_the_before_query() {
        let mut boards = MockBoardRepository::new();
        boards.expect_list_latest().never();
        boards
            .expect_list_latest_before()
            .with(eq(BoardId(4)), eq(3))
            .returning(|_, _| Ok(vec![board(3, 1)]));

        let page = service(MockMemberRepository::new(), boards)
            .search_boards(SearchBoardsRequest {
                cursor: Some(BoardId(4)),
                page_size: Some(2),
                sort: SortType::Latest,
            })
            .await
            .unwrap();

        assert_eq!(page.boards.len(), 1);
        assert!(!page.has_next);
        assert_eq!(page.next_cursor, Some(BoardId(3)));
    }

    #[tokio::test]
    async fn empty_page_has_no_cursor() {
        let mut boards = MockBoardRepository::new();
        boards.expect_list_latest().returning(|_| Ok(Vec::new()));

        let page = service(MockMemberRepository::new(), boards)
            .search_boards(SearchBoardsRequest::default())
            .await
            .unwrap();

        assert!(page.boards.is_empty());
        assert!(!page.has_next);
        assert_eq!(page.next_cursor, None);
    }

    #[tokio::test]
    async fn oversized_page_is_rejected_before_querying() {
        let mut boards = MockBoardRepository::new();
        boards.expect_list_latest().never();

        let err = service(MockMemberRepository::new(), boards)
            .search_boards(SearchBoardsRequest {
                page_size: Some(1_000),
                ..SearchBoardsRequest::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn non_owner_update_never_reaches_the_store() {
        let mut boards = MockBoardRepository::new();
        boards.expect_find_by_id().returning(|id| Ok(Some(board(id.0, 7))));
        boards.expect_update().never();

        let err = service(MockMemberRepository::new(), boards)
            .update_board(BoardId(1), update_request(8))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn owner_update_persists_replaced_fields() {
        let mut boards = MockBoardRepository::new();
        boards.expect_find_by_id().returning(|id| Ok(Some(board(id.0, 7))));
        boards
            .expect_update()
            .withf(|b| {
                b.id == BoardId(1)
                    && b.owner == MemberId(7)
                    && b.title == "new title"
                    && b.content == "new content"
                    && b.category == Category::Choice
                    && b.image_paths() == vec!["img/new.png".to_string()]
            })
            .returning(|b| Ok(b.clone()));

        let view = service(MockMemberRepository::new(), boards)
            .update_board(BoardId(1), update_request(7))
            .await
            .unwrap();

        assert_eq!(view.title, "new title");
        assert_eq!(view.member_id, MemberId(7));
    }

    #[tokio::test]
    async fn delete_of_missing_board_is_not_found() {
        let mut boards = MockBoardRepository::new();
        boards.expect_find_by_id().returning(|_| Ok(None));
        boards.expect_delete().never();

        let result = service(MockMemberRepository::new(), boards)
            .delete_board(BoardId(99))
            .await;

        assert_eq!(assert_err!(result), DomainError::BoardNotFound(BoardId(99)));
    }

    #[tokio::test]
    async fn store_failures_propagate_unchanged() {
        let mut boards = MockBoardRepository::new();
        boards
            .expect_find_by_id()
            .returning(|_| Err(RepositoryError::Connection("refused".to_string())));

        let err = service(MockMemberRepository::new(), boards)
            .get_board(BoardId(1))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            DomainError::Repository(RepositoryError::Connection("refused".to_string()))
        );
    }
}
