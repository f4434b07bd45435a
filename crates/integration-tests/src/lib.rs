//! Shared fixtures: services wired to one store, plus the scenario bodies
//! in [`cases`] that every store backend is run through.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use domains::{
    BoardId, BoardRepository, Category, CommentRepository, Member, MemberId, MemberRepository,
};
use services::{
    BoardService, CommentService, CreateBoardRequest, PageLimits, UpdateBoardRequest,
};
use storage_adapters::InMemoryStore;

pub mod cases;

#[cfg(feature = "db-postgres")]
pub mod postgres;

/// Member creation is adapter-specific; fixtures only need it to succeed.
#[async_trait]
pub trait MemberRegistry: Send + Sync {
    async fn register(&self, email: &str, nickname: &str) -> Member;
}

#[async_trait]
impl MemberRegistry for InMemoryStore {
    async fn register(&self, email: &str, nickname: &str) -> Member {
        self.register_member(email, nickname)
    }
}

pub struct Harness {
    registry: Arc<dyn MemberRegistry>,
    pub boards: BoardService,
    pub comments: CommentService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_limits(PageLimits::default())
    }

    pub fn with_limits(limits: PageLimits) -> Self {
        Self::on_store(Arc::new(InMemoryStore::new()), limits)
    }

    /// Wires both services to `store`.
    pub fn on_store<S>(store: Arc<S>, limits: PageLimits) -> Self
    where
        S: MemberRegistry + MemberRepository + BoardRepository + CommentRepository + 'static,
    {
        let boards = BoardService::new(store.clone(), store.clone(), limits);
        let comments = CommentService::new(store.clone(), store.clone(), store.clone());
        Self {
            registry: store,
            boards,
            comments,
        }
    }

    pub async fn member(&self, nickname: &str) -> MemberId {
        self.registry
            .register(&format!("{nickname}@example.com"), nickname)
            .await
            .id
    }

    /// Creates a board and returns its id, panicking on failure.
    pub async fn board(&self, owner: MemberId, title: &str) -> BoardId {
        self.boards
            .create_board(create_request(owner, title))
            .await
            .expect("fixture board should be created")
            .board_id
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

pub fn deadline() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap() + Duration::days(7)
}

pub fn create_request(owner: MemberId, title: &str) -> CreateBoardRequest {
    CreateBoardRequest {
        member_id: owner,
        title: title.to_string(),
        content: format!("{title} content"),
        category: Category::Vote,
        deadline: deadline(),
        images: vec![format!("boards/{title}/cover.png")],
    }
}

pub fn update_request(requester: MemberId, title: &str) -> UpdateBoardRequest {
    UpdateBoardRequest {
        member_id: requester,
        title: title.to_string(),
        content: format!("{title} content (edited)"),
        category: Category::Choice,
        deadline: deadline() + Duration::days(1),
        images: vec![
            format!("boards/{title}/left.png"),
            format!("boards/{title}/right.png"),
        ],
    }
}
