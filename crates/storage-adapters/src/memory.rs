//! # In-memory store
//!
//! A single `InMemoryStore` implements every port, so cascades (board →
//! images → comments) behave the way the relational schema does. Each
//! record is written under its `DashMap` shard lock; identifiers come from
//! per-table sequences and only ever grow.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use domains::{
    Board, BoardId, BoardRepository, Comment, CommentId, CommentRepository, ImageId, Member,
    MemberId, MemberRepository, NewBoard, NewComment, RepositoryError, Timestamps,
};
use tracing::debug;

/// Monotonic id source, starting at 1 like a `BIGSERIAL` column.
#[derive(Debug)]
struct Sequence(AtomicI64);

impl Sequence {
    fn new() -> Self {
        Self(AtomicI64::new(1))
    }

    fn next(&self) -> i64 {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct InMemoryStore {
    members: DashMap<MemberId, Member>,
    boards: DashMap<BoardId, Board>,
    comments: DashMap<CommentId, Comment>,
    member_ids: Sequence,
    board_ids: Sequence,
    image_ids: Sequence,
    comment_ids: Sequence,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            members: DashMap::new(),
            boards: DashMap::new(),
            comments: DashMap::new(),
            member_ids: Sequence::new(),
            board_ids: Sequence::new(),
            image_ids: Sequence::new(),
            comment_ids: Sequence::new(),
        }
    }

    /// Adds a member. Member management is not part of the core ports, so
    /// this lives on the adapter for seeding and tests.
    pub fn register_member(&self, email: &str, nickname: &str) -> Member {
        let member = Member {
            id: MemberId(self.member_ids.next()),
            email: email.to_string(),
            nickname: nickname.to_string(),
            timestamps: Timestamps::now(),
        };
        self.members.insert(member.id, member.clone());
        member
    }

    fn assign_image_ids(&self, board: &mut Board) {
        for image in board.images.iter_mut().filter(|image| !image.is_persisted()) {
            image.id = Some(ImageId(self.image_ids.next()));
        }
    }

    /// Boards newest first. Ids are the ordering key so the order always
    /// agrees with the `id < cursor` filter.
    fn feed(&self, before: Option<BoardId>, limit: usize) -> Vec<Board> {
        let mut boards: Vec<Board> = self
            .boards
            .iter()
            .filter(|entry| before.map_or(true, |cursor| *entry.key() < cursor))
            .map(|entry| entry.value().clone())
            .collect();
        boards.sort_by(|a, b| b.id.cmp(&a.id));
        boards.truncate(limit);
        boards
    }
}

#[async_trait]
impl MemberRepository for InMemoryStore {
    async fn find_by_id(&self, id: MemberId) -> Result<Option<Member>, RepositoryError> {
        Ok(self.members.get(&id).map(|entry| entry.value().clone()))
    }
}

#[async_trait]
impl BoardRepository for InMemoryStore {
    async fn save(&self, new_board: &NewBoard) -> Result<Board, RepositoryError> {
        let mut board = Board {
            id: BoardId(self.board_ids.next()),
            owner: new_board.owner,
            title: new_board.title.clone(),
            content: new_board.content.clone(),
            category: new_board.category,
            deadline: new_board.deadline,
            images: new_board.images.clone(),
            timestamps: Timestamps::now(),
        };
        self.assign_image_ids(&mut board);
        self.boards.insert(board.id, board.clone());
        debug!(board_id = %board.id, "board stored in memory");
        Ok(board)
    }

    async fn update(&self, board: &Board) -> Result<Board, RepositoryError> {
        let mut stored = self
            .boards
            .get_mut(&board.id)
            .ok_or_else(|| RepositoryError::Query(format!("board {} does not exist", board.id)))?;

        if let Some(unknown) = board
            .images
            .iter()
            .filter_map(|image| image.id)
            .find(|id| !stored.images.iter().any(|kept| kept.id == Some(*id)))
        {
            return Err(RepositoryError::Query(format!(
                "image {unknown} does not belong to board {}",
                board.id
            )));
        }

        let mut updated = board.clone();
        self.assign_image_ids(&mut updated);
        updated.owner = stored.owner;
        updated.timestamps = stored.timestamps;
        updated.timestamps.touch(Utc::now());
        *stored = updated.clone();
        Ok(updated)
    }

    async fn find_by_id(&self, id: BoardId) -> Result<Option<Board>, RepositoryError> {
        Ok(self.boards.get(&id).map(|entry| entry.value().clone()))
    }

    async fn delete(&self, id: BoardId) -> Result<(), RepositoryError> {
        if self.boards.remove(&id).is_some() {
            self.comments.retain(|_, comment| comment.board_id != id);
            debug!(board_id = %id, "board removed from memory");
        }
        Ok(())
    }

    async fn list_latest(&self, limit: usize) -> Result<Vec<Board>, RepositoryError> {
        Ok(self.feed(None, limit))
    }

    async fn list_latest_before(
        &self,
        cursor: BoardId,
        limit: usize,
    ) -> Result<Vec<Board>, RepositoryError> {
        Ok(self.feed(Some(cursor), limit))
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn save(&self, new_comment: &NewComment) -> Result<Comment, RepositoryError> {
        // Held until the insert lands so a concurrent board delete either
        // runs first or sweeps this comment up.
        let _board = self.boards.get(&new_comment.board_id).ok_or_else(|| {
            RepositoryError::Query(format!("board {} does not exist", new_comment.board_id))
        })?;
        let comment = Comment {
            id: CommentId(self.comment_ids.next()),
            board_id: new_comment.board_id,
            author: new_comment.author,
            content: new_comment.content.clone(),
            timestamps: Timestamps::now(),
        };
        self.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn update(&self, comment: &Comment) -> Result<Comment, RepositoryError> {
        let mut stored = self
            .comments
            .get_mut(&comment.id)
            .ok_or_else(|| RepositoryError::Query(format!("comment {} does not exist", comment.id)))?;
        stored.content = comment.content.clone();
        stored.timestamps.touch(Utc::now());
        Ok(stored.clone())
    }

    async fn find_by_id(&self, id: CommentId) -> Result<Option<Comment>, RepositoryError> {
        Ok(self.comments.get(&id).map(|entry| entry.value().clone()))
    }

    async fn delete(&self, id: CommentId) -> Result<(), RepositoryError> {
        self.comments.remove(&id);
        Ok(())
    }

    async fn list_by_board(&self, board_id: BoardId) -> Result<Vec<Comment>, RepositoryError> {
        let mut comments: Vec<Comment> = self
            .comments
            .iter()
            .filter(|entry| entry.value().board_id == board_id)
            .map(|entry| entry.value().clone())
            .collect();
        comments.sort_by_key(|comment| (comment.timestamps.created_at, comment.id));
        Ok(comments)
    }
}
