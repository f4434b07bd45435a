//! # PostgreSQL store
//!
//! This module implements the data mapping between the PostgreSQL relational
//! model and the `domains` models. Schema lives in `migrations/`.

use std::collections::HashMap;

use async_trait::async_trait;
use domains::{
    Board, BoardId, BoardImage, BoardRepository, Category, Comment, CommentId, CommentRepository,
    ImageId, Member, MemberId, MemberRepository, NewBoard, NewComment, RepositoryError,
    Timestamps,
};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{PgExecutor, Row};
use tracing::{debug, info};

const BOARD_COLUMNS: &str =
    "id, member_id, title, content, category, deadline, created_at, updated_at";
const COMMENT_COLUMNS: &str = "id, board_id, member_id, content, created_at, updated_at";

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

/// Sorts a `sqlx` failure into the port's error taxonomy.
fn map_sqlx_error(error: sqlx::Error) -> RepositoryError {
    match error {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::WorkerCrashed => RepositoryError::Connection(error.to_string()),
        sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::TypeNotFound { .. } => RepositoryError::Decode(error.to_string()),
        other => RepositoryError::Query(other.to_string()),
    }
}

fn sql_limit(limit: usize) -> Result<i64, RepositoryError> {
    i64::try_from(limit)
        .map_err(|_| RepositoryError::Query(format!("limit {limit} exceeds i64 range")))
}

fn timestamps_from_row(row: &PgRow) -> Result<Timestamps, RepositoryError> {
    Ok(Timestamps {
        created_at: row.try_get("created_at").map_err(map_sqlx_error)?,
        updated_at: row.try_get("updated_at").map_err(map_sqlx_error)?,
    })
}

fn board_from_row(row: &PgRow, images: Vec<BoardImage>) -> Result<Board, RepositoryError> {
    let category: String = row.try_get("category").map_err(map_sqlx_error)?;
    Ok(Board {
        id: BoardId(row.try_get("id").map_err(map_sqlx_error)?),
        owner: MemberId(row.try_get("member_id").map_err(map_sqlx_error)?),
        title: row.try_get("title").map_err(map_sqlx_error)?,
        content: row.try_get("content").map_err(map_sqlx_error)?,
        category: category
            .parse::<Category>()
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        deadline: row.try_get("deadline").map_err(map_sqlx_error)?,
        images,
        timestamps: timestamps_from_row(row)?,
    })
}

fn comment_from_row(row: &PgRow) -> Result<Comment, RepositoryError> {
    Ok(Comment {
        id: CommentId(row.try_get("id").map_err(map_sqlx_error)?),
        board_id: BoardId(row.try_get("board_id").map_err(map_sqlx_error)?),
        author: MemberId(row.try_get("member_id").map_err(map_sqlx_error)?),
        content: row.try_get("content").map_err(map_sqlx_error)?,
        timestamps: timestamps_from_row(row)?,
    })
}

fn member_from_row(row: &PgRow) -> Result<Member, RepositoryError> {
    Ok(Member {
        id: MemberId(row.try_get("id").map_err(map_sqlx_error)?),
        email: row.try_get("email").map_err(map_sqlx_error)?,
        nickname: row.try_get("nickname").map_err(map_sqlx_error)?,
        timestamps: timestamps_from_row(row)?,
    })
}

/// Images of several boards in one round trip, grouped per board in
/// insertion order.
async fn load_images<'e>(
    executor: impl PgExecutor<'e>,
    board_ids: &[i64],
) -> Result<HashMap<i64, Vec<BoardImage>>, RepositoryError> {
    let rows = sqlx::query(
        "SELECT id, board_id, path FROM board_images WHERE board_id = ANY($1) ORDER BY board_id, id",
    )
    .bind(board_ids)
    .fetch_all(executor)
    .await
    .map_err(map_sqlx_error)?;

    let mut grouped: HashMap<i64, Vec<BoardImage>> = HashMap::new();
    for row in rows {
        let board_id: i64 = row.try_get("board_id").map_err(map_sqlx_error)?;
        grouped.entry(board_id).or_default().push(BoardImage {
            id: Some(ImageId(row.try_get("id").map_err(map_sqlx_error)?)),
            path: row.try_get("path").map_err(map_sqlx_error)?,
        });
    }
    Ok(grouped)
}

async fn insert_images<'e>(
    tx: &mut sqlx::Transaction<'e, sqlx::Postgres>,
    board_id: BoardId,
    images: &[BoardImage],
) -> Result<(), RepositoryError> {
    for image in images.iter().filter(|image| !image.is_persisted()) {
        sqlx::query("INSERT INTO board_images (board_id, path) VALUES ($1, $2)")
            .bind(board_id.0)
            .bind(&image.path)
            .execute(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;
    }
    Ok(())
}

impl PostgresStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies pending migrations from `migrations/`.
    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RepositoryError::Query(format!("migration failed: {e}")))?;
        info!("database migrations applied");
        Ok(())
    }

    /// Inserts a member, or refreshes the nickname when the email exists.
    /// Member management is not part of the core ports; the seeder uses this.
    pub async fn register_member(&self, email: &str, nickname: &str) -> Result<Member, RepositoryError> {
        let row = sqlx::query(
            r#"
            INSERT INTO members (email, nickname)
            VALUES ($1, $2)
            ON CONFLICT (email) DO UPDATE SET nickname = EXCLUDED.nickname, updated_at = now()
            RETURNING id, email, nickname, created_at, updated_at
            "#,
        )
        .bind(email)
        .bind(nickname)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        member_from_row(&row)
    }

    /// Attaches images to already-fetched board rows, preserving row order.
    async fn boards_with_images(&self, rows: Vec<PgRow>) -> Result<Vec<Board>, RepositoryError> {
        let ids = rows
            .iter()
            .map(|row| row.try_get::<i64, _>("id"))
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_sqlx_error)?;
        let mut images = load_images(&self.pool, &ids).await?;

        rows.iter()
            .zip(ids)
            .map(|(row, id)| board_from_row(row, images.remove(&id).unwrap_or_default()))
            .collect()
    }
}

#[async_trait]
impl MemberRepository for PostgresStore {
    async fn find_by_id(&self, id: MemberId) -> Result<Option<Member>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, email, nickname, created_at, updated_at FROM members WHERE id = $1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(member_from_row).transpose()
    }
}

#[async_trait]
impl BoardRepository for PostgresStore {
    /// Atomic operation to create a board and its images.
    ///
    /// # Developer Note
    /// Using a Transaction (tx) ensures we don't end up with a board missing
    /// half of its images if one of the image inserts fails.
    async fn save(&self, board: &NewBoard) -> Result<Board, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let row = sqlx::query(&format!(
            "INSERT INTO boards (member_id, title, content, category, deadline) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {BOARD_COLUMNS}"
        ))
        .bind(board.owner.0)
        .bind(&board.title)
        .bind(&board.content)
        .bind(board.category.as_str())
        .bind(board.deadline)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;
        let id = BoardId(row.try_get("id").map_err(map_sqlx_error)?);

        insert_images(&mut tx, id, &board.images).await?;
        let mut images = load_images(&mut *tx, &[id.0]).await?;
        let saved = board_from_row(&row, images.remove(&id.0).unwrap_or_default())?;

        tx.commit().await.map_err(map_sqlx_error)?;
        debug!(board_id = %saved.id, "board inserted");
        Ok(saved)
    }

    /// Rewrites the scalar columns and reconciles the image rows in one
    /// transaction. The owner column is never written, and an image id that
    /// is not already attached to this board rolls the whole update back.
    async fn update(&self, board: &Board) -> Result<Board, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let row = sqlx::query(&format!(
            "UPDATE boards SET title = $2, content = $3, category = $4, deadline = $5, updated_at = now() \
             WHERE id = $1 RETURNING {BOARD_COLUMNS}"
        ))
        .bind(board.id.0)
        .bind(&board.title)
        .bind(&board.content)
        .bind(board.category.as_str())
        .bind(board.deadline)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?
        .ok_or_else(|| RepositoryError::Query(format!("board {} does not exist", board.id)))?;

        let kept: Vec<i64> = board
            .images
            .iter()
            .filter_map(|image| image.id.map(|id| id.0))
            .collect();
        let stored: Vec<i64> = sqlx::query_scalar("SELECT id FROM board_images WHERE board_id = $1")
            .bind(board.id.0)
            .fetch_all(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        if let Some(unknown) = kept.iter().find(|id| !stored.contains(*id)) {
            return Err(RepositoryError::Query(format!(
                "image {unknown} does not belong to board {}",
                board.id
            )));
        }
        sqlx::query("DELETE FROM board_images WHERE board_id = $1 AND NOT (id = ANY($2))")
            .bind(board.id.0)
            .bind(&kept[..])
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        insert_images(&mut tx, board.id, &board.images).await?;

        let mut images = load_images(&mut *tx, &[board.id.0]).await?;
        let saved = board_from_row(&row, images.remove(&board.id.0).unwrap_or_default())?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(saved)
    }

    async fn find_by_id(&self, id: BoardId) -> Result<Option<Board>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {BOARD_COLUMNS} FROM boards WHERE id = $1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        match row {
            Some(row) => Ok(self.boards_with_images(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Images and comments go with the board via `ON DELETE CASCADE`.
    async fn delete(&self, id: BoardId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM boards WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn list_latest(&self, limit: usize) -> Result<Vec<Board>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {BOARD_COLUMNS} FROM boards ORDER BY id DESC LIMIT $1"
        ))
        .bind(sql_limit(limit)?)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        self.boards_with_images(rows).await
    }

    async fn list_latest_before(
        &self,
        cursor: BoardId,
        limit: usize,
    ) -> Result<Vec<Board>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {BOARD_COLUMNS} FROM boards WHERE id < $1 \
             ORDER BY id DESC LIMIT $2"
        ))
        .bind(cursor.0)
        .bind(sql_limit(limit)?)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        self.boards_with_images(rows).await
    }
}

#[async_trait]
impl CommentRepository for PostgresStore {
    async fn save(&self, comment: &NewComment) -> Result<Comment, RepositoryError> {
        let row = sqlx::query(&format!(
            "INSERT INTO comments (board_id, member_id, content) VALUES ($1, $2, $3) \
             RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(comment.board_id.0)
        .bind(comment.author.0)
        .bind(&comment.content)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        comment_from_row(&row)
    }

    async fn update(&self, comment: &Comment) -> Result<Comment, RepositoryError> {
        let row = sqlx::query(&format!(
            "UPDATE comments SET content = $2, updated_at = now() WHERE id = $1 \
             RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(comment.id.0)
        .bind(&comment.content)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .ok_or_else(|| RepositoryError::Query(format!("comment {} does not exist", comment.id)))?;
        comment_from_row(&row)
    }

    async fn find_by_id(&self, id: CommentId) -> Result<Option<Comment>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        row.as_ref().map(comment_from_row).transpose()
    }

    async fn delete(&self, id: CommentId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn list_by_board(&self, board_id: BoardId) -> Result<Vec<Comment>, RepositoryError> {
        sqlx::query(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE board_id = $1 ORDER BY created_at, id"
        ))
        .bind(board_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .iter()
        .map(comment_from_row)
        .collect()
    }
}
