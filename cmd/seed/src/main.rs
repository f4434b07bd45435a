//! # Seed Binary
//!
//! Assembles the services on the configured store, registers demo members,
//! creates demo boards and comments, then walks the board feed page by page.

use std::sync::Arc;

use anyhow::Context;
use chrono::{Duration, Utc};
use configs::{LogSettings, Settings, StorageBackend};
use domains::{BoardRepository, Category, CommentRepository, Member, MemberRepository};
use services::{
    BoardService, CommentService, CreateBoardRequest, CreateCommentRequest, PageLimits,
    SearchBoardsRequest,
};
use storage_adapters::InMemoryStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[cfg(feature = "db-postgres")]
use secrecy::ExposeSecret;
#[cfg(feature = "db-postgres")]
use storage_adapters::PostgresStore;

const DEMO_BOARDS: usize = 12;

/// The store selected by `storage.backend`.
enum Store {
    Memory(Arc<InMemoryStore>),
    #[cfg(feature = "db-postgres")]
    Postgres(Arc<PostgresStore>),
}

impl Store {
    async fn open(settings: &Settings) -> anyhow::Result<Self> {
        match settings.storage.backend {
            StorageBackend::Memory => Ok(Self::Memory(Arc::new(InMemoryStore::new()))),
            #[cfg(feature = "db-postgres")]
            StorageBackend::Postgres => {
                let store = PostgresStore::connect(
                    settings.database.url.expose_secret(),
                    settings.database.max_connections,
                )
                .await
                .context("connecting to PostgreSQL")?;
                store.migrate().await.context("running migrations")?;
                Ok(Self::Postgres(Arc::new(store)))
            }
            #[cfg(not(feature = "db-postgres"))]
            StorageBackend::Postgres => {
                anyhow::bail!("storage.backend is \"postgres\" but seed was built without the db-postgres feature")
            }
        }
    }

    async fn register_member(&self, email: &str, nickname: &str) -> anyhow::Result<Member> {
        match self {
            Self::Memory(store) => Ok(store.register_member(email, nickname)),
            #[cfg(feature = "db-postgres")]
            Self::Postgres(store) => Ok(store.register_member(email, nickname).await?),
        }
    }

    fn ports(
        &self,
    ) -> (
        Arc<dyn MemberRepository>,
        Arc<dyn BoardRepository>,
        Arc<dyn CommentRepository>,
    ) {
        match self {
            Self::Memory(store) => ports_of(store),
            #[cfg(feature = "db-postgres")]
            Self::Postgres(store) => ports_of(store),
        }
    }
}

fn ports_of<S>(
    store: &Arc<S>,
) -> (
    Arc<dyn MemberRepository>,
    Arc<dyn BoardRepository>,
    Arc<dyn CommentRepository>,
)
where
    S: MemberRepository + BoardRepository + CommentRepository + 'static,
{
    let members: Arc<dyn MemberRepository> = store.clone();
    let boards: Arc<dyn BoardRepository> = store.clone();
    let comments: Arc<dyn CommentRepository> = store.clone();
    (members, boards, comments)
}

fn init_tracing(log: &LogSettings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&log.level))
        .context("invalid log filter")?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    let installed = if log.json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
    installed.map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading settings")?;
    init_tracing(&settings.log)?;

    // 1. Initialize the configured store
    let store = Store::open(&settings).await?;
    info!(backend = ?settings.storage.backend, "store ready");

    // 2. Wire the services
    let (members, boards, comments) = store.ports();
    let limits = PageLimits {
        default_page_size: settings.pagination.default_page_size,
        max_page_size: settings.pagination.max_page_size,
    };
    let board_service = BoardService::new(members.clone(), boards.clone(), limits);
    let comment_service = CommentService::new(members, boards, comments);

    // 3. Seed members, boards and a comment per board
    let alice = store.register_member("alice@example.com", "alice").await?;
    let bob = store.register_member("bob@example.com", "bob").await?;

    for n in 0..DEMO_BOARDS {
        let (owner, voter) = if n % 2 == 0 { (&alice, &bob) } else { (&bob, &alice) };
        let category = if n % 3 == 0 { Category::Choice } else { Category::Vote };
        let created = board_service
            .create_board(CreateBoardRequest {
                member_id: owner.id,
                title: format!("Should I buy item #{n}?"),
                content: format!("{} is thinking about item #{n}", owner.nickname),
                category,
                deadline: Utc::now() + Duration::days(7),
                images: vec![format!("seed/{n}/front.png"), format!("seed/{n}/back.png")],
            })
            .await?;
        comment_service
            .create_comment(CreateCommentRequest {
                member_id: voter.id,
                board_id: created.board_id,
                content: "Go for it".to_string(),
            })
            .await?;
    }
    info!(boards = DEMO_BOARDS, "demo data seeded");

    // 4. Walk the feed the way a client would
    let mut cursor = None;
    let mut pages = 0usize;
    loop {
        let page = board_service
            .search_boards(SearchBoardsRequest {
                cursor,
                ..SearchBoardsRequest::default()
            })
            .await?;
        pages += 1;
        let ids: Vec<i64> = page.boards.iter().map(|board| board.board_id.0).collect();
        info!(page = pages, ?ids, has_next = page.has_next, "feed page");

        if !page.has_next {
            break;
        }
        cursor = page.next_cursor;
    }

    info!(pages, "feed walk complete");
    Ok(())
}
