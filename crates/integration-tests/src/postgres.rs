//! PostgreSQL fixtures: one throwaway container per [`PgHarness`].

use std::ops::Deref;
use std::sync::Arc;

use async_trait::async_trait;
use domains::Member;
use services::PageLimits;
use storage_adapters::PostgresStore;
use testcontainers_modules::postgres::Postgres;
use testcontainers_modules::testcontainers::runners::AsyncRunner;
use testcontainers_modules::testcontainers::ContainerAsync;

use crate::{Harness, MemberRegistry};

#[async_trait]
impl MemberRegistry for PostgresStore {
    async fn register(&self, email: &str, nickname: &str) -> Member {
        self.register_member(email, nickname)
            .await
            .expect("member should be registered")
    }
}

pub struct PgHarness {
    harness: Harness,
    pub store: Arc<PostgresStore>,
    _container: ContainerAsync<Postgres>,
}

impl PgHarness {
    pub async fn start() -> Self {
        Self::with_limits(PageLimits::default()).await
    }

    /// Starts PostgreSQL, runs the migrations and wires the services.
    pub async fn with_limits(limits: PageLimits) -> Self {
        let container = Postgres::default()
            .start()
            .await
            .expect("postgres container should start");
        let host = container.get_host().await.expect("container host");
        let port = container
            .get_host_port_ipv4(5432)
            .await
            .expect("mapped postgres port");
        let url = format!("postgres://postgres:postgres@{host}:{port}/postgres");

        let store = PostgresStore::connect(&url, 8)
            .await
            .expect("postgres should accept connections");
        store.migrate().await.expect("migrations should apply");
        let store = Arc::new(store);

        Self {
            harness: Harness::on_store(store.clone(), limits),
            store,
            _container: container,
        }
    }
}

impl Deref for PgHarness {
    type Target = Harness;

    fn deref(&self) -> &Harness {
        &self.harness
    }
}
