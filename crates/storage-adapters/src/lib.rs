//! # storage-adapters
//!
//! Implementations of the `domains` ports.
//!
//! - [`memory::InMemoryStore`]: always compiled; development and tests.
//! - `postgres::PostgresStore`: feature `db-postgres`.

pub mod memory;

#[cfg(feature = "db-postgres")]
pub mod postgres;

pub use memory::InMemoryStore;

#[cfg(feature = "db-postgres")]
pub use postgres::PostgresStore;
