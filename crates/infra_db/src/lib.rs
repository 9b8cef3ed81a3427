//! Infrastructure Database Layer
//!
//! This crate provides the PostgreSQL persistence for the ledger engine,
//! implemented with SQLx on a single append-mostly `ledger_entries`
//! table.
//!
//! # Architecture
//!
//! The crate follows the repository pattern: `PgEntryStore` implements
//! the domain's `EntryStore` port and hides all SQL from the domain
//! layer. Committed rows are never updated except for the single
//! `reversed_at` flag set when an entry is reversed.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool_from_url, run_migrations, PgEntryStore};
//!
//! let pool = create_pool_from_url("postgres://localhost/ledger").await?;
//! run_migrations(&pool).await?;
//! let store = PgEntryStore::new(pool);
//! ```

pub mod error;
pub mod pool;
pub mod repositories;

pub use error::{to_store_error, DatabaseError};
pub use pool::{create_pool, create_pool_from_url, run_migrations, DatabaseConfig, DatabasePool};
pub use repositories::PgEntryStore;
