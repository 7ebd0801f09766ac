//! # relay-db
//!
//! Store layer implementing the repository ports of `relay-core`.
//!
//! ## Overview
//!
//! - PostgreSQL repositories via SQLx (`PgMessageRepository`, `PgConversationRepository`,
//!   `PgUserRepository`) with `FromRow` models and model → entity mappers
//! - `InMemoryStore`, a single in-process store implementing every port, used by tests
//!   and by local runs without `DATABASE_URL`
//!
//! The schema itself (tables, migrations) is owned elsewhere; only the operation
//! contracts matter here.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use relay_db::{create_pool, DatabaseConfig, PgConversationRepository};
//! use relay_core::ConversationRepository;
//!
//! async fn example(settings: &relay_common::DatabaseConfig) -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&DatabaseConfig::from(settings)).await?;
//!     let conversations = PgConversationRepository::new(pool);
//!     let found = conversations.find_by_id(123.into()).await?;
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod memory;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use memory::{InMemoryStore, StoreOperation};
pub use pool::{create_pool, DatabaseConfig, PgPool};
pub use repositories::{PgConversationRepository, PgMessageRepository, PgUserRepository};
