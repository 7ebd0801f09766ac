//! PostgreSQL implementation of MessageRepository

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use relay_core::entities::{Message, NewMessage};
use relay_core::traits::{MessageRepository, RepoResult};
use relay_core::value_objects::SnowflakeGenerator;

use crate::mappers::MessageInsert;
use crate::models::MessageModel;

use super::error::map_db_error;

/// PostgreSQL implementation of MessageRepository
///
/// Ids come from a Snowflake generator so they sort in creation order;
/// `created_at` and `is_read` are column defaults.
#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
    ids: Arc<SnowflakeGenerator>,
}

impl PgMessageRepository {
    /// Create a new PgMessageRepository
    pub fn new(pool: PgPool, ids: Arc<SnowflakeGenerator>) -> Self {
        Self { pool, ids }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    #[instrument(skip(self, message), fields(conversation_id = %message.conversation_id))]
    async fn create(&self, message: &NewMessage) -> RepoResult<Message> {
        let id = self.ids.generate();
        let insert = MessageInsert::new(id, message);

        let row = sqlx::query_as::<_, MessageModel>(
            r#"
            INSERT INTO messages (id, conversation_id, sender_id, receiver_id, content)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, conversation_id, sender_id, receiver_id, content, is_read, created_at
            "#,
        )
        .bind(insert.id)
        .bind(insert.conversation_id)
        .bind(insert.sender_id)
        .bind(insert.receiver_id)
        .bind(insert.content)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(row.into())
    }
}
