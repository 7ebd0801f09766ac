//! PostgreSQL implementation of ConversationRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use relay_core::entities::Conversation;
use relay_core::traits::{ConversationRepository, RepoResult};
use relay_core::value_objects::Snowflake;

use crate::models::ConversationModel;

use super::error::{conversation_not_found, map_db_error};

/// PostgreSQL implementation of ConversationRepository
#[derive(Clone)]
pub struct PgConversationRepository {
    pool: PgPool,
}

impl PgConversationRepository {
    /// Create a new PgConversationRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationRepository for PgConversationRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Conversation>> {
        let result = sqlx::query_as::<_, ConversationModel>(
            r#"
            SELECT c.id, c.listing_id, c.last_message_id, c.created_at, c.updated_at,
                   COALESCE(
                       array_agg(p.user_id ORDER BY p.user_id) FILTER (WHERE p.user_id IS NOT NULL),
                       '{}'
                   ) AS participants
            FROM conversations c
            LEFT JOIN conversation_participants p ON p.conversation_id = c.id
            WHERE c.id = $1
            GROUP BY c.id
            "#,
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Conversation::from))
    }

    #[instrument(skip(self))]
    async fn update_last_message(
        &self,
        conversation_id: Snowflake,
        message_id: Snowflake,
    ) -> RepoResult<()> {
        // Never move the pointer backwards when two updates race.
        let result = sqlx::query(
            r#"
            UPDATE conversations
            SET last_message_id = $2, updated_at = NOW()
            WHERE id = $1 AND (last_message_id IS NULL OR last_message_id < $2)
            "#,
        )
        .bind(conversation_id.into_inner())
        .bind(message_id.into_inner())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM conversations WHERE id = $1)")
                    .bind(conversation_id.into_inner())
                    .fetch_one(&self.pool)
                    .await
                    .map_err(map_db_error)?;

            if !exists {
                return Err(conversation_not_found(conversation_id));
            }
        }

        Ok(())
    }
}
