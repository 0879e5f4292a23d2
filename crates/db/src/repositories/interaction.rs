use sqlx::Row;

use glimmer_core::domain::interaction::{
    EventKind, InteractionEvent, InteractionId, NewInteraction,
};
use glimmer_core::domain::product::ProductId;

use super::{decode_timestamp, InteractionRepository, RepositoryError};
use crate::DbPool;

pub struct SqlInteractionRepository {
    pool: DbPool,
}

impl SqlInteractionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_event(row: &sqlx::sqlite::SqliteRow) -> Result<InteractionEvent, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let user_id: Option<i64> =
        row.try_get("user_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let session_key: Option<String> =
        row.try_get("session_key").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let product_id: i64 =
        row.try_get("product_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let event: String = row.try_get("event").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let weight: i64 = row.try_get("weight").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let timestamp: String =
        row.try_get("timestamp").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let kind = event.parse::<EventKind>()?;

    Ok(InteractionEvent {
        id: InteractionId(id),
        user_id,
        session_key,
        product_id: ProductId(product_id),
        kind,
        weight,
        created_at: decode_timestamp(&timestamp)?,
    })
}

#[async_trait::async_trait]
impl InteractionRepository for SqlInteractionRepository {
    async fn list_events(&self) -> Result<Vec<InteractionEvent>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, user_id, session_key, product_id, event, weight, timestamp
             FROM user_product_interaction ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_event).collect::<Result<Vec<_>, _>>()
    }

    async fn list_events_of_kind(
        &self,
        kind: EventKind,
    ) -> Result<Vec<InteractionEvent>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, user_id, session_key, product_id, event, weight, timestamp
             FROM user_product_interaction WHERE event = ? ORDER BY id ASC",
        )
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_event).collect::<Result<Vec<_>, _>>()
    }

    async fn append(&self, event: NewInteraction) -> Result<InteractionId, RepositoryError> {
        event.validate()?;

        let result = sqlx::query(
            "INSERT INTO user_product_interaction
                 (user_id, session_key, product_id, event, weight, timestamp)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(event.user_id)
        .bind(&event.session_key)
        .bind(event.product_id.0)
        .bind(event.kind.as_str())
        .bind(event.weight)
        .bind(event.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(InteractionId(result.last_insert_rowid()))
    }
}
