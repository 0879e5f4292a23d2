use chrono::{DateTime, Utc};
use sqlx::Row;
use tracing::warn;

use glimmer_core::domain::product::ProductId;
use glimmer_core::domain::recommendation::{
    ListWrite, RecommendationLists, RecommendationRecord, WriteReport,
};

use super::{decode_timestamp, ListField, RecommendationRepository, RepositoryError};
use crate::DbPool;

pub struct SqlRecommendationRepository {
    pool: DbPool,
}

impl SqlRecommendationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn replace_field(
        &self,
        field: ListField,
        writes: &[ListWrite],
        updated_at: DateTime<Utc>,
    ) -> Result<WriteReport, RepositoryError> {
        let column = field.column();
        // The SELECT ... WHERE EXISTS guard turns a write for a deleted product
        // into a no-op instead of a foreign key failure.
        let sql = format!(
            "INSERT INTO product_recommendation (product_id, {column}, updated_at)
             SELECT ?, ?, ? WHERE EXISTS (SELECT 1 FROM product WHERE id = ?)
             ON CONFLICT(product_id) DO UPDATE SET
                 {column} = excluded.{column},
                 updated_at = excluded.updated_at"
        );
        let timestamp = updated_at.to_rfc3339();
        let mut report = WriteReport::default();

        let mut tx = self.pool.begin().await?;
        for write in writes {
            let ids = encode_ids(&write.ids)?;
            let outcome = sqlx::query(&sql)
                .bind(write.product_id.0)
                .bind(&ids)
                .bind(&timestamp)
                .bind(write.product_id.0)
                .execute(&mut *tx)
                .await;

            match outcome {
                Ok(result) if result.rows_affected() > 0 => report.saved += 1,
                Ok(_) => report.skipped.push(write.product_id),
                Err(error) => {
                    warn!(
                        event_name = "db.recommendations.write_skipped",
                        product_id = write.product_id.0,
                        column,
                        error = %error,
                        "skipping recommendation write"
                    );
                    report.skipped.push(write.product_id);
                }
            }
        }
        tx.commit().await?;

        Ok(report)
    }
}

fn encode_ids(ids: &[ProductId]) -> Result<String, RepositoryError> {
    serde_json::to_string(ids).map_err(|error| RepositoryError::Decode(error.to_string()))
}

fn decode_ids(column: &str, raw: &str) -> Result<Vec<ProductId>, RepositoryError> {
    serde_json::from_str(raw)
        .map_err(|error| RepositoryError::Decode(format!("invalid {column} `{raw}`: {error}")))
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<RecommendationRecord, RepositoryError> {
    let product_id: i64 =
        row.try_get("product_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let recommended: String =
        row.try_get("recommended_ids").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let also_bought: String =
        row.try_get("also_bought_ids").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(RecommendationRecord {
        product_id: ProductId(product_id),
        recommended_ids: decode_ids("recommended_ids", &recommended)?,
        also_bought_ids: decode_ids("also_bought_ids", &also_bought)?,
        updated_at: decode_timestamp(&updated_at)?,
    })
}

#[async_trait::async_trait]
impl RecommendationRepository for SqlRecommendationRepository {
    async fn find_by_product(
        &self,
        id: ProductId,
    ) -> Result<Option<RecommendationRecord>, RepositoryError> {
        let row = sqlx::query(
            "SELECT product_id, recommended_ids, also_bought_ids, updated_at
             FROM product_recommendation WHERE product_id = ?",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_record(r)?)),
            None => Ok(None),
        }
    }

    async fn lists_for_product(
        &self,
        id: ProductId,
    ) -> Result<RecommendationLists, RepositoryError> {
        Ok(self.find_by_product(id).await?.map(|record| record.lists()).unwrap_or_default())
    }

    async fn replace_recommended(
        &self,
        writes: &[ListWrite],
        updated_at: DateTime<Utc>,
    ) -> Result<WriteReport, RepositoryError> {
        self.replace_field(ListField::Recommended, writes, updated_at).await
    }

    async fn replace_also_bought(
        &self,
        writes: &[ListWrite],
        updated_at: DateTime<Utc>,
    ) -> Result<WriteReport, RepositoryError> {
        self.replace_field(ListField::AlsoBought, writes, updated_at).await
    }
}
