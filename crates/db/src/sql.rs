use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use reloom_core::{InventoryItem, ItemId, ItemInput, ItemStatus};

use crate::store::{ItemPatch, ItemStore, StoreError};
use crate::DbPool;

/// SQLite-backed gateway. Nested documents (attributes, market analysis,
/// strategies, totals) are stored as JSON text; the conditional update is an
/// `UPDATE ... WHERE id = ? AND status = ?` so concurrent runs race on the
/// status column rather than on row locks.
pub struct SqlItemStore {
    pool: DbPool,
}

impl SqlItemStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemStore for SqlItemStore {
    async fn fetch(&self, id: &ItemId) -> Result<Option<InventoryItem>, StoreError> {
        let row = sqlx::query(
            "SELECT id, status, category, quantity, region, days_unsold, image_ref,
                    attributes, market_analysis, strategies, best_strategy_index,
                    total_impact, error_message, created_at, updated_at
             FROM items WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(decode_row).transpose()
    }

    async fn insert(&self, item: InventoryItem) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO items (id, status, category, quantity, region, days_unsold, image_ref,
                                attributes, market_analysis, strategies, best_strategy_index,
                                total_impact, error_message, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&item.id.0)
        .bind(item.status.as_str())
        .bind(&item.input.category)
        .bind(i64::from(item.input.quantity))
        .bind(&item.input.region)
        .bind(i64::from(item.input.days_unsold))
        .bind(&item.input.image_ref)
        .bind(encode_json(&item.attributes)?)
        .bind(encode_json(&item.market_analysis)?)
        .bind(encode_json(&item.strategies)?)
        .bind(item.best_strategy_index.map(|index| index as i64))
        .bind(encode_json(&item.total_impact)?)
        .bind(&item.error_message)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn apply(
        &self,
        id: &ItemId,
        expected: ItemStatus,
        patch: ItemPatch,
    ) -> Result<InventoryItem, StoreError> {
        let current = self.fetch(id).await?.ok_or_else(|| StoreError::NotFound(id.clone()))?;
        if current.status != expected {
            return Err(StoreError::StatusConflict { id: id.clone(), expected });
        }

        let mut updated = current;
        patch.apply_to(&mut updated)?;

        let result = sqlx::query(
            "UPDATE items
             SET status = ?, attributes = ?, market_analysis = ?, strategies = ?,
                 best_strategy_index = ?, total_impact = ?, error_message = ?, updated_at = ?
             WHERE id = ? AND status = ?",
        )
        .bind(updated.status.as_str())
        .bind(encode_json(&updated.attributes)?)
        .bind(encode_json(&updated.market_analysis)?)
        .bind(encode_json(&updated.strategies)?)
        .bind(updated.best_strategy_index.map(|index| index as i64))
        .bind(encode_json(&updated.total_impact)?)
        .bind(&updated.error_message)
        .bind(updated.updated_at)
        .bind(&id.0)
        .bind(expected.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Lost the race between fetch and update.
            return match self.fetch(id).await? {
                None => Err(StoreError::NotFound(id.clone())),
                Some(_) => Err(StoreError::StatusConflict { id: id.clone(), expected }),
            };
        }

        Ok(updated)
    }
}

fn decode_row(row: &SqliteRow) -> Result<InventoryItem, StoreError> {
    let status_raw: String = row.try_get("status")?;
    let status = ItemStatus::parse(&status_raw)
        .ok_or_else(|| StoreError::Decode(format!("unknown item status `{status_raw}`")))?;

    Ok(InventoryItem {
        id: ItemId(row.try_get("id")?),
        status,
        input: ItemInput {
            category: row.try_get("category")?,
            quantity: decode_count(row.try_get("quantity")?, "quantity")?,
            region: row.try_get("region")?,
            days_unsold: decode_count(row.try_get("days_unsold")?, "days_unsold")?,
            image_ref: row.try_get("image_ref")?,
        },
        attributes: decode_json(row.try_get("attributes")?, "attributes")?,
        market_analysis: decode_json(row.try_get("market_analysis")?, "market_analysis")?,
        strategies: decode_json(row.try_get("strategies")?, "strategies")?,
        best_strategy_index: row
            .try_get::<Option<i64>, _>("best_strategy_index")?
            .map(|index| decode_count(index, "best_strategy_index").map(|v: u32| v as usize))
            .transpose()?,
        total_impact: decode_json(row.try_get("total_impact")?, "total_impact")?,
        error_message: row.try_get("error_message")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

fn decode_count<T: TryFrom<i64>>(value: i64, column: &str) -> Result<T, StoreError> {
    T::try_from(value)
        .map_err(|_| StoreError::Decode(format!("column `{column}` holds out-of-range value {value}")))
}

fn encode_json<T: Serialize>(value: &Option<T>) -> Result<Option<String>, StoreError> {
    value
        .as_ref()
        .map(|inner| serde_json::to_string(inner))
        .transpose()
        .map_err(|error| StoreError::Decode(format!("could not encode document: {error}")))
}

fn decode_json<T: DeserializeOwned>(
    raw: Option<String>,
    column: &str,
) -> Result<Option<T>, StoreError> {
    raw.map(|json| serde_json::from_str(&json))
        .transpose()
        .map_err(|error| StoreError::Decode(format!("column `{column}` holds invalid JSON: {error}")))
}
