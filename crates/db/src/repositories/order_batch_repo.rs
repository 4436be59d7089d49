//! Repository for the `gerencia_pedidos` table.

use gerencia_core::payload::ParsedOrderBatch;
use gerencia_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::order_batch::OrderBatch;

const COLUMNS: &str = "id, pedidos, data, hora";

pub struct OrderBatchRepo;

impl OrderBatchRepo {
    /// Insert a parsed batch, returning the generated id.
    pub async fn create(
        tx: &mut Transaction<'_, Postgres>,
        input: &ParsedOrderBatch,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO gerencia_pedidos (pedidos, data, hora)
             VALUES ($1, $2, $3)
             RETURNING id",
        )
        .bind(input.item_ids.as_slice())
        .bind(input.date)
        .bind(input.time)
        .fetch_one(&mut **tx)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<OrderBatch>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM gerencia_pedidos WHERE id = $1");
        sqlx::query_as::<_, OrderBatch>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Every batch. No ordering is promised to callers.
    pub async fn list(pool: &PgPool) -> Result<Vec<OrderBatch>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM gerencia_pedidos");
        sqlx::query_as::<_, OrderBatch>(&query)
            .fetch_all(pool)
            .await
    }
}
