//! Submitted order batches.

use gerencia_core::payload::NewOrderBatch;
use gerencia_core::types::DbId;

use crate::error::{StoreError, StoreResult};
use crate::models::order_batch::OrderBatch;
use crate::repositories::OrderBatchRepo;
use crate::{finish, schema, DbPool};

/// Owns the `gerencia_pedidos` table.
#[derive(Clone)]
pub struct OrderLedger {
    pool: DbPool,
}

impl OrderLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create the `gerencia_pedidos` table if it does not exist yet.
    pub async fn initialize(&self) -> StoreResult<()> {
        sqlx::query(schema::GERENCIA_PEDIDOS_TABLE)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from)
            .inspect_err(|e| e.log("initialize_gerencia_pedidos"))?;
        tracing::debug!("gerencia_pedidos table ready");
        Ok(())
    }

    /// Parse and insert a batch, returning its id.
    ///
    /// A malformed date or time, or an empty item list, fails with
    /// [`StoreError::MalformedInput`] before anything is written.
    pub async fn insert(&self, batch: &NewOrderBatch) -> StoreResult<DbId> {
        self.insert_inner(batch)
            .await
            .inspect_err(|e| e.log("insert_order_batch"))
    }

    /// [`OrderLedger::insert`] from the raw JSON payload.
    pub async fn insert_json(&self, raw: &str) -> StoreResult<DbId> {
        let batch = NewOrderBatch::from_json(raw)
            .map_err(StoreError::from)
            .inspect_err(|e| e.log("insert_order_batch"))?;
        self.insert(&batch).await
    }

    async fn insert_inner(&self, batch: &NewOrderBatch) -> StoreResult<DbId> {
        let parsed = batch.parse()?;

        let mut tx = self.pool.begin().await?;
        let outcome = OrderBatchRepo::create(&mut tx, &parsed)
            .await
            .map_err(StoreError::from);
        let id = finish(tx, outcome).await?;

        tracing::info!(
            id,
            items = parsed.item_ids.len(),
            date = %parsed.date,
            "Order batch inserted",
        );
        Ok(id)
    }

    /// The batch with `id`, or `None` when it does not exist or the lookup
    /// failed. Use [`OrderLedger::find_by_id`] to tell them apart.
    pub async fn get_by_id(&self, id: DbId) -> Option<OrderBatch> {
        self.find_by_id(id).await.ok().flatten()
    }

    /// The batch with `id`: `Ok(None)` when absent, `Err` when the lookup failed.
    pub async fn find_by_id(&self, id: DbId) -> StoreResult<Option<OrderBatch>> {
        OrderBatchRepo::find_by_id(&self.pool, id)
            .await
            .map_err(StoreError::from)
            .inspect_err(|e| e.log("find_order_batch"))
    }

    /// Every stored batch, in no particular order.
    pub async fn get_all(&self) -> StoreResult<Vec<OrderBatch>> {
        let batches = OrderBatchRepo::list(&self.pool)
            .await
            .map_err(StoreError::from)
            .inspect_err(|e| e.log("list_order_batches"))?;
        tracing::debug!(count = batches.len(), "Order batches listed");
        Ok(batches)
    }
}
