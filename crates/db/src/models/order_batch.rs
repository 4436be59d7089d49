//! Order batch entity model.

use chrono::{NaiveDate, NaiveTime};
use gerencia_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

/// Full row from the `gerencia_pedidos` table.
///
/// Serializes with the same keys as the insertion payload.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct OrderBatch {
    pub id: DbId,
    #[sqlx(rename = "pedidos")]
    #[serde(rename = "pedidos")]
    pub item_ids: Vec<i32>,
    #[sqlx(rename = "data")]
    #[serde(rename = "data")]
    pub date: NaiveDate,
    #[sqlx(rename = "hora")]
    #[serde(rename = "hora")]
    pub time: NaiveTime,
}
