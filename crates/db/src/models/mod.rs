//! Row structs and DTOs.
//!
//! Column names are fixed by the existing schema; Rust field names are mapped
//! onto them with `#[sqlx(rename)]`.

pub mod employee;
pub mod order_batch;
