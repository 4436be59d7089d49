//! Repository layer.
//!
//! Each repository is a zero-sized struct. Reads take `&PgPool`; writes take
//! an open transaction so the calling component decides when to commit.

pub mod employee_repo;
pub mod order_batch_repo;

pub use employee_repo::EmployeeRepo;
pub use order_batch_repo::OrderBatchRepo;
