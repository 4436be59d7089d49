//! Domain layer shared by the store and its callers.
//!
//! Nothing in this crate performs I/O:
//! - [`password`] -- PBKDF2-SHA256 hashing, verification and reset-password generation.
//! - [`payload`] -- account and order-batch payloads as they arrive on the wire.
//! - [`error`] / [`types`] -- shared error and id types.

pub mod error;
pub mod password;
pub mod payload;
pub mod types;
