//! Error type returned by every store operation.

use gerencia_core::error::CoreError;

/// PostgreSQL SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL SQLSTATE for `not_null_violation`.
const NOT_NULL_VIOLATION: &str = "23502";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached (I/O, TLS, pool exhaustion, SQLSTATE class 08).
    #[error("Store unreachable: {0}")]
    Connectivity(#[source] sqlx::Error),

    /// A duplicate `usuario` or `email`.
    #[error("Duplicate value violates unique constraint: {constraint}")]
    ConstraintViolation { constraint: String },

    /// A targeted mutation matched no row. Lookups report absence as `Ok(None)` instead.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Log this error at the component boundary.
    ///
    /// Caller mistakes are warnings; everything else is an error.
    pub(crate) fn log(&self, operation: &'static str) {
        match self {
            StoreError::ConstraintViolation { .. }
            | StoreError::NotFound { .. }
            | StoreError::MalformedInput(_) => {
                tracing::warn!(operation, error = %self, "Store operation rejected");
            }
            _ => {
                tracing::error!(operation, error = %self, "Store operation failed");
            }
        }
    }

    pub fn is_connectivity(&self) -> bool {
        matches!(self, StoreError::Connectivity(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => {
                    return StoreError::ConstraintViolation {
                        constraint: db_err.constraint().unwrap_or("unknown").to_string(),
                    };
                }
                Some(NOT_NULL_VIOLATION) => {
                    return StoreError::MalformedInput(db_err.message().to_string());
                }
                // Class 22 is `data_exception` (bad literal, out-of-range value).
                Some(code) if code.starts_with("22") => {
                    return StoreError::MalformedInput(db_err.message().to_string());
                }
                _ => {}
            }
        }

        if is_connectivity_error(&err) {
            StoreError::Connectivity(err)
        } else {
            StoreError::Database(err)
        }
    }
}

impl From<CoreError> for StoreError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => StoreError::MalformedInput(msg),
            CoreError::MalformedHash(msg) | CoreError::PasswordHash(msg) => {
                StoreError::Hashing(msg)
            }
        }
    }
}

/// Whether `err` means the server is unreachable rather than that it refused a statement.
pub(crate) fn is_connectivity_error(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => true,
        // Class 08 is `connection_exception`; 57P03 is `cannot_connect_now` (server starting up).
        sqlx::Error::Database(db_err) => db_err
            .code()
            .is_some_and(|code| code.starts_with("08") || code == "57P03"),
        _ => false,
    }
}
