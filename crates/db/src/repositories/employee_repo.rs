//! Repository for the `funcionario` table.

use gerencia_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::employee::{CreateEmployee, Employee};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, usuario, senha, email";

/// Provides the queries behind the credential operations.
pub struct EmployeeRepo;

impl EmployeeRepo {
    /// Insert a new employee, returning the generated id.
    pub async fn create(
        tx: &mut Transaction<'_, Postgres>,
        input: &CreateEmployee,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO funcionario (usuario, senha, email)
             VALUES ($1, $2, $3)
             RETURNING id",
        )
        .bind(&input.username)
        .bind(&input.password_hash)
        .bind(&input.email)
        .fetch_one(&mut **tx)
        .await
    }

    /// Find an employee by username (case-sensitive).
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Employee>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM funcionario WHERE usuario = $1");
        sqlx::query_as::<_, Employee>(&query)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// Email of the given username, if the account exists.
    pub async fn find_email(pool: &PgPool, username: &str) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT email FROM funcionario WHERE usuario = $1")
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// Username owning `email`, locking the row until the transaction ends.
    ///
    /// The outer `None` means no account has that email; the inner one is a
    /// row whose `usuario` is NULL.
    pub async fn lock_username_by_email(
        tx: &mut Transaction<'_, Postgres>,
        email: &str,
    ) -> Result<Option<Option<String>>, sqlx::Error> {
        sqlx::query_scalar("SELECT usuario FROM funcionario WHERE email = $1 FOR UPDATE")
            .bind(email)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Replace the password hash of the account owning `email`.
    ///
    /// Returns `true` if a row was updated.
    pub async fn update_password_by_email(
        tx: &mut Transaction<'_, Postgres>,
        email: &str,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE funcionario SET senha = $2 WHERE email = $1")
            .bind(email)
            .bind(password_hash)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace the password hash of `username`. Returns `true` if a row was updated.
    pub async fn update_password_by_username(
        tx: &mut Transaction<'_, Postgres>,
        username: &str,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE funcionario SET senha = $2 WHERE usuario = $1")
            .bind(username)
            .bind(password_hash)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
