//! Employee entity model and DTOs.

use std::fmt;

use gerencia_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

/// Full row from the `funcionario` table.
///
/// Contains the password hash -- never print it or hand it to callers.
#[derive(Clone, FromRow)]
pub struct Employee {
    pub id: DbId,
    #[sqlx(rename = "usuario")]
    pub username: Option<String>,
    #[sqlx(rename = "senha")]
    pub password_hash: String,
    pub email: String,
}

impl fmt::Debug for Employee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Employee")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("email", &self.email)
            .finish()
    }
}

/// Insert DTO. The password has already been hashed.
#[derive(Debug)]
pub struct CreateEmployee {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Result of a successful password reset: the account and its new plaintext
/// password, for delivery over a separate channel.
///
/// `username` is `None` for legacy rows whose `usuario` column is NULL.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct PasswordReset {
    #[serde(rename = "usuario")]
    pub username: Option<String>,
    #[serde(rename = "senha")]
    pub password: String,
}

impl fmt::Debug for PasswordReset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordReset")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_secrets() {
        let employee = Employee {
            id: 7,
            username: Some("ana".into()),
            password_hash: "$pbkdf2-sha256$i=1000,l=32$c2FsdA$aGFzaA".into(),
            email: "ana@loja.com".into(),
        };
        let rendered = format!("{employee:?}");
        assert!(!rendered.contains("pbkdf2"), "hash leaked: {rendered}");
        assert!(rendered.contains("ana@loja.com"));

        let reset = PasswordReset {
            username: Some("ana".into()),
            password: "Xy12ab34".into(),
        };
        assert!(!format!("{reset:?}").contains("Xy12ab34"));
    }
}
