use pbkdf2::password_hash;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The stored value looks like a passlib hash but cannot be decoded.
    #[error("Malformed password hash: {0}")]
    MalformedHash(String),

    /// The hashing primitive rejected its input or the stored PHC string.
    #[error("Password hash error: {0}")]
    PasswordHash(String),
}

impl From<password_hash::Error> for CoreError {
    fn from(err: password_hash::Error) -> Self {
        CoreError::PasswordHash(err.to_string())
    }
}
