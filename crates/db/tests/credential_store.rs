//! Integration tests for the credential store.
//!
//! Exercises account creation, verification, email lookup, password reset and
//! forced password change against a real database, including rollback on
//! duplicate accounts and behaviour when the store is unreachable.

mod common;

use assert_matches::assert_matches;
use gerencia_core::password;
use gerencia_core::payload::NewAccount;
use gerencia_db::{CredentialStore, StoreError};
use sqlx::PgPool;

use common::{unreachable_pool, TEST_PARAMS};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn account(username: &str, password: &str, email: &str) -> NewAccount {
    NewAccount {
        username: username.to_string(),
        password: password.to_string(),
        email: email.to_string(),
    }
}

async fn store(pool: &PgPool) -> CredentialStore {
    let store = CredentialStore::with_params(pool.clone(), TEST_PARAMS);
    store.initialize().await.unwrap();
    store
}

async fn row_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM funcionario")
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn stored_hash(pool: &PgPool, username: &str) -> String {
    sqlx::query_scalar("SELECT senha FROM funcionario WHERE usuario = $1")
        .bind(username)
        .fetch_one(pool)
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Test: create + verify
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = false)]
async fn test_create_then_verify(pool: PgPool) {
    let store = store(&pool).await;

    let id = store
        .create_account(&account("ana", "s3cret", "ana@loja.com"))
        .await
        .unwrap();
    assert!(id > 0);

    assert!(store.verify_credentials("ana", "s3cret").await);
    assert!(!store.verify_credentials("ana", "S3cret").await);
    assert!(!store.verify_credentials("ana", "").await);
}

#[sqlx::test(migrations = false)]
async fn test_password_is_stored_hashed(pool: PgPool) {
    let store = store(&pool).await;

    store
        .create_account(&account("ana", "mesma-senha", "ana@loja.com"))
        .await
        .unwrap();
    store
        .create_account(&account("bruno", "mesma-senha", "bruno@loja.com"))
        .await
        .unwrap();

    let ana = stored_hash(&pool, "ana").await;
    let bruno = stored_hash(&pool, "bruno").await;

    assert!(!ana.contains("mesma-senha"));
    assert!(ana.starts_with("$pbkdf2-sha256$"));
    // Same plaintext, different salt.
    assert_ne!(ana, bruno);
}

#[sqlx::test(migrations = false)]
async fn test_unknown_user_never_verifies(pool: PgPool) {
    let store = store(&pool).await;

    assert!(!store.verify_credentials("ninguem", "qualquer").await);
    assert_matches!(store.check_credentials("ninguem", "qualquer").await, Ok(false));

    // A second miss reuses the cached placeholder hash.
    assert!(!store.verify_credentials("ninguem", "outra").await);
}

#[sqlx::test(migrations = false)]
async fn test_username_is_case_sensitive(pool: PgPool) {
    let store = store(&pool).await;
    store
        .create_account(&account("Ana", "s3cret", "ana@loja.com"))
        .await
        .unwrap();

    assert!(store.verify_credentials("Ana", "s3cret").await);
    assert!(!store.verify_credentials("ana", "s3cret").await);
}

// ---------------------------------------------------------------------------
// Test: uniqueness + rollback
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = false)]
async fn test_duplicate_username_rolls_back(pool: PgPool) {
    let store = store(&pool).await;
    store
        .create_account(&account("ana", "original", "ana@loja.com"))
        .await
        .unwrap();

    let result = store
        .create_account(&account("ana", "intrusa", "outra@loja.com"))
        .await;
    assert_matches!(result, Err(StoreError::ConstraintViolation { .. }));

    assert_eq!(row_count(&pool).await, 1);
    assert_eq!(store.lookup_email("ana").await.as_deref(), Some("ana@loja.com"));
    assert!(store.verify_credentials("ana", "original").await);
    assert!(!store.verify_credentials("ana", "intrusa").await);
}

#[sqlx::test(migrations = false)]
async fn test_duplicate_email_rolls_back(pool: PgPool) {
    let store = store(&pool).await;
    store
        .create_account(&account("ana", "s3cret", "compartilhado@loja.com"))
        .await
        .unwrap();

    let result = store
        .create_account(&account("bruno", "s3cret", "compartilhado@loja.com"))
        .await;
    assert_matches!(result, Err(StoreError::ConstraintViolation { .. }));

    assert_eq!(row_count(&pool).await, 1);
    assert_eq!(store.lookup_email("bruno").await, None);
}

#[sqlx::test(migrations = false)]
async fn test_invalid_payload_writes_nothing(pool: PgPool) {
    let store = store(&pool).await;

    let result = store
        .create_account(&account("", "s3cret", "ana@loja.com"))
        .await;
    assert_matches!(result, Err(StoreError::MalformedInput(_)));

    let result = store
        .create_account(&account("ana", "s3cret", "sem-arroba"))
        .await;
    assert_matches!(result, Err(StoreError::MalformedInput(_)));

    assert_eq!(row_count(&pool).await, 0);
}

#[sqlx::test(migrations = false)]
async fn test_create_from_json_payload(pool: PgPool) {
    let store = store(&pool).await;

    let id = store
        .create_account_json(r#"{"usuario": "carla", "senha": "pw-123", "email": "carla@loja.com"}"#)
        .await
        .unwrap();
    assert!(id > 0);
    assert!(store.verify_credentials("carla", "pw-123").await);

    let result = store.create_account_json(r#"{"usuario": "carla"}"#).await;
    assert_matches!(result, Err(StoreError::MalformedInput(_)));
}

// ---------------------------------------------------------------------------
// Test: email lookup
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = false)]
async fn test_lookup_email(pool: PgPool) {
    let store = store(&pool).await;
    store
        .create_account(&account("ana", "s3cret", "ana@loja.com"))
        .await
        .unwrap();

    assert_eq!(store.lookup_email("ana").await.as_deref(), Some("ana@loja.com"));
    assert_eq!(store.lookup_email("ninguem").await, None);
    assert_matches!(store.find_email("ninguem").await, Ok(None));
}

// ---------------------------------------------------------------------------
// Test: password reset
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = false)]
async fn test_reset_password_issues_new_password(pool: PgPool) {
    let store = store(&pool).await;
    store
        .create_account(&account("ana", "antiga", "ana@loja.com"))
        .await
        .unwrap();

    let reset = store
        .reset_password("ana@loja.com")
        .await
        .unwrap()
        .expect("account exists");

    assert_eq!(reset.username.as_deref(), Some("ana"));
    assert_eq!(reset.password.len(), 8);
    assert!(reset.password.chars().all(|c| c.is_ascii_alphanumeric()));

    assert!(store.verify_credentials("ana", &reset.password).await);
    assert!(!store.verify_credentials("ana", "antiga").await);
}

#[sqlx::test(migrations = false)]
async fn test_reset_password_unknown_email(pool: PgPool) {
    let store = store(&pool).await;
    store
        .create_account(&account("ana", "antiga", "ana@loja.com"))
        .await
        .unwrap();
    let before = stored_hash(&pool, "ana").await;

    let result = store.reset_password("ninguem@loja.com").await;
    assert_matches!(result, Ok(None));

    assert_eq!(stored_hash(&pool, "ana").await, before);
    assert!(store.verify_credentials("ana", "antiga").await);
}

#[sqlx::test(migrations = false)]
async fn test_consecutive_resets_invalidate_previous(pool: PgPool) {
    let store = store(&pool).await;
    store
        .create_account(&account("ana", "antiga", "ana@loja.com"))
        .await
        .unwrap();

    let first = store.reset_password("ana@loja.com").await.unwrap().unwrap();
    let second = store.reset_password("ana@loja.com").await.unwrap().unwrap();

    assert!(store.verify_credentials("ana", &second.password).await);
    if first.password != second.password {
        assert!(!store.verify_credentials("ana", &first.password).await);
    }
}

#[sqlx::test(migrations = false)]
async fn test_reset_password_for_row_without_username(pool: PgPool) {
    let store = store(&pool).await;
    // Older rows may have a NULL usuario; the column is only UNIQUE.
    let old_hash = password::hash_password("antiga", TEST_PARAMS).unwrap();
    sqlx::query("INSERT INTO funcionario (usuario, senha, email) VALUES (NULL, $1, $2)")
        .bind(&old_hash)
        .bind("sem-usuario@loja.com")
        .execute(&pool)
        .await
        .unwrap();

    let reset = store
        .reset_password("sem-usuario@loja.com")
        .await
        .unwrap()
        .expect("account exists");
    assert_eq!(reset.username, None);

    let new_hash: String =
        sqlx::query_scalar("SELECT senha FROM funcionario WHERE email = $1")
            .bind("sem-usuario@loja.com")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_ne!(new_hash, old_hash);
    assert!(password::verify_password(&reset.password, &new_hash).unwrap());

    let json = serde_json::to_value(&reset).unwrap();
    assert!(json["usuario"].is_null());
}

// ---------------------------------------------------------------------------
// Test: forced password change
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = false)]
async fn test_change_password(pool: PgPool) {
    let store = store(&pool).await;
    store
        .create_account(&account("ana", "antiga", "ana@loja.com"))
        .await
        .unwrap();

    store.change_password("ana", "nova-senha").await.unwrap();

    assert!(store.verify_credentials("ana", "nova-senha").await);
    assert!(!store.verify_credentials("ana", "antiga").await);
    // Email untouched.
    assert_eq!(store.lookup_email("ana").await.as_deref(), Some("ana@loja.com"));
}

#[sqlx::test(migrations = false)]
async fn test_change_password_unknown_user(pool: PgPool) {
    let store = store(&pool).await;

    let result = store.change_password("ninguem", "nova-senha").await;
    assert_matches!(result, Err(StoreError::NotFound { entity: "funcionario", .. }));
    assert_eq!(row_count(&pool).await, 0);
}

#[sqlx::test(migrations = false)]
async fn test_change_password_rejects_empty(pool: PgPool) {
    let store = store(&pool).await;
    store
        .create_account(&account("ana", "antiga", "ana@loja.com"))
        .await
        .unwrap();

    let result = store.change_password("ana", "").await;
    assert_matches!(result, Err(StoreError::MalformedInput(_)));
    assert!(store.verify_credentials("ana", "antiga").await);
}

// ---------------------------------------------------------------------------
// Test: legacy hashes + schema
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = false)]
async fn test_legacy_passlib_hash_verifies(pool: PgPool) {
    let store = store(&pool).await;

    // Row written by the previous passlib-based tooling.
    sqlx::query("INSERT INTO funcionario (usuario, senha, email) VALUES ($1, $2, $3)")
        .bind("legado")
        .bind(
            "$pbkdf2-sha256$1000$MDEyMzQ1Njc4OWFiY2RlZg$\
             PJCGxmFurdxGWUHgLpgJ.qtFmZs.k5/fs612e16FIWY",
        )
        .bind("legado@loja.com")
        .execute(&pool)
        .await
        .unwrap();

    assert!(store.verify_credentials("legado", "senha-antiga").await);
    assert!(!store.verify_credentials("legado", "senha-errada").await);

    // Changing the password upgrades the row to the PHC format.
    store.change_password("legado", "senha-nova").await.unwrap();
    assert!(stored_hash(&pool, "legado").await.contains("i=1000"));
    assert!(store.verify_credentials("legado", "senha-nova").await);
}

#[sqlx::test(migrations = false)]
async fn test_corrupt_hash_is_a_failed_verification(pool: PgPool) {
    let store = store(&pool).await;
    sqlx::query("INSERT INTO funcionario (usuario, senha, email) VALUES ($1, $2, $3)")
        .bind("quebrado")
        .bind("plaintext-by-mistake")
        .bind("quebrado@loja.com")
        .execute(&pool)
        .await
        .unwrap();

    assert!(!store.verify_credentials("quebrado", "plaintext-by-mistake").await);
    assert_matches!(
        store.check_credentials("quebrado", "plaintext-by-mistake").await,
        Err(StoreError::Hashing(_))
    );
}

#[sqlx::test(migrations = false)]
async fn test_initialize_is_idempotent(pool: PgPool) {
    let store = store(&pool).await;
    store
        .create_account(&account("ana", "s3cret", "ana@loja.com"))
        .await
        .unwrap();

    store.initialize().await.unwrap();
    assert_eq!(row_count(&pool).await, 1);
}

// ---------------------------------------------------------------------------
// Test: unreachable store
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_unreachable_store_collapses_to_failure() {
    let store = CredentialStore::with_params(unreachable_pool(), TEST_PARAMS);

    assert!(!store.verify_credentials("ana", "s3cret").await);
    assert_eq!(store.lookup_email("ana").await, None);

    let err = store.find_email("ana").await.unwrap_err();
    assert!(err.is_connectivity(), "expected connectivity error, got {err:?}");

    assert!(store.initialize().await.is_err());
    assert!(store
        .create_account(&account("ana", "s3cret", "ana@loja.com"))
        .await
        .is_err());
    assert!(store.reset_password("ana@loja.com").await.is_err());
    assert!(store.change_password("ana", "nova").await.is_err());
}
