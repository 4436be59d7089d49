//! Employee credentials: account creation, verification, and password reset.
//!
//! Every public operation catches its failure at this boundary, logs it, and
//! returns it as a [`StoreError`]. Nothing panics across the boundary and no
//! plaintext password is ever logged or stored.
//!
//! PBKDF2 work is CPU-bound and runs on the blocking thread pool.

use std::sync::{Arc, OnceLock};

use gerencia_core::password::{self, HashParams, RESET_PASSWORD_LEN};
use gerencia_core::payload::NewAccount;
use gerencia_core::types::DbId;
use sqlx::{Postgres, Transaction};

use crate::error::{StoreError, StoreResult};
use crate::models::employee::{CreateEmployee, PasswordReset};
use crate::repositories::EmployeeRepo;
use crate::{finish, schema, DbPool};

/// Plaintext behind the hash verified when the requested account does not exist.
const ABSENT_ACCOUNT_PASSWORD: &str = "absent-account-placeholder";

/// Owns the `funcionario` table.
#[derive(Clone)]
pub struct CredentialStore {
    pool: DbPool,
    params: HashParams,
    /// Hash verified against when the account is absent, so a miss costs the
    /// same PBKDF2 work as a wrong password. Computed on first use.
    absent_hash: Arc<OnceLock<String>>,
}

impl CredentialStore {
    /// Store using the `pbkdf2` crate's default iteration count.
    pub fn new(pool: DbPool) -> Self {
        Self::with_params(pool, HashParams::default())
    }

    pub fn with_params(pool: DbPool, params: HashParams) -> Self {
        Self {
            pool,
            params,
            absent_hash: Arc::new(OnceLock::new()),
        }
    }

    /// Create the `funcionario` table if it does not exist yet.
    pub async fn initialize(&self) -> StoreResult<()> {
        sqlx::query(schema::FUNCIONARIO_TABLE)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from)
            .inspect_err(|e| e.log("initialize_funcionario"))?;
        tracing::debug!("funcionario table ready");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Account creation
    // -----------------------------------------------------------------------

    /// Validate, hash and insert a new account, returning its id.
    ///
    /// A duplicate `usuario` or `email` rolls the transaction back and yields
    /// [`StoreError::ConstraintViolation`].
    pub async fn create_account(&self, account: &NewAccount) -> StoreResult<DbId> {
        self.create_account_inner(account)
            .await
            .inspect_err(|e| e.log("create_account"))
    }

    /// [`CredentialStore::create_account`] from the raw JSON payload
    /// `{ "usuario", "senha", "email" }`.
    pub async fn create_account_json(&self, raw: &str) -> StoreResult<DbId> {
        let account = NewAccount::from_json(raw)
            .map_err(StoreError::from)
            .inspect_err(|e| e.log("create_account"))?;
        self.create_account(&account).await
    }

    async fn create_account_inner(&self, account: &NewAccount) -> StoreResult<DbId> {
        account.check()?;
        let password_hash = self.hash(account.password.clone()).await?;

        let input = CreateEmployee {
            username: account.username.clone(),
            email: account.email.clone(),
            password_hash,
        };

        let mut tx = self.pool.begin().await?;
        let outcome = EmployeeRepo::create(&mut tx, &input)
            .await
            .map_err(StoreError::from);
        let id = finish(tx, outcome).await?;

        tracing::info!(id, username = %input.username, "Account created");
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    /// Email of `username`, or `None` when the account does not exist or the
    /// lookup failed. Use [`CredentialStore::find_email`] to tell them apart.
    pub async fn lookup_email(&self, username: &str) -> Option<String> {
        self.find_email(username).await.ok().flatten()
    }

    /// Email of `username`: `Ok(None)` when absent, `Err` when the lookup failed.
    pub async fn find_email(&self, username: &str) -> StoreResult<Option<String>> {
        EmployeeRepo::find_email(&self.pool, username)
            .await
            .map_err(StoreError::from)
            .inspect_err(|e| e.log("find_email"))
    }

    // -----------------------------------------------------------------------
    // Verification
    // -----------------------------------------------------------------------

    /// `true` only if the account exists and `password` matches its hash.
    ///
    /// An absent account, a wrong password and a failed lookup all give
    /// `false`.
    pub async fn verify_credentials(&self, username: &str, password: &str) -> bool {
        self.check_credentials(username, password)
            .await
            .unwrap_or(false)
    }

    /// Like [`CredentialStore::verify_credentials`] but surfaces store errors.
    pub async fn check_credentials(&self, username: &str, password: &str) -> StoreResult<bool> {
        self.check_credentials_inner(username, password)
            .await
            .inspect_err(|e| e.log("check_credentials"))
    }

    async fn check_credentials_inner(&self, username: &str, password: &str) -> StoreResult<bool> {
        match EmployeeRepo::find_by_username(&self.pool, username).await? {
            Some(employee) => {
                self.verify(password.to_owned(), employee.password_hash)
                    .await
            }
            None => {
                self.verify_absent(password.to_owned()).await;
                Ok(false)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Password reset / change
    // -----------------------------------------------------------------------

    /// Replace the password of the account owning `email` with a fresh random
    /// 8-character alphanumeric one.
    ///
    /// Returns the username and the new plaintext for out-of-band delivery,
    /// or `Ok(None)` when no account has that email.
    pub async fn reset_password(&self, email: &str) -> StoreResult<Option<PasswordReset>> {
        self.reset_password_inner(email)
            .await
            .inspect_err(|e| e.log("reset_password"))
    }

    async fn reset_password_inner(&self, email: &str) -> StoreResult<Option<PasswordReset>> {
        let mut tx = self.pool.begin().await?;
        let outcome = self.reset_in_tx(&mut tx, email).await;

        match finish(tx, outcome).await {
            Ok(reset) => {
                tracing::info!(username = ?reset.username, "Password reset");
                Ok(Some(reset))
            }
            // Rolled back; nothing was written.
            Err(StoreError::NotFound { .. }) => {
                tracing::info!("Password reset requested for unknown email");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn reset_in_tx(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        email: &str,
    ) -> StoreResult<PasswordReset> {
        let username = EmployeeRepo::lock_username_by_email(tx, email)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                entity: "funcionario",
                key: email.to_string(),
            })?;

        let new_password = password::generate_password(RESET_PASSWORD_LEN);
        let password_hash = self.hash(new_password.clone()).await?;
        if !EmployeeRepo::update_password_by_email(tx, email, &password_hash).await? {
            return Err(StoreError::NotFound {
                entity: "funcionario",
                key: email.to_string(),
            });
        }

        Ok(PasswordReset {
            username,
            password: new_password,
        })
    }

    /// Overwrite the password of `username` without checking the old one.
    ///
    /// Fails with [`StoreError::NotFound`] when the account does not exist.
    pub async fn change_password(&self, username: &str, password: &str) -> StoreResult<()> {
        self.change_password_inner(username, password)
            .await
            .inspect_err(|e| e.log("change_password"))
    }

    async fn change_password_inner(&self, username: &str, password: &str) -> StoreResult<()> {
        if password.is_empty() {
            return Err(StoreError::MalformedInput("password must not be empty".into()));
        }
        let password_hash = self.hash(password.to_owned()).await?;

        let mut tx = self.pool.begin().await?;
        let outcome = Self::change_in_tx(&mut tx, username, &password_hash).await;
        finish(tx, outcome).await?;

        tracing::info!(%username, "Password changed");
        Ok(())
    }

    async fn change_in_tx(
        tx: &mut Transaction<'static, Postgres>,
        username: &str,
        password_hash: &str,
    ) -> StoreResult<()> {
        if EmployeeRepo::update_password_by_username(tx, username, password_hash).await? {
            Ok(())
        } else {
            Err(StoreError::NotFound {
                entity: "funcionario",
                key: username.to_string(),
            })
        }
    }

    // -----------------------------------------------------------------------
    // Hashing on the blocking pool
    // -----------------------------------------------------------------------

    async fn hash(&self, plaintext: String) -> StoreResult<String> {
        let params = self.params;
        tokio::task::spawn_blocking(move || password::hash_password(&plaintext, params))
            .await
            .map_err(|e| StoreError::Hashing(format!("hashing task failed: {e}")))?
            .map_err(StoreError::from)
    }

    async fn verify(&self, plaintext: String, hash: String) -> StoreResult<bool> {
        tokio::task::spawn_blocking(move || password::verify_password(&plaintext, &hash))
            .await
            .map_err(|e| StoreError::Hashing(format!("verification task failed: {e}")))?
            .map_err(StoreError::from)
    }

    /// Spend the same verification effort as for an existing account.
    ///
    /// The placeholder hash is computed on the first miss and cached. If
    /// computing it fails, the failure is logged and the next miss tries again.
    async fn verify_absent(&self, plaintext: String) {
        let params = self.params;
        let absent_hash = Arc::clone(&self.absent_hash);

        let outcome = tokio::task::spawn_blocking(move || {
            let hash = match absent_hash.get() {
                Some(hash) => hash,
                None => {
                    let computed = password::hash_password(ABSENT_ACCOUNT_PASSWORD, params)?;
                    absent_hash.get_or_init(|| computed)
                }
            };
            password::verify_password(&plaintext, hash).map(|_| ())
        })
        .await;

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Placeholder verification for absent account failed");
            }
            Err(e) => {
                tracing::error!(error = %e, "Placeholder verification task failed");
            }
        }
    }
}
