//! Domain service for administrative account management.
//!
//! Callers are expected to have passed the admin gate; the service only
//! enforces rules that depend on the acting identity, like refusing self-deletion.

use thiserror::Error;

use crate::domain::AccountId;
use crate::domain::access::SessionUser;
use crate::models::account::{Account, AccountSummary};

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Account not found: {0}")]
    NotFound(AccountId),

    #[error("Username already exists: {0}")]
    DuplicateUsername(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AccountError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AccountError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

#[async_trait::async_trait]
pub trait AccountService: Send + Sync {
    /// Lists all accounts, clearing locks that have already elapsed.
    async fn list_accounts(&self) -> Result<Vec<AccountSummary>, AccountError>;

    /// Creates an account. The username is sanitized and an unknown role becomes `user`.
    ///
    /// # Errors
    ///
    /// - [`AccountError::Validation`] for an empty username or short password
    /// - [`AccountError::DuplicateUsername`] if the name is taken
    async fn create_account(
        &self,
        username: &str,
        password: &str,
        role: &str,
    ) -> Result<Account, AccountError>;

    /// Deletes an account other than the actor's own.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::InvalidOperation`] when `target` is the actor.
    async fn delete_account(
        &self,
        actor: &SessionUser,
        target: AccountId,
    ) -> Result<(), AccountError>;

    /// Sets a new password and clears any lockout state.
    async fn reset_password(
        &self,
        target: AccountId,
        new_password: &str,
    ) -> Result<(), AccountError>;

    /// Clears lockout state regardless of whether the account is locked.
    async fn unlock_account(&self, target: AccountId) -> Result<(), AccountError>;

    /// Seeds the `admin` account when no accounts exist. Returns the account if one was created.
    async fn ensure_bootstrap_admin(&self) -> Result<Option<Account>, AccountError>;
}
