//! Domain service for credential verification and password changes.
//!
//! Login runs every attempt through the lockout state machine and persists
//! the resulting counters before returning.

use thiserror::Error;

use crate::domain::AccountId;
use crate::domain::access::SessionUser;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown username. Deliberately indistinguishable from a bad password.
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Invalid username or password, {attempts_remaining} attempts remaining")]
    InvalidPassword { attempts_remaining: u32 },

    #[error("Account is locked, try again in {remaining_minutes} minutes")]
    Locked { remaining_minutes: i64 },

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials and returns the identity to bind to a new session.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidCredentials`] for an unknown username
    /// - [`AuthError::InvalidPassword`] for a wrong password on an open account
    /// - [`AuthError::Locked`] while the account is locked, including the attempt that locks it
    async fn login(&self, username: &str, password: &str) -> Result<SessionUser, AuthError>;

    /// Changes the password of the signed-in account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] if the current password is wrong, the new
    /// password is too short, or the confirmation does not match. The stored hash
    /// is left untouched in every error case.
    async fn change_password(
        &self,
        account_id: AccountId,
        current_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), AuthError>;
}
