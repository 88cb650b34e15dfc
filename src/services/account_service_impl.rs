//! `SeaORM` implementation of the `AccountService` trait.

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

use crate::config::SecurityConfig;
use crate::constants::bootstrap::ADMIN_USERNAME;
use crate::db::repositories::account::hash_password_blocking;
use crate::db::{InsertAccountError, Store};
use crate::domain::access::SessionUser;
use crate::domain::{AccountId, Role};
use crate::models::account::{Account, AccountSummary, sanitize_username};
use crate::services::account_service::{AccountError, AccountService};

pub struct SeaOrmAccountService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmAccountService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    fn check_password_length(&self, password: &str) -> Result<(), AccountError> {
        if password.chars().count() < self.security.min_password_length {
            return Err(AccountError::Validation(format!(
                "Password must be at least {} characters",
                self.security.min_password_length
            )));
        }
        Ok(())
    }
}

impl From<InsertAccountError> for AccountError {
    fn from(err: InsertAccountError) -> Self {
        match err {
            InsertAccountError::DuplicateUsername(name) => Self::DuplicateUsername(name),
            InsertAccountError::Other(e) => Self::from(e),
        }
    }
}

#[async_trait]
impl AccountService for SeaOrmAccountService {
    async fn list_accounts(&self) -> Result<Vec<AccountSummary>, AccountError> {
        let now = Utc::now();
        let cleared = self.store.clear_expired_locks(now).await?;
        if cleared > 0 {
            info!(cleared, "Cleared expired account locks");
        }

        let accounts = self.store.list_accounts().await?;
        Ok(accounts
            .into_iter()
            .map(|account| AccountSummary::from_account(account, now))
            .collect())
    }

    async fn create_account(
        &self,
        username: &str,
        password: &str,
        role: &str,
    ) -> Result<Account, AccountError> {
        let role = Role::parse_lenient(role);
        self.check_password_length(password)?;

        let username = sanitize_username(username);
        if username.is_empty() {
            return Err(AccountError::Validation(
                "Username must contain letters, digits or underscores".to_string(),
            ));
        }

        let password_hash = hash_password_blocking(password, &self.security).await?;
        let account = self
            .store
            .insert_account(&username, password_hash, role)
            .await?;

        info!(account_id = %account.id, username = %account.username, role = %account.role, "Account created");
        Ok(account)
    }

    async fn delete_account(
        &self,
        actor: &SessionUser,
        target: AccountId,
    ) -> Result<(), AccountError> {
        if actor.account_id == target {
            return Err(AccountError::InvalidOperation(
                "Cannot delete your own account".to_string(),
            ));
        }

        if !self.store.delete_account(target).await? {
            return Err(AccountError::NotFound(target));
        }

        info!(account_id = %target, actor = %actor.username, "Account deleted");
        Ok(())
    }

    async fn reset_password(
        &self,
        target: AccountId,
        new_password: &str,
    ) -> Result<(), AccountError> {
        self.check_password_length(new_password)?;

        let password_hash = hash_password_blocking(new_password, &self.security).await?;
        if !self
            .store
            .update_account_password(target, password_hash, true)
            .await?
        {
            return Err(AccountError::NotFound(target));
        }

        info!(account_id = %target, "Password reset by administrator");
        Ok(())
    }

    async fn unlock_account(&self, target: AccountId) -> Result<(), AccountError> {
        if !self.store.reset_account_lock(target).await? {
            return Err(AccountError::NotFound(target));
        }

        info!(account_id = %target, "Account unlocked");
        Ok(())
    }

    async fn ensure_bootstrap_admin(&self) -> Result<Option<Account>, AccountError> {
        if self.store.count_accounts().await? > 0 {
            return Ok(None);
        }

        let password_hash =
            hash_password_blocking(&self.security.bootstrap_admin_password, &self.security)
                .await?;

        match self
            .store
            .insert_account(ADMIN_USERNAME, password_hash, Role::Admin)
            .await
        {
            Ok(account) => {
                warn!(
                    username = ADMIN_USERNAME,
                    "Seeded default admin account; change its password after first login"
                );
                Ok(Some(account))
            }
            // Another process seeded it first.
            Err(InsertAccountError::DuplicateUsername(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
