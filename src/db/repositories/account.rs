use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, SqlErr, sea_query::Expr,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::domain::lockout::LockState;
use crate::domain::{AccountId, Role};
use crate::entities::{prelude::*, users};
use crate::models::account::Account;
use crate::models::format_timestamp;

#[derive(Debug, thiserror::Error)]
pub enum InsertAccountError {
    #[error("Username already exists: {0}")]
    DuplicateUsername(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub struct AccountRepository {
    conn: DatabaseConnection,
}

impl AccountRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn count(&self) -> Result<u64> {
        Users::find()
            .count(&self.conn)
            .await
            .context("Failed to count accounts")
    }

    pub async fn list(&self) -> Result<Vec<Account>> {
        let rows = Users::find()
            .order_by_asc(users::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list accounts")?;

        Ok(rows.into_iter().map(Account::from).collect())
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<Account>> {
        Ok(self
            .get_by_username_with_password(username)
            .await?
            .map(|(account, _)| account))
    }

    /// Get account by username together with its password hash
    pub async fn get_by_username_with_password(
        &self,
        username: &str,
    ) -> Result<Option<(Account, String)>> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query account by username")?;

        Ok(user.map(|u| {
            let password_hash = u.password_hash.clone();
            (Account::from(u), password_hash)
        }))
    }

    pub async fn get_by_id(&self, id: AccountId) -> Result<Option<Account>> {
        Ok(self
            .get_by_id_with_password(id)
            .await?
            .map(|(account, _)| account))
    }

    pub async fn get_by_id_with_password(
        &self,
        id: AccountId,
    ) -> Result<Option<(Account, String)>> {
        let user = Users::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query account by ID")?;

        Ok(user.map(|u| {
            let password_hash = u.password_hash.clone();
            (Account::from(u), password_hash)
        }))
    }

    /// Inserts a new account. Uniqueness is enforced by the `username` index,
    /// so concurrent inserts of the same name cannot both succeed.
    pub async fn insert(
        &self,
        username: &str,
        password_hash: String,
        role: Role,
    ) -> Result<Account, InsertAccountError> {
        let now = format_timestamp(chrono::Utc::now());

        let active = users::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(password_hash),
            role: Set(role.as_str().to_string()),
            failed_attempts: Set(0),
            locked_until: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok(Account::from(model)),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(InsertAccountError::DuplicateUsername(username.to_string()))
            }
            Err(e) => Err(anyhow::Error::new(e)
                .context("Failed to insert account")
                .into()),
        }
    }

    /// Replaces the password hash. When `clear_lock` is set the lockout
    /// counters are reset in the same statement.
    pub async fn update_password(
        &self,
        id: AccountId,
        password_hash: String,
        clear_lock: bool,
    ) -> Result<bool> {
        let mut update = Users::update_many()
            .col_expr(users::Column::PasswordHash, Expr::value(password_hash))
            .col_expr(
                users::Column::UpdatedAt,
                Expr::value(format_timestamp(chrono::Utc::now())),
            )
            .filter(users::Column::Id.eq(id.value()));

        if clear_lock {
            update = update
                .col_expr(users::Column::FailedAttempts, Expr::value(0))
                .col_expr(users::Column::LockedUntil, Expr::value(Option::<String>::None));
        }

        let result = update
            .exec(&self.conn)
            .await
            .context("Failed to update password")?;

        Ok(result.rows_affected > 0)
    }

    /// Writes `next` only if the stored lockout fields still equal `expected`.
    ///
    /// Returns `false` when another request changed the account in between;
    /// the caller must re-read and re-evaluate.
    pub async fn compare_and_set_lock(
        &self,
        id: AccountId,
        expected: &LockState,
        next: &LockState,
    ) -> Result<bool> {
        let expected_attempts = i32::try_from(expected.failed_attempts).unwrap_or(i32::MAX);
        let next_attempts = i32::try_from(next.failed_attempts).unwrap_or(i32::MAX);

        let mut update = Users::update_many()
            .col_expr(users::Column::FailedAttempts, Expr::value(next_attempts))
            .col_expr(
                users::Column::LockedUntil,
                Expr::value(next.locked_until.map(format_timestamp)),
            )
            .filter(users::Column::Id.eq(id.value()))
            .filter(users::Column::FailedAttempts.eq(expected_attempts));

        update = match expected.locked_until {
            Some(until) => update.filter(users::Column::LockedUntil.eq(format_timestamp(until))),
            None => update.filter(users::Column::LockedUntil.is_null()),
        };

        let result = update
            .exec(&self.conn)
            .await
            .context("Failed to update lockout state")?;

        Ok(result.rows_affected == 1)
    }

    /// Clears lockout state unconditionally.
    pub async fn reset_lock(&self, id: AccountId) -> Result<bool> {
        let result = Users::update_many()
            .col_expr(users::Column::FailedAttempts, Expr::value(0))
            .col_expr(users::Column::LockedUntil, Expr::value(Option::<String>::None))
            .filter(users::Column::Id.eq(id.value()))
            .exec(&self.conn)
            .await
            .context("Failed to reset lockout state")?;

        Ok(result.rows_affected > 0)
    }

    /// Normalizes every lock that elapsed before `now` back to a cleared record.
    pub async fn clear_expired_locks(&self, now: chrono::DateTime<chrono::Utc>) -> Result<u64> {
        let result = Users::update_many()
            .col_expr(users::Column::FailedAttempts, Expr::value(0))
            .col_expr(users::Column::LockedUntil, Expr::value(Option::<String>::None))
            .filter(users::Column::LockedUntil.is_not_null())
            .filter(users::Column::LockedUntil.lte(format_timestamp(now)))
            .exec(&self.conn)
            .await
            .context("Failed to clear expired locks")?;

        Ok(result.rows_affected)
    }

    pub async fn delete(&self, id: AccountId) -> Result<bool> {
        let result = Users::delete_by_id(id.value())
            .exec(&self.conn)
            .await
            .context("Failed to delete account")?;

        Ok(result.rows_affected > 0)
    }
}

/// Hash a password using Argon2id with the configured params.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Checks a password against a PHC hash string. Parameters are read from the hash.
pub fn verify_password(password_hash: &str, password: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Runs [`hash_password`] on the blocking pool; Argon2 would stall the async runtime.
pub async fn hash_password_blocking(password: &str, config: &SecurityConfig) -> Result<String> {
    let password = password.to_string();
    let config = config.clone();
    task::spawn_blocking(move || hash_password(&password, &config))
        .await
        .context("Password hashing task panicked")?
}

/// Runs [`verify_password`] on the blocking pool.
pub async fn verify_password_blocking(password_hash: String, password: &str) -> Result<bool> {
    let password = password.to_string();
    task::spawn_blocking(move || verify_password(&password_hash, &password))
        .await
        .context("Password verification task panicked")?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        }
    }

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("admin123", &fast_config()).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("admin123"));
        assert!(verify_password(&hash, "admin123").unwrap());
        assert!(!verify_password(&hash, "admin124").unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let config = fast_config();
        let first = hash_password("same-password", &config).unwrap();
        let second = hash_password("same-password", &config).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("not-a-phc-string", "x").is_err());
    }
}
