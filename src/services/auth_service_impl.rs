//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::SecurityConfig;
use crate::constants::limits::LOCKOUT_CAS_RETRIES;
use crate::db::Store;
use crate::db::repositories::account::{hash_password_blocking, verify_password_blocking};
use crate::domain::AccountId;
use crate::domain::access::SessionUser;
use crate::domain::lockout::{FailureOutcome, LockState, LockStatus, LockoutPolicy};
use crate::services::auth_service::{AuthError, AuthService};

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
    policy: LockoutPolicy,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(store: Store, security: SecurityConfig) -> Self {
        let policy = LockoutPolicy::from(&security.lockout);
        Self {
            store,
            security,
            policy,
        }
    }

    async fn reload_lock(&self, id: AccountId) -> Result<LockState, AuthError> {
        self.store
            .get_account(id)
            .await?
            .map(|account| account.lock)
            .ok_or(AuthError::InvalidCredentials)
    }

    fn record_outcome(outcome: &'static str) {
        metrics::counter!("auth_login_total", "outcome" => outcome).increment(1);
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(&self, username: &str, password: &str) -> Result<SessionUser, AuthError> {
        let Some((account, password_hash)) = self
            .store
            .get_account_by_username_with_password(username)
            .await?
        else {
            debug!("Login attempt for unknown username");
            Self::record_outcome("unknown_user");
            return Err(AuthError::InvalidCredentials);
        };

        let mut observed = account.lock;
        let mut password_matches: Option<bool> = None;

        // Every write is conditioned on the lock fields we last read, so two
        // concurrent attempts on the same account cannot both count as one.
        for _ in 0..LOCKOUT_CAS_RETRIES {
            let now = Utc::now();

            match observed.status(now) {
                LockStatus::Locked { remaining_minutes } => {
                    info!(account_id = %account.id, remaining_minutes, "Login rejected: account locked");
                    Self::record_outcome("locked");
                    return Err(AuthError::Locked { remaining_minutes });
                }
                LockStatus::Expired => {
                    let cleared = LockState::cleared();
                    if self
                        .store
                        .compare_and_set_lock(account.id, &observed, &cleared)
                        .await?
                    {
                        debug!(account_id = %account.id, "Expired lock cleared");
                        observed = cleared;
                    } else {
                        observed = self.reload_lock(account.id).await?;
                    }
                    continue;
                }
                LockStatus::Open { .. } => {}
            }

            let matches = match password_matches {
                Some(matches) => matches,
                None => {
                    let matches =
                        verify_password_blocking(password_hash.clone(), password).await?;
                    password_matches = Some(matches);
                    matches
                }
            };

            if matches {
                let next = self.policy.register_success();
                if observed == next
                    || self
                        .store
                        .compare_and_set_lock(account.id, &observed, &next)
                        .await?
                {
                    info!(account_id = %account.id, username = %account.username, "Login succeeded");
                    Self::record_outcome("success");
                    return Ok(SessionUser {
                        account_id: account.id,
                        username: account.username,
                        role: account.role,
                    });
                }
            } else {
                let (next, outcome) = self.policy.register_failure(observed, now);
                if self
                    .store
                    .compare_and_set_lock(account.id, &observed, &next)
                    .await?
                {
                    return Err(match outcome {
                        FailureOutcome::AttemptsRemaining(attempts_remaining) => {
                            info!(account_id = %account.id, attempts_remaining, "Login failed: wrong password");
                            Self::record_outcome("wrong_password");
                            AuthError::InvalidPassword { attempts_remaining }
                        }
                        FailureOutcome::LockedOut { minutes } => {
                            warn!(account_id = %account.id, minutes, "Account locked after repeated failures");
                            Self::record_outcome("locked_out");
                            AuthError::Locked {
                                remaining_minutes: minutes,
                            }
                        }
                    });
                }
            }

            observed = self.reload_lock(account.id).await?;
        }

        warn!(account_id = %account.id, "Lockout update kept losing races");
        Err(AuthError::Internal(
            "Too many concurrent login attempts".to_string(),
        ))
    }

    async fn change_password(
        &self,
        account_id: AccountId,
        current_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), AuthError> {
        let (_, password_hash) = self
            .store
            .get_account_with_password(account_id)
            .await?
            .ok_or(AuthError::Unauthenticated)?;

        if !verify_password_blocking(password_hash, current_password).await? {
            return Err(AuthError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        if new_password.chars().count() < self.security.min_password_length {
            return Err(AuthError::Validation(format!(
                "New password must be at least {} characters",
                self.security.min_password_length
            )));
        }

        if new_password != confirm_password {
            return Err(AuthError::Validation(
                "New password and confirmation do not match".to_string(),
            ));
        }

        let new_hash = hash_password_blocking(new_password, &self.security).await?;
        if !self
            .store
            .update_account_password(account_id, new_hash, false)
            .await?
        {
            return Err(AuthError::Unauthenticated);
        }

        info!(account_id = %account_id, "Password changed");
        Ok(())
    }
}
