use serde::Serialize;

use super::{format_timestamp, parse_timestamp};
use crate::constants::limits::MAX_USERNAME_LEN;
use crate::domain::lockout::LockState;
use crate::domain::{AccountId, Role};
use crate::entities::users;

/// Account record without its password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    pub role: Role,
    pub lock: LockState,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for Account {
    fn from(model: users::Model) -> Self {
        let lock = LockState {
            failed_attempts: u32::try_from(model.failed_attempts).unwrap_or(0),
            locked_until: model.locked_until.as_deref().and_then(parse_timestamp),
        };

        Self {
            id: AccountId::new(model.id),
            username: model.username,
            role: Role::parse_lenient(&model.role),
            lock,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Account as shown on the admin account list.
#[derive(Debug, Clone, Serialize)]
pub struct AccountSummary {
    pub id: AccountId,
    pub username: String,
    pub role: Role,
    pub failed_attempts: u32,
    pub locked_until: Option<String>,
    pub locked: bool,
    pub created_at: String,
}

impl AccountSummary {
    #[must_use]
    pub fn from_account(account: Account, now: chrono::DateTime<chrono::Utc>) -> Self {
        let lock = account.lock.normalized(now);
        Self {
            id: account.id,
            username: account.username,
            role: account.role,
            failed_attempts: lock.failed_attempts,
            locked_until: lock.locked_until.map(format_timestamp),
            locked: lock.is_locked(now),
            created_at: account.created_at,
        }
    }
}

/// Keeps ASCII letters, digits and underscores, capped at the username length limit.
#[must_use]
pub fn sanitize_username(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .take(MAX_USERNAME_LEN)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_username_strips_and_truncates() {
        assert_eq!(sanitize_username("bob"), "bob");
        assert_eq!(sanitize_username(" b o-b!"), "bob");
        assert_eq!(sanitize_username("<script>"), "script");
        assert_eq!(sanitize_username("名前"), "");
        assert_eq!(sanitize_username(&"a".repeat(40)).len(), 30);
    }

    #[test]
    fn model_conversion_parses_lock_fields() {
        let model = users::Model {
            id: 3,
            username: "carol".to_string(),
            password_hash: "hash".to_string(),
            role: "bogus".to_string(),
            failed_attempts: 2,
            locked_until: Some("2030-01-01T00:00:00.000Z".to_string()),
            created_at: String::new(),
            updated_at: String::new(),
        };

        let account = Account::from(model);
        assert_eq!(account.id, AccountId::new(3));
        assert_eq!(account.role, Role::User);
        assert_eq!(account.lock.failed_attempts, 2);
        assert!(account.lock.locked_until.is_some());
    }
}
