//! Session snapshot and capability checks for protected operations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{AccountId, Role};

/// Identity captured into the session at login.
///
/// The role is a snapshot: later role changes on the account do not affect
/// sessions that were already issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub account_id: AccountId,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Authenticated,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessDenied {
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Administrator privileges required")]
    Forbidden,
}

/// Checks whether the resolved session (if any) grants `capability`.
pub fn authorize(
    session: Option<&SessionUser>,
    capability: Capability,
) -> Result<&SessionUser, AccessDenied> {
    let Some(user) = session else {
        return Err(AccessDenied::Unauthenticated);
    };

    match (capability, user.role) {
        (Capability::Authenticated, _) | (Capability::Admin, Role::Admin) => Ok(user),
        (Capability::Admin, Role::User) => Err(AccessDenied::Forbidden),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> SessionUser {
        SessionUser {
            account_id: AccountId::new(1),
            username: "alice".to_string(),
            role,
        }
    }

    #[test]
    fn missing_session_is_unauthenticated() {
        assert_eq!(
            authorize(None, Capability::Authenticated),
            Err(AccessDenied::Unauthenticated)
        );
        assert_eq!(
            authorize(None, Capability::Admin),
            Err(AccessDenied::Unauthenticated)
        );
    }

    #[test]
    fn user_role_is_forbidden_from_admin_operations() {
        let session = user(Role::User);
        assert!(authorize(Some(&session), Capability::Authenticated).is_ok());
        assert_eq!(
            authorize(Some(&session), Capability::Admin),
            Err(AccessDenied::Forbidden)
        );
    }

    #[test]
    fn admin_passes_both_gates() {
        let session = user(Role::Admin);
        assert_eq!(
            authorize(Some(&session), Capability::Admin),
            Ok(&session)
        );
        assert!(authorize(Some(&session), Capability::Authenticated).is_ok());
    }
}
