//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use teashop_core::{AccountStatus, Email, Price, UserId, UserRole};

/// Default display name for accounts created without one.
pub const DEFAULT_USERNAME: &str = "用户";

/// Default avatar emoji.
pub const DEFAULT_AVATAR: &str = "👤";

/// A shop account (domain type).
///
/// Serialized as-is for the manager's user list.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub username: String,
    pub avatar: String,
    pub role: UserRole,
    pub status: AccountStatus,
    /// Manager-only note about the customer.
    pub nickname: Option<String>,
    /// Cached order count, see [`crate::services::stats`].
    pub total_orders: i32,
    /// Cached lifetime spend.
    pub total_spent: Price,
    pub stats_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// Whether the account currently has manager rights.
    #[must_use]
    pub const fn is_active_manager(&self) -> bool {
        self.role.is_manager() && self.status.is_active()
    }
}

/// The view of an account returned to its owner.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: Email,
    pub username: String,
    pub avatar: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            avatar: user.avatar,
            role: user.role,
            created_at: user.created_at,
            last_login: user.last_login,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user(role: UserRole, status: AccountStatus) -> User {
        User {
            id: UserId::new(1),
            email: Email::parse("guest@shop.com").unwrap(),
            username: DEFAULT_USERNAME.to_owned(),
            avatar: DEFAULT_AVATAR.to_owned(),
            role,
            status,
            nickname: Some("regular".to_owned()),
            total_orders: 0,
            total_spent: Price::ZERO,
            stats_updated_at: None,
            created_at: Utc::now(),
            last_login: None,
        }
    }

    #[test]
    fn test_is_active_manager() {
        assert!(user(UserRole::Manager, AccountStatus::Active).is_active_manager());
        assert!(!user(UserRole::Manager, AccountStatus::Disabled).is_active_manager());
        assert!(!user(UserRole::User, AccountStatus::Active).is_active_manager());
    }

    #[test]
    fn test_profile_hides_manager_fields() {
        let profile = UserProfile::from(user(UserRole::User, AccountStatus::Active));
        let json = serde_json::to_value(&profile).unwrap();

        assert_eq!(json["email"], "guest@shop.com");
        assert_eq!(json["role"], "user");
        assert!(json.get("nickname").is_none());
        assert!(json.get("status").is_none());
    }
}
