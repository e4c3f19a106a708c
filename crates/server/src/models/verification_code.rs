//! One-time login codes.

use chrono::{DateTime, Duration, Utc};

use teashop_core::{Email, VerificationCodeId};

/// How long a code stays valid after it is issued.
pub const CODE_TTL: Duration = Duration::minutes(5);

/// Minimum gap between two codes for the same address.
pub const RESEND_INTERVAL: Duration = Duration::minutes(1);

/// A code mailed to `email`.
#[derive(Debug, Clone)]
pub struct VerificationCode {
    pub id: VerificationCodeId,
    pub email: Email,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

impl VerificationCode {
    /// Whether the code can still be redeemed at `now`.
    #[must_use]
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        !self.used && self.expires_at > now
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn code(used: bool, expires_at: DateTime<Utc>) -> VerificationCode {
        VerificationCode {
            id: VerificationCodeId::new(1),
            email: Email::parse("tea@example.com").unwrap(),
            code: "123456".to_owned(),
            expires_at,
            used,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_is_redeemable() {
        let now = Utc::now();
        assert!(code(false, now + CODE_TTL).is_redeemable(now));
        assert!(!code(true, now + CODE_TTL).is_redeemable(now));
        assert!(!code(false, now - Duration::seconds(1)).is_redeemable(now));
    }
}
