//! Verification code maintenance.

use teashop_server::db::VerificationCodeRepository;

use super::{CommandError, connect};

/// Delete expired verification codes.
///
/// # Errors
///
/// Returns `CommandError` if the connection or the delete fails.
pub async fn cleanup() -> Result<u64, CommandError> {
    let pool = connect().await?;

    let removed = VerificationCodeRepository::new(&pool)
        .delete_expired()
        .await?;

    tracing::info!(removed, "Expired verification codes removed");
    Ok(removed)
}
