//! Manager account commands.
//!
//! # Usage
//!
//! ```bash
//! teashop manager promote -e owner@example.com
//! ```

use teashop_core::Email;
use teashop_server::db::UserRepository;

use super::{CommandError, connect};

/// Grant manager rights to `email`, creating a passwordless account if none
/// exists. The owner can then sign in with a verification code.
///
/// # Errors
///
/// Returns `CommandError::InvalidEmail` before connecting if the address is
/// malformed, or a database error.
pub async fn promote(email: &str) -> Result<(), CommandError> {
    let email = Email::parse(email)?;
    let pool = connect().await?;

    let user = UserRepository::new(&pool).promote_to_manager(&email).await?;

    tracing::info!(user_id = %user.id, email = %user.email, "Account promoted to manager");
    Ok(())
}
