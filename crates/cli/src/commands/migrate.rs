//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! teashop migrate
//! ```
//!
//! Migration files live in `crates/server/migrations/` and are embedded
//! into the server library at compile time.

use super::{CommandError, connect};

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns `CommandError` if the connection or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running shop migrations...");
    teashop_server::db::run_migrations(&pool).await?;

    tracing::info!("Shop migrations complete!");
    Ok(())
}
