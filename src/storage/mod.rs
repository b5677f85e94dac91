//! # Storage and Persistence
//!
//! SQLite persistence for projects, stacks, outputs and usage edges.
//! Uniqueness, non-empty and no-self-edge rules are enforced by schema
//! constraints; repositories translate constraint violations into
//! [`WatsonError::Conflict`] so a race between an application check and
//! the write still surfaces as a conflict.

pub mod migrations;
pub mod pool;
pub mod repositories;

#[cfg(test)]
pub mod test_helpers;

pub use crate::config::DatabaseConfig;

pub use migrations::{
    get_migration_version, list_applied_migrations, run_migrations, validate_migrations,
    MigrationInfo,
};
pub use pool::{create_pool, DbPool};
pub use repositories::{
    OutputRecord, OutputRepository, ProjectRepository, StackRepository, UsageRepository,
};

use crate::errors::{Result, WatsonError};

/// Check database connectivity
pub async fn check_connection(pool: &DbPool) -> Result<()> {
    sqlx::query("SELECT 1").fetch_one(pool).await.map_err(|e| WatsonError::Database {
        source: e,
        context: "Database connectivity check failed".to_string(),
    })?;

    Ok(())
}

/// Map a failed write to a conflict when the store rejected it on a constraint
pub(crate) fn write_error(
    err: sqlx::Error,
    resource_type: &str,
    conflict_message: impl FnOnce() -> String,
    context: impl Into<String>,
) -> WatsonError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            tracing::warn!(resource_type, error = %db_err, "Unique constraint rejected write");
            return WatsonError::conflict(conflict_message(), resource_type);
        }

        if db_err.is_check_violation() || db_err.is_foreign_key_violation() {
            tracing::warn!(resource_type, error = %db_err, "Integrity constraint rejected write");
            return WatsonError::conflict(
                format!("{} violates a storage constraint: {}", resource_type, db_err.message()),
                resource_type,
            );
        }
    }

    WatsonError::database(err, context)
}
