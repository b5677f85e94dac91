//! # Database Migration Management
//!
//! Schema evolution using SQL migrations embedded in the binary. Each
//! migration runs in its own transaction and is recorded in the
//! `_watson_migrations` table, so re-running is a no-op.

use crate::errors::{Result, WatsonError};
use crate::storage::DbPool;
use serde::{Deserialize, Serialize};
use sqlx::Row;
use tracing::{error, info, warn, Instrument};

/// Ordered `(filename, sql)` pairs; filenames start with a numeric version
const MIGRATIONS: &[(&str, &str)] = &[(
    "20250601000001_create_registry_tables",
    include_str!("../../migrations/20250601000001_create_registry_tables.sql"),
)];

/// Migration information structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationInfo {
    pub version: i64,
    pub description: String,
    pub installed_on: chrono::DateTime<chrono::Utc>,
    pub execution_time: i64,
    pub checksum: Vec<u8>,
}

/// Run all pending database migrations
pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    info!("Starting database migration process");

    create_migration_table(pool).await?;
    let applied = get_applied_migration_versions(pool).await?;

    let mut migrations_run = 0;
    for (filename, sql) in MIGRATIONS {
        let version = extract_version_from_filename(filename)?;

        if applied.contains(&version) {
            info!(version = version, "Migration already applied: {}", filename);
            continue;
        }

        apply_migration(pool, filename, sql, version)
            .instrument(crate::db_span!("apply_migration", version = version))
            .await?;

        migrations_run += 1;
    }

    if migrations_run > 0 {
        info!(count = migrations_run, "Database migrations completed");
    } else {
        info!("No pending migrations");
    }

    Ok(())
}

async fn apply_migration(pool: &DbPool, filename: &str, sql: &str, version: i64) -> Result<()> {
    info!(version = version, "Running migration: {}", filename);
    let start_time = std::time::Instant::now();

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| WatsonError::database(e, "Failed to start migration transaction"))?;

    // raw_sql allows multi-statement migration files
    sqlx::raw_sql(sql).execute(&mut *tx).await.map_err(|e| {
        error!(error = %e, migration = filename, "Migration failed");
        WatsonError::database(e, format!("Migration failed: {}", filename))
    })?;

    let execution_time = start_time.elapsed().as_millis() as i64;
    let checksum = calculate_checksum(sql);
    let now = chrono::Utc::now();

    sqlx::query(
        "INSERT INTO _watson_migrations (version, description, checksum, execution_time, installed_on) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(version)
    .bind(filename)
    .bind(&checksum)
    .bind(execution_time)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        error!(error = %e, migration = filename, "Failed to record migration");
        WatsonError::database(e, format!("Failed to record migration: {}", filename))
    })?;

    tx.commit()
        .await
        .map_err(|e| WatsonError::database(e, "Failed to commit migration transaction"))?;

    info!(version = version, execution_time_ms = execution_time, "Migration completed: {}", filename);
    Ok(())
}

async fn create_migration_table(pool: &DbPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS _watson_migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            checksum BLOB NOT NULL,
            execution_time INTEGER NOT NULL,
            installed_on TEXT NOT NULL
        )
    "#,
    )
    .execute(pool)
    .await
    .map_err(|e| WatsonError::database(e, "Failed to create migration tracking table"))?;

    Ok(())
}

async fn get_applied_migration_versions(pool: &DbPool) -> Result<Vec<i64>> {
    let rows = sqlx::query("SELECT version FROM _watson_migrations ORDER BY version")
        .fetch_all(pool)
        .await
        .map_err(|e| WatsonError::database(e, "Failed to get applied migrations"))?;

    Ok(rows.into_iter().map(|row| row.get::<i64, _>("version")).collect())
}

/// Extract version number from migration filename
fn extract_version_from_filename(filename: &str) -> Result<i64> {
    let version_str = filename.split('_').next().ok_or_else(|| {
        WatsonError::validation(format!("Invalid migration filename: {}", filename))
    })?;

    version_str
        .parse::<i64>()
        .map_err(|_| WatsonError::validation(format!("Invalid version in filename: {}", filename)))
}

fn calculate_checksum(content: &str) -> Vec<u8> {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish().to_le_bytes().to_vec()
}

/// Check that exactly the embedded migrations are applied
pub async fn validate_migrations(pool: &DbPool) -> Result<bool> {
    info!("Validating migration integrity");

    create_migration_table(pool).await?;
    let applied_versions = get_applied_migration_versions(pool).await?;
    let expected_versions: Vec<i64> = MIGRATIONS
        .iter()
        .map(|(filename, _)| extract_version_from_filename(filename))
        .collect::<Result<Vec<_>>>()?;

    for expected in &expected_versions {
        if !applied_versions.contains(expected) {
            warn!(version = expected, "Missing migration");
            return Ok(false);
        }
    }

    for applied in &applied_versions {
        if !expected_versions.contains(applied) {
            warn!(version = applied, "Unexpected migration found");
            return Ok(false);
        }
    }

    info!("Migration validation successful");
    Ok(true)
}

/// Get the current migration version (highest applied)
pub async fn get_migration_version(pool: &DbPool) -> Result<i64> {
    create_migration_table(pool).await?;
    let applied = get_applied_migration_versions(pool).await?;
    Ok(applied.into_iter().max().unwrap_or(0))
}

/// List all applied migrations
pub async fn list_applied_migrations(pool: &DbPool) -> Result<Vec<MigrationInfo>> {
    create_migration_table(pool).await?;
    let rows = sqlx::query(
        "SELECT version, description, checksum, execution_time, installed_on FROM _watson_migrations ORDER BY version",
    )
    .fetch_all(pool)
    .await
    .map_err(|e| WatsonError::database(e, "Failed to list applied migrations"))?;

    Ok(rows
        .into_iter()
        .map(|row| MigrationInfo {
            version: row.get("version"),
            description: row.get("description"),
            installed_on: row.get("installed_on"),
            execution_time: row.get("execution_time"),
            checksum: row.get("checksum"),
        })
        .collect())
}
