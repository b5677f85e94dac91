//! Test database utilities for in-library tests.
//!
//! Each `TestDatabase` is a fresh SQLite file in its own temporary directory
//! with all migrations applied, so tests are fully isolated and still
//! exercise WAL mode and multiple pooled connections.
//!
//! This module is only available in test builds (`#[cfg(test)]`).

use crate::config::DatabaseConfig;
use crate::storage::{create_pool, DbPool};
use tempfile::TempDir;

/// A migrated test database, removed when dropped.
///
/// Keep this struct alive for the duration of your test.
pub struct TestDatabase {
    pub pool: DbPool,
    _dir: TempDir,
}

impl TestDatabase {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir for test database");
        let url = format!("sqlite://{}", dir.path().join("watson-test.db").display());
        let config = DatabaseConfig {
            url,
            max_connections: 5,
            min_connections: 1,
            auto_migrate: true,
            ..Default::default()
        };

        let pool = create_pool(&config).await.expect("create test database pool");
        Self { pool, _dir: dir }
    }
}
