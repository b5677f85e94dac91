//! Common test utilities for all integration tests.
//!
//! Provides shared test database setup and registry construction.

#![allow(dead_code)]

use std::sync::Arc;

use watson::cipher::{CipherFactory, CipherKind};
use watson::config::DatabaseConfig;
use watson::domain::StackPath;
use watson::storage::{create_pool, DbPool};
use watson::Registry;

/// Fresh in-memory database with all migrations applied
pub async fn create_test_pool() -> DbPool {
    let config = DatabaseConfig {
        url: "sqlite://:memory:".to_string(),
        max_connections: 5,
        min_connections: 1,
        auto_migrate: true,
        ..Default::default()
    };
    create_pool(&config).await.unwrap()
}

pub async fn create_test_registry(kind: CipherKind) -> (DbPool, Registry) {
    let pool = create_test_pool().await;
    let registry = Registry::new(pool.clone(), Arc::new(CipherFactory::for_kind(kind)));
    (pool, registry)
}

pub fn path(raw: &str) -> StackPath {
    StackPath::parse(raw).unwrap()
}
