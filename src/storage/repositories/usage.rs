//! Usage edge repository
//!
//! One row per ordered `(provider, consumer)` pair; recording a use again
//! only moves `last_used_at`.

use crate::domain::{Consumer, StackId, StackPath};
use crate::errors::{Result, WatsonError};
use crate::storage::{write_error, DbPool};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use tracing::instrument;

#[derive(Debug, Clone, FromRow)]
struct ConsumerRow {
    pub project_slug: String,
    pub stack_slug: String,
    pub last_used_at: DateTime<Utc>,
}

/// Repository for usage edges
#[derive(Debug, Clone)]
pub struct UsageRepository {
    pool: DbPool,
}

impl UsageRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert or refresh the edge `stack_id <- used_by_id`.
    ///
    /// Returns `false` without touching the store for a self-reference.
    #[instrument(skip(self), fields(stack_id = %stack_id, used_by_id = %used_by_id), name = "db_record_usage")]
    pub async fn upsert(
        &self,
        stack_id: &StackId,
        used_by_id: &StackId,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        if stack_id == used_by_id {
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO usage_edges (stack_id, used_by_id, last_used_at) VALUES ($1, $2, $3) \
             ON CONFLICT (stack_id, used_by_id) DO UPDATE SET last_used_at = excluded.last_used_at",
        )
        .bind(stack_id)
        .bind(used_by_id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            write_error(
                e,
                "usage_edge",
                || format!("Usage of {} by {} already recorded", stack_id, used_by_id),
                "Failed to record usage",
            )
        })?;

        Ok(true)
    }

    /// Consumers of a stack, resolved to their current paths and ordered by path
    #[instrument(skip(self), fields(stack_id = %stack_id), name = "db_list_consumers")]
    pub async fn list_consumers(&self, stack_id: &StackId) -> Result<Vec<Consumer>> {
        let rows = sqlx::query_as::<_, ConsumerRow>(
            "SELECT p.slug AS project_slug, s.slug AS stack_slug, e.last_used_at \
             FROM usage_edges e \
             JOIN stacks s ON s.id = e.used_by_id \
             JOIN projects p ON p.id = s.project_id \
             WHERE e.stack_id = $1 \
             ORDER BY p.slug, s.slug",
        )
        .bind(stack_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| WatsonError::database(e, format!("Failed to list consumers of stack {}", stack_id)))?;

        Ok(rows
            .into_iter()
            .map(|r| Consumer {
                path: StackPath::new(r.project_slug, r.stack_slug),
                last_used_at: r.last_used_at,
            })
            .collect())
    }
}
