//! Output repository
//!
//! Persists already-encoded output values. The `value` column always holds
//! a JSON document; turning logical values into stored ones (and
//! encrypting sensitive values) happens before a record reaches this layer.

use crate::domain::{OutputId, StackId};
use crate::errors::{Result, WatsonError};
use crate::storage::{write_error, DbPool};
use sqlx::{FromRow, SqliteConnection};
use tracing::instrument;

/// One output as stored: the value is the encoded JSON document
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRecord {
    pub key: String,
    pub value: serde_json::Value,
    pub deprecated: Option<String>,
    pub warning: Option<String>,
    pub sensitive: bool,
}

#[derive(Debug, Clone, FromRow)]
struct OutputRow {
    #[allow(dead_code)]
    pub id: OutputId,
    pub output_key: String,
    pub value: String,
    pub deprecated: Option<String>,
    pub warning: Option<String>,
    pub sensitive: bool,
}

impl TryFrom<OutputRow> for OutputRecord {
    type Error = WatsonError;

    fn try_from(row: OutputRow) -> Result<Self> {
        let value = serde_json::from_str(&row.value).map_err(|e| WatsonError::Serialization {
            source: e,
            context: format!("Stored value of output '{}' is not valid JSON", row.output_key),
        })?;

        Ok(Self {
            key: row.output_key,
            value,
            deprecated: row.deprecated,
            warning: row.warning,
            sensitive: row.sensitive,
        })
    }
}

/// Repository for output data access
#[derive(Debug, Clone)]
pub struct OutputRepository {
    pool: DbPool,
}

impl OutputRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// All outputs of a stack ordered by key
    #[instrument(skip(self), fields(stack_id = %stack_id), name = "db_list_outputs")]
    pub async fn list_by_stack(&self, stack_id: &StackId) -> Result<Vec<OutputRecord>> {
        let rows = sqlx::query_as::<_, OutputRow>(
            "SELECT id, output_key, value, deprecated, warning, sensitive \
             FROM outputs WHERE stack_id = $1 ORDER BY output_key",
        )
        .bind(stack_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| WatsonError::database(e, format!("Failed to list outputs of stack {}", stack_id)))?;

        rows.into_iter().map(OutputRecord::try_from).collect()
    }

    #[instrument(skip(self), fields(stack_id = %stack_id), name = "db_get_output")]
    pub async fn get_by_key(&self, stack_id: &StackId, key: &str) -> Result<Option<OutputRecord>> {
        let row = sqlx::query_as::<_, OutputRow>(
            "SELECT id, output_key, value, deprecated, warning, sensitive \
             FROM outputs WHERE stack_id = $1 AND output_key = $2",
        )
        .bind(stack_id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| WatsonError::database(e, format!("Failed to get output '{}'", key)))?;

        row.map(OutputRecord::try_from).transpose()
    }
}

/// Insert records inside an open transaction
pub(crate) async fn insert_records(
    conn: &mut SqliteConnection,
    stack_id: &StackId,
    records: &[OutputRecord],
) -> Result<()> {
    for record in records {
        let value = serde_json::to_string(&record.value)?;

        sqlx::query(
            "INSERT INTO outputs (id, stack_id, output_key, value, deprecated, warning, sensitive) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(OutputId::new())
        .bind(stack_id)
        .bind(&record.key)
        .bind(value)
        .bind(record.deprecated.as_deref())
        .bind(record.warning.as_deref())
        .bind(record.sensitive)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            write_error(
                e,
                "output",
                || format!("Output '{}' is defined more than once", record.key),
                format!("Failed to insert output '{}'", record.key),
            )
        })?;
    }

    Ok(())
}

/// Delete every output of a stack inside an open transaction
pub(crate) async fn delete_records(conn: &mut SqliteConnection, stack_id: &StackId) -> Result<u64> {
    let result = sqlx::query("DELETE FROM outputs WHERE stack_id = $1")
        .bind(stack_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| WatsonError::database(e, format!("Failed to delete outputs of stack {}", stack_id)))?;

    Ok(result.rows_affected())
}
