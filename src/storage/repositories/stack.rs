//! Stack repository
//!
//! Stacks are unique per `(project_id, slug)`. Every read joins the owning
//! project so the full path can be computed without a second query.

use super::output::{delete_records, insert_records, OutputRecord};
use crate::domain::{Project, ProjectId, Stack, StackId};
use crate::errors::{Result, WatsonError};
use crate::storage::{write_error, DbPool};
use sqlx::FromRow;
use tracing::instrument;

const STACK_COLUMNS: &str =
    "s.id, s.project_id, p.slug AS project_slug, s.name, s.slug FROM stacks s JOIN projects p ON p.id = s.project_id";

#[derive(Debug, Clone, FromRow)]
struct StackRow {
    pub id: StackId,
    pub project_id: ProjectId,
    pub project_slug: String,
    pub name: String,
    pub slug: String,
}

impl From<StackRow> for Stack {
    fn from(row: StackRow) -> Self {
        Self {
            id: row.id,
            project_id: row.project_id,
            project_slug: row.project_slug,
            name: row.name,
            slug: row.slug,
        }
    }
}

/// Repository for stack data access
#[derive(Debug, Clone)]
pub struct StackRepository {
    pool: DbPool,
}

impl StackRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert a stack and its encoded outputs in one transaction
    #[instrument(skip(self, project, outputs), fields(project = %project.slug, output_count = outputs.len()), name = "db_create_stack")]
    pub async fn create_with_outputs(
        &self,
        project: &Project,
        name: &str,
        slug: &str,
        outputs: &[OutputRecord],
    ) -> Result<Stack> {
        let id = StackId::new();
        let now = chrono::Utc::now();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| WatsonError::database(e, "Failed to begin transaction for stack creation"))?;

        sqlx::query(
            "INSERT INTO stacks (id, project_id, name, slug, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&id)
        .bind(&project.id)
        .bind(name)
        .bind(slug)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            write_error(
                e,
                "stack",
                || format!("A stack with slug '{}' already exists in project '{}'", slug, project.slug),
                format!("Failed to create stack '{}/{}'", project.slug, slug),
            )
        })?;

        insert_records(&mut *tx, &id, outputs).await?;

        tx.commit()
            .await
            .map_err(|e| WatsonError::database(e, "Failed to commit stack creation"))?;

        tracing::info!(stack_id = %id, path = %format!("{}/{}", project.slug, slug), "Created stack");

        Ok(Stack {
            id,
            project_id: project.id.clone(),
            project_slug: project.slug.clone(),
            name: name.to_string(),
            slug: slug.to_string(),
        })
    }

    /// Resolve a stack by project slug and stack slug
    #[instrument(skip(self), name = "db_get_stack_by_path")]
    pub async fn get_by_path(&self, project_slug: &str, stack_slug: &str) -> Result<Option<Stack>> {
        let row = sqlx::query_as::<_, StackRow>(&format!(
            "SELECT {} WHERE p.slug = $1 AND s.slug = $2",
            STACK_COLUMNS
        ))
        .bind(project_slug)
        .bind(stack_slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            WatsonError::database(e, format!("Failed to get stack '{}/{}'", project_slug, stack_slug))
        })?;

        Ok(row.map(Stack::from))
    }

    /// Stacks of one project ordered by slug
    #[instrument(skip(self), fields(project_id = %project_id), name = "db_list_stacks")]
    pub async fn list_by_project(&self, project_id: &ProjectId) -> Result<Vec<Stack>> {
        let rows = sqlx::query_as::<_, StackRow>(&format!(
            "SELECT {} WHERE s.project_id = $1 ORDER BY s.slug",
            STACK_COLUMNS
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| WatsonError::database(e, format!("Failed to list stacks of project {}", project_id)))?;

        Ok(rows.into_iter().map(Stack::from).collect())
    }

    /// Rename a stack and/or replace its outputs in one transaction
    #[instrument(skip(self, name, outputs), fields(stack_id = %id), name = "db_update_stack")]
    pub async fn update(
        &self,
        id: &StackId,
        name: Option<&str>,
        outputs: Option<&[OutputRecord]>,
    ) -> Result<Option<Stack>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| WatsonError::database(e, "Failed to begin transaction for stack update"))?;

        let result = sqlx::query(
            "UPDATE stacks SET name = COALESCE($2, name), updated_at = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(name)
        .bind(chrono::Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| WatsonError::database(e, format!("Failed to update stack {}", id)))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        if let Some(records) = outputs {
            delete_records(&mut *tx, id).await?;
            insert_records(&mut *tx, id, records).await?;
        }

        let row = sqlx::query_as::<_, StackRow>(&format!("SELECT {} WHERE s.id = $1", STACK_COLUMNS))
            .bind(id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| WatsonError::database(e, format!("Failed to reload stack {}", id)))?;

        tx.commit()
            .await
            .map_err(|e| WatsonError::database(e, "Failed to commit stack update"))?;

        Ok(Some(row.into()))
    }

    /// Delete a stack; outputs and usage edges in both directions cascade
    #[instrument(skip(self), fields(stack_id = %id), name = "db_delete_stack")]
    pub async fn delete(&self, id: &StackId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM stacks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| WatsonError::database(e, format!("Failed to delete stack {}", id)))?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_helpers::TestDatabase;
    use crate::storage::{OutputRepository, ProjectRepository};
    use serde_json::json;

    #[tokio::test]
    async fn test_same_slug_in_different_projects() {
        let db = TestDatabase::new().await;
        let projects = ProjectRepository::new(db.pool.clone());
        let stacks = StackRepository::new(db.pool.clone());

        let backend = projects.create("Backend", "backend").await.unwrap();
        let frontend = projects.create("Frontend", "frontend").await.unwrap();

        stacks.create_with_outputs(&backend, "Dev", "dev", &[]).await.unwrap();
        stacks.create_with_outputs(&frontend, "Dev", "dev", &[]).await.unwrap();

        let err = stacks.create_with_outputs(&backend, "Dev again", "dev", &[]).await.unwrap_err();
        assert!(matches!(err, WatsonError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_get_by_path_computes_full_path() {
        let db = TestDatabase::new().await;
        let project = ProjectRepository::new(db.pool.clone()).create("Backend", "backend").await.unwrap();
        let stacks = StackRepository::new(db.pool.clone());

        let created = stacks.create_with_outputs(&project, "Load Balancers", "load-balancers", &[]).await.unwrap();
        let fetched = stacks.get_by_path("backend", "load-balancers").await.unwrap().unwrap();
        assert_eq!(created, fetched);
        assert_eq!(fetched.full_path().to_string(), "backend/load-balancers");

        assert!(stacks.get_by_path("frontend", "load-balancers").await.unwrap().is_none());
        assert!(stacks.get_by_path("backend", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_output_insert_rolls_back_stack() {
        let db = TestDatabase::new().await;
        let project = ProjectRepository::new(db.pool.clone()).create("Backend", "backend").await.unwrap();
        let stacks = StackRepository::new(db.pool.clone());

        let blank = OutputRecord {
            key: String::new(),
            value: json!(1),
            deprecated: None,
            warning: None,
            sensitive: false,
        };
        assert!(stacks.create_with_outputs(&project, "Dev", "dev", &[blank]).await.is_err());
        assert!(stacks.get_by_path("backend", "dev").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = TestDatabase::new().await;
        let project = ProjectRepository::new(db.pool.clone()).create("Backend", "backend").await.unwrap();
        let stacks = StackRepository::new(db.pool.clone());
        let outputs = OutputRepository::new(db.pool.clone());

        let stack = stacks.create_with_outputs(&project, "Dev", "dev", &[]).await.unwrap();
        let record = OutputRecord {
            key: "url".to_string(),
            value: json!("https://dev.example"),
            deprecated: None,
            warning: None,
            sensitive: false,
        };

        let updated = stacks.update(&stack.id, Some("Development"), Some(std::slice::from_ref(&record))).await.unwrap().unwrap();
        assert_eq!(updated.name, "Development");
        assert_eq!(updated.slug, "dev");
        assert_eq!(outputs.list_by_stack(&stack.id).await.unwrap().len(), 1);

        let unchanged = stacks.update(&stack.id, None, None).await.unwrap().unwrap();
        assert_eq!(unchanged.name, "Development");
        assert_eq!(outputs.list_by_stack(&stack.id).await.unwrap().len(), 1);

        assert!(stacks.update(&StackId::new(), Some("x"), None).await.unwrap().is_none());

        assert!(stacks.delete(&stack.id).await.unwrap());
        assert!(outputs.list_by_stack(&stack.id).await.unwrap().is_empty());
        assert!(stacks.get_by_path("backend", "dev").await.unwrap().is_none());
    }
}
