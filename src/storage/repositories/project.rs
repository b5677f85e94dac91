//! Project repository
//!
//! CRUD over the `projects` table. Projects are addressed by slug; the
//! slug is immutable after creation.

use crate::domain::{Project, ProjectId};
use crate::errors::{Result, WatsonError};
use crate::storage::{write_error, DbPool};
use sqlx::FromRow;
use tracing::instrument;

#[derive(Debug, Clone, FromRow)]
struct ProjectRow {
    pub id: ProjectId,
    pub name: String,
    pub slug: String,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Self { id: row.id, name: row.name, slug: row.slug }
    }
}

/// Repository for project data access
#[derive(Debug, Clone)]
pub struct ProjectRepository {
    pool: DbPool,
}

impl ProjectRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert a project with an already allocated slug
    #[instrument(skip(self), name = "db_create_project")]
    pub async fn create(&self, name: &str, slug: &str) -> Result<Project> {
        let id = ProjectId::new();
        let now = chrono::Utc::now();

        sqlx::query(
            "INSERT INTO projects (id, name, slug, created_at, updated_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&id)
        .bind(name)
        .bind(slug)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            write_error(
                e,
                "project",
                || format!("A project with slug '{}' already exists", slug),
                format!("Failed to create project '{}'", slug),
            )
        })?;

        tracing::info!(project_id = %id, slug = %slug, "Created project");

        Ok(Project { id, name: name.to_string(), slug: slug.to_string() })
    }

    #[instrument(skip(self), name = "db_get_project_by_slug")]
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Project>> {
        let row = sqlx::query_as::<_, ProjectRow>(
            "SELECT id, name, slug FROM projects WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| WatsonError::database(e, format!("Failed to get project '{}'", slug)))?;

        Ok(row.map(Project::from))
    }

    /// All projects ordered by slug
    #[instrument(skip(self), name = "db_list_projects")]
    pub async fn list(&self) -> Result<Vec<Project>> {
        let rows = sqlx::query_as::<_, ProjectRow>("SELECT id, name, slug FROM projects ORDER BY slug")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| WatsonError::database(e, "Failed to list projects"))?;

        Ok(rows.into_iter().map(Project::from).collect())
    }

    /// Rename a project; returns `None` when no project has this slug
    #[instrument(skip(self), name = "db_update_project")]
    pub async fn update_name(&self, slug: &str, name: &str) -> Result<Option<Project>> {
        let row = sqlx::query_as::<_, ProjectRow>(
            "UPDATE projects SET name = $2, updated_at = $3 WHERE slug = $1 RETURNING id, name, slug",
        )
        .bind(slug)
        .bind(name)
        .bind(chrono::Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| WatsonError::database(e, format!("Failed to update project '{}'", slug)))?;

        Ok(row.map(Project::from))
    }

    /// Delete a project and, by cascade, its stacks, outputs and usage edges
    #[instrument(skip(self), name = "db_delete_project")]
    pub async fn delete_by_slug(&self, slug: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE slug = $1")
            .bind(slug)
            .execute(&self.pool)
            .await
            .map_err(|e| WatsonError::database(e, format!("Failed to delete project '{}'", slug)))?;

        if result.rows_affected() > 0 {
            tracing::info!(slug = %slug, "Deleted project");
        }

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_helpers::TestDatabase;

    #[tokio::test]
    async fn test_create_and_get() {
        let db = TestDatabase::new().await;
        let repo = ProjectRepository::new(db.pool.clone());

        let created = repo.create("Backend", "backend").await.unwrap();
        let fetched = repo.get_by_slug("backend").await.unwrap().unwrap();
        assert_eq!(created, fetched);
        assert!(repo.get_by_slug("frontend").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_conflict() {
        let db = TestDatabase::new().await;
        let repo = ProjectRepository::new(db.pool.clone());

        repo.create("Backend", "backend").await.unwrap();
        let err = repo.create("Other", "backend").await.unwrap_err();
        assert!(matches!(err, WatsonError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_list_update_delete() {
        let db = TestDatabase::new().await;
        let repo = ProjectRepository::new(db.pool.clone());

        repo.create("Zeta", "zeta").await.unwrap();
        repo.create("Alpha", "alpha").await.unwrap();
        let slugs: Vec<String> = repo.list().await.unwrap().into_iter().map(|p| p.slug).collect();
        assert_eq!(slugs, vec!["alpha", "zeta"]);

        let renamed = repo.update_name("alpha", "Alpha Prime").await.unwrap().unwrap();
        assert_eq!(renamed.name, "Alpha Prime");
        assert_eq!(renamed.slug, "alpha");
        assert!(repo.update_name("missing", "x").await.unwrap().is_none());

        assert!(repo.delete_by_slug("alpha").await.unwrap());
        assert!(!repo.delete_by_slug("alpha").await.unwrap());
    }
}
