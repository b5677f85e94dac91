//! Registry service
//!
//! Composition root of the output registry: project and stack CRUD, path
//! resolution, output reads and usage tracking.
//!
//! Reading outputs with a caller identity records a usage edge first. That
//! recording is best-effort: a failure is logged and the read still
//! succeeds.

use super::output_store::OutputStore;
use crate::cipher::CipherFactory;
use crate::domain::{
    allocate_slug, Consumer, NewProject, NewStack, OutputMap, OutputView, Project, ProjectDetail,
    ProjectUpdate, Stack, StackDetail, StackPath, StackSummary, StackUpdate,
};
use crate::errors::{Result, WatsonError};
use crate::storage::{DbPool, ProjectRepository, StackRepository, UsageRepository};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Source of "now" for usage timestamps
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Output registry service
#[derive(Debug, Clone)]
pub struct Registry {
    projects: ProjectRepository,
    stacks: StackRepository,
    usage: UsageRepository,
    outputs: OutputStore,
    ciphers: Arc<CipherFactory>,
    clock: Arc<dyn Clock>,
}

impl Registry {
    pub fn new(pool: DbPool, ciphers: Arc<CipherFactory>) -> Self {
        Self {
            projects: ProjectRepository::new(pool.clone()),
            stacks: StackRepository::new(pool.clone()),
            usage: UsageRepository::new(pool.clone()),
            outputs: OutputStore::new(pool, ciphers.clone()),
            ciphers,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock used for `last_used_at`
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Cipher selection shared with the codec
    pub fn ciphers(&self) -> &Arc<CipherFactory> {
        &self.ciphers
    }

    // ---------------------------------------------------------------------
    // Path resolution
    // ---------------------------------------------------------------------

    /// Resolve a full path to a stack, if both segments exist
    pub async fn find_stack(&self, path: &StackPath) -> Result<Option<Stack>> {
        self.stacks.get_by_path(path.project(), path.stack()).await
    }

    /// Resolve a full path to a stack or fail with not-found
    pub async fn resolve(&self, path: &StackPath) -> Result<Stack> {
        self.find_stack(path).await?.ok_or_else(|| WatsonError::not_found("stack", path.to_string()))
    }

    async fn project_by_slug(&self, slug: &str) -> Result<Project> {
        self.projects
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| WatsonError::not_found("project", slug))
    }

    // ---------------------------------------------------------------------
    // Projects
    // ---------------------------------------------------------------------

    #[instrument(skip(self, request), fields(name = %request.name), name = "registry_create_project")]
    pub async fn create_project(&self, request: NewProject) -> Result<ProjectDetail> {
        require_name(&request.name)?;
        let slug = allocate_slug(&request.name, request.slug.as_deref())?;

        let project = self.projects.create(&request.name, &slug).await?;
        Ok(ProjectDetail { project, stacks: Vec::new() })
    }

    pub async fn list_projects(&self) -> Result<Vec<ProjectDetail>> {
        let projects = self.projects.list().await?;

        let mut details = Vec::with_capacity(projects.len());
        for project in projects {
            details.push(self.project_detail(project).await?);
        }
        Ok(details)
    }

    pub async fn get_project(&self, slug: &str) -> Result<ProjectDetail> {
        let project = self.project_by_slug(slug).await?;
        self.project_detail(project).await
    }

    /// Rename a project; the slug cannot change
    #[instrument(skip(self, update), name = "registry_update_project")]
    pub async fn update_project(&self, slug: &str, update: ProjectUpdate) -> Result<ProjectDetail> {
        require_name(&update.name)?;

        let project = self
            .projects
            .update_name(slug, &update.name)
            .await?
            .ok_or_else(|| WatsonError::not_found("project", slug))?;
        self.project_detail(project).await
    }

    #[instrument(skip(self), name = "registry_delete_project")]
    pub async fn delete_project(&self, slug: &str) -> Result<()> {
        if !self.projects.delete_by_slug(slug).await? {
            return Err(WatsonError::not_found("project", slug));
        }
        Ok(())
    }

    async fn project_detail(&self, project: Project) -> Result<ProjectDetail> {
        let stacks = self
            .stacks
            .list_by_project(&project.id)
            .await?
            .into_iter()
            .map(|stack| StackSummary { path: stack.full_path(), name: stack.name })
            .collect();
        Ok(ProjectDetail { project, stacks })
    }

    // ---------------------------------------------------------------------
    // Stacks
    // ---------------------------------------------------------------------

    /// Create a stack and its outputs in one transaction
    #[instrument(skip(self, request), fields(name = %request.name, outputs = request.outputs.len()), name = "registry_create_stack")]
    pub async fn create_stack(&self, project_slug: &str, request: NewStack) -> Result<StackDetail> {
        require_name(&request.name)?;
        let slug = allocate_slug(&request.name, request.slug.as_deref())?;
        let project = self.project_by_slug(project_slug).await?;

        let records = self.outputs.encode_batch(&request.outputs).await?;
        let stack = self.stacks.create_with_outputs(&project, &request.name, &slug, &records).await?;

        self.stack_detail(stack).await
    }

    pub async fn get_stack(&self, path: &StackPath) -> Result<StackDetail> {
        let stack = self.resolve(path).await?;
        self.stack_detail(stack).await
    }

    /// Rename a stack and/or replace its outputs
    #[instrument(skip(self, update), fields(path = %path), name = "registry_update_stack")]
    pub async fn update_stack(&self, path: &StackPath, update: StackUpdate) -> Result<StackDetail> {
        if let Some(name) = &update.name {
            require_name(name)?;
        }
        let stack = self.resolve(path).await?;

        let records = match &update.outputs {
            Some(outputs) => Some(self.outputs.encode_batch(outputs).await?),
            None => None,
        };

        let updated = self
            .stacks
            .update(&stack.id, update.name.as_deref(), records.as_deref())
            .await?
            .ok_or_else(|| WatsonError::not_found("stack", path.to_string()))?;

        self.stack_detail(updated).await
    }

    #[instrument(skip(self), fields(path = %path), name = "registry_delete_stack")]
    pub async fn delete_stack(&self, path: &StackPath) -> Result<()> {
        let stack = self.resolve(path).await?;
        if !self.stacks.delete(&stack.id).await? {
            return Err(WatsonError::not_found("stack", path.to_string()));
        }
        info!(path = %path, "Deleted stack");
        Ok(())
    }

    async fn stack_detail(&self, stack: Stack) -> Result<StackDetail> {
        let project = self.project_by_slug(&stack.project_slug).await?;
        let outputs = self.outputs.read(&stack.id).await?;
        let used_by = self.usage.list_consumers(&stack.id).await?;

        Ok(StackDetail { stack, project_name: project.name, outputs, used_by })
    }

    // ---------------------------------------------------------------------
    // Outputs and usage
    // ---------------------------------------------------------------------

    /// Read every output of a stack, recording the caller as a consumer
    #[instrument(skip(self), fields(path = %path, caller = ?caller.map(ToString::to_string)), name = "registry_get_outputs")]
    pub async fn get_outputs(&self, path: &StackPath, caller: Option<&StackPath>) -> Result<OutputMap> {
        let stack = self.resolve(path).await?;
        self.track_caller(&stack, caller).await;
        self.outputs.read(&stack.id).await
    }

    /// Read one output of a stack, recording the caller as a consumer
    #[instrument(skip(self), fields(path = %path, caller = ?caller.map(ToString::to_string)), name = "registry_get_output")]
    pub async fn get_output(
        &self,
        path: &StackPath,
        key: &str,
        caller: Option<&StackPath>,
    ) -> Result<OutputView> {
        let stack = self.resolve(path).await?;
        self.track_caller(&stack, caller).await;
        self.outputs.read_key(&stack.id, key).await
    }

    /// Record that `consumer` read `provider`.
    ///
    /// Self-references and unknown consumers are ignored and yield `false`.
    pub async fn record_usage(&self, provider: &Stack, consumer: &StackPath) -> Result<bool> {
        if provider.full_path() == *consumer {
            return Ok(false);
        }

        let Some(consumer_stack) = self.find_stack(consumer).await? else {
            debug!(consumer = %consumer, "Ignoring usage by unknown stack");
            return Ok(false);
        };

        self.usage.upsert(&provider.id, &consumer_stack.id, self.clock.now()).await
    }

    /// Consumers of a stack ordered by path
    pub async fn consumers(&self, path: &StackPath) -> Result<Vec<Consumer>> {
        let stack = self.resolve(path).await?;
        self.usage.list_consumers(&stack.id).await
    }

    async fn track_caller(&self, provider: &Stack, caller: Option<&StackPath>) {
        let Some(caller) = caller else {
            return;
        };

        if let Err(e) = self.record_usage(provider, caller).await {
            warn!(
                error = %e,
                provider = %provider.full_path(),
                consumer = %caller,
                "Failed to record usage; returning outputs anyway"
            );
        }
    }
}

fn require_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(WatsonError::validation_field("name may not be blank", "name"));
    }
    Ok(())
}
