//! Project DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{project_url, stack_url};
use crate::domain::{NewProject, ProjectDetail, ProjectUpdate, StackSummary};

/// Request body for creating a project
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateProjectDto {
    /// Human readable name; the slug is derived from it when absent
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[serde(default)]
    pub slug: Option<String>,
}

impl From<CreateProjectDto> for NewProject {
    fn from(dto: CreateProjectDto) -> Self {
        NewProject { name: dto.name, slug: dto.slug }
    }
}

/// Request body for renaming a project
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateProjectDto {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

impl From<UpdateProjectDto> for ProjectUpdate {
    fn from(dto: UpdateProjectDto) -> Self {
        ProjectUpdate { name: dto.name }
    }
}

/// A stack as listed under its project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StackLink {
    pub id: String,
    pub name: String,
    pub url: String,
}

impl From<StackSummary> for StackLink {
    fn from(summary: StackSummary) -> Self {
        Self { url: stack_url(&summary.path), id: summary.path.to_string(), name: summary.name }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProjectResponse {
    pub id: String,
    pub name: String,
    pub url: String,
    pub stacks: Vec<StackLink>,
}

impl From<ProjectDetail> for ProjectResponse {
    fn from(detail: ProjectDetail) -> Self {
        let ProjectDetail { project, stacks } = detail;
        Self {
            url: project_url(&project.slug),
            id: project.slug,
            name: project.name,
            stacks: stacks.into_iter().map(StackLink::from).collect(),
        }
    }
}
