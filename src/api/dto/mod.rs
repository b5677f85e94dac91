//! Data Transfer Objects (DTOs) for the API layer
//!
//! DTOs define the external JSON contract and are kept separate from the
//! domain entities they are converted from.
//!
//! ```text
//! HTTP Request → DTO → Domain input → Registry → Database
//! HTTP Response ← DTO ← Domain detail ← Registry ← Database
//! ```
//!
//! Resources link to each other by relative URL; a stack's `id` is its full
//! `project/stack` path and a project's `id` is its slug.

pub mod project;
pub mod stack;

pub use project::{CreateProjectDto, ProjectResponse, StackLink, UpdateProjectDto};
pub use stack::{
    ConsumerLink, CreateStackDto, OutputFormat, OutputQuery, ProjectLink, StackResponse,
    UpdateStackDto,
};

use crate::domain::StackPath;

/// Relative URL of the project collection
pub const PROJECTS_URL: &str = "/v1/projects/";

pub fn project_url(slug: &str) -> String {
    format!("{}{}/", PROJECTS_URL, slug)
}

pub fn stack_url(path: &StackPath) -> String {
    format!("{}{}/{}/", PROJECTS_URL, path.project(), path.stack())
}
