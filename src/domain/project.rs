//! Project entity and its inputs

use super::id::ProjectId;
use super::path::StackPath;
use serde::{Deserialize, Serialize};

/// A named group of stacks, addressed by its globally unique slug
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub slug: String,
}

/// Input for creating a project; the slug is derived from the name when absent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl NewProject {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), slug: None }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }
}

/// Mutable project attributes. The slug never changes after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectUpdate {
    pub name: String,
}

/// Short form of a stack as listed under its project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackSummary {
    pub path: StackPath,
    pub name: String,
}

/// A project together with the stacks it owns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDetail {
    pub project: Project,
    pub stacks: Vec<StackSummary>,
}
