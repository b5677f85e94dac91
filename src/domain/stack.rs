//! Stack entity and its inputs

use super::id::{ProjectId, StackId};
use super::output::{OutputMap, OutputSpecs};
use super::path::StackPath;
use super::usage::Consumer;
use serde::{Deserialize, Serialize};

/// A stack row joined with its project's slug
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stack {
    pub id: StackId,
    pub project_id: ProjectId,
    pub project_slug: String,
    pub name: String,
    pub slug: String,
}

impl Stack {
    /// Computed hierarchical address, never persisted
    pub fn full_path(&self) -> StackPath {
        StackPath::new(&self.project_slug, &self.slug)
    }
}

/// Input for creating a stack along with its initial outputs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewStack {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default)]
    pub outputs: OutputSpecs,
}

impl NewStack {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_outputs(mut self, outputs: OutputSpecs) -> Self {
        self.outputs = outputs;
        self
    }
}

/// Stack update: a new name and/or a replacement output set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StackUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub outputs: Option<OutputSpecs>,
}

/// Everything a reader sees about one stack
#[derive(Debug, Clone, PartialEq)]
pub struct StackDetail {
    pub stack: Stack,
    pub project_name: String,
    pub outputs: OutputMap,
    pub used_by: Vec<Consumer>,
}
