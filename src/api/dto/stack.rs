//! Stack and output DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{project_url, stack_url};
use crate::domain::{Consumer, NewStack, OutputMap, OutputSpecs, StackDetail, StackUpdate};

/// Request body for creating a stack with its initial outputs
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateStackDto {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[serde(default)]
    pub slug: Option<String>,

    /// Outputs keyed by output key
    #[serde(default)]
    pub outputs: OutputSpecs,
}

impl From<CreateStackDto> for NewStack {
    fn from(dto: CreateStackDto) -> Self {
        NewStack { name: dto.name, slug: dto.slug, outputs: dto.outputs }
    }
}

/// Request body for updating a stack. Supplying `outputs` replaces the
/// whole output set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateStackDto {
    #[serde(default)]
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,

    #[serde(default)]
    pub outputs: Option<OutputSpecs>,
}

impl From<UpdateStackDto> for StackUpdate {
    fn from(dto: UpdateStackDto) -> Self {
        StackUpdate { name: dto.name, outputs: dto.outputs }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProjectLink {
    pub id: String,
    pub name: String,
    pub url: String,
}

/// A stack that read this stack's outputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ConsumerLink {
    pub id: String,
    pub url: String,
    pub last_used_at: DateTime<Utc>,
}

impl From<Consumer> for ConsumerLink {
    fn from(consumer: Consumer) -> Self {
        Self {
            url: stack_url(&consumer.path),
            id: consumer.path.to_string(),
            last_used_at: consumer.last_used_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StackResponse {
    pub id: String,
    pub url: String,
    pub name: String,
    pub project: ProjectLink,
    pub outputs: OutputMap,
    pub used_by: Vec<ConsumerLink>,
}

impl From<StackDetail> for StackResponse {
    fn from(detail: StackDetail) -> Self {
        let path = detail.stack.full_path();
        Self {
            id: path.to_string(),
            url: stack_url(&path),
            name: detail.stack.name,
            project: ProjectLink {
                url: project_url(&detail.stack.project_slug),
                id: detail.stack.project_slug,
                name: detail.project_name,
            },
            outputs: detail.outputs,
            used_by: detail.used_by.into_iter().map(ConsumerLink::from).collect(),
        }
    }
}

/// Rendering of a single output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `{value, deprecated, warning, sensitive}`
    #[default]
    Json,
    /// The bare value as `text/plain`
    Raw,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputQuery {
    #[serde(default)]
    pub format: OutputFormat,
}
