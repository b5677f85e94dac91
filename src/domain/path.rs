//! Hierarchical stack addressing (`project-slug/stack-slug`)

use crate::errors::{Result, WatsonError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Full path of a stack: its project's slug and its own slug
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StackPath {
    project: String,
    stack: String,
}

impl StackPath {
    pub fn new(project: impl Into<String>, stack: impl Into<String>) -> Self {
        Self { project: project.into(), stack: stack.into() }
    }

    /// Parse `project/stack`, splitting on the first `/`
    pub fn parse(path: &str) -> Result<Self> {
        match path.split_once('/') {
            Some((project, stack)) if !project.is_empty() && !stack.is_empty() => {
                Ok(Self::new(project, stack))
            }
            _ => Err(WatsonError::validation_field(
                format!("'{}' is not a valid stack path (expected 'project/stack')", path),
                "path",
            )),
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn stack(&self) -> &str {
        &self.stack
    }
}

impl fmt::Display for StackPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.project, self.stack)
    }
}

impl FromStr for StackPath {
    type Err = WatsonError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for StackPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StackPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
