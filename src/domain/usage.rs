//! Usage edges between stacks

use super::path::StackPath;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A consumer of a stack, resolved to its current full path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consumer {
    pub path: StackPath,
    pub last_used_at: DateTime<Utc>,
}
