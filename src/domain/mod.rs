//! Domain layer
//!
//! Entities of the output registry and the rules that need no storage:
//! slug allocation, stack path parsing and the shapes of output values.
//!
//! ## Module Organization
//!
//! - `id`: Type-safe row identifiers with NewType pattern
//! - `slug`: Slug derivation and validation
//! - `path`: `project/stack` addressing
//! - `project`, `stack`, `output`, `usage`: entities and their inputs

pub mod id;
pub mod output;
pub mod path;
pub mod project;
pub mod slug;
pub mod stack;
pub mod usage;

pub use id::{OutputId, ProjectId, StackId};
pub use output::{OutputMap, OutputSpec, OutputSpecs, OutputView};
pub use path::StackPath;
pub use project::{NewProject, Project, ProjectDetail, ProjectUpdate, StackSummary};
pub use slug::{allocate_slug, is_valid_slug, slugify, validate_slug};
pub use stack::{NewStack, Stack, StackDetail, StackUpdate};
pub use usage::Consumer;
