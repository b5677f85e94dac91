//! HTTP handlers for the registry API

pub mod caller;
pub mod outputs;
pub mod projects;
pub mod stacks;

pub use caller::{Caller, CALLER_HEADER};
pub use outputs::{get_output_handler, list_outputs_handler};
pub use projects::{
    create_project_handler, delete_project_handler, get_project_handler, list_projects_handler,
    update_project_handler,
};
pub use stacks::{create_stack_handler, delete_stack_handler, get_stack_handler, update_stack_handler};

use axum::Json;
use serde_json::{json, Value};

use super::dto::PROJECTS_URL;

/// API index
pub async fn root_handler() -> Json<Value> {
    Json(json!({ "projects": PROJECTS_URL }))
}
