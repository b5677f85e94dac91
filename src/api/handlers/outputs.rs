//! Output read handlers
//!
//! Both routes record the caller named by the `x-watson-stack` header as a
//! consumer of the stack being read.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use tracing::instrument;

use super::caller::Caller;
use crate::api::{
    dto::{OutputFormat, OutputQuery},
    error::ApiError,
    routes::ApiState,
};
use crate::domain::{OutputMap, StackPath};

#[instrument(skip(state), fields(caller = ?caller.path().map(ToString::to_string)))]
pub async fn list_outputs_handler(
    State(state): State<ApiState>,
    Path((project, stack)): Path<(String, String)>,
    caller: Caller,
) -> Result<Json<OutputMap>, ApiError> {
    let outputs =
        state.registry.get_outputs(&StackPath::new(project, stack), caller.path()).await?;
    Ok(Json(outputs))
}

#[instrument(skip(state, query), fields(caller = ?caller.path().map(ToString::to_string)))]
pub async fn get_output_handler(
    State(state): State<ApiState>,
    Path((project, stack, key)): Path<(String, String, String)>,
    caller: Caller,
    query: Result<Query<OutputQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;

    let output =
        state.registry.get_output(&StackPath::new(project, stack), &key, caller.path()).await?;

    match query.format {
        OutputFormat::Json => Ok(Json(output).into_response()),
        OutputFormat::Raw => {
            let body = match output.value {
                Value::String(text) => text,
                other => serde_json::to_string(&other).map_err(crate::errors::WatsonError::from)?,
            };
            Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response())
        }
    }
}
