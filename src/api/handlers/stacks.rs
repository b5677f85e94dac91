//! Stack HTTP handlers
//!
//! Stacks are created by POSTing to their project and addressed afterwards
//! by `/{project}/{stack}/`.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use tracing::instrument;
use validator::Validate;

use crate::api::{
    dto::{CreateStackDto, StackResponse, UpdateStackDto},
    error::ApiError,
    routes::ApiState,
};
use crate::domain::StackPath;

#[instrument(skip(state, payload))]
pub async fn create_stack_handler(
    State(state): State<ApiState>,
    Path(project): Path<String>,
    payload: Result<Json<CreateStackDto>, JsonRejection>,
) -> Result<(StatusCode, Json<StackResponse>), ApiError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let detail = state.registry.create_stack(&project, payload.into()).await?;
    Ok((StatusCode::CREATED, Json(detail.into())))
}

#[instrument(skip(state))]
pub async fn get_stack_handler(
    State(state): State<ApiState>,
    Path((project, stack)): Path<(String, String)>,
) -> Result<Json<StackResponse>, ApiError> {
    let detail = state.registry.get_stack(&StackPath::new(project, stack)).await?;
    Ok(Json(detail.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_stack_handler(
    State(state): State<ApiState>,
    Path((project, stack)): Path<(String, String)>,
    payload: Result<Json<UpdateStackDto>, JsonRejection>,
) -> Result<Json<StackResponse>, ApiError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let detail = state.registry.update_stack(&StackPath::new(project, stack), payload.into()).await?;
    Ok(Json(detail.into()))
}

#[instrument(skip(state))]
pub async fn delete_stack_handler(
    State(state): State<ApiState>,
    Path((project, stack)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.registry.delete_stack(&StackPath::new(project, stack)).await?;
    Ok(StatusCode::NO_CONTENT)
}
