//! Project HTTP handlers

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use tracing::instrument;
use validator::Validate;

use crate::api::{
    dto::{CreateProjectDto, ProjectResponse, UpdateProjectDto},
    error::ApiError,
    routes::ApiState,
};

#[instrument(skip(state))]
pub async fn list_projects_handler(
    State(state): State<ApiState>,
) -> Result<Json<Vec<ProjectResponse>>, ApiError> {
    let projects = state.registry.list_projects().await?;
    Ok(Json(projects.into_iter().map(ProjectResponse::from).collect()))
}

#[instrument(skip(state, payload))]
pub async fn create_project_handler(
    State(state): State<ApiState>,
    payload: Result<Json<CreateProjectDto>, JsonRejection>,
) -> Result<(StatusCode, Json<ProjectResponse>), ApiError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let detail = state.registry.create_project(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(detail.into())))
}

#[instrument(skip(state))]
pub async fn get_project_handler(
    State(state): State<ApiState>,
    Path(project): Path<String>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let detail = state.registry.get_project(&project).await?;
    Ok(Json(detail.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_project_handler(
    State(state): State<ApiState>,
    Path(project): Path<String>,
    payload: Result<Json<UpdateProjectDto>, JsonRejection>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let detail = state.registry.update_project(&project, payload.into()).await?;
    Ok(Json(detail.into()))
}

#[instrument(skip(state))]
pub async fn delete_project_handler(
    State(state): State<ApiState>,
    Path(project): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.registry.delete_project(&project).await?;
    Ok(StatusCode::NO_CONTENT)
}
