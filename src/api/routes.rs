use axum::{body::Body, http::Request, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::services::Registry;

use super::handlers::{
    create_project_handler, create_stack_handler, delete_project_handler, delete_stack_handler,
    get_output_handler, get_project_handler, get_stack_handler, list_outputs_handler,
    list_projects_handler, root_handler, update_project_handler, update_stack_handler,
};

#[derive(Clone)]
pub struct ApiState {
    pub registry: Registry,
}

/// Build the `/v1/` router. Trailing slashes are part of every route.
pub fn build_router(registry: Registry) -> Router {
    let state = ApiState { registry };

    Router::new()
        .route("/v1/", get(root_handler))
        .route("/v1/projects/", get(list_projects_handler).post(create_project_handler))
        .route(
            "/v1/projects/{project}/",
            get(get_project_handler)
                .put(update_project_handler)
                .delete(delete_project_handler)
                .post(create_stack_handler),
        )
        .route(
            "/v1/projects/{project}/{stack}/",
            get(get_stack_handler).put(update_stack_handler).delete(delete_stack_handler),
        )
        .route("/v1/projects/{project}/{stack}/outputs/", get(list_outputs_handler))
        .route("/v1/projects/{project}/{stack}/outputs/{key}/", get(get_output_handler))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            crate::request_span!(request.method(), request.uri().path())
        }))
        .with_state(state)
}
