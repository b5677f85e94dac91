//! # REST API Components
//!
//! axum routes, handlers and DTOs exposing the registry over HTTP.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use routes::{build_router, ApiState};
pub use server::start_api_server;
