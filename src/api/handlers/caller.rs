//! Caller identity extraction

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::debug;

use crate::domain::StackPath;

/// Header through which a stack declares its own `project/stack` path
pub const CALLER_HEADER: &str = "x-watson-stack";

/// Optional identity of the stack making the request.
///
/// A missing, non-UTF-8 or malformed header yields `Caller(None)`; it
/// never rejects the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller(pub Option<StackPath>);

impl Caller {
    pub fn path(&self) -> Option<&StackPath> {
        self.0.as_ref()
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(raw) = parts.headers.get(CALLER_HEADER) else {
            return Ok(Caller(None));
        };

        let path = raw.to_str().ok().and_then(|value| match StackPath::parse(value.trim()) {
            Ok(path) => Some(path),
            Err(e) => {
                debug!(error = %e, "Ignoring malformed caller header");
                None
            }
        });

        Ok(Caller(path))
    }
}
