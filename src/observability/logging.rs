//! # Structured Logging
//!
//! Span macros and startup logging built on the tracing ecosystem.
//!
//! In JSON logging mode span fields (`request_id`, `operation_id`, ...) are
//! attached to every event emitted inside the span, so a request's log lines
//! can be correlated by searching for its `request_id`.

/// Create a tracing span for request tracking.
///
/// ```rust,ignore
/// let span = request_span!("GET", "/v1/projects/", caller = "frontend/dev");
/// ```
#[macro_export]
macro_rules! request_span {
    ($method:expr, $path:expr) => {
        tracing::info_span!(
            "http_request",
            method = %$method,
            path = %$path,
            request_id = %uuid::Uuid::new_v4()
        )
    };
    ($method:expr, $path:expr, $($field:tt)*) => {
        tracing::info_span!(
            "http_request",
            method = %$method,
            path = %$path,
            request_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Create a tracing span for database operations.
///
/// ```rust,ignore
/// let span = db_span!("apply_migration", version = 20250601000001_i64);
/// ```
#[macro_export]
macro_rules! db_span {
    ($operation:expr) => {
        tracing::debug_span!(
            "db_operation",
            operation = %$operation,
            operation_id = %uuid::Uuid::new_v4()
        )
    };
    ($operation:expr, $($field:tt)*) => {
        tracing::debug_span!(
            "db_operation",
            operation = %$operation,
            operation_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Log configuration at startup. Key material is never logged.
pub fn log_config_info(config: &crate::config::AppConfig) {
    tracing::info!(
        server_address = %config.server.bind_address(),
        database_url = %crate::storage::pool::sanitize_url(&config.database.url),
        auto_migrate = config.database.auto_migrate,
        cipher = %config.cipher.kind,
        cipher_cached = config.cipher.cache,
        json_logging = config.observability.json_logging,
        "Watson output registry configuration"
    );
}
