//! # Watson
//!
//! Watson is a registry for infrastructure-as-code stack outputs. Projects
//! group stacks; each stack publishes named outputs (any JSON value, with
//! optional deprecation and warning notes) that other stacks read over HTTP.
//! Outputs marked sensitive are encrypted with a pluggable cipher before
//! they are stored, and every read made on behalf of another stack records
//! a usage edge so a stack's consumers can be listed.
//!
//! ## Architecture
//!
//! ```text
//! REST API (axum) → Registry → OutputStore → OutputCodec → Cipher
//!                       ↓           ↓
//!                 Repositories (sqlx / SQLite)
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use watson::{
//!     cipher::{CipherFactory, CipherKind},
//!     config::DatabaseConfig,
//!     domain::{NewProject, StackPath},
//!     storage::create_pool,
//!     Registry, Result,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let pool = create_pool(&DatabaseConfig::default()).await?;
//!     let registry = Registry::new(pool, Arc::new(CipherFactory::for_kind(CipherKind::Rot13)));
//!
//!     registry.create_project(NewProject::named("Backend")).await?;
//!     let path = StackPath::parse("backend/load-balancers")?;
//!     let outputs = registry.get_outputs(&path, None).await?;
//!     println!("{}", serde_json::to_string_pretty(&outputs)?);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cipher;
pub mod cli;
pub mod client;
pub mod config;
pub mod domain;
pub mod errors;
pub mod observability;
pub mod services;
pub mod storage;

// Re-export commonly used types and traits
pub use cipher::{Cipher, CipherFactory, CipherKind};
pub use config::AppConfig;
pub use errors::{Result, WatsonError};
pub use services::Registry;

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
