//! # Configuration Management
//!
//! Configuration for the Watson registry. Every section is read from
//! environment variables (a `.env` file is loaded by the binary first) and
//! validated with the `validator` crate before the server starts.

pub mod settings;

pub use settings::{AppConfig, CipherConfig, DatabaseConfig, ObservabilityConfig, ServerConfig};
