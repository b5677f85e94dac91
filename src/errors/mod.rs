//! # Error Handling
//!
//! Error handling for the Watson registry. Every fallible operation returns
//! [`Result`], whose error maps onto the registry's taxonomy: validation,
//! conflict, not-found, cipher, plus infrastructure failures.

pub mod types;

pub use types::{Result, WatsonError};
