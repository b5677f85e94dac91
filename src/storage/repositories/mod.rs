//! Repository modules for data access
//!
//! Each repository handles CRUD operations for one table and holds a clone
//! of the pool. Multi-row writes run in a single transaction.

pub mod output;
pub mod project;
pub mod stack;
pub mod usage;

pub use output::{OutputRecord, OutputRepository};
pub use project::ProjectRepository;
pub use stack::StackRepository;
pub use usage::UsageRepository;
