//! Business logic services
//!
//! Service layer components that encapsulate registry behavior,
//! separated from HTTP concerns.

pub mod output_codec;
pub mod output_store;
pub mod registry;

pub use output_codec::OutputCodec;
pub use output_store::OutputStore;
pub use registry::{Clock, Registry, SystemClock};
