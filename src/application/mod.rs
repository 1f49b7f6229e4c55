//! Application layer: services and use cases
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod builder;
pub mod error;
pub mod registry;
pub mod services;

pub use builder::{BuildOutcome, TreeBuilder};
pub use error::{ApplicationError, ApplicationResult, ErrorKind};
pub use registry::NodeRegistry;
