//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (TreeStore, CategoryProvider)
//! but are themselves concrete structs, not traits.

mod generation;

pub use generation::{Generation, GenerationService};
