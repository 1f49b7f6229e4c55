//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod entities;
pub mod error;
pub mod forest;
pub mod layout;
pub mod operator;
pub mod parser;
pub mod render;

pub use arena::NodeArena;
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use forest::Forest;
pub use layout::{LayoutEngine, LayoutOutcome};
pub use operator::Operator;
pub use parser::{parse, split_formula, FormulaParts, ParsedExpression};
pub use render::ForestRender;
