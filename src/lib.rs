//! KPI decomposition trees.
//!
//! Formulas such as `profit = revenue - cost` are parsed into decompositions,
//! deduplicated by node label against a transactional store, assembled into a
//! forest and laid out on an integer grid (`x` = depth, `y` = pre-order sequence).
//!
//! Layers follow the dependency direction domain <- application <- infrastructure <- cli.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
