//! I/O boundary traits for testability
//!
//! These traits abstract persistence, template lookup and file access, allowing
//! services to be tested with in-memory or scripted implementations.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::application::ApplicationResult;
use crate::domain::{
    Category, CategoryIndex, Coordinates, Decomposition, DomainError, Node, NodeId, Operator,
};
use crate::infrastructure::store::StoreState;

/// Errors reported by the persistence gateway.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Uniqueness constraint on node labels was violated.
    #[error("node label already exists: {label}")]
    Conflict { label: String },

    #[error("unknown node: {id}")]
    NotFound { id: NodeId },

    #[error("record rejected: {0}")]
    Invalid(#[from] DomainError),

    #[error("store file {path} is corrupt: {message}")]
    Corrupt { path: PathBuf, message: String },

    #[error("store unavailable: {message}")]
    Unavailable { message: String },
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Result type for persistence gateway calls.
pub type StoreResult<T> = Result<T, StoreError>;

/// Node persistence gateway.
pub trait NodeStore {
    /// Look up a node by label, including nodes created earlier in the same transaction.
    fn find_by_label(&mut self, label: &str) -> StoreResult<Option<Node>>;

    /// Create a node with unset coordinates.
    /// Fails with [`StoreError::Conflict`] if the label is taken.
    fn create(&mut self, label: &str) -> StoreResult<Node>;

    /// Record layout coordinates for a node.
    fn update_coordinates(&mut self, id: NodeId, coordinates: Coordinates) -> StoreResult<()>;
}

/// Decomposition persistence gateway.
pub trait DecompositionStore {
    fn create(
        &mut self,
        root: NodeId,
        operator: Option<Operator>,
        children: &[NodeId],
    ) -> StoreResult<Decomposition>;
}

/// Exclusively owned unit of work.
///
/// Dropping a transaction without calling [`StoreTransaction::commit`] discards
/// every staged write.
pub trait StoreTransaction: NodeStore + DecompositionStore {
    fn commit(self: Box<Self>) -> StoreResult<()>;
}

/// Storage backend that hands out transactions.
pub trait TreeStore: Send + Sync {
    fn begin(&self) -> StoreResult<Box<dyn StoreTransaction + '_>>;

    /// Committed state, for read-only inspection.
    fn snapshot(&self) -> StoreResult<StoreState>;
}

/// Source of formula templates per industry and KPI.
pub trait CategoryProvider: Send + Sync {
    /// Formula text of the template for `tree_type` and `kpi`.
    fn get_formulas(&self, tree_type: &str, kpi: &str) -> ApplicationResult<Vec<String>>;

    /// `industry_class -> industry -> tree types`
    fn get_categories(&self) -> CategoryIndex;

    /// Every category, in catalog order.
    fn list(&self) -> &[Category];
}

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Create parent directories if needed.
    fn ensure_parent(&self, path: &Path) -> io::Result<()>;

    /// Replace `path` with `content` so readers see either the old or the new file.
    fn write_atomic(&self, path: &Path, content: &str) -> io::Result<()>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }

    fn write_atomic(&self, path: &Path, content: &str) -> io::Result<()> {
        use std::io::Write;

        self.ensure_parent(path)?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        // Temp file in the target directory keeps the rename on one device.
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}
