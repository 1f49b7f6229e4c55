//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use tracing::debug;

use crate::application::services::GenerationService;
use crate::config::{Settings, StoreBackend};
use crate::infrastructure::catalog::CatalogProvider;
use crate::infrastructure::error::InfraResult;
use crate::infrastructure::store::{FileStore, MemoryStore};
use crate::infrastructure::traits::{CategoryProvider, FileSystem, RealFileSystem, TreeStore};

/// Container holding the configured store, catalog and services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Persistence gateway
    pub store: Arc<dyn TreeStore>,

    /// Formula templates
    pub catalog: Arc<dyn CategoryProvider>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> InfraResult<Self> {
        Self::with_fs(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container on a custom filesystem (for testing).
    pub fn with_fs(settings: Settings, fs: Arc<dyn FileSystem>) -> InfraResult<Self> {
        let store: Arc<dyn TreeStore> = match settings.store.backend {
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
            StoreBackend::File => Arc::new(FileStore::new(settings.store.path.clone(), fs.clone())),
        };
        debug!("store backend: {:?}", settings.store.backend);

        let catalog = match &settings.catalog {
            Some(path) => CatalogProvider::load(path, fs.as_ref())?,
            None => CatalogProvider::builtin()?,
        };

        Ok(Self::with_deps(settings, fs, store, Arc::new(catalog)))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        store: Arc<dyn TreeStore>,
        catalog: Arc<dyn CategoryProvider>,
    ) -> Self {
        let settings = Arc::new(settings);

        Self {
            settings,
            fs,
            store,
            catalog,
        }
    }

    pub fn generation_service(&self) -> GenerationService {
        GenerationService::new(self.store.clone()).with_commit_retries(self.settings.commit_retries)
    }
}
