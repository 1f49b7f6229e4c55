//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/kpitree/kpitree.toml`
//! 3. Local config: `<dir>/.kpitree.toml`
//! 4. Environment variables: `KPITREE_*` prefix (`__` separates nested keys)

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

/// Where generated forests are persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Discarded when the process exits
    Memory,
    /// JSON document at `store.path`
    #[default]
    File,
}

/// Persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::File,
            path: default_store_path(),
        }
    }
}

/// Unified configuration for kpitree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Category catalog (TOML); the built-in catalog is used when unset
    pub catalog: Option<PathBuf>,
    /// Rebuilds of a batch whose commit lost a label race
    pub commit_retries: u32,
    pub store: StoreConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalog: None,
            commit_retries: 1,
            store: StoreConfig::default(),
        }
    }
}

fn default_store_path() -> PathBuf {
    ProjectDirs::from("", "", "kpitree")
        .map(|dirs| dirs.data_dir().join("forest.json"))
        .unwrap_or_else(|| PathBuf::from("~/.kpitree/forest.json"))
}

/// Get the XDG config directory for kpitree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "kpitree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("kpitree.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".kpitree.toml")
}

/// Expand `~`, `$VAR` and `${VAR}` in a path string.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory searched for `.kpitree.toml`
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let global = global_config_path();
        let local = local_dir.map(local_config_path);
        Self::load_from(global.as_deref(), local.as_deref())
    }

    /// Load settings from explicit global and local files (either may be missing).
    pub fn load_from(global: Option<&Path>, local: Option<&Path>) -> Result<Self, ApplicationError> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("store.backend", "file")
            .map_err(config_err)?
            .set_default(
                "store.path",
                defaults.store.path.to_string_lossy().to_string(),
            )
            .map_err(config_err)?
            .set_default("commit_retries", i64::from(defaults.commit_retries))
            .map_err(config_err)?;

        for path in [global, local].into_iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.to_path_buf()).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("KPITREE")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_err)?;
        let mut settings: Self = config.try_deserialize().map_err(config_err)?;
        settings.expand_paths();
        Ok(settings)
    }

    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.store.path.to_string_lossy().as_ref());
        self.store.path = PathBuf::from(expanded);
        self.catalog = self
            .catalog
            .take()
            .map(|catalog| PathBuf::from(expand_env_vars(catalog.to_string_lossy().as_ref())));
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# kpitree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/kpitree/kpitree.toml
#   Local:  ./.kpitree.toml
#   Env:    KPITREE_* environment variables, e.g. KPITREE_STORE__BACKEND=memory

# Rebuild a batch this many times when its commit loses a race on a node label
# commit_retries = 1

# Category catalog with [[category]] tables; the built-in catalog is used when unset
# catalog = "~/kpi/catalog.toml"

[store]
# "file" persists to `path`, "memory" forgets everything on exit
# backend = "file"
# path = "~/.local/share/kpitree/forest.json"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
