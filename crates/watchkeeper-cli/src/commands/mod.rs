pub mod clear;
pub mod config;
pub mod list;
pub mod owners;
pub mod prompts;
pub mod serve;
pub mod status;
pub mod sync;

use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::sync::Arc;
use watchkeeper_config::{Config, CredentialStore, PathManager};
use watchkeeper_core::{EngineOptions, JsonSnapshotStore, ReconciliationEngine, SnapshotStore};
use watchkeeper_sources::{Secrets, SourceSet};

/// Config, credentials and paths resolved once per invocation
pub struct AppContext {
    pub paths: PathManager,
    pub config: Config,
    pub credentials: CredentialStore,
}

impl AppContext {
    pub fn load() -> Result<Self> {
        let paths = PathManager::default();
        let config = Config::load_or_default(&paths.config_file())
            .map_err(|e| eyre!("Failed to load config from {}: {}", paths.config_file().display(), e))?;
        config
            .validate()
            .map_err(|e| eyre!("Invalid configuration: {}", e))?;

        let mut credentials = CredentialStore::new(paths.credentials_file());
        credentials
            .load()
            .map_err(|e| eyre!("Failed to load credentials from {}: {}", paths.credentials_file().display(), e))?;

        Ok(Self {
            paths,
            config,
            credentials,
        })
    }

    pub fn open_store(&self) -> Result<Arc<JsonSnapshotStore>> {
        let store = JsonSnapshotStore::new(self.paths.snapshot_dir())
            .map_err(|e| eyre!("Failed to open snapshot at {}: {}", self.paths.snapshot_dir().display(), e))?;
        Ok(Arc::new(store))
    }

    /// Wire the production collaborators around `store`
    pub fn build_engine(&self, store: Arc<dyn SnapshotStore>) -> Result<ReconciliationEngine> {
        let sources = SourceSet::build(&self.config, &Secrets::from_store(&self.credentials))
            .map_err(|e| eyre!("{:#}", e))?;

        let options = EngineOptions {
            server_name: self.config.server.name.clone(),
            reference_url_base: self.config.presentation.reference_url_base.clone(),
        };

        Ok(
            ReconciliationEngine::new(sources.watchlist, sources.libraries, store, options)
                .with_ratings(sources.ratings)
                .with_notifier(sources.notifier),
        )
    }
}
