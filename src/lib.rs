pub mod config;
pub mod error;
pub mod inference;
pub mod models;
pub mod routes;
pub mod store;

use config::Config;
use store::ModelStore;

/// State shared by all workers. Built once from [`Config`] at startup.
pub struct AppState {
    pub store: ModelStore,
}

impl AppState {
    pub fn new(store: ModelStore) -> Self {
        AppState { store }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(ModelStore::new(&config.model_path, config.load_policy))
    }
}
