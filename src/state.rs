use crate::config::AppConfig;
use crate::store::DocumentStore;
use crate::tracker::Tracker;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tracker: Tracker,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            config: Arc::new(config),
            tracker: Tracker::new(store),
        }
    }
}
