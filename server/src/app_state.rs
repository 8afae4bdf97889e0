use std::sync::Arc;

use crate::archive::Archive;
use crate::config::ServerConfig;
use crate::plotgen::PlotCatalog;

#[derive(Clone)]
pub struct AppState {
    pub archive: Arc<Archive>,
    pub plots: Arc<PlotCatalog>,
}

pub fn build_app_state(config: &ServerConfig) -> AppState {
    AppState {
        archive: Arc::new(Archive::new(config.database.clone())),
        plots: Arc::new(PlotCatalog::default()),
    }
}
