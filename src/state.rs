use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::Config;
use crate::templates::Templates;

/// Shared, read-only handles every handler needs.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub templates: Arc<Templates>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config) -> Result<Self, tera::Error> {
        Ok(Self {
            db,
            templates: Arc::new(Templates::new()?),
            config: Arc::new(config),
        })
    }
}
