// Library exports for videotube-backend
pub mod config;
pub mod database;
pub mod errors;
pub mod handlers;
pub mod media;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod routes;
pub mod utils;

use std::sync::Arc;

// Re-export commonly used types
pub use config::Config;
pub use database::{create_database, PlatformDatabase};
pub use errors::{AppError, AppResult};
pub use media::{create_media_host, MediaHost};
pub use routes::{create_router, ApiDoc};
pub use utils::{PasswordManager, TokenManager};

/// Shared handles every request handler receives
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub database: Arc<dyn PlatformDatabase>,
    pub media: Arc<dyn MediaHost>,
    pub tokens: Arc<TokenManager>,
    pub passwords: PasswordManager,
}

impl AppState {
    pub fn new(
        config: Config,
        database: Arc<dyn PlatformDatabase>,
        media: Arc<dyn MediaHost>,
    ) -> anyhow::Result<Self> {
        let tokens = TokenManager::new(&config.auth)?;
        let passwords = PasswordManager::new(config.auth.bcrypt_rounds);
        Ok(Self {
            config: Arc::new(config),
            database,
            media,
            tokens: Arc::new(tokens),
            passwords,
        })
    }
}
