use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

pub mod auth;
pub mod database;
pub mod media;
pub mod server;
pub mod validator;

use crate::observability::logging::{LogFormat, LoggingConfig};
use auth::AuthConfig;
use database::DatabaseConfig;
use media::MediaConfig;
use server::ServerConfig;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub media: MediaConfig,
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_env_and_file() -> Result<Self> {
        // .env is optional; a missing file is not an error
        let _ = dotenvy::dotenv();

        // Load from config.yml if it exists
        let mut config = if std::path::Path::new("config.yml").exists() {
            let config_str =
                std::fs::read_to_string("config.yml").context("Failed to read config.yml")?;
            serde_yaml::from_str::<Config>(&config_str).context("Failed to parse config.yml")?
        } else {
            Config::default()
        };

        config.apply_env_overrides()?;
        validator::ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Override file/default values with environment variables.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(host) = env::var("SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("PORT").or_else(|_| env::var("SERVER_PORT")) {
            self.server.port = port.parse().context("Invalid PORT")?;
        }
        if let Ok(origin) = env::var("CORS_ORIGIN") {
            self.server.cors_origin = Some(origin);
        }

        if let Ok(db_type) = env::var("DATABASE_TYPE") {
            self.database.r#type = db_type;
        }
        if let Ok(uri) = env::var("MONGODB_URI") {
            self.database.uri = uri;
        }
        if let Ok(name) = env::var("DB_NAME") {
            self.database.name = name;
        }

        if let Ok(secret) = env::var("ACCESS_TOKEN_SECRET") {
            self.auth.access_token.secret = secret;
        }
        if let Ok(expiry) = env::var("ACCESS_TOKEN_EXPIRY") {
            self.auth.access_token.expiry = expiry;
        }
        if let Ok(secret) = env::var("REFRESH_TOKEN_SECRET") {
            self.auth.refresh_token.secret = secret;
        }
        if let Ok(expiry) = env::var("REFRESH_TOKEN_EXPIRY") {
            self.auth.refresh_token.expiry = expiry;
        }
        if let Ok(rounds) = env::var("BCRYPT_ROUNDS") {
            self.auth.bcrypt_rounds = rounds.parse().context("Invalid BCRYPT_ROUNDS")?;
        }

        if let Ok(provider) = env::var("MEDIA_PROVIDER") {
            self.media.provider = provider;
        }
        if let Ok(dir) = env::var("MEDIA_LOCAL_DIR") {
            self.media.local.directory = dir;
        }
        let cloud_name = env::var("CLOUDINARY_CLOUD_NAME").ok();
        let api_key = env::var("CLOUDINARY_API_KEY").ok();
        let api_secret = env::var("CLOUDINARY_API_SECRET").ok();
        if cloud_name.is_some() || api_key.is_some() || api_secret.is_some() {
            let cloudinary = self.media.cloudinary.get_or_insert_with(Default::default);
            if let Some(cloud_name) = cloud_name {
                cloudinary.cloud_name = cloud_name;
            }
            if let Some(api_key) = api_key {
                cloudinary.api_key = api_key;
            }
            if let Some(api_secret) = api_secret {
                cloudinary.api_secret = api_secret;
            }
        }

        if let Ok(format) = env::var("LOG_FORMAT") {
            self.logging.format = format.parse::<LogFormat>().map_err(anyhow::Error::msg)?;
        }

        Ok(())
    }
}
