use anyhow::{anyhow, Result};

use crate::config::Config;

/// Startup checks that refuse obviously broken configuration.
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_database(config, &mut errors);
        Self::validate_auth(config, &mut errors);
        Self::validate_media(config, &mut errors);

        if !errors.is_empty() {
            return Err(anyhow!(
                "Configuration validation failed:\n{}",
                errors.join("\n")
            ));
        }

        Ok(())
    }

    fn validate_database(config: &Config, errors: &mut Vec<String>) {
        match config.database.r#type.as_str() {
            "mongodb" => {
                if config.database.uri.trim().is_empty() {
                    errors.push("MongoDB URI cannot be empty".to_string());
                }
                if config.database.name.trim().is_empty() {
                    errors.push("Database name cannot be empty".to_string());
                }
            }
            "memory" => {}
            other => errors.push(format!("Unsupported database type: {other}")),
        }
    }

    fn validate_auth(config: &Config, errors: &mut Vec<String>) {
        let auth = &config.auth;

        if auth.access_token.secret.is_empty() {
            errors.push("Access token secret cannot be empty".to_string());
        }
        if auth.refresh_token.secret.is_empty() {
            errors.push("Refresh token secret cannot be empty".to_string());
        }
        if auth.access_token.secret == auth.refresh_token.secret {
            errors.push("Access and refresh token secrets must differ".to_string());
        }
        if let Err(e) = auth.access_token.expiry_duration() {
            errors.push(format!("Access token expiry: {e}"));
        }
        if let Err(e) = auth.refresh_token.expiry_duration() {
            errors.push(format!("Refresh token expiry: {e}"));
        }
        if !(4..=31).contains(&auth.bcrypt_rounds) {
            errors.push("bcrypt rounds must be between 4 and 31".to_string());
        }
    }

    fn validate_media(config: &Config, errors: &mut Vec<String>) {
        match config.media.provider.as_str() {
            "cloudinary" => match &config.media.cloudinary {
                Some(c) if !c.cloud_name.is_empty()
                    && !c.api_key.is_empty()
                    && !c.api_secret.is_empty() => {}
                _ => errors.push(
                    "Cloudinary provider requires cloud_name, api_key and api_secret".to_string(),
                ),
            },
            "local" => {
                if config.media.local.directory.trim().is_empty() {
                    errors.push("Local media directory cannot be empty".to_string());
                }
            }
            other => errors.push(format!("Unsupported media provider: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::media::CloudinaryConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ConfigValidator::validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_empty_database_name_rejected() {
        let mut config = Config::default();
        config.database.name = "".to_string();
        let err = ConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("Database name"));
    }

    #[test]
    fn test_memory_database_skips_uri_checks() {
        let mut config = Config::default();
        config.database.r#type = "memory".to_string();
        config.database.uri = "".to_string();
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_shared_token_secret_rejected() {
        let mut config = Config::default();
        config.auth.refresh_token.secret = config.auth.access_token.secret.clone();
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_oversized_token_expiry_rejected() {
        let mut config = Config::default();
        config.auth.refresh_token.expiry = "99999999999999d".to_string();
        let err = ConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("Refresh token expiry"));
    }

    #[test]
    fn test_cloudinary_requires_credentials() {
        let mut config = Config::default();
        config.media.provider = "cloudinary".to_string();
        assert!(ConfigValidator::validate(&config).is_err());

        config.media.cloudinary = Some(CloudinaryConfig {
            cloud_name: "demo".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            folder: None,
        });
        assert!(ConfigValidator::validate(&config).is_ok());
    }
}
