use anyhow::{anyhow, Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::auth::AuthConfig;
use crate::models::{TokenPair, User};

const ACCESS: &str = "access";
const REFRESH: &str = "refresh";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessClaims {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub user_name: String,
    pub full_name: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
    #[serde(rename = "token_type")]
    pub token_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    #[serde(rename = "_id")]
    pub id: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
    pub token_type: String,
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry: Duration,
}

impl SigningKeys {
    fn new(secret: &str, expiry: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_ref()),
            decoding: DecodingKey::from_secret(secret.as_ref()),
            expiry,
        }
    }
}

/// Issues and verifies access and refresh tokens, each with its own secret
pub struct TokenManager {
    access: SigningKeys,
    refresh: SigningKeys,
}

impl TokenManager {
    pub fn new(config: &AuthConfig) -> Result<Self> {
        Ok(Self {
            access: SigningKeys::new(
                &config.access_token.secret,
                config.access_token.expiry_duration()?,
            ),
            refresh: SigningKeys::new(
                &config.refresh_token.secret,
                config.refresh_token.expiry_duration()?,
            ),
        })
    }

    pub fn access_token_expiry(&self) -> Duration {
        self.access.expiry
    }

    pub fn refresh_token_expiry(&self) -> Duration {
        self.refresh.expiry
    }

    /// Generate an access token for the user
    pub fn generate_access_token(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = AccessClaims {
            id: user.id.to_hex(),
            email: user.email.clone(),
            user_name: user.user_name.clone(),
            full_name: user.full_name.clone(),
            exp: (now + self.access.expiry).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type: ACCESS.to_string(),
        };

        encode(&Header::default(), &claims, &self.access.encoding)
            .context("Failed to generate access token")
    }

    /// Generate a refresh token for the user
    pub fn generate_refresh_token(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = RefreshClaims {
            id: user.id.to_hex(),
            exp: (now + self.refresh.expiry).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type: REFRESH.to_string(),
        };

        encode(&Header::default(), &claims, &self.refresh.encoding)
            .context("Failed to generate refresh token")
    }

    /// Generate both access and refresh tokens
    pub fn generate_token_pair(&self, user: &User) -> Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.generate_access_token(user)?,
            refresh_token: self.generate_refresh_token(user)?,
        })
    }

    /// Validate signature, expiry and token type of an access token
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims> {
        let token_data = decode::<AccessClaims>(token, &self.access.decoding, &Validation::default())
            .context("Invalid access token")?;

        if token_data.claims.token_type != ACCESS {
            return Err(anyhow!("Invalid token type"));
        }
        Ok(token_data.claims)
    }

    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims> {
        let token_data =
            decode::<RefreshClaims>(token, &self.refresh.decoding, &Validation::default())
                .context("Invalid refresh token")?;

        if token_data.claims.token_type != REFRESH {
            return Err(anyhow!("Invalid token type"));
        }
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::auth::TokenConfig;
    use crate::models::NewUser;

    fn create_test_manager() -> TokenManager {
        let config = AuthConfig {
            access_token: TokenConfig {
                secret: "access_secret_key_that_is_long_enough".to_string(),
                expiry: "15m".to_string(),
            },
            refresh_token: TokenConfig {
                secret: "refresh_secret_key_that_is_long_enough".to_string(),
                expiry: "10d".to_string(),
            },
            ..Default::default()
        };
        TokenManager::new(&config).unwrap()
    }

    fn test_user() -> User {
        User::new(NewUser {
            user_name: "tester".to_string(),
            full_name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            password_hash: "hash".to_string(),
            avatar: "http://a".to_string(),
            cover_image: String::new(),
        })
    }

    #[test]
    fn test_generate_token_pair() {
        let manager = create_test_manager();
        let pair = manager.generate_token_pair(&test_user()).unwrap();

        assert!(!pair.access_token.is_empty());
        assert!(pair.access_token.contains('.'));
        assert_ne!(pair.access_token, pair.refresh_token);
    }

    #[test]
    fn test_verify_access_token() {
        let manager = create_test_manager();
        let user = test_user();
        let token = manager.generate_access_token(&user).unwrap();

        let claims = manager.verify_access_token(&token).unwrap();
        assert_eq!(claims.id, user.id.to_hex());
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.user_name, "tester");
        assert_eq!(claims.token_type, "access");
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn test_tokens_are_not_interchangeable() {
        let manager = create_test_manager();
        let user = test_user();
        let pair = manager.generate_token_pair(&user).unwrap();

        assert!(manager.verify_access_token(&pair.refresh_token).is_err());
        assert!(manager.verify_refresh_token(&pair.access_token).is_err());
        assert_eq!(
            manager.verify_refresh_token(&pair.refresh_token).unwrap().id,
            user.id.to_hex()
        );
    }

    #[test]
    fn test_invalid_token() {
        let manager = create_test_manager();
        assert!(manager.verify_access_token("invalid.token.here").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let manager = create_test_manager();
        let now = Utc::now();
        let claims = AccessClaims {
            id: "id".to_string(),
            email: "e".to_string(),
            user_name: "u".to_string(),
            full_name: "f".to_string(),
            exp: (now - Duration::hours(2)).timestamp(),
            iat: (now - Duration::hours(3)).timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type: ACCESS.to_string(),
        };
        let token = encode(&Header::default(), &claims, &manager.access.encoding).unwrap();

        assert!(manager.verify_access_token(&token).is_err());
    }
}
