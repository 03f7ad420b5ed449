use anyhow::{Context, Result};
use bcrypt::{hash, verify};

#[derive(Debug, Clone)]
pub struct PasswordManager {
    cost: u32,
}

impl PasswordManager {
    /// Create a new password manager with the specified bcrypt cost
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a password using bcrypt
    pub fn hash_password(&self, password: &str) -> Result<String> {
        hash(password, self.cost).context("Failed to hash password")
    }

    /// Verify a password against its hash
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        verify(password, hash).context("Failed to verify password")
    }

    /// Hash on the blocking pool; bcrypt is CPU bound
    pub async fn hash_password_blocking(&self, password: String) -> Result<String> {
        let manager = self.clone();
        tokio::task::spawn_blocking(move || manager.hash_password(&password))
            .await
            .context("Password hashing task failed")?
    }

    pub async fn verify_password_blocking(&self, password: String, hash: String) -> Result<bool> {
        let manager = self.clone();
        tokio::task::spawn_blocking(move || manager.verify_password(&password, &hash))
            .await
            .context("Password verification task failed")?
    }
}
