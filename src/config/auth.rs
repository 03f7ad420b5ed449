use anyhow::{anyhow, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub access_token: TokenConfig,
    pub refresh_token: TokenConfig,
    pub bcrypt_rounds: u32,
    /// Adds the `Secure` attribute to auth cookies.
    pub secure_cookies: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    pub secret: String,
    /// Lifetime such as `15m`, `1d` or `10d`.
    pub expiry: String,
}

impl TokenConfig {
    pub fn expiry_duration(&self) -> Result<Duration> {
        parse_expiry(&self.expiry)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token: TokenConfig {
                secret: "access-secret-change-in-production".to_string(),
                expiry: "1d".to_string(),
            },
            refresh_token: TokenConfig {
                secret: "refresh-secret-change-in-production".to_string(),
                expiry: "10d".to_string(),
            },
            bcrypt_rounds: 10,
            secure_cookies: true,
        }
    }
}

const MAX_EXPIRY_DAYS: i64 = 3650;

/// Parse `<n>s|m|h|d` into a duration. A bare number is read as seconds.
pub fn parse_expiry(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(anyhow!("Token expiry cannot be empty"));
    }

    let (digits, unit) = match raw.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&raw[..idx], Some(c)),
        _ => (raw, None),
    };

    let amount: i64 = digits
        .parse()
        .map_err(|_| anyhow!("Invalid token expiry: {raw}"))?;
    if amount <= 0 {
        return Err(anyhow!("Token expiry must be positive: {raw}"));
    }

    let duration = match unit.map(|c| c.to_ascii_lowercase()) {
        None | Some('s') => Duration::try_seconds(amount),
        Some('m') => Duration::try_minutes(amount),
        Some('h') => Duration::try_hours(amount),
        Some('d') => Duration::try_days(amount),
        Some(other) => return Err(anyhow!("Unknown expiry unit '{other}' in {raw}")),
    };

    // Token `exp` is computed as now + expiry, which must stay a valid timestamp
    duration
        .filter(|d| *d <= Duration::days(MAX_EXPIRY_DAYS))
        .ok_or_else(|| anyhow!("Token expiry too large (max {MAX_EXPIRY_DAYS}d): {raw}"))
}
