//! Process configuration, read once from the environment at startup.

use std::fmt;
use std::net::SocketAddr;

use anyhow::{anyhow, bail, Context};
use chrono::Duration;

use crate::token::SigningSecret;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_STUDENT_TOKEN_TTL_SECS: i64 = 60 * 60 * 24 * 30;
pub const DEFAULT_ADMIN_TOKEN_TTL_SECS: i64 = 60 * 60 * 12;

/// Lifetimes of freshly issued tokens, per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenTtls {
    pub student: Duration,
    pub admin: Duration,
}

impl Default for TokenTtls {
    fn default() -> Self {
        Self {
            student: Duration::seconds(DEFAULT_STUDENT_TOKEN_TTL_SECS),
            admin: Duration::seconds(DEFAULT_ADMIN_TOKEN_TTL_SECS),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct AdminCredentials {
    pub user: String,
    pub pass: String,
}

impl fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("user", &self.user)
            .field("pass", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub secret: SigningSecret,
    pub ttls: TokenTtls,
    pub admin: Option<AdminCredentials>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup("JWT_SECRET").ok_or_else(|| anyhow!("JWT_SECRET is not set"))?;
        let secret = SigningSecret::new(secret).context("JWT_SECRET is invalid")?;

        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| anyhow!("DATABASE_URL is not set"))?;

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("BIND_ADDR is not a socket address")?;

        let ttls = TokenTtls {
            student: ttl(&lookup, "STUDENT_TOKEN_TTL_SECS", DEFAULT_STUDENT_TOKEN_TTL_SECS)?,
            admin: ttl(&lookup, "ADMIN_TOKEN_TTL_SECS", DEFAULT_ADMIN_TOKEN_TTL_SECS)?,
        };

        let admin = match (lookup("ADMIN_USER"), lookup("ADMIN_PASS")) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => {
                Some(AdminCredentials { user, pass })
            }
            _ => None,
        };

        Ok(Self {
            bind_addr,
            database_url,
            secret,
            ttls,
            admin,
        })
    }
}

fn ttl<F>(lookup: &F, key: &str, default: i64) -> anyhow::Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let secs = match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .with_context(|| format!("{} is not an integer", key))?,
        None => default,
    };
    if secs <= 0 {
        bail!("{} must be positive", key);
    }
    Ok(Duration::seconds(secs))
}
