use std::sync::Arc;

use chrono::Duration;

use crate::config::{AdminCredentials, Config, TokenTtls};
use crate::encoding::constant_time_eq;
use crate::gate::Gate;
use crate::password::{HashError, PasswordHasher};
use crate::token::{Principal, Role, SigningSecret, TokenError, TokenIssuer};

/// Read-only authentication state shared by every request handler.
#[derive(Debug)]
pub struct AuthContext {
    pub hasher: PasswordHasher,
    pub tokens: TokenIssuer,
    pub gate: Gate,
    pub ttls: TokenTtls,
    pub admin: Option<AdminCredentials>,
    decoy_hash: String,
}

impl AuthContext {
    pub fn new(
        secret: SigningSecret,
        ttls: TokenTtls,
        admin: Option<AdminCredentials>,
    ) -> Result<Self, HashError> {
        Self::with_hasher(PasswordHasher::default(), secret, ttls, admin)
    }

    pub fn from_config(config: &Config) -> Result<Arc<Self>, HashError> {
        Self::new(config.secret.clone(), config.ttls, config.admin.clone()).map(Arc::new)
    }

    pub(crate) fn with_hasher(
        hasher: PasswordHasher,
        secret: SigningSecret,
        ttls: TokenTtls,
        admin: Option<AdminCredentials>,
    ) -> Result<Self, HashError> {
        let tokens = TokenIssuer::new(secret);
        let decoy_hash = hasher.hash("decoy password")?.to_string();
        Ok(Self {
            hasher,
            gate: Gate::new(tokens.clone()),
            tokens,
            ttls,
            admin,
            decoy_hash,
        })
    }

    pub fn ttl_for(&self, role: Role) -> Duration {
        match role {
            Role::Student => self.ttls.student,
            Role::Admin => self.ttls.admin,
        }
    }

    /// Issues a token for `principal` with its role's configured lifetime.
    pub fn issue_token(&self, principal: &Principal) -> Result<String, TokenError> {
        self.tokens.issue(principal, self.ttl_for(principal.role))
    }

    /// Verifies a password against an optional stored hash.
    ///
    /// When no account was found the decoy hash is checked instead, so an
    /// unknown login costs the same as a wrong password.
    pub async fn check_password(&self, password: &str, stored: Option<&str>) -> bool {
        let (stored, known) = match stored {
            Some(stored) => (stored.to_string(), true),
            None => (self.decoy_hash.clone(), false),
        };
        let matches = self
            .hasher
            .verify_blocking(password.to_string(), stored)
            .await;
        matches && known
    }

    /// Compares submitted admin credentials against the configured pair.
    ///
    /// Returns `None` when no admin credentials are configured.
    pub fn check_admin(&self, user: &str, pass: &str) -> Option<bool> {
        let admin = self.admin.as_ref()?;
        let user_ok = constant_time_eq(user.as_bytes(), admin.user.as_bytes());
        let pass_ok = constant_time_eq(pass.as_bytes(), admin.pass.as_bytes());
        Some(user_ok & pass_ok)
    }
}

#[cfg(test)]
pub(crate) fn test_context(admin: Option<AdminCredentials>) -> AuthContext {
    AuthContext::with_hasher(
        PasswordHasher::with_iterations(1_000),
        SigningSecret::new("test secret").unwrap(),
        TokenTtls::default(),
        admin,
    )
    .unwrap()
}
