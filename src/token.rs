//! Stateless signed bearer tokens.
//!
//! A token is `base64url(header).base64url(claims).base64url(signature)` where
//! the signature is HMAC-SHA-256 over the first two segments. Tokens are never
//! stored server side; expiry is the only way one stops being valid.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::encoding::{constant_time_eq, from_b64url, to_b64url};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "admin" => Ok(Role::Admin),
            _ => Err(TokenError::Claims),
        }
    }
}

/// The authenticated identity carried by a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub subject_id: String,
    pub role: Role,
}

impl Principal {
    pub fn new<S: Into<String>>(subject_id: S, role: Role) -> Self {
        Self {
            subject_id: subject_id.into(),
            role,
        }
    }
}

/// Reasons a token is refused. Only ever logged; callers above the gate see a
/// single unauthorized outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token does not have three segments")]
    Malformed,
    #[error("token signature mismatch")]
    BadSignature,
    #[error("token claims could not be decoded")]
    Claims,
    #[error("token expired")]
    Expired,
    #[error("token could not be encoded")]
    Encode,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("signing secret must not be empty")]
pub struct EmptySecret;

/// Process-wide HMAC key. Its `Debug` output never shows the key.
#[derive(Clone)]
pub struct SigningSecret {
    mac: HmacSha256,
}

impl SigningSecret {
    pub fn new<B: AsRef<[u8]>>(secret: B) -> Result<Self, EmptySecret> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(EmptySecret);
        }
        let mac = HmacSha256::new_from_slice(secret).map_err(|_| EmptySecret)?;
        Ok(Self { mac })
    }

    fn sign(&self, data: &[u8]) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

#[derive(Debug, Serialize)]
struct Header {
    alg: &'static str,
    typ: &'static str,
}

const HEADER: Header = Header {
    alg: "HS256",
    typ: "JWT",
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Issues and verifies tokens under one [`SigningSecret`].
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    secret: SigningSecret,
}

impl TokenIssuer {
    pub fn new(secret: SigningSecret) -> Self {
        Self { secret }
    }

    pub fn issue(&self, principal: &Principal, ttl: Duration) -> Result<String, TokenError> {
        self.issue_at(principal, ttl, Utc::now())
    }

    /// Issues a token as if the current time were `now`.
    pub fn issue_at(
        &self,
        principal: &Principal,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let iat = now.timestamp();
        let claims = Claims {
            sub: principal.subject_id.clone(),
            role: principal.role,
            iat,
            exp: Some(iat + ttl.num_seconds()),
        };

        let header = serde_json::to_vec(&HEADER).map_err(|_| TokenError::Encode)?;
        let payload = serde_json::to_vec(&claims).map_err(|_| TokenError::Encode)?;
        let signing_input = format!("{}.{}", to_b64url(header), to_b64url(payload));
        let signature = to_b64url(self.secret.sign(signing_input.as_bytes()));

        Ok(format!("{}.{}", signing_input, signature))
    }

    pub fn verify(&self, token: &str) -> Result<Principal, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verifies a token as if the current time were `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Principal, TokenError> {
        let segments: Vec<&str> = token.split('.').collect();
        let (header, payload, signature) = match segments.as_slice() {
            [header, payload, signature] => (*header, *payload, *signature),
            _ => return Err(TokenError::Malformed),
        };

        let signing_input = format!("{}.{}", header, payload);
        let expected = to_b64url(self.secret.sign(signing_input.as_bytes()));
        if !constant_time_eq(expected.as_bytes(), signature.as_bytes()) {
            return Err(TokenError::BadSignature);
        }

        let payload = from_b64url(payload).map_err(|_| TokenError::Claims)?;
        let claims: Claims = serde_json::from_slice(&payload).map_err(|_| TokenError::Claims)?;

        if let Some(exp) = claims.exp {
            if now.timestamp() > exp {
                return Err(TokenError::Expired);
            }
        }

        Ok(Principal {
            subject_id: claims.sub,
            role: claims.role,
        })
    }
}
