//! Request authorization.
//!
//! [`Gate::authorize`] is the single place a request's bearer token is turned
//! into a [`Principal`]. Every failure path yields the same [`Unauthorized`]
//! value; the reason is only logged.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRequest, RequestParts};
use axum::http::{header, HeaderMap};

use crate::context::AuthContext;
use crate::err::Error;
use crate::token::{Principal, Role, TokenIssuer};

/// Uniform rejection produced by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unauthorized;

/// Extracts the token from an `Authorization: Bearer <token>` header.
///
/// The scheme is matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(char::is_whitespace)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim_start();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[derive(Debug, Clone)]
pub struct Gate {
    tokens: TokenIssuer,
}

impl Gate {
    pub fn new(tokens: TokenIssuer) -> Self {
        Self { tokens }
    }

    pub fn authorize(&self, headers: &HeaderMap, required: Role) -> Result<Principal, Unauthorized> {
        let token = bearer_token(headers).ok_or_else(|| {
            log::debug!("rejected request: missing or malformed bearer header");
            Unauthorized
        })?;

        let principal = self.tokens.verify(token).map_err(|err| {
            log::debug!("rejected request: {}", err);
            Unauthorized
        })?;

        if principal.role != required {
            log::debug!(
                "rejected request: role {} where {} is required",
                principal.role,
                required
            );
            return Err(Unauthorized);
        }

        Ok(principal)
    }
}

fn authorize_parts<B>(req: &RequestParts<B>, required: Role) -> Result<Principal, Error> {
    let context = req.extensions().get::<Arc<AuthContext>>().ok_or_else(|| {
        log::error!("AuthContext extension is missing from the router");
        Error::InternalError {
            kind: "ConfigurationError",
            message: "Authorization is not configured".to_string(),
        }
    })?;
    Ok(context.gate.authorize(req.headers(), required)?)
}

/// A request authorized with a student token.
#[derive(Debug, Clone)]
pub struct StudentPrincipal(pub Principal);

/// A request authorized with an admin token.
#[derive(Debug, Clone)]
pub struct AdminPrincipal(pub Principal);

#[async_trait]
impl<B: Send> FromRequest<B> for StudentPrincipal {
    type Rejection = Error;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        authorize_parts(req, Role::Student).map(Self)
    }
}

#[async_trait]
impl<B: Send> FromRequest<B> for AdminPrincipal {
    type Rejection = Error;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        authorize_parts(req, Role::Admin).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::SigningSecret;
    use axum::http::HeaderValue;
    use chrono::Duration;

    fn gate(secret: &str) -> (Gate, TokenIssuer) {
        let tokens = TokenIssuer::new(SigningSecret::new(secret).unwrap());
        (Gate::new(tokens.clone()), tokens)
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&headers("bearer   abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers("Bearer")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("Bearerabc")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_authorize_matching_role() {
        let (gate, tokens) = gate("s3cret");
        let principal = Principal::new("stu_1", Role::Student);
        let token = tokens.issue(&principal, Duration::days(30)).unwrap();

        let authorized = gate
            .authorize(&headers(&format!("Bearer {}", token)), Role::Student)
            .unwrap();
        assert_eq!(authorized, principal);
    }

    #[test]
    fn test_student_token_cannot_pass_admin_gate() {
        let (gate, tokens) = gate("s3cret");
        let token = tokens
            .issue(&Principal::new("stu_1", Role::Student), Duration::days(30))
            .unwrap();

        assert_eq!(
            gate.authorize(&headers(&format!("Bearer {}", token)), Role::Admin),
            Err(Unauthorized)
        );
    }

    #[test]
    fn test_rejections_are_indistinguishable() {
        let (gate, tokens) = gate("s3cret");
        let student = tokens
            .issue(&Principal::new("stu_1", Role::Student), Duration::days(30))
            .unwrap();
        let foreign = TokenIssuer::new(SigningSecret::new("other").unwrap())
            .issue(&Principal::new("admin", Role::Admin), Duration::hours(12))
            .unwrap();

        let malformed = gate.authorize(&headers("Bearer not.a.validtoken"), Role::Student);
        let wrong_role = gate.authorize(&headers(&format!("Bearer {}", student)), Role::Admin);
        let wrong_secret = gate.authorize(&headers(&format!("Bearer {}", foreign)), Role::Admin);
        let missing = gate.authorize(&HeaderMap::new(), Role::Student);

        assert_eq!(malformed, Err(Unauthorized));
        assert_eq!(malformed, wrong_role);
        assert_eq!(malformed, wrong_secret);
        assert_eq!(malformed, missing);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let (gate, tokens) = gate("s3cret");
        let token = tokens
            .issue_at(
                &Principal::new("admin", Role::Admin),
                Duration::hours(12),
                chrono::Utc::now() - Duration::hours(13),
            )
            .unwrap();

        assert_eq!(
            gate.authorize(&headers(&format!("Bearer {}", token)), Role::Admin),
            Err(Unauthorized)
        );
    }
}
