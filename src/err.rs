#![allow(non_snake_case)]

use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;

use serde::Serialize;

use crate::gate::Unauthorized;

pub async fn handler404(path: Uri) -> Error {
    Error::NotFound {
        message: format!("Invalid path: {}", path),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Maybe<T> {
    Nothing(Error),
    Fine(Success<T>),
}

pub fn Fine<V>(v: V) -> Maybe<V>
where
    V: Serialize,
{
    Maybe::Fine(Success::of(v))
}

pub fn Nothing<V>(err: Error) -> Maybe<V> {
    Maybe::Nothing(err)
}

#[derive(Debug, Clone, Serialize)]
pub struct Success<V> {
    ok: bool,
    #[serde(flatten)]
    value: V,
}

impl<T> IntoResponse for Maybe<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        match self {
            Maybe::Nothing(err) => err.into_response(),
            Maybe::Fine(success) => Json::into_response(Json(success)),
        }
    }
}

impl<V: Serialize> Success<V> {
    pub fn of(value: V) -> Self {
        Self { ok: true, value }
    }
}

/// Errors surfaced to HTTP clients.
///
/// Every authentication or authorization failure becomes `Unauthorized` with
/// no further detail.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "error")]
pub enum Error {
    NotFound { message: String },
    InvalidPayload { message: String },
    Unauthorized,
    UserAlreadyExists { message: String },
    InternalError { kind: &'static str, message: String },
}

impl Error {
    pub fn invalid<S: Into<String>>(msg: S) -> Error {
        Error::InvalidPayload {
            message: msg.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::InvalidPayload { .. } => StatusCode::BAD_REQUEST,
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::UserAlreadyExists { .. } => StatusCode::CONFLICT,
            Error::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct Failure<'a> {
    ok: bool,
    #[serde(flatten)]
    error: &'a Error,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let body = Failure {
            ok: false,
            error: &self,
        };
        (self.status(), Json::into_response(Json(body))).into_response()
    }
}

impl From<Unauthorized> for Error {
    fn from(_: Unauthorized) -> Self {
        Self::Unauthorized
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidPayload {
            message: rejection.to_string(),
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        log::error!("database error: {}", err);
        Self::InternalError {
            kind: "DatabaseError",
            message: "Database request failed".to_string(),
        }
    }
}

impl From<crate::password::HashError> for Error {
    fn from(err: crate::password::HashError) -> Self {
        log::error!("password hashing failed: {}", err);
        Self::InternalError {
            kind: "HashError",
            message: "Could not hash password".to_string(),
        }
    }
}

impl From<crate::token::TokenError> for Error {
    fn from(err: crate::token::TokenError) -> Self {
        log::error!("token issuance failed: {}", err);
        Self::InternalError {
            kind: "TokenError",
            message: "Could not issue token".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_shape() {
        let body = serde_json::to_value(Failure {
            ok: false,
            error: &Error::invalid("missing password"),
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"ok": false, "error": "InvalidPayload", "message": "missing password"})
        );

        let body = serde_json::to_value(Failure {
            ok: false,
            error: &Error::Unauthorized,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"ok": false, "error": "Unauthorized"}));
    }

    #[test]
    fn test_success_body_shape() {
        #[derive(Serialize)]
        struct Token {
            token: &'static str,
        }
        let body = serde_json::to_value(Success::of(Token { token: "abc" })).unwrap();
        assert_eq!(body, serde_json::json!({"ok": true, "token": "abc"}));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(Error::invalid("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            Error::UserAlreadyExists {
                message: "x".into()
            }
            .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            Error::from(sqlx::Error::RowNotFound).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
