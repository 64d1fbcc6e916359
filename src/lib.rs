//! Authenticated student/admin API.
//!
//! The credential and token core lives in [`password`], [`token`] and
//! [`gate`]; [`auth`] holds the HTTP handlers built on top of it.

pub mod auth;
pub mod config;
pub mod context;
pub mod db;
pub mod encoding;
pub mod err;
pub mod gate;
pub mod models;
pub mod password;
pub mod token;

use std::sync::Arc;

use axum::handler::Handler;
use axum::routing::{get, post};
use axum::{Extension, Router};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;

pub use crate::context::AuthContext;
pub use crate::err::Error;
use crate::err::{Fine, Maybe, Nothing};

pub type Payload<T> = Result<Maybe<T>, Error>;

pub fn proceeds<V>(value: V) -> Payload<V>
where
    V: Serialize,
{
    Ok(Fine(value))
}

pub fn breaks<V>(err: Error) -> Payload<V>
where
    V: Serialize,
{
    Ok(Nothing(err))
}

/// Builds the HTTP router with its shared database pool and auth state.
pub fn router(pg: PgPool, context: Arc<AuthContext>) -> Router {
    Router::new()
        .route("/api", get(auth::api_root))
        .route("/api/student/register", post(auth::register_student))
        .route("/api/student/login", post(auth::login_student))
        .route("/api/student/me", get(auth::student_me))
        .route("/api/admin/login", post(auth::login_admin))
        .route("/api/admin/students", get(auth::list_students))
        .fallback(err::handler404.into_service())
        .layer(
            ServiceBuilder::new()
                .layer(Extension(pg))
                .layer(Extension(context)),
        )
}
