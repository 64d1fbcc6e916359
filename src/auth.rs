use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use sqlx::PgPool;
use uuid::Uuid;

use crate::context::AuthContext;
use crate::gate::{AdminPrincipal, StudentPrincipal};
use crate::models::{StudentData, StudentProfile};
use crate::token::{Principal, Role};
use crate::{breaks, proceeds, Error, Payload};

const MIN_PASSWORD_LEN: usize = 4;
const UNIQUE_VIOLATION: &str = "23505";

pub async fn api_root() -> Payload<ApiInfo> {
    proceeds(ApiInfo { name: "BTEC API" })
}

pub async fn register_student(
    Extension(pg): Extension<PgPool>,
    Extension(auth): Extension<Arc<AuthContext>>,
    payload: Result<Json<RegisterStudent>, JsonRejection>,
) -> Payload<IssuedToken> {
    let Json(student) = payload?;
    let username = non_empty(student.username.as_deref().map(str::trim));
    let email = non_empty(student.email.as_deref().map(|e| e.trim().to_lowercase()));

    if username.is_none() && email.is_none() {
        return breaks(Error::invalid("Either `username` or `email` is required"));
    }
    if student.password.chars().count() < MIN_PASSWORD_LEN {
        return breaks(Error::invalid(format!(
            "`password` must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let existing = sqlx::query_as::<_, StudentData>(
        "SELECT * FROM students WHERE username = $1 OR email = $2 LIMIT 1",
    )
    .bind(&username)
    .bind(&email)
    .fetch_optional(&pg)
    .await?;
    if existing.is_some() {
        return breaks(already_exists());
    }

    let id = format!("stu_{}", Uuid::new_v4());
    let password_hash = auth.hasher.hash_blocking(student.password).await?;

    let res = sqlx::query(
        "INSERT INTO students (id, username, email, password_hash) VALUES ($1, $2, $3, $4)",
    )
    .bind(&id)
    .bind(&username)
    .bind(&email)
    .bind(password_hash.to_string())
    .execute(&pg)
    .await;

    match res {
        Ok(_) => {}
        Err(sqlx::Error::Database(db)) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            return breaks(already_exists());
        }
        Err(err) => return Err(err.into()),
    }

    log::info!("registered student {}", id);
    let token = auth.issue_token(&Principal::new(id, Role::Student))?;
    proceeds(IssuedToken { token })
}

pub async fn login_student(
    Extension(pg): Extension<PgPool>,
    Extension(auth): Extension<Arc<AuthContext>>,
    payload: Result<Json<LoginStudent>, JsonRejection>,
) -> Payload<LoggedInStudent> {
    let Json(login) = payload?;
    let name = login.login.trim();
    if name.is_empty() || login.password.is_empty() {
        return breaks(Error::invalid("`login` and `password` are required"));
    }

    let student = sqlx::query_as::<_, StudentData>(
        "SELECT * FROM students WHERE username = $1 OR email = $2 LIMIT 1",
    )
    .bind(name)
    .bind(name.to_lowercase())
    .fetch_optional(&pg)
    .await?;

    let stored = student.as_ref().map(|s| s.password_hash.as_str());
    if !auth.check_password(&login.password, stored).await {
        return breaks(Error::Unauthorized);
    }
    let student = match student {
        Some(student) => student,
        None => return breaks(Error::Unauthorized),
    };

    let token = auth.issue_token(&Principal::new(student.id.as_str(), Role::Student))?;
    proceeds(LoggedInStudent {
        token,
        username: student.username,
        email: student.email,
    })
}

pub async fn student_me(
    StudentPrincipal(principal): StudentPrincipal,
    Extension(pg): Extension<PgPool>,
) -> Payload<StudentMe> {
    let me = sqlx::query_as::<_, StudentProfile>(
        "SELECT id, username, email, created_at FROM students WHERE id = $1",
    )
    .bind(&principal.subject_id)
    .fetch_optional(&pg)
    .await?;

    proceeds(StudentMe { me })
}

pub async fn login_admin(
    Extension(auth): Extension<Arc<AuthContext>>,
    payload: Result<Json<LoginAdmin>, JsonRejection>,
) -> Payload<IssuedToken> {
    let Json(login) = payload?;
    match auth.check_admin(login.user.trim(), &login.pass) {
        None => breaks(Error::InternalError {
            kind: "ConfigurationError",
            message: "Admin credentials not set in environment".to_string(),
        }),
        Some(false) => breaks(Error::Unauthorized),
        Some(true) => {
            let token = auth.issue_token(&Principal::new("admin", Role::Admin))?;
            proceeds(IssuedToken { token })
        }
    }
}

pub async fn list_students(
    AdminPrincipal(_): AdminPrincipal,
    Extension(pg): Extension<PgPool>,
) -> Payload<StudentList> {
    let students = sqlx::query_as::<_, StudentProfile>(
        "SELECT id, username, email, created_at FROM students ORDER BY created_at DESC",
    )
    .fetch_all(&pg)
    .await?;

    proceeds(StudentList { students })
}

fn non_empty<S: Into<String>>(value: Option<S>) -> Option<String> {
    value.map(Into::into).filter(|v| !v.is_empty())
}

fn already_exists() -> Error {
    Error::UserAlreadyExists {
        message: "Student with provided username/email already exists!".to_string(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiInfo {
    name: &'static str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    pub token: String,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggedInStudent {
    pub token: String,
    pub username: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentMe {
    pub me: Option<StudentProfile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentList {
    pub students: Vec<StudentProfile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterStudent {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginStudent {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginAdmin {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub pass: String,
}
