use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StudentData {
    pub id: String,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A student record as shown to clients, without the password hash.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StudentProfile {
    pub id: String,
    pub username: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<StudentData> for StudentProfile {
    fn from(student: StudentData) -> Self {
        Self {
            id: student.id,
            username: student.username,
            email: student.email,
            created_at: student.created_at,
        }
    }
}
