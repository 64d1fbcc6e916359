use sqlx::PgPool;

const CREATE_STUDENTS: &str = "CREATE TABLE IF NOT EXISTS students (
    id TEXT PRIMARY KEY,
    username TEXT UNIQUE,
    email TEXT UNIQUE,
    password_hash TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
)";

/// Creates the tables the service needs if they are missing.
pub async fn prepare_schema(pg: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(CREATE_STUDENTS).execute(pg).await?;
    log::debug!("database schema is ready");
    Ok(())
}
