use crate::db::{models::Session, DbPool};
use crate::error::Result;
use chrono::{Duration, Utc};
use uuid::Uuid;

/// Start a session for a user, returning the stored record
pub async fn create_session(
    pool: &DbPool,
    user_id: i64,
    name: Option<&str>,
    ttl_seconds: u64,
) -> Result<Session> {
    let id = Uuid::new_v4().to_string();
    let expires_at = Utc::now() + Duration::seconds(ttl_seconds as i64);

    let session = sqlx::query_as::<_, Session>(
        "INSERT INTO sessions (id, user_id, name, expires_at) VALUES (?, ?, ?, ?) RETURNING *",
    )
    .bind(&id)
    .bind(user_id)
    .bind(name)
    .bind(expires_at)
    .fetch_one(pool)
    .await?;

    Ok(session)
}

/// Look up a live session; expired sessions are treated as missing
pub async fn get_session(pool: &DbPool, session_id: &str) -> Result<Option<Session>> {
    let session = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = ?")
        .bind(session_id)
        .fetch_optional(pool)
        .await?;

    Ok(session.filter(|s| s.expires_at > Utc::now()))
}

/// Remove expired sessions, returning how many were deleted
pub async fn delete_expired_sessions(pool: &DbPool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
        .bind(Utc::now())
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
