//! Form progress: the latest filled PDF per user and form.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

#[derive(Debug, Clone, FromRow)]
pub struct ProgressRecord {
    pub user_id: String,
    pub form_name: String,
    pub pdf_base64: String,
    /// Set when the blob is the output of a successful fill.
    pub filled: bool,
    pub updated_at: DateTime<Utc>,
}

pub async fn get_progress(
    pool: &SqlitePool,
    user_id: &str,
    form_name: &str,
) -> Result<Option<ProgressRecord>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT user_id, form_name, pdf_base64, filled, updated_at
        FROM form_progress
        WHERE user_id = ? AND form_name = ?
        "#,
    )
    .bind(user_id)
    .bind(form_name)
    .fetch_optional(pool)
    .await
}

/// Insert or replace the stored PDF; returns the new `updated_at`.
pub async fn upsert_progress(
    pool: &SqlitePool,
    user_id: &str,
    form_name: &str,
    pdf_base64: &str,
    filled: bool,
) -> Result<DateTime<Utc>, sqlx::Error> {
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO form_progress (user_id, form_name, pdf_base64, filled, updated_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (user_id, form_name)
        DO UPDATE SET
            pdf_base64 = excluded.pdf_base64,
            filled = excluded.filled,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(user_id)
    .bind(form_name)
    .bind(pdf_base64)
    .bind(filled)
    .bind(now.to_rfc3339())
    .execute(pool)
    .await?;

    tracing::debug!(user_id, form_name, filled, "Saved form progress");
    Ok(now)
}
