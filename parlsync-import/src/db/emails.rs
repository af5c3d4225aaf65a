//! Email persistence
//!
//! Deduplicated by (representative, kind, email).

use crate::db::{format_timestamp, now_timestamp};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

/// Email record
#[derive(Debug, Clone)]
pub struct Email {
    pub guid: Uuid,
    pub representative_id: Uuid,
    pub kind: String,
    pub email: String,
}

/// Get-or-create an email, marking it seen this session
pub async fn touch_email(
    conn: &mut SqliteConnection,
    session_start: &DateTime<Utc>,
    representative_id: Uuid,
    kind: &str,
    email: &str,
) -> Result<(Email, bool)> {
    let row = sqlx::query(
        "SELECT guid, updated_at FROM emails
         WHERE representative_id = ? AND kind = ? AND email = ?",
    )
    .bind(representative_id.to_string())
    .bind(kind)
    .bind(email)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(row) = row {
        let guid_str: String = row.get("guid");
        let record = Email {
            guid: Uuid::parse_str(&guid_str)?,
            representative_id,
            kind: kind.to_string(),
            email: email.to_string(),
        };

        let updated_at: String = row.get("updated_at");
        if updated_at < format_timestamp(session_start) {
            sqlx::query("UPDATE emails SET updated_at = ? WHERE guid = ?")
                .bind(now_timestamp())
                .bind(guid_str)
                .execute(conn)
                .await?;
        }

        return Ok((record, false));
    }

    let record = Email {
        guid: Uuid::new_v4(),
        representative_id,
        kind: kind.to_string(),
        email: email.to_string(),
    };

    let now = now_timestamp();
    sqlx::query(
        r#"
        INSERT INTO emails (guid, representative_id, kind, email, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.guid.to_string())
    .bind(record.representative_id.to_string())
    .bind(&record.kind)
    .bind(&record.email)
    .bind(&now)
    .bind(&now)
    .execute(conn)
    .await?;

    Ok((record, true))
}
