//! Constituency persistence
//!
//! Keyed by name alone; reused across representatives.

use crate::db::{format_timestamp, now_timestamp};
use crate::fingerprint::constituency_fingerprint;
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

/// Constituency record
#[derive(Debug, Clone)]
pub struct Constituency {
    pub guid: Uuid,
    pub name: String,
    pub fingerprint: String,
}

/// Get-or-create a constituency by name, marking it seen this session
pub async fn touch_constituency(
    conn: &mut SqliteConnection,
    session_start: &DateTime<Utc>,
    name: &str,
) -> Result<(Constituency, bool)> {
    let row = sqlx::query(
        "SELECT guid, name, fingerprint, updated_at FROM constituencies WHERE name = ?",
    )
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(row) = row {
        let guid_str: String = row.get("guid");
        let constituency = Constituency {
            guid: Uuid::parse_str(&guid_str)?,
            name: row.get("name"),
            fingerprint: row.get("fingerprint"),
        };

        let updated_at: String = row.get("updated_at");
        if updated_at < format_timestamp(session_start) {
            sqlx::query("UPDATE constituencies SET updated_at = ? WHERE guid = ?")
                .bind(now_timestamp())
                .bind(guid_str)
                .execute(conn)
                .await?;
        }

        return Ok((constituency, false));
    }

    let constituency = Constituency {
        guid: Uuid::new_v4(),
        name: name.to_string(),
        fingerprint: constituency_fingerprint(name),
    };

    let now = now_timestamp();
    sqlx::query(
        r#"
        INSERT INTO constituencies (guid, name, fingerprint, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(constituency.guid.to_string())
    .bind(&constituency.name)
    .bind(&constituency.fingerprint)
    .bind(&now)
    .bind(&now)
    .execute(conn)
    .await?;

    Ok((constituency, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_touch_constituency_dedupes_by_name() {
        let pool = crate::db::test_pool().await;
        let mut conn = pool.acquire().await.expect("connection");
        let start = Utc::now();

        let (first, created) = touch_constituency(&mut conn, &start, "European Parliament")
            .await
            .expect("touch");
        assert!(created);

        let (second, created) = touch_constituency(&mut conn, &start, "European Parliament")
            .await
            .expect("touch again");
        assert!(!created);
        assert_eq!(first.guid, second.guid);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM constituencies")
            .fetch_one(&mut *conn)
            .await
            .expect("count");
        assert_eq!(count, 1);
    }
}
