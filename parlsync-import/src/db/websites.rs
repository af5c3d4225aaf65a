//! Website persistence
//!
//! Homepages carry no kind; twitter/facebook entries are kinded. URLs are
//! stored as-is; import never fails on an oddly formed external URL.

use crate::db::{format_timestamp, now_timestamp};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

/// Website record
#[derive(Debug, Clone)]
pub struct WebSite {
    pub guid: Uuid,
    pub representative_id: Uuid,
    pub kind: Option<String>,
    pub url: String,
}

/// Get-or-create a website, marking it seen this session
pub async fn touch_website(
    conn: &mut SqliteConnection,
    session_start: &DateTime<Utc>,
    representative_id: Uuid,
    kind: Option<&str>,
    url: &str,
) -> Result<(WebSite, bool)> {
    let row = sqlx::query(
        "SELECT guid, updated_at FROM web_sites
         WHERE representative_id = ? AND kind IS ? AND url = ?",
    )
    .bind(representative_id.to_string())
    .bind(kind)
    .bind(url)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(row) = row {
        let guid_str: String = row.get("guid");
        let record = WebSite {
            guid: Uuid::parse_str(&guid_str)?,
            representative_id,
            kind: kind.map(str::to_string),
            url: url.to_string(),
        };

        let updated_at: String = row.get("updated_at");
        if updated_at < format_timestamp(session_start) {
            sqlx::query("UPDATE web_sites SET updated_at = ? WHERE guid = ?")
                .bind(now_timestamp())
                .bind(guid_str)
                .execute(conn)
                .await?;
        }

        return Ok((record, false));
    }

    let record = WebSite {
        guid: Uuid::new_v4(),
        representative_id,
        kind: kind.map(str::to_string),
        url: url.to_string(),
    };

    let now = now_timestamp();
    sqlx::query(
        r#"
        INSERT INTO web_sites (guid, representative_id, kind, url, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.guid.to_string())
    .bind(record.representative_id.to_string())
    .bind(&record.kind)
    .bind(&record.url)
    .bind(&now)
    .bind(&now)
    .execute(conn)
    .await?;

    Ok((record, true))
}
