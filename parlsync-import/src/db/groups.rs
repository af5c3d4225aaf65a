//! Group persistence
//!
//! Identity is the natural key (kind, abbreviation-or-absent, name), never
//! an external identifier, so the same political body referenced from many
//! records coalesces into one row. Abbreviation is intentionally absent
//! for kinds where it carries no meaning.

use crate::db::{format_timestamp, now_timestamp};
use crate::fingerprint::group_fingerprint;
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

/// Group record (committee, delegation, political group, country, organization)
#[derive(Debug, Clone)]
pub struct Group {
    pub guid: Uuid,
    pub kind: String,
    pub abbreviation: Option<String>,
    pub name: String,
    pub fingerprint: String,
}

/// Get-or-create a group by natural key, marking it seen this session
///
/// Touch semantics: a row already touched since `session_start` is
/// returned without rewriting, so duplicate sightings within one pass are
/// no-ops.
pub async fn touch_group(
    conn: &mut SqliteConnection,
    session_start: &DateTime<Utc>,
    kind: &str,
    abbreviation: Option<&str>,
    name: &str,
) -> Result<(Group, bool)> {
    let row = sqlx::query(
        r#"
        SELECT guid, kind, abbreviation, name, fingerprint, updated_at
        FROM groups
        WHERE kind = ? AND abbreviation IS ? AND name = ?
        "#,
    )
    .bind(kind)
    .bind(abbreviation)
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(row) = row {
        let guid_str: String = row.get("guid");
        let group = Group {
            guid: Uuid::parse_str(&guid_str)?,
            kind: row.get("kind"),
            abbreviation: row.get("abbreviation"),
            name: row.get("name"),
            fingerprint: row.get("fingerprint"),
        };

        let updated_at: String = row.get("updated_at");
        if updated_at < format_timestamp(session_start) {
            sqlx::query("UPDATE groups SET updated_at = ? WHERE guid = ?")
                .bind(now_timestamp())
                .bind(guid_str)
                .execute(conn)
                .await?;
        }

        return Ok((group, false));
    }

    let group = Group {
        guid: Uuid::new_v4(),
        kind: kind.to_string(),
        abbreviation: abbreviation.map(str::to_string),
        name: name.to_string(),
        fingerprint: group_fingerprint(name, abbreviation, kind),
    };

    let now = now_timestamp();
    sqlx::query(
        r#"
        INSERT INTO groups (guid, kind, abbreviation, name, fingerprint, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(group.guid.to_string())
    .bind(&group.kind)
    .bind(&group.abbreviation)
    .bind(&group.name)
    .bind(&group.fingerprint)
    .bind(&now)
    .bind(&now)
    .execute(conn)
    .await?;

    Ok((group, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_touch_creates_then_reuses() {
        let pool = crate::db::test_pool().await;
        let mut conn = pool.acquire().await.expect("connection");
        let start = Utc::now();

        let (first, created) =
            touch_group(&mut conn, &start, "committee", Some("AGRI"), "Agriculture")
                .await
                .expect("touch");
        assert!(created);

        let (second, created) =
            touch_group(&mut conn, &start, "committee", Some("AGRI"), "Agriculture")
                .await
                .expect("touch again");
        assert!(!created);
        assert_eq!(first.guid, second.guid);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM groups")
            .fetch_one(&mut *conn)
            .await
            .expect("count");
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_absent_abbreviation_is_part_of_the_key() {
        let pool = crate::db::test_pool().await;
        let mut conn = pool.acquire().await.expect("connection");
        let start = Utc::now();

        let (with_abbr, _) = touch_group(&mut conn, &start, "group", Some("EPP"), "EPP Group")
            .await
            .expect("touch");
        let (without_abbr, created) = touch_group(&mut conn, &start, "group", None, "EPP Group")
            .await
            .expect("touch");
        assert!(created, "absent abbreviation is a distinct natural key");
        assert_ne!(with_abbr.guid, without_abbr.guid);

        // The absent-abbreviation row still dedupes against itself
        let (again, created) = touch_group(&mut conn, &start, "group", None, "EPP Group")
            .await
            .expect("touch");
        assert!(!created);
        assert_eq!(without_abbr.guid, again.guid);
    }

    #[tokio::test]
    async fn test_stale_row_is_touched_forward() {
        let pool = crate::db::test_pool().await;
        let mut conn = pool.acquire().await.expect("connection");

        let old_session = Utc::now() - chrono::Duration::days(7);
        touch_group(&mut conn, &old_session, "delegation", None, "Delegation X")
            .await
            .expect("first import");

        // Age the row behind the next session's watermark
        sqlx::query("UPDATE groups SET updated_at = ?")
            .bind(format_timestamp(&old_session))
            .execute(&mut *conn)
            .await
            .expect("age row");

        let new_session = Utc::now();
        touch_group(&mut conn, &new_session, "delegation", None, "Delegation X")
            .await
            .expect("second import");

        let updated_at: String = sqlx::query_scalar("SELECT updated_at FROM groups")
            .fetch_one(&mut *conn)
            .await
            .expect("updated_at");
        assert!(
            updated_at >= format_timestamp(&new_session),
            "stale row should be touched past the new watermark"
        );
    }
}
