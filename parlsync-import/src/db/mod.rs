//! Database access for parlsync-import
//!
//! One module per entity kind, each owning its row struct and its
//! touch/upsert functions. Everything that runs inside a record's
//! transaction takes `&mut SqliteConnection` so the call sites compose
//! under one commit-or-rollback boundary.

pub mod addresses;
pub mod constituencies;
pub mod countries;
pub mod emails;
pub mod groups;
pub mod mandates;
pub mod phones;
pub mod representatives;
pub mod sessions;
pub mod websites;

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;

/// Format a timestamp for storage
///
/// Fixed-width RFC 3339 UTC text so lexicographic comparison in SQL agrees
/// with chronological order. All timestamps are bound from Rust; the
/// schema never uses CURRENT_TIMESTAMP.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current time in storage format
pub fn now_timestamp() -> String {
    format_timestamp(&Utc::now())
}

/// Entity tables subject to the end-of-session sweep, parents first so
/// cascades fire before the per-table deletes
const SWEPT_TABLES: [&str; 8] = [
    "representatives",
    "groups",
    "constituencies",
    "mandates",
    "addresses",
    "phones",
    "emails",
    "web_sites",
];

/// Delete every tracked entity not touched since the session start
///
/// Implements retirement semantics: whatever the new dump no longer
/// mentions disappears. Returns the number of rows deleted directly
/// (cascade deletions are not counted).
pub async fn sweep_untouched(pool: &SqlitePool, session_start: &DateTime<Utc>) -> Result<u64> {
    let watermark = format_timestamp(session_start);
    let mut swept = 0;

    for table in SWEPT_TABLES {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE updated_at < ?", table))
            .bind(&watermark)
            .execute(pool)
            .await?;
        swept += result.rows_affected();
    }

    Ok(swept)
}

/// Create all tables if they don't exist
///
/// Countries are reference data: the table is created here but only ever
/// populated by operator seeding, never by the import path.
pub async fn initialize_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS countries (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            code TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS representatives (
            guid TEXT PRIMARY KEY,
            remote_id TEXT NOT NULL UNIQUE,
            slug TEXT NOT NULL,
            first_name TEXT NOT NULL DEFAULT '',
            last_name TEXT NOT NULL DEFAULT '',
            last_name_with_prefix TEXT,
            full_name TEXT NOT NULL,
            gender INTEGER NOT NULL DEFAULT 0,
            birth_place TEXT,
            birth_date TEXT,
            biography TEXT NOT NULL DEFAULT '',
            photo TEXT,
            active INTEGER NOT NULL DEFAULT 0,
            fingerprint TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS groups (
            guid TEXT PRIMARY KEY,
            kind TEXT NOT NULL,
            abbreviation TEXT,
            name TEXT NOT NULL,
            fingerprint TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(kind, abbreviation, name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS constituencies (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            fingerprint TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS mandates (
            guid TEXT PRIMARY KEY,
            representative_id TEXT NOT NULL
                REFERENCES representatives(guid) ON DELETE CASCADE,
            group_id TEXT NOT NULL
                REFERENCES groups(guid) ON DELETE CASCADE,
            constituency_id TEXT NOT NULL
                REFERENCES constituencies(guid) ON DELETE CASCADE,
            role TEXT NOT NULL DEFAULT '',
            begin_date TEXT,
            end_date TEXT,
            fingerprint TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_mandates_representative
         ON mandates(representative_id)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS addresses (
            guid TEXT PRIMARY KEY,
            representative_id TEXT NOT NULL
                REFERENCES representatives(guid) ON DELETE CASCADE,
            country_id TEXT NOT NULL REFERENCES countries(guid),
            city TEXT,
            street TEXT,
            number TEXT,
            postcode TEXT,
            floor TEXT,
            office_number TEXT,
            kind TEXT,
            name TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS phones (
            guid TEXT PRIMARY KEY,
            representative_id TEXT NOT NULL
                REFERENCES representatives(guid) ON DELETE CASCADE,
            address_id TEXT REFERENCES addresses(guid) ON DELETE CASCADE,
            kind TEXT,
            number TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS emails (
            guid TEXT PRIMARY KEY,
            representative_id TEXT NOT NULL
                REFERENCES representatives(guid) ON DELETE CASCADE,
            kind TEXT,
            email TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS web_sites (
            guid TEXT PRIMARY KEY,
            representative_id TEXT NOT NULL
                REFERENCES representatives(guid) ON DELETE CASCADE,
            kind TEXT,
            url TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS import_sessions (
            session_id TEXT PRIMARY KEY,
            state TEXT NOT NULL,
            processed INTEGER NOT NULL DEFAULT 0,
            skipped INTEGER NOT NULL DEFAULT 0,
            failed INTEGER NOT NULL DEFAULT 0,
            swept INTEGER NOT NULL DEFAULT 0,
            current_operation TEXT NOT NULL DEFAULT '',
            started_at TEXT NOT NULL,
            ended_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::debug!("Database schema initialized");

    Ok(())
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = parlsync_common::db::init_memory_database()
        .await
        .expect("in-memory database");
    initialize_schema(&pool)
        .await
        .expect("schema initialization");
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_format_is_fixed_width_utc() {
        let ts = now_timestamp();
        assert!(ts.ends_with('Z'));
        assert_eq!(ts.len(), "2026-08-05T12:00:00.000000Z".len());
    }

    #[test]
    fn test_timestamp_ordering_matches_lexicographic() {
        let earlier = DateTime::parse_from_rfc3339("2026-01-01T00:00:00.5Z")
            .unwrap()
            .with_timezone(&Utc);
        let later = DateTime::parse_from_rfc3339("2026-01-01T00:00:01Z")
            .unwrap()
            .with_timezone(&Utc);
        assert!(format_timestamp(&earlier) < format_timestamp(&later));
    }

    #[tokio::test]
    async fn test_schema_initialization_is_idempotent() {
        let pool = test_pool().await;
        initialize_schema(&pool).await.expect("second init");

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .expect("table list");

        for expected in SWEPT_TABLES {
            assert!(
                tables.iter().any(|t| t == expected),
                "table {} should exist",
                expected
            );
        }
        assert!(tables.iter().any(|t| t == "countries"));
        assert!(tables.iter().any(|t| t == "import_sessions"));
    }
}
