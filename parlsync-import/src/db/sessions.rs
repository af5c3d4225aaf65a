//! Import session persistence
//!
//! Sessions are saved at every state transition so operators can see what
//! the last run did. Observational only: the sweep watermark is the
//! in-memory session value, not this table.

use crate::db::format_timestamp;
use crate::importer::session::ImporterSession;
use anyhow::Result;
use sqlx::SqlitePool;

/// Save session to database (upsert by session id)
pub async fn save_session(pool: &SqlitePool, session: &ImporterSession) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO import_sessions (
            session_id, state, processed, skipped, failed, swept,
            current_operation, started_at, ended_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(session_id) DO UPDATE SET
            state = excluded.state,
            processed = excluded.processed,
            skipped = excluded.skipped,
            failed = excluded.failed,
            swept = excluded.swept,
            current_operation = excluded.current_operation,
            started_at = excluded.started_at,
            ended_at = excluded.ended_at
        "#,
    )
    .bind(session.session_id.to_string())
    .bind(session.state.as_str())
    .bind(session.counts.processed as i64)
    .bind(session.counts.skipped as i64)
    .bind(session.counts.failed as i64)
    .bind(session.counts.swept as i64)
    .bind(&session.current_operation)
    .bind(format_timestamp(&session.started_at))
    .bind(session.ended_at.as_ref().map(format_timestamp))
    .execute(pool)
    .await?;

    Ok(())
}
