//! Import session orchestration
//!
//! One session pulls the record stream sequentially, wraps each record in
//! its own transaction, and finishes with the stale-entity sweep. A
//! record-scoped failure rolls back that record and the session keeps
//! going; a stream or storage failure fails the session and the sweep does
//! not run (entities the pass never reached must not be deleted).

use crate::db;
use crate::db::representatives::{upsert_representative, Gender, Representative};
use crate::db::sessions::save_session;
use crate::error::ImportError;
use crate::fingerprint::representative_fingerprint;
use crate::importer::contacts::add_contacts;
use crate::importer::dates::parse_source_date;
use crate::importer::lookups::LookupTables;
use crate::importer::mandates::add_mandates;
use crate::importer::names::normalize_name;
use crate::importer::session::{ImportState, ImporterSession};
use crate::record::SourceRecord;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Session-level import orchestrator
pub struct ImportOrchestrator {
    db: SqlitePool,
    lookups: LookupTables,
}

impl ImportOrchestrator {
    pub fn new(db: SqlitePool, lookups: LookupTables) -> Self {
        Self { db, lookups }
    }

    /// Run one full import session over a record stream
    ///
    /// The stream is finite and non-restartable; items are raw decoded
    /// JSON values so that framing errors (fatal) stay distinct from
    /// schema errors (record-scoped).
    pub async fn run<I>(&self, records: I) -> Result<ImporterSession, ImportError>
    where
        I: IntoIterator<Item = parlsync_common::Result<serde_json::Value>>,
    {
        let mut session = ImporterSession::new();
        session.transition_to(ImportState::Running);
        session.set_operation("Processing representatives");
        save_session(&self.db, &session).await?;

        info!(
            session_id = %session.session_id,
            "Starting representative import session"
        );

        for item in records {
            let value = match item {
                Ok(value) => value,
                Err(e) => {
                    error!(
                        session_id = %session.session_id,
                        error = %e,
                        "Source stream failed; aborting session without sweep"
                    );
                    return self.fail_session(session, ImportError::Stream(e.to_string())).await;
                }
            };

            // Identify the record before validating its full shape so the
            // triage log can name it either way
            let remote_id = probe_string(&value, &["UserID"]);
            let full_name = probe_string(&value, &["Name", "full"]).unwrap_or_default();

            let Some(remote_id) = remote_id else {
                warn!(name = %full_name, "Skipping representative without remote id");
                session.counts.skipped += 1;
                continue;
            };

            info!(remote_id = %remote_id, name = %full_name, "Processing representative");

            let outcome = match SourceRecord::from_value(value) {
                Ok(record) => self.process_record(&session.started_at, &remote_id, &record).await,
                Err(e) => Err(e),
            };

            match outcome {
                Ok(()) => session.counts.processed += 1,
                Err(e) if e.is_record_scoped() => {
                    warn!(
                        remote_id = %remote_id,
                        name = %full_name,
                        error = %e,
                        "Record import failed (rolled back, continuing)"
                    );
                    session.counts.failed += 1;
                }
                Err(e) => {
                    error!(
                        session_id = %session.session_id,
                        remote_id = %remote_id,
                        error = %e,
                        "Unrecoverable failure; aborting session without sweep"
                    );
                    return self.fail_session(session, e).await;
                }
            }
        }

        session.transition_to(ImportState::SweepPending);
        session.set_operation("Sweeping untouched entities");
        save_session(&self.db, &session).await?;

        let swept = db::sweep_untouched(&self.db, &session.started_at).await?;
        session.counts.swept = swept;

        session.transition_to(ImportState::Completed);
        session.set_operation("Import completed");
        save_session(&self.db, &session).await?;

        info!(
            session_id = %session.session_id,
            processed = session.counts.processed,
            skipped = session.counts.skipped,
            failed = session.counts.failed,
            swept = session.counts.swept,
            "Import session completed"
        );

        Ok(session)
    }

    /// Import one record inside a single transaction
    ///
    /// Either the full set of entity writes for the record commits, or
    /// none do; rollback happens on drop for every error path.
    async fn process_record(
        &self,
        session_start: &DateTime<Utc>,
        remote_id: &str,
        record: &SourceRecord,
    ) -> Result<(), ImportError> {
        let mut tx = self.db.begin().await.map_err(anyhow::Error::from)?;

        let representative = self.representative_from_record(remote_id, record)?;
        let representative = upsert_representative(&mut *tx, &representative).await?;

        add_mandates(&mut *tx, session_start, &self.lookups, &representative, record).await?;
        add_contacts(&mut *tx, session_start, &representative, record).await?;

        tx.commit().await.map_err(anyhow::Error::from)?;
        Ok(())
    }

    /// Build the representative row from raw record fields
    fn representative_from_record(
        &self,
        remote_id: &str,
        record: &SourceRecord,
    ) -> Result<Representative, ImportError> {
        let name = normalize_name(&record.name, &self.lookups);

        let (birth_date, birth_place) = match &record.birth {
            Some(birth) => (
                birth.date.as_deref().map(parse_source_date).transpose()?,
                birth.place.clone(),
            ),
            None => (None, None),
        };

        Ok(Representative {
            guid: Uuid::new_v4(),
            remote_id: remote_id.to_string(),
            slug: name.slug,
            first_name: name.first_name,
            last_name: name.last_name,
            last_name_with_prefix: name.last_name_with_prefix,
            full_name: name.full_name,
            gender: Gender::from_source_code(record.gender.as_deref()),
            birth_place,
            birth_date,
            biography: record.cv.join("\n"),
            photo: record.photo.clone(),
            active: record.active,
            fingerprint: representative_fingerprint(remote_id),
        })
    }

    /// Mark the session failed, persist it, and propagate the error
    async fn fail_session(
        &self,
        mut session: ImporterSession,
        error: ImportError,
    ) -> Result<ImporterSession, ImportError> {
        session.transition_to(ImportState::Failed);
        session.set_operation(format!("Import failed: {}", error));
        if let Err(save_error) = save_session(&self.db, &session).await {
            warn!(
                session_id = %session.session_id,
                error = %save_error,
                "Failed to persist failed session state"
            );
        }
        Err(error)
    }
}

/// Read a nested string (or integer, stringified) out of a raw record
fn probe_string(value: &serde_json::Value, path: &[&str]) -> Option<String> {
    let mut current = value;
    for key in path {
        current = current.get(key)?;
    }
    match current {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) if n.as_i64() != Some(0) => Some(n.to_string()),
        _ => None,
    }
}
