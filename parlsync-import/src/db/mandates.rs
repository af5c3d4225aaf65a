//! Mandate persistence
//!
//! Uniqueness is the exact tuple (representative, group, constituency,
//! role, begin, end): re-importing an identical tuple touches the
//! existing row, while a tuple differing in any field (a renewed mandate
//! with a moved end date included) is a new row. Date bounds may be
//! absent (open-ended), so the natural-key match must be null-safe.

use crate::db::constituencies::Constituency;
use crate::db::groups::Group;
use crate::db::representatives::Representative;
use crate::db::{format_timestamp, now_timestamp};
use crate::fingerprint::mandate_fingerprint;
use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

/// Mandate record: a dated relation between a representative, a group and
/// a constituency
#[derive(Debug, Clone)]
pub struct Mandate {
    pub guid: Uuid,
    pub representative_id: Uuid,
    pub group_id: Uuid,
    pub constituency_id: Uuid,
    pub role: String,
    pub begin_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub fingerprint: String,
}

/// Get-or-create a mandate by exact tuple, marking it seen this session
pub async fn touch_mandate(
    conn: &mut SqliteConnection,
    session_start: &DateTime<Utc>,
    representative: &Representative,
    group: &Group,
    constituency: &Constituency,
    role: &str,
    begin_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<(Mandate, bool)> {
    let begin_text = begin_date.map(|d| d.to_string());
    let end_text = end_date.map(|d| d.to_string());

    let row = sqlx::query(
        r#"
        SELECT guid, fingerprint, updated_at
        FROM mandates
        WHERE representative_id = ? AND group_id = ? AND constituency_id = ?
          AND role = ? AND begin_date IS ? AND end_date IS ?
        "#,
    )
    .bind(representative.guid.to_string())
    .bind(group.guid.to_string())
    .bind(constituency.guid.to_string())
    .bind(role)
    .bind(&begin_text)
    .bind(&end_text)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(row) = row {
        let guid_str: String = row.get("guid");
        let mandate = Mandate {
            guid: Uuid::parse_str(&guid_str)?,
            representative_id: representative.guid,
            group_id: group.guid,
            constituency_id: constituency.guid,
            role: role.to_string(),
            begin_date,
            end_date,
            fingerprint: row.get("fingerprint"),
        };

        let updated_at: String = row.get("updated_at");
        if updated_at < format_timestamp(session_start) {
            sqlx::query("UPDATE mandates SET updated_at = ? WHERE guid = ?")
                .bind(now_timestamp())
                .bind(guid_str)
                .execute(conn)
                .await?;
        }

        return Ok((mandate, false));
    }

    let mandate = Mandate {
        guid: Uuid::new_v4(),
        representative_id: representative.guid,
        group_id: group.guid,
        constituency_id: constituency.guid,
        role: role.to_string(),
        begin_date,
        end_date,
        fingerprint: mandate_fingerprint(
            &group.fingerprint,
            &constituency.fingerprint,
            role,
            begin_text.as_deref(),
            end_text.as_deref(),
            &representative.fingerprint,
        ),
    };

    let now = now_timestamp();
    sqlx::query(
        r#"
        INSERT INTO mandates (
            guid, representative_id, group_id, constituency_id,
            role, begin_date, end_date, fingerprint, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(mandate.guid.to_string())
    .bind(mandate.representative_id.to_string())
    .bind(mandate.group_id.to_string())
    .bind(mandate.constituency_id.to_string())
    .bind(&mandate.role)
    .bind(&begin_text)
    .bind(&end_text)
    .bind(&mandate.fingerprint)
    .bind(&now)
    .bind(&now)
    .execute(conn)
    .await?;

    Ok((mandate, true))
}

/// Count mandates held by a representative (tests and reporting)
pub async fn count_mandates_for(
    conn: &mut SqliteConnection,
    representative_id: Uuid,
) -> Result<i64> {
    let count =
        sqlx::query_scalar("SELECT COUNT(*) FROM mandates WHERE representative_id = ?")
            .bind(representative_id.to_string())
            .fetch_one(conn)
            .await?;
    Ok(count)
}
