//! Representative persistence
//!
//! Identity is the externally-supplied `remote_id`, unique for the
//! lifetime of the store. Every sighting within a session rewrites the
//! mutable fields and advances `updated_at`, so the end-of-session sweep
//! never removes a representative still present in the dump.

use crate::db::now_timestamp;
use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

/// Gender as encoded in the store (source codes "F"/"M", else unknown)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Unknown,
    Female,
    Male,
}

impl Gender {
    pub fn from_source_code(code: Option<&str>) -> Self {
        match code {
            Some("F") => Gender::Female,
            Some("M") => Gender::Male,
            _ => Gender::Unknown,
        }
    }

    pub fn as_i64(self) -> i64 {
        match self {
            Gender::Unknown => 0,
            Gender::Female => 1,
            Gender::Male => 2,
        }
    }

    pub fn from_i64(value: i64) -> Self {
        match value {
            1 => Gender::Female,
            2 => Gender::Male,
            _ => Gender::Unknown,
        }
    }
}

/// Representative record
#[derive(Debug, Clone)]
pub struct Representative {
    pub guid: Uuid,
    pub remote_id: String,
    pub slug: String,
    pub first_name: String,
    pub last_name: String,
    /// Disambiguated variant for names whose conventional split drops a
    /// nobiliary particle
    pub last_name_with_prefix: Option<String>,
    pub full_name: String,
    pub gender: Gender,
    pub birth_place: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub biography: String,
    pub photo: Option<String>,
    pub active: bool,
    pub fingerprint: String,
}

/// Create or update a representative by remote id
///
/// Returns the stored row: on update the existing guid is preserved so
/// foreign keys written earlier keep pointing at the same row.
pub async fn upsert_representative(
    conn: &mut SqliteConnection,
    representative: &Representative,
) -> Result<Representative> {
    let now = now_timestamp();

    let existing: Option<String> =
        sqlx::query_scalar("SELECT guid FROM representatives WHERE remote_id = ?")
            .bind(&representative.remote_id)
            .fetch_optional(&mut *conn)
            .await?;

    let mut stored = representative.clone();

    match existing {
        Some(guid_str) => {
            stored.guid = Uuid::parse_str(&guid_str)?;
            sqlx::query(
                r#"
                UPDATE representatives SET
                    slug = ?, first_name = ?, last_name = ?,
                    last_name_with_prefix = ?, full_name = ?, gender = ?,
                    birth_place = ?, birth_date = ?, biography = ?,
                    photo = ?, active = ?, fingerprint = ?, updated_at = ?
                WHERE guid = ?
                "#,
            )
            .bind(&stored.slug)
            .bind(&stored.first_name)
            .bind(&stored.last_name)
            .bind(&stored.last_name_with_prefix)
            .bind(&stored.full_name)
            .bind(stored.gender.as_i64())
            .bind(&stored.birth_place)
            .bind(stored.birth_date.map(|d| d.to_string()))
            .bind(&stored.biography)
            .bind(&stored.photo)
            .bind(stored.active)
            .bind(&stored.fingerprint)
            .bind(&now)
            .bind(guid_str)
            .execute(&mut *conn)
            .await?;
        }
        None => {
            sqlx::query(
                r#"
                INSERT INTO representatives (
                    guid, remote_id, slug, first_name, last_name,
                    last_name_with_prefix, full_name, gender, birth_place,
                    birth_date, biography, photo, active, fingerprint,
                    created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(stored.guid.to_string())
            .bind(&stored.remote_id)
            .bind(&stored.slug)
            .bind(&stored.first_name)
            .bind(&stored.last_name)
            .bind(&stored.last_name_with_prefix)
            .bind(&stored.full_name)
            .bind(stored.gender.as_i64())
            .bind(&stored.birth_place)
            .bind(stored.birth_date.map(|d| d.to_string()))
            .bind(&stored.biography)
            .bind(&stored.photo)
            .bind(stored.active)
            .bind(&stored.fingerprint)
            .bind(&now)
            .bind(&now)
            .execute(&mut *conn)
            .await?;
        }
    }

    Ok(stored)
}

/// Load a representative by remote id
pub async fn load_representative_by_remote_id(
    conn: &mut SqliteConnection,
    remote_id: &str,
) -> Result<Option<Representative>> {
    let row = sqlx::query(
        r#"
        SELECT guid, remote_id, slug, first_name, last_name,
               last_name_with_prefix, full_name, gender, birth_place,
               birth_date, biography, photo, active, fingerprint
        FROM representatives
        WHERE remote_id = ?
        "#,
    )
    .bind(remote_id)
    .fetch_optional(conn)
    .await?;

    match row {
        Some(row) => {
            let guid_str: String = row.get("guid");
            let birth_date: Option<String> = row.get("birth_date");
            let birth_date = match birth_date {
                Some(text) => Some(text.parse::<NaiveDate>()?),
                None => None,
            };

            Ok(Some(Representative {
                guid: Uuid::parse_str(&guid_str)?,
                remote_id: row.get("remote_id"),
                slug: row.get("slug"),
                first_name: row.get("first_name"),
                last_name: row.get("last_name"),
                last_name_with_prefix: row.get("last_name_with_prefix"),
                full_name: row.get("full_name"),
                gender: Gender::from_i64(row.get("gender")),
                birth_place: row.get("birth_place"),
                birth_date,
                biography: row.get("biography"),
                photo: row.get("photo"),
                active: row.get("active"),
                fingerprint: row.get("fingerprint"),
            }))
        }
        None => Ok(None),
    }
}
