//! Address persistence
//!
//! Scoped to one representative; deduplicated by the full field tuple
//! (no independent dedup key).

use crate::db::{format_timestamp, now_timestamp};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

/// Address record
#[derive(Debug, Clone)]
pub struct Address {
    pub guid: Uuid,
    pub representative_id: Uuid,
    pub country_id: Uuid,
    pub city: String,
    pub street: String,
    pub number: String,
    pub postcode: String,
    pub floor: String,
    pub office_number: String,
    pub kind: String,
    pub name: String,
}

/// Get-or-create an address by full field tuple, marking it seen this
/// session
///
/// The `guid` of the passed candidate is used only when a new row is
/// inserted; on a natural-key hit the stored guid wins.
pub async fn touch_address(
    conn: &mut SqliteConnection,
    session_start: &DateTime<Utc>,
    address: &Address,
) -> Result<(Address, bool)> {
    let row = sqlx::query(
        r#"
        SELECT guid, updated_at
        FROM addresses
        WHERE representative_id = ? AND country_id = ? AND city = ?
          AND street = ? AND number = ? AND postcode = ? AND floor = ?
          AND office_number = ? AND kind = ? AND name = ?
        "#,
    )
    .bind(address.representative_id.to_string())
    .bind(address.country_id.to_string())
    .bind(&address.city)
    .bind(&address.street)
    .bind(&address.number)
    .bind(&address.postcode)
    .bind(&address.floor)
    .bind(&address.office_number)
    .bind(&address.kind)
    .bind(&address.name)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(row) = row {
        let guid_str: String = row.get("guid");
        let mut stored = address.clone();
        stored.guid = Uuid::parse_str(&guid_str)?;

        let updated_at: String = row.get("updated_at");
        if updated_at < format_timestamp(session_start) {
            sqlx::query("UPDATE addresses SET updated_at = ? WHERE guid = ?")
                .bind(now_timestamp())
                .bind(guid_str)
                .execute(conn)
                .await?;
        }

        return Ok((stored, false));
    }

    let now = now_timestamp();
    sqlx::query(
        r#"
        INSERT INTO addresses (
            guid, representative_id, country_id, city, street, number,
            postcode, floor, office_number, kind, name, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(address.guid.to_string())
    .bind(address.representative_id.to_string())
    .bind(address.country_id.to_string())
    .bind(&address.city)
    .bind(&address.street)
    .bind(&address.number)
    .bind(&address.postcode)
    .bind(&address.floor)
    .bind(&address.office_number)
    .bind(&address.kind)
    .bind(&address.name)
    .bind(&now)
    .bind(&now)
    .execute(conn)
    .await?;

    Ok((address.clone(), true))
}
