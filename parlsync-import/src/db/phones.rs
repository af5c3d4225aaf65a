//! Phone persistence
//!
//! One office phone per recognized address; deduplicated by the
//! (representative, address, kind, number) tuple.

use crate::db::{format_timestamp, now_timestamp};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

/// Phone record
#[derive(Debug, Clone)]
pub struct Phone {
    pub guid: Uuid,
    pub representative_id: Uuid,
    pub address_id: Option<Uuid>,
    pub kind: String,
    pub number: String,
}

/// Get-or-create a phone, marking it seen this session
pub async fn touch_phone(
    conn: &mut SqliteConnection,
    session_start: &DateTime<Utc>,
    representative_id: Uuid,
    address_id: Option<Uuid>,
    kind: &str,
    number: &str,
) -> Result<(Phone, bool)> {
    let address_text = address_id.map(|guid| guid.to_string());

    let row = sqlx::query(
        r#"
        SELECT guid, updated_at
        FROM phones
        WHERE representative_id = ? AND address_id IS ? AND kind = ? AND number = ?
        "#,
    )
    .bind(representative_id.to_string())
    .bind(&address_text)
    .bind(kind)
    .bind(number)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(row) = row {
        let guid_str: String = row.get("guid");
        let phone = Phone {
            guid: Uuid::parse_str(&guid_str)?,
            representative_id,
            address_id,
            kind: kind.to_string(),
            number: number.to_string(),
        };

        let updated_at: String = row.get("updated_at");
        if updated_at < format_timestamp(session_start) {
            sqlx::query("UPDATE phones SET updated_at = ? WHERE guid = ?")
                .bind(now_timestamp())
                .bind(guid_str)
                .execute(conn)
                .await?;
        }

        return Ok((phone, false));
    }

    let phone = Phone {
        guid: Uuid::new_v4(),
        representative_id,
        address_id,
        kind: kind.to_string(),
        number: number.to_string(),
    };

    let now = now_timestamp();
    sqlx::query(
        r#"
        INSERT INTO phones (
            guid, representative_id, address_id, kind, number, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(phone.guid.to_string())
    .bind(phone.representative_id.to_string())
    .bind(&address_text)
    .bind(&phone.kind)
    .bind(&phone.number)
    .bind(&now)
    .bind(&now)
    .execute(conn)
    .await?;

    Ok((phone, true))
}
