//! Country reference data
//!
//! Countries are looked up, never created, by the import path: a missing
//! row signals a reference-data gap the operator must fix by reseeding,
//! not bad input.

use anyhow::Result;
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

/// Country record (static reference data)
#[derive(Debug, Clone)]
pub struct Country {
    pub guid: Uuid,
    pub name: String,
    /// 2-letter code
    pub code: String,
}

/// Look up a country by name
pub async fn find_country_by_name(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<Option<Country>> {
    let row = sqlx::query("SELECT guid, name, code FROM countries WHERE name = ?")
        .bind(name)
        .fetch_optional(conn)
        .await?;

    match row {
        Some(row) => {
            let guid_str: String = row.get("guid");
            Ok(Some(Country {
                guid: Uuid::parse_str(&guid_str)?,
                name: row.get("name"),
                code: row.get("code"),
            }))
        }
        None => Ok(None),
    }
}

/// Seed a country row (operator tooling and tests; not part of the import
/// path)
pub async fn save_country(pool: &SqlitePool, name: &str, code: &str) -> Result<Country> {
    let country = Country {
        guid: Uuid::new_v4(),
        name: name.to_string(),
        code: code.to_string(),
    };

    sqlx::query(
        r#"
        INSERT INTO countries (guid, name, code)
        VALUES (?, ?, ?)
        ON CONFLICT(name) DO UPDATE SET code = excluded.code
        "#,
    )
    .bind(country.guid.to_string())
    .bind(&country.name)
    .bind(&country.code)
    .execute(pool)
    .await?;

    Ok(country)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_find_missing_country_returns_none() {
        let pool = crate::db::test_pool().await;
        let mut conn = pool.acquire().await.expect("connection");

        let found = find_country_by_name(&mut conn, "Atlantis")
            .await
            .expect("lookup");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_save_and_find_country() {
        let pool = crate::db::test_pool().await;
        save_country(&pool, "Belgium", "BE").await.expect("seed");

        let mut conn = pool.acquire().await.expect("connection");
        let found = find_country_by_name(&mut conn, "Belgium")
            .await
            .expect("lookup")
            .expect("country exists");
        assert_eq!(found.code, "BE");
    }
}
