//! Mandate resolution
//!
//! Flattens the five mandate-bearing record categories (committees,
//! delegations, political groups, national constituencies, staff) into
//! unified Mandate rows with resolved Group/Constituency references.

use crate::db::constituencies::{touch_constituency, Constituency};
use crate::db::countries::find_country_by_name;
use crate::db::groups::{touch_group, Group};
use crate::db::mandates::touch_mandate;
use crate::db::representatives::Representative;
use crate::error::ImportError;
use crate::importer::dates::parse_optional_date;
use crate::importer::lookups::LookupTables;
use crate::record::SourceRecord;
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::{debug, info};

/// Catch-all constituency for supranational mandates
pub const EUROPEAN_PARLIAMENT: &str = "European Parliament";

/// Local party label used when the feed has none (or a placeholder dash)
pub const UNKNOWN_PARTY: &str = "unknown";

/// Resolve and upsert every mandate carried by one record
pub async fn add_mandates(
    conn: &mut SqliteConnection,
    session_start: &DateTime<Utc>,
    lookups: &LookupTables,
    representative: &Representative,
    record: &SourceRecord,
) -> Result<(), ImportError> {
    // Committees: entries without a committee id are not importable
    for entry in &record.committees {
        let Some(committee_id) = entry.committee_id.as_deref().filter(|id| !id.is_empty())
        else {
            debug!(
                remote_id = %representative.remote_id,
                organization = %entry.organization,
                "Skipping committee entry without committee id"
            );
            continue;
        };

        let (group, _) = touch_group(
            &mut *conn,
            session_start,
            "committee",
            Some(committee_id),
            &entry.organization,
        )
        .await?;
        let (constituency, _) =
            touch_constituency(&mut *conn, session_start, EUROPEAN_PARLIAMENT).await?;

        upsert_mandate(
            conn,
            session_start,
            representative,
            &group,
            &constituency,
            entry.role.as_deref(),
            entry.start.as_deref(),
            entry.end.as_deref(),
        )
        .await?;
    }

    // Delegations
    for entry in &record.delegations {
        let (group, _) = touch_group(
            &mut *conn,
            session_start,
            "delegation",
            None,
            &entry.organization,
        )
        .await?;
        let (constituency, _) =
            touch_constituency(&mut *conn, session_start, EUROPEAN_PARLIAMENT).await?;

        upsert_mandate(
            conn,
            session_start,
            representative,
            &group,
            &constituency,
            entry.role.as_deref(),
            entry.start.as_deref(),
            entry.end.as_deref(),
        )
        .await?;
    }

    // Political groups: abbreviation arrives as scalar or list, and the
    // feed renames groups across time; the alias table canonicalizes
    // before the abbreviation enters the natural key
    for entry in &record.groups {
        let Some(abbreviation) = entry.groupid.as_ref().and_then(|id| id.first()) else {
            continue;
        };
        let abbreviation = lookups.group_alias(abbreviation);

        let (group, _) = touch_group(
            &mut *conn,
            session_start,
            "group",
            Some(abbreviation),
            &entry.organization,
        )
        .await?;
        let (constituency, _) =
            touch_constituency(&mut *conn, session_start, EUROPEAN_PARLIAMENT).await?;

        upsert_mandate(
            conn,
            session_start,
            representative,
            &group,
            &constituency,
            entry.role.as_deref(),
            entry.start.as_deref(),
            entry.end.as_deref(),
        )
        .await?;
    }

    // National constituencies: the country must exist in reference data;
    // a miss is an operator problem, not bad input, and fails the record
    for entry in record.constituencies.iter().flatten() {
        let country = find_country_by_name(&mut *conn, &entry.country)
            .await?
            .ok_or_else(|| ImportError::UnknownCountry(entry.country.clone()))?;

        let (group, _) = touch_group(
            &mut *conn,
            session_start,
            "country",
            Some(&country.code),
            &country.name,
        )
        .await?;

        let party = match entry.party.as_deref() {
            Some(party) if !party.is_empty() && party != "-" => party,
            _ => UNKNOWN_PARTY,
        };
        let (constituency, _) = touch_constituency(&mut *conn, session_start, party).await?;

        upsert_mandate(
            conn,
            session_start,
            representative,
            &group,
            &constituency,
            entry.role.as_deref(),
            entry.start.as_deref(),
            entry.end.as_deref(),
        )
        .await?;
    }

    // Staff/organizations: these groups are not abbreviated entities, so
    // the abbreviation is the empty string by design
    for entry in &record.staff {
        let (group, _) = touch_group(
            &mut *conn,
            session_start,
            "organization",
            Some(""),
            &entry.organization,
        )
        .await?;
        let (constituency, _) =
            touch_constituency(&mut *conn, session_start, EUROPEAN_PARLIAMENT).await?;

        upsert_mandate(
            conn,
            session_start,
            representative,
            &group,
            &constituency,
            entry.role.as_deref(),
            entry.start.as_deref(),
            entry.end.as_deref(),
        )
        .await?;
    }

    Ok(())
}

/// Parse the date bounds and upsert one mandate tuple
async fn upsert_mandate(
    conn: &mut SqliteConnection,
    session_start: &DateTime<Utc>,
    representative: &Representative,
    group: &Group,
    constituency: &Constituency,
    role: Option<&str>,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<(), ImportError> {
    let begin_date = parse_optional_date(start)?;
    let end_date = parse_optional_date(end)?;
    let role = role.unwrap_or("");

    let (mandate, created) = touch_mandate(
        conn,
        session_start,
        representative,
        group,
        constituency,
        role,
        begin_date,
        end_date,
    )
    .await?;

    if created {
        info!(
            mandate = %mandate.guid,
            remote_id = %representative.remote_id,
            group = %group.name,
            "Created mandate"
        );
    }

    Ok(())
}
