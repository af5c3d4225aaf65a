//! Contact resolution
//!
//! Addresses are limited to the parliament's two physical seats: the
//! source has few possible official addresses and anything else in the
//! address map is noise. Emails are classified by institutional domain.
//! URLs are never validated; import must not fail on an odd external URL.

use crate::db::addresses::{touch_address, Address};
use crate::db::countries::find_country_by_name;
use crate::db::emails::touch_email;
use crate::db::phones::touch_phone;
use crate::db::representatives::Representative;
use crate::db::websites::touch_website;
use crate::error::ImportError;
use crate::record::{CityAddress, SourceRecord};
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

/// Institutional mail domain marking an address as official
const OFFICIAL_MAIL_DOMAIN: &str = "@europarl.europa.eu";

/// A fixed seat of the parliament, identified by city name in the source
/// address map
struct Seat {
    city: &'static str,
    country: &'static str,
    street: &'static str,
    number: &'static str,
    postcode: &'static str,
    name: &'static str,
}

const SEATS: [Seat; 2] = [
    Seat {
        city: "Brussels",
        country: "Belgium",
        street: "rue Wiertz / Wiertzstraat",
        number: "60",
        postcode: "1047",
        name: "Brussels European Parliament",
    },
    Seat {
        city: "Strasbourg",
        country: "France",
        street: "avenue du Pr\u{e9}sident Robert Schuman - CS 91024",
        number: "1",
        postcode: "67070",
        name: "Strasbourg European Parliament",
    },
];

/// Split a combined office code into (floor, office number)
///
/// Fixed-width: first 3 characters are the floor, the remainder the
/// office number. Fragile but exact; office codes are ASCII.
pub fn split_office_code(code: &str) -> (&str, &str) {
    let mut cut = code.len().min(3);
    while !code.is_char_boundary(cut) {
        cut -= 1;
    }
    code.split_at(cut)
}

/// Resolve and upsert every contact carried by one record
pub async fn add_contacts(
    conn: &mut SqliteConnection,
    session_start: &DateTime<Utc>,
    representative: &Representative,
    record: &SourceRecord,
) -> Result<(), ImportError> {
    // Addresses: recognized cities only; other keys in the map are noise
    // and may not even share the recognized shape
    for seat in &SEATS {
        let Some(payload) = record.addresses.get(seat.city) else {
            continue;
        };
        let city_address: CityAddress = serde_json::from_value(payload.clone())
            .map_err(|e| {
                ImportError::InvalidRecord(format!("address payload for {}: {}", seat.city, e))
            })?;

        let country = find_country_by_name(&mut *conn, seat.country)
            .await?
            .ok_or_else(|| ImportError::UnknownCountry(seat.country.to_string()))?;

        let office = city_address
            .address
            .as_ref()
            .and_then(|detail| detail.office.as_deref())
            .unwrap_or("");
        let (floor, office_number) = split_office_code(office);

        let candidate = Address {
            guid: Uuid::new_v4(),
            representative_id: representative.guid,
            country_id: country.guid,
            city: seat.city.to_string(),
            street: seat.street.to_string(),
            number: seat.number.to_string(),
            postcode: seat.postcode.to_string(),
            floor: floor.to_string(),
            office_number: office_number.to_string(),
            kind: "official".to_string(),
            name: seat.name.to_string(),
        };
        let (address, _) = touch_address(&mut *conn, session_start, &candidate).await?;

        touch_phone(
            &mut *conn,
            session_start,
            representative.guid,
            Some(address.guid),
            "office phone",
            city_address.phone.as_deref().unwrap_or(""),
        )
        .await?;
    }

    // Emails, classified by institutional domain
    for mail in record.mail.iter() {
        let kind = if mail.contains(OFFICIAL_MAIL_DOMAIN) {
            "official"
        } else {
            "other"
        };
        touch_email(&mut *conn, session_start, representative.guid, kind, mail).await?;
    }

    // Homepages: one row per URL, no kind
    for url in &record.homepage {
        touch_website(&mut *conn, session_start, representative.guid, None, url).await?;
    }

    // Social handles: first element only
    if let Some(url) = record.twitter.first() {
        touch_website(
            &mut *conn,
            session_start,
            representative.guid,
            Some("twitter"),
            url,
        )
        .await?;
    }
    if let Some(url) = record.facebook.first() {
        touch_website(
            &mut *conn,
            session_start,
            representative.guid,
            Some("facebook"),
            url,
        )
        .await?;
    }

    Ok(())
}
