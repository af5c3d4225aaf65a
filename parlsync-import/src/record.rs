//! Source record schema and dump framing
//!
//! The upstream dump is loosely shaped: fields may be absent, scalar or
//! list, and identifiers arrive as strings or integers. All of that is
//! normalized here, at the ingestion boundary, so the resolvers downstream
//! work against a typed schema instead of probing JSON.
//!
//! Dump framing: a JSON array pretty-printed one record per line, with
//! `[` glued to the first record, separator lines holding a lone `,`, and
//! a closing `]` line. A line that fails to decode is a stream-level error
//! (the session aborts); a decoded record that fails schema validation
//! fails only that record.

use crate::error::ImportError;
use parlsync_common::Error as CommonError;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::BufRead;

/// One raw representative record from the dump
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceRecord {
    /// Stable external identifier; records without one are skipped
    #[serde(rename = "UserID", default, deserialize_with = "opt_string_or_int")]
    pub remote_id: Option<String>,

    #[serde(rename = "Name", default)]
    pub name: SourceName,

    #[serde(rename = "Birth")]
    pub birth: Option<SourceBirth>,

    /// "F", "M", or anything else (treated as unknown)
    #[serde(rename = "Gender")]
    pub gender: Option<String>,

    /// Biography entries, joined into free text on import
    #[serde(rename = "CV", default)]
    pub cv: Vec<String>,

    #[serde(rename = "Photo")]
    pub photo: Option<String>,

    #[serde(default)]
    pub active: bool,

    #[serde(rename = "Committees", default)]
    pub committees: Vec<CommitteeEntry>,

    #[serde(rename = "Delegations", default)]
    pub delegations: Vec<DelegationEntry>,

    #[serde(rename = "Groups", default)]
    pub groups: Vec<GroupEntry>,

    /// Entries may be null in the feed; nulls are skipped
    #[serde(rename = "Constituencies", default)]
    pub constituencies: Vec<Option<ConstituencyEntry>>,

    #[serde(rename = "Staff", default)]
    pub staff: Vec<StaffEntry>,

    /// City name → address payload; only recognized cities are read, so
    /// values stay untyped until a city matches
    #[serde(rename = "Addresses", default)]
    pub addresses: HashMap<String, serde_json::Value>,

    #[serde(rename = "Mail", default)]
    pub mail: OneOrMany<String>,

    #[serde(rename = "Homepage", default)]
    pub homepage: Vec<String>,

    #[serde(rename = "Twitter", default)]
    pub twitter: Vec<String>,

    #[serde(rename = "Facebook", default)]
    pub facebook: Vec<String>,
}

impl SourceRecord {
    /// Validate a decoded JSON value against the source schema
    pub fn from_value(value: serde_json::Value) -> Result<Self, ImportError> {
        serde_json::from_value(value).map_err(|e| ImportError::InvalidRecord(e.to_string()))
    }
}

/// Raw name fields as the feed splits them
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceName {
    /// Surname field; holds the *first* name in this feed
    #[serde(default)]
    pub sur: String,

    #[serde(default)]
    pub family: String,

    #[serde(default)]
    pub full: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceBirth {
    pub date: Option<String>,
    pub place: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitteeEntry {
    /// Not every committee-shaped entry carries one; entries without it
    /// are skipped
    #[serde(default)]
    pub committee_id: Option<String>,

    #[serde(rename = "Organization")]
    pub organization: String,

    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DelegationEntry {
    #[serde(rename = "Organization")]
    pub organization: String,

    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupEntry {
    /// Abbreviation, scalar or list (first element wins); entries without
    /// it are skipped
    #[serde(default)]
    pub groupid: Option<OneOrMany<String>>,

    #[serde(rename = "Organization")]
    pub organization: String,

    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConstituencyEntry {
    pub country: String,

    /// Local party label; placeholder dashes are treated as absent
    #[serde(default)]
    pub party: Option<String>,

    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StaffEntry {
    #[serde(rename = "Organization")]
    pub organization: String,

    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

/// Payload of a recognized city in the address map
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CityAddress {
    #[serde(rename = "Address")]
    pub address: Option<CityAddressDetail>,

    #[serde(rename = "Phone")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CityAddressDetail {
    /// Combined office code, e.g. "04217" (floor "042", office "17")
    #[serde(rename = "Office")]
    pub office: Option<String>,
}

/// A field the feed serializes as either a scalar or a list
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn first(&self) -> Option<&T> {
        match self {
            OneOrMany::One(value) => Some(value),
            OneOrMany::Many(values) => values.first(),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        match self {
            OneOrMany::One(value) => std::slice::from_ref(value).iter(),
            OneOrMany::Many(values) => values.iter(),
        }
    }
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

/// Accept an identifier as string or integer; empty and zero values count
/// as absent
fn opt_string_or_int<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(s)) if !s.is_empty() => Some(s),
        Some(Raw::Number(n)) if n != 0 => Some(n.to_string()),
        _ => None,
    })
}

/// Iterate the raw records of a line-framed dump
///
/// Yields one decoded JSON value per record line. Any I/O or decode
/// failure is yielded as an error and terminates the session upstream;
/// the stream is not restartable.
pub fn iter_dump_records<R: BufRead>(
    reader: R,
) -> impl Iterator<Item = parlsync_common::Result<serde_json::Value>> {
    reader.lines().filter_map(|line| {
        let line = match line {
            Ok(line) => line,
            Err(e) => return Some(Err(CommonError::Io(e))),
        };

        let trimmed = line.trim();
        let trimmed = trimmed.strip_prefix('[').unwrap_or(trimmed);
        let trimmed = trimmed.strip_suffix(']').unwrap_or(trimmed);
        let trimmed = trimmed.trim();
        if trimmed.is_empty() || trimmed == "," {
            return None;
        }

        Some(
            serde_json::from_str(trimmed)
                .map_err(|e| CommonError::InvalidInput(format!("undecodable dump line: {}", e))),
        )
    })
}
