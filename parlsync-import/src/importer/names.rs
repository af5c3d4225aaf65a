//! Name normalization and slugs
//!
//! The feed splits full names mechanically and mangles nobiliary
//! particles; the correction tables are exact-match overrides, everything
//! else keeps the source-provided split as-is.

use crate::importer::lookups::LookupTables;
use crate::record::SourceName;

/// Canonical name fields for a representative
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedName {
    pub first_name: String,
    pub last_name: String,
    /// Set only for names whose conventional split needs a disambiguated
    /// variant
    pub last_name_with_prefix: Option<String>,
    pub full_name: String,
    pub slug: String,
}

/// Resolve raw source name fields into canonical fields and a URL slug
pub fn normalize_name(name: &SourceName, lookups: &LookupTables) -> NormalizedName {
    let mut last_name = name.family.clone();
    let mut last_name_with_prefix = None;

    if let Some(corrected) = lookups.last_name_correction(&name.full) {
        last_name = corrected.to_string();
    } else if let Some(stripped) = lookups.prefixless_last_name(&name.family) {
        last_name_with_prefix = Some(stripped.to_string());
    }

    let slug_source = if name.full.is_empty() {
        format!("{} {}", name.sur, name.family)
    } else {
        name.full.clone()
    };

    NormalizedName {
        first_name: name.sur.clone(),
        last_name,
        last_name_with_prefix,
        full_name: name.full.clone(),
        slug: slugify(&slug_source),
    }
}

/// Generate a URL-safe slug from a name
///
/// Lowercase, alphanumeric runs joined by hyphens, edge hyphens trimmed.
/// Slugs are a lossy mapping; collisions across distinct names are
/// acceptable.
pub fn slugify(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
