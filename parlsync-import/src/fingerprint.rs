//! Entity fingerprints
//!
//! Every reconciled entity carries a deterministic content hash over an
//! ordered projection of its fields, stored for change detection and API
//! cache keys. Natural-key lookup, not the fingerprint, is what drives
//! deduplication; the fingerprint is a derived artifact.

use sha2::{Digest, Sha256};

/// Stands in for absent fields so optional data hashes deterministically
const ABSENT_SENTINEL: &str = "None";

/// Hash an ordered sequence of optional string fields
///
/// Stable across runs for identical input; absent fields contribute the
/// fixed sentinel instead of failing.
pub fn fingerprint<'a, I>(fields: I) -> String
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut hasher = Sha256::new();
    for field in fields {
        hasher.update(field.unwrap_or(ABSENT_SENTINEL).as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Representative fingerprint: the stable remote identifier alone
pub fn representative_fingerprint(remote_id: &str) -> String {
    fingerprint([Some(remote_id)])
}

/// Group fingerprint over (name, abbreviation, kind)
pub fn group_fingerprint(name: &str, abbreviation: Option<&str>, kind: &str) -> String {
    fingerprint([Some(name), abbreviation, Some(kind)])
}

/// Constituency fingerprint over the name
pub fn constituency_fingerprint(name: &str) -> String {
    fingerprint([Some(name)])
}

/// Mandate fingerprint over the fingerprints of its endpoints plus the
/// role and date bounds
pub fn mandate_fingerprint(
    group_fingerprint: &str,
    constituency_fingerprint: &str,
    role: &str,
    begin_date: Option<&str>,
    end_date: Option<&str>,
    representative_fingerprint: &str,
) -> String {
    fingerprint([
        Some(group_fingerprint),
        Some(constituency_fingerprint),
        Some(role),
        begin_date,
        end_date,
        Some(representative_fingerprint),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable() {
        let a = fingerprint([Some("EPP"), Some("group")]);
        let b = fingerprint([Some("EPP"), Some("group")]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64, "lowercase hex sha256");
    }

    #[test]
    fn test_fingerprint_distinguishes_field_values() {
        let a = fingerprint([Some("EPP"), Some("group")]);
        let b = fingerprint([Some("SD"), Some("group")]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_absent_field_uses_sentinel() {
        let absent = fingerprint([Some("Delegation X"), None, Some("delegation")]);
        let sentinel = fingerprint([Some("Delegation X"), Some("None"), Some("delegation")]);
        assert_eq!(absent, sentinel);
        // Absent and empty are distinct inputs
        let empty = fingerprint([Some("Delegation X"), Some(""), Some("delegation")]);
        assert_ne!(absent, empty);
    }

    #[test]
    fn test_representative_fingerprint_depends_only_on_remote_id() {
        assert_eq!(
            representative_fingerprint("101"),
            representative_fingerprint("101")
        );
        assert_ne!(
            representative_fingerprint("101"),
            representative_fingerprint("102")
        );
    }
}
