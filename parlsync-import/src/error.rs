//! Error types for parlsync-import
//!
//! Errors fall into three tiers with different blast radii:
//! - sub-item errors (missing committee id, unrecognized city) are handled
//!   in place by the resolvers and never surface here;
//! - record-scoped errors roll back that record's transaction and let the
//!   session continue;
//! - everything else (store failures, undecodable input) fails the session.

use thiserror::Error;

/// Import error type
#[derive(Debug, Error)]
pub enum ImportError {
    /// Record parsed as JSON but does not match the source schema
    #[error("invalid record shape: {0}")]
    InvalidRecord(String),

    /// Date field does not match the feed's timestamp format
    #[error("malformed date {value:?}: {source}")]
    MalformedDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// Country reference data missing; operator must reseed
    #[error("unknown country in reference data: {0}")]
    UnknownCountry(String),

    /// Source stream failure (undecodable line, read error)
    #[error("source stream error: {0}")]
    Stream(String),

    /// Storage failure at session scope
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl ImportError {
    /// True when the error fails only the current record, not the session
    pub fn is_record_scoped(&self) -> bool {
        matches!(
            self,
            ImportError::InvalidRecord(_)
                | ImportError::MalformedDate { .. }
                | ImportError::UnknownCountry(_)
        )
    }
}
