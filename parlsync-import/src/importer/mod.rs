//! Incremental reconciliation importer
//!
//! The orchestrator drives one session over the record stream; the
//! resolvers map each record's sub-structures onto the normalized entity
//! graph through the touch primitives in `crate::db`.

pub mod contacts;
pub mod dates;
pub mod lookups;
pub mod mandates;
pub mod names;
pub mod orchestrator;
pub mod session;

pub use lookups::LookupTables;
pub use orchestrator::ImportOrchestrator;
pub use session::{ImportState, ImporterSession};
