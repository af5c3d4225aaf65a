//! External correction tables
//!
//! Long-tail data cleaning lives in TOML files, not code: the name-fix
//! table and the political-group alias table grow as the feed invents new
//! spellings, and operators can swap them without a redeploy. The files
//! shipped under `data/` are embedded as compile-time defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

const BUILTIN_NAME_CORRECTIONS: &str = include_str!("../../data/name_corrections.toml");
const BUILTIN_GROUP_ALIASES: &str = include_str!("../../data/group_aliases.toml");

#[derive(Debug, Clone, Default, Deserialize)]
struct NameCorrections {
    /// Exact full name → replacement last name
    #[serde(default)]
    last_name_by_full_name: HashMap<String, String>,

    /// Exact last name → prefix-stripped variant
    #[serde(default)]
    prefixless_last_name: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct GroupAliases {
    #[serde(default)]
    aliases: HashMap<String, String>,
}

/// The correction tables threaded through the resolvers
#[derive(Debug, Clone)]
pub struct LookupTables {
    names: NameCorrections,
    groups: GroupAliases,
}

impl LookupTables {
    /// Tables embedded at compile time
    pub fn builtin() -> Self {
        Self::from_toml(BUILTIN_NAME_CORRECTIONS, BUILTIN_GROUP_ALIASES)
            .expect("embedded lookup tables are well-formed")
    }

    /// Parse tables from TOML text
    pub fn from_toml(name_corrections: &str, group_aliases: &str) -> Result<Self> {
        Ok(Self {
            names: toml::from_str(name_corrections)
                .context("parse name correction table")?,
            groups: toml::from_str(group_aliases).context("parse group alias table")?,
        })
    }

    /// Load tables, overriding either builtin with a file where a path is
    /// configured
    pub fn load(
        name_corrections_path: Option<&Path>,
        group_aliases_path: Option<&Path>,
    ) -> Result<Self> {
        let names = match name_corrections_path {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("read {}", path.display()))?,
            None => BUILTIN_NAME_CORRECTIONS.to_string(),
        };
        let groups = match group_aliases_path {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("read {}", path.display()))?,
            None => BUILTIN_GROUP_ALIASES.to_string(),
        };
        Self::from_toml(&names, &groups)
    }

    /// Last-name replacement for an exactly-matching full name
    pub fn last_name_correction(&self, full_name: &str) -> Option<&str> {
        self.names
            .last_name_by_full_name
            .get(full_name)
            .map(String::as_str)
    }

    /// Prefix-stripped variant for an exactly-matching last name
    pub fn prefixless_last_name(&self, last_name: &str) -> Option<&str> {
        self.names
            .prefixless_last_name
            .get(last_name)
            .map(String::as_str)
    }

    /// Canonical abbreviation for a political group; unknown abbreviations
    /// pass through unchanged
    pub fn group_alias<'a>(&'a self, abbreviation: &'a str) -> &'a str {
        self.groups
            .aliases
            .get(abbreviation)
            .map(String::as_str)
            .unwrap_or(abbreviation)
    }
}

impl Default for LookupTables {
    fn default() -> Self {
        Self::builtin()
    }
}
