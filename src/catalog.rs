//! Indicator code -> label and display order.

use crate::error::TableError;
use crate::models::IndicatorEntry;
use ahash::AHashMap;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

const BUILTIN_CATALOG: &str = include_str!("../data/indicators.json");

#[derive(Debug, Clone, Deserialize)]
struct CatalogRecord {
    code: String,
    label: String,
}

/// Fixed set of indicators the explorer asks for. Codes not in here are noise
/// and never reach a dataset.
#[derive(Debug, Clone)]
pub struct IndicatorCatalog {
    ordered: Vec<CatalogRecord>,
    index: AHashMap<String, usize>,
}

impl Default for IndicatorCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl IndicatorCatalog {
    pub fn builtin() -> Self {
        Self::from_json_str(BUILTIN_CATALOG).unwrap_or_else(|_| Self {
            ordered: Vec::new(),
            index: AHashMap::new(),
        })
    }

    /// Build from a JSON array of `{"code": .., "label": ..}`; array position
    /// is the display order.
    pub fn from_json_str(s: &str) -> Result<Self, TableError> {
        let records: Vec<CatalogRecord> = serde_json::from_str(s)?;
        let mut ordered = Vec::with_capacity(records.len());
        let mut index = AHashMap::with_capacity(records.len());
        for rec in records {
            let code = rec.code.trim().to_string();
            let label = rec.label.trim().to_string();
            if code.is_empty() {
                return Err(TableError::EmptyField("indicator code"));
            }
            if label.is_empty() {
                return Err(TableError::EmptyField("indicator label"));
            }
            if index.contains_key(&code) {
                return Err(TableError::DuplicateCode(code));
            }
            index.insert(code.clone(), ordered.len());
            ordered.push(CatalogRecord { code, label });
        }
        Ok(Self { ordered, index })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read indicator catalog {}", path.display()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("parse indicator catalog {}", path.display()))
    }

    pub fn label_for(&self, code: &str) -> Option<&str> {
        self.index
            .get(code)
            .map(|&i| self.ordered[i].label.as_str())
    }

    pub fn order_of(&self, code: &str) -> Option<usize> {
        self.index.get(code).copied()
    }

    /// Match a raw observation against the catalog. `None` for unknown codes.
    pub fn entry(&self, code: &str, value: Option<f64>) -> Option<IndicatorEntry> {
        let order = self.order_of(code)?;
        Some(IndicatorEntry {
            indicator_code: code.to_string(),
            value,
            label: self.ordered[order].label.clone(),
            order,
        })
    }

    /// Codes in display order.
    pub fn codes(&self) -> impl Iterator<Item = &str> + '_ {
        self.ordered.iter().map(|r| r.code.as_str())
    }

    /// `(code, label)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.ordered
            .iter()
            .map(|r| (r.code.as_str(), r.label.as_str()))
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}
