use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// How to specify dates in API queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateSpec {
    /// Single year like 2020
    Year(i32),
    /// Inclusive range like 2000..=2020
    Range { start: i32, end: i32 },
}

impl DateSpec {
    pub fn to_query_param(&self) -> String {
        match *self {
            DateSpec::Year(y) => y.to_string(),
            DateSpec::Range { start, end } => format!("{}:{}", start, end),
        }
    }
}

impl Default for DateSpec {
    fn default() -> Self {
        DateSpec::Year(2022)
    }
}

/// Metadata section returned by the API (position 0).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    pub page: u32,
    pub pages: u32,
    /// Some responses encode `per_page` as a string, others as a number.
    /// Accept both and normalize to `u32`.
    #[serde(deserialize_with = "de_u32_from_string_or_number", default)]
    pub per_page: u32,
    #[serde(default)]
    pub total: u32,
}

/// Serde helper: parse `u32` from either a JSON number or a string.
fn de_u32_from_string_or_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    struct U32Visitor;

    impl<'de> Visitor<'de> for U32Visitor {
        type Value = u32;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a string or integer representing a non-negative number")
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v as u32)
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("negative value for u32"));
            }
            Ok(v as u32)
        }

        fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            s.parse::<u32>().map_err(E::custom)
        }
    }

    deserializer.deserialize_any(U32Visitor)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeName {
    pub id: String,
    #[serde(default)]
    pub value: String,
}

/// Raw observation record from the API (position 1 array).
///
/// Only `indicator` is required; the rest of the provider's fields are optional
/// so a sparse record still parses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub indicator: CodeName,
    #[serde(default)]
    pub country: Option<CodeName>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
}

/// ISO 3166-1 alpha-2 country code as used in the provider's URL path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CountryCode(String);

impl CountryCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A country shape handed to us by the rendering side. Only `name` drives the
/// pipeline; `geometry` is there for drawing and hit-testing.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryFeature {
    pub name: String,
    pub geometry: geo::MultiPolygon<f64>,
}

impl CountryFeature {
    pub fn new(name: impl Into<String>, geometry: geo::MultiPolygon<f64>) -> Self {
        Self {
            name: name.into(),
            geometry,
        }
    }

    /// Feature with no geometry, for callers that only have a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, geo::MultiPolygon::new(vec![]))
    }
}

/// One observation after it has been matched against the indicator catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorEntry {
    pub indicator_code: String,
    pub value: Option<f64>,
    pub label: String,
    pub order: usize,
}

/// A single row as shown in the side panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRow {
    pub label: String,
    pub value: f64,
}

/// Label -> value snapshot for one country, ordered by catalog display order.
///
/// Built once per completed request and never edited afterwards; the
/// coordinator swaps whole datasets in and out.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CountryDataset {
    country: Option<CountryCode>,
    rows: BTreeMap<usize, DatasetRow>,
}

impl CountryDataset {
    pub fn new(country: CountryCode) -> Self {
        Self {
            country: Some(country),
            rows: BTreeMap::new(),
        }
    }

    /// Country the dataset was fetched for.
    pub fn country(&self) -> Option<&CountryCode> {
        self.country.as_ref()
    }

    /// Insert an entry unless its display slot is already taken. The provider
    /// lists the newest observation first, so the first value seen is kept.
    /// Entries without a value are ignored. Returns whether the entry was stored.
    pub(crate) fn insert_first(&mut self, entry: IndicatorEntry) -> bool {
        let Some(value) = entry.value else {
            return false;
        };
        if self.rows.contains_key(&entry.order) {
            return false;
        }
        self.rows.insert(
            entry.order,
            DatasetRow {
                label: entry.label,
                value,
            },
        );
        true
    }

    /// `(label, value)` pairs in display order.
    pub fn rows(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.rows.values().map(|r| (r.label.as_str(), r.value))
    }

    pub fn to_rows(&self) -> Vec<DatasetRow> {
        self.rows.values().cloned().collect()
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.rows
            .values()
            .find(|r| r.label == label)
            .map(|r| r.value)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
