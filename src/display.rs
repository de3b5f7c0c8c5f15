//! Side-panel view model: what the panel shows for the current selection.

use crate::coordinator::InteractionCoordinator;
use crate::models::CountryDataset;
use num_format::{Locale, ToFormattedString};

pub const NO_DATA: &str = "No data";

/// Format a value for the panel: integers with thousands separators, other
/// numbers with up to two decimals and trailing zeros trimmed.
pub fn format_value(v: f64, locale: &Locale) -> String {
    if !v.is_finite() {
        return "NA".to_string();
    }
    if v.fract() == 0.0 && v.abs() < 1e15 {
        let n = v as i64;
        return n.to_formatted_string(locale);
    }
    let s = format!("{:.2}", v);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Plain rendering without grouping, e.g. `67000000` or `82.5`.
pub fn format_plain(v: f64) -> String {
    if !v.is_finite() {
        return "NA".to_string();
    }
    let s = format!("{:.4}", v);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub enum PanelBody {
    /// Nothing clicked yet.
    Empty,
    Loading,
    /// Selection has no dataset (unresolved, failed, or no rows).
    NoData,
    Rows(Vec<(String, String)>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelView {
    pub title: Option<String>,
    pub body: PanelBody,
}

impl PanelView {
    pub fn from_dataset(title: Option<&str>, dataset: Option<&CountryDataset>, locale: &Locale) -> Self {
        let body = match dataset {
            Some(ds) if !ds.is_empty() => PanelBody::Rows(
                ds.rows()
                    .map(|(label, v)| (label.to_string(), format_value(v, locale)))
                    .collect(),
            ),
            _ if title.is_none() => PanelBody::Empty,
            _ => PanelBody::NoData,
        };
        Self {
            title: title.map(str::to_string),
            body,
        }
    }

    pub fn from_coordinator(c: &InteractionCoordinator, locale: &Locale) -> Self {
        if c.is_loading() {
            return Self {
                title: c.selected_country().map(str::to_string),
                body: PanelBody::Loading,
            };
        }
        Self::from_dataset(c.selected_country(), c.dataset(), locale)
    }

    /// Text lines as printed by the CLI.
    pub fn lines(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(t) = &self.title {
            out.push(t.clone());
        }
        match &self.body {
            PanelBody::Empty => out.push("Click a country".to_string()),
            PanelBody::Loading => out.push("Loading...".to_string()),
            PanelBody::NoData => out.push(NO_DATA.to_string()),
            PanelBody::Rows(rows) => {
                out.extend(rows.iter().map(|(l, v)| format!("{}: {}", l, v)));
            }
        }
        out
    }
}
