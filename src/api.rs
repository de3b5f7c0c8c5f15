//! Blocking client for the **World Bank Indicators API (v2)**, narrowed to what
//! the map needs: one country, the catalog's fixed indicator list, one
//! reference date.
//!
//! The query goes to `country/{code}/indicator/{codes}` with `source=2` (the
//! API requires a source id when several indicators are requested in one call)
//! and the result is folded into a [`CountryDataset`].
//!
//! ### Notes
//! - The API sometimes serializes `per_page` as a **string**; we accept both string/number.
//! - Observations arrive newest first; only the first value per indicator is kept.
//! - Failures are split into [`FetchError::Transport`] (network, status) and
//!   [`FetchError::Malformed`] (body not shaped like `[meta, [records]]`).
//!
//! Typical usage:
//! ```no_run
//! # use wbi_map::{IndicatorClient, models::CountryCode};
//! let client = IndicatorClient::default();
//! let dataset = client.fetch(&CountryCode::new("FR"))?;
//! for (label, value) in dataset.rows() {
//!     println!("{label}: {value}");
//! }
//! # Ok::<(), wbi_map::FetchError>(())
//! ```
use crate::catalog::IndicatorCatalog;
use crate::config::ExplorerConfig;
use crate::error::FetchError;
use crate::models::{CountryCode, CountryDataset, DateSpec, Meta, Observation};
use anyhow::Context;
use log::debug;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};
use reqwest::blocking::Client as HttpClient;
use reqwest::redirect::Policy;
use serde_json::Value;
use std::time::Duration;

/// Anything that can turn a country code into a dataset.
///
/// [`IndicatorClient`] is the real one; the coordinator only depends on this
/// trait so it can run against fixtures.
pub trait IndicatorSource: Send + Sync + 'static {
    fn fetch(&self, country: &CountryCode) -> Result<CountryDataset, FetchError>;
}

// Safety cap to avoid pathological pagination
const MAX_PAGES: u32 = 100;

#[derive(Debug, Clone)]
pub struct IndicatorClient {
    pub base_url: String,
    pub date: DateSpec,
    /// Sleep before each retry of a 5xx or network failure.
    pub retry_backoff_ms: Vec<u64>,
    catalog: IndicatorCatalog,
    http: HttpClient,
}

impl Default for IndicatorClient {
    fn default() -> Self {
        Self::new(&ExplorerConfig::default(), IndicatorCatalog::builtin())
            .expect("reqwest client build")
    }
}

// Allow -, _, . unescaped in codes (common for indicator ids)
const SAFE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

fn enc_join<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .map(|s| percent_encoding::utf8_percent_encode(s.trim(), SAFE).to_string())
        .collect::<Vec<_>>()
        .join(";")
}

impl IndicatorClient {
    pub fn new(config: &ExplorerConfig, catalog: IndicatorCatalog) -> anyhow::Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .redirect(Policy::limited(5))
            .user_agent(concat!("wbi_map/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build http client")?;
        Ok(Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            date: config.reference_date,
            retry_backoff_ms: config.retry_backoff_ms.clone(),
            catalog,
            http,
        })
    }

    pub fn catalog(&self) -> &IndicatorCatalog {
        &self.catalog
    }

    /// URL of the first page for `country`.
    pub fn query_url(&self, country: &CountryCode) -> String {
        format!(
            "{}/country/{}/indicator/{}?source=2&format=json&per_page=1000&date={}",
            self.base_url,
            enc_join([country.as_str()]),
            enc_join(self.catalog.codes()),
            self.date.to_query_param()
        )
    }

    /// GET with a small retry for transient failures (5xx / network errors).
    fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        let mut attempt = 0usize;
        loop {
            let last_err = match self.http.get(url).send() {
                Ok(r) if r.status().is_success() => {
                    let body = r
                        .text()
                        .map_err(|e| FetchError::Transport(format!("read body: {e}")))?;
                    return serde_json::from_str(&body)
                        .map_err(|e| FetchError::Malformed(format!("decode json: {e}")));
                }
                Ok(r) if r.status().is_server_error() => format!("HTTP {}", r.status()),
                Ok(r) => return Err(FetchError::Transport(format!("HTTP {}", r.status()))),
                Err(e) => format!("network error: {e}"),
            };
            match self.retry_backoff_ms.get(attempt) {
                Some(&backoff_ms) => {
                    debug!("GET {url} failed ({last_err}), retrying in {backoff_ms} ms");
                    std::thread::sleep(Duration::from_millis(backoff_ms));
                    attempt += 1;
                }
                None => return Err(FetchError::Transport(last_err)),
            }
        }
    }

    /// Fetch the catalog's indicators for one country.
    ///
    /// An empty dataset is a valid answer (the country has no values for the
    /// reference date); only transport and shape problems are errors.
    pub fn fetch(&self, country: &CountryCode) -> Result<CountryDataset, FetchError> {
        let url = self.query_url(country);
        let mut dataset = CountryDataset::new(country.clone());

        let mut page = 1u32;
        loop {
            let page_url = format!("{}&page={}", url, page);
            debug!("GET {}", page_url);
            let v = self.get_json(&page_url)?;
            let meta = fold_page(&v, &self.catalog, &mut dataset)?;

            let total_pages = meta.map(|m| m.pages).unwrap_or(1);
            if page >= total_pages || page >= MAX_PAGES {
                break;
            }
            page += 1;
        }
        debug!("{}: {} indicators resolved", country, dataset.len());
        Ok(dataset)
    }
}

impl IndicatorSource for IndicatorClient {
    fn fetch(&self, country: &CountryCode) -> Result<CountryDataset, FetchError> {
        IndicatorClient::fetch(self, country)
    }
}

/// Fold one response page into `dataset`.
///
/// The page must be `[metadata, records]` where `records` is an array of
/// observations or `null` (the provider's way of saying "no rows"). Returns
/// the page metadata if it could be read, for pagination.
pub fn fold_page(
    v: &Value,
    catalog: &IndicatorCatalog,
    dataset: &mut CountryDataset,
) -> Result<Option<Meta>, FetchError> {
    let arr = v
        .as_array()
        .ok_or_else(|| FetchError::Malformed("not a top-level array".into()))?;
    if arr.len() != 2 {
        // Error payloads come back as a lone `[{"message": [...]}]`.
        let detail = match arr.first().and_then(|m| m.get("message")) {
            Some(msg) => format!("provider error: {msg}"),
            None => format!("expected 2 top-level elements, got {}", arr.len()),
        };
        return Err(FetchError::Malformed(detail));
    }

    let meta = serde_json::from_value::<Meta>(arr[0].clone()).ok();

    let records: Vec<Observation> = match &arr[1] {
        Value::Null => Vec::new(),
        Value::Array(_) => serde_json::from_value(arr[1].clone())
            .map_err(|e| FetchError::Malformed(format!("parse records: {e}")))?,
        other => {
            return Err(FetchError::Malformed(format!(
                "second element is not an array: {other}"
            )));
        }
    };

    for obs in records {
        if obs.value.is_none() {
            continue;
        }
        if let Some(entry) = catalog.entry(&obs.indicator.id, obs.value) {
            dataset.insert_first(entry);
        }
    }
    Ok(meta)
}

/// Parse a complete single-page response into a fresh dataset.
pub fn parse_dataset(
    country: &CountryCode,
    v: &Value,
    catalog: &IndicatorCatalog,
) -> Result<CountryDataset, FetchError> {
    let mut dataset = CountryDataset::new(country.clone());
    fold_page(v, catalog, &mut dataset)?;
    Ok(dataset)
}
