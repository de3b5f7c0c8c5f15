//! wbi_map
//!
//! The data side of an interactive world map: hover a country to see its name,
//! click it to flash it and load a handful of World Bank indicators into a side
//! panel. Pairs with the `wbi-map` CLI and the `wbi-map-gui` desktop app.
//!
//! ### Pipeline
//! - [`resolver::CodeResolver`]: GeoJSON country name -> ISO code
//! - [`catalog::IndicatorCatalog`]: indicator code -> label and display order
//! - [`api::IndicatorClient`]: one request per click, folded into a [`models::CountryDataset`]
//! - [`highlight::HighlightController`] and [`tooltip::TooltipController`]: UI state machines
//! - [`coordinator::InteractionCoordinator`]: routes pointer events and drops stale results
//!
//! ### Example
//! ```no_run
//! use std::time::{Duration, Instant};
//! use wbi_map::{ExplorerConfig, InteractionCoordinator, models::CountryFeature};
//!
//! let mut coord = InteractionCoordinator::from_config(&ExplorerConfig::default())?;
//! coord.click(&CountryFeature::named("France"), Instant::now());
//! coord.wait_for_completion(Duration::from_secs(30));
//! if let Some(ds) = coord.dataset() {
//!     for (label, value) in ds.rows() {
//!         println!("{label}: {value}");
//!     }
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod api;
pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod display;
pub mod error;
pub mod geometry;
pub mod highlight;
pub mod models;
pub mod resolver;
pub mod tooltip;

pub use api::{IndicatorClient, IndicatorSource};
pub use catalog::IndicatorCatalog;
pub use config::ExplorerConfig;
pub use coordinator::{InteractionCoordinator, RequestToken, Settled};
pub use error::{Failure, FailureKind, FetchError};
pub use models::{CountryCode, CountryDataset, CountryFeature, DateSpec};
pub use resolver::{CodeResolver, Resolution};
