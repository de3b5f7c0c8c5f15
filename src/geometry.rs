//! Country shapes from a GeoJSON FeatureCollection.
//!
//! Only Polygon and MultiPolygon features with a `properties.name` string are
//! kept; everything else in the file is skipped. Coordinates stay in lon/lat
//! degrees.

use crate::models::CountryFeature;
use anyhow::{Context, Result, anyhow};
use geo::{BoundingRect, Contains, MultiPolygon, Point, Rect, coord};
use geojson::GeoJson;
use log::{debug, warn};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    features: Vec<CountryFeature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<CountryFeature>) -> Self {
        Self { features }
    }

    pub fn from_geojson(geojson: GeoJson) -> Result<Self> {
        let collection = match geojson {
            GeoJson::FeatureCollection(fc) => fc,
            _ => return Err(anyhow!("GeoJSON must be a FeatureCollection")),
        };

        let mut features = Vec::with_capacity(collection.features.len());
        for feature in collection.features {
            let name = match feature.property("name") {
                Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
                _ => continue,
            };
            let Some(geometry) = feature.geometry else {
                continue;
            };
            let geometry: MultiPolygon<f64> = match geometry.value {
                geojson::Value::Polygon(_) | geojson::Value::MultiPolygon(_) => {
                    let g: geo::Geometry<f64> = geometry
                        .value
                        .try_into()
                        .map_err(|e| anyhow!("Failed to convert geometry of {}: {:?}", name, e))?;
                    match g {
                        geo::Geometry::MultiPolygon(mp) => mp,
                        geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
                        _ => continue,
                    }
                }
                _ => continue, // Skip points/lines
            };
            features.push(CountryFeature::new(name, geometry));
        }
        debug!("loaded {} country features", features.len());
        Ok(Self { features })
    }

    pub fn from_geojson_str(s: &str) -> Result<Self> {
        let geojson: GeoJson = s.parse().context("Failed to parse GeoJSON")?;
        Self::from_geojson(geojson)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open GeoJSON file: {:?}", path))?;
        let geojson = GeoJson::from_reader(BufReader::new(file)).context("Failed to parse GeoJSON")?;
        Self::from_geojson(geojson)
    }

    /// Download the collection once, e.g. at start-up.
    pub fn fetch(url: &str) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent(concat!("wbi_map/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build http client")?;
        let resp = http.get(url).send().with_context(|| format!("GET {}", url))?;
        if !resp.status().is_success() {
            return Err(anyhow!("GET {} failed with HTTP {}", url, resp.status()));
        }
        let text = resp.text().context("read GeoJSON body")?;
        Self::from_geojson_str(&text)
    }

    /// Load from a URL (http/https) or a file path.
    pub fn load(source: &str) -> Result<Self> {
        if source.starts_with("http://") || source.starts_with("https://") {
            Self::fetch(source)
        } else {
            Self::from_path(Path::new(source))
        }
    }

    /// Like [`FeatureCollection::load`], but a missing source yields an empty
    /// map instead of an error.
    pub fn load_or_empty(source: &str) -> Self {
        match Self::load(source) {
            Ok(fc) => fc,
            Err(e) => {
                warn!("no country geometry from {}: {:#}", source, e);
                Self::default()
            }
        }
    }

    pub fn features(&self) -> &[CountryFeature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn by_name(&self, name: &str) -> Option<&CountryFeature> {
        self.features.iter().find(|f| f.name == name)
    }

    /// Feature containing the given lon/lat point, if any.
    pub fn feature_at(&self, lon: f64, lat: f64) -> Option<&CountryFeature> {
        let p = Point::new(lon, lat);
        self.features.iter().find(|f| f.geometry.contains(&p))
    }

    /// Bounding box of all features; the whole globe when empty.
    pub fn bounds(&self) -> Rect<f64> {
        self.features
            .iter()
            .filter_map(|f| f.geometry.bounding_rect())
            .reduce(|a, b| {
                Rect::new(
                    coord! { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
                    coord! { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
                )
            })
            .unwrap_or_else(|| Rect::new(coord! { x: -180.0, y: -90.0 }, coord! { x: 180.0, y: 90.0 }))
    }
}
