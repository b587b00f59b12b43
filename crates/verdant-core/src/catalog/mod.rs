//! Scene catalogs.
//!
//! The core never owns a process-wide catalog session: callers construct a
//! [`CatalogClient`] and pass it to the pipeline explicitly.

pub mod manifest;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::consts::{DEFAULT_CLOUD_COVER_MAX, DEFAULT_COLLECTION};
use crate::error::Result;
use crate::scene::{BoundingBox, Scene, TimeRange};

pub use manifest::ManifestCatalog;

/// Item search parameters (bbox, datetime interval, cloud-cover query).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    pub bbox: BoundingBox,
    pub time_range: TimeRange,
    /// Scenes must have cloud cover strictly below this percentage.
    pub cloud_cover_max: f32,
    pub collections: Vec<String>,
}

impl SearchParams {
    pub fn new(bbox: BoundingBox, time_range: TimeRange) -> Self {
        Self {
            bbox,
            time_range,
            cloud_cover_max: DEFAULT_CLOUD_COVER_MAX,
            collections: vec![DEFAULT_COLLECTION.to_string()],
        }
    }

    pub fn cloud_cover_max(mut self, max: f32) -> Self {
        self.cloud_cover_max = max;
        self
    }

    /// True when an item with this footprint, time and cloud cover satisfies the search.
    pub fn matches(
        &self,
        footprint: &BoundingBox,
        acquired: &DateTime<Utc>,
        cloud_cover: f32,
    ) -> bool {
        footprint.intersects(&self.bbox)
            && self.time_range.contains(acquired)
            && cloud_cover < self.cloud_cover_max
    }
}

/// Source of scenes for a bounding box and time window.
///
/// Implementations return only scenes whose footprint intersects the bbox,
/// whose acquisition time falls in the range and whose cloud cover is below
/// the threshold. Downstream stages do not re-check these guarantees.
pub trait CatalogClient {
    fn search(&self, params: &SearchParams) -> Result<Vec<Scene>>;
}

/// Catalog over scenes already held in memory.
#[derive(Clone, Debug, Default)]
pub struct InMemoryCatalog {
    scenes: Vec<Scene>,
}

impl InMemoryCatalog {
    pub fn new(scenes: Vec<Scene>) -> Self {
        Self { scenes }
    }

    pub fn push(&mut self, scene: Scene) {
        self.scenes.push(scene);
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}

impl CatalogClient for InMemoryCatalog {
    fn search(&self, params: &SearchParams) -> Result<Vec<Scene>> {
        let found: Vec<Scene> = self
            .scenes
            .iter()
            .filter(|s| params.matches(&s.footprint, &s.acquired, s.cloud_cover))
            .cloned()
            .collect();
        debug!(
            held = self.scenes.len(),
            matched = found.len(),
            "In-memory catalog search"
        );
        Ok(found)
    }
}
