//! File-backed catalog.
//!
//! A manifest is a JSON list of STAC-like items. Each item names its
//! acquisition time, footprint, cloud cover and one raster file per asset:
//!
//! ```json
//! {
//!   "collection": "landsat-c2-l2",
//!   "items": [{
//!     "id": "LC08_L2SP_042034_20210115",
//!     "datetime": "2021-01-15T18:31:02Z",
//!     "bbox": [-120.1, 35.9, -119.5, 36.4],
//!     "eo:cloud_cover": 1.8,
//!     "assets": { "red": "b4.tif", "nir08": "b5.tif", "lwir": "b10.tif", "qa_pixel": "qa.tif" }
//!   }]
//! }
//! ```
//!
//! Asset paths are resolved against the manifest's directory. Rasters are
//! read only for items that match a search.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::consts::DEFAULT_COLLECTION;
use crate::error::Result;
use crate::io::raster::load_band;
use crate::scene::{BandName, BoundingBox, Scene};

use super::{CatalogClient, SearchParams};

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default = "default_collection")]
    pub collection: String,
    pub items: Vec<ManifestItem>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ManifestItem {
    pub id: String,
    pub datetime: DateTime<Utc>,
    pub bbox: [f64; 4],
    #[serde(default, rename = "eo:cloud_cover", alias = "cloud_cover")]
    pub cloud_cover: f32,
    /// Asset key -> raster path.
    pub assets: BTreeMap<String, PathBuf>,
}

#[derive(Clone, Debug)]
pub struct ManifestCatalog {
    root: PathBuf,
    manifest: Manifest,
}

impl ManifestCatalog {
    /// Read a manifest file. Relative asset paths resolve against its directory.
    pub fn open(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let manifest: Manifest = serde_json::from_str(&contents)?;
        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        info!(
            path = %path.display(),
            items = manifest.items.len(),
            collection = %manifest.collection,
            "Opened scene manifest"
        );
        Ok(Self { root, manifest })
    }

    pub fn from_manifest(manifest: Manifest, root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            manifest,
        }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Items matching the search, without reading any raster.
    pub fn matching_items(&self, params: &SearchParams) -> Result<Vec<&ManifestItem>> {
        if !params.collections.is_empty()
            && !params.collections.contains(&self.manifest.collection)
        {
            return Ok(Vec::new());
        }
        let mut found = Vec::new();
        for item in &self.manifest.items {
            let footprint = BoundingBox::from_array(item.bbox)?;
            if params.matches(&footprint, &item.datetime, item.cloud_cover) {
                found.push(item);
            }
        }
        Ok(found)
    }

    fn load_scene(&self, item: &ManifestItem) -> Result<Scene> {
        let footprint = BoundingBox::from_array(item.bbox)?;
        let mut scene =
            Scene::new(item.id.clone(), item.datetime, footprint).with_cloud_cover(item.cloud_cover);
        for (key, rel) in &item.assets {
            let Ok(band) = key.parse::<BandName>() else {
                debug!(scene = %item.id, asset = %key, "Skipping non-band asset");
                continue;
            };
            let path = if rel.is_absolute() {
                rel.clone()
            } else {
                self.root.join(rel)
            };
            scene.bands.insert(band, load_band(&path)?);
        }
        Ok(scene)
    }
}

impl CatalogClient for ManifestCatalog {
    fn search(&self, params: &SearchParams) -> Result<Vec<Scene>> {
        let items = self.matching_items(params)?;
        debug!(
            matched = items.len(),
            total = self.manifest.items.len(),
            "Manifest search"
        );
        items.into_iter().map(|item| self.load_scene(item)).collect()
    }
}
