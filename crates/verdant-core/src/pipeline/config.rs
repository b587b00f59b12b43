use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::SearchParams;
use crate::consts::{DEFAULT_CLOUD_COVER_MAX, DEFAULT_COLLECTION};
use crate::error::{Result, VerdantError};
use crate::index::{BandScaling, IndexKind};
use crate::mask::{QaBitmask, QaFlag};
use crate::scene::{BandName, BoundingBox, GridSpec, TimeRange};
use crate::season::Weighting;
use crate::stack::Resampling;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Scene manifest read by the file-backed catalog.
    pub catalog: PathBuf,
    pub output_dir: PathBuf,
    #[serde(default = "default_indices")]
    pub indices: Vec<IndexKind>,
    pub search: SearchConfig,
    #[serde(default)]
    pub mask: MaskConfig,
    #[serde(default)]
    pub stacking: StackingConfig,
    #[serde(default)]
    pub aggregation: AggregationConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_indices() -> Vec<IndexKind> {
    vec![IndexKind::Ndvi, IndexKind::Lst]
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            catalog: PathBuf::from("manifest.json"),
            output_dir: PathBuf::from("composites"),
            indices: default_indices(),
            search: SearchConfig::default(),
            mask: MaskConfig::default(),
            stacking: StackingConfig::default(),
            aggregation: AggregationConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.indices.is_empty() {
            return Err(VerdantError::InvalidConfig("no indices selected".into()));
        }
        if let Some(grid) = self.stacking.grid {
            if grid.pixel_count() == 0 {
                return Err(VerdantError::InvalidConfig(format!("grid {grid} is empty")));
            }
        }
        self.search.to_params()?;
        self.mask.bitmask()?;
        Ok(())
    }

    /// Bands the stack must carry for the selected indices and mask.
    pub fn required_bands(&self) -> Result<Vec<BandName>> {
        let mut bands: BTreeSet<BandName> = self
            .indices
            .iter()
            .flat_map(|k| k.required_bands().iter().copied())
            .collect();
        if !self.mask.bitmask()?.is_empty() {
            bands.insert(BandName::Qa);
        }
        Ok(bands.into_iter().collect())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchConfig {
    /// `[west, south, east, north]` in degrees.
    pub bbox: [f64; 4],
    /// First acquisition day, inclusive.
    pub start: NaiveDate,
    /// Last acquisition day, inclusive.
    pub end: NaiveDate,
    /// Scenes must have cloud cover strictly below this percentage.
    #[serde(default = "default_cloud_cover_max")]
    pub cloud_cover_max: f32,
    #[serde(default = "default_collections")]
    pub collections: Vec<String>,
}

fn default_cloud_cover_max() -> f32 {
    DEFAULT_CLOUD_COVER_MAX
}

fn default_collections() -> Vec<String> {
    vec![DEFAULT_COLLECTION.to_string()]
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            bbox: [-180.0, -90.0, 180.0, 90.0],
            start: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2021, 12, 31).unwrap_or_default(),
            cloud_cover_max: default_cloud_cover_max(),
            collections: default_collections(),
        }
    }
}

impl SearchConfig {
    pub fn to_params(&self) -> Result<SearchParams> {
        if self.cloud_cover_max.is_nan() || self.cloud_cover_max <= 0.0 {
            return Err(VerdantError::InvalidConfig(format!(
                "cloud_cover_max {} must be positive",
                self.cloud_cover_max
            )));
        }
        let bbox = BoundingBox::from_array(self.bbox)?;
        let time_range = TimeRange::from_dates(self.start, self.end)?;
        let mut params = SearchParams::new(bbox, time_range).cloud_cover_max(self.cloud_cover_max);
        params.collections = self.collections.clone();
        Ok(params)
    }
}

/// Which QA conditions make a pixel unusable. Nothing is implied: only the
/// listed flags and bit positions are masked.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MaskConfig {
    #[serde(default = "QaFlag::default_unusable")]
    pub flags: Vec<QaFlag>,
    /// Additional raw bit positions (e.g. confidence bits 8-15).
    #[serde(default)]
    pub extra_bits: Vec<u8>,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            flags: QaFlag::default_unusable(),
            extra_bits: Vec::new(),
        }
    }
}

impl MaskConfig {
    pub fn bitmask(&self) -> Result<QaBitmask> {
        let extra = QaBitmask::from_positions(&self.extra_bits)?;
        Ok(QaBitmask::from_flags(&self.flags).union(extra))
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StackingConfig {
    #[serde(default)]
    pub resampling: Resampling,
    /// Target grid; defaults to the grid of the first scene.
    pub grid: Option<GridSpec>,
    #[serde(default)]
    pub scaling: BandScaling,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AggregationConfig {
    #[serde(default)]
    pub weighting: Weighting,
    /// Also composite the whole time range.
    #[serde(default)]
    pub temporal_mean: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RasterFormat {
    #[default]
    Tiff,
    Png,
}

impl RasterFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Tiff => "tiff",
            Self::Png => "png",
        }
    }
}

impl std::fmt::Display for RasterFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tiff => write!(f, "TIFF (16-bit)"),
            Self::Png => write!(f, "PNG (8-bit)"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: RasterFormat,
    /// Write `summary.json` with per-season diagnostics.
    #[serde(default = "enabled")]
    pub summary: bool,
    /// Write per-scene mean series as CSV.
    #[serde(default = "enabled")]
    pub scene_means: bool,
    /// Write seasonal NDVI/LST pixel pairs as CSV when both are selected.
    #[serde(default)]
    pub pairs: bool,
}

fn enabled() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: RasterFormat::default(),
            summary: true,
            scene_means: true,
            pairs: false,
        }
    }
}
