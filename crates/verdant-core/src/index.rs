//! Spectral and thermal indices per scene.
//!
//! Invalid pixels are `None` rather than a sentinel float. Masked pixels,
//! non-positive reflectance and zero denominators all end up as `None`;
//! none of them is an error. Normalized differences are not clipped to
//! `[-1, 1]`, so out-of-range values remain visible downstream.

use chrono::{DateTime, Utc};
use ndarray::{Array2, ArrayView2, Zip};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::consts::{
    FILL_DN, KELVIN_OFFSET, LST_RANGE, NORMALIZED_INDEX_RANGE, REFLECTANCE_OFFSET,
    REFLECTANCE_SCALE, THERMAL_OFFSET, THERMAL_SCALE,
};
use crate::error::{Result, VerdantError};
use crate::mask::{QaBitmask, QualityMask};
use crate::scene::{BandName, GridSpec};
use crate::stack::BandStack;

/// Per-pixel index values; `None` marks an invalid pixel.
pub type IndexRaster = Array2<Option<f32>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    Ndvi,
    Ndwi,
    Lst,
}

impl IndexKind {
    pub fn required_bands(self) -> &'static [BandName] {
        match self {
            Self::Ndvi => &[BandName::Red, BandName::Nir],
            Self::Ndwi => &[BandName::Green, BandName::Nir],
            Self::Lst => &[BandName::Thermal],
        }
    }

    /// Lower-case name used in file names and JSON keys.
    pub fn name(self) -> &'static str {
        match self {
            Self::Ndvi => "ndvi",
            Self::Ndwi => "ndwi",
            Self::Lst => "lst",
        }
    }

    /// Value range mapped onto the full output pixel range when writing rasters.
    pub fn display_range(self) -> (f32, f32) {
        match self {
            Self::Ndvi | Self::Ndwi => NORMALIZED_INDEX_RANGE,
            Self::Lst => LST_RANGE,
        }
    }
}

impl std::fmt::Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ndvi => write!(f, "NDVI"),
            Self::Ndwi => write!(f, "NDWI"),
            Self::Lst => write!(f, "LST"),
        }
    }
}

/// Conversion from stored band values to physical units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandScaling {
    /// Values are already reflectance / Kelvin.
    Identity,
    /// Collection 2 Level-2 digital numbers: reflectance for optical bands,
    /// Kelvin for the thermal band. DN 0 is fill.
    #[default]
    LandsatC2,
}

impl BandScaling {
    pub fn apply(self, band: BandName, raw: f32) -> Option<f32> {
        if !raw.is_finite() {
            return None;
        }
        match self {
            Self::Identity => Some(raw),
            Self::LandsatC2 if band.is_quality() => Some(raw),
            Self::LandsatC2 if raw == FILL_DN => None,
            Self::LandsatC2 if band == BandName::Thermal => {
                Some(raw * THERMAL_SCALE + THERMAL_OFFSET)
            }
            Self::LandsatC2 => Some(raw * REFLECTANCE_SCALE + REFLECTANCE_OFFSET),
        }
    }
}

impl std::fmt::Display for BandScaling {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identity => write!(f, "Identity"),
            Self::LandsatC2 => write!(f, "Landsat C2 L2"),
        }
    }
}

fn normalized_difference_pixel(a: Option<f32>, b: Option<f32>) -> Option<f32> {
    let a = a.filter(|&v| v > 0.0)? as f64;
    let b = b.filter(|&v| v > 0.0)? as f64;
    let sum = a + b;
    if sum == 0.0 {
        return None;
    }
    let v = ((a - b) / sum) as f32;
    v.is_finite().then_some(v)
}

/// `(a - b) / (a + b)` per pixel. Values `<= 0` in either input are treated
/// as sensor artifacts and yield `None`.
pub fn normalized_difference(
    a: ArrayView2<'_, Option<f32>>,
    b: ArrayView2<'_, Option<f32>>,
) -> Result<IndexRaster> {
    if a.dim() != b.dim() {
        return Err(VerdantError::Alignment(format!(
            "band grids differ: {:?} vs {:?}",
            a.dim(),
            b.dim()
        )));
    }
    Ok(Zip::from(&a)
        .and(&b)
        .map_collect(|&x, &y| normalized_difference_pixel(x, y)))
}

/// NDVI = (NIR - RED) / (NIR + RED).
pub fn ndvi(
    red: ArrayView2<'_, Option<f32>>,
    nir: ArrayView2<'_, Option<f32>>,
) -> Result<IndexRaster> {
    normalized_difference(nir, red)
}

/// NDWI (McFeeters) = (GREEN - NIR) / (GREEN + NIR).
pub fn ndwi(
    green: ArrayView2<'_, Option<f32>>,
    nir: ArrayView2<'_, Option<f32>>,
) -> Result<IndexRaster> {
    normalized_difference(green, nir)
}

/// Land surface temperature in degrees Celsius from a Kelvin thermal band.
pub fn lst(thermal: ArrayView2<'_, Option<f32>>) -> IndexRaster {
    thermal.mapv(|k| k.map(|k| k - KELVIN_OFFSET).filter(|c| c.is_finite()))
}

/// One scene's index raster.
#[derive(Clone, Debug)]
pub struct IndexObservation {
    pub scene_id: String,
    pub acquired: DateTime<Utc>,
    pub values: IndexRaster,
}

impl IndexObservation {
    pub fn valid_pixels(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

/// Time-indexed index rasters sharing one grid.
#[derive(Clone, Debug)]
pub struct IndexSeries {
    kind: IndexKind,
    grid: GridSpec,
    observations: Vec<IndexObservation>,
}

impl IndexSeries {
    pub fn new(kind: IndexKind, grid: GridSpec, observations: Vec<IndexObservation>) -> Result<Self> {
        let mut series = Self {
            kind,
            grid,
            observations: Vec::with_capacity(observations.len()),
        };
        for obs in observations {
            series.push(obs)?;
        }
        Ok(series)
    }

    pub fn push(&mut self, observation: IndexObservation) -> Result<()> {
        if GridSpec::of(&observation.values) != self.grid {
            return Err(VerdantError::Alignment(format!(
                "scene {} raster is {}, series grid is {}",
                observation.scene_id,
                GridSpec::of(&observation.values),
                self.grid
            )));
        }
        self.observations.push(observation);
        Ok(())
    }

    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    pub fn grid(&self) -> GridSpec {
        self.grid
    }

    pub fn observations(&self) -> &[IndexObservation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.observations.iter().map(|o| o.acquired).collect()
    }
}

/// Masks, scales and computes indices over a [`BandStack`].
#[derive(Clone, Copy, Debug)]
pub struct IndexCalculator {
    bitmask: QaBitmask,
    scaling: BandScaling,
}

impl IndexCalculator {
    /// An empty bitmask disables masking and no QA band is needed.
    pub fn new(bitmask: QaBitmask) -> Self {
        Self {
            bitmask,
            scaling: BandScaling::default(),
        }
    }

    pub fn scaling(mut self, scaling: BandScaling) -> Self {
        self.scaling = scaling;
        self
    }

    /// Quality mask of scene `time`.
    pub fn mask(&self, stack: &BandStack, time: usize) -> Result<QualityMask> {
        if self.bitmask.is_empty() {
            return Ok(QualityMask::all_valid(stack.grid().dim()));
        }
        QualityMask::from_qa_values(stack.raster(BandName::Qa, time)?, self.bitmask)
    }

    fn physical(
        &self,
        stack: &BandStack,
        mask: &QualityMask,
        band: BandName,
        time: usize,
    ) -> Result<IndexRaster> {
        let masked = mask.apply(stack.raster(band, time)?)?;
        let scaling = self.scaling;
        Ok(masked.mapv(|v| v.and_then(|x| scaling.apply(band, x))))
    }

    pub fn compute(&self, stack: &BandStack, kind: IndexKind) -> Result<IndexSeries> {
        let mut series = IndexSeries::new(kind, stack.grid(), Vec::new())?;

        for (t, scene) in stack.scenes().iter().enumerate() {
            let mask = self.mask(stack, t)?;
            let values = match kind {
                IndexKind::Ndvi => ndvi(
                    self.physical(stack, &mask, BandName::Red, t)?.view(),
                    self.physical(stack, &mask, BandName::Nir, t)?.view(),
                )?,
                IndexKind::Ndwi => ndwi(
                    self.physical(stack, &mask, BandName::Green, t)?.view(),
                    self.physical(stack, &mask, BandName::Nir, t)?.view(),
                )?,
                IndexKind::Lst => lst(self.physical(stack, &mask, BandName::Thermal, t)?.view()),
            };
            let observation = IndexObservation {
                scene_id: scene.id.clone(),
                acquired: scene.acquired,
                values,
            };
            debug!(
                scene = %scene.id,
                index = %kind,
                usable = format!("{:.1}%", mask.valid_fraction() * 100.0),
                valid = observation.valid_pixels(),
                "Computed index"
            );
            series.push(observation)?;
        }

        Ok(series)
    }
}

/// Spatial mean of one scene's index.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SceneMean {
    pub scene_id: String,
    pub acquired: DateTime<Utc>,
    pub mean: Option<f32>,
    pub valid_pixels: usize,
}

/// Per-scene spatial means, in series order.
pub fn scene_means(series: &IndexSeries) -> Vec<SceneMean> {
    series
        .observations()
        .iter()
        .map(|obs| {
            let (sum, count) = obs
                .values
                .iter()
                .flatten()
                .fold((0.0f64, 0usize), |(s, n), &v| (s + v as f64, n + 1));
            SceneMean {
                scene_id: obs.scene_id.clone(),
                acquired: obs.acquired,
                mean: (count > 0).then(|| (sum / count as f64) as f32),
                valid_pixels: count,
            }
        })
        .collect()
}
