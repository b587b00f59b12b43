use std::collections::BTreeSet;

use ndarray::{s, Array2, Array4, ArrayView2, ArrayView3, Axis};
use tracing::{debug, info};

use crate::consts::FILL_DN;
use crate::error::{Result, VerdantError};
use crate::scene::{BandName, GridSpec, Scene, SceneInfo};

use super::resample::{resample_bilinear, resample_nearest, Resampling};

/// Requested bands of every scene on one shared pixel grid.
///
/// Data layout is `(band, time, row, col)`. Time follows the order in which
/// scenes were handed to the builder.
#[derive(Clone, Debug)]
pub struct BandStack {
    bands: Vec<BandName>,
    scenes: Vec<SceneInfo>,
    grid: GridSpec,
    data: Array4<f32>,
}

impl BandStack {
    pub fn bands(&self) -> &[BandName] {
        &self.bands
    }

    pub fn scenes(&self) -> &[SceneInfo] {
        &self.scenes
    }

    pub fn grid(&self) -> GridSpec {
        self.grid
    }

    /// Number of scenes (time steps).
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn has_band(&self, band: BandName) -> bool {
        self.bands.contains(&band)
    }

    pub fn data(&self) -> &Array4<f32> {
        &self.data
    }

    fn band_index(&self, band: BandName) -> Result<usize> {
        self.bands
            .iter()
            .position(|&b| b == band)
            .ok_or_else(|| VerdantError::MissingBand {
                scene: self
                    .scenes
                    .first()
                    .map(|s| s.id.clone())
                    .unwrap_or_default(),
                band,
            })
    }

    /// All time steps of one band, shape `(time, row, col)`.
    pub fn band(&self, band: BandName) -> Result<ArrayView3<'_, f32>> {
        let b = self.band_index(band)?;
        Ok(self.data.index_axis(Axis(0), b))
    }

    /// One band of one scene.
    pub fn raster(&self, band: BandName, time: usize) -> Result<ArrayView2<'_, f32>> {
        let b = self.band_index(band)?;
        if time >= self.scenes.len() {
            return Err(VerdantError::Alignment(format!(
                "time index {time} out of range (scenes: {})",
                self.scenes.len()
            )));
        }
        Ok(self.data.slice(s![b, time, .., ..]))
    }
}

/// Assembles scenes into a [`BandStack`].
///
/// Every scene must carry every requested band. The stack grid is either
/// configured explicitly or taken from the first requested band of the first
/// scene; rasters on other grids go through the configured [`Resampling`].
#[derive(Clone, Debug)]
pub struct BandStackBuilder {
    bands: Vec<BandName>,
    resampling: Resampling,
    grid: Option<GridSpec>,
}

impl BandStackBuilder {
    pub fn new(bands: &[BandName]) -> Self {
        let unique: BTreeSet<BandName> = bands.iter().copied().collect();
        Self {
            bands: unique.into_iter().collect(),
            resampling: Resampling::default(),
            grid: None,
        }
    }

    pub fn resampling(mut self, resampling: Resampling) -> Self {
        self.resampling = resampling;
        self
    }

    pub fn grid(mut self, grid: Option<GridSpec>) -> Self {
        self.grid = grid;
        self
    }

    pub fn build(&self, scenes: &[Scene]) -> Result<BandStack> {
        if self.bands.is_empty() {
            return Err(VerdantError::InvalidConfig("no bands requested".into()));
        }
        if scenes.is_empty() {
            return Err(VerdantError::EmptyStack);
        }

        // Structural checks run over the whole input before any copy, so a
        // failure never leaves a partial stack behind.
        let mut seen = BTreeSet::new();
        for scene in scenes {
            if !seen.insert(scene.id.as_str()) {
                return Err(VerdantError::Alignment(format!(
                    "scene {} appears more than once",
                    scene.id
                )));
            }
            for &band in &self.bands {
                let raster = scene.band(band).ok_or_else(|| VerdantError::MissingBand {
                    scene: scene.id.clone(),
                    band,
                })?;
                if raster.is_empty() {
                    return Err(VerdantError::Alignment(format!(
                        "scene {} band {band} has an empty raster",
                        scene.id
                    )));
                }
            }
        }

        let grid = self.target_grid(&scenes[0])?;
        let (rows, cols) = grid.dim();
        let mut data = Array4::<f32>::zeros((self.bands.len(), scenes.len(), rows, cols));

        for (b, &band) in self.bands.iter().enumerate() {
            for (t, scene) in scenes.iter().enumerate() {
                let Some(raster) = scene.band(band) else {
                    continue;
                };
                let mut slot = data.slice_mut(s![b, t, .., ..]);
                if GridSpec::of(raster) == grid {
                    slot.assign(raster);
                } else {
                    slot.assign(&self.resample(scene, band, raster, grid)?);
                }
            }
        }

        info!(
            scenes = scenes.len(),
            bands = self.bands.len(),
            grid = %grid,
            resampling = %self.resampling,
            "Band stack assembled"
        );

        Ok(BandStack {
            bands: self.bands.clone(),
            scenes: scenes.iter().map(Scene::info).collect(),
            grid,
            data,
        })
    }

    fn target_grid(&self, first: &Scene) -> Result<GridSpec> {
        let grid = match self.grid {
            Some(grid) => grid,
            None => first
                .band(self.bands[0])
                .map(GridSpec::of)
                .ok_or_else(|| VerdantError::MissingBand {
                    scene: first.id.clone(),
                    band: self.bands[0],
                })?,
        };
        if grid.pixel_count() == 0 {
            return Err(VerdantError::Alignment(format!("stack grid {grid} is empty")));
        }
        Ok(grid)
    }

    fn resample(
        &self,
        scene: &Scene,
        band: BandName,
        raster: &Array2<f32>,
        grid: GridSpec,
    ) -> Result<Array2<f32>> {
        let from = GridSpec::of(raster);
        debug!(scene = %scene.id, band = %band, from = %from, to = %grid, "Resampling band");
        match self.resampling {
            Resampling::Strict => Err(VerdantError::Alignment(format!(
                "scene {} band {band} is on grid {from}, stack grid is {grid}",
                scene.id
            ))),
            Resampling::Nearest => Ok(resample_nearest(raster, grid)),
            Resampling::Bilinear if band.is_quality() => Ok(resample_nearest(raster, grid)),
            Resampling::Bilinear => Ok(resample_bilinear(raster, grid, Some(FILL_DN))),
        }
    }
}
