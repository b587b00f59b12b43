//! Tabular and JSON outputs handed to plotting tools.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use ndarray::Zip;
use serde::Serialize;

use crate::error::{Result, VerdantError};
use crate::index::{IndexKind, IndexRaster, SceneMean};
use crate::season::{Season, SeasonalComposites};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SeasonSummary {
    pub observations: usize,
    pub valid_pixels: usize,
    pub empty_pixels: usize,
    pub mean: Option<f32>,
}

/// Per-season diagnostics of one index.
#[derive(Clone, Debug, Serialize)]
pub struct CompositeSummary {
    pub index: IndexKind,
    pub seasons: BTreeMap<Season, SeasonSummary>,
    pub warnings: Vec<String>,
}

impl CompositeSummary {
    pub fn from_composites(composites: &SeasonalComposites) -> Self {
        let seasons = composites
            .iter()
            .map(|(season, c)| {
                (
                    season,
                    SeasonSummary {
                        observations: c.observations,
                        valid_pixels: c.valid_pixels(),
                        empty_pixels: c.empty_pixels(),
                        mean: c.spatial_mean(),
                    },
                )
            })
            .collect();
        Self {
            index: composites.kind,
            seasons,
            warnings: composites.warnings.iter().map(ToString::to_string).collect(),
        }
    }
}

pub fn write_summary(summaries: &[CompositeSummary], path: &Path) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, summaries)?;
    Ok(())
}

/// `(ndvi, lst)` at every pixel where both are valid, row-major.
pub fn paired_samples(ndvi: &IndexRaster, lst: &IndexRaster) -> Result<Vec<(f32, f32)>> {
    if ndvi.dim() != lst.dim() {
        return Err(VerdantError::Alignment(format!(
            "NDVI grid {:?} does not match LST grid {:?}",
            ndvi.dim(),
            lst.dim()
        )));
    }
    let mut pairs = Vec::new();
    Zip::from(ndvi).and(lst).for_each(|&n, &t| {
        if let (Some(n), Some(t)) = (n, t) {
            pairs.push((n, t));
        }
    });
    Ok(pairs)
}

#[derive(Serialize)]
struct PairRecord<'a> {
    season: &'a str,
    ndvi: f32,
    lst: f32,
}

/// Write NDVI/LST pairs of each season as CSV (`season,ndvi,lst`).
pub fn write_pairs_csv(pairs: &BTreeMap<Season, Vec<(f32, f32)>>, path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for (season, values) in pairs {
        for &(ndvi, lst) in values {
            wtr.serialize(PairRecord {
                season: season.name(),
                ndvi,
                lst,
            })?;
        }
    }
    wtr.flush()?;
    Ok(())
}

/// Write the per-scene mean series as CSV (`scene_id,acquired,mean,valid_pixels`).
pub fn write_scene_means_csv(means: &[SceneMean], path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for mean in means {
        wtr.serialize(mean)?;
    }
    wtr.flush()?;
    Ok(())
}
