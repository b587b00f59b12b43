use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::info;

use crate::error::Result;
use crate::index::IndexKind;
use crate::io::export::{
    paired_samples, write_pairs_csv, write_scene_means_csv, write_summary, CompositeSummary,
};
use crate::io::raster::save_composite;
use crate::season::Season;

use super::config::PipelineConfig;
use super::types::PipelineOutput;

/// Write composites and side files into `config.output_dir`.
///
/// Rasters are named `{index}_{season}.{ext}` (and `{index}_all.{ext}` for
/// the whole-range composite). Returns every path written.
pub fn write_outputs(output: &PipelineOutput, config: &PipelineConfig) -> Result<Vec<PathBuf>> {
    let dir = &config.output_dir;
    std::fs::create_dir_all(dir)?;
    let ext = config.output.format.extension();
    let mut written = Vec::new();

    for result in &output.indices {
        let kind = result.composites.kind;
        let range = kind.display_range();
        for (season, composite) in result.composites.iter() {
            let path = dir.join(format!("{}_{}.{ext}", kind.name(), season.name()));
            save_composite(&composite.mean, range, &path)?;
            written.push(path);
        }
        if let Some(ref all) = result.temporal_mean {
            let path = dir.join(format!("{}_all.{ext}", kind.name()));
            save_composite(&all.mean, range, &path)?;
            written.push(path);
        }
        if config.output.scene_means {
            let path = dir.join(format!("{}_scene_means.csv", kind.name()));
            write_scene_means_csv(&result.scene_means, &path)?;
            written.push(path);
        }
    }

    if config.output.summary {
        let summaries: Vec<CompositeSummary> = output
            .indices
            .iter()
            .map(|r| CompositeSummary::from_composites(&r.composites))
            .collect();
        let path = dir.join("summary.json");
        write_summary(&summaries, &path)?;
        written.push(path);
    }

    if config.output.pairs {
        if let (Some(ndvi), Some(lst)) = (output.get(IndexKind::Ndvi), output.get(IndexKind::Lst)) {
            let mut pairs = BTreeMap::new();
            for season in Season::ALL {
                let samples = paired_samples(
                    &ndvi.composites.get(season).mean,
                    &lst.composites.get(season).mean,
                )?;
                pairs.insert(season, samples);
            }
            let path = dir.join("ndvi_lst_pairs.csv");
            write_pairs_csv(&pairs, &path)?;
            written.push(path);
        }
    }

    info!(files = written.len(), dir = %dir.display(), "Outputs written");
    Ok(written)
}
