use std::sync::Arc;

use tracing::info;

use crate::catalog::CatalogClient;
use crate::error::{Result, VerdantError};
use crate::index::{scene_means, IndexCalculator};
use crate::season::SeasonalAggregator;
use crate::stack::BandStackBuilder;

use super::config::PipelineConfig;
use super::types::{IndexOutput, NoOpReporter, PipelineOutput, PipelineStage, ProgressReporter};

/// Run search, stacking, indexing and seasonal compositing.
///
/// The catalog is passed in by the caller; nothing here keeps a session.
pub fn run_pipeline_reported(
    config: &PipelineConfig,
    catalog: &dyn CatalogClient,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<PipelineOutput> {
    config.validate()?;
    let params = config.search.to_params()?;

    // Search
    reporter.begin_stage(PipelineStage::Searching, None);
    let scenes = catalog.search(&params)?;
    info!(
        scenes = scenes.len(),
        interval = %params.time_range.to_interval(),
        cloud_cover_max = params.cloud_cover_max,
        "Catalog search complete"
    );
    reporter.finish_stage();
    if scenes.is_empty() {
        return Err(VerdantError::EmptyStack);
    }

    // Stack
    reporter.begin_stage(PipelineStage::Stacking, None);
    let bands = config.required_bands()?;
    let stack = BandStackBuilder::new(&bands)
        .resampling(config.stacking.resampling)
        .grid(config.stacking.grid)
        .build(&scenes)?;
    drop(scenes);
    reporter.finish_stage();

    // Indices
    let calculator =
        IndexCalculator::new(config.mask.bitmask()?).scaling(config.stacking.scaling);
    reporter.begin_stage(PipelineStage::Indexing, Some(config.indices.len()));
    let mut series = Vec::with_capacity(config.indices.len());
    for (i, &kind) in config.indices.iter().enumerate() {
        series.push(calculator.compute(&stack, kind)?);
        reporter.advance(i + 1);
    }
    reporter.finish_stage();

    // Seasonal composites
    let aggregator = SeasonalAggregator::new(config.aggregation.weighting);
    reporter.begin_stage(PipelineStage::Aggregating, Some(series.len()));
    let mut indices = Vec::with_capacity(series.len());
    for (i, s) in series.iter().enumerate() {
        let composites = aggregator.aggregate(s)?;
        let temporal_mean = if config.aggregation.temporal_mean {
            Some(aggregator.temporal_mean(s)?)
        } else {
            None
        };
        info!(
            index = %s.kind(),
            counts = %composites.counts,
            warnings = composites.warnings.len(),
            "Seasonal composites complete"
        );
        indices.push(IndexOutput {
            composites,
            scene_means: scene_means(s),
            temporal_mean,
        });
        reporter.advance(i + 1);
    }
    reporter.finish_stage();

    Ok(PipelineOutput {
        scenes: stack.scenes().to_vec(),
        grid: stack.grid(),
        indices,
    })
}

/// Run the pipeline without progress reporting.
pub fn run_pipeline(config: &PipelineConfig, catalog: &dyn CatalogClient) -> Result<PipelineOutput> {
    run_pipeline_reported(config, catalog, Arc::new(NoOpReporter))
}
