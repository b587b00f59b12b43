use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use verdant_core::catalog::ManifestCatalog;
use verdant_core::index::{BandScaling, IndexKind};
use verdant_core::mask::QaFlag;
use verdant_core::pipeline::config::{PipelineConfig, RasterFormat};
use verdant_core::pipeline::{run_pipeline_reported, write_outputs, PipelineStage, ProgressReporter};
use verdant_core::scene::BoundingBox;
use verdant_core::season::Weighting;
use verdant_core::stack::Resampling;

use crate::progress::BarReporter;
use crate::summary::{print_pipeline_summary, print_results};

#[derive(Clone, ValueEnum)]
pub enum IndexArg {
    Ndvi,
    Ndwi,
    Lst,
}

#[derive(Clone, ValueEnum)]
pub enum ResamplingArg {
    Strict,
    Nearest,
    Bilinear,
}

#[derive(Clone, ValueEnum)]
pub enum WeightingArg {
    Uniform,
    DaysInMonth,
}

#[derive(Clone, ValueEnum)]
pub enum FormatArg {
    Tiff,
    Png,
}

#[derive(Args)]
pub struct CompositeArgs {
    /// Pipeline config file (TOML); other flags are ignored when given
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Scene manifest (JSON)
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Bounding box as west,south,east,north
    #[arg(long, allow_hyphen_values = true)]
    pub bbox: Option<BoundingBox>,

    /// First acquisition day (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last acquisition day (YYYY-MM-DD), inclusive
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Maximum scene cloud cover in percent (exclusive)
    #[arg(long, default_value = "5")]
    pub cloud_cover: f32,

    /// Indices to composite
    #[arg(long, value_enum, value_delimiter = ',', default_value = "ndvi,lst")]
    pub index: Vec<IndexArg>,

    /// Comma-separated QA flags to mask (e.g. cloud,cloud_shadow,water); "none" disables masking
    #[arg(long)]
    pub mask: Option<String>,

    /// Resampling onto the stack grid
    #[arg(long, value_enum, default_value = "nearest")]
    pub resampling: ResamplingArg,

    /// Observation weighting within a season
    #[arg(long, value_enum, default_value = "uniform")]
    pub weighting: WeightingArg,

    /// Treat band values as physical units instead of Collection 2 digital numbers
    #[arg(long)]
    pub no_scaling: bool,

    /// Also write a composite over the whole date range
    #[arg(long)]
    pub temporal_mean: bool,

    /// Write seasonal NDVI/LST pixel pairs as CSV
    #[arg(long)]
    pub pairs: bool,

    /// Output raster format
    #[arg(long, value_enum, default_value = "tiff")]
    pub format: FormatArg,

    /// Output directory
    #[arg(short, long, default_value = "composites")]
    pub output: PathBuf,
}

pub fn run(args: &CompositeArgs) -> Result<()> {
    let config: PipelineConfig = if let Some(ref config_path) = args.config {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        toml::from_str(&contents).context("Invalid pipeline config")?
    } else {
        build_config_from_args(args)?
    };
    config.validate().context("Invalid pipeline config")?;

    print_pipeline_summary(&config);

    let catalog = ManifestCatalog::open(&config.catalog)
        .with_context(|| format!("Failed to open manifest {}", config.catalog.display()))?;
    let reporter = Arc::new(BarReporter::new());
    let output = run_pipeline_reported(&config, &catalog, reporter.clone())?;
    reporter.begin_stage(PipelineStage::Writing, None);
    let written = write_outputs(&output, &config)?;
    reporter.finish("Done");

    print_results(&output);
    println!(
        "{} files written to {}",
        written.len(),
        config.output_dir.display()
    );
    Ok(())
}

fn build_config_from_args(args: &CompositeArgs) -> Result<PipelineConfig> {
    let (Some(manifest), Some(bbox), Some(start), Some(end)) =
        (&args.manifest, args.bbox, args.start, args.end)
    else {
        bail!("--manifest, --bbox, --start and --end are required without --config");
    };

    let mut config = PipelineConfig {
        catalog: manifest.clone(),
        output_dir: args.output.clone(),
        ..Default::default()
    };

    config.search.bbox = bbox.to_array();
    config.search.start = start;
    config.search.end = end;
    config.search.cloud_cover_max = args.cloud_cover;

    config.indices = args
        .index
        .iter()
        .map(|i| match i {
            IndexArg::Ndvi => IndexKind::Ndvi,
            IndexArg::Ndwi => IndexKind::Ndwi,
            IndexArg::Lst => IndexKind::Lst,
        })
        .collect();

    if let Some(ref mask) = args.mask {
        config.mask.flags = if mask.trim().eq_ignore_ascii_case("none") {
            Vec::new()
        } else {
            mask.split(',')
                .map(|s| s.parse::<QaFlag>())
                .collect::<std::result::Result<_, _>>()?
        };
    }

    config.stacking.resampling = match args.resampling {
        ResamplingArg::Strict => Resampling::Strict,
        ResamplingArg::Nearest => Resampling::Nearest,
        ResamplingArg::Bilinear => Resampling::Bilinear,
    };
    if args.no_scaling {
        config.stacking.scaling = BandScaling::Identity;
    }

    config.aggregation.weighting = match args.weighting {
        WeightingArg::Uniform => Weighting::Uniform,
        WeightingArg::DaysInMonth => Weighting::DaysInMonth,
    };
    config.aggregation.temporal_mean = args.temporal_mean;

    config.output.format = match args.format {
        FormatArg::Tiff => RasterFormat::Tiff,
        FormatArg::Png => RasterFormat::Png,
    };
    config.output.pairs = args.pairs;

    Ok(config)
}
