use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use verdant_core::catalog::{ManifestCatalog, SearchParams};
use verdant_core::consts::DEFAULT_CLOUD_COVER_MAX;
use verdant_core::scene::{BoundingBox, TimeRange};

#[derive(Args)]
pub struct SearchArgs {
    /// Scene manifest (JSON)
    pub manifest: PathBuf,

    /// Bounding box as west,south,east,north
    #[arg(long, allow_hyphen_values = true)]
    pub bbox: BoundingBox,

    /// First acquisition day (YYYY-MM-DD)
    #[arg(long)]
    pub start: NaiveDate,

    /// Last acquisition day (YYYY-MM-DD), inclusive
    #[arg(long)]
    pub end: NaiveDate,

    /// Maximum scene cloud cover in percent (exclusive)
    #[arg(long, default_value_t = DEFAULT_CLOUD_COVER_MAX)]
    pub cloud_cover: f32,
}

pub fn run(args: &SearchArgs) -> Result<()> {
    let catalog = ManifestCatalog::open(&args.manifest)
        .with_context(|| format!("Failed to open manifest {}", args.manifest.display()))?;
    let range = TimeRange::from_dates(args.start, args.end)?;
    let params = SearchParams::new(args.bbox, range).cloud_cover_max(args.cloud_cover);

    let items = catalog.matching_items(&params)?;
    println!(
        "{} of {} scenes match {}",
        items.len(),
        catalog.manifest().items.len(),
        range.to_interval()
    );
    for item in items {
        let assets: Vec<&str> = item.assets.keys().map(String::as_str).collect();
        println!(
            "  {:<40} {}  cloud {:>5.1}%  [{}]",
            item.id,
            item.datetime.format("%Y-%m-%d"),
            item.cloud_cover,
            assets.join(", ")
        );
    }
    Ok(())
}
