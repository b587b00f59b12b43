//! Seasonal compositing of index series.
//!
//! Observations are bucketed by calendar month only (DJF, MAM, JJA, SON),
//! so every winter of every year lands in the same composite. Each composite
//! pixel is the mean of the valid observations of its season; a pixel with no
//! valid observation is `None`.
//!
//! Observations are reduced in `(acquired, scene_id)` order whatever the
//! input order, which makes composites bit-identical under shuffling.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, VerdantError};
use crate::index::{IndexKind, IndexObservation, IndexRaster, IndexSeries};
use crate::scene::GridSpec;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Winter, Season::Spring, Season::Summer, Season::Fall];

    /// Season of a calendar month (1-12).
    pub fn from_month(month: u32) -> Option<Season> {
        match month {
            12 | 1 | 2 => Some(Self::Winter),
            3..=5 => Some(Self::Spring),
            6..=8 => Some(Self::Summer),
            9..=11 => Some(Self::Fall),
            _ => None,
        }
    }

    pub fn of(t: &DateTime<Utc>) -> Season {
        // chrono months are always 1-12.
        Self::from_month(t.month()).unwrap_or(Self::Winter)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Winter => "winter",
            Self::Spring => "spring",
            Self::Summer => "summer",
            Self::Fall => "fall",
        }
    }

    pub fn months(self) -> [u32; 3] {
        match self {
            Self::Winter => [12, 1, 2],
            Self::Spring => [3, 4, 5],
            Self::Summer => [6, 7, 8],
            Self::Fall => [9, 10, 11],
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Winter => 0,
            Self::Spring => 1,
            Self::Summer => 2,
            Self::Fall => 3,
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Season {
    type Err = VerdantError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "winter" | "djf" => Ok(Self::Winter),
            "spring" | "mam" => Ok(Self::Spring),
            "summer" | "jja" => Ok(Self::Summer),
            "fall" | "autumn" | "son" => Ok(Self::Fall),
            other => Err(VerdantError::InvalidConfig(format!("unknown season '{other}'"))),
        }
    }
}

/// Weight of each observation in its seasonal mean.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weighting {
    /// Every valid observation counts once.
    #[default]
    Uniform,
    /// Observations weigh the length of their calendar month in days.
    DaysInMonth,
}

impl Weighting {
    pub fn weight(self, t: &DateTime<Utc>) -> f64 {
        match self {
            Self::Uniform => 1.0,
            Self::DaysInMonth => days_in_month(t.year(), t.month()) as f64,
        }
    }
}

impl std::fmt::Display for Weighting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uniform => write!(f, "Uniform"),
            Self::DaysInMonth => write!(f, "Days in Month"),
        }
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    match (
        NaiveDate::from_ymd_opt(year, month, 1),
        NaiveDate::from_ymd_opt(next_year, next_month, 1),
    ) {
        (Some(first), Some(next)) => (next - first).num_days() as u32,
        // Only reachable at the very end of chrono's date range.
        _ => 31,
    }
}

fn canonical_order(a: &&IndexObservation, b: &&IndexObservation) -> std::cmp::Ordering {
    a.acquired
        .cmp(&b.acquired)
        .then_with(|| a.scene_id.cmp(&b.scene_id))
}

/// Observations of each season, each list in `(acquired, scene_id)` order.
/// All four seasons are present, possibly empty.
pub fn partition(observations: &[IndexObservation]) -> BTreeMap<Season, Vec<&IndexObservation>> {
    let mut buckets: BTreeMap<Season, Vec<&IndexObservation>> =
        Season::ALL.into_iter().map(|s| (s, Vec::new())).collect();
    for obs in observations {
        buckets.entry(Season::of(&obs.acquired)).or_default().push(obs);
    }
    for list in buckets.values_mut() {
        list.sort_by(canonical_order);
    }
    buckets
}

/// Number of observations per season.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SeasonCounts {
    counts: [usize; 4],
}

impl SeasonCounts {
    pub fn get(&self, season: Season) -> usize {
        self.counts[season.index()]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Season, usize)> + '_ {
        Season::ALL.into_iter().map(|s| (s, self.get(s)))
    }
}

impl std::fmt::Display for SeasonCounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.iter().map(|(s, n)| format!("{s}={n}")).collect();
        f.write_str(&parts.join(" "))
    }
}

pub fn season_counts(series: &IndexSeries) -> SeasonCounts {
    let mut counts = SeasonCounts::default();
    for obs in series.observations() {
        counts.counts[Season::of(&obs.acquired).index()] += 1;
    }
    counts
}

/// Non-fatal condition found while compositing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SeasonWarning {
    /// No observation fell in the season; its composite is entirely `None`.
    NoObservations { season: Season },
    /// Some pixels had no valid observation in the season.
    EmptyPixels {
        season: Season,
        pixels: usize,
        total: usize,
    },
}

impl std::fmt::Display for SeasonWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoObservations { season } => write!(f, "{season}: no observations"),
            Self::EmptyPixels {
                season,
                pixels,
                total,
            } => write!(f, "{season}: {pixels} of {total} pixels without valid observations"),
        }
    }
}

/// Aggregated raster of one season.
#[derive(Clone, Debug)]
pub struct SeasonComposite {
    pub mean: IndexRaster,
    /// Valid observations that contributed to each pixel.
    pub valid_counts: Array2<u32>,
    /// Observations that fell in the season, valid or not.
    pub observations: usize,
}

impl SeasonComposite {
    pub fn grid(&self) -> GridSpec {
        GridSpec::of(&self.mean)
    }

    pub fn valid_pixels(&self) -> usize {
        self.mean.iter().filter(|v| v.is_some()).count()
    }

    pub fn empty_pixels(&self) -> usize {
        self.mean.len() - self.valid_pixels()
    }

    /// Mean over the valid pixels of the composite.
    pub fn spatial_mean(&self) -> Option<f32> {
        let (sum, n) = self
            .mean
            .iter()
            .flatten()
            .fold((0.0f64, 0usize), |(s, n), &v| (s + v as f64, n + 1));
        (n > 0).then(|| (sum / n as f64) as f32)
    }
}

/// Running weighted sum and count per pixel. Accumulators over disjoint sets
/// of observations merge into the accumulator of their union.
#[derive(Clone, Debug)]
pub struct SeasonAccumulator {
    sum: Array2<f64>,
    weight: Array2<f64>,
    valid: Array2<u32>,
    observations: usize,
}

impl SeasonAccumulator {
    pub fn new(grid: GridSpec) -> Self {
        Self {
            sum: Array2::zeros(grid.dim()),
            weight: Array2::zeros(grid.dim()),
            valid: Array2::zeros(grid.dim()),
            observations: 0,
        }
    }

    pub fn grid(&self) -> GridSpec {
        GridSpec::of(&self.sum)
    }

    pub fn observations(&self) -> usize {
        self.observations
    }

    pub fn add(&mut self, values: &IndexRaster, weight: f64) -> Result<()> {
        if GridSpec::of(values) != self.grid() {
            return Err(VerdantError::Alignment(format!(
                "raster {} does not match accumulator grid {}",
                GridSpec::of(values),
                self.grid()
            )));
        }
        if !(weight.is_finite() && weight > 0.0) {
            return Err(VerdantError::InvalidConfig(format!(
                "observation weight {weight} must be positive"
            )));
        }
        Zip::from(&mut self.sum)
            .and(&mut self.weight)
            .and(&mut self.valid)
            .and(values)
            .for_each(|s, w, n, v| {
                if let Some(v) = *v {
                    *s += v as f64 * weight;
                    *w += weight;
                    *n += 1;
                }
            });
        self.observations += 1;
        Ok(())
    }

    pub fn merge(&mut self, other: &SeasonAccumulator) -> Result<()> {
        if other.grid() != self.grid() {
            return Err(VerdantError::Alignment(format!(
                "cannot merge accumulator {} into {}",
                other.grid(),
                self.grid()
            )));
        }
        self.sum += &other.sum;
        self.weight += &other.weight;
        self.valid += &other.valid;
        self.observations += other.observations;
        Ok(())
    }

    pub fn finish(&self) -> SeasonComposite {
        let mean = Zip::from(&self.sum)
            .and(&self.weight)
            .and(&self.valid)
            .map_collect(|&s, &w, &n| (n > 0 && w > 0.0).then(|| (s / w) as f32));
        SeasonComposite {
            mean,
            valid_counts: self.valid.clone(),
            observations: self.observations,
        }
    }
}

/// The four seasonal composites of one index.
#[derive(Clone, Debug)]
pub struct SeasonalComposites {
    pub kind: IndexKind,
    pub counts: SeasonCounts,
    pub warnings: Vec<SeasonWarning>,
    composites: [SeasonComposite; 4],
}

impl SeasonalComposites {
    pub fn get(&self, season: Season) -> &SeasonComposite {
        &self.composites[season.index()]
    }

    pub fn by_name(&self, name: &str) -> Option<&SeasonComposite> {
        name.parse::<Season>().ok().map(|s| self.get(s))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Season, &SeasonComposite)> + '_ {
        Season::ALL.into_iter().map(|s| (s, self.get(s)))
    }

    /// Season name to composite raster, the input of any renderer.
    pub fn rasters(&self) -> BTreeMap<&'static str, &IndexRaster> {
        self.iter().map(|(s, c)| (s.name(), &c.mean)).collect()
    }
}

/// Per-season accumulators for one index over one grid.
#[derive(Clone, Debug)]
pub struct SeasonalAccumulator {
    kind: IndexKind,
    weighting: Weighting,
    seasons: [SeasonAccumulator; 4],
}

impl SeasonalAccumulator {
    pub fn new(kind: IndexKind, grid: GridSpec, weighting: Weighting) -> Self {
        Self {
            kind,
            weighting,
            seasons: Season::ALL.map(|_| SeasonAccumulator::new(grid)),
        }
    }

    pub fn add(&mut self, observation: &IndexObservation) -> Result<()> {
        let weight = self.weighting.weight(&observation.acquired);
        self.seasons[Season::of(&observation.acquired).index()].add(&observation.values, weight)
    }

    pub fn merge(&mut self, other: &SeasonalAccumulator) -> Result<()> {
        if other.kind != self.kind || other.weighting != self.weighting {
            return Err(VerdantError::InvalidConfig(format!(
                "cannot merge {} ({}) accumulator into {} ({})",
                other.kind, other.weighting, self.kind, self.weighting
            )));
        }
        for (mine, theirs) in self.seasons.iter_mut().zip(other.seasons.iter()) {
            mine.merge(theirs)?;
        }
        Ok(())
    }

    pub fn counts(&self) -> SeasonCounts {
        SeasonCounts {
            counts: self.seasons.each_ref().map(SeasonAccumulator::observations),
        }
    }

    pub fn finish(&self) -> SeasonalComposites {
        let composites = self.seasons.each_ref().map(SeasonAccumulator::finish);
        let mut warnings = Vec::new();
        for season in Season::ALL {
            let composite = &composites[season.index()];
            if composite.observations == 0 {
                warn!(index = %self.kind, season = %season, "Season has no observations");
                warnings.push(SeasonWarning::NoObservations { season });
            } else if composite.empty_pixels() > 0 {
                let warning = SeasonWarning::EmptyPixels {
                    season,
                    pixels: composite.empty_pixels(),
                    total: composite.mean.len(),
                };
                warn!(index = %self.kind, "{warning}");
                warnings.push(warning);
            }
        }
        SeasonalComposites {
            kind: self.kind,
            counts: self.counts(),
            warnings,
            composites,
        }
    }
}

/// Reduces an [`IndexSeries`] to seasonal composites.
#[derive(Clone, Copy, Debug, Default)]
pub struct SeasonalAggregator {
    weighting: Weighting,
}

impl SeasonalAggregator {
    pub fn new(weighting: Weighting) -> Self {
        Self { weighting }
    }

    pub fn weighting(&self) -> Weighting {
        self.weighting
    }

    pub fn aggregate(&self, series: &IndexSeries) -> Result<SeasonalComposites> {
        let counts = season_counts(series);
        info!(
            index = %series.kind(),
            observations = series.len(),
            winter = counts.get(Season::Winter),
            spring = counts.get(Season::Spring),
            summer = counts.get(Season::Summer),
            fall = counts.get(Season::Fall),
            "Observations per season"
        );

        let mut acc = SeasonalAccumulator::new(series.kind(), series.grid(), self.weighting);
        for bucket in partition(series.observations()).values() {
            for obs in bucket {
                acc.add(obs)?;
            }
        }
        Ok(acc.finish())
    }

    /// Composite over the whole series, ignoring seasons.
    pub fn temporal_mean(&self, series: &IndexSeries) -> Result<SeasonComposite> {
        let mut ordered: Vec<&IndexObservation> = series.observations().iter().collect();
        ordered.sort_by(canonical_order);
        let mut acc = SeasonAccumulator::new(series.grid());
        for obs in ordered {
            acc.add(&obs.values, self.weighting.weight(&obs.acquired))?;
        }
        Ok(acc.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_month_has_exactly_one_season() {
        for month in 1..=12 {
            let season = Season::from_month(month).unwrap();
            let owners = Season::ALL
                .iter()
                .filter(|s| s.months().contains(&month))
                .count();
            assert_eq!(owners, 1);
            assert!(season.months().contains(&month));
        }
        assert_eq!(Season::from_month(0), None);
        assert_eq!(Season::from_month(13), None);
    }

    #[test]
    fn timestamp_season_matches_month_table() {
        for month in 1..=12 {
            let t = NaiveDate::from_ymd_opt(2021, month, 28)
                .unwrap()
                .and_hms_opt(23, 59, 59)
                .unwrap()
                .and_utc();
            assert_eq!(Some(Season::of(&t)), Season::from_month(month));
        }
    }

    #[test]
    fn february_length_follows_leap_years() {
        assert_eq!(days_in_month(2020, 2), 29);
        assert_eq!(days_in_month(2021, 2), 28);
        assert_eq!(days_in_month(2021, 12), 31);
        assert_eq!(days_in_month(2021, 4), 30);
    }

    #[test]
    fn season_names_parse() {
        assert_eq!("Autumn".parse::<Season>().unwrap(), Season::Fall);
        assert_eq!("djf".parse::<Season>().unwrap(), Season::Winter);
        assert!("monsoon".parse::<Season>().is_err());
    }
}
