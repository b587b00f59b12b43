use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VerdantError};

/// Spectral or quality band of a Landsat Collection 2 Level-2 scene.
///
/// `Display` and serde use the catalog asset keys (`red`, `nir08`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BandName {
    #[serde(rename = "green")]
    Green,
    #[serde(rename = "red")]
    Red,
    #[serde(rename = "nir08")]
    Nir,
    #[serde(rename = "lwir")]
    Thermal,
    #[serde(rename = "qa_pixel")]
    Qa,
}

impl BandName {
    pub const ALL: [BandName; 5] = [
        BandName::Green,
        BandName::Red,
        BandName::Nir,
        BandName::Thermal,
        BandName::Qa,
    ];

    /// Asset key under which the band is published by the catalog.
    pub fn asset_key(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Red => "red",
            Self::Nir => "nir08",
            Self::Thermal => "lwir",
            Self::Qa => "qa_pixel",
        }
    }

    pub fn is_quality(self) -> bool {
        matches!(self, Self::Qa)
    }
}

impl std::fmt::Display for BandName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.asset_key())
    }
}

impl FromStr for BandName {
    type Err = VerdantError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "green" => Ok(Self::Green),
            "red" => Ok(Self::Red),
            "nir08" | "nir" => Ok(Self::Nir),
            "lwir" | "lwir11" | "thermal" => Ok(Self::Thermal),
            "qa_pixel" | "qa" => Ok(Self::Qa),
            other => Err(VerdantError::InvalidBand(format!("unknown band '{other}'"))),
        }
    }
}

/// Geographic bounding box in degrees, `[west, south, east, north]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Result<Self> {
        if !(west <= east && south <= north) {
            return Err(VerdantError::InvalidConfig(format!(
                "degenerate bounding box [{west}, {south}, {east}, {north}]"
            )));
        }
        Ok(Self {
            west,
            south,
            east,
            north,
        })
    }

    pub fn from_array(bbox: [f64; 4]) -> Result<Self> {
        Self::new(bbox[0], bbox[1], bbox[2], bbox[3])
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.west, self.south, self.east, self.north]
    }

    /// True when the boxes share any area or edge.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.west <= other.east
            && other.west <= self.east
            && self.south <= other.north
            && other.south <= self.north
    }
}

impl FromStr for BoundingBox {
    type Err = VerdantError;

    /// Parse `"west,south,east,north"`.
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<f64> = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| VerdantError::InvalidConfig(format!("bounding box '{s}': {e}")))?;
        match parts.as_slice() {
            [w, so, e, n] => Self::new(*w, *so, *e, *n),
            _ => Err(VerdantError::InvalidConfig(format!(
                "bounding box '{s}' needs four comma-separated values"
            ))),
        }
    }
}

/// Half-open acquisition time window `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if end <= start {
            return Err(VerdantError::InvalidConfig(format!(
                "time range end {end} is not after start {start}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Whole calendar days from `first` through `last`, both inclusive.
    pub fn from_dates(first: NaiveDate, last: NaiveDate) -> Result<Self> {
        let start = first.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        let end = last
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc() + Duration::days(1));
        match (start, end) {
            (Some(start), Some(end)) => Self::new(start, end),
            _ => Err(VerdantError::DateParse(format!("{first}/{last}"))),
        }
    }

    pub fn contains(&self, t: &DateTime<Utc>) -> bool {
        self.start <= *t && *t < self.end
    }

    /// RFC 3339 interval string as used by STAC item search (`start/end`).
    pub fn to_interval(&self) -> String {
        format!("{}/{}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// Pixel grid shared by every raster of a band stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSpec {
    pub rows: usize,
    pub cols: usize,
}

impl GridSpec {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    pub fn of<T>(raster: &Array2<T>) -> Self {
        let (rows, cols) = raster.dim();
        Self { rows, cols }
    }

    pub fn dim(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn pixel_count(&self) -> usize {
        self.rows * self.cols
    }
}

impl std::fmt::Display for GridSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// One satellite observation as returned by a catalog.
///
/// Band rasters hold raw values (digital numbers for Level-2 assets) in
/// row-major `(row, col)` order over the scene footprint.
#[derive(Clone, Debug)]
pub struct Scene {
    pub id: String,
    pub acquired: DateTime<Utc>,
    pub footprint: BoundingBox,
    /// Scene-level cloud cover in percent.
    pub cloud_cover: f32,
    pub bands: BTreeMap<BandName, Array2<f32>>,
}

impl Scene {
    pub fn new(id: impl Into<String>, acquired: DateTime<Utc>, footprint: BoundingBox) -> Self {
        Self {
            id: id.into(),
            acquired,
            footprint,
            cloud_cover: 0.0,
            bands: BTreeMap::new(),
        }
    }

    pub fn with_cloud_cover(mut self, cloud_cover: f32) -> Self {
        self.cloud_cover = cloud_cover;
        self
    }

    pub fn with_band(mut self, band: BandName, data: Array2<f32>) -> Self {
        self.bands.insert(band, data);
        self
    }

    pub fn band(&self, band: BandName) -> Option<&Array2<f32>> {
        self.bands.get(&band)
    }

    pub fn info(&self) -> SceneInfo {
        SceneInfo {
            id: self.id.clone(),
            acquired: self.acquired,
        }
    }
}

/// Identity of a scene once its rasters have been moved into a stack.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SceneInfo {
    pub acquired: DateTime<Utc>,
    pub id: String,
}
