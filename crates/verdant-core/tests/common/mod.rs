use chrono::{DateTime, NaiveDate, Utc};
use ndarray::Array2;

use verdant_core::index::{IndexKind, IndexObservation, IndexSeries};
use verdant_core::scene::{BandName, BoundingBox, GridSpec, Scene};

/// Midday UTC on the given date.
pub fn ts(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, day)
        .expect("valid date")
        .and_hms_opt(12, 0, 0)
        .expect("valid time")
        .and_utc()
}

pub fn footprint() -> BoundingBox {
    BoundingBox::new(-120.0, 36.0, -119.0, 37.0).expect("valid bbox")
}

/// Scene with constant red, NIR, thermal (Kelvin) and QA bands, in physical units.
pub fn uniform_scene(
    id: &str,
    acquired: DateTime<Utc>,
    dim: (usize, usize),
    red: f32,
    nir: f32,
    thermal: f32,
    qa: u16,
) -> Scene {
    Scene::new(id, acquired, footprint())
        .with_cloud_cover(1.0)
        .with_band(BandName::Red, Array2::from_elem(dim, red))
        .with_band(BandName::Nir, Array2::from_elem(dim, nir))
        .with_band(BandName::Thermal, Array2::from_elem(dim, thermal))
        .with_band(BandName::Qa, Array2::from_elem(dim, qa as f32))
}

/// Index observation with the same value at every pixel.
pub fn constant_observation(
    id: &str,
    acquired: DateTime<Utc>,
    dim: (usize, usize),
    value: Option<f32>,
) -> IndexObservation {
    IndexObservation {
        scene_id: id.to_string(),
        acquired,
        values: Array2::from_elem(dim, value),
    }
}

pub fn series(kind: IndexKind, dim: (usize, usize), observations: Vec<IndexObservation>) -> IndexSeries {
    IndexSeries::new(kind, GridSpec::new(dim.0, dim.1), observations).expect("aligned series")
}
