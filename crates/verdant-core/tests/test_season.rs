#[allow(dead_code)]
mod common;

use approx::assert_abs_diff_eq;
use ndarray::Array2;

use verdant_core::index::{IndexKind, IndexObservation};
use verdant_core::season::{
    partition, season_counts, Season, SeasonAccumulator, SeasonWarning, SeasonalAccumulator,
    SeasonalAggregator, Weighting,
};
use verdant_core::scene::GridSpec;

const DIM: (usize, usize) = (3, 3);

/// Observation whose value varies across the grid so reduction order matters.
fn varied_observation(id: &str, y: i32, m: u32, d: u32, seed: f32) -> IndexObservation {
    let values = Array2::from_shape_fn(DIM, |(r, c)| {
        if (r + c) % 4 == 3 {
            None
        } else {
            Some(seed * 0.013 + r as f32 * 0.071 + c as f32 * 0.137)
        }
    });
    IndexObservation {
        scene_id: id.to_string(),
        acquired: common::ts(y, m, d),
        values,
    }
}

fn year_of_observations() -> Vec<IndexObservation> {
    vec![
        varied_observation("s01", 2021, 1, 5, 1.0),
        varied_observation("s02", 2021, 2, 14, 2.0),
        varied_observation("s03", 2021, 3, 3, 3.0),
        varied_observation("s04", 2021, 5, 30, 4.0),
        varied_observation("s05", 2021, 6, 21, 5.0),
        varied_observation("s06", 2021, 8, 9, 6.0),
        varied_observation("s07", 2021, 10, 1, 7.0),
        varied_observation("s08", 2021, 11, 11, 8.0),
        varied_observation("s09", 2021, 12, 24, 9.0),
        // Same timestamp as s05, distinguished only by id.
        varied_observation("s10", 2021, 6, 21, 10.0),
    ]
}

#[test]
fn test_one_scene_per_season() {
    let obs = vec![
        common::constant_observation("w", common::ts(2021, 1, 15), (2, 2), Some(0.5)),
        common::constant_observation("sp", common::ts(2021, 4, 10), (2, 2), Some(0.5)),
        common::constant_observation("su", common::ts(2021, 7, 20), (2, 2), Some(0.5)),
        common::constant_observation("f", common::ts(2021, 10, 5), (2, 2), Some(0.5)),
    ];
    let series = common::series(IndexKind::Ndvi, (2, 2), obs);
    let composites = SeasonalAggregator::default().aggregate(&series).unwrap();

    assert_eq!(composites.kind, IndexKind::Ndvi);
    assert!(composites.warnings.is_empty());
    for (season, composite) in composites.iter() {
        assert_eq!(composites.counts.get(season), 1);
        assert_eq!(composite.observations, 1);
        assert!(composite.mean.iter().all(|v| *v == Some(0.5)), "{season}");
        assert!(composite.valid_counts.iter().all(|&n| n == 1));
    }
    assert_eq!(composites.counts.total(), 4);
    assert_eq!(composites.counts.to_string(), "winter=1 spring=1 summer=1 fall=1");
}

#[test]
fn test_season_without_observations() {
    let obs = vec![
        common::constant_observation("w", common::ts(2021, 1, 15), (2, 2), Some(0.2)),
        common::constant_observation("su", common::ts(2021, 7, 15), (2, 2), Some(0.4)),
        common::constant_observation("f", common::ts(2021, 10, 15), (2, 2), Some(0.6)),
    ];
    let series = common::series(IndexKind::Ndvi, (2, 2), obs);
    let composites = SeasonalAggregator::default().aggregate(&series).unwrap();

    let spring = composites.get(Season::Spring);
    assert_eq!(spring.observations, 0);
    assert!(spring.mean.iter().all(Option::is_none));
    assert_eq!(spring.grid(), GridSpec::new(2, 2));
    assert_eq!(spring.spatial_mean(), None);
    assert_eq!(composites.counts.get(Season::Spring), 0);
    assert_eq!(
        composites.warnings,
        vec![SeasonWarning::NoObservations {
            season: Season::Spring
        }]
    );
}

#[test]
fn test_pixel_mean_skips_invalid_observations() {
    let mut cloudy = common::constant_observation("b", common::ts(2021, 7, 2), (1, 2), Some(0.8));
    cloudy.values[[0, 1]] = None;
    let obs = vec![
        common::constant_observation("a", common::ts(2021, 7, 1), (1, 2), Some(0.2)),
        cloudy,
        common::constant_observation("c", common::ts(2021, 7, 3), (1, 2), None),
    ];
    let series = common::series(IndexKind::Lst, (1, 2), obs);
    let composites = SeasonalAggregator::default().aggregate(&series).unwrap();
    let summer = composites.get(Season::Summer);

    assert_eq!(summer.observations, 3);
    assert_abs_diff_eq!(summer.mean[[0, 0]].unwrap(), 0.5, epsilon = 1e-6);
    assert_abs_diff_eq!(summer.mean[[0, 1]].unwrap(), 0.2, epsilon = 1e-6);
    assert_eq!(summer.valid_counts[[0, 0]], 2);
    assert_eq!(summer.valid_counts[[0, 1]], 1);
}

#[test]
fn test_pixel_empty_in_every_observation() {
    let mut a = common::constant_observation("a", common::ts(2021, 9, 1), (1, 2), Some(1.0));
    let mut b = common::constant_observation("b", common::ts(2021, 9, 2), (1, 2), Some(2.0));
    a.values[[0, 0]] = None;
    b.values[[0, 0]] = None;
    let series = common::series(IndexKind::Ndvi, (1, 2), vec![a, b]);
    let composites = SeasonalAggregator::default().aggregate(&series).unwrap();
    let fall = composites.get(Season::Fall);

    assert_eq!(fall.mean[[0, 0]], None);
    assert_eq!(fall.valid_pixels(), 1);
    assert_eq!(fall.empty_pixels(), 1);
    assert!(composites.warnings.contains(&SeasonWarning::EmptyPixels {
        season: Season::Fall,
        pixels: 1,
        total: 2,
    }));
}

#[test]
fn test_composites_identical_under_reordering() {
    let original = year_of_observations();
    let mut reversed = original.clone();
    reversed.reverse();
    let mut rotated = original.clone();
    rotated.rotate_left(3);
    let mut interleaved: Vec<IndexObservation> = original.iter().step_by(2).cloned().collect();
    interleaved.extend(original.iter().skip(1).step_by(2).cloned());

    let aggregator = SeasonalAggregator::new(Weighting::DaysInMonth);
    let reference = aggregator
        .aggregate(&common::series(IndexKind::Ndvi, DIM, original.clone()))
        .unwrap();
    let reference_all = aggregator
        .temporal_mean(&common::series(IndexKind::Ndvi, DIM, original))
        .unwrap();

    for order in [reversed, rotated, interleaved] {
        let series = common::series(IndexKind::Ndvi, DIM, order);
        let composites = aggregator.aggregate(&series).unwrap();
        for season in Season::ALL {
            assert_eq!(composites.get(season).mean, reference.get(season).mean, "{season}");
            assert_eq!(
                composites.get(season).valid_counts,
                reference.get(season).valid_counts
            );
        }
        assert_eq!(composites.counts, reference.counts);
        assert_eq!(aggregator.temporal_mean(&series).unwrap().mean, reference_all.mean);
    }
}

#[test]
fn test_partition_covers_every_observation_once() {
    let observations = year_of_observations();
    let buckets = partition(&observations);

    assert_eq!(buckets.len(), 4);
    let total: usize = buckets.values().map(Vec::len).sum();
    assert_eq!(total, observations.len());
    for (season, list) in &buckets {
        for obs in list {
            assert_eq!(Season::of(&obs.acquired), *season);
        }
        for pair in list.windows(2) {
            assert!((pair[0].acquired, &pair[0].scene_id) <= (pair[1].acquired, &pair[1].scene_id));
        }
    }
    let summer: Vec<&str> = buckets[&Season::Summer]
        .iter()
        .map(|o| o.scene_id.as_str())
        .collect();
    assert_eq!(summer, vec!["s05", "s10", "s06"]);
    // December and January of the same year share one winter.
    let winter: Vec<&str> = buckets[&Season::Winter]
        .iter()
        .map(|o| o.scene_id.as_str())
        .collect();
    assert_eq!(winter, vec!["s01", "s02", "s09"]);
}

#[test]
fn test_years_are_merged_into_one_season() {
    let obs = vec![
        common::constant_observation("a", common::ts(2019, 7, 1), (1, 1), Some(10.0)),
        common::constant_observation("b", common::ts(2020, 7, 1), (1, 1), Some(20.0)),
        common::constant_observation("c", common::ts(2021, 8, 1), (1, 1), Some(30.0)),
    ];
    let series = common::series(IndexKind::Lst, (1, 1), obs);
    let composites = SeasonalAggregator::default().aggregate(&series).unwrap();
    assert_eq!(composites.counts.get(Season::Summer), 3);
    assert_abs_diff_eq!(
        composites.get(Season::Summer).mean[[0, 0]].unwrap(),
        20.0,
        epsilon = 1e-5
    );
    assert_eq!(season_counts(&series).get(Season::Summer), 3);
}

#[test]
fn test_days_in_month_weighting() {
    // December has 31 days, February 2021 has 28.
    let obs = vec![
        common::constant_observation("dec", common::ts(2021, 12, 1), (1, 1), Some(1.0)),
        common::constant_observation("feb", common::ts(2021, 2, 1), (1, 1), Some(0.0)),
    ];
    let series = common::series(IndexKind::Ndvi, (1, 1), obs);

    let uniform = SeasonalAggregator::default().aggregate(&series).unwrap();
    assert_abs_diff_eq!(uniform.get(Season::Winter).mean[[0, 0]].unwrap(), 0.5, epsilon = 1e-6);

    let weighted = SeasonalAggregator::new(Weighting::DaysInMonth)
        .aggregate(&series)
        .unwrap();
    assert_abs_diff_eq!(
        weighted.get(Season::Winter).mean[[0, 0]].unwrap(),
        31.0 / 59.0,
        epsilon = 1e-6
    );
}

#[test]
fn test_accumulator_merge_matches_single_pass() {
    let observations = year_of_observations();
    let grid = GridSpec::new(DIM.0, DIM.1);

    let mut whole = SeasonalAccumulator::new(IndexKind::Ndvi, grid, Weighting::Uniform);
    for obs in &observations {
        whole.add(obs).unwrap();
    }

    let (left, right) = observations.split_at(4);
    let mut a = SeasonalAccumulator::new(IndexKind::Ndvi, grid, Weighting::Uniform);
    let mut b = SeasonalAccumulator::new(IndexKind::Ndvi, grid, Weighting::Uniform);
    left.iter().for_each(|o| a.add(o).unwrap());
    right.iter().for_each(|o| b.add(o).unwrap());
    a.merge(&b).unwrap();

    assert_eq!(a.counts(), whole.counts());
    let merged = a.finish();
    let single = whole.finish();
    for season in Season::ALL {
        let m = &merged.get(season).mean;
        let s = &single.get(season).mean;
        for (x, y) in m.iter().zip(s.iter()) {
            match (x, y) {
                (Some(x), Some(y)) => assert_abs_diff_eq!(*x, *y, epsilon = 1e-6),
                (None, None) => {}
                other => panic!("validity differs in {season}: {other:?}"),
            }
        }
    }

    let other_kind = SeasonalAccumulator::new(IndexKind::Lst, grid, Weighting::Uniform);
    assert!(a.merge(&other_kind).is_err());
}

#[test]
fn test_accumulator_rejects_bad_input() {
    let mut acc = SeasonAccumulator::new(GridSpec::new(2, 2));
    let wrong = Array2::from_elem((3, 3), Some(1.0f32));
    assert!(acc.add(&wrong, 1.0).is_err());
    let right = Array2::from_elem((2, 2), Some(1.0f32));
    assert!(acc.add(&right, 0.0).is_err());
    assert!(acc.add(&right, f64::NAN).is_err());
    assert_eq!(acc.observations(), 0);
    acc.add(&right, 2.0).unwrap();
    assert_eq!(acc.finish().mean[[1, 1]], Some(1.0));
}

#[test]
fn test_temporal_mean_ignores_seasons() {
    let obs = vec![
        common::constant_observation("w", common::ts(2021, 1, 15), (2, 2), Some(0.1)),
        common::constant_observation("su", common::ts(2021, 7, 15), (2, 2), Some(0.3)),
        common::constant_observation("f", common::ts(2021, 10, 15), (2, 2), None),
    ];
    let series = common::series(IndexKind::Ndvi, (2, 2), obs);
    let all = SeasonalAggregator::default().temporal_mean(&series).unwrap();
    assert_eq!(all.observations, 3);
    assert_abs_diff_eq!(all.mean[[0, 0]].unwrap(), 0.2, epsilon = 1e-6);
    assert!(all.valid_counts.iter().all(|&n| n == 2));
}

#[test]
fn test_rasters_by_season_name() {
    let obs = vec![common::constant_observation(
        "w",
        common::ts(2021, 2, 1),
        (1, 1),
        Some(0.7),
    )];
    let series = common::series(IndexKind::Ndvi, (1, 1), obs);
    let composites = SeasonalAggregator::default().aggregate(&series).unwrap();
    let rasters = composites.rasters();
    let keys: Vec<&str> = rasters.keys().copied().collect();
    assert_eq!(keys, vec!["fall", "spring", "summer", "winter"]);
    assert_eq!(rasters["winter"][[0, 0]], Some(0.7));
    assert_eq!(composites.by_name("DJF").unwrap().observations, 1);
    assert!(composites.by_name("monsoon").is_none());
}
