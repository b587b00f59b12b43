#[allow(dead_code)]
mod common;

use std::collections::BTreeMap;

use ndarray::array;
use tempfile::tempdir;

use verdant_core::index::{IndexKind, SceneMean};
use verdant_core::io::export::{
    paired_samples, write_pairs_csv, write_scene_means_csv, write_summary, CompositeSummary,
};
use verdant_core::season::{Season, SeasonalAggregator};

#[test]
fn test_paired_samples_keep_jointly_valid_pixels() {
    let ndvi = array![[Some(0.1f32), None], [Some(0.3), Some(0.4)]];
    let lst = array![[Some(20.0f32), Some(21.0)], [None, Some(23.0)]];
    let pairs = paired_samples(&ndvi, &lst).unwrap();
    assert_eq!(pairs, vec![(0.1, 20.0), (0.4, 23.0)]);

    let small = array![[Some(1.0f32)]];
    assert!(paired_samples(&ndvi, &small).is_err());
}

#[test]
fn test_pairs_csv_lists_every_season() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pairs.csv");
    let mut pairs = BTreeMap::new();
    pairs.insert(Season::Summer, vec![(0.5, 30.0)]);
    pairs.insert(Season::Winter, vec![(0.25, 2.5), (0.75, 4.0)]);
    write_pairs_csv(&pairs, &path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec!["season,ndvi,lst", "winter,0.25,2.5", "winter,0.75,4.0", "summer,0.5,30.0"]
    );
}

#[test]
fn test_scene_means_csv() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("means.csv");
    let means = vec![
        SceneMean {
            scene_id: "a".into(),
            acquired: common::ts(2021, 1, 5),
            mean: Some(0.5),
            valid_pixels: 4,
        },
        SceneMean {
            scene_id: "b".into(),
            acquired: common::ts(2021, 2, 5),
            mean: None,
            valid_pixels: 0,
        },
    ];
    write_scene_means_csv(&means, &path).unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec!["scene_id", "acquired", "mean", "valid_pixels"]
    );
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][0], "a");
    assert_eq!(&rows[0][2], "0.5");
    assert_eq!(&rows[1][2], "");
}

#[test]
fn test_summary_json_reports_empty_season() {
    let series = common::series(
        IndexKind::Ndvi,
        (2, 2),
        vec![common::constant_observation(
            "w",
            common::ts(2021, 1, 1),
            (2, 2),
            Some(0.5),
        )],
    );
    let composites = SeasonalAggregator::default().aggregate(&series).unwrap();
    let summary = CompositeSummary::from_composites(&composites);
    assert_eq!(summary.seasons[&Season::Winter].mean, Some(0.5));
    assert_eq!(summary.seasons[&Season::Fall].observations, 0);
    assert_eq!(summary.seasons[&Season::Fall].empty_pixels, 4);
    assert_eq!(summary.warnings.len(), 3);

    let dir = tempdir().unwrap();
    let path = dir.path().join("summary.json");
    write_summary(&[summary], &path).unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value[0]["index"], "ndvi");
    assert!(value[0]["seasons"]["spring"]["mean"].is_null());
    assert_eq!(value[0]["warnings"][0], "spring: no observations");
}
