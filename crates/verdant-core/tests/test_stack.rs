#[allow(dead_code)]
mod common;

use ndarray::{array, Array2};

use verdant_core::error::VerdantError;
use verdant_core::index::{IndexCalculator, IndexKind};
use verdant_core::mask::{QaBitmask, QaFlag};
use verdant_core::scene::{BandName, GridSpec, Scene};
use verdant_core::stack::{BandStackBuilder, Resampling};

const ALL_BANDS: [BandName; 4] = [BandName::Red, BandName::Nir, BandName::Thermal, BandName::Qa];

#[test]
fn test_stack_shape_and_order() {
    let scenes = vec![
        common::uniform_scene("b", common::ts(2021, 7, 1), (3, 4), 0.1, 0.3, 300.0, 0),
        common::uniform_scene("a", common::ts(2021, 1, 1), (3, 4), 0.2, 0.4, 280.0, 0),
    ];
    let stack = BandStackBuilder::new(&ALL_BANDS).build(&scenes).unwrap();

    assert_eq!(stack.len(), 2);
    assert_eq!(stack.grid(), GridSpec::new(3, 4));
    assert_eq!(stack.data().dim(), (4, 2, 3, 4));
    // Time order follows the input order.
    assert_eq!(stack.scenes()[0].id, "b");
    assert_eq!(stack.raster(BandName::Red, 1).unwrap()[[0, 0]], 0.2);
    assert_eq!(stack.band(BandName::Thermal).unwrap()[[0, 2, 3]], 300.0);
}

#[test]
fn test_missing_thermal_band_names_scene_and_band() {
    let complete = common::uniform_scene("LC08_A", common::ts(2021, 1, 1), (2, 2), 0.1, 0.3, 290.0, 0);
    let mut partial = common::uniform_scene("LC08_B", common::ts(2021, 2, 1), (2, 2), 0.1, 0.3, 290.0, 0);
    partial.bands.remove(&BandName::Thermal);

    let err = BandStackBuilder::new(&ALL_BANDS)
        .build(&[complete, partial])
        .unwrap_err();
    match err {
        VerdantError::MissingBand { ref scene, band } => {
            assert_eq!(scene, "LC08_B");
            assert_eq!(band, BandName::Thermal);
        }
        other => panic!("expected MissingBand, got {other:?}"),
    }
    let msg = err.to_string();
    assert!(msg.contains("LC08_B"), "got: {msg}");
    assert!(msg.contains("lwir"), "got: {msg}");
}

#[test]
fn test_unrequested_band_may_be_absent() {
    let mut scene = common::uniform_scene("s", common::ts(2021, 1, 1), (2, 2), 0.1, 0.3, 290.0, 0);
    scene.bands.remove(&BandName::Thermal);
    let stack = BandStackBuilder::new(&[BandName::Red, BandName::Nir])
        .build(&[scene])
        .unwrap();
    assert!(!stack.has_band(BandName::Thermal));
    assert!(matches!(
        stack.band(BandName::Thermal),
        Err(VerdantError::MissingBand { .. })
    ));
}

#[test]
fn test_strict_resampling_reports_misalignment() {
    let a = common::uniform_scene("a", common::ts(2021, 1, 1), (4, 4), 0.1, 0.3, 290.0, 0);
    let b = common::uniform_scene("b", common::ts(2021, 2, 1), (2, 2), 0.1, 0.3, 290.0, 0);
    let err = BandStackBuilder::new(&ALL_BANDS)
        .resampling(Resampling::Strict)
        .build(&[a, b])
        .unwrap_err();
    assert!(matches!(err, VerdantError::Alignment(_)), "got {err:?}");
}

#[test]
fn test_nearest_resampling_onto_first_scene_grid() {
    let a = common::uniform_scene("a", common::ts(2021, 1, 1), (4, 4), 0.1, 0.3, 290.0, 0);
    let b = common::uniform_scene("b", common::ts(2021, 2, 1), (2, 2), 0.1, 0.3, 290.0, 0)
        .with_band(BandName::Red, array![[1.0f32, 2.0], [3.0, 4.0]]);
    let stack = BandStackBuilder::new(&ALL_BANDS)
        .resampling(Resampling::Nearest)
        .build(&[a, b])
        .unwrap();
    let red = stack.raster(BandName::Red, 1).unwrap();
    assert_eq!(red.dim(), (4, 4));
    assert_eq!(red[[0, 0]], 1.0);
    assert_eq!(red[[0, 3]], 2.0);
    assert_eq!(red[[3, 0]], 3.0);
    assert_eq!(red[[3, 3]], 4.0);
}

#[test]
fn test_bilinear_keeps_qa_words_intact() {
    let qa = array![[0.0f32, 8.0], [16.0, 0.0]];
    let scene = common::uniform_scene("a", common::ts(2021, 1, 1), (2, 2), 0.1, 0.3, 290.0, 0)
        .with_band(BandName::Qa, qa)
        .with_band(BandName::Red, array![[0.2f32, 0.6], [0.2, 0.6]]);
    let stack = BandStackBuilder::new(&ALL_BANDS)
        .resampling(Resampling::Bilinear)
        .grid(Some(GridSpec::new(4, 4)))
        .build(&[scene])
        .unwrap();

    let qa = stack.raster(BandName::Qa, 0).unwrap();
    assert!(qa.iter().all(|&v| v == 0.0 || v == 8.0 || v == 16.0));

    let red = stack.raster(BandName::Red, 0).unwrap();
    // Interior pixels fall between the two source columns.
    assert!(red[[1, 1]] > 0.2 && red[[1, 1]] < 0.6);
}

#[test]
fn test_bilinear_does_not_blend_fill_into_data() {
    // Left column is fill in both thermal DN and QA.
    let fill_qa = (1u16 << QaFlag::Fill.bit()) as f32;
    let scene = Scene::new("LC08_EDGE", common::ts(2021, 7, 1), common::footprint())
        .with_band(BandName::Thermal, array![[0.0f32, 44000.0], [0.0, 44000.0]])
        .with_band(BandName::Qa, array![[fill_qa, 0.0], [fill_qa, 0.0]]);
    let stack = BandStackBuilder::new(&[BandName::Thermal, BandName::Qa])
        .resampling(Resampling::Bilinear)
        .grid(Some(GridSpec::new(2, 6)))
        .build(&[scene])
        .unwrap();

    let thermal = stack.raster(BandName::Thermal, 0).unwrap();
    for c in 0..4 {
        assert!(thermal[[0, c]].is_nan(), "column {c}: {}", thermal[[0, c]]);
    }
    assert_eq!(thermal[[0, 4]], 44000.0);
    assert_eq!(thermal[[0, 5]], 44000.0);

    let series = IndexCalculator::new(QaBitmask::from_flags(&QaFlag::default_unusable()))
        .compute(&stack, IndexKind::Lst)
        .unwrap();
    let lst = &series.observations()[0].values;
    for c in 0..4 {
        assert_eq!(lst[[0, c]], None, "column {c}");
    }
    let t = lst[[0, 4]].unwrap();
    assert!((t - 26.2429).abs() < 1e-2, "got {t}");
    assert_eq!(series.observations()[0].valid_pixels(), 4);
}

#[test]
fn test_explicit_grid_is_used() {
    let scene = common::uniform_scene("a", common::ts(2021, 1, 1), (6, 6), 0.1, 0.3, 290.0, 0);
    let stack = BandStackBuilder::new(&ALL_BANDS)
        .grid(Some(GridSpec::new(3, 2)))
        .build(&[scene])
        .unwrap();
    assert_eq!(stack.grid(), GridSpec::new(3, 2));
    assert!(stack.band(BandName::Nir).unwrap().iter().all(|&v| (v - 0.3).abs() < 1e-6));
}

#[test]
fn test_duplicate_scene_is_alignment_error() {
    let a = common::uniform_scene("same", common::ts(2021, 1, 1), (2, 2), 0.1, 0.3, 290.0, 0);
    let b = a.clone();
    let err = BandStackBuilder::new(&ALL_BANDS).build(&[a, b]).unwrap_err();
    assert!(matches!(err, VerdantError::Alignment(_)));
}

#[test]
fn test_empty_raster_is_alignment_error() {
    let scene = common::uniform_scene("a", common::ts(2021, 1, 1), (2, 2), 0.1, 0.3, 290.0, 0)
        .with_band(BandName::Red, Array2::<f32>::zeros((0, 0)));
    let err = BandStackBuilder::new(&ALL_BANDS).build(&[scene]).unwrap_err();
    assert!(matches!(err, VerdantError::Alignment(_)));
}

#[test]
fn test_empty_input_errors() {
    assert!(matches!(
        BandStackBuilder::new(&ALL_BANDS).build(&[]),
        Err(VerdantError::EmptyStack)
    ));
    let scene = common::uniform_scene("a", common::ts(2021, 1, 1), (2, 2), 0.1, 0.3, 290.0, 0);
    assert!(BandStackBuilder::new(&[]).build(&[scene]).is_err());
}
