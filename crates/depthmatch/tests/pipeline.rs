use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use approx::assert_relative_eq;
use depthmatch::io::ground_truth::GroundTruthImage;
use depthmatch::io::{
    CorrespondenceSink, MatchPose, MemoryImages, MemorySink, PairKey, PairPrediction,
    PredictionArchive,
};
use depthmatch::k3d::pose::RelativePose;
use depthmatch::image::{Image, ImageSize};
use depthmatch::{PairOrchestrator, PipelineConfig, PipelineError, SkipReason};

const SIZE: ImageSize = ImageSize {
    width: 4,
    height: 4,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn config() -> PipelineConfig {
    PipelineConfig {
        focal_length: 2.0,
        image_scale: 2.0,
        ..Default::default()
    }
}

fn prediction(rotation: [[f64; 3]; 3], tx: f64, scale: f64) -> PairPrediction {
    PairPrediction {
        depth: Image::from_size_val(SIZE, 10.0),
        pose: RelativePose::new(rotation, [tx, 0.0, 0.0]),
        scale,
    }
}

const IDENTITY: [[f64; 3]; 3] = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

// Translations small enough that every pixel maps onto itself.
fn symmetric_archive() -> PredictionArchive {
    let mut archive = PredictionArchive::new();
    archive.insert("a---b", &prediction(IDENTITY, 0.001, 1.0));
    archive.insert("b---a", &prediction(IDENTITY, -0.001, 2.0));
    archive
}

fn gray(value: u8) -> Image<u8, 3> {
    Image::from_size_val(SIZE, value)
}

#[test]
fn identity_pair_end_to_end() -> Result<(), PipelineError> {
    init_logger();
    let archive = symmetric_archive();
    let mut sink = MemorySink::new();

    let result = PairOrchestrator::new(config()).run(&archive, &MemoryImages::new(), &mut sink)?;

    assert!(!result.cancelled);
    assert!(result.skipped.is_empty());
    assert!(result.failures.is_empty());
    assert_eq!(result.outcomes.len(), 1);

    let outcome = &result.outcomes[0];
    assert_eq!(outcome.key, PairKey::new("a", "b"));
    assert_eq!((outcome.image_id1, outcome.image_id2), (1, 2));
    assert_eq!(outcome.forward_matches, 16);
    assert_eq!(outcome.backward_matches, 16);
    assert_eq!(outcome.cross_checked, 16);
    assert_eq!(outcome.accepted, 16);
    assert_relative_eq!(outcome.rotation_error, 0.0, epsilon = 1e-9);
    assert_relative_eq!(outcome.translation_error.unwrap_or(f64::NAN), 0.0, epsilon = 1e-9);
    assert_eq!((outcome.scale12, outcome.scale21), (1.0, 2.0));
    assert!(outcome.reference.is_none());

    assert_eq!(sink.images().count(), 2);
    let records: Vec<_> = sink.match_records().collect();
    assert_eq!(records.len(), 1);
    let record = records[0];
    assert_eq!(record.pair_key, "a---b");
    assert_eq!(record.matches, (0..16).map(|i| [i, i]).collect::<Vec<_>>());
    match &record.pose {
        MatchPose::PoseAugmented {
            rotation,
            translation,
        } => {
            assert_eq!(*rotation, [0.0; 3]);
            assert_relative_eq!(translation[0], 0.001);
        }
        MatchPose::Geometric => panic!("expected the predicted pose"),
    }

    let lines = result.relative_pose_records();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].translation, [0.001, 0.0, 0.0]);

    let stats = result.rotation_statistics();
    assert_eq!(stats.map(|s| s.count), Some(1));
    assert!(result.scale_correlation().is_none());
    Ok(())
}

#[test]
fn zero_translation_keeps_matches() -> Result<(), PipelineError> {
    init_logger();
    let mut archive = PredictionArchive::new();
    archive.insert("a---b", &prediction(IDENTITY, 0.0, 1.0));
    archive.insert("b---a", &prediction(IDENTITY, 0.0, 1.0));
    let mut sink = MemorySink::new();

    let result = PairOrchestrator::new(config()).run(&archive, &MemoryImages::new(), &mut sink)?;
    assert_eq!(result.outcomes.len(), 1);
    assert!(result.outcomes[0].translation_error.is_none());
    assert_eq!(result.outcomes[0].accepted, 16);
    assert!(result.translation_statistics().is_none());
    Ok(())
}

#[test]
fn skipped_pairs_write_nothing() -> Result<(), PipelineError> {
    init_logger();
    let (s, c) = 3.0f64.sin_cos();
    let spin = [[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]];

    let mut archive = symmetric_archive();
    archive.insert("broken", &prediction(IDENTITY, 0.001, 1.0));
    archive.insert("c---d", &prediction(IDENTITY, 0.001, 1.0));
    archive.insert("e---f", &prediction(spin, 0.001, 1.0));
    archive.insert("f---e", &prediction(IDENTITY, -0.001, 1.0));
    let mut sink = MemorySink::new();

    let result = PairOrchestrator::new(config()).run(&archive, &MemoryImages::new(), &mut sink)?;

    assert_eq!(result.outcomes.len(), 1);
    let skipped: Vec<_> = result
        .skipped
        .iter()
        .map(|s| (s.key.as_str(), s.reason.clone()))
        .collect();
    assert_eq!(skipped.len(), 3);
    assert_eq!(skipped[0], ("broken", SkipReason::MalformedKey));
    assert_eq!(skipped[1], ("c---d", SkipReason::MissingReverse));
    assert_eq!(skipped[2].0, "e---f");
    assert!(matches!(skipped[2].1, SkipReason::Asymmetric(e) if (e - 3.0).abs() < 1e-9));

    assert_eq!(sink.images().count(), 2);
    assert_eq!(sink.match_records().count(), 1);
    Ok(())
}

#[test]
fn symmetry_gate_can_be_disabled() -> Result<(), PipelineError> {
    init_logger();
    let (s, c) = 3.0f64.sin_cos();
    let spin = [[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]];
    let mut archive = PredictionArchive::new();
    archive.insert("e---f", &prediction(spin, 0.001, 1.0));
    archive.insert("f---e", &prediction(IDENTITY, -0.001, 1.0));

    let config = PipelineConfig {
        max_symmetry_error: None,
        ..config()
    };
    let result =
        PairOrchestrator::new(config).run(&archive, &MemoryImages::new(), &mut MemorySink::new())?;
    assert!(result.skipped.is_empty());
    assert_eq!(result.outcomes.len(), 1);
    assert_relative_eq!(result.outcomes[0].symmetry_error, 3.0, epsilon = 1e-9);
    Ok(())
}

#[test]
fn cancelled_before_start() -> Result<(), PipelineError> {
    init_logger();
    let token = Arc::new(AtomicBool::new(true));
    let mut sink = MemorySink::new();

    let result = PairOrchestrator::new(config())
        .with_cancel_token(token)
        .run(&symmetric_archive(), &MemoryImages::new(), &mut sink)?;

    assert!(result.cancelled);
    assert!(result.outcomes.is_empty());
    assert!(sink.records.is_empty());
    Ok(())
}

#[test]
fn geometric_records_without_pose() -> Result<(), PipelineError> {
    init_logger();
    let config = PipelineConfig {
        record_pose: false,
        ..config()
    };
    let mut sink = MemorySink::new();
    PairOrchestrator::new(config).run(&symmetric_archive(), &MemoryImages::new(), &mut sink)?;

    let poses: Vec<_> = sink.match_records().map(|r| r.pose.clone()).collect();
    assert_eq!(poses, vec![MatchPose::Geometric]);
    Ok(())
}

#[test]
fn photometric_check_drops_changed_pixel() -> Result<(), PipelineError> {
    init_logger();
    let mut images = MemoryImages::new();
    images.insert("a", gray(100));
    let mut changed = gray(100);
    // pixel (1, 1)
    changed.as_slice_mut()[15..18].copy_from_slice(&[200, 200, 200]);
    images.insert("b", changed);

    let config = PipelineConfig {
        max_photometric_error: Some(1.0),
        ..config()
    };
    let mut sink = MemorySink::new();
    let result = PairOrchestrator::new(config).run(&symmetric_archive(), &images, &mut sink)?;

    let outcome = &result.outcomes[0];
    assert_eq!(outcome.cross_checked, 16);
    assert_eq!(outcome.accepted, 15);

    let record = sink.match_records().next().map(|r| r.matches.clone());
    let record = record.unwrap_or_default();
    assert_eq!(record.len(), 15);
    assert!(!record.contains(&[5, 5]));
    Ok(())
}

#[test]
fn missing_image_fails_only_that_pair() -> Result<(), PipelineError> {
    init_logger();
    let mut archive = symmetric_archive();
    archive.insert("c---d", &prediction(IDENTITY, 0.001, 1.0));
    archive.insert("d---c", &prediction(IDENTITY, -0.001, 1.0));

    let mut images = MemoryImages::new();
    images.insert("a", gray(50));
    images.insert("b", gray(50));

    let config = PipelineConfig {
        max_photometric_error: Some(1.0),
        ..config()
    };
    let mut sink = MemorySink::new();
    let result = PairOrchestrator::new(config).run(&archive, &images, &mut sink)?;

    assert_eq!(result.outcomes.len(), 1);
    assert_eq!(result.outcomes[0].accepted, 16);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].key, "c---d");
    assert!(matches!(result.failures[0].error, PipelineError::Image(_)));
    assert_eq!(sink.match_records().count(), 1);
    Ok(())
}

#[test]
fn ground_truth_reference_audit() -> Result<(), PipelineError> {
    init_logger();
    let image = |id: u32, name: &str, tx: f64| GroundTruthImage {
        image_id: id,
        camera_id: 1,
        name: name.to_string(),
        quaternion: [1.0, 0.0, 0.0, 0.0],
        translation: [tx, 0.0, 0.0],
        rotation: IDENTITY,
        angle_axis: [0.0; 3],
    };
    let mut sink = MemorySink::new();

    let result = PairOrchestrator::new(config())
        .with_ground_truth_images(vec![image(1, "a", 0.0), image(2, "b", 0.5)])
        .run(&symmetric_archive(), &MemoryImages::new(), &mut sink)?;

    let reference = result.outcomes[0].reference;
    assert!(reference.is_some());
    if let Some(reference) = reference {
        assert_relative_eq!(reference.rotation_error, 0.0, epsilon = 1e-9);
        assert_relative_eq!(reference.translation_error, 0.0, epsilon = 1e-9);
    }
    assert_eq!(result.reference_rotation_statistics().map(|s| s.count), Some(1));
    assert!(sink.images().all(|i| i.registration.prior.is_some()));
    Ok(())
}

#[test]
fn explicit_reference_pose_wins() -> Result<(), PipelineError> {
    init_logger();
    let mut references = HashMap::new();
    references.insert(
        PairKey::new("a", "b"),
        RelativePose::new(IDENTITY, [0.0, 1.0, 0.0]),
    );

    let result = PairOrchestrator::new(config())
        .with_reference_poses(references)
        .run(&symmetric_archive(), &MemoryImages::new(), &mut MemorySink::new())?;

    let reference = result.outcomes[0].reference.map(|r| r.translation_error);
    assert_relative_eq!(
        reference.unwrap_or(f64::NAN),
        std::f64::consts::FRAC_PI_2,
        epsilon = 1e-9
    );
    Ok(())
}

#[test]
fn sink_ids_are_shared_across_pairs() -> Result<(), PipelineError> {
    init_logger();
    let mut archive = symmetric_archive();
    archive.insert("b---c", &prediction(IDENTITY, 0.001, 1.0));
    archive.insert("c---b", &prediction(IDENTITY, -0.001, 1.0));
    let mut sink = MemorySink::new();

    let result = PairOrchestrator::new(config()).run(&archive, &MemoryImages::new(), &mut sink)?;

    let ids: Vec<_> = result
        .outcomes
        .iter()
        .map(|o| (o.image_id1, o.image_id2))
        .collect();
    assert_eq!(ids, vec![(1, 2), (2, 3)]);
    assert_eq!(sink.images().count(), 3);

    let first = sink.images().next().map(|i| i.registration.clone());
    if let Some(first) = first {
        assert_eq!(sink.register_image(&first)?, 1);
    }
    assert_eq!(sink.images().count(), 3);
    Ok(())
}
