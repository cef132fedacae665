use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use depthmatch_3d::metrics::{
    pairwise_consistency, reference_error, rotation_angular_error, rotation_symmetry_error,
    PoseErrorReport,
};
use depthmatch_3d::pose::RelativePose;
use depthmatch_3d::warp::flow_from_depth;
use depthmatch_io::ground_truth::{GroundTruthImage, RelativePoseRecord};
use depthmatch_io::{
    CorrespondenceSink, ImageProvider, ImageRegistration, MatchPose, MatchRecord, PairKey,
    PairPrediction, PredictionSource, PriorPose,
};
use depthmatch_matching::{cross_check_matches, flow_to_matches, photometric_check};

use crate::config::PipelineConfig;
use crate::error::PipelineError;

/// Why a pair was not processed.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The key does not follow the `imageA---imageB` pattern.
    MalformedKey,
    /// The source lists the key but has no prediction for it.
    MissingForward,
    /// The source has no prediction for the opposite direction.
    MissingReverse,
    /// The rotation angles of both directions differ by more than the configured limit.
    Asymmetric(f64),
}

/// A pair that was skipped on purpose.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedPair {
    /// The key as listed by the source.
    pub key: String,
    /// The reason.
    pub reason: SkipReason,
}

/// A pair whose processing failed.
#[derive(Debug)]
pub struct PairFailure {
    /// The key as listed by the source.
    pub key: String,
    /// The error that stopped the pair.
    pub error: PipelineError,
}

/// The result of one processed pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PairOutcome {
    /// The forward key.
    pub key: PairKey,
    /// The sink id of the source image.
    pub image_id1: u32,
    /// The sink id of the target image.
    pub image_id2: u32,
    /// Rotation angle of the loop formed by both predicted rotations.
    pub rotation_error: f64,
    /// Angle between both predicted translations, `None` when one of them is zero.
    pub translation_error: Option<f64>,
    /// Difference of the rotation angles of both directions.
    pub symmetry_error: f64,
    /// Predicted scale of the forward direction.
    pub scale12: f64,
    /// Predicted scale of the backward direction.
    pub scale21: f64,
    /// The forward pose forwarded to the sink.
    pub pose: RelativePose,
    /// Number of forward flow matches.
    pub forward_matches: usize,
    /// Number of backward flow matches.
    pub backward_matches: usize,
    /// Number of cross-checked correspondences.
    pub cross_checked: usize,
    /// Number of correspondences written to the sink.
    pub accepted: usize,
    /// Error of the forward prediction against the reference pose, if one is known.
    pub reference: Option<PoseErrorReport>,
}

impl PairOutcome {
    /// The line of this pair in the relative pose output file.
    pub fn relative_pose_record(&self) -> RelativePoseRecord {
        RelativePoseRecord {
            key: self.key.clone(),
            image_id1: self.image_id1,
            image_id2: self.image_id2,
            translation: self.pose.translation,
            rotation: self.pose.rotation_vector(),
        }
    }
}

/// Everything a batch run produced.
#[derive(Debug, Default)]
pub struct BatchResult {
    /// Processed pairs in processing order.
    pub outcomes: Vec<PairOutcome>,
    /// Pairs skipped on purpose.
    pub skipped: Vec<SkippedPair>,
    /// Pairs that failed.
    pub failures: Vec<PairFailure>,
    /// Whether the run stopped early on request.
    pub cancelled: bool,
}

impl BatchResult {
    /// The relative pose output lines of all processed pairs.
    pub fn relative_pose_records(&self) -> Vec<RelativePoseRecord> {
        self.outcomes
            .iter()
            .map(PairOutcome::relative_pose_record)
            .collect()
    }
}

enum PairStep {
    Skipped(SkipReason),
    Done(Box<PairOutcome>),
}

/// Runs the correspondence pipeline over every image pair of a prediction source.
///
/// Pairs are processed one at a time in source order. A pair is used once, in the direction
/// met first, and only when both directions are available.
pub struct PairOrchestrator {
    config: PipelineConfig,
    reference_poses: HashMap<PairKey, RelativePose>,
    ground_truth: HashMap<String, GroundTruthImage>,
    cancel: Option<Arc<AtomicBool>>,
}

impl PairOrchestrator {
    /// Create an orchestrator with the given configuration.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            reference_poses: HashMap::new(),
            ground_truth: HashMap::new(),
            cancel: None,
        }
    }

    /// Reference relative poses used to audit the forward predictions.
    pub fn with_reference_poses(mut self, poses: HashMap<PairKey, RelativePose>) -> Self {
        self.reference_poses = poses;
        self
    }

    /// Ground truth absolute poses.
    ///
    /// They are attached to the image registrations and, for pairs without an explicit
    /// reference pose, composed into one.
    pub fn with_ground_truth_images(mut self, images: Vec<GroundTruthImage>) -> Self {
        self.ground_truth = images
            .into_iter()
            .map(|image| (image.name.clone(), image))
            .collect();
        self
    }

    /// A flag checked before every pair; setting it stops the run.
    pub fn with_cancel_token(mut self, token: Arc<AtomicBool>) -> Self {
        self.cancel = Some(token);
        self
    }

    /// The configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|token| token.load(Ordering::Relaxed))
    }

    /// Process every pair of `source`, writing the accepted correspondences to `sink`.
    ///
    /// # Arguments
    ///
    /// * `source` - The depth and pose predictions.
    /// * `images` - The color images, only read when the photometric check is enabled.
    /// * `sink` - Receives the image registrations and correspondences.
    ///
    /// # Errors
    ///
    /// Only listing the keys of `source` fails the run. Errors of a single pair are
    /// collected in [`BatchResult::failures`].
    pub fn run<S, K>(
        &self,
        source: &S,
        images: &dyn ImageProvider,
        sink: &mut K,
    ) -> Result<BatchResult, PipelineError>
    where
        S: PredictionSource + ?Sized,
        K: CorrespondenceSink + ?Sized,
    {
        let mut result = BatchResult::default();
        let mut visited = HashSet::new();

        for key in source.pair_keys()? {
            if self.is_cancelled() {
                log::info!("cancelled after {} pairs", result.outcomes.len());
                result.cancelled = true;
                break;
            }

            if visited.contains(&key) {
                continue;
            }

            log::info!("Processing {}", key);

            let pair = match PairKey::parse(&key) {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("skipping {}: {}", key, e);
                    visited.insert(key.clone());
                    result.skipped.push(SkippedPair {
                        key,
                        reason: SkipReason::MalformedKey,
                    });
                    continue;
                }
            };
            visited.insert(pair.to_string());
            visited.insert(pair.reversed().to_string());

            match self.process_pair(&pair, source, images, sink) {
                Ok(PairStep::Done(outcome)) => result.outcomes.push(*outcome),
                Ok(PairStep::Skipped(reason)) => {
                    log::warn!("skipping {}: {:?}", key, reason);
                    result.skipped.push(SkippedPair { key, reason });
                }
                Err(error) => {
                    log::warn!("failed to process {}: {}", key, error);
                    result.failures.push(PairFailure { key, error });
                }
            }
        }

        log::info!(
            "processed {} pairs, skipped {}, failed {}",
            result.outcomes.len(),
            result.skipped.len(),
            result.failures.len()
        );

        Ok(result)
    }

    fn process_pair<S, K>(
        &self,
        key: &PairKey,
        source: &S,
        images: &dyn ImageProvider,
        sink: &mut K,
    ) -> Result<PairStep, PipelineError>
    where
        S: PredictionSource + ?Sized,
        K: CorrespondenceSink + ?Sized,
    {
        let Some(p12) = source.read(key)? else {
            return Ok(PairStep::Skipped(SkipReason::MissingForward));
        };
        let Some(p21) = source.read(&key.reversed())? else {
            return Ok(PairStep::Skipped(SkipReason::MissingReverse));
        };

        let symmetry_error = rotation_symmetry_error(&p12.pose.rotation, &p21.pose.rotation);
        if let Some(max) = self.config.max_symmetry_error {
            if symmetry_error > max {
                return Ok(PairStep::Skipped(SkipReason::Asymmetric(symmetry_error)));
            }
        }

        let (rotation_error, translation_error) = match pairwise_consistency(&p12.pose, &p21.pose)
        {
            Ok(report) => (report.rotation_error, Some(report.translation_error)),
            Err(e) => {
                log::warn!("no translation error for {}: {}", key, e);
                (
                    rotation_angular_error(&p12.pose.rotation, &p21.pose.rotation),
                    None,
                )
            }
        };

        let flow12 = flow_from_depth(&p12.depth, &p12.pose, self.config.focal_length);
        let flow21 = flow_from_depth(&p21.depth, &p21.pose, self.config.focal_length);
        let forward = flow_to_matches(&flow12);
        let backward = flow_to_matches(&flow21);
        log::info!("  => Found {} <-> {} matches", forward.len(), backward.len());

        let mut matches = cross_check_matches(&forward, &backward, self.config.max_reproj_error);
        let cross_checked = matches.len();
        log::info!("  => Cross-checked {} matches", cross_checked);

        if let Some(max_error) = self.config.max_photometric_error {
            if !matches.is_empty() {
                let image1 = images.load(&key.first)?;
                let image2 = images.load(&key.second)?;
                let cols = self
                    .config
                    .photometric_cols
                    .unwrap_or_else(|| p12.depth.width());
                matches = photometric_check(&matches, max_error, &image1, &image2, cols)?;
                log::info!("  => Photo-checked {} matches", matches.len());
            }
        }

        let image_id1 = sink.register_image(&self.registration(&key.first, &p12))?;
        let image_id2 = sink.register_image(&self.registration(&key.second, &p21))?;

        if !matches.is_empty() {
            let pose = if self.config.record_pose {
                let r = p12.pose.rotation_vector();
                let t = p12.pose.translation;
                MatchPose::PoseAugmented {
                    rotation: [r[0] as f32, r[1] as f32, r[2] as f32],
                    translation: [t[0] as f32, t[1] as f32, t[2] as f32],
                }
            } else {
                MatchPose::Geometric
            };
            sink.write_matches(&MatchRecord::new(key, image_id1, image_id2, &matches, pose))?;
        }

        let reference = self.reference_pose(key).and_then(|reference| {
            match reference_error(&p12.pose, &reference) {
                Ok(report) => Some(report),
                Err(e) => {
                    log::warn!("no reference error for {}: {}", key, e);
                    None
                }
            }
        });

        Ok(PairStep::Done(Box::new(PairOutcome {
            key: key.clone(),
            image_id1,
            image_id2,
            rotation_error,
            translation_error,
            symmetry_error,
            scale12: p12.scale,
            scale21: p21.scale,
            pose: p12.pose,
            forward_matches: forward.len(),
            backward_matches: backward.len(),
            cross_checked,
            accepted: matches.len(),
            reference,
        })))
    }

    fn registration(&self, name: &str, prediction: &PairPrediction) -> ImageRegistration {
        let registration = ImageRegistration::new(
            name,
            prediction.depth.size(),
            self.config.focal_length,
            self.config.image_scale,
        );
        match self.ground_truth.get(name) {
            Some(image) => registration.with_prior(PriorPose::from(image)),
            None => registration,
        }
    }

    fn reference_pose(&self, key: &PairKey) -> Option<RelativePose> {
        if let Some(pose) = self.reference_poses.get(key) {
            return Some(*pose);
        }
        let a = self.ground_truth.get(&key.first)?;
        let b = self.ground_truth.get(&key.second)?;
        Some(RelativePose::from_absolute(&a.pose(), &b.pose()))
    }
}
