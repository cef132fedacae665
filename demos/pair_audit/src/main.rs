use argh::FromArgs;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use depthmatch::io::{ground_truth, DirectoryImages, PredictionArchive, RecordFileSink};
use depthmatch::report::ErrorStatistics;
use depthmatch::{PairOrchestrator, PipelineConfig};

#[derive(FromArgs)]
/// Turn predicted depth and relative poses into cross-checked correspondences
struct Args {
    /// path to the prediction archive
    #[argh(option)]
    archive: PathBuf,

    /// directory holding the color images
    #[argh(option)]
    images_dir: PathBuf,

    /// path of the record file to write
    #[argh(option, short = 'o')]
    output: PathBuf,

    /// optional JSON configuration file
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// optional ground truth images file
    #[argh(option)]
    gt_images: Option<PathBuf>,

    /// optional ground truth relative poses file
    #[argh(option)]
    gt_relative_poses: Option<PathBuf>,

    /// optional path of the relative pose output file
    #[argh(option)]
    relative_poses: Option<PathBuf>,
}

fn log_statistics(name: &str, stats: Option<ErrorStatistics>) {
    match stats.map(|s| s.to_degrees()) {
        Some(s) => log::info!(
            "{}: n={} mean={:.3} std={:.3} median={:.3} min={:.3} max={:.3} (deg)",
            name,
            s.count,
            s.mean,
            s.std,
            s.median,
            s.min,
            s.max
        ),
        None => log::info!("{}: no samples", name),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env = env_logger::Env::default().default_filter_or("info");
    env_logger::init_from_env(env);

    let args: Args = argh::from_env();

    let config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };

    // create the cancellation token
    let cancel_token = Arc::new(AtomicBool::new(false));

    ctrlc::set_handler({
        let cancel_token = cancel_token.clone();
        move || {
            println!("Received Ctrl-C signal. Stopping after the current pair !!");
            cancel_token.store(true, Ordering::SeqCst);
        }
    })?;

    let mut orchestrator = PairOrchestrator::new(config).with_cancel_token(cancel_token);

    if let Some(path) = &args.gt_images {
        orchestrator = orchestrator.with_ground_truth_images(ground_truth::read_images_txt(path)?);
    }

    if let Some(path) = &args.gt_relative_poses {
        let poses: HashMap<_, _> = ground_truth::read_relative_poses_txt(path)?
            .iter()
            .map(|p| (p.key(), p.pose()))
            .collect();
        orchestrator = orchestrator.with_reference_poses(poses);
    }

    let archive = PredictionArchive::open(&args.archive)?;
    log::info!("loaded {} predictions", archive.len());

    let images = DirectoryImages::new(&args.images_dir);
    let mut sink = RecordFileSink::create(&args.output)?;

    let result = orchestrator.run(&archive, &images, &mut sink)?;
    sink.flush()?;

    for failure in &result.failures {
        log::error!("{}: {}", failure.key, failure.error);
    }

    log_statistics("rotation error", result.rotation_statistics());
    log_statistics("translation error", result.translation_statistics());
    log_statistics("reference rotation error", result.reference_rotation_statistics());
    log_statistics(
        "reference translation error",
        result.reference_translation_statistics(),
    );
    if let Some(correlation) = result.scale_correlation() {
        log::info!("scale correlation: {:.3}", correlation);
    }

    if let Some(path) = &args.relative_poses {
        ground_truth::write_relative_poses_txt(path, &result.relative_pose_records())?;
    }

    if result.cancelled {
        log::warn!("run cancelled, the record file holds the pairs processed so far");
    }

    Ok(())
}
