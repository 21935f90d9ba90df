use std::sync::Arc;

use tracing::info;

use crate::error::{Result, SuperResError};
use crate::image_data::ImageData;
use crate::io::{load_images_from_directory, save_image};
use crate::motion::MotionShiftSequence;
use crate::solver::{build_initial_estimate, MapSolver};

use super::config::ReconstructionConfig;
use super::types::{NoOpReporter, PipelineStage, ProgressReporter};

/// Load frames and motion, reconstruct the HR image, and write it to
/// `config.output`.
pub fn run_reconstruction_reported(
    config: &ReconstructionConfig,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<ImageData> {
    reporter.begin_stage(PipelineStage::Reading, None);
    let frames = load_images_from_directory(&config.input)?;
    let motion = MotionShiftSequence::load_from_file(&config.motion_file)?;
    if motion.len() < frames.len() {
        return Err(SuperResError::Configuration(format!(
            "{} frames but only {} motion shifts",
            frames.len(),
            motion.len()
        )));
    }
    reporter.finish_stage();
    info!(
        frames = frames.len(),
        size = %frames[0].size(),
        channels = frames[0].num_channels(),
        "Loaded observations"
    );

    reporter.begin_stage(PipelineStage::InitialEstimate, None);
    let initial = build_initial_estimate(
        &frames,
        &motion,
        config.degradation.scale,
        config.solver.initial_estimate,
    )?;
    reporter.finish_stage();
    info!(
        strategy = %config.solver.initial_estimate,
        size = %initial.size(),
        "Initial estimate ready"
    );

    let model = config.degradation.build_reconstruction_model(motion)?;
    let solver = MapSolver::new(&model, frames, config.solver.clone())?;
    let total_steps = initial.num_channels() * config.solver.irls_iterations;
    reporter.begin_stage(PipelineStage::Solving, Some(total_steps));
    let mut steps_done = 0;
    let result = solver.solve_with_progress(&initial, |_| {
        steps_done += 1;
        reporter.advance(steps_done);
    })?;
    reporter.finish_stage();

    reporter.begin_stage(PipelineStage::Writing, None);
    save_image(&result, &config.output)?;
    reporter.finish_stage();
    info!(output = %config.output.display(), "Reconstruction written");

    Ok(result)
}

/// Run the reconstruction without progress reporting.
pub fn run_reconstruction(config: &ReconstructionConfig) -> Result<ImageData> {
    run_reconstruction_reported(config, Arc::new(NoOpReporter))
}
