use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use superres_core::io::{load_image, save_images_to_directory};
use superres_core::motion::MotionShiftSequence;
use superres_core::simulate::simulate_low_res_frames;

use super::DegradationArgs;

#[derive(Args)]
pub struct SimulateArgs {
    /// High-resolution source image
    pub file: PathBuf,

    /// Motion file, one "dx dy" line per frame
    #[arg(short, long)]
    pub motion: PathBuf,

    #[command(flatten)]
    pub degradation: DegradationArgs,

    /// Additive Gaussian noise sigma (0 disables noise)
    #[arg(long, default_value = "0.0")]
    pub noise_sigma: f64,

    /// Seed for reproducible noise
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output image format for the frames
    #[arg(long, default_value = "tiff")]
    pub format: String,

    /// Output directory
    #[arg(short, long, default_value = "frames")]
    pub output: PathBuf,
}

pub fn run(args: &SimulateArgs) -> Result<()> {
    let high_res = load_image(&args.file)
        .with_context(|| format!("Failed to load {}", args.file.display()))?;
    let motion = MotionShiftSequence::load_from_file(&args.motion)
        .with_context(|| format!("Failed to read motion file {}", args.motion.display()))?;

    let mut config = args.degradation.to_config();
    config.noise_sigma = args.noise_sigma;
    config.noise_seed = args.seed;
    let model = config.build_model(motion.clone())?;

    let frames = simulate_low_res_frames(&high_res, &model, motion.len())?;
    let paths = save_images_to_directory(&frames, &args.output, &args.format)
        .with_context(|| format!("Failed to write frames to {}", args.output.display()))?;

    println!(
        "Simulated {} frames of {} from {} ({})",
        paths.len(),
        frames[0].size(),
        args.file.display(),
        high_res.size()
    );
    println!("Frames saved to {}", args.output.display());
    Ok(())
}
