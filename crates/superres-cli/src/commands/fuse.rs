use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use superres_core::fusion::shift_add_fusion;
use superres_core::io::{load_images_from_directory, save_image};
use superres_core::motion::MotionShiftSequence;

#[derive(Args)]
pub struct FuseArgs {
    /// Directory of LR frames
    pub input: PathBuf,

    /// Motion file, one "dx dy" line per frame
    #[arg(short, long)]
    pub motion: PathBuf,

    /// Integer upsampling factor
    #[arg(long, default_value = "2")]
    pub scale: usize,

    /// Output file path
    #[arg(short, long, default_value = "fused.tiff")]
    pub output: PathBuf,
}

pub fn run(args: &FuseArgs) -> Result<()> {
    let frames = load_images_from_directory(&args.input)
        .with_context(|| format!("Failed to load frames from {}", args.input.display()))?;
    let motion = MotionShiftSequence::load_from_file(&args.motion)
        .with_context(|| format!("Failed to read motion file {}", args.motion.display()))?;

    let fused = shift_add_fusion(&frames, &motion, args.scale)?;
    save_image(&fused, &args.output)
        .with_context(|| format!("Failed to save {}", args.output.display()))?;

    println!(
        "Fused {} frames into {} at {}x",
        frames.len(),
        fused.size(),
        args.scale
    );
    println!("Output saved to {}", args.output.display());
    Ok(())
}
