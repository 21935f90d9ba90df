use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use superres_core::pipeline::{
    run_reconstruction_reported, PipelineStage, ProgressReporter, ReconstructionConfig,
};
use superres_core::solver::InitialEstimate;
use tracing::debug;

use super::DegradationArgs;
use crate::summary::{print_reconstruction_summary, print_result};

#[derive(Clone, Copy, ValueEnum)]
pub enum InitialEstimateArg {
    Upsampled,
    ShiftAdd,
}

impl From<InitialEstimateArg> for InitialEstimate {
    fn from(arg: InitialEstimateArg) -> Self {
        match arg {
            InitialEstimateArg::Upsampled => InitialEstimate::Upsampled,
            InitialEstimateArg::ShiftAdd => InitialEstimate::ShiftAdd,
        }
    }
}

/// Flags passed explicitly override the `--config` file; unset flags keep the
/// file's values, or the built-in defaults without a file.
#[derive(Args)]
pub struct SolveArgs {
    /// Directory of LR frames
    pub input: PathBuf,

    /// Motion file, one "dx dy" line per frame
    #[arg(short, long)]
    pub motion: Option<PathBuf>,

    /// Reconstruction config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub degradation: DegradationArgs,

    /// Regularization parameter (lambda) [default: 0.01]
    #[arg(long)]
    pub lambda: Option<f64>,

    /// Outer IRLS iterations [default: 5]
    #[arg(long)]
    pub irls_iterations: Option<usize>,

    /// Conjugate gradient iterations per IRLS step [default: 50]
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// Use finite-difference gradients instead of analytic ones
    #[arg(long)]
    pub numerical_gradient: bool,

    /// Initial estimate strategy [default: upsampled]
    #[arg(long, value_enum)]
    pub initial: Option<InitialEstimateArg>,

    /// Output file path [default: reconstruction.tiff]
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Drives an indicatif bar from reconstruction progress.
struct BarReporter {
    bar: ProgressBar,
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, stage: PipelineStage, total_items: Option<usize>) {
        self.bar.set_message(stage.to_string());
        self.bar.set_length(total_items.unwrap_or(1) as u64);
        self.bar.set_position(0);
    }

    fn advance(&self, items_done: usize) {
        self.bar.set_position(items_done as u64);
    }

    fn finish_stage(&self) {
        if let Some(len) = self.bar.length() {
            self.bar.set_position(len);
        }
    }
}

pub fn run(args: &SolveArgs) -> Result<()> {
    let config = if let Some(ref config_path) = args.config {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        let config: ReconstructionConfig =
            toml::from_str(&contents).context("Invalid reconstruction config")?;
        apply_overrides(args, config)
    } else {
        if args.motion.is_none() {
            anyhow::bail!("--motion is required when no --config is given");
        }
        apply_overrides(args, ReconstructionConfig::default())
    };

    debug!(?config, "Reconstruction config");
    print_reconstruction_summary(&config);

    let bar = ProgressBar::new(1);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{msg:20} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    let reporter = Arc::new(BarReporter { bar: bar.clone() });

    let start = Instant::now();
    let result = run_reconstruction_reported(&config, reporter)?;
    bar.finish_with_message("Done");

    print_result(&result, &config.output, start.elapsed());
    Ok(())
}

/// Layer the command-line flags over `config`. The positional input always wins.
fn apply_overrides(args: &SolveArgs, mut config: ReconstructionConfig) -> ReconstructionConfig {
    config.input = args.input.clone();
    if let Some(ref motion) = args.motion {
        config.motion_file = motion.clone();
    }
    if let Some(ref output) = args.output {
        config.output = output.clone();
    }
    args.degradation.apply_to(&mut config.degradation);

    let solver = &mut config.solver;
    if let Some(lambda) = args.lambda {
        solver.regularization_parameter = lambda;
    }
    if let Some(iterations) = args.irls_iterations {
        solver.irls_iterations = iterations;
    }
    if let Some(iterations) = args.max_iterations {
        solver.minimizer.max_iterations = iterations;
    }
    if args.numerical_gradient {
        solver.minimizer.numerical_gradient = true;
    }
    if let Some(initial) = args.initial {
        solver.initial_estimate = initial.into();
    }
    config
}
