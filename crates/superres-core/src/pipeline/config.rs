use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::model::DegradationConfig;
use crate::solver::SolverConfig;

/// Everything needed for one reconstruction run, as stored in a TOML file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReconstructionConfig {
    /// Directory of LR frames, loaded in file name order.
    pub input: PathBuf,
    /// Motion file with one `dx dy` line per frame.
    pub motion_file: PathBuf,
    pub output: PathBuf,
    #[serde(default)]
    pub degradation: DegradationConfig,
    #[serde(default)]
    pub solver: SolverConfig,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("frames"),
            motion_file: PathBuf::from("motion.txt"),
            output: PathBuf::from("reconstruction.tiff"),
            degradation: DegradationConfig::default(),
            solver: SolverConfig::default(),
        }
    }
}
