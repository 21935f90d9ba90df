pub mod config;
pub mod irls_cost;
pub mod map_cost;
pub mod map_solver;
pub mod minimizer;

pub use config::{InitialEstimate, SolverConfig};
pub use irls_cost::IrlsCostProcessor;
pub use map_cost::MapCostFunction;
pub use map_solver::{build_initial_estimate, MapSolver, SolverProgress};
pub use minimizer::{
    numerical_gradient, ConjugateGradient, Minimizer, MinimizerConfig, MinimizerReport,
    ObjectiveFunction,
};
