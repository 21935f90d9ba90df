/// Floor substituted for the total variation wherever it is used as a
/// divisor (derivatives and IRLS weights). Never applied to residual values.
pub const MIN_TOTAL_VARIATION: f64 = 1e-6;

/// Minimum LR frame count to evaluate data terms with frame-level Rayon
/// parallelism.
pub const PARALLEL_FRAME_THRESHOLD: usize = 4;

/// Minimum pixel count (h*w) to use row-level Rayon parallelism in
/// convolutions.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Default regularization parameter (lambda) for the MAP objective.
pub const DEFAULT_REGULARIZATION_PARAMETER: f64 = 0.01;

/// Default number of outer IRLS iterations.
pub const DEFAULT_IRLS_ITERATIONS: usize = 5;

/// Default iteration cap for one inner minimization.
pub const DEFAULT_MINIMIZER_ITERATIONS: usize = 50;

/// Default gradient-norm stopping tolerance for the inner minimizer.
pub const DEFAULT_GRADIENT_TOLERANCE: f64 = 1e-8;

/// Armijo sufficient-decrease constant for the backtracking line search.
pub const ARMIJO_C1: f64 = 1e-4;

/// Step shrink factor for the backtracking line search.
pub const LINE_SEARCH_SHRINK: f64 = 0.5;

/// Maximum number of step halvings before a line search gives up.
pub const MAX_LINE_SEARCH_STEPS: usize = 40;

/// Number of averaging passes used to inpaint holes after shift-add fusion.
pub const MAX_INPAINT_PASSES: usize = 64;
