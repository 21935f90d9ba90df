use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::consts::{
    ARMIJO_C1, DEFAULT_GRADIENT_TOLERANCE, DEFAULT_MINIMIZER_ITERATIONS, LINE_SEARCH_SHRINK,
    MAX_LINE_SEARCH_STEPS,
};
use crate::error::{Result, SuperResError};

/// Scalar objective over a flat parameter vector.
pub trait ObjectiveFunction: Sync {
    fn num_parameters(&self) -> usize;

    /// Objective value at `parameters`. When `gradient` is given it is
    /// filled with the gradient at the same point.
    fn evaluate(&self, parameters: &[f64], gradient: Option<&mut [f64]>) -> Result<f64>;
}

/// Anything that refines a parameter vector against an [`ObjectiveFunction`].
pub trait Minimizer {
    fn minimize(
        &self,
        objective: &dyn ObjectiveFunction,
        initial: &[f64],
    ) -> Result<MinimizerReport>;
}

/// Outcome of one minimization.
#[derive(Clone, Debug)]
pub struct MinimizerReport {
    pub parameters: Vec<f64>,
    pub initial_cost: f64,
    pub final_cost: f64,
    pub iterations: usize,
    /// Gradient norm fell below the tolerance.
    pub converged: bool,
}

/// Settings for the built-in conjugate gradient minimizer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MinimizerConfig {
    pub max_iterations: usize,
    pub gradient_tolerance: f64,
    /// Use central differences instead of the analytic gradient.
    #[serde(default)]
    pub numerical_gradient: bool,
}

impl Default for MinimizerConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MINIMIZER_ITERATIONS,
            gradient_tolerance: DEFAULT_GRADIENT_TOLERANCE,
            numerical_gradient: false,
        }
    }
}

/// Nonlinear conjugate gradient (Polak-Ribiere+) with a backtracking Armijo
/// line search.
#[derive(Clone, Debug, Default)]
pub struct ConjugateGradient {
    config: MinimizerConfig,
}

impl ConjugateGradient {
    pub fn new(config: MinimizerConfig) -> Self {
        Self { config }
    }

    fn value_and_gradient(
        &self,
        objective: &dyn ObjectiveFunction,
        x: &[f64],
        gradient: &mut [f64],
    ) -> Result<f64> {
        if self.config.numerical_gradient {
            let value = objective.evaluate(x, None)?;
            numerical_gradient_into(objective, x, gradient)?;
            Ok(value)
        } else {
            objective.evaluate(x, Some(gradient))
        }
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Central-difference gradient of `objective` at `x`.
pub fn numerical_gradient(objective: &dyn ObjectiveFunction, x: &[f64]) -> Result<Vec<f64>> {
    let mut gradient = vec![0.0; x.len()];
    numerical_gradient_into(objective, x, &mut gradient)?;
    Ok(gradient)
}

fn numerical_gradient_into(
    objective: &dyn ObjectiveFunction,
    x: &[f64],
    gradient: &mut [f64],
) -> Result<()> {
    let mut probe = x.to_vec();
    for i in 0..x.len() {
        let step = 1e-6 * x[i].abs().max(1.0);
        probe[i] = x[i] + step;
        let forward = objective.evaluate(&probe, None)?;
        probe[i] = x[i] - step;
        let backward = objective.evaluate(&probe, None)?;
        probe[i] = x[i];
        gradient[i] = (forward - backward) / (2.0 * step);
    }
    Ok(())
}

impl Minimizer for ConjugateGradient {
    fn minimize(
        &self,
        objective: &dyn ObjectiveFunction,
        initial: &[f64],
    ) -> Result<MinimizerReport> {
        let n = objective.num_parameters();
        if initial.len() != n {
            return Err(SuperResError::SizeMismatch {
                expected: n,
                actual: initial.len(),
            });
        }

        let mut x = initial.to_vec();
        let mut gradient = vec![0.0; n];
        let mut cost = self.value_and_gradient(objective, &x, &mut gradient)?;
        let initial_cost = cost;
        let mut direction: Vec<f64> = gradient.iter().map(|g| -g).collect();
        let mut step = 1.0 / dot(&gradient, &gradient).sqrt().max(1.0);

        let mut candidate = vec![0.0; n];
        let mut new_gradient = vec![0.0; n];
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.config.max_iterations {
            let gradient_norm = dot(&gradient, &gradient).sqrt();
            if gradient_norm <= self.config.gradient_tolerance {
                converged = true;
                break;
            }

            let mut slope = dot(&gradient, &direction);
            if slope >= 0.0 {
                // Not a descent direction: restart along steepest descent.
                direction.iter_mut().zip(&gradient).for_each(|(d, g)| *d = -g);
                slope = -gradient_norm * gradient_norm;
            }

            let mut accepted = false;
            for _ in 0..MAX_LINE_SEARCH_STEPS {
                for ((c, xi), di) in candidate.iter_mut().zip(&x).zip(&direction) {
                    *c = xi + step * di;
                }
                let trial = objective.evaluate(&candidate, None)?;
                if trial <= cost + ARMIJO_C1 * step * slope {
                    accepted = true;
                    break;
                }
                step *= LINE_SEARCH_SHRINK;
            }
            if !accepted {
                warn!(iteration = iterations, cost, "Line search failed to decrease the objective");
                break;
            }

            cost = self.value_and_gradient(objective, &candidate, &mut new_gradient)?;
            let beta = (dot(&new_gradient, &new_gradient) - dot(&new_gradient, &gradient))
                / (gradient_norm * gradient_norm);
            let beta = beta.max(0.0);
            for (d, g) in direction.iter_mut().zip(&new_gradient) {
                *d = -g + beta * *d;
            }

            std::mem::swap(&mut x, &mut candidate);
            std::mem::swap(&mut gradient, &mut new_gradient);
            iterations += 1;
            step = (step / LINE_SEARCH_SHRINK).min(1e6);
            debug!(iteration = iterations, cost, beta, "Conjugate gradient step");
        }

        Ok(MinimizerReport {
            parameters: x,
            initial_cost,
            final_cost: cost,
            iterations,
            converged,
        })
    }
}
