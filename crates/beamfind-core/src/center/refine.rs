//! Center refinement: skip-or-refine around the initial estimate.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::consts::{
    DEFAULT_FATOL, DEFAULT_MAX_EVALUATIONS, DEFAULT_MAX_ITERATIONS, DEFAULT_SKIP_TOLERANCE,
    DEFAULT_XATOL,
};
use crate::frame::{Center, ValidityMask};

use super::initial::initial_center;
use super::metric::MetricContext;
use super::profile::ProfileConfig;
use super::simplex::{nelder_mead, SimplexOptions, Termination};

/// Optimizer tolerances and budgets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RefineConfig {
    /// Simplex size tolerance in pixels.
    #[serde(default = "default_xatol")]
    pub xatol: f64,
    /// Metric spread tolerance.
    #[serde(default = "default_fatol")]
    pub fatol: f64,
    /// Metric at the initial guess below which refinement is skipped.
    #[serde(default = "default_skip_tolerance")]
    pub skip_tolerance: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_max_evaluations")]
    pub max_evaluations: usize,
}

fn default_xatol() -> f64 {
    DEFAULT_XATOL
}
fn default_fatol() -> f64 {
    DEFAULT_FATOL
}
fn default_skip_tolerance() -> f64 {
    DEFAULT_SKIP_TOLERANCE
}
fn default_max_iterations() -> usize {
    DEFAULT_MAX_ITERATIONS
}
fn default_max_evaluations() -> usize {
    DEFAULT_MAX_EVALUATIONS
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            xatol: DEFAULT_XATOL,
            fatol: DEFAULT_FATOL,
            skip_tolerance: DEFAULT_SKIP_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_evaluations: DEFAULT_MAX_EVALUATIONS,
        }
    }
}

/// Terminal state of the refiner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefineStatus {
    /// Metric at the initial guess was already below the skip tolerance.
    Skipped,
    /// Simplex met both tolerances.
    Converged,
    /// Iteration or evaluation budget ran out before convergence.
    IterationLimit,
}

impl std::fmt::Display for RefineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skipped => write!(f, "Skipped"),
            Self::Converged => write!(f, "Converged"),
            Self::IterationLimit => write!(f, "Iteration limit"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RefineOutcome {
    pub initial: Center,
    pub initial_metric: f64,
    /// Best center found (the initial guess when skipped).
    pub center: Center,
    /// Metric at `center`.
    pub metric: f64,
    pub status: RefineStatus,
    pub iterations: usize,
    pub evaluations: usize,
}

/// Refine `initial` by minimizing the asymmetry metric.
///
/// The metric's base offsets are taken around `initial`. The returned
/// center is always finite when `initial` is.
pub fn refine_center(
    frame: &Array2<f32>,
    mask: &ValidityMask,
    initial: Center,
    profile: &ProfileConfig,
    config: &RefineConfig,
    verbose: bool,
) -> RefineOutcome {
    let ctx = MetricContext::new(frame, mask, initial, profile).with_verbose(verbose);

    let initial_metric = ctx.evaluate(initial);
    if verbose {
        debug!(center = %initial, metric = initial_metric, "Metric at initial center");
    }

    if initial_metric < config.skip_tolerance {
        if verbose {
            debug!("Initial metric below skip tolerance; skipping optimization");
        }
        return RefineOutcome {
            initial,
            initial_metric,
            center: initial,
            metric: initial_metric,
            status: RefineStatus::Skipped,
            iterations: 0,
            evaluations: 1,
        };
    }

    let options = SimplexOptions {
        xatol: config.xatol,
        fatol: config.fatol,
        max_iterations: config.max_iterations,
        max_evaluations: config.max_evaluations,
    };
    let result = nelder_mead(
        |p: &[f64; 2]| ctx.evaluate(Center::new(p[0], p[1])),
        [initial.x, initial.y],
        &options,
    );

    let status = match result.termination {
        Termination::Converged => RefineStatus::Converged,
        Termination::IterationLimit | Termination::EvaluationLimit => RefineStatus::IterationLimit,
    };
    let center = Center::new(result.x[0], result.x[1]);
    if verbose {
        debug!(
            center = %center,
            metric = result.fval,
            iterations = result.iterations,
            status = %status,
            "Refinement finished"
        );
    }

    RefineOutcome {
        initial,
        initial_metric,
        center,
        metric: result.fval,
        status,
        iterations: result.iterations,
        evaluations: result.evaluations + 1,
    }
}

/// Estimate the initial center, then refine it.
pub fn find_center(
    frame: &Array2<f32>,
    mask: &ValidityMask,
    profile: &ProfileConfig,
    config: &RefineConfig,
    verbose: bool,
) -> RefineOutcome {
    let initial = initial_center(frame, mask);
    refine_center(frame, mask, initial, profile, config, verbose)
}
