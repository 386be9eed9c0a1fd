//! Derivative-free Nelder-Mead simplex minimization.
//!
//! Standard (non-adaptive) coefficients: reflection 1, expansion 2,
//! contraction 0.5, shrink 0.5. Convergence requires both the simplex
//! extent and the spread of function values to fall within tolerance.

use crate::consts::{SIMPLEX_NONZERO_DELTA, SIMPLEX_ZERO_DELTA};

const RHO: f64 = 1.0;
const CHI: f64 = 2.0;
const PSI: f64 = 0.5;
const SIGMA: f64 = 0.5;

#[derive(Clone, Debug)]
pub struct SimplexOptions {
    /// Absolute tolerance on vertex distance from the best vertex.
    pub xatol: f64,
    /// Absolute tolerance on function value spread.
    pub fatol: f64,
    pub max_iterations: usize,
    pub max_evaluations: usize,
}

/// Why the minimization stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    Converged,
    IterationLimit,
    EvaluationLimit,
}

#[derive(Clone, Debug)]
pub struct SimplexResult<const N: usize> {
    /// Best vertex found.
    pub x: [f64; N],
    pub fval: f64,
    pub iterations: usize,
    pub evaluations: usize,
    pub termination: Termination,
}

/// Counts objective evaluations.
struct Objective<F> {
    f: F,
    evaluations: usize,
}

impl<F> Objective<F> {
    fn call<const N: usize>(&mut self, x: &[f64; N]) -> f64
    where
        F: FnMut(&[f64; N]) -> f64,
    {
        self.evaluations += 1;
        (self.f)(x)
    }
}

/// Minimize `f` starting at `x0`.
pub fn nelder_mead<const N: usize, F>(f: F, x0: [f64; N], options: &SimplexOptions) -> SimplexResult<N>
where
    F: FnMut(&[f64; N]) -> f64,
{
    let mut objective = Objective { f, evaluations: 0 };

    let mut sim: Vec<[f64; N]> = Vec::with_capacity(N + 1);
    sim.push(x0);
    for k in 0..N {
        let mut y = x0;
        y[k] = if y[k] != 0.0 {
            (1.0 + SIMPLEX_NONZERO_DELTA) * y[k]
        } else {
            SIMPLEX_ZERO_DELTA
        };
        sim.push(y);
    }
    let mut fsim: Vec<f64> = sim.iter().map(|x| objective.call(x)).collect();
    sort_simplex(&mut sim, &mut fsim);

    let mut iterations = 1usize;
    let mut converged = false;

    while objective.evaluations < options.max_evaluations && iterations < options.max_iterations {
        if is_converged(&sim, &fsim, options) {
            converged = true;
            break;
        }

        let worst = sim[N];
        let xbar = centroid(&sim[..N]);

        let xr = affine(&xbar, &worst, 1.0 + RHO, -RHO);
        let fxr = objective.call(&xr);
        let mut shrink = false;

        if fxr < fsim[0] {
            let xe = affine(&xbar, &worst, 1.0 + RHO * CHI, -RHO * CHI);
            let fxe = objective.call(&xe);
            if fxe < fxr {
                sim[N] = xe;
                fsim[N] = fxe;
            } else {
                sim[N] = xr;
                fsim[N] = fxr;
            }
        } else if fxr < fsim[N - 1] {
            sim[N] = xr;
            fsim[N] = fxr;
        } else if fxr < fsim[N] {
            // Outside contraction
            let xc = affine(&xbar, &worst, 1.0 + PSI * RHO, -PSI * RHO);
            let fxc = objective.call(&xc);
            if fxc <= fxr {
                sim[N] = xc;
                fsim[N] = fxc;
            } else {
                shrink = true;
            }
        } else {
            // Inside contraction
            let xcc = affine(&xbar, &worst, 1.0 - PSI, PSI);
            let fxcc = objective.call(&xcc);
            if fxcc < fsim[N] {
                sim[N] = xcc;
                fsim[N] = fxcc;
            } else {
                shrink = true;
            }
        }

        if shrink {
            let best = sim[0];
            for j in 1..=N {
                sim[j] = affine(&best, &sim[j], 1.0 - SIGMA, SIGMA);
                fsim[j] = objective.call(&sim[j]);
            }
        }

        iterations += 1;
        sort_simplex(&mut sim, &mut fsim);
    }

    let termination = if converged {
        Termination::Converged
    } else if objective.evaluations >= options.max_evaluations {
        Termination::EvaluationLimit
    } else {
        Termination::IterationLimit
    };

    SimplexResult {
        x: sim[0],
        fval: fsim[0],
        iterations,
        evaluations: objective.evaluations,
        termination,
    }
}

fn is_converged<const N: usize>(sim: &[[f64; N]], fsim: &[f64], options: &SimplexOptions) -> bool {
    // NaN spreads (e.g. inf - inf) never count as converged.
    let x_ok = sim[1..]
        .iter()
        .all(|v| v.iter().zip(&sim[0]).all(|(a, b)| (a - b).abs() <= options.xatol));
    let f_ok = fsim[1..]
        .iter()
        .all(|f| (fsim[0] - f).abs() <= options.fatol);
    x_ok && f_ok
}

fn centroid<const N: usize>(vertices: &[[f64; N]]) -> [f64; N] {
    let mut c = [0.0; N];
    for v in vertices {
        for (ci, vi) in c.iter_mut().zip(v) {
            *ci += vi;
        }
    }
    let n = vertices.len() as f64;
    c.iter_mut().for_each(|ci| *ci /= n);
    c
}

/// `a * wa + b * wb`, element-wise.
fn affine<const N: usize>(a: &[f64; N], b: &[f64; N], wa: f64, wb: f64) -> [f64; N] {
    let mut out = [0.0; N];
    for i in 0..N {
        out[i] = a[i] * wa + b[i] * wb;
    }
    out
}

fn sort_simplex<const N: usize>(sim: &mut Vec<[f64; N]>, fsim: &mut Vec<f64>) {
    let mut order: Vec<usize> = (0..fsim.len()).collect();
    order.sort_by(|&a, &b| fsim[a].total_cmp(&fsim[b]));
    *sim = order.iter().map(|&i| sim[i]).collect();
    *fsim = order.iter().map(|&i| fsim[i]).collect();
}
