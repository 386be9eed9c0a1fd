use ndarray::Array2;
use tracing::{debug, trace};

use crate::frame::{Center, ValidityMask};

use super::profile::{wedge_profiles, BaseOffsets, ProfileConfig, WedgeProfiles};
use super::symmetry::symmetric_mask;

/// Per-frame inputs of the asymmetry metric that stay fixed while the
/// candidate center moves.
pub struct MetricContext<'a> {
    pub frame: &'a Array2<f32>,
    pub mask: &'a ValidityMask,
    pub offsets: BaseOffsets,
    pub config: &'a ProfileConfig,
    pub verbose: bool,
}

impl<'a> MetricContext<'a> {
    /// Build a context whose base offsets are taken around `base`.
    pub fn new(
        frame: &'a Array2<f32>,
        mask: &'a ValidityMask,
        base: Center,
        config: &'a ProfileConfig,
    ) -> Self {
        let (rows, cols) = frame.dim();
        Self {
            frame,
            mask,
            offsets: BaseOffsets::new(base, rows, cols),
            config,
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn evaluate(&self, candidate: Center) -> f64 {
        asymmetry_metric(candidate, self)
    }
}

/// Mean squared difference between the profiles of opposite wedges.
///
/// Returns `+inf` when the candidate is not finite or no bin is comparable
/// between any wedge pair.
pub fn asymmetry_metric(candidate: Center, ctx: &MetricContext<'_>) -> f64 {
    let metric = if candidate.is_finite() {
        let sym = symmetric_mask(ctx.mask, (candidate.y, candidate.x));
        let profiles = wedge_profiles(ctx.frame, &sym, &ctx.offsets, candidate, ctx.config);
        compare_opposite_wedges(&profiles)
    } else {
        f64::INFINITY
    };

    if ctx.verbose {
        debug!(cx = candidate.x, cy = candidate.y, metric, "Asymmetry metric");
    } else {
        trace!(cx = candidate.x, cy = candidate.y, metric, "Asymmetry metric");
    }
    metric
}

/// Compare wedge `i` with wedge `i + n/2` over bins finite in both.
pub fn compare_opposite_wedges(profiles: &WedgeProfiles) -> f64 {
    let half = profiles.n_wedges() / 2;
    let mut total = 0.0f64;
    let mut count = 0usize;

    for i in 0..half {
        let p1 = &profiles.profiles[i];
        let p2 = &profiles.profiles[i + half];
        for (a, b) in p1.iter().zip(p2) {
            if a.is_finite() && b.is_finite() {
                let d = a - b;
                total += d * d;
                count += 1;
            }
        }
    }

    if count > 0 {
        total / count as f64
    } else {
        f64::INFINITY
    }
}
