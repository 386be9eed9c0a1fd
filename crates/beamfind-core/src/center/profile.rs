use std::f64::consts::{PI, TAU};

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_N_RAD_BINS, DEFAULT_N_WEDGES};
use crate::frame::Center;

/// Angular/radial resolution of the wedge profiles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Number of angular wedges over `[-pi, pi)`. Must be even.
    #[serde(default = "default_n_wedges")]
    pub n_wedges: usize,
    /// Number of radial bins over `[r_min, r_max)`.
    #[serde(default = "default_n_rad_bins")]
    pub n_rad_bins: usize,
    #[serde(default)]
    pub r_min: f64,
    /// Outer radius. Half the shorter frame side when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r_max: Option<f64>,
}

fn default_n_wedges() -> usize {
    DEFAULT_N_WEDGES
}
fn default_n_rad_bins() -> usize {
    DEFAULT_N_RAD_BINS
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            n_wedges: DEFAULT_N_WEDGES,
            n_rad_bins: DEFAULT_N_RAD_BINS,
            r_min: 0.0,
            r_max: None,
        }
    }
}

impl ProfileConfig {
    pub fn resolve_r_max(&self, rows: usize, cols: usize) -> f64 {
        self.r_max.unwrap_or(rows.min(cols) as f64 / 2.0)
    }
}

/// Per-pixel offsets from a base center, computed once per frame.
///
/// Every candidate center is handled as a shift of these offsets, so the
/// per-evaluation cost does not depend on how the base grid was built.
#[derive(Clone, Debug)]
pub struct BaseOffsets {
    base: Center,
    /// `col - base.x` for every column
    dx: Vec<f64>,
    /// `row - base.y` for every row
    dy: Vec<f64>,
}

impl BaseOffsets {
    pub fn new(base: Center, rows: usize, cols: usize) -> Self {
        Self {
            base,
            dx: (0..cols).map(|c| c as f64 - base.x).collect(),
            dy: (0..rows).map(|r| r as f64 - base.y).collect(),
        }
    }

    pub fn base(&self) -> Center {
        self.base
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.dy.len(), self.dx.len())
    }
}

/// Median radial profiles of each wedge.
#[derive(Clone, Debug)]
pub struct WedgeProfiles {
    /// `n_wedges` profiles of `n_rad_bins` medians; NaN marks an unusable cell.
    pub profiles: Vec<Vec<f64>>,
    /// Bin-center radii, shared by all wedges.
    pub radii: Vec<f64>,
}

impl WedgeProfiles {
    pub fn n_wedges(&self) -> usize {
        self.profiles.len()
    }

    pub fn n_bins(&self) -> usize {
        self.radii.len()
    }
}

/// Compute wedge radial profiles around `center`.
///
/// Pixels outside `sym_mask` are ignored. Each (wedge, bin) cell reduces to
/// the median of its members; an empty cell, or one holding any NaN pixel,
/// becomes NaN so that it is never compared.
///
/// `config.n_wedges` must be even and at least 2: the asymmetry metric pairs
/// wedge `i` with wedge `i + n_wedges / 2`, so an odd count leaves one wedge
/// unpaired. `config.n_rad_bins` must be at least 1. [`RunConfig::validate`]
/// enforces both.
///
/// [`RunConfig::validate`]: crate::schedule::config::RunConfig::validate
pub fn wedge_profiles(
    frame: &Array2<f32>,
    sym_mask: &Array2<bool>,
    offsets: &BaseOffsets,
    center: Center,
    config: &ProfileConfig,
) -> WedgeProfiles {
    let (rows, cols) = frame.dim();
    let n_wedges = config.n_wedges;
    let n_bins = config.n_rad_bins;
    debug_assert!(
        n_wedges >= 2 && n_wedges % 2 == 0,
        "n_wedges must be even and at least 2, got {n_wedges}"
    );
    debug_assert!(n_bins >= 1, "n_rad_bins must be at least 1");
    let r_min = config.r_min;
    let r_max = config.resolve_r_max(rows, cols);

    let wedge_step = TAU / n_wedges as f64;
    let bin_width = (r_max - r_min) / n_bins as f64;

    let shift_x = center.x - offsets.base.x;
    let shift_y = center.y - offsets.base.y;

    let mut cells: Vec<Vec<f32>> = vec![Vec::new(); n_wedges * n_bins];

    if bin_width > 0.0 {
        for row in 0..rows {
            let dy = offsets.dy[row] - shift_y;
            for col in 0..cols {
                if !sym_mask[[row, col]] {
                    continue;
                }
                let dx = offsets.dx[col] - shift_x;
                let r = dx.hypot(dy);
                if r < r_min || r >= r_max {
                    continue;
                }
                let wedge = ((dy.atan2(dx) + PI) / wedge_step).floor() as usize;
                let bin = ((r - r_min) / bin_width).floor() as usize;
                if wedge >= n_wedges || bin >= n_bins {
                    continue;
                }
                cells[wedge * n_bins + bin].push(frame[[row, col]]);
            }
        }
    }

    let profiles = (0..n_wedges)
        .map(|w| {
            cells[w * n_bins..(w + 1) * n_bins]
                .iter_mut()
                .map(|cell| cell_median(cell))
                .collect()
        })
        .collect();

    let radii = (0..n_bins)
        .map(|b| r_min + (b as f64 + 0.5) * bin_width)
        .collect();

    WedgeProfiles { profiles, radii }
}

fn cell_median(values: &mut [f32]) -> f64 {
    if values.is_empty() || values.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    compute_median(values)
}

/// O(n) median via `select_nth_unstable`; even counts average the middle pair.
fn compute_median(values: &mut [f32]) -> f64 {
    let n = values.len();
    if n == 1 {
        values[0] as f64
    } else if n % 2 == 1 {
        let mid = n / 2;
        *values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b)).1 as f64
    } else {
        let mid = n / 2;
        values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
        values[..mid].select_nth_unstable_by(mid - 1, |a, b| a.total_cmp(b));
        0.5 * (values[mid - 1] as f64 + values[mid] as f64)
    }
}
