/// Minimum pixel count (rows*cols) to use row-level Rayon parallelism
/// in the initial centroid estimate.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Default sampling stride for the frame scheduler.
pub const DEFAULT_FRAME_INTERVAL: usize = 10;

/// Default number of angular wedges. Must be even so wedges pair up.
pub const DEFAULT_N_WEDGES: usize = 4;

/// Default number of radial bins per wedge.
pub const DEFAULT_N_RAD_BINS: usize = 100;

/// Default simplex size tolerance, in pixels.
pub const DEFAULT_XATOL: f64 = 0.01;

/// Default metric-change tolerance.
pub const DEFAULT_FATOL: f64 = 10.0;

/// Metric value at the initial guess below which refinement is skipped.
pub const DEFAULT_SKIP_TOLERANCE: f64 = 3.0;

/// Default Nelder-Mead iteration budget.
pub const DEFAULT_MAX_ITERATIONS: usize = 300;

/// Default Nelder-Mead metric evaluation budget (200 per dimension).
pub const DEFAULT_MAX_EVALUATIONS: usize = 400;

/// Default number of sampled frames per dispatched work item.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Default region-of-interest upper bound, matching a 2048x2048 detector.
pub const DEFAULT_ROI_MAX: f64 = 2048.0;

/// Relative perturbation used to build the initial simplex.
pub const SIMPLEX_NONZERO_DELTA: f64 = 0.05;

/// Absolute perturbation for zero coordinates in the initial simplex.
pub const SIMPLEX_ZERO_DELTA: f64 = 0.000_25;
