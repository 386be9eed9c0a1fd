use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::center::{ProfileConfig, RefineConfig};
use crate::consts::{DEFAULT_CHUNK_SIZE, DEFAULT_FRAME_INTERVAL, DEFAULT_ROI_MAX};
use crate::error::{CenterError, Result};
use crate::frame::Center;
use crate::io::mask::MaskSource;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    #[serde(default)]
    pub mask: MaskSource,
    /// Log every metric evaluation at debug level.
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub profile: ProfileConfig,
    #[serde(default)]
    pub refine: RefineConfig,
    #[serde(default)]
    pub roi: RegionOfInterest,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

impl RunConfig {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            mask: MaskSource::default(),
            verbose: false,
            sampling: SamplingConfig::default(),
            profile: ProfileConfig::default(),
            refine: RefineConfig::default(),
            roi: RegionOfInterest::default(),
            scheduler: SchedulerConfig::default(),
        }
    }

    /// Reject settings that would make a run meaningless. Called before any
    /// dataset access.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(CenterError::InvalidConfig(msg));

        if self.sampling.frame_interval == 0 {
            return invalid("frame_interval must be at least 1".into());
        }
        if self.profile.n_wedges < 2 || self.profile.n_wedges % 2 != 0 {
            return invalid(format!(
                "n_wedges must be even and at least 2, got {}",
                self.profile.n_wedges
            ));
        }
        if self.profile.n_rad_bins == 0 {
            return invalid("n_rad_bins must be at least 1".into());
        }
        if !self.profile.r_min.is_finite() || self.profile.r_min < 0.0 {
            return invalid(format!("r_min must be >= 0, got {}", self.profile.r_min));
        }
        if let Some(r_max) = self.profile.r_max {
            if !r_max.is_finite() || r_max <= self.profile.r_min {
                return invalid(format!(
                    "r_max ({r_max}) must be greater than r_min ({})",
                    self.profile.r_min
                ));
            }
        }
        if !(self.refine.xatol > 0.0) || !(self.refine.fatol > 0.0) {
            return invalid("xatol and fatol must be positive".into());
        }
        if self.refine.skip_tolerance.is_nan() {
            return invalid("skip_tolerance must be a number".into());
        }
        if self.refine.max_iterations == 0 || self.refine.max_evaluations == 0 {
            return invalid("optimizer budgets must be at least 1".into());
        }
        if !(self.roi.xmin < self.roi.xmax) || !(self.roi.ymin < self.roi.ymax) {
            return invalid(format!("empty region of interest: {}", self.roi));
        }
        if self.scheduler.workers == Some(0) {
            return invalid("worker count must be at least 1".into());
        }
        if self.scheduler.chunking == Chunking::FixedChunk(0) {
            return invalid("chunk size must be at least 1".into());
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Process frames whose number is a multiple of this, plus the first
    /// and last frame.
    pub frame_interval: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            frame_interval: DEFAULT_FRAME_INTERVAL,
        }
    }
}

/// Accepted centers lie in `[xmin, xmax) x [ymin, ymax)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionOfInterest {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl Default for RegionOfInterest {
    fn default() -> Self {
        Self {
            xmin: 0.0,
            xmax: DEFAULT_ROI_MAX,
            ymin: 0.0,
            ymax: DEFAULT_ROI_MAX,
        }
    }
}

impl RegionOfInterest {
    pub fn new(xmin: f64, xmax: f64, ymin: f64, ymax: f64) -> Self {
        Self {
            xmin,
            xmax,
            ymin,
            ymax,
        }
    }

    /// Finite and inside the half-open box.
    pub fn contains(&self, c: &Center) -> bool {
        c.is_finite() && self.xmin <= c.x && c.x < self.xmax && self.ymin <= c.y && c.y < self.ymax
    }
}

impl fmt::Display for RegionOfInterest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "x [{}, {}) y [{}, {})",
            self.xmin, self.xmax, self.ymin, self.ymax
        )
    }
}

/// How sampled frames are grouped into dispatched work items.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Chunking {
    /// One frame per work item.
    Unchunked,
    /// Up to `n` consecutive sampled frames per work item.
    FixedChunk(usize),
}

impl Default for Chunking {
    fn default() -> Self {
        Self::FixedChunk(DEFAULT_CHUNK_SIZE)
    }
}

impl fmt::Display for Chunking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unchunked => write!(f, "Unchunked"),
            Self::FixedChunk(n) => write!(f, "Chunks of {n}"),
        }
    }
}

/// What to do when the dataset has no data index array.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexPolicy {
    /// Missing index is a fatal error.
    #[default]
    Strict,
    /// Use `data_index = frame_number`.
    FallbackToFrameNumber,
}

impl fmt::Display for IndexPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => write!(f, "Strict"),
            Self::FallbackToFrameNumber => write!(f, "Fallback to frame number"),
        }
    }
}

/// What to do when a single frame's computation fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaultPolicy {
    /// The first failure aborts the run.
    #[default]
    Abort,
    /// The failure is logged and recorded as a sentinel row.
    Sentinel,
}

impl fmt::Display for FaultPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abort => write!(f, "Abort"),
            Self::Sentinel => write!(f, "Sentinel"),
        }
    }
}

/// Which frames appear in the result table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableLayout {
    /// Only sampled frames.
    #[default]
    SampledOnly,
    /// Every frame; unsampled ones carry sentinel centers.
    Dense,
}

impl fmt::Display for TableLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SampledOnly => write!(f, "Sampled only"),
            Self::Dense => write!(f, "Dense"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Worker threads; available parallelism when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    #[serde(default)]
    pub chunking: Chunking,
    #[serde(default)]
    pub index_policy: IndexPolicy,
    #[serde(default)]
    pub fault_policy: FaultPolicy,
    #[serde(default)]
    pub layout: TableLayout,
    /// Reject frames whose initial guess is already outside the ROI
    /// without running the optimizer.
    #[serde(default = "default_true")]
    pub prefilter_initial_guess: bool,
    /// Treat an exhausted optimizer budget as an unresolved frame.
    #[serde(default)]
    pub reject_unconverged: bool,
}

fn default_true() -> bool {
    true
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: None,
            chunking: Chunking::default(),
            index_policy: IndexPolicy::default(),
            fault_policy: FaultPolicy::default(),
            layout: TableLayout::default(),
            prefilter_initial_guess: true,
            reject_unconverged: false,
        }
    }
}

impl SchedulerConfig {
    pub fn resolved_workers(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}
