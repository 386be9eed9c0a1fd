use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::center::RefineStatus;
use crate::frame::Center;

/// Run stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStage {
    Opening,
    LoadingMask,
    Centering,
    Writing,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Opening => write!(f, "Opening dataset"),
            Self::LoadingMask => write!(f, "Loading mask"),
            Self::Centering => write!(f, "Finding centers"),
            Self::Writing => write!(f, "Writing table"),
        }
    }
}

/// Thread-safe progress reporting for a run.
///
/// All methods have default no-op implementations. `advance` receives a
/// monotonically increasing count of completed frames.
pub trait ProgressReporter: Send + Sync {
    fn begin_stage(&self, _stage: RunStage, _total_items: Option<usize>) {}

    fn advance(&self, _items_done: usize) {}

    fn finish_stage(&self) {}
}

pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}

/// Cooperative cancellation flag shared between a caller and a run.
///
/// Work items that already started run to completion; items not yet
/// started are dropped.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameStatus {
    /// Optimizer converged inside the region of interest.
    Refined,
    /// Initial guess was already symmetric enough.
    Skipped,
    /// Optimizer budget ran out; best point kept.
    IterationLimit,
    /// Optimizer budget ran out and unconverged results are rejected.
    Unconverged,
    /// Initial guess or refined center outside the region of interest.
    OutOfBounds,
    /// Non-finite center, or no comparable bins at the final center.
    NumericFailure,
    /// The frame's computation failed and the fault policy kept going.
    Fault,
    /// Frame excluded by the sampling policy (dense tables only).
    NotSampled,
}

impl FrameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Refined => "refined",
            Self::Skipped => "skipped",
            Self::IterationLimit => "iteration_limit",
            Self::Unconverged => "unconverged",
            Self::OutOfBounds => "out_of_bounds",
            Self::NumericFailure => "numeric_failure",
            Self::Fault => "fault",
            Self::NotSampled => "not_sampled",
        }
    }

    /// Whether records with this status carry a finite center.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Refined | Self::Skipped | Self::IterationLimit)
    }
}

impl From<RefineStatus> for FrameStatus {
    fn from(status: RefineStatus) -> Self {
        match status {
            RefineStatus::Skipped => Self::Skipped,
            RefineStatus::Converged => Self::Refined,
            RefineStatus::IterationLimit => Self::IterationLimit,
        }
    }
}

impl fmt::Display for FrameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FrameStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "refined" => Self::Refined,
            "skipped" => Self::Skipped,
            "iteration_limit" => Self::IterationLimit,
            "unconverged" => Self::Unconverged,
            "out_of_bounds" => Self::OutOfBounds,
            "numeric_failure" => Self::NumericFailure,
            "fault" => Self::Fault,
            "not_sampled" => Self::NotSampled,
            other => return Err(format!("unknown frame status '{other}'")),
        })
    }
}

/// One row of the result table. Never mutated after creation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResultRecord {
    pub frame_number: usize,
    pub data_index: i64,
    /// NaN when the center was not determined.
    pub center_x: f64,
    pub center_y: f64,
    pub status: FrameStatus,
}

impl ResultRecord {
    pub fn new(frame_number: usize, data_index: i64, center: Center, status: FrameStatus) -> Self {
        Self {
            frame_number,
            data_index,
            center_x: center.x,
            center_y: center.y,
            status,
        }
    }

    pub fn sentinel(frame_number: usize, data_index: i64, status: FrameStatus) -> Self {
        Self::new(frame_number, data_index, Center::sentinel(), status)
    }

    pub fn center(&self) -> Center {
        Center::new(self.center_x, self.center_y)
    }

    pub fn is_resolved(&self) -> bool {
        self.center().is_finite()
    }
}

/// Records in ascending frame order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResultTable {
    records: Vec<ResultRecord>,
}

impl ResultTable {
    /// Build a table from records in any order.
    pub fn from_records(mut records: Vec<ResultRecord>) -> Self {
        records.sort_by_key(|r| r.frame_number);
        Self { records }
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResultRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, frame_number: usize) -> Option<&ResultRecord> {
        self.records
            .binary_search_by_key(&frame_number, |r| r.frame_number)
            .ok()
            .map(|i| &self.records[i])
    }

    pub fn frame_numbers(&self) -> Vec<usize> {
        self.records.iter().map(|r| r.frame_number).collect()
    }

    pub fn data_indices(&self) -> Vec<i64> {
        self.records.iter().map(|r| r.data_index).collect()
    }

    pub fn resolved_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_resolved()).count()
    }

    pub fn count_status(&self, status: FrameStatus) -> usize {
        self.records.iter().filter(|r| r.status == status).count()
    }
}

impl<'a> IntoIterator for &'a ResultTable {
    type Item = &'a ResultRecord;
    type IntoIter = std::slice::Iter<'a, ResultRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
