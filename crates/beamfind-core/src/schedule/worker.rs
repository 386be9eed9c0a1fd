use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, warn};

use crate::center::{initial_center, refine_center, RefineOutcome, RefineStatus};
use crate::error::{CenterError, Result};
use crate::frame::{Center, Frame, ValidityMask};
use crate::io::dataset::{DatasetOpener, FrameSource};

use super::config::{FaultPolicy, RunConfig};
use super::types::{CancelToken, FrameStatus, ResultRecord};

/// Everything known about one processed frame.
#[derive(Clone, Debug)]
pub struct FrameReport {
    pub record: ResultRecord,
    pub initial: Center,
    /// `None` when the initial guess was rejected before refinement.
    pub refine: Option<RefineOutcome>,
}

/// Run the full per-frame pipeline and validate the result.
///
/// The frame must match the mask shape.
pub fn center_frame(frame: &Frame, mask: &ValidityMask, config: &RunConfig) -> FrameReport {
    let Frame {
        ref data,
        frame_number,
        data_index,
    } = *frame;
    let roi = &config.roi;
    let initial = initial_center(data, mask);

    if config.scheduler.prefilter_initial_guess && !roi.contains(&initial) {
        debug!(frame = frame_number, initial = %initial, "Initial guess outside region of interest");
        return FrameReport {
            record: ResultRecord::sentinel(frame_number, data_index, FrameStatus::OutOfBounds),
            initial,
            refine: None,
        };
    }

    let outcome = refine_center(
        data,
        mask,
        initial,
        &config.profile,
        &config.refine,
        config.verbose,
    );

    let status = if !outcome.center.is_finite() || !outcome.metric.is_finite() {
        FrameStatus::NumericFailure
    } else if outcome.status == RefineStatus::IterationLimit && config.scheduler.reject_unconverged {
        FrameStatus::Unconverged
    } else if !roi.contains(&outcome.center) {
        FrameStatus::OutOfBounds
    } else {
        FrameStatus::from(outcome.status)
    };

    let record = if status.is_resolved() {
        ResultRecord::new(frame_number, data_index, outcome.center, status)
    } else {
        ResultRecord::sentinel(frame_number, data_index, status)
    };

    debug!(
        frame = frame_number,
        data_index,
        center = %outcome.center,
        metric = outcome.metric,
        status = %status,
        "Frame processed"
    );

    FrameReport {
        record,
        initial,
        refine: Some(outcome),
    }
}

/// Read-only inputs shared by every frame of a run.
pub(super) struct FrameJob<'a> {
    pub mask: &'a ValidityMask,
    pub config: &'a RunConfig,
    /// Data index of every frame in the dataset, by frame number.
    pub data_indices: &'a [i64],
}

impl FrameJob<'_> {
    fn process<H: FrameSource>(&self, handle: &H, frame_number: usize) -> Result<ResultRecord> {
        let data = handle.read_frame(frame_number)?;
        let (rows, cols) = data.dim();
        self.mask.check_shape(rows, cols)?;
        let frame = Frame::new(data, frame_number, self.data_index(frame_number));
        Ok(center_frame(&frame, self.mask, self.config).record)
    }

    fn data_index(&self, frame_number: usize) -> i64 {
        self.data_indices
            .get(frame_number)
            .copied()
            .unwrap_or(frame_number as i64)
    }
}

enum ItemOutcome {
    Done(Vec<ResultRecord>),
    Failed(CenterError),
    NotStarted,
}

/// Fixed-size pool with one dataset handle per worker thread.
///
/// Handles are opened once, when the pool is built, and indexed by the
/// Rayon worker index.
pub(super) struct WorkerPool<H> {
    pool: ThreadPool,
    handles: Vec<H>,
}

impl<H: FrameSource + Send + Sync> WorkerPool<H> {
    pub fn new<O: DatasetOpener<Handle = H>>(opener: &O, workers: usize) -> Result<Self> {
        let workers = workers.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("beamfind-worker-{i}"))
            .build()
            .map_err(|e| CenterError::Pool(e.to_string()))?;
        let handles = (0..workers)
            .map(|_| opener.open())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { pool, handles })
    }

    pub fn workers(&self) -> usize {
        self.handles.len()
    }

    fn handle(&self) -> &H {
        let idx = rayon::current_thread_index().unwrap_or(0);
        &self.handles[idx.min(self.handles.len() - 1)]
    }

    /// Process every work item. Blocks until all started items finish.
    pub fn run(
        &self,
        items: &[Vec<usize>],
        job: &FrameJob<'_>,
        fault_policy: FaultPolicy,
        cancel: &CancelToken,
        on_frame_done: &(dyn Fn(usize) + Sync),
    ) -> Result<Vec<ResultRecord>> {
        let completed = Mutex::new(0usize);
        let aborted = AtomicBool::new(false);

        let outcomes: Vec<ItemOutcome> = self.pool.install(|| {
            items
                .par_iter()
                .map(|item| {
                    if cancel.is_cancelled() || aborted.load(Ordering::SeqCst) {
                        return ItemOutcome::NotStarted;
                    }
                    let handle = self.handle();
                    let mut records = Vec::with_capacity(item.len());
                    for &frame_number in item {
                        match guarded(frame_number, || job.process(handle, frame_number)) {
                            Ok(record) => records.push(record),
                            Err(e) => match fault_policy {
                                FaultPolicy::Abort => {
                                    aborted.store(true, Ordering::SeqCst);
                                    return ItemOutcome::Failed(e);
                                }
                                FaultPolicy::Sentinel => {
                                    warn!(frame = frame_number, error = %e, "Frame failed; recording sentinel");
                                    records.push(ResultRecord::sentinel(
                                        frame_number,
                                        job.data_index(frame_number),
                                        FrameStatus::Fault,
                                    ));
                                }
                            },
                        }
                        // Callbacks see strictly increasing counts.
                        let mut done = completed.lock().unwrap_or_else(PoisonError::into_inner);
                        *done += 1;
                        on_frame_done(*done);
                    }
                    ItemOutcome::Done(records)
                })
                .collect()
        });

        let mut records = Vec::new();
        let mut skipped = false;
        for outcome in outcomes {
            match outcome {
                ItemOutcome::Done(r) => records.extend(r),
                ItemOutcome::Failed(e) => return Err(e),
                ItemOutcome::NotStarted => skipped = true,
            }
        }
        if skipped {
            let completed = completed
                .into_inner()
                .unwrap_or_else(PoisonError::into_inner);
            return Err(CenterError::Cancelled { completed });
        }
        Ok(records)
    }
}

/// Run `f`, turning a panic into a frame error.
fn guarded<T>(frame_number: usize, f: impl FnOnce() -> Result<T>) -> Result<T> {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(CenterError::WorkerPanic {
            frame_number,
            message,
        })
    })
}
