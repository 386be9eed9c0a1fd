use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::error::{CenterError, Result};
use crate::frame::ValidityMask;
use crate::io::dataset::{DatasetOpener, FrameSource, StackFile};
use crate::io::mask::resolve_mask;
use crate::io::table::save_table;

use super::config::{IndexPolicy, RunConfig, TableLayout};
use super::sampling::{sampled_frames, work_items};
use super::types::{
    CancelToken, FrameStatus, NoOpReporter, ProgressReporter, ResultRecord, ResultTable, RunStage,
};
use super::worker::{FrameJob, WorkerPool};

/// Resolve the data index of every frame according to `policy`.
pub fn resolve_data_indices<S: FrameSource>(source: &S, policy: IndexPolicy) -> Result<Vec<i64>> {
    let total = source.frame_count();
    match (source.data_indices(), policy) {
        (Some(indices), _) => {
            if indices.len() != total {
                return Err(CenterError::InvalidStack(format!(
                    "Data index has {} entries for {} frames",
                    indices.len(),
                    total
                )));
            }
            Ok(indices)
        }
        (None, IndexPolicy::Strict) => Err(CenterError::MissingDataIndex),
        (None, IndexPolicy::FallbackToFrameNumber) => Ok((0..total as i64).collect()),
    }
}

/// Find centers for the sampled frames of any dataset.
///
/// All configuration and dataset errors surface before the first frame is
/// dispatched. Does not write anything.
pub fn schedule_centers<O: DatasetOpener>(
    opener: &O,
    mask: Arc<ValidityMask>,
    config: &RunConfig,
    reporter: &dyn ProgressReporter,
    cancel: &CancelToken,
) -> Result<ResultTable> {
    config.validate()?;

    let meta = opener.open()?;
    let total = meta.frame_count();
    if total == 0 {
        return Err(CenterError::EmptySequence);
    }
    let (rows, cols) = meta.frame_shape();
    mask.check_shape(rows, cols)?;
    let data_indices = resolve_data_indices(&meta, config.scheduler.index_policy)?;
    drop(meta);

    let sampled = sampled_frames(total, config.sampling.frame_interval)?;
    let items = work_items(&sampled, config.scheduler.chunking)?;
    let pool = WorkerPool::new(opener, config.scheduler.resolved_workers())?;

    info!(
        total_frames = total,
        sampled = sampled.len(),
        work_items = items.len(),
        workers = pool.workers(),
        chunking = %config.scheduler.chunking,
        "Dispatching frames"
    );

    let job = FrameJob {
        mask: &mask,
        config,
        data_indices: &data_indices,
    };

    let start = Instant::now();
    reporter.begin_stage(RunStage::Centering, Some(sampled.len()));
    let records = pool.run(
        &items,
        &job,
        config.scheduler.fault_policy,
        cancel,
        &|done| reporter.advance(done),
    );
    reporter.finish_stage();
    let records = records?;

    let table = assemble_table(records, &data_indices, config.scheduler.layout);
    info!(
        frames = sampled.len(),
        resolved = table.resolved_count(),
        elapsed_s = start.elapsed().as_secs_f64(),
        "Centering complete"
    );
    Ok(table)
}

/// Order records by frame number; dense tables get a sentinel row for every
/// frame outside the sample.
fn assemble_table(records: Vec<ResultRecord>, data_indices: &[i64], layout: TableLayout) -> ResultTable {
    match layout {
        TableLayout::SampledOnly => ResultTable::from_records(records),
        TableLayout::Dense => {
            let mut rows: Vec<Option<ResultRecord>> = vec![None; data_indices.len()];
            for record in records {
                let frame_number = record.frame_number;
                rows[frame_number] = Some(record);
            }
            let dense = rows
                .into_iter()
                .enumerate()
                .map(|(frame_number, row)| {
                    row.unwrap_or_else(|| {
                        ResultRecord::sentinel(
                            frame_number,
                            data_indices[frame_number],
                            FrameStatus::NotSampled,
                        )
                    })
                })
                .collect();
            ResultTable::from_records(dense)
        }
    }
}

/// Run centering on the frame stack named in `config` and write the table.
pub fn run_centering_reported(
    config: &RunConfig,
    reporter: Arc<dyn ProgressReporter>,
    cancel: &CancelToken,
) -> Result<ResultTable> {
    config.validate()?;

    reporter.begin_stage(RunStage::Opening, None);
    let opener = StackFile::new(&config.input);
    let (rows, cols) = opener.open()?.frame_shape();
    info!(input = %config.input.display(), rows, cols, "Opened frame stack");
    reporter.finish_stage();

    reporter.begin_stage(RunStage::LoadingMask, None);
    let mask = resolve_mask(&config.mask, rows, cols)?;
    info!(
        source = %config.mask,
        valid_pixels = mask.valid_count(),
        "Mask ready"
    );
    reporter.finish_stage();

    let table = schedule_centers(&opener, Arc::new(mask), config, reporter.as_ref(), cancel)?;

    reporter.begin_stage(RunStage::Writing, None);
    save_table(&table, &config.output)?;
    info!(output = %config.output.display(), rows = table.len(), "Result table saved");
    reporter.finish_stage();

    Ok(table)
}

/// Run centering without progress reporting or cancellation.
pub fn run_centering(config: &RunConfig) -> Result<ResultTable> {
    run_centering_reported(config, Arc::new(NoOpReporter), &CancelToken::new())
}
