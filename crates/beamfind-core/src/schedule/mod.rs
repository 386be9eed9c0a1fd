pub mod config;
mod orchestrator;
pub mod sampling;
mod types;
mod worker;

pub use orchestrator::{resolve_data_indices, run_centering, run_centering_reported, schedule_centers};
pub use types::{
    CancelToken, FrameStatus, NoOpReporter, ProgressReporter, ResultRecord, ResultTable, RunStage,
};
pub use worker::{center_frame, FrameReport};
