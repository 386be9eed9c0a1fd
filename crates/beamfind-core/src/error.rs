use thiserror::Error;

#[derive(Error, Debug)]
pub enum CenterError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid frame stack: {0}")]
    InvalidStack(String),

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Frame index {index} out of range (total: {total})")]
    FrameIndexOutOfRange { index: usize, total: usize },

    #[error("Mask shape {mask_rows}x{mask_cols} does not match frame shape {frame_rows}x{frame_cols}")]
    MaskShapeMismatch {
        mask_rows: usize,
        mask_cols: usize,
        frame_rows: usize,
        frame_cols: usize,
    },

    #[error("Dataset has no data index array and the index policy is strict")]
    MissingDataIndex,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid result table at line {line}: {reason}")]
    InvalidTable { line: usize, reason: String },

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Empty frame sequence")]
    EmptySequence,

    #[error("Worker panicked while processing frame {frame_number}: {message}")]
    WorkerPanic { frame_number: usize, message: String },

    #[error("Worker pool error: {0}")]
    Pool(String),

    #[error("Run cancelled after {completed} frames")]
    Cancelled { completed: usize },
}

pub type Result<T> = std::result::Result<T, CenterError>;
