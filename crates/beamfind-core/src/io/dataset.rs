//! Read-only access to an array-of-frames dataset.
//!
//! The scheduler opens one [`FrameSource`] per worker through a
//! [`DatasetOpener`], so repeated frame loads never re-open the dataset.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ndarray::{Array2, Array3, Axis};

use crate::error::{CenterError, Result};
use crate::io::stack::StackReader;

/// A read handle into a dataset whose first axis is the frame axis.
pub trait FrameSource {
    fn frame_count(&self) -> usize;

    /// `(rows, cols)` shared by every frame.
    fn frame_shape(&self) -> (usize, usize);

    fn read_frame(&self, frame_number: usize) -> Result<Array2<f32>>;

    /// External identity of every frame, if the dataset carries one.
    fn data_indices(&self) -> Option<Vec<i64>>;
}

/// Produces independent read handles onto the same dataset.
pub trait DatasetOpener: Sync {
    type Handle: FrameSource + Send + Sync;

    fn open(&self) -> Result<Self::Handle>;
}

impl FrameSource for StackReader {
    fn frame_count(&self) -> usize {
        StackReader::frame_count(self)
    }

    fn frame_shape(&self) -> (usize, usize) {
        self.shape()
    }

    fn read_frame(&self, frame_number: usize) -> Result<Array2<f32>> {
        StackReader::read_frame(self, frame_number)
    }

    fn data_indices(&self) -> Option<Vec<i64>> {
        StackReader::data_indices(self)
    }
}

/// A frame-stack file on disk. Each `open` maps the file anew.
#[derive(Clone, Debug)]
pub struct StackFile {
    path: PathBuf,
}

impl StackFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DatasetOpener for StackFile {
    type Handle = StackReader;

    fn open(&self) -> Result<StackReader> {
        StackReader::open(&self.path)
    }
}

/// An in-memory dataset. Handles share the frame buffer.
#[derive(Clone, Debug)]
pub struct MemoryDataset {
    frames: Arc<Array3<f32>>,
    indices: Option<Arc<Vec<i64>>>,
}

impl MemoryDataset {
    /// `frames` has shape `(n_frames, rows, cols)`.
    pub fn new(frames: Array3<f32>) -> Self {
        Self {
            frames: Arc::new(frames),
            indices: None,
        }
    }

    /// Attach a data index array; must hold one entry per frame.
    pub fn with_indices(mut self, indices: Vec<i64>) -> Result<Self> {
        let n = self.frames.len_of(Axis(0));
        if indices.len() != n {
            return Err(CenterError::InvalidConfig(format!(
                "Data index has {} entries for {} frames",
                indices.len(),
                n
            )));
        }
        self.indices = Some(Arc::new(indices));
        Ok(self)
    }

    /// Stack equally-shaped frames along a new leading axis.
    pub fn from_frames(frames: &[Array2<f32>]) -> Result<Self> {
        let views: Vec<_> = frames.iter().map(|f| f.view()).collect();
        if views.is_empty() {
            return Err(CenterError::EmptySequence);
        }
        let stacked = ndarray::stack(Axis(0), &views).map_err(|e| {
            CenterError::InvalidConfig(format!("Frames differ in shape: {e}"))
        })?;
        Ok(Self::new(stacked))
    }
}

impl FrameSource for MemoryDataset {
    fn frame_count(&self) -> usize {
        self.frames.len_of(Axis(0))
    }

    fn frame_shape(&self) -> (usize, usize) {
        let (_, rows, cols) = self.frames.dim();
        (rows, cols)
    }

    fn read_frame(&self, frame_number: usize) -> Result<Array2<f32>> {
        let total = self.frame_count();
        if frame_number >= total {
            return Err(CenterError::FrameIndexOutOfRange {
                index: frame_number,
                total,
            });
        }
        Ok(self.frames.index_axis(Axis(0), frame_number).to_owned())
    }

    fn data_indices(&self) -> Option<Vec<i64>> {
        self.indices.as_ref().map(|i| i.as_ref().clone())
    }
}

impl DatasetOpener for MemoryDataset {
    type Handle = MemoryDataset;

    fn open(&self) -> Result<MemoryDataset> {
        Ok(self.clone())
    }
}
