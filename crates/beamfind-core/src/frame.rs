use std::fmt;
use std::path::PathBuf;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{CenterError, Result};

/// A single detector frame.
/// Pixel values are raw detector counts stored as f32.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Pixel data, row-major, shape = (rows, cols)
    pub data: Array2<f32>,
    /// 0-based position of the frame inside the dataset
    pub frame_number: usize,
    /// Externally assigned identity carried alongside the frame
    pub data_index: i64,
}

impl Frame {
    pub fn new(data: Array2<f32>, frame_number: usize, data_index: i64) -> Self {
        Self {
            data,
            frame_number,
            data_index,
        }
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }
}

/// Pixels usable for center estimation. Shared read-only across all frames.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidityMask {
    data: Array2<bool>,
}

impl ValidityMask {
    pub fn new(data: Array2<bool>) -> Self {
        Self { data }
    }

    /// Mask with every pixel valid, used when no mask file is supplied.
    pub fn all_valid(rows: usize, cols: usize) -> Self {
        Self {
            data: Array2::from_elem((rows, cols), true),
        }
    }

    pub fn data(&self) -> &Array2<bool> {
        &self.data
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    /// Fail unless the mask shape equals the given frame shape.
    pub fn check_shape(&self, rows: usize, cols: usize) -> Result<()> {
        let (mask_rows, mask_cols) = self.shape();
        if mask_rows != rows || mask_cols != cols {
            return Err(CenterError::MaskShapeMismatch {
                mask_rows,
                mask_cols,
                frame_rows: rows,
                frame_cols: cols,
            });
        }
        Ok(())
    }
}

/// Candidate or refined center in pixel coordinates (x = column, y = row).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Center {
    pub x: f64,
    pub y: f64,
}

impl Center {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// "Center not determined" marker.
    pub fn sentinel() -> Self {
        Self {
            x: f64::NAN,
            y: f64::NAN,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn distance_to(&self, other: &Center) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl fmt::Display for Center {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

/// On-disk sample type of a frame stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    U8,
    U16,
    U32,
    F32,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 | Self::F32 => 4,
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            Self::U8 => 0,
            Self::U16 => 1,
            Self::U32 => 2,
            Self::F32 => 3,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::U8),
            1 => Some(Self::U16),
            2 => Some(Self::U32),
            3 => Some(Self::F32),
            _ => None,
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::U8 => write!(f, "u8"),
            Self::U16 => write!(f, "u16"),
            Self::U32 => write!(f, "u32"),
            Self::F32 => write!(f, "f32"),
        }
    }
}

/// Metadata about a frame stack.
#[derive(Clone, Debug)]
pub struct StackInfo {
    pub filename: PathBuf,
    pub total_frames: usize,
    pub width: u32,
    pub height: u32,
    pub pixel_format: PixelFormat,
    pub has_index: bool,
}
