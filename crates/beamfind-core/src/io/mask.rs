use std::path::{Path, PathBuf};

use image::{GrayImage, ImageFormat, Luma};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::frame::ValidityMask;

/// Where the validity mask comes from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum MaskSource {
    /// Every pixel is valid; shaped from a sample frame of the dataset.
    #[default]
    AllValid,
    /// Grayscale image, nonzero pixel = valid.
    File(PathBuf),
}

impl std::fmt::Display for MaskSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AllValid => write!(f, "All valid"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Load a mask image (PNG, TIFF, ...). Any nonzero luminance marks a valid pixel.
pub fn load_mask(path: &Path) -> Result<ValidityMask> {
    let img = image::open(path)?.into_luma16();
    let (w, h) = img.dimensions();
    let data = Array2::from_shape_fn((h as usize, w as usize), |(row, col)| {
        img.get_pixel(col as u32, row as u32).0[0] != 0
    });
    Ok(ValidityMask::new(data))
}

/// Save a mask as an 8-bit PNG (255 = valid, 0 = invalid).
pub fn save_mask(mask: &ValidityMask, path: &Path) -> Result<()> {
    let (h, w) = mask.shape();
    let mut img = GrayImage::new(w as u32, h as u32);
    for ((row, col), &valid) in mask.data().indexed_iter() {
        img.put_pixel(col as u32, row as u32, Luma([if valid { 255 } else { 0 }]));
    }
    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Materialize the mask for a dataset whose frames are `rows x cols`.
///
/// A mask file whose shape differs from the frames is an error.
pub fn resolve_mask(source: &MaskSource, rows: usize, cols: usize) -> Result<ValidityMask> {
    let mask = match source {
        MaskSource::AllValid => ValidityMask::all_valid(rows, cols),
        MaskSource::File(path) => load_mask(path)?,
    };
    mask.check_shape(rows, cols)?;
    Ok(mask)
}
