//! Initial center estimate.
//!
//! Intensity-weighted center of mass over valid pixels only. Cheap (O(n)),
//! naturally sub-pixel, and close enough to seed the symmetry refinement.

use ndarray::Array2;
use rayon::prelude::*;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::frame::{Center, ValidityMask};

/// Compute the masked intensity-weighted centroid of a frame.
///
/// Falls back to the geometric center `(cols/2, rows/2)` when the valid
/// pixels carry no (or non-finite) total intensity. `mask` must have the
/// frame's shape.
pub fn initial_center(data: &Array2<f32>, mask: &ValidityMask) -> Center {
    let (h, w) = data.dim();
    let valid = mask.data();

    let (sum_r, sum_c, sum_w) = if h * w >= PARALLEL_PIXEL_THRESHOLD {
        masked_sums_parallel(data, valid, h, w)
    } else {
        masked_sums_sequential(data, valid, h, w)
    };

    let geometric = Center::new(w as f64 / 2.0, h as f64 / 2.0);
    if sum_w == 0.0 || !sum_w.is_finite() {
        return geometric;
    }

    let center = Center::new(sum_c / sum_w, sum_r / sum_w);
    if center.is_finite() {
        center
    } else {
        geometric
    }
}

/// Row-parallel weighted sums using Rayon.
fn masked_sums_parallel(
    data: &Array2<f32>,
    valid: &Array2<bool>,
    h: usize,
    w: usize,
) -> (f64, f64, f64) {
    (0..h)
        .into_par_iter()
        .map(|row| row_sums(data, valid, row, w))
        .reduce(
            || (0.0, 0.0, 0.0),
            |(ar, ac, aw), (r, c, w)| (ar + r, ac + c, aw + w),
        )
}

fn masked_sums_sequential(
    data: &Array2<f32>,
    valid: &Array2<bool>,
    h: usize,
    w: usize,
) -> (f64, f64, f64) {
    (0..h)
        .map(|row| row_sums(data, valid, row, w))
        .fold((0.0, 0.0, 0.0), |(ar, ac, aw), (r, c, w)| {
            (ar + r, ac + c, aw + w)
        })
}

fn row_sums(data: &Array2<f32>, valid: &Array2<bool>, row: usize, w: usize) -> (f64, f64, f64) {
    let mut sum_r = 0.0f64;
    let mut sum_c = 0.0f64;
    let mut sum_w = 0.0f64;
    for col in 0..w {
        if !valid[[row, col]] {
            continue;
        }
        let weight = data[[row, col]] as f64;
        sum_r += row as f64 * weight;
        sum_c += col as f64 * weight;
        sum_w += weight;
    }
    (sum_r, sum_c, sum_w)
}
