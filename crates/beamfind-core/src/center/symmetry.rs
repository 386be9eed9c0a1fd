//! Mirror-symmetric validity mask.

use ndarray::Array2;

use crate::frame::ValidityMask;

/// Mirror of pixel `(row, col)` through `center_yx = (cy, cx)`.
///
/// The mirror is `(round(2cy) - row, round(2cx) - col)`, i.e. the nearest
/// pixel to the exact reflection. Because the rounding is applied to the
/// doubled center rather than per pixel, mirroring twice returns the
/// original pixel. `None` when the mirror falls outside `shape`.
pub fn mirror_of(
    shape: (usize, usize),
    center_yx: (f64, f64),
    row: usize,
    col: usize,
) -> Option<(usize, usize)> {
    let (sum_r, sum_c) = doubled_center(center_yx)?;
    let (rows, cols) = shape;
    let mr = sum_r.checked_sub(row as i64)?;
    let mc = sum_c.checked_sub(col as i64)?;
    if mr < 0 || mc < 0 || mr >= rows as i64 || mc >= cols as i64 {
        return None;
    }
    Some((mr as usize, mc as usize))
}

/// Build the symmetric mask for a candidate center given as `(cy, cx)`.
///
/// A pixel is kept only when it and its mirror are both in-bounds and both
/// valid in `mask`; a pixel that is its own mirror is kept iff it is valid.
/// The result is closed under mirroring.
pub fn symmetric_mask(mask: &ValidityMask, center_yx: (f64, f64)) -> Array2<bool> {
    let (rows, cols) = mask.shape();
    let valid = mask.data();
    let mut sym = Array2::from_elem((rows, cols), false);

    let Some((sum_r, sum_c)) = doubled_center(center_yx) else {
        return sym;
    };

    for row in 0..rows {
        let Some(mr) = sum_r.checked_sub(row as i64) else {
            continue;
        };
        if mr < 0 || mr >= rows as i64 {
            continue;
        }
        let mr = mr as usize;
        for col in 0..cols {
            let Some(mc) = sum_c.checked_sub(col as i64) else {
                continue;
            };
            if mc < 0 || mc >= cols as i64 {
                continue;
            }
            if valid[[row, col]] && valid[[mr, mc as usize]] {
                sym[[row, col]] = true;
            }
        }
    }

    sym
}

/// Doubled center rounded to the pixel grid. Coordinates beyond the `i64`
/// range saturate, so callers subtract with `checked_sub`.
fn doubled_center(center_yx: (f64, f64)) -> Option<(i64, i64)> {
    let (cy, cx) = center_yx;
    let sum_r = (2.0 * cy).round();
    let sum_c = (2.0 * cx).round();
    if !sum_r.is_finite() || !sum_c.is_finite() {
        return None;
    }
    Some((sum_r as i64, sum_c as i64))
}
