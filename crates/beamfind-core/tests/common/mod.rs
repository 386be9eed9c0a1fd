use std::path::Path;

use ndarray::Array2;
use tempfile::NamedTempFile;

use beamfind_core::frame::PixelFormat;
use beamfind_core::io::stack::StackHeader;
use beamfind_core::io::stack_writer::StackWriter;

/// Symmetric Gaussian blob centered at `(cx, cy)` (x = column, y = row).
pub fn gaussian_frame(
    rows: usize,
    cols: usize,
    cx: f64,
    cy: f64,
    sigma: f64,
    amplitude: f64,
) -> Array2<f32> {
    let two_s2 = 2.0 * sigma * sigma;
    Array2::from_shape_fn((rows, cols), |(r, c)| {
        let dx = c as f64 - cx;
        let dy = r as f64 - cy;
        (amplitude * (-(dx * dx + dy * dy) / two_s2).exp()) as f32
    })
}

/// Diffraction-like frame: a bright ring plus a faint central spot.
pub fn ring_frame(rows: usize, cols: usize, cx: f64, cy: f64, radius: f64) -> Array2<f32> {
    Array2::from_shape_fn((rows, cols), |(r, c)| {
        let d = (c as f64 - cx).hypot(r as f64 - cy);
        let ring = 800.0 * (-(d - radius).powi(2) / 8.0).exp();
        let spot = 200.0 * (-(d * d) / 18.0).exp();
        (ring + spot + 10.0) as f32
    })
}

/// Write `frames` to `path` as a frame stack, with an index trailer when
/// `indices` is given.
pub fn write_stack(path: &Path, frames: &[Array2<f32>], indices: Option<&[i64]>, format: PixelFormat) {
    let (rows, cols) = frames[0].dim();
    let mut header = StackHeader::new(cols as u32, rows as u32, format, frames.len() as u64);
    if indices.is_some() {
        header = header.with_index();
    }
    let mut writer = StackWriter::create(path, &header).expect("create stack");
    for frame in frames {
        writer.write_frame(frame).expect("write frame");
    }
    if let Some(indices) = indices {
        writer.write_index(indices).expect("write index");
    }
    writer.finalize().expect("finalize stack");
}

/// Write a temporary frame stack that lives as long as the returned handle.
pub fn temp_stack(frames: &[Array2<f32>], indices: Option<&[i64]>) -> NamedTempFile {
    let file = NamedTempFile::new().expect("create temp file");
    write_stack(file.path(), frames, indices, PixelFormat::F32);
    file
}

/// `n` Gaussian frames whose center drifts by 0.1 px per frame.
pub fn drifting_frames(n: usize, rows: usize, cols: usize) -> Vec<Array2<f32>> {
    (0..n)
        .map(|i| {
            let shift = 0.1 * i as f64;
            gaussian_frame(rows, cols, cols as f64 / 2.0 + shift, rows as f64 / 2.0 - shift, 5.0, 1000.0)
        })
        .collect()
}
