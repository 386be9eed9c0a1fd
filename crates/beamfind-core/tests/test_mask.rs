use ndarray::Array2;
use tempfile::TempDir;

use beamfind_core::error::CenterError;
use beamfind_core::frame::ValidityMask;
use beamfind_core::io::mask::{load_mask, resolve_mask, save_mask, MaskSource};

fn beamstop_mask(rows: usize, cols: usize) -> ValidityMask {
    ValidityMask::new(Array2::from_shape_fn((rows, cols), |(r, c)| {
        !(r < rows / 2 && (c as isize - cols as isize / 2).abs() < 3)
    }))
}

#[test]
fn test_mask_png_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mask.png");
    let mask = beamstop_mask(24, 32);
    save_mask(&mask, &path).unwrap();
    let back = load_mask(&path).unwrap();
    assert_eq!(back, mask);
    assert_eq!(back.valid_count(), mask.valid_count());
}

#[test]
fn test_resolve_all_valid_uses_frame_shape() {
    let mask = resolve_mask(&MaskSource::AllValid, 12, 18).unwrap();
    assert_eq!(mask.shape(), (12, 18));
    assert_eq!(mask.valid_count(), 12 * 18);
}

#[test]
fn test_resolve_file_with_wrong_shape_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mask.png");
    save_mask(&beamstop_mask(24, 32), &path).unwrap();
    assert!(matches!(
        resolve_mask(&MaskSource::File(path), 32, 24),
        Err(CenterError::MaskShapeMismatch {
            mask_rows: 24,
            mask_cols: 32,
            frame_rows: 32,
            frame_cols: 24,
        })
    ));
}

#[test]
fn test_missing_mask_file_fails() {
    let dir = TempDir::new().unwrap();
    let source = MaskSource::File(dir.path().join("absent.png"));
    assert!(resolve_mask(&source, 4, 4).is_err());
}

#[test]
fn test_mask_source_display() {
    assert_eq!(format!("{}", MaskSource::AllValid), "All valid");
    assert_eq!(format!("{}", MaskSource::File("a/b.png".into())), "a/b.png");
}
