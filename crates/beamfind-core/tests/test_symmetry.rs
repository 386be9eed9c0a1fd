use ndarray::Array2;

use beamfind_core::center::{mirror_of, symmetric_mask};
use beamfind_core::frame::ValidityMask;

fn patterned_mask(rows: usize, cols: usize) -> ValidityMask {
    ValidityMask::new(Array2::from_shape_fn((rows, cols), |(r, c)| {
        (r * 31 + c * 17) % 7 != 0
    }))
}

const CENTERS: [(f64, f64); 7] = [
    (10.0, 12.0),
    (10.5, 12.5),
    (10.25, 12.75),
    (9.75, 11.49),
    (15.2, 3.8),
    (0.3, 0.2),
    (19.9, 24.6),
];

// ---------------------------------------------------------------------------
// Mirror mapping
// ---------------------------------------------------------------------------

#[test]
fn test_mirror_is_an_involution() {
    let shape = (20, 25);
    for &center in &CENTERS {
        for row in 0..shape.0 {
            for col in 0..shape.1 {
                if let Some((mr, mc)) = mirror_of(shape, center, row, col) {
                    assert_eq!(
                        mirror_of(shape, center, mr, mc),
                        Some((row, col)),
                        "center {center:?} pixel ({row}, {col})"
                    );
                }
            }
        }
    }
}

#[test]
fn test_mirror_through_integer_center() {
    assert_eq!(mirror_of((20, 20), (10.0, 10.0), 7, 12), Some((13, 8)));
    assert_eq!(mirror_of((20, 20), (10.0, 10.0), 10, 10), Some((10, 10)));
}

#[test]
fn test_mirror_out_of_bounds_is_none() {
    assert_eq!(mirror_of((20, 20), (2.0, 2.0), 10, 10), None);
    assert_eq!(mirror_of((20, 20), (f64::NAN, 2.0), 1, 1), None);
}

// ---------------------------------------------------------------------------
// Symmetric mask
// ---------------------------------------------------------------------------

#[test]
fn test_symmetric_mask_closed_under_mirroring() {
    let mask = patterned_mask(20, 25);
    for &center in &CENTERS {
        let sym = symmetric_mask(&mask, center);
        for ((row, col), &accepted) in sym.indexed_iter() {
            if !accepted {
                continue;
            }
            let (mr, mc) = mirror_of((20, 25), center, row, col)
                .unwrap_or_else(|| panic!("accepted pixel ({row}, {col}) has no mirror"));
            assert!(sym[[mr, mc]], "center {center:?}: mirror of ({row}, {col}) rejected");
        }
    }
}

#[test]
fn test_symmetric_mask_is_subset_of_validity_mask() {
    let mask = patterned_mask(20, 25);
    let sym = symmetric_mask(&mask, (10.25, 12.75));
    for ((row, col), &accepted) in sym.indexed_iter() {
        if accepted {
            assert!(mask.data()[[row, col]]);
        }
    }
}

#[test]
fn test_pixels_with_out_of_bounds_mirror_are_rejected() {
    let mask = ValidityMask::all_valid(20, 20);
    let sym = symmetric_mask(&mask, (2.0, 2.0));
    assert!(sym[[4, 4]]);
    assert!(!sym[[5, 4]]);
    assert!(!sym[[10, 10]]);
    assert_eq!(sym.iter().filter(|&&v| v).count(), 25);
}

#[test]
fn test_self_mirror_pixel_kept_iff_valid() {
    let mut data = Array2::from_elem((11, 11), true);
    let sym = symmetric_mask(&ValidityMask::new(data.clone()), (5.0, 5.0));
    assert!(sym[[5, 5]]);

    data[[5, 5]] = false;
    let sym = symmetric_mask(&ValidityMask::new(data), (5.0, 5.0));
    assert!(!sym[[5, 5]]);
    assert!(sym[[5, 6]]);
}

#[test]
fn test_invalid_pixel_removes_its_mirror() {
    let mut data = Array2::from_elem((21, 21), true);
    data[[3, 4]] = false;
    let sym = symmetric_mask(&ValidityMask::new(data), (10.0, 10.0));
    assert!(!sym[[3, 4]]);
    assert!(!sym[[17, 16]]);
}

#[test]
fn test_non_finite_center_rejects_everything() {
    let sym = symmetric_mask(&ValidityMask::all_valid(8, 8), (f64::INFINITY, 4.0));
    assert!(sym.iter().all(|&v| !v));
}

#[test]
fn test_extreme_finite_center_rejects_everything() {
    let mask = ValidityMask::all_valid(10, 10);
    for center in [(5.0, -1e300), (-1e300, 5.0), (1e300, 5.0), (f64::MIN, f64::MAX)] {
        let sym = symmetric_mask(&mask, center);
        assert!(sym.iter().all(|&v| !v), "center {center:?} kept pixels");
        assert_eq!(mirror_of((10, 10), center, 3, 3), None);
        assert_eq!(mirror_of((10, 10), center, 0, 0), None);
    }
}
