#[allow(dead_code)]
mod common;

use beamfind_core::center::{
    find_center, initial_center, refine_center, ProfileConfig, RefineConfig, RefineStatus,
};
use beamfind_core::frame::{Center, ValidityMask};

fn profile_20_bins() -> ProfileConfig {
    ProfileConfig {
        n_wedges: 4,
        n_rad_bins: 20,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Accuracy
// ---------------------------------------------------------------------------

#[test]
fn test_gaussian_blob_refines_to_true_center() {
    let frame = common::gaussian_frame(100, 100, 52.3, 47.8, 8.0, 1000.0);
    let mask = ValidityMask::all_valid(100, 100);
    let outcome = find_center(&frame, &mask, &profile_20_bins(), &RefineConfig::default(), false);

    let err = outcome.center.distance_to(&Center::new(52.3, 47.8));
    assert!(err < 0.1, "refined center {} is {err:.3} px off", outcome.center);
    assert!(outcome.metric.is_finite());
}

#[test]
fn test_forced_refinement_from_offset_guess() {
    let frame = common::gaussian_frame(100, 100, 52.3, 47.8, 8.0, 1000.0);
    let mask = ValidityMask::all_valid(100, 100);
    let config = RefineConfig {
        skip_tolerance: 0.0,
        ..Default::default()
    };
    let start = Center::new(55.0, 45.0);
    let outcome = refine_center(&frame, &mask, start, &profile_20_bins(), &config, false);

    assert_ne!(outcome.status, RefineStatus::Skipped);
    assert!(outcome.metric < outcome.initial_metric);
    let err = outcome.center.distance_to(&Center::new(52.3, 47.8));
    assert!(err < 0.15, "refined center {} is {err:.3} px off", outcome.center);
}

#[test]
fn test_ring_pattern_refines_toward_ring_center() {
    let frame = common::ring_frame(120, 120, 61.4, 57.9, 30.0);
    let mask = ValidityMask::all_valid(120, 120);
    let config = RefineConfig {
        skip_tolerance: 0.0,
        ..Default::default()
    };
    let profile = ProfileConfig {
        n_wedges: 4,
        n_rad_bins: 40,
        ..Default::default()
    };
    let start = Center::new(63.0, 56.0);
    let outcome = refine_center(&frame, &mask, start, &profile, &config, false);
    let before = start.distance_to(&Center::new(61.4, 57.9));
    let after = outcome.center.distance_to(&Center::new(61.4, 57.9));
    assert!(after < before, "moved from {before:.3} to {after:.3} px");
}

// ---------------------------------------------------------------------------
// Terminal states
// ---------------------------------------------------------------------------

#[test]
fn test_symmetric_frame_is_skipped() {
    let frame = common::gaussian_frame(100, 100, 49.5, 49.5, 8.0, 1000.0);
    let mask = ValidityMask::all_valid(100, 100);
    let initial = initial_center(&frame, &mask);
    let outcome = refine_center(&frame, &mask, initial, &profile_20_bins(), &RefineConfig::default(), false);

    assert_eq!(outcome.status, RefineStatus::Skipped);
    assert_eq!(outcome.center, initial);
    assert_eq!(outcome.iterations, 0);
    assert_eq!(outcome.evaluations, 1);
    assert!(outcome.initial_metric < 1e-6);
}

#[test]
fn test_iteration_budget_reports_iteration_limit() {
    let frame = common::gaussian_frame(100, 100, 52.3, 47.8, 8.0, 1000.0);
    let mask = ValidityMask::all_valid(100, 100);
    let config = RefineConfig {
        skip_tolerance: 0.0,
        max_iterations: 2,
        ..Default::default()
    };
    let outcome = refine_center(&frame, &mask, Center::new(55.0, 45.0), &profile_20_bins(), &config, false);
    assert_eq!(outcome.status, RefineStatus::IterationLimit);
    assert!(outcome.center.is_finite());
    assert!(outcome.metric <= outcome.initial_metric);
}

#[test]
fn test_evaluation_budget_reports_iteration_limit() {
    let frame = common::gaussian_frame(100, 100, 52.3, 47.8, 8.0, 1000.0);
    let mask = ValidityMask::all_valid(100, 100);
    let config = RefineConfig {
        skip_tolerance: 0.0,
        max_evaluations: 3,
        ..Default::default()
    };
    let outcome = refine_center(&frame, &mask, Center::new(55.0, 45.0), &profile_20_bins(), &config, false);
    assert_eq!(outcome.status, RefineStatus::IterationLimit);
    // initial metric plus the three simplex vertices
    assert_eq!(outcome.evaluations, 4);
}

#[test]
fn test_find_center_starts_from_centroid() {
    let frame = common::gaussian_frame(64, 64, 30.2, 33.7, 6.0, 800.0);
    let mask = ValidityMask::all_valid(64, 64);
    let outcome = find_center(&frame, &mask, &profile_20_bins(), &RefineConfig::default(), true);
    assert_eq!(outcome.initial, initial_center(&frame, &mask));
}

#[test]
fn test_refine_status_display() {
    assert_eq!(format!("{}", RefineStatus::Skipped), "Skipped");
    assert_eq!(format!("{}", RefineStatus::Converged), "Converged");
    assert_eq!(format!("{}", RefineStatus::IterationLimit), "Iteration limit");
}
