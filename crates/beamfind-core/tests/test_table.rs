use std::io::Cursor;

use tempfile::TempDir;

use beamfind_core::error::CenterError;
use beamfind_core::frame::Center;
use beamfind_core::io::table::{load_csv, read_csv, save_table, write_csv};
use beamfind_core::schedule::{FrameStatus, ResultRecord, ResultTable};

fn sample_table() -> ResultTable {
    ResultTable::from_records(vec![
        ResultRecord::new(20, 1020, Center::new(512.25, 498.5), FrameStatus::IterationLimit),
        ResultRecord::new(0, 1000, Center::new(511.0, 499.75), FrameStatus::Refined),
        ResultRecord::sentinel(10, 1010, FrameStatus::OutOfBounds),
        ResultRecord::new(29, 1029, Center::new(510.5, 500.0), FrameStatus::Skipped),
    ])
}

// ---------------------------------------------------------------------------
// Table ordering and queries
// ---------------------------------------------------------------------------

#[test]
fn test_records_sorted_by_frame_number() {
    let table = sample_table();
    assert_eq!(table.frame_numbers(), vec![0, 10, 20, 29]);
    assert_eq!(table.data_indices(), vec![1000, 1010, 1020, 1029]);
}

#[test]
fn test_lookup_and_counts() {
    let table = sample_table();
    assert_eq!(table.get(20).map(|r| r.data_index), Some(1020));
    assert!(table.get(5).is_none());
    assert_eq!(table.resolved_count(), 3);
    assert_eq!(table.count_status(FrameStatus::OutOfBounds), 1);
    assert!(!table.get(10).unwrap().is_resolved());
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

#[test]
fn test_csv_layout() {
    let mut buf = Vec::new();
    write_csv(&sample_table(), &mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "frame_number,data_index,center_x,center_y,status");
    assert_eq!(lines[1], "0,1000,511,499.75,refined");
    assert_eq!(lines[2], "10,1010,NaN,NaN,out_of_bounds");
    assert_eq!(lines.len(), 5);
}

#[test]
fn test_csv_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("centers.csv");
    let table = sample_table();
    save_table(&table, &path).unwrap();
    let back = load_csv(&path).unwrap();

    assert_eq!(back.len(), table.len());
    for (a, b) in table.iter().zip(back.iter()) {
        assert_eq!(a.frame_number, b.frame_number);
        assert_eq!(a.data_index, b.data_index);
        assert_eq!(a.status, b.status);
        if a.is_resolved() {
            assert_eq!(a.center(), b.center());
        } else {
            assert!(b.center_x.is_nan() && b.center_y.is_nan());
        }
    }
}

#[test]
fn test_csv_bad_header_rejected() {
    let input = "frame,index,x,y\n0,0,1,1\n";
    assert!(matches!(
        read_csv(Cursor::new(input)),
        Err(CenterError::InvalidTable { line: 1, .. })
    ));
}

#[test]
fn test_csv_bad_row_reports_line() {
    let input = "frame_number,data_index,center_x,center_y,status\n0,0,1,1,refined\n1,1,2,2,wobbly\n";
    match read_csv(Cursor::new(input)) {
        Err(CenterError::InvalidTable { line, reason }) => {
            assert_eq!(line, 3);
            assert!(reason.contains("wobbly"), "got: {reason}");
        }
        other => panic!("expected InvalidTable, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

#[test]
fn test_json_output_by_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("centers.json");
    save_table(&sample_table(), &path).unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let rows = value.as_array().unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0]["frame_number"], 0);
    assert_eq!(rows[0]["status"], "refined");
    assert_eq!(rows[1]["status"], "out_of_bounds");
    assert!(rows[1]["center_x"].is_null());
    assert_eq!(rows[2]["center_x"], 512.25);
}

// ---------------------------------------------------------------------------
// FrameStatus
// ---------------------------------------------------------------------------

#[test]
fn test_frame_status_string_round_trip() {
    for status in [
        FrameStatus::Refined,
        FrameStatus::Skipped,
        FrameStatus::IterationLimit,
        FrameStatus::Unconverged,
        FrameStatus::OutOfBounds,
        FrameStatus::NumericFailure,
        FrameStatus::Fault,
        FrameStatus::NotSampled,
    ] {
        assert_eq!(status.to_string().parse::<FrameStatus>(), Ok(status));
    }
}

#[test]
fn test_only_finite_statuses_are_resolved() {
    assert!(FrameStatus::Refined.is_resolved());
    assert!(FrameStatus::Skipped.is_resolved());
    assert!(FrameStatus::IterationLimit.is_resolved());
    assert!(!FrameStatus::Unconverged.is_resolved());
    assert!(!FrameStatus::OutOfBounds.is_resolved());
    assert!(!FrameStatus::Fault.is_resolved());
    assert!(!FrameStatus::NotSampled.is_resolved());
}
