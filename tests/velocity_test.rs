//! Integration tests for per-video velocity aggregation

use ethotrace::data_table::{DataTable, TrackPoint};
use ethotrace::velocity;
use std::io::Write;

/// Test rolling and mean velocity of a constant-speed walk at 25 fps
#[test]
fn test_constant_speed_walk() {
    // 5 px per frame at 2 px/mm is 0.25 cm per frame
    let points: Vec<TrackPoint> = (0..60)
        .map(|i| TrackPoint::new(f64::from(i) * 5.0, 40.0))
        .collect();
    let report = velocity::analyze("walk", &points, 2.0, 25.0).expect("analysis failed");

    assert_eq!(report.rolling_cm_s.len(), 60);
    // The one-second window spans 25 frames
    assert_eq!(report.rolling_cm_s[23], -1.0);
    // First full window still contains the stationary first frame
    assert!((report.rolling_cm_s[24] - 6.0).abs() < 1e-9);
    assert!((report.rolling_cm_s[59] - 6.25).abs() < 1e-9);

    let expected_mean = (24.0 * -1.0 + 6.0 + 35.0 * 6.25) / 60.0;
    assert!((report.mean_cm_s - expected_mean).abs() < 1e-9);
}

/// Test a dwelling animal: movement sums to zero once the window fills,
/// and the unfilled entries drag the mean below zero
#[test]
fn test_dwelling_animal() {
    let points = vec![TrackPoint::new(12.0, 12.0); 4];
    let report = velocity::analyze("dwell", &points, 1.0, 2.0).expect("analysis failed");

    assert_eq!(report.rolling_cm_s, vec![-1.0, 0.0, 0.0, 0.0]);
    assert!((report.mean_cm_s - -0.25).abs() < 1e-12);
}

/// Test the full loop from tracking CSV to rolling-velocity CSV
#[test]
fn test_velocity_from_tracking_csv() {
    let mut tracking = tempfile::NamedTempFile::new().expect("temp file");
    tracking
        .write_all(b"Centre_x,Centre_y\n0,0\n30,40\n30,40\n60,80\n")
        .expect("write tracking CSV");
    let table = DataTable::from_csv(tracking.path()).expect("load tracking CSV");
    let points = table.body_part_points("Centre").expect("Centre columns");

    // Steps of 50 px at 5 px/mm are 1 cm; window is 2 frames at 2 fps
    let report = velocity::analyze("clip", &points, 5.0, 2.0).expect("analysis failed");
    assert_eq!(report.rolling_cm_s, vec![-1.0, 1.0, 1.0, 1.0]);

    let dir = tempfile::tempdir().expect("temp dir");
    let rolling_path = dir.path().join("clip_rolling_velocity.csv");
    velocity::write_rolling_csv(&report, &rolling_path).expect("write rolling CSV");

    let mut reader = csv::Reader::from_path(&rolling_path).expect("reopen rolling CSV");
    assert_eq!(
        reader.headers().expect("headers").iter().collect::<Vec<_>>(),
        vec!["frame", "rolling_velocity_cm_s"]
    );
    let rows: Vec<(usize, f64)> = reader
        .records()
        .map(|record| {
            let record = record.expect("record");
            (
                record[0].parse().expect("frame index"),
                record[1].parse().expect("velocity"),
            )
        })
        .collect();
    assert_eq!(rows.len(), report.rolling_cm_s.len());
    for (row, velocity) in rows.iter().zip(&report.rolling_cm_s) {
        assert_eq!(row.1, *velocity, "frame {} diverged", row.0);
    }
}

/// Test that the batch summary keeps one row per video in input order
#[test]
fn test_mean_summary_row_per_video() {
    let reports = vec![
        velocity::VelocityReport {
            video: "clip_a".to_string(),
            rolling_cm_s: vec![-1.0, 2.0],
            mean_cm_s: 0.5,
        },
        velocity::VelocityReport {
            video: "clip_b".to_string(),
            rolling_cm_s: vec![-1.0, 4.0],
            mean_cm_s: 1.5,
        },
    ];
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("mean_velocities.csv");
    velocity::write_mean_summary(&reports, &path).expect("write summary");

    let summary = std::fs::read_to_string(&path).expect("reopen summary");
    let lines: Vec<&str> = summary.lines().collect();
    assert_eq!(
        lines,
        vec!["video,mean_velocity_cm_s", "clip_a,0.5", "clip_b,1.5"]
    );
}
