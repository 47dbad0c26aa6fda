//! Integration tests for maze sequence analysis from CSV tracking files

use ethotrace::data_table::DataTable;
use ethotrace::sequence::{find_path_loops, spontaneous_alternations};
use std::io::Write;

/// One y-maze session: nose coordinates plus one-hot arm occupancy.
/// The animal visits left, centre, right, doubles back into centre,
/// then completes two more alternations.
const MAZE_SESSION: &str = "\
Nose_x,Nose_y,left_arm,centre_arm,right_arm
10.2,10.7,1,0,0
10.9,10.1,1,0,0
30.0,30.0,0,0,0
50.0,50.0,0,1,0
70.0,10.0,0,0,1
50.0,50.0,0,1,0
10.0,10.0,1,0,0
10.5,10.4,1,0,0
90.0,90.0,0,0,1
";

fn region_names() -> Vec<String> {
    ["left_arm", "centre_arm", "right_arm"]
        .iter()
        .map(|s| (*s).to_string())
        .collect()
}

fn load_session(content: &str) -> DataTable {
    let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write session CSV");
    DataTable::from_csv(file.path()).expect("Failed to load session CSV")
}

/// Test alternation counting over a full session loaded from disk
#[test]
fn test_maze_session_alternations() {
    let table = load_session(MAZE_SESSION);
    let occupancy = table
        .occupancy(&region_names())
        .expect("Failed to extract occupancy");
    let result =
        spontaneous_alternations(&occupancy, &region_names()).expect("Analysis failed");

    // Visits collapse to left(0), centre(3), right(4), centre(5),
    // left(6), right(8): four evaluated windows, one doubling back
    assert_eq!(result.alternation_cnt, 3);
    assert_eq!(result.error_cnt, 1);
    assert_eq!(result.same_arm_returns_cnt, 0);
    assert_eq!(result.alternate_arm_returns_cnt, 1);
    assert!((result.pct_alternation - 75.0).abs() < 1e-12);
}

/// Test that each alternation is keyed by its exact visit sequence and
/// stamped with the frame completing it
#[test]
fn test_maze_session_alternation_sequences() {
    let table = load_session(MAZE_SESSION);
    let occupancy = table.occupancy(&region_names()).expect("occupancy");
    let result = spontaneous_alternations(&occupancy, &region_names()).expect("analysis");

    let key = |labels: [&str; 3]| -> Vec<String> {
        labels.iter().map(|s| (*s).to_string()).collect()
    };
    assert_eq!(
        result
            .alternations
            .get(&key(["left_arm", "centre_arm", "right_arm"]))
            .expect("first alternation missing"),
        &vec![4]
    );
    assert_eq!(
        result
            .alternations
            .get(&key(["right_arm", "centre_arm", "left_arm"]))
            .expect("second alternation missing"),
        &vec![6]
    );
    assert_eq!(
        result
            .alternations
            .get(&key(["centre_arm", "left_arm", "right_arm"]))
            .expect("third alternation missing"),
        &vec![8]
    );
    assert_eq!(
        result
            .alternate_arm_returns
            .get("centre_arm")
            .expect("return missing"),
        &vec![5]
    );
}

/// Test loop detection on the pixel path of the same session
#[test]
fn test_maze_session_path_loops() {
    let table = load_session(MAZE_SESSION);
    let coords: Vec<(i32, i32)> = table
        .body_part_points("Nose")
        .expect("Nose columns missing")
        .iter()
        .map(|p| p.to_pixel())
        .collect();
    let loops = find_path_loops(&coords);

    // (10,10) is held over frames 0-1, left, and re-entered at frame 6;
    // (50,50) is visited at frames 3 and 5
    assert_eq!(loops.len(), 2);
    assert_eq!(loops.get(&(10, 10)).expect("loop at (10,10)"), &vec![0, 6]);
    assert_eq!(loops.get(&(50, 50)).expect("loop at (50,50)"), &vec![3, 5]);
}

/// Test that fractional occupancy values are rejected with the offending
/// value named
#[test]
fn test_fractional_occupancy_rejected() {
    let table = load_session(
        "left_arm,centre_arm,right_arm\n1,0,0\n0,0.5,0\n",
    );
    let occupancy = table.occupancy(&region_names()).expect("occupancy");
    let err = spontaneous_alternations(&occupancy, &region_names())
        .expect_err("fractional value should fail");
    assert!(err.to_string().contains("0.5"), "got: {err}");
}

/// Test that a missing region column is reported by name
#[test]
fn test_missing_region_column() {
    let table = load_session("left_arm,right_arm\n1,0\n");
    let err = table
        .occupancy(&region_names())
        .expect_err("centre_arm should be missing");
    assert!(err.to_string().contains("centre_arm"), "got: {err}");
}

/// Test a two-region session: consecutive stays collapse, so every window
/// of two visits alternates
#[test]
fn test_two_region_session_is_all_alternation() {
    let table = load_session("A,B\n1,0\n1,0\n0,1\n1,0\n0,1\n");
    let regions: Vec<String> = ["A", "B"].iter().map(|s| (*s).to_string()).collect();
    let occupancy = table.occupancy(&regions).expect("occupancy");
    let result = spontaneous_alternations(&occupancy, &regions).expect("analysis");

    assert_eq!(result.alternation_cnt, 3);
    assert!((result.pct_alternation - 100.0).abs() < 1e-12);
    assert_eq!(result.error_cnt, 0);
}
