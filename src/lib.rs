//! Trajectory analysis library for animal tracking data.
//!
//! This library derives behavioral measures from pose-estimation output:
//! - Rolling-window feature columns over body-part trajectories
//! - Spontaneous-alternation and path-loop sequence analysis
//! - Velocity aggregation per video
//! - Path-plot rendering through `OpenCV`, single- or multi-core
//!
//! A typical run consists of:
//! 1. Loading a row-per-frame tracking CSV and the video's metadata
//! 2. Deriving feature series from the body-part coordinates
//! 3. Writing feature CSVs, and/or rendering the trajectory as a video
//!
//! # Examples
//!
//! ## Deriving Features
//!
//! ```no_run
//! use ethotrace::data_table::DataTable;
//! use ethotrace::features::{geometry, rolling};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let table = DataTable::from_csv("project/csv/trial_1.csv")?;
//! let nose = table.body_part_points("Nose")?;
//!
//! // Framewise movement in millimetres at 4.25 px/mm
//! let movement = geometry::framewise_movement(&nose, 4.25, false)?;
//!
//! // Movement change against half a second earlier, at 30 fps
//! let changes = rolling::distance_change_vs_reference(&movement, 30.0, &[0.5])?;
//!
//! // Peak ratio over a trailing 2 s window
//! let peaks = rolling::rolling_peak_ratio(&movement, 30.0, &[2.0])?;
//!
//! assert_eq!(changes.len(), peaks.len());
//! println!("{} frames analyzed", changes.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Spontaneous Alternations
//!
//! ```no_run
//! use ethotrace::data_table::DataTable;
//! use ethotrace::sequence;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let table = DataTable::from_csv("project/csv/y_maze.csv")?;
//! let regions: Vec<String> = ["Arm_A", "Arm_B", "Arm_C"]
//!     .iter()
//!     .map(|s| s.to_string())
//!     .collect();
//! let occupancy = table.occupancy(&regions)?;
//!
//! let result = sequence::spontaneous_alternations(&occupancy, &regions)?;
//! println!(
//!     "{} alternations ({:.1}%)",
//!     result.alternation_cnt, result.pct_alternation
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Rendering a Path Plot
//!
//! ```no_run
//! use ethotrace::config::StyleOverrides;
//! use ethotrace::data_table::DataTable;
//! use ethotrace::plotting::{self, path_plotter::PathPlotter, AnimalTrack, PathPlotOutput};
//! use ethotrace::video_info::VideoInfoMap;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let videos = VideoInfoMap::from_csv("project/video_info.csv")?;
//! let video = videos.get("trial_1")?;
//! let table = DataTable::from_csv("project/csv/trial_1.csv")?;
//!
//! // Derive marker and font sizes from the video resolution
//! let style = plotting::resolve_style(&StyleOverrides::default(), video)?;
//!
//! let animals = vec![AnimalTrack {
//!     name: "Animal_1".to_string(),
//!     color: plotting::color_bgr("red").ok_or("unknown color")?,
//!     points: table.body_part_points("Nose")?,
//! }];
//! let output = PathPlotOutput {
//!     video: true,
//!     frames: false,
//!     last_frame: true,
//! };
//!
//! let plotter = PathPlotter::new(
//!     style,
//!     video.clone(),
//!     animals,
//!     Vec::new(),
//!     output,
//!     "project/output".into(),
//! )?;
//! plotter.run()?;
//! # Ok(())
//! # }
//! ```

/// Feature derivation over tracking trajectories
pub mod features;

/// Region-sequence analyses: spontaneous alternations and path loops
pub mod sequence;

/// Path-plot rendering, single- and multi-core
pub mod plotting;

/// Per-video velocity aggregation
pub mod velocity;

/// Row-per-frame tracking tables loaded from CSV
pub mod data_table;

/// Per-video metadata registry
pub mod video_info;

/// Error types and result handling
pub mod error;

/// Main application module
pub mod app;

/// Constants used throughout the analyses
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
