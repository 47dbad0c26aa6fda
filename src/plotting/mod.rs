//! Path-plot rendering.
//!
//! Style resolution, the shared frame-drawing routine, and the history
//! expansion/partitioning used by the chunked renderer live here; the
//! sequential and multi-core drivers are in the submodules. Both drivers
//! feed the same [`draw_path_frame`], so their overlay geometry is
//! identical frame for frame.

/// Sequential frame-by-frame renderer
pub mod path_plotter;

/// Chunked renderer over a worker pool
pub mod path_plotter_mp;

use crate::config::StyleOverrides;
use crate::constants::{
    DEFAULT_FONT_THICKNESS, DEFAULT_HISTORY_SECONDS, DEFAULT_LINE_THICKNESS, FONT_SCALER,
    RADIUS_SCALER, RES_SCALER,
};
use crate::data_table::TrackPoint;
use crate::video_info::VideoInfo;
use crate::{Error, Result};
use opencv::{
    core::{Mat, Point, Scalar, Size, CV_8UC3},
    imgproc::{self, FONT_HERSHEY_COMPLEX, LINE_8},
    prelude::*,
    videoio::VideoWriter,
};
use std::path::Path;

/// Look up a named palette color as a BGR scalar
#[must_use]
pub fn color_bgr(name: &str) -> Option<Scalar> {
    let (b, g, r) = match name.to_lowercase().as_str() {
        "white" => (255.0, 255.0, 255.0),
        "black" => (0.0, 0.0, 0.0),
        "red" => (0.0, 0.0, 255.0),
        "green" => (0.0, 255.0, 0.0),
        "blue" => (255.0, 0.0, 0.0),
        "yellow" => (0.0, 255.0, 255.0),
        "cyan" => (255.0, 255.0, 0.0),
        "magenta" => (255.0, 0.0, 255.0),
        "orange" => (0.0, 165.0, 255.0),
        "pink" => (203.0, 192.0, 255.0),
        "grey" | "gray" => (128.0, 128.0, 128.0),
        "lightblue" | "light_blue" => (255.0, 100.0, 100.0),
        "lightgreen" | "light_green" => (100.0, 255.0, 100.0),
        _ => return None,
    };
    Some(Scalar::new(b, g, r, 0.0))
}

/// Resolved rendering style for one video
#[derive(Debug, Clone, PartialEq)]
pub struct PathStyle {
    /// Output frame width in pixels
    pub width: i32,
    /// Output frame height in pixels
    pub height: i32,
    /// Canvas background, BGR
    pub bg_color: Scalar,
    /// Trajectory history length in frames
    pub max_lines: usize,
    /// Polyline thickness
    pub line_thickness: i32,
    /// Diameter of the dot at the newest position
    pub circle_size: i32,
    /// Label font scale
    pub font_size: f64,
    /// Label font thickness
    pub font_thickness: i32,
}

/// Fill a style from explicit overrides, deriving the rest from the
/// video's resolution and frame rate. Marker and font sizes scale with
/// `max(width, height)` against a reference resolution; the history
/// length defaults to two seconds of frames, or converts a
/// milliseconds override at the video's fps.
///
/// # Errors
///
/// Returns an error if an override names an unknown color.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn resolve_style(overrides: &StyleOverrides, video: &VideoInfo) -> Result<PathStyle> {
    let max_res = f64::from(video.resolution_width.max(video.resolution_height));
    let bg_color = match &overrides.bg_color {
        Some(name) => color_bgr(name)
            .ok_or_else(|| Error::ConfigError(format!("unknown background color '{name}'")))?,
        None => Scalar::new(255.0, 255.0, 255.0, 0.0),
    };
    #[allow(clippy::cast_precision_loss)]
    let max_lines = match overrides.max_lines_ms {
        Some(ms) => (ms as f64 * video.fps / 1000.0) as usize,
        None => (video.fps * DEFAULT_HISTORY_SECONDS) as usize,
    };
    Ok(PathStyle {
        width: overrides.width.unwrap_or(video.resolution_width),
        height: overrides.height.unwrap_or(video.resolution_height),
        bg_color,
        max_lines: max_lines.max(1),
        line_thickness: overrides.line_thickness.unwrap_or(DEFAULT_LINE_THICKNESS),
        circle_size: overrides
            .circle_size
            .unwrap_or((RADIUS_SCALER / (RES_SCALER / max_res)) as i32),
        font_size: overrides
            .font_size
            .unwrap_or(FONT_SCALER / (RES_SCALER / max_res)),
        font_thickness: overrides.font_thickness.unwrap_or(DEFAULT_FONT_THICKNESS),
    })
}

/// Output artifacts requested from a render pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathPlotOutput {
    /// Write a rendered video
    pub video: bool,
    /// Write numbered frame images
    pub frames: bool,
    /// Write the final frame image
    pub last_frame: bool,
}

impl PathPlotOutput {
    #[must_use]
    pub fn any(&self) -> bool {
        self.video || self.frames || self.last_frame
    }

    /// # Errors
    ///
    /// Returns an error if no output form is selected.
    pub fn validate(&self) -> Result<()> {
        if self.any() {
            Ok(())
        } else {
            Err(Error::NoOutput(
                "select at least one of video, frame or last-frame output".to_string(),
            ))
        }
    }
}

/// Paths produced by a render pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOutput {
    pub video_path: Option<std::path::PathBuf>,
    pub frames_dir: Option<std::path::PathBuf>,
    pub last_frame_path: Option<std::path::PathBuf>,
    pub frames_rendered: usize,
}

/// Trajectory stream plus draw attributes for one animal
#[derive(Debug, Clone)]
pub struct AnimalTrack {
    pub name: String,
    pub color: Scalar,
    pub points: Vec<TrackPoint>,
}

/// Classifier-event overlay: a marker at the tagged body-part position for
/// every frame up to the rendered one where the classifier fired
#[derive(Debug, Clone)]
pub struct ClfOverlay {
    pub name: String,
    pub color: Scalar,
    pub size: i32,
    pub positions: Vec<TrackPoint>,
    pub fired: Vec<bool>,
}

impl ClfOverlay {
    /// # Errors
    ///
    /// Returns an error if positions and labels disagree in length.
    pub fn new(
        name: String,
        color: Scalar,
        size: i32,
        positions: Vec<TrackPoint>,
        fired: Vec<bool>,
    ) -> Result<Self> {
        if positions.len() != fired.len() {
            return Err(Error::ShapeMismatch(format!(
                "classifier overlay '{name}' has {} positions for {} labels",
                positions.len(),
                fired.len()
            )));
        }
        Ok(Self {
            name,
            color,
            size,
            positions,
            fired,
        })
    }
}

/// Trailing history window for one frame, materialized so chunk workers
/// need no shared buffer. Slots are oldest first and exactly `max_lines`
/// long; slots before the start of the video are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameWindow {
    pub frame_idx: usize,
    pub history: Vec<Vec<Option<TrackPoint>>>,
}

impl FrameWindow {
    /// Valid positions newest first, per animal, as the sequential
    /// renderer's buffer holds them
    #[must_use]
    pub fn newest_first(&self) -> Vec<Vec<TrackPoint>> {
        self.history
            .iter()
            .map(|slots| slots.iter().rev().filter_map(|slot| *slot).collect())
            .collect()
    }
}

/// A contiguous run of frames owned by one render worker
#[derive(Debug, Clone)]
pub struct FrameChunk {
    pub chunk_idx: usize,
    pub windows: Vec<FrameWindow>,
}

/// Materialize every frame's trailing window (current frame inclusive)
/// over per-animal trajectories.
#[must_use]
pub fn expand_frame_windows(
    trajectories: &[Vec<TrackPoint>],
    max_lines: usize,
) -> Vec<FrameWindow> {
    let frames = trajectories.first().map_or(0, Vec::len);
    (0..frames)
        .map(|i| {
            let start = (i + 1).saturating_sub(max_lines);
            let history = trajectories
                .iter()
                .map(|trajectory| {
                    let mut slots: Vec<Option<TrackPoint>> = Vec::with_capacity(max_lines);
                    slots.resize(max_lines - (i + 1 - start), None);
                    slots.extend(trajectory[start..=i].iter().copied().map(Some));
                    slots
                })
                .collect();
            FrameWindow {
                frame_idx: i,
                history,
            }
        })
        .collect()
}

/// Split `0..frames` into `chunks` contiguous ranges in order; the first
/// `frames % chunks` ranges hold one extra frame. Never returns more
/// ranges than frames.
#[must_use]
pub fn partition_frames(frames: usize, chunks: usize) -> Vec<std::ops::Range<usize>> {
    if frames == 0 || chunks == 0 {
        return Vec::new();
    }
    let chunks = chunks.min(frames);
    let base = frames / chunks;
    let extra = frames % chunks;
    let mut ranges = Vec::with_capacity(chunks);
    let mut start = 0;
    for chunk in 0..chunks {
        let len = base + usize::from(chunk < extra);
        ranges.push(start..start + len);
        start += len;
    }
    ranges
}

fn to_cv_point(point: TrackPoint) -> Point {
    let (x, y) = point.to_pixel();
    Point::new(x, y)
}

/// Draw one path-plot frame onto a fresh canvas. `histories` hold each
/// animal's trailing positions, newest first; classifier markers
/// accumulate up to `frame_idx`.
///
/// # Errors
///
/// Returns an error if any drawing call fails.
pub fn draw_path_frame(
    style: &PathStyle,
    video: &VideoInfo,
    animals: &[AnimalTrack],
    histories: &[Vec<TrackPoint>],
    overlays: &[ClfOverlay],
    frame_idx: usize,
) -> Result<Mat> {
    let mut img = Mat::new_rows_cols_with_default(
        video.resolution_height,
        video.resolution_width,
        CV_8UC3,
        style.bg_color,
    )?;

    for (animal, history) in animals.iter().zip(histories) {
        for pair in history.windows(2) {
            imgproc::line(
                &mut img,
                to_cv_point(pair[1]),
                to_cv_point(pair[0]),
                animal.color,
                style.line_thickness,
                LINE_8,
                0,
            )?;
        }
        if let Some(&head) = history.first() {
            // Zero radius with positive thickness renders a dot whose
            // diameter is the thickness
            imgproc::circle(
                &mut img,
                to_cv_point(head),
                0,
                animal.color,
                style.circle_size,
                LINE_8,
                0,
            )?;
            imgproc::put_text(
                &mut img,
                &animal.name,
                to_cv_point(head),
                FONT_HERSHEY_COMPLEX,
                style.font_size,
                animal.color,
                style.font_thickness,
                LINE_8,
                false,
            )?;
        }
    }

    for overlay in overlays {
        let upto = overlay.fired.len().min(frame_idx + 1);
        for j in 0..upto {
            if overlay.fired[j] {
                imgproc::circle(
                    &mut img,
                    to_cv_point(overlay.positions[j]),
                    0,
                    overlay.color,
                    overlay.size,
                    LINE_8,
                    0,
                )?;
            }
        }
    }

    if style.width != video.resolution_width || style.height != video.resolution_height {
        let mut resized = Mat::default();
        imgproc::resize(
            &img,
            &mut resized,
            Size::new(style.width, style.height),
            0.0,
            0.0,
            imgproc::INTER_LINEAR,
        )?;
        return Ok(resized);
    }
    Ok(img)
}

/// Open an mp4 writer at the style's output size.
///
/// # Errors
///
/// Returns an error if the writer cannot be opened.
pub fn open_writer(path: &Path, fps: f64, size: Size) -> Result<VideoWriter> {
    let fourcc = VideoWriter::fourcc('m', 'p', '4', 'v')?;
    let writer = VideoWriter::new(path.to_string_lossy().as_ref(), fourcc, fps, size, true)?;
    if !writer.is_opened()? {
        return Err(Error::InvalidInput(format!(
            "could not open video writer at {}",
            path.display()
        )));
    }
    Ok(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn video() -> VideoInfo {
        VideoInfo {
            video: "test".to_string(),
            fps: 30.0,
            resolution_width: 1000,
            resolution_height: 500,
            pixels_per_mm: 1.0,
        }
    }

    #[test]
    fn test_color_lookup() {
        assert_eq!(
            color_bgr("red").unwrap(),
            Scalar::new(0.0, 0.0, 255.0, 0.0)
        );
        assert_eq!(color_bgr("RED"), color_bgr("red"));
        assert!(color_bgr("mauve-ish").is_none());
    }

    #[test]
    fn test_style_auto_derivation() {
        let style = resolve_style(&StyleOverrides::default(), &video()).unwrap();
        // max_res 1000: circle = 10 / (1500/1000), font = 0.8 / (1500/1000)
        assert_eq!(style.circle_size, 6);
        assert!((style.font_size - 0.8 / 1.5).abs() < 1e-12);
        assert_eq!(style.max_lines, 60);
        assert_eq!(style.width, 1000);
        assert_eq!(style.height, 500);
        assert_eq!(style.bg_color, Scalar::new(255.0, 255.0, 255.0, 0.0));
        assert_eq!(style.line_thickness, 2);
        assert_eq!(style.font_thickness, 2);
    }

    #[test]
    fn test_style_overrides_win() {
        let overrides = StyleOverrides {
            bg_color: Some("black".to_string()),
            max_lines_ms: Some(500),
            line_thickness: Some(4),
            circle_size: Some(12),
            font_size: Some(1.5),
            font_thickness: Some(3),
            width: Some(640),
            height: Some(360),
        };
        let style = resolve_style(&overrides, &video()).unwrap();
        assert_eq!(style.bg_color, Scalar::new(0.0, 0.0, 0.0, 0.0));
        // 500 ms at 30 fps
        assert_eq!(style.max_lines, 15);
        assert_eq!(style.circle_size, 12);
        assert_eq!(style.width, 640);
        assert_eq!(style.height, 360);
    }

    #[test]
    fn test_style_unknown_color_is_error() {
        let overrides = StyleOverrides {
            bg_color: Some("plaid".to_string()),
            ..StyleOverrides::default()
        };
        assert!(resolve_style(&overrides, &video()).is_err());
    }

    #[test]
    fn test_tiny_history_clamps_to_one_frame() {
        let overrides = StyleOverrides {
            max_lines_ms: Some(1),
            ..StyleOverrides::default()
        };
        assert_eq!(resolve_style(&overrides, &video()).unwrap().max_lines, 1);
    }

    #[test]
    fn test_output_validation() {
        assert!(PathPlotOutput::default().validate().is_err());
        let output = PathPlotOutput {
            last_frame: true,
            ..PathPlotOutput::default()
        };
        assert!(output.validate().is_ok());
    }

    #[test]
    fn test_expand_frame_windows_pads_then_slides() {
        let trajectory: Vec<TrackPoint> =
            (0..5).map(|i| TrackPoint::new(f64::from(i), 0.0)).collect();
        let windows = expand_frame_windows(&[trajectory.clone()], 3);
        assert_eq!(windows.len(), 5);

        assert_eq!(
            windows[0].history[0],
            vec![None, None, Some(trajectory[0])]
        );
        assert_eq!(
            windows[1].history[0],
            vec![None, Some(trajectory[0]), Some(trajectory[1])]
        );
        assert_eq!(
            windows[4].history[0],
            vec![
                Some(trajectory[2]),
                Some(trajectory[3]),
                Some(trajectory[4])
            ]
        );
        // Newest-first view drops padding and reverses
        assert_eq!(
            windows[1].newest_first()[0],
            vec![trajectory[1], trajectory[0]]
        );
    }

    #[test]
    fn test_partition_frames_contiguous_in_order() {
        let ranges = partition_frames(10, 4);
        assert_eq!(ranges, vec![0..3, 3..6, 6..8, 8..10]);

        let even = partition_frames(8, 4);
        assert_eq!(even, vec![0..2, 2..4, 4..6, 6..8]);

        // Never more chunks than frames
        assert_eq!(partition_frames(2, 8).len(), 2);
        assert!(partition_frames(0, 4).is_empty());
    }

    // Property-based tests
    proptest! {
        #[test]
        fn prop_partition_covers_every_frame_once(
            frames in 0_usize..500,
            chunks in 0_usize..16,
        ) {
            let ranges = partition_frames(frames, chunks);
            if frames == 0 || chunks == 0 {
                prop_assert!(ranges.is_empty());
            } else {
                prop_assert!(ranges.len() <= chunks);
                prop_assert!(ranges.len() <= frames);
                let mut next = 0;
                for range in &ranges {
                    prop_assert_eq!(range.start, next);
                    prop_assert!(range.end > range.start);
                    next = range.end;
                }
                prop_assert_eq!(next, frames);
            }
        }

        #[test]
        fn prop_partition_stays_balanced(
            frames in 1_usize..500,
            chunks in 1_usize..16,
        ) {
            let ranges = partition_frames(frames, chunks);
            let shortest = ranges.iter().map(ExactSizeIterator::len).min().unwrap_or(0);
            let longest = ranges.iter().map(ExactSizeIterator::len).max().unwrap_or(0);
            prop_assert!(longest - shortest <= 1);
        }

        #[test]
        fn prop_window_slots_hold_fixed_width(
            frames in 1_usize..80,
            max_lines in 1_usize..20,
        ) {
            let trajectory: Vec<TrackPoint> = (0..frames)
                .map(|i| TrackPoint::new(i as f64, 0.0))
                .collect();
            let windows = expand_frame_windows(&[trajectory], max_lines);
            prop_assert_eq!(windows.len(), frames);
            for (i, window) in windows.iter().enumerate() {
                prop_assert_eq!(window.frame_idx, i);
                prop_assert_eq!(window.history[0].len(), max_lines);
                let valid = window.history[0].iter().flatten().count();
                prop_assert_eq!(valid, (i + 1).min(max_lines));
            }
        }
    }
}
