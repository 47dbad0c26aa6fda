//! Per-video metadata registry.
//!
//! Analyses need the recording's frame rate, resolution and pixel-to-mm
//! scale. These live in one CSV registry keyed by video name, matched
//! against each tracking file's stem.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Recording metadata for one video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Video name, without extension
    pub video: String,

    /// Frames per second
    pub fps: f64,

    /// Frame width in pixels
    pub resolution_width: i32,

    /// Frame height in pixels
    pub resolution_height: i32,

    /// Pixels per millimetre recorded for this camera setup
    pub pixels_per_mm: f64,
}

impl VideoInfo {
    /// # Errors
    ///
    /// Returns an error if any field is non-positive.
    pub fn validate(&self) -> Result<()> {
        if self.fps <= 0.0 {
            return Err(Error::VideoInfoError(format!(
                "video '{}' has non-positive fps ({})",
                self.video, self.fps
            )));
        }
        if self.resolution_width <= 0 || self.resolution_height <= 0 {
            return Err(Error::VideoInfoError(format!(
                "video '{}' has invalid resolution ({}x{})",
                self.video, self.resolution_width, self.resolution_height
            )));
        }
        if self.pixels_per_mm <= 0.0 {
            return Err(Error::VideoInfoError(format!(
                "video '{}' has non-positive pixels/mm ({})",
                self.video, self.pixels_per_mm
            )));
        }
        Ok(())
    }
}

/// Registry of [`VideoInfo`] entries, keyed by video name
#[derive(Debug, Clone, Default)]
pub struct VideoInfoMap {
    entries: HashMap<String, VideoInfo>,
}

impl VideoInfoMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the registry from a CSV file with columns `video`, `fps`,
    /// `resolution_width`, `resolution_height`, `pixels_per_mm`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, a row fails to parse,
    /// or an entry fails validation.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path.as_ref())?;
        let mut map = Self::new();
        for record in reader.deserialize() {
            let info: VideoInfo = record?;
            info.validate()?;
            map.insert(info);
        }
        Ok(map)
    }

    pub fn insert(&mut self, info: VideoInfo) {
        self.entries.insert(info.video.clone(), info);
    }

    /// Look up metadata for a video name (a tracking file's stem).
    ///
    /// # Errors
    ///
    /// Returns an error naming the video if no entry exists.
    pub fn get(&self, video: &str) -> Result<&VideoInfo> {
        self.entries.get(video).ok_or_else(|| {
            Error::VideoInfoError(format!("no metadata registered for video '{video}'"))
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
