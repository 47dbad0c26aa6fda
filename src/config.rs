//! Configuration management for the trajectory analysis tool

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Project layout
    pub project: ProjectConfig,

    /// Tracked animals
    pub animals: Vec<AnimalConfig>,

    /// Feature extraction parameters
    pub features: FeatureConfig,

    /// Region-sequence analysis parameters
    pub sequence: SequenceConfig,

    /// Path plotting parameters
    pub path_plot: PathPlotConfig,
}

/// Project file layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Directory holding row-per-frame tracking CSVs
    pub data_dir: PathBuf,

    /// Video metadata registry CSV
    pub video_info: PathBuf,

    /// Directory all outputs are written under
    pub output_dir: PathBuf,

    /// Explicit data files; when empty, every CSV in `data_dir` is used
    pub data_files: Vec<PathBuf>,
}

/// One tracked animal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimalConfig {
    /// Display name, drawn next to the newest position
    pub name: String,

    /// Body part whose `<part>_x`/`<part>_y` columns are read
    pub body_part: String,

    /// Palette color name for trajectory drawing
    pub color: String,
}

/// Feature extraction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Rolling window lengths in seconds
    pub window_sizes: Vec<f64>,

    /// Bucket length in seconds for peak-ratio features
    pub bucket_seconds: f64,

    /// Express distances in centimetres instead of millimetres
    pub centimeters: bool,

    /// Binary classifier columns to derive switch and bout features from
    pub classifiers: Vec<String>,
}

/// Region-sequence analysis parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceConfig {
    /// Region occupancy columns, in arm order
    pub regions: Vec<String>,
}

/// Path plotting parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathPlotConfig {
    /// Write a rendered mp4
    pub video: bool,

    /// Write numbered frame images
    pub frames: bool,

    /// Write the final frame image
    pub last_frame: bool,

    /// Style overrides; anything unset is derived from the video
    pub style: StyleOverrides,

    /// Classifier overlays drawn on top of the paths
    pub clf_overlays: Vec<ClfOverlayConfig>,
}

/// Optional style settings; unset fields auto-derive from the video's
/// resolution and frame rate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleOverrides {
    /// Background color name
    pub bg_color: Option<String>,

    /// Trajectory history length in milliseconds
    pub max_lines_ms: Option<u64>,

    /// Polyline thickness
    pub line_thickness: Option<i32>,

    /// Diameter of the newest-position dot
    pub circle_size: Option<i32>,

    /// Label font scale
    pub font_size: Option<f64>,

    /// Label font thickness
    pub font_thickness: Option<i32>,

    /// Output frame width
    pub width: Option<i32>,

    /// Output frame height
    pub height: Option<i32>,
}

/// One classifier overlay on the path plot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClfOverlayConfig {
    /// Binary classifier column in the tracking table
    pub column: String,

    /// Marker color name
    pub color: String,

    /// Marker diameter; the style's circle size when unset
    #[serde(default)]
    pub size: Option<i32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project: ProjectConfig::default(),
            animals: vec![AnimalConfig::default()],
            features: FeatureConfig::default(),
            sequence: SequenceConfig::default(),
            path_plot: PathPlotConfig::default(),
        }
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("project/csv"),
            video_info: PathBuf::from("project/video_info.csv"),
            output_dir: PathBuf::from("project/output"),
            data_files: Vec::new(),
        }
    }
}

impl Default for AnimalConfig {
    fn default() -> Self {
        Self {
            name: "Animal_1".to_string(),
            body_part: "Nose".to_string(),
            color: "red".to_string(),
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            window_sizes: vec![2.0],
            bucket_seconds: 15.0,
            centimeters: false,
            classifiers: Vec::new(),
        }
    }
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            regions: Vec::new(),
        }
    }
}

impl Default for PathPlotConfig {
    fn default() -> Self {
        Self {
            video: true,
            frames: false,
            last_frame: true,
            style: StyleOverrides::default(),
            clf_overlays: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content)
            .map_err(|e| Error::ConfigError(format!("failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be serialized or written.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid value found.
    pub fn validate(&self) -> Result<()> {
        if self.animals.is_empty() {
            return Err(Error::ConfigError(
                "configure at least one animal".to_string(),
            ));
        }
        for animal in &self.animals {
            if animal.name.is_empty() || animal.body_part.is_empty() {
                return Err(Error::ConfigError(
                    "animal name and body part must not be empty".to_string(),
                ));
            }
            check_color(&animal.color)?;
        }

        if self.features.window_sizes.is_empty() {
            return Err(Error::ConfigError(
                "configure at least one feature window size".to_string(),
            ));
        }
        for &window in &self.features.window_sizes {
            if window <= 0.0 || !window.is_finite() {
                return Err(Error::ConfigError(format!(
                    "feature window sizes must be positive, got {window}"
                )));
            }
        }
        if self.features.bucket_seconds <= 0.0 || !self.features.bucket_seconds.is_finite() {
            return Err(Error::ConfigError(format!(
                "bucket length must be positive, got {}",
                self.features.bucket_seconds
            )));
        }

        let style = &self.path_plot.style;
        if let Some(name) = &style.bg_color {
            check_color(name)?;
        }
        for (field, value) in [
            ("line_thickness", style.line_thickness),
            ("circle_size", style.circle_size),
            ("font_thickness", style.font_thickness),
            ("width", style.width),
            ("height", style.height),
        ] {
            if let Some(value) = value {
                if value < 1 {
                    return Err(Error::ConfigError(format!(
                        "style {field} must be at least 1, got {value}"
                    )));
                }
            }
        }
        if let Some(font_size) = style.font_size {
            if font_size <= 0.0 || !font_size.is_finite() {
                return Err(Error::ConfigError(format!(
                    "style font_size must be positive, got {font_size}"
                )));
            }
        }
        if style.max_lines_ms == Some(0) {
            return Err(Error::ConfigError(
                "style max_lines_ms must be at least 1".to_string(),
            ));
        }

        for overlay in &self.path_plot.clf_overlays {
            if overlay.column.is_empty() {
                return Err(Error::ConfigError(
                    "classifier overlay column must not be empty".to_string(),
                ));
            }
            check_color(&overlay.color)?;
            if let Some(size) = overlay.size {
                if size < 1 {
                    return Err(Error::ConfigError(format!(
                        "classifier overlay size must be at least 1, got {size}"
                    )));
                }
            }
        }

        Ok(())
    }
}

fn check_color(name: &str) -> Result<()> {
    if crate::plotting::color_bgr(name).is_none() {
        return Err(Error::ConfigError(format!("unknown color '{name}'")));
    }
    Ok(())
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Trajectory Analysis Configuration

# Project layout
project:
  data_dir: "project/csv"
  video_info: "project/video_info.csv"
  output_dir: "project/output"
  data_files: []

# Tracked animals
animals:
  - name: "Animal_1"
    body_part: "Nose"
    color: "red"

# Feature extraction
features:
  window_sizes: [2.0]
  bucket_seconds: 15.0
  centimeters: false
  classifiers: []

# Region-sequence analysis
sequence:
  regions: []

# Path plotting
path_plot:
  video: true
  frames: false
  last_frame: true
  style:
    bg_color: "white"
  clf_overlays: []
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_config_parses_and_validates() {
        let config: Config = serde_yaml::from_str(EXAMPLE_CONFIG).unwrap();
        config.validate().unwrap();
        assert_eq!(config.animals[0].body_part, "Nose");
        assert_eq!(config.path_plot.style.bg_color.as_deref(), Some("white"));
        assert!(config.path_plot.style.circle_size.is_none());
    }

    #[test]
    fn test_default_config_validates() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_missing_sections_fall_back_to_defaults() {
        let config: Config = serde_yaml::from_str("sequence:\n  regions: [\"Arm_A\"]\n").unwrap();
        assert_eq!(config.sequence.regions, vec!["Arm_A".to_string()]);
        assert_eq!(config.animals.len(), 1);
        assert_eq!(config.features.window_sizes, vec![2.0]);
    }

    #[test]
    fn test_unknown_color_rejected() {
        let mut config = Config::default();
        config.animals[0].color = "plaid".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.path_plot.clf_overlays.push(ClfOverlayConfig {
            column: "rearing".to_string(),
            color: "chartreuse-ish".to_string(),
            size: None,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_numeric_values_rejected() {
        let mut config = Config::default();
        config.features.window_sizes = vec![0.0];
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.path_plot.style.max_lines_ms = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut config = Config::default();
        config.sequence.regions = vec!["Arm_A".to_string(), "Arm_B".to_string()];
        config.to_file(&path).unwrap();
        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
