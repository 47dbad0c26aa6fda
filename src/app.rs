//! Batch orchestration over a tracking project.
//!
//! `AnalysisApp` joins each tracking CSV with its video metadata and runs
//! the requested analysis over every file, writing results under the
//! configured output directory. Analysis runs fail on the first bad file;
//! rendering runs log the failed video and continue with the next one.

use crate::{
    config::Config,
    data_table::DataTable,
    error::{Error, Result},
    features::{geometry, rolling},
    plotting::{
        self, path_plotter::PathPlotter, path_plotter_mp::PathPlotterMp, AnimalTrack, ClfOverlay,
        PathPlotOutput, RenderOutput,
    },
    sequence, velocity,
    video_info::{VideoInfo, VideoInfoMap},
};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Main application struct
pub struct AnalysisApp {
    config: Config,
    video_info: VideoInfoMap,
}

impl AnalysisApp {
    /// Create a new analysis application
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the video
    /// metadata registry cannot be loaded, or the output directory cannot
    /// be created.
    pub fn new(config: Config) -> Result<Self> {
        info!("Initializing trajectory analysis");
        config.validate()?;

        let video_info = VideoInfoMap::from_csv(&config.project.video_info)?;
        info!(
            "Loaded metadata for {} video(s) from {}",
            video_info.len(),
            config.project.video_info.display()
        );

        std::fs::create_dir_all(&config.project.output_dir)?;

        Ok(Self { config, video_info })
    }

    /// Data files to process: the explicit list from the configuration, or
    /// every CSV in the data directory sorted by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be read or no files
    /// are found.
    pub fn data_files(&self) -> Result<Vec<PathBuf>> {
        let files = if self.config.project.data_files.is_empty() {
            let mut discovered = Vec::new();
            for entry in std::fs::read_dir(&self.config.project.data_dir)? {
                let path = entry?.path();
                let is_csv = path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
                if is_csv {
                    discovered.push(path);
                }
            }
            discovered.sort();
            discovered
        } else {
            self.config.project.data_files.clone()
        };

        if files.is_empty() {
            return Err(Error::ConfigError(format!(
                "no data files found in {}",
                self.config.project.data_dir.display()
            )));
        }
        Ok(files)
    }

    /// Extract the configured feature columns for every data file.
    ///
    /// # Errors
    ///
    /// Returns an error on the first file that cannot be processed.
    pub fn run_features(&self) -> Result<()> {
        let started = Instant::now();
        let files = self.data_files()?;
        info!("Extracting features for {} file(s)", files.len());

        for path in &files {
            self.extract_features_for(path)?;
        }

        info!(
            "Feature extraction finished in {:.2} s",
            started.elapsed().as_secs_f64()
        );
        Ok(())
    }

    fn extract_features_for(&self, path: &Path) -> Result<PathBuf> {
        let (table, video) = self.load_table(path)?;
        let fps = video.fps;
        let px_per_mm = video.pixels_per_mm;
        let windows = &self.config.features.window_sizes;
        let mut columns: Vec<(String, Vec<String>)> = Vec::new();

        for animal in &self.config.animals {
            let bp = &animal.body_part;
            let points = table.body_part_points(bp)?;

            let movement =
                geometry::framewise_movement(&points, px_per_mm, self.config.features.centimeters)?;
            columns.push((format!("movement_{bp}"), float_cells(&movement)));

            let changes = rolling::distance_change_vs_reference(&movement, fps, windows)?;
            for (w, &seconds) in windows.iter().enumerate() {
                columns.push((
                    format!("distance_change_{bp}_{seconds}"),
                    int_column_cells(&changes, w),
                ));
            }

            for &seconds in windows {
                let borders = geometry::border_distances(
                    &points,
                    px_per_mm,
                    (video.resolution_width, video.resolution_height),
                    seconds,
                    fps,
                )?;
                for (edge_idx, edge) in ["left", "right", "top", "bottom"].iter().enumerate() {
                    columns.push((
                        format!("border_{edge}_{bp}_{seconds}"),
                        borders.iter().map(|row| row[edge_idx].to_string()).collect(),
                    ));
                }
            }

            let deltas = geometry::directional_movement_delta(&points, px_per_mm, windows, fps)?;
            for (w, &seconds) in windows.iter().enumerate() {
                columns.push((
                    format!("directional_delta_{bp}_{seconds}"),
                    int_column_cells(&deltas, w),
                ));
            }

            let bucket_ratios = rolling::peak_ratio_per_bucket(
                &movement,
                self.config.features.bucket_seconds,
                fps,
            )?;
            columns.push((format!("peak_ratio_{bp}"), float_cells(&bucket_ratios)));

            let peak_ratios = rolling::rolling_peak_ratio(&movement, fps, windows)?;
            for (w, &seconds) in windows.iter().enumerate() {
                columns.push((
                    format!("rolling_peak_ratio_{bp}_{seconds}"),
                    float_column_cells(&peak_ratios, w),
                ));
            }
        }

        for clf in &self.config.features.classifiers {
            let labels = table.column(clf)?;
            let switches = rolling::categorical_switch_ratio(labels, fps, windows)?;
            for (w, &seconds) in windows.iter().enumerate() {
                columns.push((
                    format!("switch_ratio_{clf}_{seconds}"),
                    float_column_cells(&switches, w),
                ));
            }
            let durations = rolling::consecutive_run_duration(labels, fps)?;
            columns.push((format!("bout_duration_s_{clf}"), float_cells(&durations)));
        }

        let out_path = self
            .config
            .project
            .output_dir
            .join(format!("{}_features.csv", video.video));
        write_columns_csv(&out_path, table.len(), &columns)?;
        info!(
            "Wrote {} feature columns for '{}' to {}",
            columns.len(),
            video.video,
            out_path.display()
        );
        Ok(out_path)
    }

    /// Compute rolling and mean velocity for every data file.
    ///
    /// # Errors
    ///
    /// Returns an error on the first file that cannot be processed.
    pub fn run_velocity(&self) -> Result<()> {
        let started = Instant::now();
        let files = self.data_files()?;
        info!("Computing velocities for {} file(s)", files.len());

        let body_part = &self.config.animals[0].body_part;
        let mut reports = Vec::with_capacity(files.len());
        for path in &files {
            let (table, video) = self.load_table(path)?;
            let points = table.body_part_points(body_part)?;
            let report = velocity::analyze(&video.video, &points, video.pixels_per_mm, video.fps)?;

            let rolling_path = self
                .config
                .project
                .output_dir
                .join(format!("{}_rolling_velocity.csv", video.video));
            velocity::write_rolling_csv(&report, &rolling_path)?;
            info!(
                "'{}': mean velocity {:.4} cm/s, rolling series in {}",
                video.video,
                report.mean_cm_s,
                rolling_path.display()
            );
            reports.push(report);
        }

        let summary_path = self.config.project.output_dir.join("mean_velocities.csv");
        velocity::write_mean_summary(&reports, &summary_path)?;
        info!(
            "Velocity summary for {} video(s) in {}, finished in {:.2} s",
            reports.len(),
            summary_path.display(),
            started.elapsed().as_secs_f64()
        );
        Ok(())
    }

    /// Run spontaneous-alternation analysis over every data file and write
    /// one summary row per video.
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than two regions are configured or any
    /// file fails validation.
    pub fn run_alternations(&self) -> Result<()> {
        let regions = &self.config.sequence.regions;
        if regions.len() < 2 {
            return Err(Error::ConfigError(format!(
                "alternation analysis needs at least two regions, {} configured",
                regions.len()
            )));
        }

        let files = self.data_files()?;
        info!(
            "Analyzing alternations over {} region(s) for {} file(s)",
            regions.len(),
            files.len()
        );

        let mut rows = Vec::with_capacity(files.len());
        for path in &files {
            let (table, video) = self.load_table(path)?;
            let occupancy = table.occupancy(regions)?;
            let result = sequence::spontaneous_alternations(&occupancy, regions)?;
            info!(
                "'{}': {} alternation(s), {:.1}% of windows, {} error(s)",
                video.video, result.alternation_cnt, result.pct_alternation, result.error_cnt
            );
            rows.push(vec![
                video.video.clone(),
                result.alternation_cnt.to_string(),
                result.pct_alternation.to_string(),
                result.error_cnt.to_string(),
                result.same_arm_returns_cnt.to_string(),
                result.alternate_arm_returns_cnt.to_string(),
            ]);
        }

        let out_path = self
            .config
            .project
            .output_dir
            .join("alternation_summary.csv");
        let mut writer = csv::Writer::from_path(&out_path)?;
        writer.write_record([
            "video",
            "alternation_cnt",
            "pct_alternation",
            "error_cnt",
            "same_arm_returns_cnt",
            "alternate_arm_returns_cnt",
        ])?;
        for row in &rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        info!("Alternation summary in {}", out_path.display());
        Ok(())
    }

    /// Find revisited coordinates for every data file.
    ///
    /// # Errors
    ///
    /// Returns an error on the first file that cannot be processed.
    pub fn run_loops(&self) -> Result<()> {
        let files = self.data_files()?;
        info!("Searching path loops in {} file(s)", files.len());

        let body_part = &self.config.animals[0].body_part;
        for path in &files {
            let (table, video) = self.load_table(path)?;
            let points = table.body_part_points(body_part)?;
            let pixels: Vec<(i32, i32)> = points.iter().map(|p| p.to_pixel()).collect();
            let loops = sequence::find_path_loops(&pixels);

            let mut coords: Vec<(i32, i32)> = loops.keys().copied().collect();
            coords.sort_unstable();

            let out_path = self
                .config
                .project
                .output_dir
                .join(format!("{}_loops.csv", video.video));
            let mut writer = csv::Writer::from_path(&out_path)?;
            writer.write_record(["x", "y", "frames"])?;
            for coord in &coords {
                let frames = loops[coord]
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(";");
                writer.write_record([coord.0.to_string(), coord.1.to_string(), frames])?;
            }
            writer.flush()?;
            info!(
                "'{}': {} revisited coordinate(s) in {}",
                video.video,
                coords.len(),
                out_path.display()
            );
        }
        Ok(())
    }

    /// Render path plots for every data file. A failed video is logged and
    /// skipped; the batch keeps going.
    ///
    /// # Errors
    ///
    /// Returns an error if the output selection is empty or the file list
    /// cannot be resolved.
    pub fn run_path_plots(&self, cores: usize) -> Result<()> {
        let started = Instant::now();
        let plot = &self.config.path_plot;
        let output = PathPlotOutput {
            video: plot.video,
            frames: plot.frames,
            last_frame: plot.last_frame,
        };
        output.validate()?;

        let files = self.data_files()?;
        info!(
            "Rendering path plots for {} file(s) on {} core(s)",
            files.len(),
            cores.max(1)
        );

        let mut failures = 0_usize;
        for path in &files {
            match self.render_path_plot(path, output, cores) {
                Ok(rendered) => log_render(&rendered),
                Err(e) => {
                    error!("Path plot failed for {}: {e}", path.display());
                    failures += 1;
                }
            }
        }

        if failures > 0 {
            warn!("{failures} of {} path plot(s) failed", files.len());
        }
        info!(
            "Path plotting finished in {:.2} s",
            started.elapsed().as_secs_f64()
        );
        Ok(())
    }

    fn render_path_plot(
        &self,
        path: &Path,
        output: PathPlotOutput,
        cores: usize,
    ) -> Result<RenderOutput> {
        let (table, video) = self.load_table(path)?;
        let style = plotting::resolve_style(&self.config.path_plot.style, video)?;

        let mut animals = Vec::with_capacity(self.config.animals.len());
        for animal in &self.config.animals {
            animals.push(AnimalTrack {
                name: animal.name.clone(),
                color: named_color(&animal.color)?,
                points: table.body_part_points(&animal.body_part)?,
            });
        }

        // Overlay markers follow the first animal's body part
        let marker_points = &animals[0].points;
        let mut overlays = Vec::with_capacity(self.config.path_plot.clf_overlays.len());
        for overlay in &self.config.path_plot.clf_overlays {
            let labels = table.column(&overlay.column)?;
            let fired = labels.iter().map(|&v| v != 0.0).collect();
            overlays.push(ClfOverlay::new(
                overlay.column.clone(),
                named_color(&overlay.color)?,
                overlay.size.unwrap_or(style.circle_size),
                marker_points.clone(),
                fired,
            )?);
        }

        let output_dir = self.config.project.output_dir.clone();
        if cores > 1 {
            PathPlotterMp::new(
                style,
                video.clone(),
                animals,
                overlays,
                output,
                output_dir,
                cores,
            )?
            .run()
        } else {
            PathPlotter::new(style, video.clone(), animals, overlays, output, output_dir)?.run()
        }
    }

    fn load_table(&self, path: &Path) -> Result<(DataTable, &VideoInfo)> {
        let name = video_name(path)?;
        let video = self.video_info.get(name)?;
        let table = DataTable::from_csv(path)?;
        if table.is_empty() {
            return Err(Error::DataError(format!(
                "{} holds no frames",
                path.display()
            )));
        }
        info!("Loaded {} frame(s) from {}", table.len(), path.display());
        Ok((table, video))
    }
}

fn video_name(path: &Path) -> Result<&str> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| {
            Error::InvalidInput(format!("data file {} has no UTF-8 name", path.display()))
        })
}

fn named_color(name: &str) -> Result<opencv::core::Scalar> {
    plotting::color_bgr(name).ok_or_else(|| Error::ConfigError(format!("unknown color '{name}'")))
}

fn log_render(rendered: &RenderOutput) {
    if let Some(path) = &rendered.video_path {
        info!("Rendered video in {}", path.display());
    }
    if let Some(dir) = &rendered.frames_dir {
        info!("Frame images in {}", dir.display());
    }
    if let Some(path) = &rendered.last_frame_path {
        info!("Final frame in {}", path.display());
    }
}

fn float_cells(values: &[f64]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

fn int_column_cells(rows: &[Vec<i32>], column: usize) -> Vec<String> {
    rows.iter().map(|row| row[column].to_string()).collect()
}

fn float_column_cells(rows: &[Vec<f64>], column: usize) -> Vec<String> {
    rows.iter().map(|row| row[column].to_string()).collect()
}

fn write_columns_csv(path: &Path, rows: usize, columns: &[(String, Vec<String>)]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    let mut header = vec!["frame".to_string()];
    header.extend(columns.iter().map(|(name, _)| name.clone()));
    writer.write_record(&header)?;

    for row in 0..rows {
        let mut record = vec![row.to_string()];
        record.extend(columns.iter().map(|(_, cells)| cells[row].clone()));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}
