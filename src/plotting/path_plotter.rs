//! Sequential path-plot renderer.
//!
//! Walks the trajectory once, holding a bounded history buffer per animal,
//! and emits whichever artifacts were requested: an mp4, numbered frame
//! images, the final frame image, or any combination.

use super::{
    draw_path_frame, open_writer, AnimalTrack, ClfOverlay, PathPlotOutput, PathStyle, RenderOutput,
};
use crate::video_info::VideoInfo;
use crate::{Error, Result};
use opencv::{
    core::{Size, Vector},
    imgcodecs,
    prelude::*,
    videoio::VideoWriter,
};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

const PROGRESS_EVERY: usize = 100;

/// Single-threaded renderer for one video's path plot
pub struct PathPlotter {
    style: PathStyle,
    video: VideoInfo,
    animals: Vec<AnimalTrack>,
    overlays: Vec<ClfOverlay>,
    output: PathPlotOutput,
    output_dir: PathBuf,
}

impl PathPlotter {
    /// # Errors
    ///
    /// Returns an error if no output is requested, no animals are given,
    /// the trajectories are empty or uneven, or an overlay does not span
    /// the trajectory.
    pub fn new(
        style: PathStyle,
        video: VideoInfo,
        animals: Vec<AnimalTrack>,
        overlays: Vec<ClfOverlay>,
        output: PathPlotOutput,
        output_dir: PathBuf,
    ) -> Result<Self> {
        output.validate()?;
        let frames = check_tracks(&animals, &overlays)?;
        log::debug!(
            "path plotter for '{}': {} frames, {} animals, {} overlays",
            video.video,
            frames,
            animals.len(),
            overlays.len()
        );
        Ok(Self {
            style,
            video,
            animals,
            overlays,
            output,
            output_dir,
        })
    }

    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.animals.first().map_or(0, |animal| animal.points.len())
    }

    /// Render every frame and write the requested artifacts.
    ///
    /// # Errors
    ///
    /// Returns an error if a frame cannot be drawn or an artifact cannot
    /// be written.
    pub fn run(&self) -> Result<RenderOutput> {
        fs::create_dir_all(&self.output_dir)?;
        let frames_dir = self.output_dir.join(&self.video.video);
        if self.output.frames {
            fs::create_dir_all(&frames_dir)?;
        }

        let video_path = self.output_dir.join(format!("{}.mp4", self.video.video));
        let mut writer = if self.output.video {
            Some(open_writer(
                &video_path,
                self.video.fps,
                Size::new(self.style.width, self.style.height),
            )?)
        } else {
            None
        };

        let run_result = self.render_frames(writer.as_mut(), &frames_dir);
        if let Some(writer) = writer.as_mut() {
            writer.release()?;
        }
        let last_frame_path = run_result?;

        log::info!(
            "rendered {} path-plot frames for '{}'",
            self.frame_count(),
            self.video.video
        );
        Ok(RenderOutput {
            video_path: self.output.video.then_some(video_path),
            frames_dir: self.output.frames.then_some(frames_dir),
            last_frame_path,
            frames_rendered: self.frame_count(),
        })
    }

    fn render_frames(
        &self,
        mut writer: Option<&mut VideoWriter>,
        frames_dir: &Path,
    ) -> Result<Option<PathBuf>> {
        let frames = self.frame_count();
        let mut buffers: Vec<VecDeque<_>> = self
            .animals
            .iter()
            .map(|_| VecDeque::with_capacity(self.style.max_lines))
            .collect();
        let mut last_frame_path = None;

        for i in 0..frames {
            for (animal, buffer) in self.animals.iter().zip(buffers.iter_mut()) {
                if buffer.len() == self.style.max_lines {
                    buffer.pop_back();
                }
                buffer.push_front(animal.points[i]);
            }
            let histories: Vec<Vec<_>> = buffers
                .iter()
                .map(|buffer| buffer.iter().copied().collect())
                .collect();

            let frame = draw_path_frame(
                &self.style,
                &self.video,
                &self.animals,
                &histories,
                &self.overlays,
                i,
            )?;

            if let Some(writer) = writer.as_deref_mut() {
                writer.write(&frame)?;
            }
            if self.output.frames {
                write_image(&frames_dir.join(format!("{i}.png")), &frame)?;
            }
            if self.output.last_frame && i == frames - 1 {
                let path = self
                    .output_dir
                    .join(format!("{}_final_frame.png", self.video.video));
                write_image(&path, &frame)?;
                last_frame_path = Some(path);
            }

            if (i + 1) % PROGRESS_EVERY == 0 {
                log::debug!("'{}': frame {}/{}", self.video.video, i + 1, frames);
            }
        }
        Ok(last_frame_path)
    }
}

pub(super) fn check_tracks(animals: &[AnimalTrack], overlays: &[ClfOverlay]) -> Result<usize> {
    let first = animals
        .first()
        .ok_or_else(|| Error::InvalidInput("no animals to plot".to_string()))?;
    let frames = first.points.len();
    if frames == 0 {
        return Err(Error::InvalidInput(format!(
            "animal '{}' has an empty trajectory",
            first.name
        )));
    }
    for animal in animals {
        if animal.points.len() != frames {
            return Err(Error::ShapeMismatch(format!(
                "animal '{}' has {} frames, expected {}",
                animal.name,
                animal.points.len(),
                frames
            )));
        }
    }
    for overlay in overlays {
        if overlay.positions.len() != frames {
            return Err(Error::ShapeMismatch(format!(
                "classifier overlay '{}' has {} frames, expected {}",
                overlay.name,
                overlay.positions.len(),
                frames
            )));
        }
    }
    Ok(frames)
}

pub(super) fn write_image(path: &Path, frame: &opencv::core::Mat) -> Result<()> {
    let written = imgcodecs::imwrite(path.to_string_lossy().as_ref(), frame, &Vector::new())?;
    if !written {
        return Err(Error::InvalidInput(format!(
            "could not write image to {}",
            path.display()
        )));
    }
    Ok(())
}
