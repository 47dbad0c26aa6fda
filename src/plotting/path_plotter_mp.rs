//! Chunked path-plot renderer.
//!
//! The frame range is split into contiguous chunks, each chunk carries its
//! own materialized history windows, and a worker pool renders chunks in
//! parallel. Workers write frame images straight to the shared frames
//! directory under their global frame index; video segments land in a
//! temporary directory and are stitched back together in chunk order, so
//! the result is frame-for-frame identical to the sequential renderer.

use super::path_plotter::{check_tracks, write_image};
use super::{
    draw_path_frame, expand_frame_windows, open_writer, partition_frames, AnimalTrack, ClfOverlay,
    FrameChunk, FrameWindow, PathPlotOutput, PathStyle, RenderOutput,
};
use crate::video_info::VideoInfo;
use crate::{Error, Result};
use opencv::{
    core::{Mat, Size},
    prelude::*,
    videoio::{self, VideoCapture, VideoWriter},
};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Multi-core renderer for one video's path plot
pub struct PathPlotterMp {
    style: PathStyle,
    video: VideoInfo,
    animals: Vec<AnimalTrack>,
    overlays: Vec<ClfOverlay>,
    output: PathPlotOutput,
    output_dir: PathBuf,
    cores: usize,
}

impl PathPlotterMp {
    /// # Errors
    ///
    /// Returns an error under the same conditions as the sequential
    /// renderer.
    pub fn new(
        style: PathStyle,
        video: VideoInfo,
        animals: Vec<AnimalTrack>,
        overlays: Vec<ClfOverlay>,
        output: PathPlotOutput,
        output_dir: PathBuf,
        cores: usize,
    ) -> Result<Self> {
        output.validate()?;
        check_tracks(&animals, &overlays)?;
        Ok(Self {
            style,
            video,
            animals,
            overlays,
            output,
            output_dir,
            cores: cores.max(1),
        })
    }

    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.animals.first().map_or(0, |animal| animal.points.len())
    }

    /// Render all chunks and assemble the requested artifacts.
    ///
    /// # Errors
    ///
    /// Returns an error if any chunk fails or an artifact cannot be
    /// written.
    pub fn run(&self) -> Result<RenderOutput> {
        fs::create_dir_all(&self.output_dir)?;
        let frames_dir = self.output_dir.join(&self.video.video);
        if self.output.frames {
            fs::create_dir_all(&frames_dir)?;
        }

        let trajectories: Vec<_> = self
            .animals
            .iter()
            .map(|animal| animal.points.clone())
            .collect();
        let windows = expand_frame_windows(&trajectories, self.style.max_lines);
        let last_window = windows.last().cloned();
        let ranges = partition_frames(windows.len(), self.cores);
        let chunks: Vec<FrameChunk> = ranges
            .into_iter()
            .enumerate()
            .map(|(chunk_idx, range)| FrameChunk {
                chunk_idx,
                windows: windows[range].to_vec(),
            })
            .collect();
        log::info!(
            "rendering {} path-plot frames for '{}' in {} chunk(s)",
            windows.len(),
            self.video.video,
            chunks.len()
        );

        let temp_dir = self.output_dir.join(format!("temp_{}", self.video.video));
        let mut video_path = None;
        if self.output.video || self.output.frames {
            if self.output.video {
                fs::create_dir_all(&temp_dir)?;
            }
            let segments = chunks
                .par_iter()
                .map(|chunk| self.render_chunk(chunk, &temp_dir, &frames_dir))
                .collect::<Result<Vec<_>>>();
            let stitched = segments.and_then(|segments| {
                if self.output.video {
                    let path = self.output_dir.join(format!("{}.mp4", self.video.video));
                    let segments: Vec<_> = segments.into_iter().flatten().collect();
                    self.concatenate_segments(&segments, &path)?;
                    Ok(Some(path))
                } else {
                    Ok(None)
                }
            });
            if self.output.video && temp_dir.exists() {
                fs::remove_dir_all(&temp_dir)?;
            }
            video_path = stitched?;
        }

        let last_frame_path = match (self.output.last_frame, last_window) {
            (true, Some(window)) => Some(self.write_last_frame(&window)?),
            _ => None,
        };

        Ok(RenderOutput {
            video_path,
            frames_dir: self.output.frames.then_some(frames_dir),
            last_frame_path,
            frames_rendered: self.frame_count(),
        })
    }

    fn render_chunk(
        &self,
        chunk: &FrameChunk,
        temp_dir: &Path,
        frames_dir: &Path,
    ) -> Result<Option<PathBuf>> {
        let segment_path = temp_dir.join(format!("{}.mp4", chunk.chunk_idx));
        let mut writer = if self.output.video {
            Some(open_writer(
                &segment_path,
                self.video.fps,
                Size::new(self.style.width, self.style.height),
            )?)
        } else {
            None
        };

        let draw_result = self.draw_chunk(chunk, writer.as_mut(), frames_dir);
        if let Some(writer) = writer.as_mut() {
            writer.release()?;
        }
        draw_result?;

        log::debug!(
            "'{}': chunk {} done ({} frames)",
            self.video.video,
            chunk.chunk_idx,
            chunk.windows.len()
        );
        Ok(self.output.video.then_some(segment_path))
    }

    fn draw_chunk(
        &self,
        chunk: &FrameChunk,
        mut writer: Option<&mut VideoWriter>,
        frames_dir: &Path,
    ) -> Result<()> {
        for window in &chunk.windows {
            let histories = window.newest_first();
            let frame = draw_path_frame(
                &self.style,
                &self.video,
                &self.animals,
                &histories,
                &self.overlays,
                window.frame_idx,
            )?;
            if let Some(writer) = writer.as_deref_mut() {
                writer.write(&frame)?;
            }
            if self.output.frames {
                write_image(&frames_dir.join(format!("{}.png", window.frame_idx)), &frame)?;
            }
        }
        Ok(())
    }

    fn concatenate_segments(&self, segments: &[PathBuf], video_path: &Path) -> Result<()> {
        let mut writer = open_writer(
            video_path,
            self.video.fps,
            Size::new(self.style.width, self.style.height),
        )?;
        let append_result = append_segments(&mut writer, segments);
        writer.release()?;
        append_result
    }

    fn write_last_frame(&self, window: &FrameWindow) -> Result<PathBuf> {
        let histories = window.newest_first();
        let frame = draw_path_frame(
            &self.style,
            &self.video,
            &self.animals,
            &histories,
            &self.overlays,
            window.frame_idx,
        )?;
        let path = self
            .output_dir
            .join(format!("{}_final_frame.png", self.video.video));
        write_image(&path, &frame)?;
        Ok(path)
    }
}

fn append_segments(writer: &mut VideoWriter, segments: &[PathBuf]) -> Result<()> {
    for segment in segments {
        let mut capture =
            VideoCapture::from_file(segment.to_string_lossy().as_ref(), videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            return Err(Error::InvalidInput(format!(
                "could not reopen video segment {}",
                segment.display()
            )));
        }
        let mut frame = Mat::default();
        while capture.read(&mut frame)? {
            if frame.empty() {
                break;
            }
            writer.write(&frame)?;
        }
        capture.release()?;
    }
    Ok(())
}
