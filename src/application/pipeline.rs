//! Recording pipeline: paces drawing and collects encoded chunks

use tokio::time::Instant;
use tracing::{debug, info};

use crate::domain::composition::{CompositionPlan, FrameRate, Placement, SlideSchedule};
use crate::domain::media::Canvas;
use crate::domain::output::{CompositeAsset, EncodingFormat, ObjectUrlRegistry};
use crate::domain::recording::{RecordingSession, SessionState};

use super::error::CompositeError;
use super::guard::{SharedSession, SharedVideo};
use super::ports::LoadedImage;

/// Drives one capture session from start to the assembled asset.
///
/// The canvas is owned by the pipeline; each emitted frame is a snapshot
/// of it pushed to the shared encoder session. Chunks are collected in
/// arrival order.
pub struct RecordingPipeline {
    session: RecordingSession,
    recorder: SharedSession,
    canvas: Canvas,
    frame_rate: FrameRate,
    frames_emitted: u64,
}

impl RecordingPipeline {
    pub fn new(
        encoding: EncodingFormat,
        recorder: SharedSession,
        canvas: Canvas,
        frame_rate: FrameRate,
    ) -> Self {
        Self {
            session: RecordingSession::new(encoding),
            recorder,
            canvas,
            frame_rate,
            frames_emitted: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn frames_emitted(&self) -> u64 {
        self.frames_emitted
    }

    pub fn start(&mut self) -> Result<(), CompositeError> {
        self.session.start()?;
        debug!(encoding = %self.session.encoding(), "Recording session started");
        Ok(())
    }

    /// Draw each slide for its window. `clock` is the instant audio
    /// playback started; frame deadlines are measured from it.
    pub async fn run_slides(
        &mut self,
        images: &[LoadedImage],
        plan: &CompositionPlan,
        schedule: &SlideSchedule,
        clock: Instant,
    ) -> Result<(), CompositeError> {
        let fps = self.frame_rate;

        for (index, (image, placement)) in images.iter().zip(plan.placements()).enumerate() {
            let end_frame = fps.frames_at(schedule.end_of(index));
            debug!(slide = index, end_frame, "Drawing slide");

            self.paint(image.pixels(), placement);
            while self.frames_emitted < end_frame {
                let due = (fps.frames_at(clock.elapsed()) + 1).min(end_frame);
                while self.frames_emitted < due {
                    self.emit_frame().await?;
                }
                if self.frames_emitted < end_frame {
                    tokio::time::sleep(fps.interval()).await;
                }
            }
        }
        Ok(())
    }

    /// Draw every decoded frame of a playing video through `placement`,
    /// emitting output frames against the source's media clock
    pub async fn run_video(
        &mut self,
        video: &SharedVideo,
        placement: &Placement,
    ) -> Result<(), CompositeError> {
        let fps = self.frame_rate;
        let source_fps = {
            let rate = video.lock().await.frame_rate();
            if rate.is_finite() && rate > 0.0 {
                rate
            } else {
                f64::from(fps.fps())
            }
        };

        let mut decoded: u64 = 0;
        loop {
            let frame = video.lock().await.next_frame().await?;
            let Some(frame) = frame else {
                break;
            };
            decoded += 1;
            self.paint(&frame, placement);

            let media_time = std::time::Duration::from_secs_f64(decoded as f64 / source_fps);
            let due = fps.frames_at(media_time);
            while self.frames_emitted < due {
                self.emit_frame().await?;
            }
            tokio::task::yield_now().await;
        }

        debug!(decoded, emitted = self.frames_emitted, "Video source ended");
        Ok(())
    }

    /// Stop the recorder, collect the remaining chunks and assemble the
    /// asset
    pub async fn finish(
        mut self,
        registry: &ObjectUrlRegistry,
    ) -> Result<CompositeAsset, CompositeError> {
        let remaining = self.recorder.lock().await.stop().await?;
        for chunk in remaining {
            self.session.push_chunk(chunk)?;
        }
        let chunk_count = self.session.chunk_count();
        self.session.stop()?;
        let payload = self.session.take_payload()?;

        let asset = registry.register(payload, self.session.encoding());
        info!(
            frames = self.frames_emitted,
            chunks = chunk_count,
            size = %asset.human_readable_size(),
            "Recording assembled"
        );
        Ok(asset)
    }

    /// Move the session to its terminal failed state
    pub fn fail(&mut self) {
        if self.session.fail().is_ok() {
            debug!(frames = self.frames_emitted, "Recording session failed");
        }
    }

    fn paint(&mut self, source: &image::RgbaImage, placement: &Placement) {
        self.canvas.clear();
        self.canvas.draw(source, placement);
    }

    async fn emit_frame(&mut self) -> Result<(), CompositeError> {
        let chunks = {
            let mut recorder = self.recorder.lock().await;
            recorder.push_frame(self.canvas.as_raw()).await?;
            recorder.take_available()
        };
        for chunk in chunks {
            self.session.push_chunk(chunk)?;
        }
        self.frames_emitted += 1;
        Ok(())
    }
}
