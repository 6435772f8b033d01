//! Crop video use case: re-frame a video to a new aspect ratio

use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info};

use crate::domain::composition::{cover_fit, Dimensions};
use crate::domain::media::Canvas;
use crate::domain::output::{CompositeAsset, ObjectUrlRegistry};

use super::error::CompositeError;
use super::guard::{DeadlineGuard, SharedVideo, Teardown};
use super::multiplexer::StreamMultiplexer;
use super::pipeline::RecordingPipeline;
use super::ports::{MediaEncoder, MediaLoader};
use super::stitch::CompositorOptions;

/// Input parameters for the crop use case
#[derive(Debug, Clone)]
pub struct CropRequest {
    pub source_url: String,
    pub target: Dimensions,
}

/// Re-records a video through a cover-fit crop. The output is video only.
pub struct CropVideoUseCase<L, E>
where
    L: MediaLoader,
    E: MediaEncoder,
{
    loader: L,
    multiplexer: StreamMultiplexer<E>,
    registry: ObjectUrlRegistry,
    options: CompositorOptions,
}

impl<L, E> CropVideoUseCase<L, E>
where
    L: MediaLoader,
    E: MediaEncoder,
{
    /// Create a new use case instance
    pub fn new(
        loader: L,
        multiplexer: StreamMultiplexer<E>,
        registry: ObjectUrlRegistry,
        options: CompositorOptions,
    ) -> Self {
        Self {
            loader,
            multiplexer,
            registry,
            options,
        }
    }

    /// Execute the crop workflow under the configured deadline
    pub async fn execute(&self, request: CropRequest) -> Result<CompositeAsset, CompositeError> {
        if request.source_url.trim().is_empty() {
            return Err(CompositeError::InvalidInput(
                "a source video is required".to_string(),
            ));
        }

        let teardown = Teardown::new();
        let guard = DeadlineGuard::new(self.options.deadline);
        guard.run(&teardown, self.crop(request, &teardown)).await
    }

    async fn crop(
        &self,
        request: CropRequest,
        teardown: &Teardown,
    ) -> Result<CompositeAsset, CompositeError> {
        info!(source = %request.source_url, target = %request.target, "Cropping video");

        let video = self
            .loader
            .open_video(&request.source_url)
            .await
            .map_err(|e| CompositeError::from_load(0, &request.source_url, e))?;
        let natural = video.source().dimensions();
        let video: SharedVideo = Arc::new(AsyncMutex::new(video));
        teardown.register_video(Arc::clone(&video)).await;

        let target = request.target.to_even();
        let placement = cover_fit(natural, target);
        debug!(
            natural = %natural,
            scale = placement.scale,
            offset_x = placement.offset_x,
            offset_y = placement.offset_y,
            "Crop planned"
        );

        let stream = self.multiplexer.combine(target, None).await?;
        let recorder = Arc::new(AsyncMutex::new(
            self.multiplexer.start_recording(&stream).await?,
        ));
        teardown.register_recorder(Arc::clone(&recorder)).await;

        let mut pipeline = RecordingPipeline::new(
            stream.encoding(),
            recorder,
            Canvas::new(target),
            self.multiplexer.frame_rate(),
        );
        pipeline.start()?;

        let run = async {
            video.lock().await.play().await?;
            pipeline.run_video(&video, &placement).await
        }
        .await;

        if let Err(e) = run {
            pipeline.fail();
            return Err(e);
        }

        pipeline.finish(&self.registry).await
    }
}
