//! Stitch frames use case: image sequence plus optional narration

use std::sync::Arc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::domain::composition::{CompositionPlan, Dimensions, SlideSchedule};
use crate::domain::media::{AudioTrack, Canvas};
use crate::domain::output::{CompositeAsset, ObjectUrlRegistry};
use crate::domain::recording::Duration;

use super::error::CompositeError;
use super::guard::{DeadlineGuard, Teardown};
use super::multiplexer::StreamMultiplexer;
use super::pipeline::RecordingPipeline;
use super::ports::{
    AudioContextFactory, AudioPreparer, AudioRouting, LoadedImage, MediaEncoder, MediaLoader,
};

/// Input parameters for the stitch use case
#[derive(Debug, Clone)]
pub struct StitchRequest {
    /// Image URLs, in display order
    pub images: Vec<String>,
    /// Optional narration URL
    pub audio_url: Option<String>,
    /// Display time per image when there is no narration
    pub per_image_duration: Duration,
    /// Output size; defaults to the first image's natural size
    pub target: Option<Dimensions>,
}

impl StitchRequest {
    pub fn new(images: Vec<String>) -> Self {
        Self {
            images,
            audio_url: None,
            per_image_duration: Duration::default_image_duration(),
            target: None,
        }
    }
}

/// Settings shared by the compositor use cases
#[derive(Debug, Clone, Copy)]
pub struct CompositorOptions {
    pub deadline: Duration,
    pub monitor_audio: bool,
}

impl Default for CompositorOptions {
    fn default() -> Self {
        Self {
            deadline: Duration::default_stitch_timeout(),
            monitor_audio: false,
        }
    }
}

/// Composites still images and narration into one video
pub struct StitchFramesUseCase<L, A, E, F>
where
    L: MediaLoader + 'static,
    A: AudioPreparer,
    E: MediaEncoder,
    F: AudioContextFactory,
{
    loader: Arc<L>,
    preparer: A,
    multiplexer: StreamMultiplexer<E>,
    audio_contexts: F,
    registry: ObjectUrlRegistry,
    options: CompositorOptions,
}

impl<L, A, E, F> StitchFramesUseCase<L, A, E, F>
where
    L: MediaLoader + 'static,
    A: AudioPreparer,
    E: MediaEncoder,
    F: AudioContextFactory,
{
    /// Create a new use case instance
    pub fn new(
        loader: L,
        preparer: A,
        multiplexer: StreamMultiplexer<E>,
        audio_contexts: F,
        registry: ObjectUrlRegistry,
        options: CompositorOptions,
    ) -> Self {
        Self {
            loader: Arc::new(loader),
            preparer,
            multiplexer,
            audio_contexts,
            registry,
            options,
        }
    }

    /// Execute the stitch workflow under the configured deadline
    pub async fn execute(&self, request: StitchRequest) -> Result<CompositeAsset, CompositeError> {
        if request.images.is_empty() {
            return Err(CompositeError::InvalidInput(
                "at least one image is required".to_string(),
            ));
        }

        let teardown = Teardown::new();
        let guard = DeadlineGuard::new(self.options.deadline);
        guard.run(&teardown, self.stitch(request, &teardown)).await
    }

    async fn stitch(
        &self,
        request: StitchRequest,
        teardown: &Teardown,
    ) -> Result<CompositeAsset, CompositeError> {
        info!(
            images = request.images.len(),
            audio = request.audio_url.is_some(),
            "Stitching frames"
        );

        let (images, audio) = tokio::join!(
            self.load_images(&request.images),
            self.prepare_audio(request.audio_url.as_deref())
        );
        let images = images?;

        let first = images[0].source().dimensions();
        let target = request.target.unwrap_or(first).to_even();
        let plan =
            CompositionPlan::for_sources(target, images.iter().map(|i| i.source().dimensions()));
        let schedule = SlideSchedule::new(
            images.len(),
            request.per_image_duration,
            audio.as_ref().map(|a| a.duration_secs()),
        );
        debug!(
            target = %target,
            total_secs = schedule.total().as_secs_f64(),
            "Composition planned"
        );

        let stream = self.multiplexer.combine(target, audio.clone()).await?;

        let audio_context = match &audio {
            Some(_) => {
                let context = self.audio_contexts.create();
                teardown.register_audio(Arc::clone(&context)).await;
                context.resume().await?;
                Some(context)
            }
            None => None,
        };

        let recorder = Arc::new(tokio::sync::Mutex::new(
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
            if let (Some(context), Some(track)) = (&audio_context, &audio) {
                let routing = AudioRouting {
                    monitor: self.options.monitor_audio,
                };
                context.play(Arc::clone(track), routing).await?;
            }
            let clock = Instant::now();
            pipeline.run_slides(&images, &plan, &schedule, clock).await
        }
        .await;

        if let Err(e) = run {
            pipeline.fail();
            return Err(e);
        }

        pipeline.finish(&self.registry).await
    }

    /// Load every image concurrently, preserving input order. The lowest
    /// failing index is reported.
    async fn load_images(&self, urls: &[String]) -> Result<Vec<LoadedImage>, CompositeError> {
        let mut tasks = JoinSet::new();
        for (index, url) in urls.iter().enumerate() {
            let loader = Arc::clone(&self.loader);
            let url = url.clone();
            tasks.spawn(async move {
                let result = loader.load_image(&url).await;
                (index, url, result)
            });
        }

        let mut loaded: Vec<Option<LoadedImage>> = vec![None; urls.len()];
        let mut failure: Option<(usize, CompositeError)> = None;
        while let Some(joined) = tasks.join_next().await {
            let (index, url, result) = match joined {
                Ok(done) => done,
                Err(e) => std::panic::resume_unwind(e.into_panic()),
            };
            match result {
                Ok(image) => {
                    debug!(
                        index,
                        url = %url,
                        dimensions = %image.source().dimensions(),
                        "Image loaded"
                    );
                    loaded[index] = Some(image);
                }
                Err(e) => {
                    if failure.as_ref().map_or(true, |(i, _)| index < *i) {
                        failure = Some((index, CompositeError::from_load(index, &url, e)));
                    }
                }
            }
        }

        if let Some((_, error)) = failure {
            return Err(error);
        }
        Ok(loaded.into_iter().flatten().collect())
    }

    /// Decode the narration. Failures are logged and the video continues
    /// silent.
    async fn prepare_audio(&self, url: Option<&str>) -> Option<Arc<AudioTrack>> {
        let url = url?;
        match self.preparer.prepare(url).await {
            Ok(track) if !track.is_empty() => {
                debug!(secs = track.duration_secs(), "Narration decoded");
                Some(Arc::new(track))
            }
            Ok(_) => {
                warn!(url, "Narration is empty, continuing without audio");
                None
            }
            Err(e) => {
                warn!(url, error = %e, "Narration unavailable, continuing without audio");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{
        AudioContext, AudioContextState, AudioPrepError, EncoderError, EncoderSession,
        MediaLoadError, PlaybackError, RecorderState, VideoSource,
    };
    use crate::domain::media::{MediaKind, MediaOrigin, MediaSource};
    use crate::domain::output::{EncodingFormat, OutputStream};
    use crate::domain::composition::FrameRate;
    use async_trait::async_trait;
    use image::{Rgba, RgbaImage};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const GREEN: [u8; 4] = [0, 255, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];

    /// Serves solid images named after their color
    #[derive(Default)]
    struct MockLoader {
        loads: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl MediaLoader for MockLoader {
        async fn load_image(&self, url: &str) -> Result<LoadedImage, MediaLoadError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            let color = match url {
                "red.png" => RED,
                "green.png" => GREEN,
                "blue.png" => BLUE,
                _ => return Err(MediaLoadError::Status { status: 404 }),
            };
            let dims = Dimensions::new(8, 6).unwrap();
            let source = MediaSource::new(MediaOrigin::File(url.into()), dims, MediaKind::Image);
            Ok(LoadedImage::new(source, RgbaImage::from_pixel(8, 6, Rgba(color))))
        }

        async fn open_video(&self, url: &str) -> Result<Box<dyn VideoSource>, MediaLoadError> {
            Err(MediaLoadError::InvalidUrl(url.to_string()))
        }
    }

    struct MockPreparer {
        secs: Option<f64>,
    }

    #[async_trait]
    impl AudioPreparer for MockPreparer {
        async fn prepare(&self, _url: &str) -> Result<AudioTrack, AudioPrepError> {
            match self.secs {
                Some(secs) => Ok(AudioTrack::silence(secs, 1, 8_000)),
                None => Err(AudioPrepError::Decode("not audio".into())),
            }
        }
    }

    struct SpyContext {
        state: Mutex<AudioContextState>,
        played: AtomicUsize,
    }

    #[async_trait]
    impl AudioContext for SpyContext {
        fn state(&self) -> AudioContextState {
            *self.state.lock().unwrap()
        }
        async fn resume(&self) -> Result<(), PlaybackError> {
            *self.state.lock().unwrap() = AudioContextState::Running;
            Ok(())
        }
        async fn play(
            &self,
            _track: Arc<AudioTrack>,
            _routing: AudioRouting,
        ) -> Result<(), PlaybackError> {
            self.played.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        async fn close(&self) {
            *self.state.lock().unwrap() = AudioContextState::Closed;
        }
    }

    #[derive(Default, Clone)]
    struct SpyContexts {
        created: Arc<Mutex<Vec<Arc<SpyContext>>>>,
    }

    impl AudioContextFactory for SpyContexts {
        fn create(&self) -> Arc<dyn AudioContext> {
            let context = Arc::new(SpyContext {
                state: Mutex::new(AudioContextState::Suspended),
                played: AtomicUsize::new(0),
            });
            self.created.lock().unwrap().push(Arc::clone(&context));
            context
        }
    }

    /// Records the top-left pixel of every frame; one chunk per frame
    #[derive(Default, Clone)]
    struct FakeEncoder {
        frames: Arc<Mutex<Vec<[u8; 4]>>>,
        state: Arc<Mutex<Option<RecorderState>>>,
        sessions: Arc<AtomicUsize>,
        dimensions: Arc<Mutex<Option<Dimensions>>>,
    }

    struct FakeSession {
        encoder: FakeEncoder,
        pending: Vec<Vec<u8>>,
    }

    impl FakeSession {
        fn set_state(&self, state: RecorderState) {
            *self.encoder.state.lock().unwrap() = Some(state);
        }
    }

    #[async_trait]
    impl EncoderSession for FakeSession {
        fn state(&self) -> RecorderState {
            self.encoder.state.lock().unwrap().unwrap_or(RecorderState::Inactive)
        }
        async fn push_frame(&mut self, rgba: &[u8]) -> Result<(), EncoderError> {
            self.encoder
                .frames
                .lock()
                .unwrap()
                .push([rgba[0], rgba[1], rgba[2], rgba[3]]);
            self.pending.push(vec![0xAB]);
            Ok(())
        }
        fn take_available(&mut self) -> Vec<Vec<u8>> {
            std::mem::take(&mut self.pending)
        }
        async fn stop(&mut self) -> Result<Vec<Vec<u8>>, EncoderError> {
            self.set_state(RecorderState::Stopped);
            Ok(vec![vec![0xCD]])
        }
        async fn cancel(&mut self) {
            self.set_state(RecorderState::Inactive);
        }
    }

    #[async_trait]
    impl MediaEncoder for FakeEncoder {
        async fn is_type_supported(&self, _encoding: &EncodingFormat) -> bool {
            true
        }
        async fn start(
            &self,
            stream: &OutputStream,
        ) -> Result<Box<dyn EncoderSession>, EncoderError> {
            self.sessions.fetch_add(1, Ordering::SeqCst);
            *self.dimensions.lock().unwrap() = Some(stream.video().dimensions);
            let session = FakeSession {
                encoder: self.clone(),
                pending: Vec::new(),
            };
            session.set_state(RecorderState::Recording);
            Ok(Box::new(session))
        }
    }

    struct Harness {
        use_case: StitchFramesUseCase<MockLoader, MockPreparer, FakeEncoder, SpyContexts>,
        loads: Arc<AtomicUsize>,
        encoder: FakeEncoder,
        contexts: SpyContexts,
        registry: ObjectUrlRegistry,
    }

    fn harness(audio_secs: Option<f64>, deadline: Duration) -> Harness {
        let loader = MockLoader::default();
        let loads = Arc::clone(&loader.loads);
        let encoder = FakeEncoder::default();
        let contexts = SpyContexts::default();
        let registry = ObjectUrlRegistry::new();
        let use_case = StitchFramesUseCase::new(
            loader,
            MockPreparer { secs: audio_secs },
            StreamMultiplexer::new(
                encoder.clone(),
                EncodingFormat::DEFAULT_PREFERENCES.to_vec(),
                FrameRate::new(30),
            ),
            contexts.clone(),
            registry.clone(),
            CompositorOptions {
                deadline,
                monitor_audio: false,
            },
        );
        Harness {
            use_case,
            loads,
            encoder,
            contexts,
            registry,
        }
    }

    fn request(images: &[&str], audio: Option<&str>, per_image: Duration) -> StitchRequest {
        StitchRequest {
            images: images.iter().map(|s| s.to_string()).collect(),
            audio_url: audio.map(str::to_string),
            per_image_duration: per_image,
            target: None,
        }
    }

    #[tokio::test]
    async fn empty_input_is_rejected_without_loading() {
        let h = harness(None, Duration::from_secs(30));

        let err = h
            .use_case
            .execute(StitchRequest::new(Vec::new()))
            .await
            .unwrap_err();

        assert!(matches!(err, CompositeError::InvalidInput(_)));
        assert_eq!(h.loads.load(Ordering::SeqCst), 0);
        assert_eq!(h.encoder.sessions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn audio_duration_overrides_per_image_duration() {
        let h = harness(Some(2.0), Duration::from_secs(30));

        let asset = h
            .use_case
            .execute(request(&["red.png", "blue.png"], Some("voice.mp3"), Duration::from_secs(5)))
            .await
            .unwrap();

        let frames = h.encoder.frames.lock().unwrap();
        assert_eq!(frames.len(), 60);
        assert!(frames[..30].iter().all(|p| *p == RED));
        assert!(frames[30..].iter().all(|p| *p == BLUE));
        assert_eq!(asset.size_bytes(), 61);
        assert!(h.registry.resolve(asset.url()).is_some());

        let contexts = h.contexts.created.lock().unwrap();
        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0].played.load(Ordering::SeqCst), 1);
        assert_eq!(contexts[0].state(), AudioContextState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn audio_failure_continues_silent() {
        let h = harness(None, Duration::from_secs(30));

        let asset = h
            .use_case
            .execute(request(&["green.png"], Some("broken.mp3"), Duration::from_secs(1)))
            .await
            .unwrap();

        assert_eq!(h.encoder.frames.lock().unwrap().len(), 30);
        assert!(h.contexts.created.lock().unwrap().is_empty());
        assert_eq!(asset.encoding(), EncodingFormat::WEBM_VP9_OPUS);
    }

    #[tokio::test(start_paused = true)]
    async fn first_image_sets_canvas_size() {
        let h = harness(None, Duration::from_secs(30));

        h.use_case
            .execute(request(&["blue.png"], None, Duration::from_millis(100)))
            .await
            .unwrap();

        assert_eq!(
            *h.encoder.dimensions.lock().unwrap(),
            Some(Dimensions::new(8, 6).unwrap())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn single_image_without_audio_uses_default_duration() {
        let h = harness(None, Duration::from_secs(30));

        h.use_case
            .execute(StitchRequest::new(vec!["red.png".into()]))
            .await
            .unwrap();

        assert_eq!(h.encoder.frames.lock().unwrap().len(), 150);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_image_names_its_index() {
        let h = harness(None, Duration::from_secs(30));

        let err = h
            .use_case
            .execute(request(
                &["red.png", "missing.png", "gone.png"],
                None,
                Duration::from_secs(1),
            ))
            .await
            .unwrap_err();

        match err {
            CompositeError::MediaLoad { index, url, .. } => {
                assert_eq!(index, 1);
                assert_eq!(url, "missing.png");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(h.encoder.sessions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_tears_everything_down() {
        let h = harness(Some(9.0), Duration::from_secs(2));

        let err = h
            .use_case
            .execute(request(
                &["red.png", "green.png", "blue.png"],
                Some("voice.mp3"),
                Duration::from_secs(5),
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, CompositeError::Timeout(d) if d.as_secs() == 2));
        let contexts = h.contexts.created.lock().unwrap();
        assert_eq!(contexts[0].state(), AudioContextState::Closed);
        assert_eq!(
            *h.encoder.state.lock().unwrap(),
            Some(RecorderState::Inactive)
        );
        assert!(h.registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_target_is_normalized_to_even() {
        let h = harness(None, Duration::from_secs(30));
        let mut req = request(&["red.png"], None, Duration::from_millis(100));
        req.target = Some(Dimensions::new(33, 65).unwrap());

        h.use_case.execute(req).await.unwrap();

        assert_eq!(
            *h.encoder.dimensions.lock().unwrap(),
            Some(Dimensions::new(32, 64).unwrap())
        );
        assert_eq!(h.encoder.frames.lock().unwrap().len(), 3);
    }
}
