//! Deadline guard and teardown registry
//!
//! Every compositor invocation runs inside a [`DeadlineGuard`]. Resources
//! acquired while compositing are registered with a [`Teardown`] so they
//! are released on success, on error, and when the deadline expires.

use async_trait::async_trait;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, warn};

use crate::domain::recording::Duration;

use super::error::CompositeError;
use super::ports::{AudioContext, AudioContextState, EncoderSession, RecorderState, VideoSource};

/// A resource that must be released when compositing ends
#[async_trait]
pub trait Releasable: Send + Sync {
    async fn release(&self);
}

/// Shared recorder handle. Released by cancelling if still recording.
pub type SharedSession = Arc<AsyncMutex<Box<dyn EncoderSession>>>;

/// Shared video handle. Released by closing the decoder.
pub type SharedVideo = Arc<AsyncMutex<Box<dyn VideoSource>>>;

struct RecorderHandle(SharedSession);

#[async_trait]
impl Releasable for RecorderHandle {
    async fn release(&self) {
        let mut session = self.0.lock().await;
        if session.state() == RecorderState::Recording {
            debug!("Cancelling recorder");
            session.cancel().await;
        }
    }
}

struct AudioHandle(Arc<dyn AudioContext>);

#[async_trait]
impl Releasable for AudioHandle {
    async fn release(&self) {
        if self.0.state() != AudioContextState::Closed {
            debug!("Closing audio context");
            self.0.close().await;
        }
    }
}

struct VideoHandle(SharedVideo);

#[async_trait]
impl Releasable for VideoHandle {
    async fn release(&self) {
        self.0.lock().await.close().await;
    }
}

/// Registry of resources to release when an invocation ends.
///
/// `release_all` runs at most once. Anything registered afterwards is
/// released immediately.
#[derive(Default)]
pub struct Teardown {
    released: AtomicBool,
    handles: Mutex<Vec<Arc<dyn Releasable>>>,
}

impl Teardown {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, handle: Arc<dyn Releasable>) {
        if self.is_released() {
            handle.release().await;
            return;
        }
        self.lock().push(handle);
    }

    pub async fn register_recorder(&self, session: SharedSession) {
        self.register(Arc::new(RecorderHandle(session))).await;
    }

    pub async fn register_audio(&self, context: Arc<dyn AudioContext>) {
        self.register(Arc::new(AudioHandle(context))).await;
    }

    pub async fn register_video(&self, video: SharedVideo) {
        self.register(Arc::new(VideoHandle(video))).await;
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Release every registered resource, last registered first
    pub async fn release_all(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        let handles = std::mem::take(&mut *self.lock());
        debug!(count = handles.len(), "Releasing compositor resources");
        for handle in handles.into_iter().rev() {
            handle.release().await;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Arc<dyn Releasable>>> {
        self.handles.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Races a compositing future against a deadline
#[derive(Debug, Clone, Copy)]
pub struct DeadlineGuard {
    deadline: Duration,
}

impl DeadlineGuard {
    pub fn new(deadline: Duration) -> Self {
        Self { deadline }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Run `work` to completion or until the deadline, whichever comes
    /// first. The teardown runs on every exit path; on expiry `work` is
    /// dropped before teardown starts.
    pub async fn run<T, F>(&self, teardown: &Teardown, work: F) -> Result<T, CompositeError>
    where
        F: Future<Output = Result<T, CompositeError>>,
    {
        let outcome = tokio::time::timeout(self.deadline.as_std(), work).await;
        teardown.release_all().await;

        match outcome {
            Ok(result) => result,
            Err(_) => {
                warn!(deadline = %self.deadline, "Compositing timed out");
                Err(CompositeError::Timeout(self.deadline))
            }
        }
    }
}
