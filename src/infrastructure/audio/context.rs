//! Rodio audio context
//!
//! The recorded stream receives the decoded track directly from the
//! multiplexer, so a context only tracks lifecycle and, when monitoring is
//! requested, plays the track through the default output device.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, Sink};
use tracing::{debug, warn};

use crate::application::ports::{
    AudioContext, AudioContextFactory, AudioContextState, AudioRouting, PlaybackError,
};
use crate::domain::media::AudioTrack;

/// How often the monitor thread checks for a stop request
const MONITOR_POLL: Duration = Duration::from_millis(50);

/// Audio context backed by rodio
pub struct RodioAudioContext {
    state: Mutex<AudioContextState>,
    stop: Mutex<Option<Arc<AtomicBool>>>,
}

impl RodioAudioContext {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(AudioContextState::Suspended),
            stop: Mutex::new(None),
        }
    }

    fn set_state(&self, state: AudioContextState) {
        if let Ok(mut guard) = self.state.lock() {
            *guard = state;
        }
    }

    fn stop_monitor(&self) {
        if let Ok(mut guard) = self.stop.lock() {
            if let Some(flag) = guard.take() {
                flag.store(true, Ordering::SeqCst);
            }
        }
    }
}

impl Default for RodioAudioContext {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioContext for RodioAudioContext {
    fn state(&self) -> AudioContextState {
        self.state
            .lock()
            .map(|s| *s)
            .unwrap_or(AudioContextState::Closed)
    }

    async fn resume(&self) -> Result<(), PlaybackError> {
        match self.state() {
            AudioContextState::Closed => Err(PlaybackError::Closed),
            AudioContextState::Running => Ok(()),
            AudioContextState::Suspended => {
                self.set_state(AudioContextState::Running);
                debug!("Audio context running");
                Ok(())
            }
        }
    }

    async fn play(
        &self,
        track: Arc<AudioTrack>,
        routing: AudioRouting,
    ) -> Result<(), PlaybackError> {
        match self.state() {
            AudioContextState::Closed => return Err(PlaybackError::Closed),
            AudioContextState::Suspended => {
                return Err(PlaybackError::Rejected("audio context is suspended".to_string()))
            }
            AudioContextState::Running => {}
        }

        if !routing.monitor {
            return Ok(());
        }

        self.stop_monitor();
        let flag = Arc::new(AtomicBool::new(false));
        if let Ok(mut guard) = self.stop.lock() {
            *guard = Some(Arc::clone(&flag));
        }

        // Detached: the flag ends playback early, otherwise it runs to the end
        tokio::task::spawn_blocking(move || {
            if let Err(e) = monitor_sync(&track, &flag) {
                warn!(error = %e, "Audio monitor unavailable");
            }
        });
        Ok(())
    }

    async fn close(&self) {
        if self.state() == AudioContextState::Closed {
            return;
        }
        self.stop_monitor();
        self.set_state(AudioContextState::Closed);
        debug!("Audio context closed");
    }
}

/// Play a track on the default device until it ends or `stop` is set
fn monitor_sync(track: &AudioTrack, stop: &AtomicBool) -> Result<(), PlaybackError> {
    let (_stream, handle) =
        OutputStream::try_default().map_err(|e| PlaybackError::Failed(e.to_string()))?;
    let sink = Sink::try_new(&handle).map_err(|e| PlaybackError::Failed(e.to_string()))?;

    sink.append(SamplesBuffer::new(
        track.channels(),
        track.sample_rate(),
        track.samples().to_vec(),
    ));

    while !sink.empty() {
        if stop.load(Ordering::SeqCst) {
            sink.stop();
            break;
        }
        std::thread::sleep(MONITOR_POLL);
    }
    Ok(())
}

/// Creates one rodio context per compositor invocation
#[derive(Debug, Clone, Copy, Default)]
pub struct RodioAudioContextFactory;

impl AudioContextFactory for RodioAudioContextFactory {
    fn create(&self) -> Arc<dyn AudioContext> {
        Arc::new(RodioAudioContext::new())
    }
}
