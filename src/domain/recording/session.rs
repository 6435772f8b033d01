//! Recording session state machine

use std::fmt;
use thiserror::Error;

use crate::domain::output::EncodingFormat;

/// Recording session states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Recording,
    Stopped,
    Failed,
}

impl SessionState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid state transition: cannot {action} while in {current_state} state")]
pub struct InvalidStateTransition {
    pub current_state: SessionState,
    pub action: String,
}

/// State of one in-progress capture.
///
/// State machine:
///   IDLE -> RECORDING (start)
///   RECORDING -> STOPPED (stop)
///   IDLE | RECORDING | STOPPED -> FAILED (fail)
///
/// Encoded chunks are accepted only while recording and are concatenated
/// into the final payload exactly once, after the session stopped.
#[derive(Debug)]
pub struct RecordingSession {
    state: SessionState,
    encoding: EncodingFormat,
    chunks: Vec<Vec<u8>>,
    payload_taken: bool,
}

impl RecordingSession {
    /// Create a new session in idle state
    pub fn new(encoding: EncodingFormat) -> Self {
        Self {
            state: SessionState::Idle,
            encoding,
            chunks: Vec::new(),
            payload_taken: false,
        }
    }

    /// Get the current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Encoding chosen for this session
    pub fn encoding(&self) -> EncodingFormat {
        self.encoding
    }

    /// Number of chunks collected so far
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_recording(&self) -> bool {
        self.state == SessionState::Recording
    }

    /// Transition from IDLE to RECORDING
    pub fn start(&mut self) -> Result<(), InvalidStateTransition> {
        if self.state != SessionState::Idle {
            return Err(self.invalid("start recording"));
        }
        self.state = SessionState::Recording;
        Ok(())
    }

    /// Append an encoded chunk in arrival order. Empty chunks are dropped.
    pub fn push_chunk(&mut self, chunk: Vec<u8>) -> Result<(), InvalidStateTransition> {
        if self.state != SessionState::Recording {
            return Err(self.invalid("collect data"));
        }
        if !chunk.is_empty() {
            self.chunks.push(chunk);
        }
        Ok(())
    }

    /// Transition from RECORDING to STOPPED
    pub fn stop(&mut self) -> Result<(), InvalidStateTransition> {
        if self.state != SessionState::Recording {
            return Err(self.invalid("stop recording"));
        }
        self.state = SessionState::Stopped;
        Ok(())
    }

    /// Transition to the terminal FAILED state
    pub fn fail(&mut self) -> Result<(), InvalidStateTransition> {
        if self.state == SessionState::Failed {
            return Err(self.invalid("fail"));
        }
        self.state = SessionState::Failed;
        self.chunks.clear();
        Ok(())
    }

    /// Concatenate the collected chunks into the final payload.
    /// Only valid once, after the session stopped.
    pub fn take_payload(&mut self) -> Result<Vec<u8>, InvalidStateTransition> {
        if self.state != SessionState::Stopped || self.payload_taken {
            return Err(self.invalid("assemble payload"));
        }
        self.payload_taken = true;
        Ok(std::mem::take(&mut self.chunks).concat())
    }

    fn invalid(&self, action: &str) -> InvalidStateTransition {
        InvalidStateTransition {
            current_state: self.state,
            action: action.to_string(),
        }
    }
}
