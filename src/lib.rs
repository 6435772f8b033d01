//! Reelforge - client-side video compositing for AI generated media
//!
//! This crate stitches a sequence of stills and an optional narration track
//! into a single encoded video, re-frames existing clips with a cover-fit
//! crop, and wraps the generative services (script, story, image, speech,
//! video) that produce those inputs.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Value objects, composition math, manifests, and errors
//! - **Application**: Use cases, the recording pipeline, and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (FFmpeg, rodio, Gemini, ElevenLabs, etc.)
//! - **CLI**: Command-line interface, argument parsing, and output formatting

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
