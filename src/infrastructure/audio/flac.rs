//! FLAC encoding of decoded PCM
//!
//! Used to hand the narration track to the FFmpeg encoder and to wrap
//! raw PCM returned by speech synthesis.

use flacenc::bitsink::ByteSink;
use flacenc::component::BitRepr;
use flacenc::config;
use flacenc::error::Verify;
use flacenc::source::MemSource;

use crate::domain::media::AudioTrack;

/// Bits per sample (16-bit audio)
const BITS_PER_SAMPLE: usize = 16;

/// Encode interleaved i16 PCM to FLAC
pub fn encode_to_flac(
    pcm_samples: &[i16],
    channels: u16,
    sample_rate: u32,
) -> Result<Vec<u8>, FlacError> {
    // flacenc works on i32 samples
    let samples_i32: Vec<i32> = pcm_samples.iter().map(|&s| s as i32).collect();

    let config = config::Encoder::default()
        .into_verified()
        .map_err(|(_, e)| FlacError::Config(format!("{:?}", e)))?;

    let source = MemSource::from_samples(
        &samples_i32,
        channels.max(1) as usize,
        BITS_PER_SAMPLE,
        sample_rate as usize,
    );

    let flac_stream = flacenc::encode_with_fixed_block_size(&config, source, config.block_size)
        .map_err(|e| FlacError::Encode(format!("{:?}", e)))?;

    let mut sink = ByteSink::new();
    flac_stream
        .write(&mut sink)
        .map_err(|e| FlacError::Write(e.to_string()))?;

    Ok(sink.into_inner())
}

/// Encode a decoded track
pub fn encode_track(track: &AudioTrack) -> Result<Vec<u8>, FlacError> {
    encode_to_flac(track.samples(), track.channels(), track.sample_rate())
}

/// FLAC encoding errors
#[derive(Debug, thiserror::Error)]
pub enum FlacError {
    #[error("FLAC config error: {0}")]
    Config(String),

    #[error("FLAC encoding failed: {0}")]
    Encode(String),

    #[error("FLAC write failed: {0}")]
    Write(String),
}
