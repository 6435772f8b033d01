//! FFmpeg-backed media encoder
//!
//! Canvas frames are piped to FFmpeg as raw RGBA on stdin. The audio track,
//! if any, is handed over as a temporary FLAC file. Encoded output is read
//! from stdout in chunks as FFmpeg produces them.

use std::collections::HashSet;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{mpsc, OnceCell};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::application::ports::{EncoderError, EncoderSession, MediaEncoder, RecorderState};
use crate::domain::output::{AudioCodec, Container, EncodingFormat, OutputStream, VideoCodec};
use crate::infrastructure::audio::encode_track;

/// Size of each read from FFmpeg's stdout
const CHUNK_SIZE: usize = 64 * 1024;

/// FFmpeg encoder name for a video codec
pub const fn video_encoder(codec: VideoCodec) -> &'static str {
    match codec {
        VideoCodec::Vp9 => "libvpx-vp9",
        VideoCodec::Vp8 => "libvpx",
        VideoCodec::H264 => "libx264",
    }
}

/// FFmpeg encoder name for an audio codec
pub const fn audio_encoder(codec: AudioCodec) -> &'static str {
    match codec {
        AudioCodec::Opus => "libopus",
        AudioCodec::Aac => "aac",
    }
}

/// Parse the encoder table printed by `ffmpeg -encoders`
fn parse_encoders(stdout: &str) -> HashSet<String> {
    stdout
        .lines()
        .skip_while(|l| !l.trim_start().starts_with("---"))
        .skip(1)
        .filter_map(|l| l.split_whitespace().nth(1))
        .map(str::to_string)
        .collect()
}

/// Build the FFmpeg command line for a stream
fn build_args(stream: &OutputStream, audio_path: Option<&Path>) -> Vec<String> {
    let video = stream.video();
    let encoding = stream.encoding();

    let mut args: Vec<String> = [
        "-hide_banner",
        "-loglevel",
        "error",
        "-f",
        "rawvideo",
        "-pix_fmt",
        "rgba",
        "-s",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    args.push(video.dimensions.to_string());
    args.push("-r".to_string());
    args.push(video.frame_rate.fps().to_string());
    args.extend(["-i".to_string(), "pipe:0".to_string()]);

    if let Some(path) = audio_path {
        args.push("-i".to_string());
        args.push(path.to_string_lossy().to_string());
        args.extend(["-map", "0:v", "-map", "1:a", "-c:a"].iter().map(|s| s.to_string()));
        args.push(audio_encoder(encoding.audio).to_string());
        args.push("-shortest".to_string());
    } else {
        args.push("-an".to_string());
    }

    args.push("-c:v".to_string());
    args.push(video_encoder(encoding.video).to_string());
    match encoding.video {
        VideoCodec::Vp9 | VideoCodec::Vp8 => {
            args.extend(
                ["-deadline", "realtime", "-cpu-used", "8", "-b:v", "2M"]
                    .iter()
                    .map(|s| s.to_string()),
            );
        }
        VideoCodec::H264 => {
            args.extend(["-preset", "veryfast"].iter().map(|s| s.to_string()));
        }
    }
    args.extend(["-pix_fmt", "yuv420p"].iter().map(|s| s.to_string()));

    match encoding.container {
        Container::Webm => args.extend(["-f", "webm"].iter().map(|s| s.to_string())),
        Container::Mp4 => args.extend(
            ["-movflags", "frag_keyframe+empty_moov+default_base_moof", "-f", "mp4"]
                .iter()
                .map(|s| s.to_string()),
        ),
    }
    args.push("pipe:1".to_string());
    args
}

/// Media encoder that drives an FFmpeg process per recording
pub struct FfmpegEncoder {
    ffmpeg: String,
    encoders: OnceCell<HashSet<String>>,
}

impl FfmpegEncoder {
    pub fn new(ffmpeg: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            encoders: OnceCell::new(),
        }
    }

    /// Encoders compiled into the FFmpeg binary, probed once
    async fn encoders(&self) -> &HashSet<String> {
        self.encoders
            .get_or_init(|| async {
                match Command::new(&self.ffmpeg)
                    .args(["-hide_banner", "-encoders"])
                    .output()
                    .await
                {
                    Ok(output) if output.status.success() => {
                        let found = parse_encoders(&String::from_utf8_lossy(&output.stdout));
                        debug!(count = found.len(), "Probed FFmpeg encoders");
                        found
                    }
                    Ok(output) => {
                        warn!(status = %output.status, "FFmpeg encoder probe failed");
                        HashSet::new()
                    }
                    Err(e) => {
                        warn!(ffmpeg = %self.ffmpeg, error = %e, "FFmpeg not available");
                        HashSet::new()
                    }
                }
            })
            .await
    }

    /// Spool the audio track to a FLAC temp file for FFmpeg's second input.
    /// Encoding runs on the blocking pool.
    async fn write_audio(stream: &OutputStream) -> Result<Option<NamedTempFile>, EncoderError> {
        let Some(track) = stream.audio().cloned() else {
            return Ok(None);
        };

        tokio::task::spawn_blocking(move || {
            let flac =
                encode_track(&track).map_err(|e| EncoderError::StartFailed(e.to_string()))?;
            let mut file = tempfile::Builder::new()
                .prefix("reelforge-")
                .suffix(".flac")
                .tempfile()
                .map_err(|e| EncoderError::StartFailed(e.to_string()))?;
            std::io::Write::write_all(&mut file, &flac)
                .map_err(|e| EncoderError::StartFailed(e.to_string()))?;
            Ok(Some(file))
        })
        .await
        .map_err(|e| EncoderError::StartFailed(format!("Task join error: {}", e)))?
    }
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl MediaEncoder for FfmpegEncoder {
    async fn is_type_supported(&self, encoding: &EncodingFormat) -> bool {
        let encoders = self.encoders().await;
        encoders.contains(video_encoder(encoding.video))
            && encoders.contains(audio_encoder(encoding.audio))
    }

    async fn start(&self, stream: &OutputStream) -> Result<Box<dyn EncoderSession>, EncoderError> {
        let audio_file = Self::write_audio(stream).await?;
        let args = build_args(stream, audio_file.as_ref().map(|f| f.path()));

        let mut child = Command::new(&self.ffmpeg)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EncoderError::Unavailable(format!("{} not found", self.ffmpeg))
                } else {
                    EncoderError::StartFailed(e.to_string())
                }
            })?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take().ok_or_else(|| {
            EncoderError::StartFailed("Failed to capture encoder output".to_string())
        })?;
        let stderr = child.stderr.take();

        let (tx, rx) = mpsc::unbounded_channel();
        let reader = tokio::spawn(async move {
            let mut stdout = stdout;
            let mut buf = vec![0u8; CHUNK_SIZE];
            loop {
                match stdout.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if tx.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        // Keep the last stderr line for error reporting
        let stderr_task = tokio::spawn(async move {
            let mut last = String::new();
            if let Some(stderr) = stderr {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if !line.trim().is_empty() {
                        last = line;
                    }
                }
            }
            last
        });

        info!(
            encoding = %stream.encoding(),
            dimensions = %stream.video().dimensions,
            tracks = stream.track_count(),
            "Encoder started"
        );

        Ok(Box::new(FfmpegSession {
            child,
            stdin,
            chunks: rx,
            reader: Some(reader),
            stderr: Some(stderr_task),
            frame_len: stream.video().dimensions.rgba_len(),
            state: RecorderState::Recording,
            _audio: audio_file,
        }))
    }
}

/// One FFmpeg encoding process
pub struct FfmpegSession {
    child: Child,
    stdin: Option<ChildStdin>,
    chunks: mpsc::UnboundedReceiver<Vec<u8>>,
    reader: Option<JoinHandle<()>>,
    stderr: Option<JoinHandle<String>>,
    frame_len: usize,
    state: RecorderState,
    _audio: Option<NamedTempFile>,
}

impl FfmpegSession {
    async fn last_error(&mut self) -> String {
        match self.stderr.take() {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        }
    }
}

#[async_trait]
impl EncoderSession for FfmpegSession {
    fn state(&self) -> RecorderState {
        self.state
    }

    async fn push_frame(&mut self, rgba: &[u8]) -> Result<(), EncoderError> {
        if self.state != RecorderState::Recording {
            return Err(EncoderError::NotRecording);
        }
        if rgba.len() != self.frame_len {
            return Err(EncoderError::WriteFailed(format!(
                "frame is {} bytes, expected {}",
                rgba.len(),
                self.frame_len
            )));
        }
        let stdin = self.stdin.as_mut().ok_or(EncoderError::NotRecording)?;
        stdin
            .write_all(rgba)
            .await
            .map_err(|e| EncoderError::WriteFailed(e.to_string()))
    }

    fn take_available(&mut self) -> Vec<Vec<u8>> {
        let mut out = Vec::new();
        while let Ok(chunk) = self.chunks.try_recv() {
            out.push(chunk);
        }
        out
    }

    async fn stop(&mut self) -> Result<Vec<Vec<u8>>, EncoderError> {
        if self.state != RecorderState::Recording {
            return Err(EncoderError::NotRecording);
        }

        // Closing stdin lets FFmpeg flush and exit
        if let Some(mut stdin) = self.stdin.take() {
            let _ = stdin.shutdown().await;
        }
        if let Some(reader) = self.reader.take() {
            let _ = reader.await;
        }
        let status = self
            .child
            .wait()
            .await
            .map_err(|e| EncoderError::Failed(e.to_string()))?;
        self.state = RecorderState::Stopped;

        if !status.success() {
            let last = self.last_error().await;
            return Err(EncoderError::Failed(if last.is_empty() {
                format!("FFmpeg exited with {}", status)
            } else {
                last
            }));
        }

        let chunks = self.take_available();
        debug!(chunks = chunks.len(), "Encoder stopped");
        Ok(chunks)
    }

    async fn cancel(&mut self) {
        if self.state != RecorderState::Recording {
            return;
        }
        self.state = RecorderState::Inactive;
        self.stdin = None;
        let _ = self.child.kill().await;
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        if let Some(stderr) = self.stderr.take() {
            stderr.abort();
        }
        self.chunks.close();
        debug!("Encoder cancelled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::composition::{Dimensions, FrameRate};
    use crate::domain::media::AudioTrack;
    use crate::domain::output::VideoTrack;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn stream(encoding: EncodingFormat, audio: bool) -> OutputStream {
        OutputStream::new(
            VideoTrack {
                dimensions: Dimensions::new(4, 2).unwrap(),
                frame_rate: FrameRate::new(30),
            },
            audio.then(|| Arc::new(AudioTrack::silence(1.0, 1, 8_000))),
            encoding,
        )
    }

    #[test]
    fn parses_encoder_table() {
        let out = concat!(
            "Encoders:\n V..... = Video\n ------\n",
            " V....D libvpx-vp9           libvpx VP9\n",
            " A....D libopus              libopus Opus\n",
        );
        let found = parse_encoders(out);
        assert!(found.contains("libvpx-vp9"));
        assert!(found.contains("libopus"));
        assert!(!found.contains("Video"));
    }

    #[test]
    fn video_only_webm_args() {
        let args = build_args(&stream(EncodingFormat::WEBM_VP9_OPUS, false), None);
        let joined = args.join(" ");
        assert!(joined.contains("-f rawvideo -pix_fmt rgba -s 4x2 -r 30 -i pipe:0"));
        assert!(joined.contains("-an"));
        assert!(joined.contains("-c:v libvpx-vp9"));
        assert!(joined.ends_with("-f webm pipe:1"));
    }

    #[test]
    fn audio_mp4_args() {
        let path = Path::new("/tmp/voice.flac");
        let args = build_args(&stream(EncodingFormat::MP4_H264_AAC, true), Some(path));
        let joined = args.join(" ");
        assert!(joined.contains("-i /tmp/voice.flac -map 0:v -map 1:a -c:a aac"));
        assert!(joined.contains("-c:v libx264"));
        assert!(joined.contains("frag_keyframe+empty_moov"));
        assert!(!joined.contains("-an"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn audio_spooling_leaves_the_runtime_free() {
        let ticked = Arc::new(AtomicBool::new(false));
        let flag = ticked.clone();
        tokio::spawn(async move { flag.store(true, Ordering::SeqCst) });

        let narrated = OutputStream::new(
            VideoTrack {
                dimensions: Dimensions::new(4, 2).unwrap(),
                frame_rate: FrameRate::new(30),
            },
            Some(Arc::new(AudioTrack::silence(30.0, 2, 48_000))),
            EncodingFormat::WEBM,
        );
        let file = FfmpegEncoder::write_audio(&narrated).await.unwrap().unwrap();

        // The spawned task only runs if spooling yielded to the scheduler
        assert!(ticked.load(Ordering::SeqCst));
        let bytes = std::fs::read(file.path()).unwrap();
        assert_eq!(&bytes[..4], b"fLaC");
    }

    #[tokio::test]
    async fn video_only_stream_spools_nothing() {
        let spooled = FfmpegEncoder::write_audio(&stream(EncodingFormat::WEBM, false))
            .await
            .unwrap();
        assert!(spooled.is_none());
    }

    #[tokio::test]
    async fn missing_binary_supports_nothing() {
        let encoder = FfmpegEncoder::new("/nonexistent/ffmpeg");
        assert!(!encoder.is_type_supported(&EncodingFormat::WEBM).await);
    }

    #[tokio::test]
    async fn missing_binary_is_unavailable() {
        let encoder = FfmpegEncoder::new("/nonexistent/ffmpeg");
        let err = encoder
            .start(&stream(EncodingFormat::WEBM, false))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, EncoderError::Unavailable(_)));
    }

    #[tokio::test]
    #[ignore = "Requires ffmpeg with libvpx"]
    async fn encodes_frames_to_webm() {
        let encoder = FfmpegEncoder::default();
        let mut session = encoder.start(&stream(EncodingFormat::WEBM, true)).await.unwrap();
        for _ in 0..30 {
            session.push_frame(&[200u8; 32]).await.unwrap();
        }
        let mut chunks = session.take_available();
        chunks.extend(session.stop().await.unwrap());
        let bytes: Vec<u8> = chunks.concat();
        // EBML magic
        assert_eq!(&bytes[..4], &[0x1a, 0x45, 0xdf, 0xa3]);
        assert_eq!(session.state(), RecorderState::Stopped);
    }
}
