//! FFmpeg-backed video source
//!
//! The video is probed with ffprobe when opened; playback spawns an FFmpeg
//! process decoding to raw RGBA frames on stdout.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use image::RgbaImage;
use serde::Deserialize;
use tempfile::NamedTempFile;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::application::ports::{MediaLoadError, PlaybackError, VideoSource};
use crate::domain::composition::Dimensions;
use crate::domain::media::{MediaKind, MediaOrigin, MediaSource};

/// Metadata read by ffprobe. Dimensions are in display orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    #[serde(default)]
    tags: HashMap<String, String>,
    #[serde(default)]
    side_data_list: Vec<SideData>,
}

#[derive(Debug, Deserialize)]
struct SideData {
    rotation: Option<serde_json::Value>,
}

impl ProbeStream {
    /// Display-matrix rotation in degrees, falling back to the legacy tag
    fn rotation(&self) -> f64 {
        self.side_data_list
            .iter()
            .filter_map(|sd| sd.rotation.as_ref())
            .find_map(|r| r.as_f64().or_else(|| r.as_str()?.trim().parse().ok()))
            .or_else(|| self.tags.get("rotate")?.trim().parse().ok())
            .unwrap_or(0.0)
    }
}

/// Run ffprobe on a local file
pub async fn read_video_info(ffprobe: &str, path: &Path) -> Result<VideoInfo, MediaLoadError> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate:stream_tags=rotate:stream_side_data=rotation",
            "-of",
            "json",
        ])
        .arg(path)
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MediaLoadError::Probe(format!("{} not found", ffprobe))
            } else {
                MediaLoadError::Probe(e.to_string())
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MediaLoadError::Probe(
            stderr.lines().last().unwrap_or("ffprobe failed").to_string(),
        ));
    }

    parse_stream_report(&String::from_utf8_lossy(&output.stdout))
}

/// Parse ffprobe's JSON report for the first video stream
fn parse_stream_report(stdout: &str) -> Result<VideoInfo, MediaLoadError> {
    let report: ProbeOutput = serde_json::from_str(stdout)
        .map_err(|e| MediaLoadError::Probe(format!("Unexpected ffprobe output: {}", e)))?;
    let stream = report
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| MediaLoadError::Probe("No video stream".to_string()))?;

    let width = stream
        .width
        .ok_or_else(|| MediaLoadError::Probe("Invalid width".to_string()))?;
    let height = stream
        .height
        .ok_or_else(|| MediaLoadError::Probe("Invalid height".to_string()))?;

    let fps = match stream.r_frame_rate.as_deref().map(str::trim) {
        Some(rate) => match rate.split_once('/') {
            Some((num, den)) => {
                let num: f64 = num.parse().unwrap_or(0.0);
                let den: f64 = den.parse().unwrap_or(1.0);
                if den > 0.0 {
                    num / den
                } else {
                    0.0
                }
            }
            None => rate.parse().unwrap_or(0.0),
        },
        None => 0.0,
    };

    // FFmpeg autorotates on decode, so quarter turns swap the frame axes
    let quarter_turn = matches!((stream.rotation().round() as i64).rem_euclid(360), 90 | 270);
    let (width, height) = if quarter_turn {
        (height, width)
    } else {
        (width, height)
    };

    Ok(VideoInfo { width, height, fps })
}

/// Where the decoder reads from. Fetched payloads live in a temp file
/// for as long as the source is open.
enum Input {
    Path(PathBuf),
    Temp(NamedTempFile),
}

impl Input {
    fn path(&self) -> &Path {
        match self {
            Self::Path(p) => p,
            Self::Temp(t) => t.path(),
        }
    }
}

/// A probed video decoded by FFmpeg
pub struct FfmpegVideoSource {
    ffmpeg: String,
    input: Input,
    source: MediaSource,
    fps: f64,
    process: Option<Child>,
    stdout: Option<BufReader<ChildStdout>>,
    stderr: Option<JoinHandle<String>>,
    frames_read: u64,
    closed: bool,
}

impl FfmpegVideoSource {
    /// Probe a local file
    pub async fn open_path(
        ffmpeg: &str,
        ffprobe: &str,
        origin: MediaOrigin,
        path: PathBuf,
    ) -> Result<Self, MediaLoadError> {
        Self::open(ffmpeg, ffprobe, origin, Input::Path(path)).await
    }

    /// Spool fetched bytes to a temp file and probe it
    pub async fn open_bytes(
        ffmpeg: &str,
        ffprobe: &str,
        origin: MediaOrigin,
        bytes: Vec<u8>,
    ) -> Result<Self, MediaLoadError> {
        let temp = tokio::task::spawn_blocking(move || {
            let mut temp = NamedTempFile::new()?;
            std::io::Write::write_all(&mut temp, &bytes)?;
            Ok::<_, std::io::Error>(temp)
        })
        .await
        .map_err(|e| MediaLoadError::Fetch(format!("Task join error: {}", e)))?
        .map_err(|e| MediaLoadError::Fetch(e.to_string()))?;

        Self::open(ffmpeg, ffprobe, origin, Input::Temp(temp)).await
    }

    async fn open(
        ffmpeg: &str,
        ffprobe: &str,
        origin: MediaOrigin,
        input: Input,
    ) -> Result<Self, MediaLoadError> {
        let info = read_video_info(ffprobe, input.path()).await?;
        let dimensions = Dimensions::new(info.width, info.height)
            .map_err(|e| MediaLoadError::Probe(e.to_string()))?;

        info!(
            source = %origin,
            dimensions = %dimensions,
            fps = info.fps,
            "Opened video"
        );

        Ok(Self {
            ffmpeg: ffmpeg.to_string(),
            input,
            source: MediaSource::new(origin, dimensions, MediaKind::Video),
            fps: info.fps,
            process: None,
            stdout: None,
            stderr: None,
            frames_read: 0,
            closed: false,
        })
    }

    fn frame_size(&self) -> usize {
        self.source.dimensions().rgba_len()
    }

    /// Reap the decoder once its output is drained. A non-zero exit means
    /// the stream was cut short, not that the video ended.
    async fn finish(&mut self) -> Result<Option<RgbaImage>, PlaybackError> {
        let Some(mut child) = self.process.take() else {
            return Ok(None);
        };

        let status = child
            .wait()
            .await
            .map_err(|e| PlaybackError::Failed(format!("Failed to wait for decoder: {}", e)))?;
        let tail = match self.stderr.take() {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        if status.success() {
            debug!(frames = self.frames_read, "Video ended");
            return Ok(None);
        }

        warn!(frames = self.frames_read, %status, error = %tail, "Video decoder failed");
        if tail.is_empty() {
            Err(PlaybackError::Failed(format!("FFmpeg exited with {}", status)))
        } else {
            Err(PlaybackError::Failed(tail))
        }
    }
}

#[async_trait]
impl VideoSource for FfmpegVideoSource {
    fn source(&self) -> &MediaSource {
        &self.source
    }

    fn frame_rate(&self) -> f64 {
        self.fps
    }

    async fn play(&mut self) -> Result<(), PlaybackError> {
        if self.closed {
            return Err(PlaybackError::Closed);
        }
        if self.stdout.is_some() {
            return Ok(());
        }

        let dims = self.source.dimensions();
        let mut child = Command::new(&self.ffmpeg)
            .args(["-v", "error", "-i"])
            .arg(self.input.path())
            .args([
                "-an",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "-s",
                &dims.to_string(),
                "-",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PlaybackError::Rejected(format!("Failed to start decoder: {}", e)))?;

        let stdout = child.stdout.take().ok_or_else(|| {
            PlaybackError::Rejected("Failed to capture decoder output".to_string())
        })?;
        let stderr = child.stderr.take();

        self.stderr = Some(tokio::spawn(async move {
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
        }));
        self.stdout = Some(BufReader::with_capacity(self.frame_size() * 2, stdout));
        self.process = Some(child);
        debug!("Video decoder started");
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<Option<RgbaImage>, PlaybackError> {
        let frame_size = self.frame_size();
        let dims = self.source.dimensions();
        let stdout = match (&mut self.stdout, self.closed) {
            (_, true) => return Err(PlaybackError::Closed),
            (Some(stdout), false) => stdout,
            (None, false) => return Err(PlaybackError::Failed("video is not playing".to_string())),
        };

        let mut buffer = vec![0u8; frame_size];
        match stdout.read_exact(&mut buffer).await {
            Ok(_) => {
                self.frames_read += 1;
                RgbaImage::from_raw(dims.width(), dims.height(), buffer)
                    .map(Some)
                    .ok_or_else(|| PlaybackError::Failed("short frame".to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => self.finish().await,
            Err(e) => Err(PlaybackError::Failed(format!("Failed to read frame: {}", e))),
        }
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.stdout = None;
        if let Some(task) = self.stderr.take() {
            task.abort();
        }
        if let Some(mut child) = self.process.take() {
            let _ = child.kill().await;
        }
    }
}
