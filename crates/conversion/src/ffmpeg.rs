//! Two-pass ffmpeg conversion engine.
//!
//! ```text
//! ffprobe ──► bitrate plan ──► pass 1 (stats, no audio) ──► pass 2 (encode)
//!   0%            25%              25% .. 50%                 50% .. 100%
//! ```

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use trimcrop_common::clock::Stopwatch;
use trimcrop_common::config::{default_video_dir, EngineConfig};
use trimcrop_common::error::{TrimcropError, TrimcropResult};
use trimcrop_session_model::request::{ConversionRequest, CropSpec};

use crate::bitrate::{self, BitratePlan};
use crate::engine::{ConversionEngine, ConversionReply, ProgressSink};

/// What ffprobe reports about a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaProbe {
    pub duration_secs: f64,
    /// Audio bitrate in kbit/s; `0` when unknown or absent.
    pub audio_kbps: f64,
    pub has_audio: bool,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    bit_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Parse `ffprobe -of json` output.
pub fn parse_probe(json: &str) -> TrimcropResult<MediaProbe> {
    let output: ProbeOutput =
        serde_json::from_str(json).context("ffprobe output is not valid JSON")?;

    let duration_secs = output
        .format
        .and_then(|format| format.duration)
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| TrimcropError::conversion("ffprobe reported no duration"))?;

    let audio = output
        .streams
        .iter()
        .find(|stream| stream.codec_type.as_deref() == Some("audio"));
    let audio_kbps = audio
        .and_then(|stream| stream.bit_rate.as_deref())
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .map(|bits| bits / 1024.0)
        .unwrap_or(0.0);

    let video = output
        .streams
        .iter()
        .find(|stream| stream.codec_type.as_deref() == Some("video"));

    Ok(MediaProbe {
        duration_secs,
        audio_kbps,
        has_audio: audio.is_some(),
        width: video.and_then(|stream| stream.width).filter(|w| *w > 0),
        height: video.and_then(|stream| stream.height).filter(|h| *h > 0),
    })
}

/// Which encoder pass to build arguments for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodePass {
    Analyze,
    Encode,
}

impl EncodePass {
    fn number(self) -> &'static str {
        match self {
            Self::Analyze => "1",
            Self::Encode => "2",
        }
    }

    /// Share of overall progress this pass covers.
    fn band(self) -> (f64, f64) {
        match self {
            Self::Analyze => (25.0, 50.0),
            Self::Encode => (50.0, 100.0),
        }
    }
}

/// Availability of the external binaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BinaryStatus {
    pub ffmpeg: bool,
    pub ffprobe: bool,
}

impl BinaryStatus {
    pub fn all_present(&self) -> bool {
        self.ffmpeg && self.ffprobe
    }
}

enum PassOutcome {
    Completed,
    Failed(String),
}

/// Conversion engine backed by the ffmpeg and ffprobe binaries.
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    config: EngineConfig,
}

impl FfmpegEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Check that both binaries can be executed.
    pub fn check_binaries(&self) -> BinaryStatus {
        BinaryStatus {
            ffmpeg: binary_runs(&self.config.ffmpeg_bin),
            ffprobe: binary_runs(&self.config.ffprobe_bin),
        }
    }

    /// Probe duration, audio bitrate and dimensions of `input`.
    ///
    /// A binary that cannot be started is a transport fault.
    pub async fn probe(&self, input: &Path) -> TrimcropResult<MediaProbe> {
        let output = Command::new(&self.config.ffprobe_bin)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration:stream=codec_type,width,height,bit_rate",
                "-of",
                "json",
            ])
            .arg(input)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                TrimcropError::transport(format!("failed to start {}: {e}", self.config.ffprobe_bin))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TrimcropError::conversion(format!(
                "ffprobe failed ({}): {}",
                output.status,
                tail(&stderr, 3)
            )));
        }

        let probe = parse_probe(&String::from_utf8_lossy(&output.stdout))?;
        tracing::debug!(
            input = %input.display(),
            duration_secs = probe.duration_secs,
            audio_kbps = probe.audio_kbps,
            width = ?probe.width,
            height = ?probe.height,
            "Probed source"
        );
        Ok(probe)
    }

    /// Where the output for `input` at `target_mb` is written.
    ///
    /// Configured output directory, else the user's video directory, else
    /// next to the input.
    pub fn output_path(&self, input: &Path, target_mb: u32) -> PathBuf {
        let dir = self
            .config
            .output_dir
            .clone()
            .or_else(default_video_dir)
            .or_else(|| {
                input
                    .parent()
                    .filter(|parent| !parent.as_os_str().is_empty())
                    .map(Path::to_path_buf)
            })
            .unwrap_or_else(|| PathBuf::from("."));
        let stem = input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        dir.join(format!("{stem}-{target_mb}m.mp4"))
    }

    /// Video filter chain: optional crop, then scale.
    pub fn filter_chain(&self, crop: Option<&CropSpec>, probe: &MediaProbe) -> String {
        let mut filters = Vec::new();

        if let Some(spec) = crop {
            let rect = spec.to_rect();
            if !rect.is_full_frame() {
                let (frame_w, frame_h) = match (probe.width, probe.height) {
                    (Some(w), Some(h)) => (w, h),
                    _ => (self.config.reference_width, self.config.reference_height),
                };
                let px = rect.to_pixels(frame_w, frame_h);
                if px.width >= self.config.min_crop_pixels && px.height >= self.config.min_crop_pixels {
                    filters.push(format!("crop={}:{}:{}:{}", px.width, px.height, px.x, px.y));
                } else {
                    tracing::warn!(width = px.width, height = px.height, "crop too small, skipped");
                }
            }
        }

        filters.push(format!("scale={}:-2", self.config.scale_width));
        filters.join(",")
    }

    /// Full argument list for one encoder pass.
    pub fn pass_args(
        &self,
        pass: EncodePass,
        request: &ConversionRequest,
        plan: &BitratePlan,
        probe: &MediaProbe,
        passlog: &Path,
        output: &Path,
    ) -> Vec<String> {
        let mut args = vec!["-y".to_string()];
        let (before_input, after_input) = trim_args(request.start_time, request.end_time);
        args.extend(before_input);
        args.push("-i".to_string());
        args.push(request.input.clone());
        args.extend(after_input);

        args.extend([
            "-c:v".to_string(),
            "libx264".to_string(),
            "-passlogfile".to_string(),
            passlog.to_string_lossy().into_owned(),
            "-filter:v".to_string(),
            self.filter_chain(request.crop.as_ref(), probe),
            "-b:v".to_string(),
            format!("{}k", plan.video_kbps),
            "-pass".to_string(),
            pass.number().to_string(),
        ]);

        match pass {
            EncodePass::Analyze => {
                args.push("-an".to_string());
            }
            EncodePass::Encode if probe.has_audio => {
                args.extend(["-c:a".to_string(), "aac".to_string()]);
                if plan.audio_kbps >= 1.0 {
                    args.extend(["-b:a".to_string(), format!("{}k", plan.audio_kbps.round() as u32)]);
                }
            }
            EncodePass::Encode => {
                args.push("-an".to_string());
            }
        }

        if pass == EncodePass::Encode {
            args.extend(["-movflags".to_string(), "+faststart".to_string()]);
        }
        args.extend([
            "-f".to_string(),
            "mp4".to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-progress".to_string(),
            "pipe:1".to_string(),
            "-nostats".to_string(),
        ]);
        args.push(output.to_string_lossy().into_owned());
        args
    }

    async fn run_pass(
        &self,
        pass: EncodePass,
        args: &[String],
        clip_secs: f64,
        progress: &ProgressSink,
    ) -> TrimcropResult<PassOutcome> {
        tracing::debug!(pass = pass.number(), args = ?args, "Running ffmpeg");
        let stopwatch = Stopwatch::start();
        let mut child = Command::new(&self.config.ffmpeg_bin)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                TrimcropError::transport(format!("failed to start {}: {e}", self.config.ffmpeg_bin))
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TrimcropError::transport("failed to capture ffmpeg stdout"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| TrimcropError::transport("failed to capture ffmpeg stderr"))?;

        // ffmpeg blocks once its stderr pipe is full.
        let stderr_task = tokio::spawn(async move {
            let mut output = String::new();
            match stderr.read_to_string(&mut output).await {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        let mut lines = BufReader::new(stdout).lines();
        let mut state = ProgressState::default();
        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| TrimcropError::transport(format!("failed reading ffmpeg progress: {e}")))?
        {
            let Some((key, value)) = line.trim().split_once('=') else {
                continue;
            };
            state.update(key, value);
            if key == "progress" {
                progress.report(state.overall_percent(clip_secs, pass.band()));
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| TrimcropError::transport(format!("failed to wait on ffmpeg: {e}")))?;
        let stderr_output = stderr_task
            .await
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

        tracing::info!(
            pass = pass.number(),
            elapsed_secs = stopwatch.elapsed_secs(),
            success = status.success(),
            "ffmpeg pass finished"
        );

        if !status.success() {
            return Ok(PassOutcome::Failed(format!(
                "ffmpeg pass {} failed ({status}): {}",
                pass.number(),
                tail(&stderr_output, 5)
            )));
        }
        Ok(PassOutcome::Completed)
    }

    /// Run both passes; `Some(reason)` when one of them failed.
    async fn run_passes(
        &self,
        request: &ConversionRequest,
        probe: &MediaProbe,
        plan: &BitratePlan,
        output: &Path,
        passlog: &Path,
        progress: &ProgressSink,
    ) -> TrimcropResult<Option<String>> {
        for (pass, target) in [
            (EncodePass::Analyze, PathBuf::from(null_device())),
            (EncodePass::Encode, output.to_path_buf()),
        ] {
            let args = self.pass_args(pass, request, plan, probe, passlog, &target);
            if let PassOutcome::Failed(reason) =
                self.run_pass(pass, &args, plan.duration_secs, progress).await?
            {
                return Ok(Some(reason));
            }
        }
        Ok(None)
    }

    async fn encode(
        &self,
        request: &ConversionRequest,
        probe: &MediaProbe,
        plan: &BitratePlan,
        output: &Path,
        passlog: &Path,
        progress: &ProgressSink,
    ) -> TrimcropResult<ConversionReply> {
        let passes = self
            .run_passes(request, probe, plan, output, passlog, progress)
            .await;
        remove_passlogs(passlog).await;
        if let Some(reason) = passes? {
            return Ok(ConversionReply::empty(reason));
        }

        let size = tokio::fs::metadata(output)
            .await
            .map(|meta| meta.len())
            .unwrap_or(0);
        if size == 0 {
            return Ok(ConversionReply::empty(format!(
                "ffmpeg produced an empty file at {}",
                output.display()
            )));
        }

        Ok(ConversionReply::Completed {
            output: output.to_string_lossy().into_owned(),
        })
    }
}

#[async_trait::async_trait]
impl ConversionEngine for FfmpegEngine {
    async fn convert(
        &self,
        request: ConversionRequest,
        progress: ProgressSink,
    ) -> TrimcropResult<ConversionReply> {
        let stopwatch = Stopwatch::start();
        progress.report(0.0);

        let input = PathBuf::from(&request.input);
        if !input.is_file() {
            return Ok(ConversionReply::empty(format!(
                "input file not found: {}",
                input.display()
            )));
        }

        let probe = match self.probe(&input).await {
            Ok(probe) => probe,
            Err(err @ TrimcropError::Transport { .. }) => return Err(err),
            Err(err) => return Ok(ConversionReply::empty(err.to_string())),
        };

        let clip_secs = request.output_duration(probe.duration_secs);
        let plan = match bitrate::plan(request.target_size, clip_secs, probe.audio_kbps) {
            Ok(plan) => plan,
            Err(rejection) => {
                tracing::warn!(%rejection, clip_secs, "target size unreachable");
                return Ok(ConversionReply::empty(rejection.to_string()));
            }
        };
        tracing::info!(
            input = %input.display(),
            clip_secs,
            video_kbps = plan.video_kbps,
            audio_kbps = plan.audio_kbps,
            "Bitrate planned"
        );
        progress.report(25.0);

        let output = self.output_path(&input, request.target_size);
        if let Some(parent) = output.parent() {
            if let Err(err) = tokio::fs::create_dir_all(parent).await {
                return Ok(ConversionReply::empty(format!(
                    "cannot create output directory {}: {err}",
                    parent.display()
                )));
            }
        }

        let passlog = std::env::temp_dir().join(format!(
            "trimcrop-{}-{}",
            std::process::id(),
            chrono::Utc::now().timestamp_millis()
        ));
        let reply = self
            .encode(&request, &probe, &plan, &output, &passlog, &progress)
            .await?;
        if matches!(reply, ConversionReply::Completed { .. }) {
            progress.report(100.0);
        }
        tracing::info!(
            elapsed_secs = stopwatch.elapsed_secs(),
            ?reply,
            "ffmpeg conversion finished"
        );
        Ok(reply)
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// Seek arguments placed before and after `-i`.
///
/// The start seeks the input; the end becomes a duration when a start is
/// given, or an absolute stop otherwise.
fn trim_args(start: Option<f64>, end: Option<f64>) -> (Vec<String>, Vec<String>) {
    let start = start.filter(|s| *s > 0.0);
    let before = start
        .map(|s| vec!["-ss".to_string(), secs(s)])
        .unwrap_or_default();
    let after = match (start, end) {
        (Some(s), Some(e)) if e > s => vec!["-t".to_string(), secs(e - s)],
        (_, Some(e)) => vec!["-to".to_string(), secs(e)],
        (_, None) => Vec::new(),
    };
    (before, after)
}

fn secs(value: f64) -> String {
    format!("{value:.3}")
}

fn null_device() -> &'static str {
    if cfg!(windows) {
        "NUL"
    } else {
        "/dev/null"
    }
}

fn binary_runs(binary: &str) -> bool {
    std::process::Command::new(binary)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

fn tail(text: &str, lines: usize) -> String {
    let collected: Vec<&str> = text.trim().lines().collect();
    collected[collected.len().saturating_sub(lines)..].join(" | ")
}

async fn remove_passlogs(prefix: &Path) {
    let base = prefix.to_string_lossy();
    for suffix in ["-0.log", "-0.log.mbtree"] {
        let path = PathBuf::from(format!("{base}{suffix}"));
        if let Err(err) = tokio::fs::remove_file(&path).await {
            tracing::trace!(path = %path.display(), error = %err, "passlog not removed");
        }
    }
}

#[derive(Debug, Default)]
struct ProgressState {
    out_time_secs: f64,
    complete: bool,
}

impl ProgressState {
    fn update(&mut self, key: &str, value: &str) {
        match key {
            // ffmpeg reports microseconds under both keys
            "out_time_us" | "out_time_ms" => {
                if let Ok(us) = value.parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
            }
            "progress" => {
                self.complete = value == "end";
            }
            _ => {}
        }
    }

    fn overall_percent(&self, clip_secs: f64, band: (f64, f64)) -> f64 {
        let fraction = if self.complete {
            1.0
        } else if clip_secs > 0.0 {
            (self.out_time_secs / clip_secs).clamp(0.0, 1.0)
        } else {
            0.0
        };
        band.0 + (band.1 - band.0) * fraction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trimcrop_session_model::crop::CropRect;

    const PROBE_JSON: &str = r#"{
        "streams": [
            { "codec_type": "video", "width": 1920, "height": 1080 },
            { "codec_type": "audio", "bit_rate": "131072" }
        ],
        "format": { "duration": "120.500000" }
    }"#;

    fn engine() -> FfmpegEngine {
        FfmpegEngine::new(EngineConfig {
            output_dir: Some(PathBuf::from("/tmp/trimcrop-out")),
            ..EngineConfig::default()
        })
    }

    fn probe_720p(has_audio: bool) -> MediaProbe {
        MediaProbe {
            duration_secs: 120.0,
            audio_kbps: if has_audio { 128.0 } else { 0.0 },
            has_audio,
            width: Some(1280),
            height: Some(720),
        }
    }

    fn request(start: Option<f64>, end: Option<f64>, crop: Option<CropRect>) -> ConversionRequest {
        ConversionRequest {
            input: "/videos/clip.mp4".into(),
            target_size: 8,
            start_time: start,
            end_time: end,
            crop: crop.as_ref().map(CropSpec::from_rect),
        }
    }

    fn plan() -> BitratePlan {
        bitrate::plan(8, 40.0, 128.0).unwrap()
    }

    fn position(args: &[String], flag: &str) -> Option<usize> {
        args.iter().position(|arg| arg == flag)
    }

    #[test]
    fn test_parse_probe() {
        let probe = parse_probe(PROBE_JSON).unwrap();
        assert_eq!(probe.duration_secs, 120.5);
        assert_eq!(probe.audio_kbps, 128.0);
        assert!(probe.has_audio);
        assert_eq!((probe.width, probe.height), (Some(1920), Some(1080)));
    }

    #[test]
    fn test_parse_probe_unknown_audio_rate_is_zero() {
        let json = r#"{"streams":[{"codec_type":"audio","bit_rate":"N/A"}],"format":{"duration":"5"}}"#;
        let probe = parse_probe(json).unwrap();
        assert_eq!(probe.audio_kbps, 0.0);
        assert!(probe.has_audio);
        assert_eq!(probe.width, None);
    }

    #[test]
    fn test_parse_probe_requires_duration() {
        assert!(parse_probe(r#"{"streams":[],"format":{"duration":"N/A"}}"#).is_err());
        assert!(parse_probe("not json").is_err());
    }

    #[test]
    fn test_trimmed_pass_seeks_before_input() {
        let args = engine().pass_args(
            EncodePass::Encode,
            &request(Some(10.0), Some(50.0), None),
            &plan(),
            &probe_720p(true),
            Path::new("/tmp/passlog"),
            Path::new("/out/clip-8m.mp4"),
        );
        let ss = position(&args, "-ss").unwrap();
        let input = position(&args, "-i").unwrap();
        let t = position(&args, "-t").unwrap();
        assert!(ss < input && input < t);
        assert_eq!(args[ss + 1], "10.000");
        assert_eq!(args[t + 1], "40.000");
        assert_eq!(args.last().map(String::as_str), Some("/out/clip-8m.mp4"));
    }

    #[test]
    fn test_end_only_uses_absolute_stop() {
        let (before, after) = trim_args(None, Some(30.0));
        assert!(before.is_empty());
        assert_eq!(after, vec!["-to".to_string(), "30.000".to_string()]);
        let (before, after) = trim_args(Some(0.0), None);
        assert!(before.is_empty() && after.is_empty());
    }

    #[test]
    fn test_analyze_pass_drops_audio_and_writes_nothing() {
        let args = engine().pass_args(
            EncodePass::Analyze,
            &request(None, None, None),
            &plan(),
            &probe_720p(true),
            Path::new("/tmp/passlog"),
            Path::new(null_device()),
        );
        assert!(position(&args, "-an").is_some());
        assert!(position(&args, "-c:a").is_none());
        assert!(position(&args, "+faststart").is_none());
        let pass = position(&args, "-pass").unwrap();
        assert_eq!(args[pass + 1], "1");
    }

    #[test]
    fn test_encode_pass_audio_settings() {
        let with_audio = engine().pass_args(
            EncodePass::Encode,
            &request(None, None, None),
            &plan(),
            &probe_720p(true),
            Path::new("/tmp/passlog"),
            Path::new("/out.mp4"),
        );
        let b_a = position(&with_audio, "-b:a").unwrap();
        assert_eq!(with_audio[b_a + 1], "128k");
        assert!(position(&with_audio, "+faststart").is_some());

        let silent = engine().pass_args(
            EncodePass::Encode,
            &request(None, None, None),
            &bitrate::plan(8, 40.0, 0.0).unwrap(),
            &probe_720p(false),
            Path::new("/tmp/passlog"),
            Path::new("/out.mp4"),
        );
        assert!(position(&silent, "-an").is_some());
        assert!(position(&silent, "-c:a").is_none());
    }

    #[test]
    fn test_filter_chain_crops_then_scales() {
        let crop = CropSpec::from_rect(&CropRect::new(10.0, 10.0, 50.0, 50.0));
        let chain = engine().filter_chain(Some(&crop), &probe_720p(true));
        assert_eq!(chain, "crop=640:360:128:72,scale=1280:-2");
    }

    #[test]
    fn test_filter_chain_skips_tiny_crop() {
        let crop = CropSpec::from_rect(&CropRect::new(0.0, 0.0, 1.0, 50.0));
        let chain = engine().filter_chain(Some(&crop), &probe_720p(true));
        assert_eq!(chain, "scale=1280:-2");
    }

    #[test]
    fn test_filter_chain_falls_back_to_reference_frame() {
        let crop = CropSpec::from_rect(&CropRect::new(0.0, 0.0, 50.0, 50.0));
        let mut probe = probe_720p(true);
        probe.width = None;
        let chain = engine().filter_chain(Some(&crop), &probe);
        assert_eq!(chain, "crop=640:360:0:0,scale=1280:-2");
    }

    #[test]
    fn test_output_path_uses_target_size() {
        let path = engine().output_path(Path::new("/videos/holiday.mov"), 25);
        assert_eq!(path, PathBuf::from("/tmp/trimcrop-out/holiday-25m.mp4"));
    }

    #[test]
    fn test_progress_maps_into_pass_band() {
        let mut state = ProgressState::default();
        state.update("out_time_us", "20000000");
        state.update("progress", "continue");
        assert!((state.overall_percent(40.0, EncodePass::Encode.band()) - 75.0).abs() < 1e-9);
        assert!((state.overall_percent(40.0, EncodePass::Analyze.band()) - 37.5).abs() < 1e-9);

        state.update("progress", "end");
        assert_eq!(state.overall_percent(40.0, EncodePass::Encode.band()), 100.0);
    }

    #[test]
    fn test_tail_keeps_last_lines() {
        assert_eq!(tail("a\nb\nc\n", 2), "b | c");
        assert_eq!(tail("", 3), "");
    }

    #[tokio::test]
    async fn test_missing_input_is_empty_reply() {
        let (sink, _rx) = ProgressSink::channel();
        let reply = engine()
            .convert(request(None, None, None), sink)
            .await
            .unwrap();
        assert!(matches!(reply, ConversionReply::Empty { ref reason } if reason.contains("not found")));
    }

    #[tokio::test]
    async fn test_missing_ffprobe_is_transport_fault() {
        let input = std::env::temp_dir().join(format!("trimcrop-probe-test-{}.mp4", std::process::id()));
        std::fs::write(&input, b"not really a video").unwrap();

        let engine = FfmpegEngine::new(EngineConfig {
            ffprobe_bin: "/nonexistent/trimcrop/ffprobe".into(),
            ..EngineConfig::default()
        });
        let mut req = request(None, None, None);
        req.input = input.to_string_lossy().into_owned();
        let (sink, _rx) = ProgressSink::channel();
        let result = engine.convert(req, sink).await;
        std::fs::remove_file(&input).ok();

        assert!(matches!(result, Err(TrimcropError::Transport { .. })));
    }

    #[tokio::test]
    async fn test_passlogs_removed_when_ffmpeg_cannot_start() {
        let dir = std::env::temp_dir().join(format!("trimcrop-encode-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let passlog = dir.join("trimcrop-passlog");
        let stale = [dir.join("trimcrop-passlog-0.log"), dir.join("trimcrop-passlog-0.log.mbtree")];
        for path in &stale {
            std::fs::write(path, b"stats").unwrap();
        }

        let engine = FfmpegEngine::new(EngineConfig {
            ffmpeg_bin: "/nonexistent/trimcrop/ffmpeg".into(),
            ..EngineConfig::default()
        });
        let (sink, _rx) = ProgressSink::channel();
        let result = engine
            .encode(
                &request(None, None, None),
                &probe_720p(true),
                &plan(),
                &dir.join("out.mp4"),
                &passlog,
                &sink,
            )
            .await;

        let leftovers: Vec<_> = stale.iter().filter(|path| path.exists()).collect();
        std::fs::remove_dir_all(&dir).ok();
        assert!(matches!(result, Err(TrimcropError::Transport { .. })));
        assert!(leftovers.is_empty());
    }
}
