//! ffmpeg/ffprobe invocations.
//!
//! Argument lists are built by pure functions so filter graphs can be
//! asserted in tests without executing anything.

use super::MediaError;
use crate::domain::jobs::MergeMode;
use crate::ports::media::{MediaInfo, MediaToolPort, MergeSpec, ProgressFn, StreamKind};
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::error::Error;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

pub struct FfmpegTool;

impl FfmpegTool {
    pub fn new() -> Self {
        Self
    }

    async fn run_ffmpeg(&self, args: &[String], what: &str) -> Result<(), MediaError> {
        let output = Command::new("ffmpeg").args(args).output().await?;
        if !output.status.success() {
            return Err(MediaError::Ffmpeg(format!(
                "{} failed: {}",
                what,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }

    async fn probe_info(&self, path: &Path) -> Result<MediaInfo, MediaError> {
        let output = Command::new("ffprobe")
            .args(["-v", "error", "-show_format", "-show_streams", "-print_format", "json"])
            .arg(path)
            .output()
            .await?;
        if !output.status.success() {
            return Err(MediaError::Ffprobe(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        let value: Value = serde_json::from_slice(&output.stdout)?;
        Ok(parse_probe(&value))
    }
}

impl Default for FfmpegTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaToolPort for FfmpegTool {
    async fn extract_audio(
        &self,
        src: &Path,
        out: &Path,
        on_progress: ProgressFn,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        // Duration is only needed to turn out_time into a percent; a failed
        // probe just means no streaming progress.
        let duration = self
            .probe_info(src)
            .await
            .map(|info| info.duration_sec)
            .unwrap_or(0.0);

        let mut child = Command::new("ffmpeg")
            .arg("-y")
            .arg("-i")
            .arg(src)
            .args(["-vn", "-acodec", "pcm_s16le"])
            .args(["-progress", "pipe:1", "-nostats", "-loglevel", "error"])
            .arg(out)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(MediaError::from)?;

        if let Some(stdout) = child.stdout.take() {
            let re = out_time_regex();
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if let Some(pct) = progress_percent(&re, &line, duration) {
                    on_progress(pct);
                }
            }
        }

        let output = child.wait_with_output().await.map_err(MediaError::from)?;
        if !output.status.success() {
            return Err(MediaError::Ffmpeg(format!(
                "audio extraction failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ))
            .into());
        }
        Ok(())
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, Box<dyn Error + Send + Sync>> {
        Ok(self.probe_info(path).await?)
    }

    async fn convert_for_asr(
        &self,
        src: &Path,
        out: &Path,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let args = convert_args(src, out);
        Ok(self.run_ffmpeg(&args, "ASR conversion").await?)
    }

    async fn denoise(&self, src: &Path, out: &Path) -> Result<(), Box<dyn Error + Send + Sync>> {
        let args = denoise_args(src, out);
        Ok(self.run_ffmpeg(&args, "denoise").await?)
    }

    async fn merge(&self, spec: &MergeSpec) -> Result<(), Box<dyn Error + Send + Sync>> {
        let args = merge_args(spec);
        Ok(self.run_ffmpeg(&args, "merge").await?)
    }
}

fn parse_probe(value: &Value) -> MediaInfo {
    let duration_sec = value
        .pointer("/format/duration")
        .and_then(Value::as_str)
        .and_then(|d| d.parse().ok())
        .unwrap_or(0.0);
    let streams = value
        .get("streams")
        .and_then(Value::as_array)
        .map(|streams| {
            streams
                .iter()
                .map(
                    |s| match s.get("codec_type").and_then(Value::as_str) {
                        Some("video") => StreamKind::Video,
                        Some("audio") => StreamKind::Audio,
                        _ => StreamKind::Other,
                    },
                )
                .collect()
        })
        .unwrap_or_default();
    MediaInfo {
        duration_sec,
        streams,
    }
}

fn out_time_regex() -> Regex {
    Regex::new(r"out_time_ms=(\d+)").unwrap()
}

/// ffmpeg's `-progress` output reports `out_time_ms` in microseconds.
fn progress_percent(re: &Regex, line: &str, duration_sec: f64) -> Option<u8> {
    if duration_sec <= 0.0 {
        return None;
    }
    let caps = re.captures(line)?;
    let micros: f64 = caps.get(1)?.as_str().parse().ok()?;
    let pct = (micros / 1_000_000.0) / duration_sec * 100.0;
    Some(pct.clamp(0.0, 100.0) as u8)
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn convert_args(src: &Path, out: &Path) -> Vec<String> {
    vec![
        "-y".into(),
        "-i".into(),
        path_arg(src),
        "-ac".into(),
        "1".into(),
        "-ar".into(),
        "16000".into(),
        "-acodec".into(),
        "pcm_s16le".into(),
        path_arg(out),
    ]
}

fn denoise_args(src: &Path, out: &Path) -> Vec<String> {
    vec![
        "-y".into(),
        "-i".into(),
        path_arg(src),
        "-af".into(),
        "highpass=f=200,afftdn".into(),
        "-acodec".into(),
        "pcm_s16le".into(),
        path_arg(out),
    ]
}

fn merge_args(spec: &MergeSpec) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-y".into(),
        "-i".into(),
        path_arg(&spec.video),
        "-i".into(),
        path_arg(&spec.tts_audio),
    ];

    match spec.mode {
        MergeMode::Replace => {
            args.extend(["-map", "0:v:0", "-map", "1:a:0"].map(String::from));
            push_video_codec(&mut args, spec);
            args.push("-shortest".into());
        }
        MergeMode::Mix => {
            let fade = (spec.tts_duration / 5.0).min(0.3).max(0.0);
            let fade_out_start = (spec.tts_duration - fade).max(0.0);
            let filter = format!(
                "[0:a]volume=0.7[orig];\
                 [1:a]afade=t=in:st=0:d={fade},afade=t=out:st={start}:d={fade}[dub];\
                 [orig][dub]amix=inputs=2:duration=shortest:dropout_transition=0,dynaudnorm[aout]",
                fade = fade,
                start = fade_out_start,
            );
            args.push("-filter_complex".into());
            args.push(filter);
            args.extend(["-map", "0:v:0", "-map", "[aout]"].map(String::from));
            push_video_codec(&mut args, spec);
        }
    }

    args.push(path_arg(&spec.output));
    args
}

/// Burning subtitles forces a video re-encode; otherwise the stream is copied.
fn push_video_codec(args: &mut Vec<String>, spec: &MergeSpec) {
    match &spec.subtitles {
        Some(srt) => {
            args.push("-vf".into());
            args.push(format!("subtitles={}", srt.display()));
        }
        None => args.extend(["-c:v", "copy"].map(String::from)),
    }
}
