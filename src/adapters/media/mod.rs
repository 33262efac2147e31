//! Media-tool adapter: ffmpeg/ffprobe subprocesses.

mod ffmpeg;

pub use ffmpeg::FfmpegTool;

use std::fmt;

#[derive(Debug)]
pub enum MediaError {
    Io(std::io::Error),
    Ffmpeg(String),
    Ffprobe(String),
    Parse(serde_json::Error),
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaError::Io(e) => write!(f, "IO error: {}", e),
            MediaError::Ffmpeg(e) => write!(f, "ffmpeg error: {}", e),
            MediaError::Ffprobe(e) => write!(f, "ffprobe error: {}", e),
            MediaError::Parse(e) => write!(f, "probe parse error: {}", e),
        }
    }
}

impl std::error::Error for MediaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MediaError::Io(e) => Some(e),
            MediaError::Parse(e) => Some(e),
            MediaError::Ffmpeg(_) | MediaError::Ffprobe(_) => None,
        }
    }
}

impl From<std::io::Error> for MediaError {
    fn from(err: std::io::Error) -> Self {
        MediaError::Io(err)
    }
}

impl From<serde_json::Error> for MediaError {
    fn from(err: serde_json::Error) -> Self {
        MediaError::Parse(err)
    }
}
