use crate::error::PipelineError;
use crate::ffmpeg;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Narration,
    SourceVideo,
    Music,
    Normalized,
    Composed,
}

impl MediaKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            MediaKind::Narration => "narration.mp3",
            MediaKind::SourceVideo => "source.mp4",
            MediaKind::Music => "music.mp3",
            MediaKind::Normalized => "normalized.mp4",
            MediaKind::Composed => "final.mp4",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MediaKind::Narration => "narration",
            MediaKind::SourceVideo => "source video",
            MediaKind::Music => "music",
            MediaKind::Normalized => "normalized video",
            MediaKind::Composed => "composed video",
        };
        f.write_str(name)
    }
}

/// A file in the request workspace together with its probed duration.
#[derive(Debug, Clone)]
pub struct MediaAsset {
    path: PathBuf,
    kind: MediaKind,
    duration: f64,
}

impl MediaAsset {
    /// Probes `path` with ffprobe. An unreadable or non-positive duration is a
    /// degenerate asset.
    pub async fn probe(path: impl Into<PathBuf>, kind: MediaKind) -> Result<Self, PipelineError> {
        let path = path.into();
        let duration = ffmpeg::ffprobe_duration_seconds(&path)
            .await
            .map_err(|err| PipelineError::DegenerateAsset {
                kind,
                reason: format!("{err:#}"),
            })?;
        if !duration.is_finite() || duration <= 0.0 {
            return Err(PipelineError::DegenerateAsset {
                kind,
                reason: format!("duration {duration}s"),
            });
        }
        Ok(Self {
            path,
            kind,
            duration,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }
}
