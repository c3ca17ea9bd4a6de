use crate::media::MediaKind;
use crate::normalize::NormalizeError;
use crate::request::ValidationError;
use std::fmt;
use thiserror::Error;

/// Failure reported by a remote provider (TTS, video generation, music host).
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("model unavailable (HTTP {status}): {detail}")]
    ModelUnavailable { status: u16, detail: String },
    #[error("HTTP {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("unexpected response body: {0}")]
    UnexpectedBody(String),
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}

/// Pipeline stage a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validation,
    Narration,
    Acquisition,
    Normalization,
    Composition,
    Internal,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validation => "validation",
            Stage::Narration => "narration",
            Stage::Acquisition => "acquisition",
            Stage::Normalization => "normalization",
            Stage::Composition => "composition",
            Stage::Internal => "internal",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),
    #[error("narration failed: {0}")]
    Narration(#[source] ProviderError),
    #[error("video generation failed: {0}")]
    Acquisition(#[source] ProviderError),
    #[error("background music download failed: {0}")]
    Music(#[source] ProviderError),
    #[error("{kind} asset is unusable: {reason}")]
    DegenerateAsset { kind: MediaKind, reason: String },
    #[error("normalization failed: {0:#}")]
    Normalization(#[source] anyhow::Error),
    #[error("composition failed: {0:#}")]
    Composition(#[source] anyhow::Error),
    #[error("internal error: {0:#}")]
    Internal(#[source] anyhow::Error),
}

impl From<NormalizeError> for PipelineError {
    fn from(err: NormalizeError) -> Self {
        match err {
            NormalizeError::DegenerateSource(d) => PipelineError::DegenerateAsset {
                kind: MediaKind::SourceVideo,
                reason: format!("duration {d}s"),
            },
            other => PipelineError::Normalization(other.into()),
        }
    }
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Validation(_) => Stage::Validation,
            PipelineError::Narration(_) => Stage::Narration,
            PipelineError::Acquisition(_) => Stage::Acquisition,
            PipelineError::Music(_) => Stage::Composition,
            PipelineError::DegenerateAsset { kind, .. } => match kind {
                MediaKind::Narration => Stage::Narration,
                MediaKind::SourceVideo => Stage::Acquisition,
                MediaKind::Normalized => Stage::Normalization,
                MediaKind::Music | MediaKind::Composed => Stage::Composition,
            },
            PipelineError::Normalization(_) => Stage::Normalization,
            PipelineError::Composition(_) => Stage::Composition,
            PipelineError::Internal(_) => Stage::Internal,
        }
    }

    /// True when the video model is gone or still loading; an expected outcome
    /// of the free inference tier rather than a bug.
    pub fn is_model_unavailable(&self) -> bool {
        matches!(
            self,
            PipelineError::Acquisition(ProviderError::ModelUnavailable { .. })
        )
    }

    pub fn user_message(&self) -> String {
        match self {
            PipelineError::Validation(err) => format!("Please fix the form: {err}."),
            PipelineError::Acquisition(ProviderError::ModelUnavailable { status, .. }) => format!(
                "The video model is not available right now (HTTP {status}). It may be loading or retired."
            ),
            PipelineError::DegenerateAsset {
                kind: MediaKind::SourceVideo,
                ..
            } => "Generated video clip has zero duration. Try a different prompt.".to_string(),
            PipelineError::Normalization(_)
            | PipelineError::Composition(_)
            | PipelineError::Internal(_) => format!("Something went wrong: {self}"),
            other => other.to_string(),
        }
    }

    pub fn hints(&self) -> &'static [&'static str] {
        match self {
            PipelineError::Validation(_) => &[],
            PipelineError::Narration(_) => &["Check your network connection", "Try a shorter prompt"],
            PipelineError::Acquisition(ProviderError::ModelUnavailable { .. }) => &[
                "Wait 1-2 minutes for the free inference queue",
                "Point video_endpoint at a model that is still hosted",
            ],
            PipelineError::Acquisition(_) => &[
                "Check hf_token in config.json or HF_TOKEN in the environment",
                "Try a simpler prompt",
            ],
            PipelineError::Music(_) => &["Check that music_url is reachable"],
            PipelineError::DegenerateAsset { .. } => &["Try a different prompt"],
            PipelineError::Normalization(_)
            | PipelineError::Composition(_)
            | PipelineError::Internal(_) => &[
                "Make sure ffmpeg and ffprobe are installed and on PATH",
                "Check hf_token in config.json or HF_TOKEN in the environment",
                "Try a simpler prompt, or wait 1-2 min (free API queue)",
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_classification() {
        let err = PipelineError::from(ValidationError::EmptyPrompt);
        assert_eq!(err.stage(), Stage::Validation);

        let err = PipelineError::Acquisition(ProviderError::ModelUnavailable {
            status: 404,
            detail: "Not Found".into(),
        });
        assert_eq!(err.stage(), Stage::Acquisition);
        assert!(err.is_model_unavailable());
        assert!(err.user_message().contains("HTTP 404"));

        let err = PipelineError::Acquisition(ProviderError::Status {
            status: 500,
            detail: "boom".into(),
        });
        assert!(!err.is_model_unavailable());
    }

    #[test]
    fn test_degenerate_source_is_distinct_from_provider_error() {
        let err = PipelineError::from(NormalizeError::DegenerateSource(0.0));
        assert!(matches!(
            err,
            PipelineError::DegenerateAsset {
                kind: MediaKind::SourceVideo,
                ..
            }
        ));
        assert_eq!(err.stage(), Stage::Acquisition);
        assert!(err.user_message().contains("zero duration"));
    }

    #[test]
    fn test_music_failures_belong_to_composition() {
        let err = PipelineError::Music(ProviderError::Status {
            status: 403,
            detail: "Forbidden".into(),
        });
        assert_eq!(err.stage(), Stage::Composition);

        let err = PipelineError::DegenerateAsset {
            kind: MediaKind::Music,
            reason: "duration 0s".into(),
        };
        assert_eq!(err.stage(), Stage::Composition);
    }

    #[test]
    fn test_internal_errors_carry_hints() {
        let err = PipelineError::Composition(anyhow::anyhow!("ffmpeg exited 1"));
        assert_eq!(err.stage(), Stage::Composition);
        assert!(err.user_message().starts_with("Something went wrong"));
        assert!(!err.hints().is_empty());
    }
}
