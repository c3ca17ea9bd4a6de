use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const MIN_DURATION_SECS: u32 = 5;
pub const MAX_DURATION_SECS: u32 = 30;
pub const DEFAULT_DURATION_SECS: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("prompt must not be empty")]
    EmptyPrompt,
    #[error("duration {0}s is outside 5..=30s")]
    DurationOutOfRange(u32),
    #[error("unknown language '{0}' (expected english or telugu)")]
    UnknownLanguage(String),
}

/// Narration language. Each variant carries the TTS locale and the regional
/// host that selects the accent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Telugu,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Telugu => "te",
        }
    }

    /// Top-level domain of the TTS host. `co.in` gives English an Indian accent.
    pub fn tld(&self) -> &'static str {
        match self {
            Language::English => "co.in",
            Language::Telugu => "com",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::English => write!(f, "English"),
            Language::Telugu => write!(f, "Telugu"),
        }
    }
}

impl FromStr for Language {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "english" | "en" => Ok(Language::English),
            "telugu" | "te" => Ok(Language::Telugu),
            other => Err(ValidationError::UnknownLanguage(other.to_string())),
        }
    }
}

/// One user submission. Only constructible through [`Request::new`], so a
/// request that reaches the pipeline has already passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    prompt: String,
    language: Language,
    target_secs: u32,
}

impl Request {
    pub fn new(
        prompt: impl Into<String>,
        language: Language,
        target_secs: u32,
    ) -> Result<Self, ValidationError> {
        let prompt = prompt.into().trim().to_string();
        if prompt.is_empty() {
            return Err(ValidationError::EmptyPrompt);
        }
        if !(MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(&target_secs) {
            return Err(ValidationError::DurationOutOfRange(target_secs));
        }
        Ok(Self {
            prompt,
            language,
            target_secs,
        })
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn target_secs(&self) -> u32 {
        self.target_secs
    }

    pub fn target(&self) -> f64 {
        f64::from(self.target_secs)
    }
}
