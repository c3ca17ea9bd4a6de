//! Remote collaborators: narration, base clip and music bed.

pub mod elevenlabs;
pub mod huggingface;
pub mod music;
pub mod tts;

use crate::error::ProviderError;
use crate::request::Language;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;

const USER_AGENT: &str = concat!("ai-video-shorts/", env!("CARGO_PKG_VERSION"));
const DETAIL_MAX_CHARS: usize = 200;

#[async_trait]
pub trait NarrationProvider: Send + Sync {
    /// Speech audio (MP3) for `text` spoken in `language`.
    async fn synthesize(&self, text: &str, language: Language) -> Result<Vec<u8>, ProviderError>;
}

#[async_trait]
pub trait VideoProvider: Send + Sync {
    /// A short MP4 clip generated from `prompt`.
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, ProviderError>;
}

#[async_trait]
pub trait MusicSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<u8>, ProviderError>;
}

pub fn build_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(30))
        .build()
        .context("Failed to build HTTP client")
}

/// Reads an error body. A body that cannot be read in full is a transport
/// failure, not an empty body.
pub(crate) async fn read_error_body(resp: Response) -> Result<String, ProviderError> {
    let status = resp.status().as_u16();
    resp.text().await.map_err(|err| {
        if err.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::Transport(format!("HTTP {status} body unreadable: {err}"))
        }
    })
}

/// First few hundred characters of an error body, for the user-facing message.
pub(crate) fn error_detail(status: reqwest::StatusCode, raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("no response body")
            .to_string();
    }
    trimmed.chars().take(DETAIL_MAX_CHARS).collect()
}

pub(crate) async fn status_error(resp: Response) -> ProviderError {
    let status = resp.status();
    match read_error_body(resp).await {
        Ok(raw) => ProviderError::Status {
            status: status.as_u16(),
            detail: error_detail(status, &raw),
        },
        Err(err) => err,
    }
}
