use crate::compose::{DEFAULT_MUSIC_GAIN, TrackFit};
use crate::normalize::DEFAULT_LOOP_SLACK;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

pub const HF_TOKEN_ENV: &str = "HF_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub hf_token: String,
    #[serde(default = "default_video_endpoint")]
    pub video_endpoint: String,
    #[serde(default = "default_music_url")]
    pub music_url: String,
    #[serde(default)]
    pub tts: TtsConfig,
    #[serde(default)]
    pub generation: GenerationParams,
    #[serde(default)]
    pub timeouts: Timeouts,
    #[serde(default = "default_music_gain")]
    pub music_gain: f64,
    #[serde(default = "default_loop_slack")]
    pub loop_slack: u32,
    #[serde(default)]
    pub track_fit: TrackFit,
    /// Parent for per-request scratch directories; the system temp dir when unset.
    #[serde(default)]
    pub work_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TtsBackend {
    #[default]
    Google,
    ElevenLabs,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    #[serde(default)]
    pub backend: TtsBackend,
    #[serde(rename = "elevenlabs_api_key", default)]
    pub elevenlabs_key: String,
    #[serde(default = "default_voice_id")]
    pub eleven_voice_id: String,
    #[serde(default = "default_model_id")]
    pub eleven_model_id: String,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            backend: TtsBackend::default(),
            elevenlabs_key: String::new(),
            eleven_voice_id: default_voice_id(),
            eleven_model_id: default_model_id(),
        }
    }
}

/// Parameters forwarded to the text-to-video model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub num_frames: u32,
    pub num_inference_steps: u32,
    pub height: u32,
    pub width: u32,
    pub guidance_scale: f64,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            num_frames: 24,
            num_inference_steps: 25,
            height: 320,
            width: 576,
            guidance_scale: 7.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeouts {
    pub tts_secs: u64,
    pub video_secs: u64,
    pub music_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            tts_secs: 60,
            video_secs: 300,
            music_secs: 120,
        }
    }
}

impl Timeouts {
    pub fn tts(&self) -> Duration {
        Duration::from_secs(self.tts_secs)
    }

    pub fn video(&self) -> Duration {
        Duration::from_secs(self.video_secs)
    }

    pub fn music(&self) -> Duration {
        Duration::from_secs(self.music_secs)
    }
}

fn default_video_endpoint() -> String {
    "https://router.huggingface.co/hf-inference/models/cerspense/zeroscope_v2_576w".to_string()
}

fn default_music_url() -> String {
    "https://www.bensound.com/bensound-music/bensound-ukulele.mp3".to_string()
}

fn default_voice_id() -> String {
    "JBFqnCBsd6RMkjVDRZzb".to_string()
}

fn default_model_id() -> String {
    "eleven_multilingual_v2".to_string()
}

fn default_music_gain() -> f64 {
    DEFAULT_MUSIC_GAIN
}

fn default_loop_slack() -> u32 {
    DEFAULT_LOOP_SLACK
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hf_token: String::new(),
            video_endpoint: default_video_endpoint(),
            music_url: default_music_url(),
            tts: TtsConfig::default(),
            generation: GenerationParams::default(),
            timeouts: Timeouts::default(),
            music_gain: default_music_gain(),
            loop_slack: default_loop_slack(),
            track_fit: TrackFit::default(),
            work_dir: None,
        }
    }
}

impl Config {
    /// Reads `path` if it exists, falls back to defaults otherwise, then fills
    /// the Hugging Face token from the environment when the file has none.
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if fs::try_exists(path).await.unwrap_or(false) {
            let content = fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            Self::from_json(&content)
                .with_context(|| format!("Failed to parse config: {}", path.display()))?
        } else {
            Self::default()
        };

        if config.hf_token.is_empty() {
            if let Ok(token) = std::env::var(HF_TOKEN_ENV) {
                config.hf_token = token.trim().to_string();
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.hf_token.is_empty() {
            anyhow::bail!("config.json: hf_token missing (or set {HF_TOKEN_ENV})");
        }
        if self.video_endpoint.trim().is_empty() {
            anyhow::bail!("config.json: video_endpoint is empty");
        }
        if self.music_url.trim().is_empty() {
            anyhow::bail!("config.json: music_url is empty");
        }
        if !(0.0..=1.0).contains(&self.music_gain) {
            anyhow::bail!("config.json: music_gain must be within 0.0..=1.0");
        }
        if self.loop_slack < 1 {
            anyhow::bail!("config.json: loop_slack must be at least 1");
        }
        if self.timeouts.tts_secs == 0
            || self.timeouts.video_secs == 0
            || self.timeouts.music_secs == 0
        {
            anyhow::bail!("config.json: timeouts must be non-zero");
        }
        if self.tts.backend == TtsBackend::ElevenLabs && self.tts.elevenlabs_key.is_empty() {
            anyhow::bail!("config.json: elevenlabs_api_key missing");
        }
        Ok(())
    }
}
