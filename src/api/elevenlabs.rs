use crate::api::{NarrationProvider, status_error};
use crate::config::TtsConfig;
use crate::error::ProviderError;
use crate::logw;
use crate::request::Language;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

const ELEVENLABS_BASE: &str = "https://api.elevenlabs.io";

pub struct ElevenLabsTts {
    client: Client,
    api_key: String,
    voice_id: String,
    model_id: String,
    timeout: Duration,
}

impl ElevenLabsTts {
    pub fn new(client: Client, cfg: &TtsConfig, timeout: Duration) -> Self {
        Self {
            client,
            api_key: cfg.elevenlabs_key.clone(),
            voice_id: cfg.eleven_voice_id.clone(),
            model_id: cfg.eleven_model_id.clone(),
            timeout,
        }
    }
}

#[async_trait]
impl NarrationProvider for ElevenLabsTts {
    async fn synthesize(&self, text: &str, language: Language) -> Result<Vec<u8>, ProviderError> {
        let url = format!(
            "{ELEVENLABS_BASE}/v1/text-to-speech/{}?output_format=mp3_44100_128",
            self.voice_id
        );

        let body = serde_json::json!({
            "text": text,
            "model_id": self.model_id,
            "language_code": language.code(),
        });

        let resp = self
            .client
            .post(url)
            .header("xi-api-key", &self.api_key)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await?;

        if !resp.status().is_success() {
            logw(format!("ElevenLabs TTS failed HTTP {}", resp.status().as_u16()));
            return Err(status_error(resp).await);
        }

        let bytes = resp.bytes().await?;
        if bytes.is_empty() {
            return Err(ProviderError::UnexpectedBody(
                "ElevenLabs returned no audio".to_string(),
            ));
        }
        Ok(bytes.to_vec())
    }
}
