use crate::api::{MusicSource, status_error};
use crate::error::ProviderError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// The fixed royalty-free track, downloaded fresh for every request.
pub struct RemoteMusic {
    client: Client,
    url: String,
    timeout: Duration,
}

impl RemoteMusic {
    pub fn new(client: Client, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            url: url.into(),
            timeout,
        }
    }
}

#[async_trait]
impl MusicSource for RemoteMusic {
    async fn fetch(&self) -> Result<Vec<u8>, ProviderError> {
        let resp = self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }
        let bytes = resp.bytes().await?;
        if bytes.is_empty() {
            return Err(ProviderError::UnexpectedBody(format!(
                "{} returned no data",
                self.url
            )));
        }
        Ok(bytes.to_vec())
    }
}
