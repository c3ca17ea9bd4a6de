use crate::api::{VideoProvider, read_error_body};
use crate::config::GenerationParams;
use crate::error::ProviderError;
use crate::{logi, logw};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const BODY_SNIPPET_CHARS: usize = 200;

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: &'a GenerationParams,
}

#[derive(Debug, Default, Deserialize)]
struct InferenceErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    estimated_time: Option<f64>,
}

/// Text-to-video through the Hugging Face inference router.
pub struct HuggingFaceVideo {
    client: Client,
    endpoint: String,
    token: String,
    params: GenerationParams,
    timeout: Duration,
}

impl HuggingFaceVideo {
    pub fn new(
        client: Client,
        endpoint: impl Into<String>,
        token: impl Into<String>,
        params: GenerationParams,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            token: token.into(),
            params,
            timeout,
        }
    }
}

#[async_trait]
impl VideoProvider for HuggingFaceVideo {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, ProviderError> {
        let body = InferenceRequest {
            inputs: prompt,
            parameters: &self.params,
        };

        logi(format!(
            "Requesting {} frames ({} steps, {}x{}) from {}",
            self.params.num_frames,
            self.params.num_inference_steps,
            self.params.width,
            self.params.height,
            self.endpoint
        ));

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .header("Accept", "video/mp4")
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = resp.status();
        let is_json = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/json"));

        if !status.is_success() {
            let raw = read_error_body(resp).await?;
            let err = classify_failure(status.as_u16(), &raw);
            logw(format!("Video generation failed: {}", err));
            return Err(err);
        }

        if is_json {
            let raw = read_error_body(resp).await?;
            return Err(ProviderError::UnexpectedBody(snippet(&raw)));
        }

        let bytes = resp.bytes().await?;
        if bytes.is_empty() {
            return Err(ProviderError::UnexpectedBody(
                "empty video body".to_string(),
            ));
        }
        Ok(bytes.to_vec())
    }
}

/// Maps a non-success response to a provider error. A missing, retired or
/// still-loading model is the expected `ModelUnavailable` case.
pub fn classify_failure(status: u16, body: &str) -> ProviderError {
    let parsed: InferenceErrorBody = serde_json::from_str(body).unwrap_or_default();
    let mut detail = parsed.error.unwrap_or_else(|| snippet(body));
    if detail.is_empty() {
        detail = "no response body".to_string();
    }

    match status {
        404 | 410 | 503 => {
            if let Some(eta) = parsed.estimated_time {
                detail = format!("{detail} (estimated wait {eta:.0}s)");
            }
            ProviderError::ModelUnavailable { status, detail }
        }
        _ => ProviderError::Status { status, detail },
    }
}

fn snippet(body: &str) -> String {
    body.trim().chars().take(BODY_SNIPPET_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loading_model_is_unavailable() {
        let err = classify_failure(
            503,
            r#"{"error":"Model cerspense/zeroscope_v2_576w is currently loading","estimated_time":41.7}"#,
        );
        match err {
            ProviderError::ModelUnavailable { status, detail } => {
                assert_eq!(status, 503);
                assert!(detail.contains("currently loading"));
                assert!(detail.contains("estimated wait 42s"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_missing_model_is_unavailable() {
        let err = classify_failure(404, "Not Found");
        assert!(matches!(
            err,
            ProviderError::ModelUnavailable { status: 404, ref detail } if detail == "Not Found"
        ));
    }

    #[test]
    fn test_other_status_is_plain_error() {
        let err = classify_failure(401, r#"{"error":"Invalid credentials in Authorization header"}"#);
        assert!(matches!(
            err,
            ProviderError::Status { status: 401, ref detail } if detail.starts_with("Invalid credentials")
        ));
    }

    #[test]
    fn test_long_body_is_truncated() {
        let body = "x".repeat(1000);
        match classify_failure(500, &body) {
            ProviderError::Status { detail, .. } => assert_eq!(detail.len(), BODY_SNIPPET_CHARS),
            other => panic!("unexpected {other:?}"),
        }
    }

    /// Serves one response whose body is shorter than its Content-Length.
    async fn serve_truncated(status_line: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = sock.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf).to_string();
                if let Some(end) = text.find("\r\n\r\n") {
                    let len = text[..end]
                        .lines()
                        .find_map(|l| {
                            let (k, v) = l.split_once(':')?;
                            k.eq_ignore_ascii_case("content-length")
                                .then(|| v.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if buf.len() >= end + 4 + len {
                        break;
                    }
                }
            }
            let reply = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: 100\r\nConnection: close\r\n\r\n{{\"error\":"
            );
            sock.write_all(reply.as_bytes()).await.unwrap();
            sock.shutdown().await.ok();
        });
        format!("http://{addr}/models/test")
    }

    fn provider(endpoint: String) -> HuggingFaceVideo {
        HuggingFaceVideo::new(
            Client::builder().no_proxy().build().unwrap(),
            endpoint,
            "hf_test",
            GenerationParams::default(),
            Duration::from_secs(10),
        )
    }

    #[tokio::test]
    async fn test_truncated_error_body_is_transport_failure() {
        let endpoint = serve_truncated("503 Service Unavailable").await;
        let err = provider(endpoint).generate("a cat surfing").await.unwrap_err();
        match err {
            ProviderError::Transport(msg) => assert!(msg.contains("HTTP 503"), "{msg}"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_truncated_json_success_body_is_transport_failure() {
        let endpoint = serve_truncated("200 OK").await;
        let err = provider(endpoint).generate("a cat surfing").await.unwrap_err();
        assert!(matches!(err, ProviderError::Transport(_)), "{err:?}");
    }

    #[test]
    fn test_request_body_shape() {
        let params = GenerationParams::default();
        let body = serde_json::to_value(InferenceRequest {
            inputs: "a cat surfing",
            parameters: &params,
        })
        .unwrap();
        assert_eq!(body["inputs"], "a cat surfing");
        assert_eq!(body["parameters"]["num_frames"], 24);
        assert_eq!(body["parameters"]["guidance_scale"], 7.5);
    }
}
