//! Ollama client for local vision model inference.
//!
//! Talks to a local Ollama instance via its HTTP API.
//! No authentication required, just a reachable host.

use super::provider::{ImageInput, LlmClient};
use crate::error::{LlmError, LlmResult};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const PROVIDER: &str = "ollama";

/// Ollama client for local vision model inference.
pub struct OllamaClient {
    endpoint: String,
    model: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(endpoint: &str, model: &str, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            timeout,
            client: reqwest::Client::new(),
        }
    }

    fn timeout_error(&self) -> LlmError {
        LlmError::Timeout {
            provider: PROVIDER.to_string(),
            timeout_ms: self.timeout.as_millis() as u64,
        }
    }
}

/// Ollama /api/generate request body.
#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    images: Vec<String>,
    stream: bool,
}

/// Ollama /api/generate response.
#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[async_trait]
impl LlmClient for OllamaClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn describe_image(&self, image: &[u8], prompt: &str) -> LlmResult<String> {
        let url = format!("{}/api/generate", self.endpoint);
        let start = Instant::now();

        let body = GenerateRequest {
            model: &self.model,
            prompt,
            images: vec![ImageInput::from_bytes(image).data],
            stream: false,
        };

        let request = self
            .client
            .post(&url)
            .json(&body)
            .timeout(self.timeout)
            .build()
            .map_err(|e| LlmError::Request {
                provider: PROVIDER.to_string(),
                message: e.to_string(),
            })?;

        let resp = self.client.execute(request).await.map_err(|e| {
            if e.is_timeout() {
                self.timeout_error()
            } else {
                LlmError::Transport {
                    provider: PROVIDER.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = resp.status();
        if status != StatusCode::OK {
            let text = resp.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                provider: PROVIDER.to_string(),
                status_code: status.as_u16(),
                body: text,
            });
        }

        // The per-request timeout also covers the body read.
        let generated: GenerateResponse = resp.json().await.map_err(|e| {
            if e.is_timeout() {
                self.timeout_error()
            } else {
                LlmError::Decode {
                    provider: PROVIDER.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        tracing::debug!(
            model = %self.model,
            latency_ms = start.elapsed().as_millis() as u64,
            "Ollama description generated"
        );

        Ok(generated.response)
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OllamaClient {
        OllamaClient::new(&server.uri(), "llava", Duration::from_secs(5))
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let client = OllamaClient::new("http://localhost:11434/", "llava", Duration::from_secs(1));
        assert_eq!(client.endpoint, "http://localhost:11434");
    }

    #[tokio::test]
    async fn test_request_body_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(header("content-type", "application/json"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"response": "lo-fi"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let description = client_for(&server)
            .describe_image(&[0xAB, 0xCD], "p")
            .await
            .unwrap();
        assert_eq!(description, "lo-fi");

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["model"], "llava");
        assert_eq!(body["prompt"], "p");
        assert_eq!(body["images"], serde_json::json!(["q80="]));
        assert_eq!(body["stream"], false);
    }

    #[tokio::test]
    async fn test_description_returned_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"response": "  dreamy synthwave\n"})),
            )
            .mount(&server)
            .await;

        let description = client_for(&server).describe_image(b"img", "p").await.unwrap();
        assert_eq!(description, "  dreamy synthwave\n");
    }

    #[tokio::test]
    async fn test_non_200_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model 'llava' not found"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .describe_image(&[1, 2], "p")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(404));
        assert!(err.to_string().contains("non-200 status code: 404"));
        match err {
            LlmError::Status { body, .. } => assert!(body.contains("not found")),
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_other_success_codes_are_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        let err = client_for(&server).describe_image(&[1], "p").await.unwrap_err();
        assert_eq!(err.status_code(), Some(202));
    }

    #[tokio::test]
    async fn test_malformed_response_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client_for(&server).describe_image(&[1], "p").await.unwrap_err();
        assert_eq!(err.kind(), "decode");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        // Port 9 (discard) on localhost is essentially never listening.
        let client = OllamaClient::new("http://127.0.0.1:9", "llava", Duration::from_secs(5));
        let err = client.describe_image(&[1], "p").await.unwrap_err();
        assert_eq!(err.kind(), "transport");
    }

    #[tokio::test]
    async fn test_stalled_body_read_is_timeout() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        // Sends headers and half a body, then goes silent.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let stalled = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 64\r\n\r\n{\"resp",
                )
                .await
                .unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let client = OllamaClient::new(&format!("http://{addr}"), "llava", Duration::from_millis(300));
        let err = client.describe_image(&[1], "p").await.unwrap_err();
        assert_eq!(err.kind(), "timeout");
        stalled.abort();
    }

    #[tokio::test]
    async fn test_slow_backend_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"response": "late"}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let client = OllamaClient::new(&server.uri(), "llava", Duration::from_millis(100));
        let err = client.describe_image(&[1], "p").await.unwrap_err();
        assert_eq!(err.kind(), "timeout");
    }
}
