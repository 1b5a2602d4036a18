//! Replicate client for hosted vision model inference.
//!
//! Replicate runs models asynchronously: a prediction is created, then its
//! status URL is polled until it reaches a terminal state. The image travels
//! inline as a `data:` URL, so no separate upload step is needed.

use super::provider::{ImageInput, LlmClient};
use crate::error::{LlmError, LlmResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const PROVIDER: &str = "replicate";

/// Replicate client using the predictions API.
pub struct ReplicateClient {
    endpoint: String,
    api_token: String,
    version: String,
    poll_interval: Duration,
    timeout: Duration,
    client: reqwest::Client,
}

impl ReplicateClient {
    pub fn new(
        endpoint: &str,
        api_token: &str,
        version: &str,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
            version: version.to_string(),
            poll_interval,
            timeout,
            client: reqwest::Client::new(),
        }
    }
}

// --- Request types ---

#[derive(Serialize)]
struct CreatePrediction<'a> {
    version: &'a str,
    input: PredictionInput<'a>,
}

#[derive(Serialize)]
struct PredictionInput<'a> {
    image: String,
    prompt: &'a str,
}

// --- Response types ---

#[derive(Deserialize)]
struct Prediction {
    id: String,
    status: PredictionStatus,
    #[serde(default)]
    urls: PredictionUrls,
    #[serde(default)]
    output: Option<PredictionOutput>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Deserialize, Default)]
struct PredictionUrls {
    #[serde(default)]
    get: Option<String>,
    #[serde(default)]
    cancel: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl PredictionStatus {
    fn as_str(&self) -> &'static str {
        match self {
            PredictionStatus::Starting => "starting",
            PredictionStatus::Processing => "processing",
            PredictionStatus::Succeeded => "succeeded",
            PredictionStatus::Failed => "failed",
            PredictionStatus::Canceled => "canceled",
            PredictionStatus::Unknown => "unknown",
        }
    }
}

/// Language models stream tokens, so output is usually a list of fragments.
#[derive(Deserialize)]
#[serde(untagged)]
enum PredictionOutput {
    Text(String),
    Tokens(Vec<String>),
}

impl Prediction {
    fn into_description(self) -> LlmResult<String> {
        match self.output {
            Some(PredictionOutput::Text(text)) => Ok(text),
            Some(PredictionOutput::Tokens(tokens)) => Ok(tokens.concat()),
            None => Err(LlmError::Decode {
                provider: PROVIDER.to_string(),
                message: format!("prediction {} succeeded without output", self.id),
            }),
        }
    }

    fn failure(self) -> LlmError {
        let message = match self.error {
            Some(serde_json::Value::String(s)) => s,
            Some(serde_json::Value::Null) | None => "no error detail".to_string(),
            Some(other) => other.to_string(),
        };
        LlmError::Prediction {
            provider: PROVIDER.to_string(),
            status: self.status.as_str().to_string(),
            message,
        }
    }
}

impl ReplicateClient {
    /// Send a request and decode a prediction object from a 2xx response.
    async fn send(&self, request: reqwest::RequestBuilder) -> LlmResult<Prediction> {
        let request = request
            .bearer_auth(&self.api_token)
            .build()
            .map_err(|e| LlmError::Request {
                provider: PROVIDER.to_string(),
                message: e.to_string(),
            })?;

        let resp = self
            .client
            .execute(request)
            .await
            .map_err(|e| LlmError::Transport {
                provider: PROVIDER.to_string(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                provider: PROVIDER.to_string(),
                status_code: status.as_u16(),
                body: text,
            });
        }

        resp.json().await.map_err(|e| LlmError::Decode {
            provider: PROVIDER.to_string(),
            message: e.to_string(),
        })
    }

    /// Create a prediction and poll it to completion.
    ///
    /// `cancel_url` is filled in as soon as the prediction exists so the
    /// caller can cancel it if this future is abandoned on timeout.
    async fn run_prediction(
        &self,
        image: &[u8],
        prompt: &str,
        cancel_url: &mut Option<String>,
    ) -> LlmResult<String> {
        let body = CreatePrediction {
            version: &self.version,
            input: PredictionInput {
                image: ImageInput::from_bytes(image).data_url(),
                prompt,
            },
        };

        let url = format!("{}/predictions", self.endpoint);
        let mut prediction = self.send(self.client.post(&url).json(&body)).await?;
        *cancel_url = prediction.urls.cancel.clone();
        tracing::debug!(id = %prediction.id, "Replicate prediction created");

        loop {
            match prediction.status {
                PredictionStatus::Succeeded => return prediction.into_description(),
                PredictionStatus::Failed | PredictionStatus::Canceled => {
                    return Err(prediction.failure())
                }
                PredictionStatus::Starting
                | PredictionStatus::Processing
                | PredictionStatus::Unknown => {}
            }

            let get_url = prediction.urls.get.clone().ok_or_else(|| LlmError::Decode {
                provider: PROVIDER.to_string(),
                message: format!("prediction {} has no status URL", prediction.id),
            })?;

            tokio::time::sleep(self.poll_interval).await;
            prediction = self.send(self.client.get(&get_url)).await?;
        }
    }

    /// Best-effort cancel of an abandoned prediction.
    async fn cancel(&self, url: &str) {
        let result = self
            .client
            .post(url)
            .bearer_auth(&self.api_token)
            .timeout(Duration::from_secs(5))
            .send()
            .await;
        match result {
            Ok(resp) if resp.status().is_success() => {
                tracing::debug!("Canceled timed-out Replicate prediction");
            }
            Ok(resp) => {
                tracing::warn!(status_code = resp.status().as_u16(), "Replicate cancel rejected");
            }
            Err(e) => tracing::warn!("Replicate cancel failed: {e}"),
        }
    }
}

#[async_trait]
impl LlmClient for ReplicateClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    /// Only the deadline path cancels the remote prediction; if this future is
    /// dropped early the prediction keeps running on Replicate.
    async fn describe_image(&self, image: &[u8], prompt: &str) -> LlmResult<String> {
        let start = Instant::now();
        let mut cancel_url = None;

        let outcome =
            tokio::time::timeout(self.timeout, self.run_prediction(image, prompt, &mut cancel_url))
                .await;

        match outcome {
            Ok(result) => {
                tracing::debug!(
                    latency_ms = start.elapsed().as_millis() as u64,
                    success = result.is_ok(),
                    "Replicate prediction finished"
                );
                result
            }
            Err(_) => {
                if let Some(url) = cancel_url {
                    self.cancel(&url).await;
                }
                Err(LlmError::Timeout {
                    provider: PROVIDER.to_string(),
                    timeout_ms: self.timeout.as_millis() as u64,
                })
            }
        }
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

    fn client_for(server: &MockServer, timeout: Duration) -> ReplicateClient {
        ReplicateClient::new(
            &server.uri(),
            "r8_test",
            "v1hash",
            Duration::from_millis(20),
            timeout,
        )
    }

    fn prediction(server: &MockServer, status: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "abc",
            "status": status,
            "urls": {
                "get": format!("{}/predictions/abc", server.uri()),
                "cancel": format!("{}/predictions/abc/cancel", server.uri()),
            },
            "output": null,
            "error": null,
        })
    }

    #[test]
    fn test_output_shapes() {
        let text: Prediction =
            serde_json::from_str(r#"{"id":"a","status":"succeeded","output":"jazz"}"#).unwrap();
        assert_eq!(text.into_description().unwrap(), "jazz");

        let tokens: Prediction = serde_json::from_str(
            r#"{"id":"a","status":"succeeded","output":["smooth"," ","jazz"]}"#,
        )
        .unwrap();
        assert_eq!(tokens.into_description().unwrap(), "smooth jazz");

        let missing: Prediction =
            serde_json::from_str(r#"{"id":"a","status":"succeeded"}"#).unwrap();
        assert_eq!(missing.into_description().unwrap_err().kind(), "decode");
    }

    #[test]
    fn test_unknown_status_is_tolerated() {
        let p: Prediction = serde_json::from_str(r#"{"id":"a","status":"queued"}"#).unwrap();
        assert_eq!(p.status, PredictionStatus::Unknown);
    }

    #[tokio::test]
    async fn test_create_then_poll_until_succeeded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predictions"))
            .and(header("authorization", "Bearer r8_test"))
            .respond_with(ResponseTemplate::new(201).set_body_json(prediction(&server, "starting")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/predictions/abc"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(prediction(&server, "processing")),
            )
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        let mut done = prediction(&server, "succeeded");
        done["output"] = serde_json::json!(["chill ", "lo-fi ", "beats"]);
        Mock::given(method("GET"))
            .and(path("/predictions/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(done))
            .mount(&server)
            .await;

        let description = client_for(&server, Duration::from_secs(5))
            .describe_image(&[0xFF, 0xD8, 0xFF], "p")
            .await
            .unwrap();
        assert_eq!(description, "chill lo-fi beats");

        let requests = server.received_requests().await.unwrap();
        let create: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(create["version"], "v1hash");
        assert_eq!(create["input"]["prompt"], "p");
        assert_eq!(create["input"]["image"], "data:image/jpeg;base64,/9j/");
        // One create plus two polls
        assert_eq!(requests.len(), 3);
    }

    #[tokio::test]
    async fn test_failed_prediction_reports_error_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predictions"))
            .respond_with(ResponseTemplate::new(201).set_body_json(prediction(&server, "starting")))
            .mount(&server)
            .await;
        let mut failed = prediction(&server, "failed");
        failed["error"] = serde_json::json!("CUDA out of memory");
        Mock::given(method("GET"))
            .and(path("/predictions/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(failed))
            .mount(&server)
            .await;

        let err = client_for(&server, Duration::from_secs(5))
            .describe_image(&[1, 2], "p")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "prediction");
        assert!(err.to_string().contains("failed"));
        assert!(err.to_string().contains("CUDA out of memory"));
    }

    #[tokio::test]
    async fn test_rejected_create_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predictions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
            .mount(&server)
            .await;

        let err = client_for(&server, Duration::from_secs(5))
            .describe_image(&[1, 2], "p")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(401));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        // Port 9 (discard) on localhost is essentially never listening.
        let client = ReplicateClient::new(
            "http://127.0.0.1:9",
            "r8_test",
            "v1hash",
            Duration::from_millis(20),
            Duration::from_secs(5),
        );
        let err = client.describe_image(&[1, 2], "p").await.unwrap_err();
        assert_eq!(err.kind(), "transport");
        assert!(err.to_string().contains("failed to send request to replicate"));
    }

    #[tokio::test]
    async fn test_timeout_cancels_prediction() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predictions"))
            .respond_with(ResponseTemplate::new(201).set_body_json(prediction(&server, "starting")))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/predictions/abc"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(prediction(&server, "processing")),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/predictions/abc/cancel"))
            .respond_with(ResponseTemplate::new(200).set_body_json(prediction(&server, "canceled")))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server, Duration::from_millis(200))
            .describe_image(&[1, 2], "p")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "timeout");
    }
}
