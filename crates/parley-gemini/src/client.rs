// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Gemini `generateContent` API.
//!
//! Provides [`GeminiClient`] which handles request construction,
//! authentication, retries, and fetching images for inline upload.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use parley_core::ParleyError;
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, GenerateContentRequest, GenerateContentResponse};

/// Base URL for the Generative Language API.
pub const API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Per-request deadline for `generateContent` calls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// HTTP client for Gemini API communication.
///
/// Every non-success response is retried until `max_attempts` requests have
/// been made, sleeping `retry_delay` between attempts.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    max_attempts: u32,
    retry_delay: Duration,
    request_timeout: Duration,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Result<Self, ParleyError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ParleyError::Generator {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            api_key,
            model,
            base_url: API_BASE_URL.to_string(),
            max_attempts: 3,
            retry_delay: Duration::from_secs(5),
            request_timeout: REQUEST_TIMEOUT,
        })
    }

    /// Overrides the API base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the attempt budget and the pause between attempts.
    pub fn with_retries(mut self, max_attempts: u32, retry_delay: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.retry_delay = retry_delay;
        self
    }

    /// Overrides the per-request deadline.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// Sends a request and returns the parsed response.
    pub async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ParleyError> {
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                warn!(attempt, "retrying generateContent request");
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = match self
                .client
                .post(self.endpoint())
                .header("x-goog-api-key", &self.api_key)
                .timeout(self.request_timeout)
                .json(request)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) if e.is_timeout() => {
                    warn!(
                        attempt,
                        timeout = ?self.request_timeout,
                        "generateContent request timed out"
                    );
                    last_error = Some(ParleyError::Timeout {
                        duration: self.request_timeout,
                    });
                    continue;
                }
                Err(e) => {
                    warn!(error = %e, attempt, "generateContent request failed");
                    last_error = Some(ParleyError::Generator {
                        message: format!("HTTP request failed: {e}"),
                        source: Some(Box::new(e)),
                    });
                    continue;
                }
            };

            let status = response.status();
            debug!(status = %status, attempt, "generateContent response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| ParleyError::Generator {
                    message: format!("failed to read response body: {e}"),
                    source: Some(Box::new(e)),
                })?;
                return serde_json::from_str(&body).map_err(|e| ParleyError::Generator {
                    message: format!("failed to parse API response: {e}"),
                    source: Some(Box::new(e)),
                });
            }

            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!(
                    "Gemini API error ({}): {}",
                    api_err.error.status.unwrap_or_else(|| status.to_string()),
                    api_err.error.message
                ),
                Err(_) => format!("API returned {status}: {body}"),
            };
            warn!(status = %status, attempt, "generateContent returned an error");
            last_error = Some(ParleyError::generator(message));
        }

        Err(last_error.unwrap_or_else(|| {
            ParleyError::generator("generateContent failed after retries")
        }))
    }

    /// Downloads an image and returns its MIME type and base64 payload.
    ///
    /// The response's `Content-Type` wins over `fallback_mime` when it names an image.
    pub async fn fetch_image(
        &self,
        url: &str,
        fallback_mime: &str,
    ) -> Result<(String, String), ParleyError> {
        let response = self
            .client
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| ParleyError::Generator {
                message: format!("failed to fetch image: {e}"),
                source: Some(Box::new(e)),
            })?;

        let mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .filter(|v| v.starts_with("image/"))
            .unwrap_or_else(|| fallback_mime.to_string());

        let bytes = response.bytes().await.map_err(|e| ParleyError::Generator {
            message: format!("failed to read image body: {e}"),
            source: Some(Box::new(e)),
        })?;
        Ok((mime, STANDARD.encode(&bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Content, GenerationConfig, Part};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GENERATE_PATH: &str = "/v1beta/models/gemini-test:generateContent";

    fn test_client(base_url: &str) -> GeminiClient {
        GeminiClient::new("test-api-key".into(), "gemini-test".into())
            .unwrap()
            .with_base_url(base_url)
            .with_retries(3, Duration::from_millis(1))
    }

    fn test_request() -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::new("user", vec![Part::text("Hello")])],
            system_instruction: None,
            tools: vec![],
            generation_config: GenerationConfig {
                temperature: 1.0,
                max_output_tokens: 256,
            },
        }
    }

    fn text_response(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
        })
    }

    #[tokio::test]
    async fn generate_content_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(header("x-goog-api-key", "test-api-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response("Hi there!")))
            .mount(&server)
            .await;

        let response = test_client(&server.uri())
            .generate_content(&test_request())
            .await
            .unwrap();
        assert_eq!(
            response.first_parts().unwrap()[0].text.as_deref(),
            Some("Hi there!")
        );
    }

    #[tokio::test]
    async fn generate_content_retries_on_500() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response("After retry")))
            .mount(&server)
            .await;

        let response = test_client(&server.uri())
            .generate_content(&test_request())
            .await
            .unwrap();
        assert_eq!(
            response.first_parts().unwrap()[0].text.as_deref(),
            Some("After retry")
        );
    }

    #[tokio::test]
    async fn generate_content_exhausts_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}
            })))
            .expect(3)
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .generate_content(&test_request())
            .await
            .unwrap_err();
        let text = err.to_string();
        assert!(matches!(err, ParleyError::Generator { .. }));
        assert!(text.contains("RESOURCE_EXHAUSTED"), "got: {text}");
    }

    #[tokio::test]
    async fn single_attempt_budget_does_not_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri()).with_retries(0, Duration::from_millis(1));
        assert!(client.generate_content(&test_request()).await.is_err());
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(text_response("too late"))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .with_retries(1, Duration::from_millis(1))
            .with_request_timeout(Duration::from_millis(50))
            .generate_content(&test_request())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ParleyError::Timeout { duration } if duration == Duration::from_millis(50)
        ));
    }

    #[tokio::test]
    async fn fetch_image_encodes_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(vec![1u8, 2, 3]),
            )
            .mount(&server)
            .await;

        let (mime, data) = test_client(&server.uri())
            .fetch_image(&format!("{}/a.png", server.uri()), "image/jpeg")
            .await
            .unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(data, "AQID");
    }

    #[tokio::test]
    async fn fetch_image_fails_on_404() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = test_client(&server.uri())
            .fetch_image(&format!("{}/gone.jpg", server.uri()), "image/jpeg")
            .await;
        assert!(result.is_err());
    }
}
