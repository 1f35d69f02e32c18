//! Gemini client for free-form chatbot answers.
//!
//! Wraps the `generateContent` REST endpoint with:
//! - API key authentication via `x-goog-api-key`
//! - Request ID propagation for tracing
//! - Exponential backoff on transient failures (connect errors, 429, 5xx)

use anyhow::{Context, Result};
use backoff::{future::retry, ExponentialBackoff, ExponentialBackoffBuilder};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, instrument, warn};
use url::Url;

use crate::domain::chat::{ChatRole, ChatTurn};
use crate::error::ApiError;

/// Client for the Gemini generative language API.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: Url,
    api_key: String,
    model: String,
    max_retry: Duration,
}

/// Error body returned by the Gemini API.
#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if any.
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

/// Gemini uses "model" for assistant turns.
fn gemini_role(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "user",
        ChatRole::Assistant => "model",
    }
}

impl GeminiClient {
    /// Create a new Gemini client.
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        timeout_seconds: u64,
        max_retry_seconds: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))
            .context("Invalid GEMINI_BASE_URL")?;

        tracing::info!(base_url = %base_url, model = model, "Gemini client initialized");

        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
            model: model.to_string(),
            max_retry: Duration::from_secs(max_retry_seconds),
        })
    }

    fn endpoint(&self, suffix: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(&format!("v1beta/models/{}{}", self.model, suffix))
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("Invalid Gemini URL: {}", e)))
    }

    fn backoff_policy(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(250))
            .with_max_elapsed_time(Some(self.max_retry))
            .build()
    }

    /// Send one generateContent call, classifying failures for retry.
    async fn send_once(
        &self,
        url: &Url,
        body: &GenerateContentRequest<'_>,
        request_id: Option<&str>,
    ) -> Result<GenerateContentResponse, backoff::Error<ApiError>> {
        let mut req = self
            .client
            .post(url.clone())
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json");

        if let Some(rid) = request_id {
            req = req.header("x-request-id", rid);
        }

        let response = req.json(body).send().await.map_err(|e| {
            warn!(error = %e, "Gemini request failed");
            let err = ApiError::Internal(anyhow::anyhow!("Gemini unavailable: {}", e));
            if e.is_connect() || e.is_timeout() {
                backoff::Error::transient(err)
            } else {
                backoff::Error::permanent(err)
            }
        })?;

        let status = response.status();

        if status.is_success() {
            return response.json::<GenerateContentResponse>().await.map_err(|e| {
                error!(error = %e, "Failed to parse Gemini response");
                backoff::Error::permanent(ApiError::Internal(anyhow::anyhow!(
                    "Invalid Gemini response: {}",
                    e
                )))
            });
        }

        let message = response
            .json::<GeminiErrorResponse>()
            .await
            .map(|e| e.error.message)
            .unwrap_or_else(|_| format!("Gemini error: {}", status));

        match status {
            StatusCode::BAD_REQUEST => Err(backoff::Error::permanent(ApiError::BadRequest(message))),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                error!("Gemini authentication failed");
                Err(backoff::Error::permanent(ApiError::Internal(anyhow::anyhow!(
                    "Gemini auth error"
                ))))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                warn!("Gemini rate limited");
                Err(backoff::Error::transient(ApiError::Internal(anyhow::anyhow!(
                    "Gemini rate limited: {}",
                    message
                ))))
            }
            s if s.is_server_error() => {
                warn!(status = %s, message = %message, "Gemini server error");
                Err(backoff::Error::transient(ApiError::Internal(anyhow::anyhow!(message))))
            }
            _ => {
                error!(status = %status, message = %message, "Gemini error");
                Err(backoff::Error::permanent(ApiError::Internal(anyhow::anyhow!(message))))
            }
        }
    }

    /// Generate a reply to the last user turn given earlier conversation.
    #[instrument(skip(self, history), fields(model = %self.model, turns = history.len()))]
    pub async fn generate_reply(
        &self,
        system_prompt: &str,
        history: &[ChatTurn],
        request_id: Option<&str>,
    ) -> Result<String, ApiError> {
        let url = self.endpoint(":generateContent")?;

        let body = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part { text: system_prompt }],
            },
            contents: history
                .iter()
                .map(|turn| Content {
                    role: Some(gemini_role(turn.role)),
                    parts: vec![Part { text: &turn.text }],
                })
                .collect(),
            generation_config: GenerationConfig {
                temperature: 0.7,
                max_output_tokens: 512,
            },
        };

        debug!(url = %url.path(), "Gemini request");

        let response = retry(self.backoff_policy(), || self.send_once(&url, &body, request_id)).await?;

        response
            .into_text()
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("Gemini returned no text")))
    }

    /// Check that the configured model is reachable with our key.
    pub async fn health_check(&self) -> Result<()> {
        let url = self.endpoint("").map_err(|e| anyhow::anyhow!(e.to_string()))?;

        self.client
            .get(url)
            .header("x-goog-api-key", &self.api_key)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .context("Gemini health check failed")?
            .error_for_status()
            .context("Gemini unhealthy")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn client(base: &str) -> GeminiClient {
        GeminiClient::new(base, "key", "gemini-1.5-flash", 5, 1).unwrap()
    }

    #[test]
    fn endpoint_handles_trailing_slash() {
        let a = client("https://generativelanguage.googleapis.com");
        let b = client("https://generativelanguage.googleapis.com/");

        let expected = "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";
        assert_eq!(a.endpoint(":generateContent").unwrap().as_str(), expected);
        assert_eq!(b.endpoint(":generateContent").unwrap().as_str(), expected);
    }

    #[test]
    fn request_body_uses_gemini_roles() {
        let history = vec![
            ChatTurn { role: ChatRole::User, text: "Hallo".into() },
            ChatTurn { role: ChatRole::Assistant, text: "Dag!".into() },
            ChatTurn { role: ChatRole::User, text: "Zonnepanelen?".into() },
        ];
        let body = GenerateContentRequest {
            system_instruction: Content { role: None, parts: vec![Part { text: "sys" }] },
            contents: history
                .iter()
                .map(|t| Content { role: Some(gemini_role(t.role)), parts: vec![Part { text: &t.text }] })
                .collect(),
            generation_config: GenerationConfig { temperature: 0.5, max_output_tokens: 10 },
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["systemInstruction"], serde_json::json!({"parts": [{"text": "sys"}]}));
        assert_eq!(json["contents"][1]["role"], "model");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 10);
    }

    #[test]
    fn response_text_joins_parts_of_first_candidate() {
        let resp: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Ja, "},{"text":"dat kan. "}]}},
                              {"content":{"parts":[{"text":"ignored"}]}}]}"#,
        )
        .unwrap();

        assert_eq!(resp.into_text().as_deref(), Some("Ja, dat kan."));
    }

    #[test]
    fn empty_response_yields_none() {
        let resp: GenerateContentResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert_eq!(resp.into_text(), None);

        let blocked: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert_eq!(blocked.into_text(), None);
    }
}
