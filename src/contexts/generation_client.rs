use crate::contexts::GenerationError;
use crate::data::Credentials;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error};

pub const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_API_VERSION: &str = "2023-06-01";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Transport that turns a prompt into raw model text.
///
/// One call is one outbound request; implementations never retry.
pub trait GenerationBackend {
    fn invoke(
        &self,
        prompt: &str,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<String, GenerationError>> + Send;
}

/// Settings for [`HttpGenerationClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: String,
    pub model: String,
    pub api_version: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            max_tokens: 1024,
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Messages-API client over `reqwest`, with the timeout applied to every call
#[derive(Debug, Clone)]
pub struct HttpGenerationClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl HttpGenerationClient {
    pub fn new(config: ClientConfig) -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GenerationError::UpstreamError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn transport_error(&self, e: reqwest::Error) -> GenerationError {
        if e.is_timeout() {
            GenerationError::UpstreamError(format!(
                "request timed out after {}s",
                self.config.timeout.as_secs_f64()
            ))
        } else {
            GenerationError::UpstreamError(format!("request failed: {}", e))
        }
    }
}

impl GenerationBackend for HttpGenerationClient {
    async fn invoke(&self, prompt: &str, credentials: &Credentials) -> Result<String, GenerationError> {
        if credentials.is_blank() {
            return Err(GenerationError::MissingCredentials);
        }

        let body = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };

        debug!(endpoint = %self.config.endpoint, model = %self.config.model, prompt_chars = prompt.chars().count(), "Sending generation request");

        let response = self
            .http
            .post(&self.config.endpoint)
            .header("x-api-key", credentials.expose())
            .header("anthropic-version", &self.config.api_version)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            let err = classify_failure(status, &text);
            if let GenerationError::BadRequest(detail) = &err {
                error!(status = status.as_u16(), detail = %detail, "Generation endpoint rejected request as malformed");
            }
            return Err(err);
        }

        debug!(status = status.as_u16(), body_bytes = text.len(), "Generation request succeeded");
        extract_text(&text)
    }
}

/// Maps a non-success status to its failure kind; the body is kept as context only
fn classify_failure(status: StatusCode, body: &str) -> GenerationError {
    let detail = format!("{} {}", status.as_u16(), diagnostic_message(body));
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GenerationError::AuthenticationRejected(detail),
        StatusCode::TOO_MANY_REQUESTS => GenerationError::RateLimited(detail),
        StatusCode::BAD_REQUEST => GenerationError::BadRequest(detail),
        _ => GenerationError::UpstreamError(detail),
    }
}

fn diagnostic_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) => body.chars().take(200).collect::<String>().trim().to_string(),
    }
}

/// Concatenates the text blocks of a successful response body
fn extract_text(body: &str) -> Result<String, GenerationError> {
    let response: MessagesResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::UpstreamError(format!("Failed to decode response body: {}", e)))?;

    let text: String = response
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect();

    Ok(text)
}
