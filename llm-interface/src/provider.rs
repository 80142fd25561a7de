use insights_core::{CoreError, LlmError};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

pub const OPENAI_PROVIDER: &str = "openai";
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const COMPLETION_TIMEOUT: Duration = Duration::from_secs(90);

/// A chat model that answers a system + user prompt pair with a JSON document.
pub trait LlmProvider {
    fn name(&self) -> &str;

    fn complete_json(
        &self,
        system: &str,
        prompt: &str,
    ) -> impl Future<Output = Result<String, CoreError>> + Send;
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub response_format: ResponseFormat,
}

impl ChatRequest {
    pub fn json_object(model: impl Into<String>, temperature: f32) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature,
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
        }
    }

    pub fn message(mut self, message: ChatMessage) -> Self {
        self.messages.push(message);
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponseMessage {
    pub content: Option<String>,
}

/// OpenAI-compatible chat completions client.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    http_client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OpenAiProvider {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, CoreError> {
        let http_client = Client::builder().timeout(COMPLETION_TIMEOUT).build()?;
        Ok(Self {
            http_client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
        })
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn headers(&self) -> Result<HeaderMap, CoreError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key)).map_err(|_| {
            LlmError::InvalidApiKey {
                provider: OPENAI_PROVIDER.to_string(),
            }
        })?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, CoreError> {
        let url = format!("{}/chat/completions", self.base_url);
        let start_time = Instant::now();

        debug!(model = %request.model, "OpenAI chat request");
        let response = self
            .http_client
            .post(&url)
            .headers(self.headers()?)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!("OpenAI request failed: {}", e);
                if e.is_timeout() {
                    CoreError::Llm(LlmError::RequestTimeout {
                        provider: OPENAI_PROVIDER.to_string(),
                    })
                } else {
                    CoreError::Network(e)
                }
            })?;

        let status = response.status();
        debug!("OpenAI responded {} in {:?}", status, start_time.elapsed());
        if !status.is_success() {
            return Err(CoreError::Llm(status_error(response, status).await));
        }

        response.json().await.map_err(|e| {
            CoreError::Llm(LlmError::InvalidResponseFormat {
                provider: OPENAI_PROVIDER.to_string(),
                details: e.to_string(),
            })
        })
    }
}

impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        OPENAI_PROVIDER
    }

    async fn complete_json(&self, system: &str, prompt: &str) -> Result<String, CoreError> {
        let request = ChatRequest::json_object(&self.model, self.temperature)
            .message(ChatMessage::system(system))
            .message(ChatMessage::user(prompt));

        let response = self.chat(&request).await?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                CoreError::Llm(LlmError::EmptyCompletion {
                    provider: OPENAI_PROVIDER.to_string(),
                })
            })
    }
}

async fn status_error(response: Response, status: StatusCode) -> LlmError {
    let provider = OPENAI_PROVIDER.to_string();
    match status.as_u16() {
        401 => LlmError::InvalidApiKey { provider },
        429 => {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            warn!("OpenAI rate limited, retry after {} seconds", retry_after);
            LlmError::RateLimitExceeded {
                provider,
                retry_after,
            }
        }
        503 => LlmError::ServiceUnavailable { provider },
        code => {
            let body = response.text().await.unwrap_or_default();
            error!("OpenAI error ({}): {}", code, body);
            LlmError::RequestFailed {
                provider,
                status_code: code,
                body,
            }
        }
    }
}
