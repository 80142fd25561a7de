use crate::prompt::{analysis_prompt, preview_prompt, SYSTEM_MESSAGE};
use crate::provider::{LlmProvider, OpenAiProvider, DEFAULT_TEMPERATURE};
use insights_core::{AppConfig, CoreError, InsightResult, LlmError};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::{info, warn};

/// Model settings shared by every extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
}

impl LlmSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            base_url: config.openai_base_url.clone(),
            model: config.openai_model.clone(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// What an extraction produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    /// No credential was available; the caller gets the prompt to run elsewhere.
    PromptOnly { prompt: String },
    Insights(InsightResult),
    Failed { message: String },
}

impl ExtractionOutcome {
    pub fn is_prompt_only(&self) -> bool {
        matches!(self, ExtractionOutcome::PromptOnly { .. })
    }

    pub fn insights(&self) -> Option<&InsightResult> {
        match self {
            ExtractionOutcome::Insights(insights) => Some(insights),
            _ => None,
        }
    }
}

impl Serialize for ExtractionOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ExtractionOutcome::PromptOnly { prompt } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("no_api_key", &true)?;
                map.serialize_entry("prompt", prompt)?;
                map.end()
            }
            ExtractionOutcome::Insights(insights) => insights.serialize(serializer),
            ExtractionOutcome::Failed { message } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("error", message)?;
                map.end()
            }
        }
    }
}

/// An outcome together with the formatted thread it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    #[serde(flatten)]
    pub outcome: ExtractionOutcome,
    pub raw_data: String,
}

pub struct InsightExtractor {
    default_api_key: Option<String>,
    settings: LlmSettings,
}

impl InsightExtractor {
    pub fn new(default_api_key: Option<String>, settings: LlmSettings) -> Self {
        Self {
            default_api_key: default_api_key.filter(|key| !key.trim().is_empty()),
            settings,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.openai_api_key.clone(),
            LlmSettings::from_config(config),
        )
    }

    pub fn settings(&self) -> &LlmSettings {
        &self.settings
    }

    pub fn has_default_key(&self) -> bool {
        self.default_api_key.is_some()
    }

    /// A non-blank per-request key wins over the configured one.
    pub fn resolve_api_key<'a>(&'a self, user_key: Option<&'a str>) -> Option<&'a str> {
        user_key
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .or(self.default_api_key.as_deref())
    }

    /// Runs the analysis against the configured OpenAI endpoint, or returns the
    /// preview prompt when no key resolves. Never fails; provider errors end up
    /// in [`ExtractionOutcome::Failed`].
    pub async fn extract(
        &self,
        formatted: &str,
        subreddit: &str,
        user_key: Option<&str>,
    ) -> Extraction {
        let Some(api_key) = self.resolve_api_key(user_key) else {
            info!("No API key available, returning prompt for r/{}", subreddit);
            return prompt_only(formatted, subreddit);
        };

        let provider = match OpenAiProvider::new(
            api_key,
            self.settings.base_url.as_str(),
            self.settings.model.as_str(),
        ) {
            Ok(provider) => provider.with_temperature(self.settings.temperature),
            Err(e) => return failed(formatted, &e),
        };

        extract_with(&provider, formatted, subreddit).await
    }
}

pub fn prompt_only(formatted: &str, subreddit: &str) -> Extraction {
    Extraction {
        outcome: ExtractionOutcome::PromptOnly {
            prompt: preview_prompt(formatted, subreddit),
        },
        raw_data: formatted.to_string(),
    }
}

/// One analysis round trip through `provider`.
pub async fn extract_with<P: LlmProvider>(
    provider: &P,
    formatted: &str,
    subreddit: &str,
) -> Extraction {
    let prompt = analysis_prompt(formatted, subreddit);
    let result = match provider.complete_json(SYSTEM_MESSAGE, &prompt).await {
        Ok(content) => parse_insights(provider.name(), &content),
        Err(e) => Err(e),
    };

    match result {
        Ok(insights) => {
            info!(
                "{} extracted {} pain points and {} product ideas from r/{}",
                provider.name(),
                insights.pain_points.len(),
                insights.product_ideas.len(),
                subreddit
            );
            Extraction {
                outcome: ExtractionOutcome::Insights(insights),
                raw_data: formatted.to_string(),
            }
        }
        Err(e) => failed(formatted, &e),
    }
}

/// Parses a completion into insights. Anything but a JSON object is rejected.
pub fn parse_insights(provider: &str, content: &str) -> Result<InsightResult, CoreError> {
    let invalid = |details: String| {
        CoreError::Llm(LlmError::InvalidResponseFormat {
            provider: provider.to_string(),
            details,
        })
    };

    let value: Value = serde_json::from_str(content).map_err(|e| invalid(e.to_string()))?;
    if !value.is_object() {
        return Err(invalid("expected a JSON object".to_string()));
    }
    serde_json::from_value(value).map_err(|e| invalid(e.to_string()))
}

fn failed(formatted: &str, error: &CoreError) -> Extraction {
    warn!("LLM analysis failed: {}", error);
    let detail = match error {
        CoreError::Llm(inner) => inner.to_string(),
        other => other.to_string(),
    };
    Extraction {
        outcome: ExtractionOutcome::Failed {
            message: format!("LLM analysis failed: {}", detail),
        },
        raw_data: formatted.to_string(),
    }
}
