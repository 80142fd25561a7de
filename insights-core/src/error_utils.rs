use crate::error::*;
use tracing::{error, warn, Level};

pub trait ErrorExt {
    /// Stable code for logs and dashboards.
    fn error_code(&self) -> &'static str;

    /// Informational only; nothing in the pipeline retries on its own.
    fn is_retryable(&self) -> bool;

    fn user_friendly_message(&self) -> String;

    /// Errors caused by what the caller sent rather than by the service.
    fn is_caller_fault(&self) -> bool {
        false
    }
}

impl ErrorExt for CoreError {
    fn error_code(&self) -> &'static str {
        match self {
            CoreError::RedditApi(_) => "REDDIT_API",
            CoreError::Llm(_) => "LLM",
            CoreError::Config(_) => "CONFIG",
            CoreError::Io(_) => "IO",
            CoreError::Serialization(_) => "SERIALIZATION",
            CoreError::Network(_) => "NETWORK",
            CoreError::InvalidInput { .. } => "INVALID_INPUT",
            CoreError::EmptyThread { .. } => "EMPTY_THREAD",
            CoreError::Timeout { .. } => "TIMEOUT",
            CoreError::NotFound { .. } => "NOT_FOUND",
            CoreError::Internal { .. } => "INTERNAL",
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            CoreError::RedditApi(e) => e.is_retryable(),
            CoreError::Llm(e) => e.is_retryable(),
            CoreError::Network(_) | CoreError::Timeout { .. } => true,
            _ => false,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::RedditApi(e) => e.user_friendly_message(),
            CoreError::Llm(e) => e.user_friendly_message(),
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::InvalidInput { message } => message.clone(),
            CoreError::EmptyThread { .. } => "No content found in this thread".to_string(),
            CoreError::Network(_) => "Could not reach Reddit. Check the connection.".to_string(),
            CoreError::Timeout { seconds } => {
                format!("Gave up after {} seconds waiting for Reddit.", seconds)
            }
            CoreError::NotFound { resource } => format!("Could not find: {}", resource),
            _ => "Something went wrong on our side. Please try again later.".to_string(),
        }
    }

    fn is_caller_fault(&self) -> bool {
        match self {
            CoreError::InvalidInput { .. } | CoreError::EmptyThread { .. } => true,
            CoreError::RedditApi(e) => e.is_caller_fault(),
            CoreError::Llm(e) => e.is_caller_fault(),
            _ => false,
        }
    }
}

impl ErrorExt for RedditApiError {
    fn error_code(&self) -> &'static str {
        match self {
            RedditApiError::RateLimitExceeded { .. } => "REDDIT_RATE_LIMIT",
            RedditApiError::Forbidden { .. } => "REDDIT_FORBIDDEN",
            RedditApiError::NotFound { .. } => "REDDIT_NOT_FOUND",
            RedditApiError::RequestTimeout => "REDDIT_TIMEOUT",
            RedditApiError::InvalidResponse { .. } => "REDDIT_INVALID_RESPONSE",
            RedditApiError::ServerError { .. } => "REDDIT_SERVER_ERROR",
            RedditApiError::UnexpectedStatus { .. } => "REDDIT_UNEXPECTED_STATUS",
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            RedditApiError::RateLimitExceeded { .. }
                | RedditApiError::RequestTimeout
                | RedditApiError::ServerError { .. }
        )
    }

    fn user_friendly_message(&self) -> String {
        match self {
            RedditApiError::RateLimitExceeded { retry_after } => format!(
                "Reddit is throttling us. Try again in {} seconds.",
                retry_after
            ),
            RedditApiError::Forbidden { resource } => {
                format!("{} is private or quarantined.", resource)
            }
            RedditApiError::NotFound { resource } => format!("{} does not exist on Reddit.", resource),
            RedditApiError::RequestTimeout => "Reddit timed out. Try again shortly.".to_string(),
            RedditApiError::InvalidResponse { .. } => {
                "Reddit sent something that is not a thread.".to_string()
            }
            RedditApiError::ServerError { .. } | RedditApiError::UnexpectedStatus { .. } => {
                "Reddit is having trouble right now.".to_string()
            }
        }
    }

    fn is_caller_fault(&self) -> bool {
        matches!(
            self,
            RedditApiError::Forbidden { .. } | RedditApiError::NotFound { .. }
        )
    }
}

impl ErrorExt for LlmError {
    fn error_code(&self) -> &'static str {
        match self {
            LlmError::InvalidApiKey { .. } => "LLM_INVALID_API_KEY",
            LlmError::RateLimitExceeded { .. } => "LLM_RATE_LIMIT",
            LlmError::ServiceUnavailable { .. } => "LLM_SERVICE_UNAVAILABLE",
            LlmError::RequestTimeout { .. } => "LLM_TIMEOUT",
            LlmError::RequestFailed { .. } => "LLM_REQUEST_FAILED",
            LlmError::EmptyCompletion { .. } => "LLM_EMPTY_COMPLETION",
            LlmError::InvalidResponseFormat { .. } => "LLM_INVALID_RESPONSE",
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::RateLimitExceeded { .. }
                | LlmError::ServiceUnavailable { .. }
                | LlmError::RequestTimeout { .. }
        )
    }

    fn user_friendly_message(&self) -> String {
        match self {
            LlmError::InvalidApiKey { provider } => {
                format!("The {} API key was rejected.", provider)
            }
            LlmError::RateLimitExceeded {
                provider,
                retry_after,
            } => format!("{} is rate limiting; wait {} seconds.", provider, retry_after),
            LlmError::EmptyCompletion { .. } | LlmError::InvalidResponseFormat { .. } => {
                "The model answered with something other than insights.".to_string()
            }
            _ => "The analysis model is unavailable right now.".to_string(),
        }
    }

    // A user-supplied key that the provider rejects is the caller's problem.
    fn is_caller_fault(&self) -> bool {
        matches!(self, LlmError::InvalidApiKey { .. })
    }
}

impl ErrorExt for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            ConfigError::FileNotFound { .. } => "CONFIG_FILE_NOT_FOUND",
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE",
            ConfigError::ValidationFailed { .. } => "CONFIG_VALIDATION_FAILED",
            ConfigError::Parse(_) => "CONFIG_PARSE_ERROR",
        }
    }

    fn is_retryable(&self) -> bool {
        false
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::FileNotFound { path } => format!("No configuration file at '{}'.", path),
            ConfigError::InvalidValue { field, .. } => {
                format!("Setting '{}' has an invalid value.", field)
            }
            ConfigError::ValidationFailed { reason } => format!("Invalid configuration: {}", reason),
            ConfigError::Parse(_) => "The configuration file is not valid TOML.".to_string(),
        }
    }
}

/// Logs request failures with their code. Caller faults go out at `WARN`,
/// everything else at `ERROR`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorReporter;

impl ErrorReporter {
    pub fn new() -> Self {
        Self
    }

    /// Returns the level the error was logged at.
    pub fn report(&self, error: &CoreError) -> Level {
        let code = error.error_code();
        if error.is_caller_fault() {
            warn!(code, "Request rejected: {}", error);
            Level::WARN
        } else {
            error!(
                code,
                retryable = error.is_retryable(),
                "Request failed: {}",
                error
            );
            Level::ERROR
        }
    }
}
