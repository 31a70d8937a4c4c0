use std::fmt;
use std::sync::Arc;

/// Pipeline error type.
#[derive(Debug)]
pub enum AppError {
    /// Structural parser found zero questions; the caller may switch to the AI path.
    NoQuestionsFound { context: String },
    /// AI response failed both the strict and the partial-recovery validation path.
    Validation(ValidationError),
    /// Error from the AI provider route.
    Provider(ProviderError),
    /// Configuration error.
    Config(ConfigError),
    /// Error shared between coalesced duplicate requests.
    Coalesced(Arc<AppError>),
    /// Anything else (wrapping third-party errors).
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NoQuestionsFound { context } => {
                write!(f, "no questions found in {}", context)
            }
            AppError::Validation(e) => write!(f, "validation error: {}", e),
            AppError::Provider(e) => write!(f, "provider error: {}", e),
            AppError::Config(e) => write!(f, "config error: {}", e),
            AppError::Coalesced(e) => write!(f, "{}", e),
            AppError::Other(msg) => write!(f, "error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Validation(e) => Some(e),
            AppError::Provider(e) => Some(e),
            AppError::Config(e) => Some(e),
            AppError::Coalesced(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

/// AI response validation errors.
#[derive(Debug)]
pub enum ValidationError {
    /// Both validation paths produced zero usable questions.
    EmptyResult { context: String },
    /// The response parsed but does not match the question schema.
    SchemaMismatch { reason: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyResult { context } => {
                write!(f, "no questions could be {}", context)
            }
            ValidationError::SchemaMismatch { reason } => {
                write!(f, "response does not match the question schema: {}", reason)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors surfaced by the AI provider route.
#[derive(Debug)]
pub enum ProviderError {
    /// Quota exhausted. Terminal, never retried.
    QuotaExhausted { message: String },
    /// Invalid or missing API key. Terminal, never retried.
    InvalidApiKey { message: String },
    /// Network-level failure (connection reset, timeout, DNS). Retryable.
    Network { message: String },
    /// Upstream HTTP error status. 502/503 are retryable.
    Upstream { status: u16, message: String },
    /// Rate limited without a quota message. Retryable.
    RateLimited { message: String },
    /// The route answered but carried no content. Not retryable.
    EmptyResponse { endpoint: String },
    /// The route answered with something structurally unusable. Not retryable.
    Malformed { message: String },
}

impl ProviderError {
    /// Terminal errors abort immediately and are surfaced to the user as a
    /// reconfiguration problem.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProviderError::QuotaExhausted { .. } | ProviderError::InvalidApiKey { .. }
        )
    }

    /// Retryable errors go through the bounded backoff loop.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Network { .. } | ProviderError::RateLimited { .. } => true,
            ProviderError::Upstream { status, .. } => matches!(status, 502 | 503),
            _ => false,
        }
    }

    /// Classify a raw error message from the transport.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_ascii_lowercase();

        if lower.contains("insufficient_quota") || lower.contains("quota") {
            return ProviderError::QuotaExhausted { message };
        }
        if lower.contains("invalid api key")
            || lower.contains("invalid_api_key")
            || lower.contains("incorrect api key")
            || lower.contains("unauthorized")
        {
            return ProviderError::InvalidApiKey { message };
        }
        if lower.contains("etimedout")
            || lower.contains("econnreset")
            || lower.contains("econnrefused")
            || lower.contains("enotfound")
            || lower.contains("eai_again")
            || lower.contains("timed out")
            || lower.contains("timeout")
            || lower.contains("dns")
            || lower.contains("connection")
        {
            return ProviderError::Network { message };
        }
        if lower.contains("502") {
            return ProviderError::Upstream { status: 502, message };
        }
        if lower.contains("503") {
            return ProviderError::Upstream { status: 503, message };
        }
        if lower.contains("429") || lower.contains("rate limit") || lower.contains("too many requests") {
            return ProviderError::RateLimited { message };
        }
        ProviderError::Malformed { message }
    }

    /// Classify an HTTP status from the route.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => ProviderError::InvalidApiKey { message },
            429 => {
                if message.to_ascii_lowercase().contains("quota") {
                    ProviderError::QuotaExhausted { message }
                } else {
                    ProviderError::RateLimited { message }
                }
            }
            _ => ProviderError::Upstream { status, message },
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::QuotaExhausted { message } => {
                write!(f, "quota exhausted, check your plan and billing: {}", message)
            }
            ProviderError::InvalidApiKey { message } => {
                write!(f, "invalid API key, check the provider configuration: {}", message)
            }
            ProviderError::Network { message } => write!(f, "network failure: {}", message),
            ProviderError::Upstream { status, message } => {
                write!(f, "upstream HTTP {}: {}", status, message)
            }
            ProviderError::RateLimited { message } => write!(f, "rate limited: {}", message),
            ProviderError::EmptyResponse { endpoint } => {
                write!(f, "empty response from {}", endpoint)
            }
            ProviderError::Malformed { message } => {
                write!(f, "malformed provider response: {}", message)
            }
        }
    }
}

impl std::error::Error for ProviderError {}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// An environment variable holds a value of the wrong shape.
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// The config file could not be read or parsed.
    FileLoadFailed { path: String, message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EnvVarParseFailed {
                var_name,
                value,
                expected_type,
            } => write!(
                f,
                "env var {} holds '{}', expected {}",
                var_name, value, expected_type
            ),
            ConfigError::FileLoadFailed { path, message } => {
                write!(f, "failed to load config file {}: {}", path, message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ========== Conversions from common error types ==========

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(ValidationError::SchemaMismatch {
            reason: err.to_string(),
        })
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            return AppError::Provider(ProviderError::Network {
                message: err.to_string(),
            });
        }
        if let Some(status) = err.status() {
            return AppError::Provider(ProviderError::from_status(status.as_u16(), err.to_string()));
        }
        AppError::Provider(ProviderError::from_message(err.to_string()))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Other(err.to_string())
    }
}

// ========== Convenience constructors ==========

impl AppError {
    /// Structural extraction found nothing.
    pub fn no_questions_found(context: impl Into<String>) -> Self {
        AppError::NoQuestionsFound {
            context: context.into(),
        }
    }

    /// Both validation paths came back empty.
    pub fn validation_empty(context: impl Into<String>) -> Self {
        AppError::Validation(ValidationError::EmptyResult {
            context: context.into(),
        })
    }

    /// Classify a raw provider error message.
    pub fn provider_message(message: impl Into<String>) -> Self {
        AppError::Provider(ProviderError::from_message(message))
    }

    /// Whether the retry loop may attempt this call again.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Provider(e) => e.is_retryable(),
            AppError::Coalesced(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Whether the error must abort immediately and be surfaced as-is.
    pub fn is_terminal(&self) -> bool {
        match self {
            AppError::Provider(e) => e.is_terminal(),
            AppError::Coalesced(e) => e.is_terminal(),
            _ => false,
        }
    }
}

// ========== Result alias ==========

/// Pipeline result type.
pub type Result<T> = std::result::Result<T, AppError>;
