use serde::Deserialize;

/// Pipeline configuration.
///
/// Retry/backoff constants and the decider loop cap are empirically chosen
/// defaults, not tuned for any particular provider; override them per
/// deployment via env vars or the TOML file.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the same-origin AI API routes.
    pub api_base_url: String,
    /// Model name forwarded to the provider route.
    pub model_name: String,
    /// Maximum attempts per AI call (first try included).
    pub max_retry_attempts: u32,
    /// Linear backoff step; attempt N waits N * this.
    pub retry_backoff_ms: u64,
    /// Maximum decider-triggered repeats of the create/analyse/decide cycle.
    pub decider_max_iterations: u32,
    /// How many leading content characters feed the deduplication key.
    pub dedup_prefix_len: usize,
    /// Width of the deduplication time bucket.
    pub dedup_bucket_secs: i64,
    /// HTTP timeout for the provider route.
    pub request_timeout_secs: u64,
    /// Emit verbose per-question logs.
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000/api/ai".to_string(),
            model_name: "gemini-2.0-flash".to_string(),
            max_retry_attempts: 3,
            retry_backoff_ms: 1000,
            decider_max_iterations: 1,
            dedup_prefix_len: 2000,
            dedup_bucket_secs: 60,
            request_timeout_secs: 120,
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            api_base_url: std::env::var("QUIZ_API_BASE_URL").unwrap_or(default.api_base_url),
            model_name: std::env::var("QUIZ_MODEL_NAME").unwrap_or(default.model_name),
            max_retry_attempts: std::env::var("QUIZ_MAX_RETRY_ATTEMPTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_retry_attempts),
            retry_backoff_ms: std::env::var("QUIZ_RETRY_BACKOFF_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.retry_backoff_ms),
            decider_max_iterations: std::env::var("QUIZ_DECIDER_MAX_ITERATIONS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.decider_max_iterations),
            dedup_prefix_len: std::env::var("QUIZ_DEDUP_PREFIX_LEN").ok().and_then(|v| v.parse().ok()).unwrap_or(default.dedup_prefix_len),
            dedup_bucket_secs: std::env::var("QUIZ_DEDUP_BUCKET_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.dedup_bucket_secs),
            request_timeout_secs: std::env::var("QUIZ_REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.request_timeout_secs),
            verbose_logging: std::env::var("QUIZ_VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    /// Load from a TOML file; missing keys fall back to defaults.
    pub fn from_toml_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::error::AppError::Config(crate::error::ConfigError::FileLoadFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            })
        })?;
        toml::from_str(&content).map_err(|e| {
            crate::error::AppError::Config(crate::error::ConfigError::FileLoadFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_policy() {
        let config = Config::default();
        assert_eq!(config.max_retry_attempts, 3);
        assert_eq!(config.retry_backoff_ms, 1000);
        assert_eq!(config.decider_max_iterations, 1);
        assert_eq!(config.dedup_prefix_len, 2000);
        assert_eq!(config.dedup_bucket_secs, 60);
    }

    #[test]
    fn toml_overrides_only_named_keys() {
        let config: Config = toml::from_str("max_retry_attempts = 5\nmodel_name = \"test-model\"").unwrap();
        assert_eq!(config.max_retry_attempts, 5);
        assert_eq!(config.model_name, "test-model");
        assert_eq!(config.retry_backoff_ms, 1000);
    }
}
