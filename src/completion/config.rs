//! Completion gateway configuration.
//!
//! Loaded from environment variables. The defaults target Groq: an
//! OpenAI-compatible endpoint with a small primary model and a larger backup
//! used when the primary fails.

use serde::Deserialize;

use super::errors::CompletionError;

/// Placeholder value shipped in sample env files. Treated the same as an
/// unset key so a copy-pasted template fails loudly at startup.
const PLACEHOLDER_API_KEY: &str = "your_api_key_here";

/// Default OpenAI-compatible endpoint (Groq).
const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Default primary model.
const DEFAULT_MODEL_PRIMARY: &str = "gemma2-9b-it";

/// Default backup model, tried once when the primary fails retriably.
const DEFAULT_MODEL_BACKUP: &str = "llama-3.3-70b-versatile";

/// Configuration for the completion client.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionConfig {
    pub api_key: String,
    pub base_url: String,
    pub model_primary: String,
    pub model_backup: String,
}

impl CompletionConfig {
    /// Load the gateway configuration from the environment.
    ///
    /// Reads `HCP_CRM_API_KEY` (required), `HCP_CRM_BASE_URL`,
    /// `HCP_CRM_MODEL_PRIMARY`, `HCP_CRM_MODEL_BACKUP` (all optional with
    /// defaults). Fails when the key is missing, empty, or the sample
    /// placeholder.
    pub fn from_env() -> Result<Self, CompletionError> {
        let api_key = std::env::var("HCP_CRM_API_KEY").unwrap_or_default();

        let config = Self {
            api_key,
            base_url: env_or("HCP_CRM_BASE_URL", DEFAULT_BASE_URL),
            model_primary: env_or("HCP_CRM_MODEL_PRIMARY", DEFAULT_MODEL_PRIMARY),
            model_backup: env_or("HCP_CRM_MODEL_BACKUP", DEFAULT_MODEL_BACKUP),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject missing or placeholder API keys and empty endpoints.
    pub fn validate(&self) -> Result<(), CompletionError> {
        if self.api_key.trim().is_empty() || self.api_key == PLACEHOLDER_API_KEY {
            return Err(CompletionError::Config {
                reason: "HCP_CRM_API_KEY is not configured".into(),
            });
        }
        if self.base_url.trim().is_empty() {
            return Err(CompletionError::Config {
                reason: "base_url must not be empty".into(),
            });
        }
        if self.model_primary.trim().is_empty() {
            return Err(CompletionError::Config {
                reason: "model_primary must not be empty".into(),
            });
        }
        Ok(())
    }
}

fn env_or(var: &str, default: &str) -> String {
    match std::env::var(var) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => default.to_string(),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> CompletionConfig {
        CompletionConfig {
            api_key: "gsk_test".into(),
            base_url: DEFAULT_BASE_URL.into(),
            model_primary: DEFAULT_MODEL_PRIMARY.into(),
            model_backup: DEFAULT_MODEL_BACKUP.into(),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn empty_api_key_rejected() {
        let mut config = valid_config();
        config.api_key = "".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn placeholder_api_key_rejected() {
        let mut config = valid_config();
        config.api_key = PLACEHOLDER_API_KEY.into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_model_rejected() {
        let mut config = valid_config();
        config.model_primary = " ".into();
        assert!(config.validate().is_err());
    }
}
