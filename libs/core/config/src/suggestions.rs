use crate::{ConfigError, FromEnv, env_or_default, env_parse_or_default};
use std::time::Duration;

/// External name-suggestion service (DaData)
#[derive(Clone, Debug)]
pub struct SuggestionsConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl SuggestionsConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

impl FromEnv for SuggestionsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: env_or_default("DADATA_API_KEY", ""),
            base_url: env_or_default(
                "DADATA_BASE_URL",
                "https://suggestions.dadata.ru/suggestions/api/4_1/rs",
            ),
            timeout: Duration::from_millis(env_parse_or_default("DADATA_TIMEOUT_MS", 5000)?),
        })
    }
}
