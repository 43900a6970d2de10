//! External name suggestion service client.

use async_trait::async_trait;
use core_config::SuggestionsConfig;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error};

use crate::error::{SuggestionError, SuggestionResult};
use crate::models::{FioRequest, FioSuggestion};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    async fn fio(&self, request: &FioRequest) -> SuggestionResult<Vec<FioSuggestion>>;
}

#[derive(Debug, Deserialize)]
struct SuggestionsBody {
    suggestions: Option<Vec<FioSuggestion>>,
}

/// DaData suggestions API.
pub struct DaDataClient {
    client: Client,
    config: SuggestionsConfig,
}

impl DaDataClient {
    pub fn new(config: SuggestionsConfig) -> SuggestionResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, api: &str) -> String {
        format!("{}/suggest/{}", self.config.base_url.trim_end_matches('/'), api)
    }
}

#[async_trait]
impl SuggestionProvider for DaDataClient {
    async fn fio(&self, request: &FioRequest) -> SuggestionResult<Vec<FioSuggestion>> {
        if !self.config.is_configured() {
            return Err(SuggestionError::NotConfigured);
        }

        debug!(count = request.count, gender = %request.gender, "Requesting FIO suggestions");

        let response = self
            .client
            .post(self.endpoint("fio"))
            .header("Authorization", format!("Token {}", self.config.api_key))
            .header("Accept", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            error!(status = %status, "Suggestion service returned an error");
            return Err(SuggestionError::Provider(format!("Http error: status code {}", status)));
        }

        let body: SuggestionsBody = response.json().await?;
        body.suggestions.ok_or_else(|| {
            SuggestionError::Provider("Cannot find suggestions array in response".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(api_key: &str) -> SuggestionsConfig {
        SuggestionsConfig {
            api_key: api_key.into(),
            base_url: "https://suggestions.example/api/4_1/rs/".into(),
            timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn test_endpoint() {
        let client = DaDataClient::new(config("k")).unwrap();
        assert_eq!(
            client.endpoint("fio"),
            "https://suggestions.example/api/4_1/rs/suggest/fio"
        );
    }

    #[tokio::test]
    async fn test_unconfigured_client_does_not_call_out() {
        let client = DaDataClient::new(config("")).unwrap();
        let err = client.fio(&FioRequest::new("Ив")).await.unwrap_err();
        assert!(matches!(err, SuggestionError::NotConfigured));
    }
}
