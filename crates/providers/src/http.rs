use async_trait::async_trait;
use custodian_policy::Suggestion;
use reqwest::Client;
use std::time::Duration;

use crate::request::SuggestionRequest;
use crate::traits::{ProviderError, SuggestionProvider};
use crate::wire::parse_suggestion;

/// Posts the request as JSON to a reasoning endpoint and expects a single
/// suggestion object back, either bare or under a `suggestion` key.
pub struct HttpSuggestionProvider {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpSuggestionProvider {
    pub fn new(endpoint: String, api_key: Option<String>) -> Self {
        Self::with_timeout(endpoint, api_key, Duration::from_secs(30))
    }

    pub fn with_timeout(endpoint: String, api_key: Option<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl SuggestionProvider for HttpSuggestionProvider {
    async fn suggest(&self, request: &SuggestionRequest) -> Result<Suggestion, ProviderError> {
        let mut http = self.client.post(&self.endpoint).json(request);

        if let Some(api_key) = &self.api_key {
            http = http.bearer_auth(api_key);
        }

        tracing::debug!("Requesting suggestion seq={} from {}", request.seq, self.endpoint);

        let response = http
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(format!("{}: {}", status, text)));
        }

        let mut json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        let body = match json.get_mut("suggestion") {
            Some(inner) => inner.take(),
            None => json,
        };

        parse_suggestion(body)
    }

    fn name(&self) -> &str {
        "HTTP"
    }
}
