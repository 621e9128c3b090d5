use async_trait::async_trait;
use custodian_policy::Suggestion;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::Path;
use std::time::Duration;

use crate::request::SuggestionRequest;
use crate::traits::{ProviderError, SuggestionProvider};

/// Replays a fixed queue of responses. Used for offline runs and tests.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<Suggestion, ProviderError>>>,
    requests: Mutex<Vec<SuggestionRequest>>,
    latency: Duration,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            latency: Duration::ZERO,
        }
    }

    /// Loads a YAML list of suggestions to replay in order.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ProviderError> {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        let suggestions: Vec<Suggestion> = serde_yaml::from_str(&content)
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        let provider = Self::new();
        for suggestion in suggestions {
            provider.push(Ok(suggestion));
        }
        Ok(provider)
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn push(&self, response: Result<Suggestion, ProviderError>) {
        self.responses.lock().push_back(response);
    }

    pub fn requests(&self) -> Vec<SuggestionRequest> {
        self.requests.lock().clone()
    }
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SuggestionProvider for ScriptedProvider {
    async fn suggest(&self, request: &SuggestionRequest) -> Result<Suggestion, ProviderError> {
        self.requests.lock().push(request.clone());

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Transport("script exhausted".to_string())))
    }

    fn name(&self) -> &str {
        "Scripted"
    }
}
