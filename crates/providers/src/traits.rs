use async_trait::async_trait;
use custodian_policy::Suggestion;
use thiserror::Error;

use crate::request::SuggestionRequest;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProviderError {
    /// The service could not be reached or the connection failed.
    #[error("Transport error: {0}")]
    Transport(String),
    /// The service answered with an error status.
    #[error("API error: {0}")]
    Api(String),
    /// The service answered, but not with a usable suggestion.
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl ProviderError {
    pub fn is_structural(&self) -> bool {
        matches!(self, ProviderError::Malformed(_))
    }
}

/// The remote reasoning service. Slow and fallible; callers never retry.
#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    async fn suggest(&self, request: &SuggestionRequest) -> Result<Suggestion, ProviderError>;

    fn name(&self) -> &str;
}
