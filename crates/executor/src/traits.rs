use async_trait::async_trait;
use custodian_policy::{ActionDomain, Suggestion};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExecutorError {
    #[error("Action not allowed: {0}")]
    NotAllowed(String),
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
    #[error("Timeout")]
    Timeout,
}

/// What the executor is asked to perform once consent has been given.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionRequest {
    pub suggestion_id: String,
    pub action: String,
    pub domain: ActionDomain,
    pub payload: Option<String>,
}

impl ActionRequest {
    pub fn from_suggestion(suggestion: &Suggestion) -> Self {
        Self {
            suggestion_id: suggestion.id.clone(),
            action: suggestion.action.clone(),
            domain: suggestion.domain,
            payload: suggestion.payload.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionOutcome {
    pub tool: String,
    pub summary: String,
}

/// Performs a confirmed action. This is the only place a side effect occurs.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(&self, request: &ActionRequest) -> Result<ActionOutcome, ExecutorError>;
}
