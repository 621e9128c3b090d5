use async_trait::async_trait;
use custodian_policy::ActionDomain;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::traits::{ActionExecutor, ActionOutcome, ActionRequest, ExecutorError};

/// The assistive tools a confirmed action is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Tool {
    OpenApp,
    TypeContent,
    ClickElement,
    ReadSocialMediaSummary,
    InteractWithApp,
    PlaceCall,
}

impl Tool {
    pub fn as_str(self) -> &'static str {
        match self {
            Tool::OpenApp => "openApp",
            Tool::TypeContent => "typeContent",
            Tool::ClickElement => "clickElement",
            Tool::ReadSocialMediaSummary => "readSocialMediaSummary",
            Tool::InteractWithApp => "interactWithApp",
            Tool::PlaceCall => "placeCall",
        }
    }

    /// Picks a tool from the action domain and the verb in the action label.
    pub fn resolve(request: &ActionRequest) -> Option<Tool> {
        let action = request.action.to_lowercase();
        match request.domain {
            ActionDomain::Call | ActionDomain::Emergency => Some(Tool::PlaceCall),
            ActionDomain::Code => Some(Tool::TypeContent),
            ActionDomain::Research | ActionDomain::Network => Some(Tool::ReadSocialMediaSummary),
            _ if action.starts_with("open") || action.starts_with("launch") => Some(Tool::OpenApp),
            _ if action.starts_with("type") || action.starts_with("write") => Some(Tool::TypeContent),
            _ if action.starts_with("click") || action.starts_with("tap") => Some(Tool::ClickElement),
            ActionDomain::System | ActionDomain::Communication => Some(Tool::InteractWithApp),
            ActionDomain::General => None,
        }
    }
}

/// Executor that reports outcomes without touching the device. Only
/// allow-listed tools run; anything else fails loudly.
pub struct SimulatedExecutor {
    allowlist: Vec<Tool>,
    latency: Duration,
}

impl SimulatedExecutor {
    pub fn new(allowlist: Vec<Tool>) -> Self {
        Self {
            allowlist,
            latency: Duration::ZERO,
        }
    }

    pub fn default_allowlist() -> Vec<Tool> {
        vec![
            Tool::OpenApp,
            Tool::TypeContent,
            Tool::ClickElement,
            Tool::ReadSocialMediaSummary,
            Tool::InteractWithApp,
            Tool::PlaceCall,
        ]
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn is_allowed(&self, tool: Tool) -> bool {
        self.allowlist.contains(&tool)
    }

    fn describe(tool: Tool, request: &ActionRequest) -> String {
        let target = request.payload.as_deref().unwrap_or(&request.action);
        match tool {
            Tool::OpenApp => format!("Application \"{}\" has been opened", target),
            Tool::TypeContent => "Text inserted into the active application".to_string(),
            Tool::ClickElement => format!("Click executed on \"{}\"", target),
            Tool::ReadSocialMediaSummary => format!("Summary for \"{}\" ready", target),
            Tool::InteractWithApp => format!("Interaction with \"{}\" completed", target),
            Tool::PlaceCall => format!("Call to \"{}\" started", target),
        }
    }
}

impl Default for SimulatedExecutor {
    fn default() -> Self {
        Self::new(Self::default_allowlist())
    }
}

#[async_trait]
impl ActionExecutor for SimulatedExecutor {
    async fn execute(&self, request: &ActionRequest) -> Result<ActionOutcome, ExecutorError> {
        let tool = Tool::resolve(request).ok_or_else(|| {
            ExecutorError::ExecutionFailed(format!("no tool handles '{}'", request.action))
        })?;

        if !self.is_allowed(tool) {
            return Err(ExecutorError::NotAllowed(tool.as_str().to_string()));
        }

        tracing::info!("Executing {} for suggestion {}", tool.as_str(), request.suggestion_id);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        Ok(ActionOutcome {
            tool: tool.as_str().to_string(),
            summary: Self::describe(tool, request),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(action: &str, domain: ActionDomain, payload: Option<&str>) -> ActionRequest {
        ActionRequest {
            suggestion_id: "s1".to_string(),
            action: action.to_string(),
            domain,
            payload: payload.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_allowed_action() {
        let executor = SimulatedExecutor::default();
        let outcome = executor
            .execute(&request("Open WhatsApp", ActionDomain::System, Some("WhatsApp")))
            .await
            .unwrap();
        assert_eq!(outcome.tool, "openApp");
        assert!(outcome.summary.contains("WhatsApp"));
    }

    #[tokio::test]
    async fn test_tool_outside_allowlist() {
        let executor = SimulatedExecutor::new(vec![Tool::OpenApp]);
        let result = executor
            .execute(&request("Call Maria", ActionDomain::Call, None))
            .await;
        assert_eq!(result, Err(ExecutorError::NotAllowed("placeCall".to_string())));
    }

    #[tokio::test]
    async fn test_unroutable_action_fails() {
        let executor = SimulatedExecutor::default();
        let result = executor
            .execute(&request("Think about it", ActionDomain::General, None))
            .await;
        assert!(matches!(result, Err(ExecutorError::ExecutionFailed(_))));
    }

    #[test]
    fn test_resolution_prefers_domain() {
        let r = request("Open dialer and call", ActionDomain::Call, None);
        assert_eq!(Tool::resolve(&r), Some(Tool::PlaceCall));

        let r = request("Tap send", ActionDomain::Communication, None);
        assert_eq!(Tool::resolve(&r), Some(Tool::ClickElement));
    }
}
