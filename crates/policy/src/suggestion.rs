use serde::{Deserialize, Serialize};

use crate::settings::Capability;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Criticality {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

/// Domain tag the reasoning service attaches to a suggestion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    Writing,
    Coding,
    Analysis,
    Ideation,
    System,
    Emergency,
    Learning,
    WebSearch,
}

/// What kind of side effect the action would have on the device.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ActionDomain {
    #[default]
    General,
    Code,
    System,
    Network,
    Emergency,
    Call,
    Research,
    Communication,
}

impl ActionDomain {
    /// Capabilities that must all be granted before an action in this domain
    /// may even be shown to the user.
    pub fn required_capabilities(self) -> &'static [Capability] {
        match self {
            ActionDomain::General => &[],
            ActionDomain::Code => &[Capability::Keyboard],
            ActionDomain::System => &[Capability::ManageApps],
            ActionDomain::Network | ActionDomain::Research => &[Capability::Network],
            ActionDomain::Emergency | ActionDomain::Call => &[Capability::Calling],
            ActionDomain::Communication => &[Capability::Contacts],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionDomain::General => "general",
            ActionDomain::Code => "code",
            ActionDomain::System => "system",
            ActionDomain::Network => "network",
            ActionDomain::Emergency => "emergency",
            ActionDomain::Call => "call",
            ActionDomain::Research => "research",
            ActionDomain::Communication => "communication",
        }
    }
}

fn default_true() -> bool {
    true
}

/// A candidate action proposed by the reasoning service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub id: String,
    pub action: String,
    pub description: String,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub criticality: Criticality,
    #[serde(default)]
    pub intent: Option<Intent>,
    #[serde(default, rename = "type")]
    pub domain: ActionDomain,
    /// A missing flag is read as `true`: anything that could act needs consent.
    #[serde(default = "default_true")]
    pub is_suggestion: bool,
    #[serde(default)]
    pub is_task_complete: bool,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

impl Suggestion {
    pub fn new(
        id: impl Into<String>,
        action: impl Into<String>,
        description: impl Into<String>,
        risk_level: RiskLevel,
    ) -> Self {
        Self {
            id: id.into(),
            action: action.into(),
            description: description.into(),
            risk_level,
            criticality: Criticality::Low,
            intent: None,
            domain: ActionDomain::General,
            is_suggestion: true,
            is_task_complete: false,
            steps: Vec::new(),
            payload: None,
        }
    }

    pub fn with_domain(mut self, domain: ActionDomain) -> Self {
        self.domain = domain;
        self
    }

    pub fn with_intent(mut self, intent: Intent) -> Self {
        self.intent = Some(intent);
        self
    }

    pub fn with_criticality(mut self, criticality: Criticality) -> Self {
        self.criticality = criticality;
        self
    }

    pub fn informational(mut self) -> Self {
        self.is_suggestion = false;
        self
    }

    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn task_complete(mut self) -> Self {
        self.is_task_complete = true;
        self
    }
}
