use custodian_policy::{ActionDomain, Criticality, Intent, RiskLevel, Suggestion};
use serde::Deserialize;

use crate::traits::ProviderError;

/// Action labels shorter than this are too ambiguous to act on.
const MIN_ACTION_CHARS: usize = 5;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSuggestion {
    #[serde(default)]
    id: Option<String>,
    action: String,
    description: String,
    risk_level: RiskLevel,
    #[serde(default)]
    criticality: Criticality,
    #[serde(default)]
    intent: Option<Intent>,
    #[serde(default, rename = "type")]
    domain: ActionDomain,
    #[serde(default)]
    is_suggestion: Option<bool>,
    #[serde(default)]
    is_task_complete: bool,
    #[serde(default)]
    steps: Vec<String>,
    #[serde(default)]
    payload: Option<String>,
}

/// Turns a service payload into a `Suggestion`, rejecting anything that is
/// structurally unusable.
pub fn parse_suggestion(value: serde_json::Value) -> Result<Suggestion, ProviderError> {
    let wire: WireSuggestion = serde_json::from_value(value)
        .map_err(|e| ProviderError::Malformed(e.to_string()))?;

    if wire.action.trim().is_empty() {
        return Err(ProviderError::Malformed("empty action".to_string()));
    }
    if wire.action.trim().chars().count() < MIN_ACTION_CHARS {
        return Err(ProviderError::Malformed(format!(
            "action '{}' is too short to be unambiguous",
            wire.action.trim()
        )));
    }
    if wire.description.trim().is_empty() {
        return Err(ProviderError::Malformed("empty description".to_string()));
    }

    let id = wire
        .id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    Ok(Suggestion {
        id,
        action: wire.action.trim().to_string(),
        description: wire.description,
        risk_level: wire.risk_level,
        criticality: wire.criticality,
        intent: wire.intent,
        domain: wire.domain,
        is_suggestion: wire.is_suggestion.unwrap_or(true),
        is_task_complete: wire.is_task_complete,
        steps: wire.steps,
        payload: wire.payload,
    })
}
