//! Policy constant tables.
//!
//! The risk gate and the double-confirmation determination are both plain
//! lookups over these rows, so every threshold can be read and tested in one
//! place.

use crate::settings::{CapabilityVector, Profile};
use crate::suggestion::{ActionDomain, Criticality, Intent, RiskLevel, Suggestion};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The suggestion wants to act (`is_suggestion = true`).
    Actionable,
    RiskAtLeast(RiskLevel),
    RiskInDomain(RiskLevel, ActionDomain),
    Criticality(Criticality),
    Intent(Intent),
    /// Global critical assistive mode flag in the capability vector.
    AssistiveMode,
}

impl Trigger {
    fn matches(self, suggestion: &Suggestion, capabilities: &CapabilityVector) -> bool {
        match self {
            Trigger::Actionable => suggestion.is_suggestion,
            Trigger::RiskAtLeast(level) => suggestion.risk_level >= level,
            Trigger::RiskInDomain(level, domain) => {
                suggestion.risk_level == level && suggestion.domain == domain
            }
            Trigger::Criticality(level) => suggestion.criticality == level,
            Trigger::Intent(intent) => suggestion.intent == Some(intent),
            Trigger::AssistiveMode => capabilities.critical_assistive_mode,
        }
    }
}

#[derive(Debug)]
pub struct ThresholdRule {
    /// `None` applies under every profile.
    pub profile: Option<Profile>,
    pub trigger: Trigger,
    pub reason: &'static str,
}

impl ThresholdRule {
    pub fn applies(
        &self,
        suggestion: &Suggestion,
        profile: Profile,
        capabilities: &CapabilityVector,
    ) -> bool {
        self.profile.map_or(true, |p| p == profile) && self.trigger.matches(suggestion, capabilities)
    }
}

/// Rows that reject a suggestion outright. NORMAL is reactive-only.
pub const RISK_REJECTION_RULES: &[ThresholdRule] = &[
    ThresholdRule {
        profile: Some(Profile::Normal),
        trigger: Trigger::RiskAtLeast(RiskLevel::High),
        reason: "High risk detected in Normal profile",
    },
    ThresholdRule {
        profile: Some(Profile::Normal),
        trigger: Trigger::Actionable,
        reason: "Normal profile is reactive-only; proactive actions are not permitted",
    },
];

/// Rows that demand a second explicit confirmation.
pub const DOUBLE_CONFIRMATION_RULES: &[ThresholdRule] = &[
    ThresholdRule {
        profile: None,
        trigger: Trigger::AssistiveMode,
        reason: "critical assistive mode",
    },
    ThresholdRule {
        profile: Some(Profile::Critical),
        trigger: Trigger::Criticality(Criticality::Critical),
        reason: "critical action under critical profile",
    },
    ThresholdRule {
        profile: Some(Profile::Critical),
        trigger: Trigger::Intent(Intent::Emergency),
        reason: "emergency intent under critical profile",
    },
    ThresholdRule {
        profile: Some(Profile::Critical),
        trigger: Trigger::RiskAtLeast(RiskLevel::Medium),
        reason: "elevated risk under critical profile",
    },
    ThresholdRule {
        profile: Some(Profile::Active),
        trigger: Trigger::RiskInDomain(RiskLevel::High, ActionDomain::System),
        reason: "high-risk system action under active profile",
    },
];

pub fn first_match(
    rules: &'static [ThresholdRule],
    suggestion: &Suggestion,
    profile: Profile,
    capabilities: &CapabilityVector,
) -> Option<&'static ThresholdRule> {
    rules
        .iter()
        .find(|rule| rule.applies(suggestion, profile, capabilities))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestion(risk: RiskLevel) -> Suggestion {
        Suggestion::new("t", "Open settings", "test", risk)
    }

    #[test]
    fn test_normal_rejects_high_even_when_informational() {
        let s = suggestion(RiskLevel::High).informational();
        let rule = first_match(
            RISK_REJECTION_RULES,
            &s,
            Profile::Normal,
            &CapabilityVector::default(),
        );
        assert_eq!(rule.map(|r| r.reason), Some("High risk detected in Normal profile"));
    }

    #[test]
    fn test_normal_allows_informational_low() {
        let s = suggestion(RiskLevel::Low).informational();
        assert!(first_match(
            RISK_REJECTION_RULES,
            &s,
            Profile::Normal,
            &CapabilityVector::default()
        )
        .is_none());
    }

    #[test]
    fn test_medium_only_doubles_under_critical() {
        let s = suggestion(RiskLevel::Medium);
        let caps = CapabilityVector::default();

        assert!(first_match(DOUBLE_CONFIRMATION_RULES, &s, Profile::Critical, &caps).is_some());
        assert!(first_match(DOUBLE_CONFIRMATION_RULES, &s, Profile::Active, &caps).is_none());
    }

    #[test]
    fn test_active_high_only_doubles_for_system_domain() {
        let caps = CapabilityVector::default();
        let system = suggestion(RiskLevel::High).with_domain(ActionDomain::System);
        let network = suggestion(RiskLevel::High).with_domain(ActionDomain::Network);

        assert!(first_match(DOUBLE_CONFIRMATION_RULES, &system, Profile::Active, &caps).is_some());
        assert!(first_match(DOUBLE_CONFIRMATION_RULES, &network, Profile::Active, &caps).is_none());
    }

    #[test]
    fn test_assistive_mode_applies_everywhere() {
        let caps = CapabilityVector {
            critical_assistive_mode: true,
            ..CapabilityVector::default()
        };
        let s = suggestion(RiskLevel::Low);

        for profile in [Profile::Normal, Profile::Active, Profile::Critical] {
            let rule = first_match(DOUBLE_CONFIRMATION_RULES, &s, profile, &caps);
            assert_eq!(rule.map(|r| r.trigger), Some(Trigger::AssistiveMode));
        }
    }
}
