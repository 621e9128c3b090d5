use serde::{Deserialize, Serialize};

use crate::settings::{CapabilityVector, Profile};
use crate::suggestion::Suggestion;
use crate::thresholds::{first_match, DOUBLE_CONFIRMATION_RULES, RISK_REJECTION_RULES};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RejectionKind {
    /// The capability gate failed.
    PermissionDenied,
    /// The profile/risk gate failed.
    RiskRejected,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Allowed,
    RequiresDoubleConfirmation,
    Denied { kind: RejectionKind, reason: String },
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Verdict::Denied { .. })
    }

    pub fn requires_double_confirmation(&self) -> bool {
        matches!(self, Verdict::RequiresDoubleConfirmation)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Verdict::Denied { reason, .. } => Some(reason),
            _ => None,
        }
    }

    fn denied(kind: RejectionKind, reason: impl Into<String>) -> Self {
        Verdict::Denied {
            kind,
            reason: reason.into(),
        }
    }
}

/// Gates a proposed suggestion against the active profile and capability
/// vector. Holds no mutable state; identical input gives identical output.
#[derive(Debug, Clone)]
pub struct PolicyValidator {
    blocked_phrases: Vec<String>,
}

impl PolicyValidator {
    pub fn new() -> Self {
        Self {
            blocked_phrases: Self::default_blocked_phrases(),
        }
    }

    fn default_blocked_phrases() -> Vec<String> {
        vec![
            "rm -rf".to_string(),
            "delete all".to_string(),
            "format drive".to_string(),
            "drop database".to_string(),
            "password".to_string(),
            "secret_key".to_string(),
        ]
    }

    pub fn with_blocked_phrase(mut self, phrase: impl Into<String>) -> Self {
        self.blocked_phrases.push(phrase.into().to_lowercase());
        self
    }

    pub fn validate(
        &self,
        suggestion: &Suggestion,
        profile: Profile,
        capabilities: &CapabilityVector,
    ) -> Verdict {
        // 1. capability gate, independent of profile
        for capability in suggestion.domain.required_capabilities() {
            if !capabilities.grants(*capability) {
                return Verdict::denied(
                    RejectionKind::PermissionDenied,
                    format!(
                        "{} actions require the '{}' capability, which is disabled",
                        suggestion.domain.as_str(),
                        capability.as_str()
                    ),
                );
            }
        }

        // 2. risk/profile gate
        if capabilities.block_dangerous_keywords {
            if let Some(phrase) = self.blocked_phrase_in(suggestion) {
                return Verdict::denied(
                    RejectionKind::RiskRejected,
                    format!("Dangerous keyword detected: {}", phrase),
                );
            }
        }

        if let Some(rule) = first_match(RISK_REJECTION_RULES, suggestion, profile, capabilities) {
            return Verdict::denied(RejectionKind::RiskRejected, rule.reason);
        }

        // 3. double-confirmation determination
        if first_match(DOUBLE_CONFIRMATION_RULES, suggestion, profile, capabilities).is_some() {
            return Verdict::RequiresDoubleConfirmation;
        }

        Verdict::Allowed
    }

    fn blocked_phrase_in(&self, suggestion: &Suggestion) -> Option<&str> {
        let content = format!("{} {}", suggestion.action, suggestion.description).to_lowercase();
        self.blocked_phrases
            .iter()
            .find(|phrase| content.contains(phrase.as_str()))
            .map(String::as_str)
    }
}

impl Default for PolicyValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Capability;
    use crate::suggestion::{ActionDomain, Criticality, Intent, RiskLevel};

    fn caps() -> CapabilityVector {
        CapabilityVector::default()
    }

    #[test]
    fn test_capability_gate_beats_profile() {
        let validator = PolicyValidator::new();
        let s = Suggestion::new("n1", "Search the web", "lookup", RiskLevel::Low)
            .with_domain(ActionDomain::Network);

        for profile in [Profile::Normal, Profile::Active, Profile::Critical] {
            let verdict = validator.validate(&s, profile, &caps());
            assert!(matches!(
                verdict,
                Verdict::Denied {
                    kind: RejectionKind::PermissionDenied,
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_high_risk_never_allowed_in_normal() {
        let validator = PolicyValidator::new();
        let everything = caps()
            .with(Capability::Network, true)
            .with(Capability::Contacts, true);

        for domain in [ActionDomain::General, ActionDomain::System, ActionDomain::Network] {
            for actionable in [true, false] {
                let mut s = Suggestion::new("h", "Close all apps", "x", RiskLevel::High)
                    .with_domain(domain);
                s.is_suggestion = actionable;
                assert!(!validator.validate(&s, Profile::Normal, &everything).is_allowed());
            }
        }
    }

    #[test]
    fn test_normal_is_reactive_only() {
        let validator = PolicyValidator::new();
        let s = Suggestion::new("l", "Open calendar", "x", RiskLevel::Low);
        let verdict = validator.validate(&s, Profile::Normal, &caps());
        assert!(matches!(
            verdict,
            Verdict::Denied {
                kind: RejectionKind::RiskRejected,
                ..
            }
        ));

        let answer = s.clone().informational();
        assert_eq!(validator.validate(&answer, Profile::Normal, &caps()), Verdict::Allowed);
    }

    #[test]
    fn test_active_low_system_single_confirmation() {
        let validator = PolicyValidator::new();
        let s = Suggestion::new("s", "Open WhatsApp", "x", RiskLevel::Low)
            .with_domain(ActionDomain::System);

        let verdict = validator.validate(&s, Profile::Active, &caps());
        assert_eq!(verdict, Verdict::Allowed);
        assert!(!verdict.requires_double_confirmation());
    }

    #[test]
    fn test_critical_emergency_requires_double() {
        let validator = PolicyValidator::new();
        let s = Suggestion::new("e", "Call emergency services", "x", RiskLevel::Low)
            .with_domain(ActionDomain::Emergency)
            .with_intent(Intent::Emergency)
            .with_criticality(Criticality::Critical);

        let verdict = validator.validate(&s, Profile::Critical, &caps());
        assert_eq!(verdict, Verdict::RequiresDoubleConfirmation);
        assert!(verdict.is_allowed());
    }

    #[test]
    fn test_blocked_phrases_respect_flag() {
        let validator = PolicyValidator::new();
        let s = Suggestion::new("k", "Type password into form", "x", RiskLevel::Low);

        let verdict = validator.validate(&s, Profile::Active, &caps());
        assert_eq!(verdict.reason(), Some("Dangerous keyword detected: password"));

        let relaxed = CapabilityVector {
            block_dangerous_keywords: false,
            ..caps()
        };
        assert!(validator.validate(&s, Profile::Active, &relaxed).is_allowed());
    }

    #[test]
    fn test_validation_is_deterministic() {
        let validator = PolicyValidator::new();
        let s = Suggestion::new("d", "Open maps", "x", RiskLevel::Medium);

        let first = validator.validate(&s, Profile::Critical, &caps());
        for _ in 0..10 {
            assert_eq!(validator.validate(&s, Profile::Critical, &caps()), first);
        }
    }
}
