use custodian_core::{DispatchRefusal, FailureKind, Notice, OperationalStatus};
use custodian_policy::RiskLevel;

pub fn status_label(status: OperationalStatus) -> &'static str {
    match status {
        OperationalStatus::Idle => "idle",
        OperationalStatus::Analyzing => "analyzing",
        OperationalStatus::Ready => "awaiting confirmation",
        OperationalStatus::Executing => "executing",
        OperationalStatus::Cooldown => "cooling down",
        OperationalStatus::Error => "error",
        OperationalStatus::Suspended => "suspended",
        OperationalStatus::Offline => "offline",
    }
}

fn failure_label(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::PermissionDenied => "Permission denied",
        FailureKind::RiskRejected => "Blocked by policy",
        FailureKind::StructuralInvalid => "Unusable response",
        FailureKind::Timeout => "Timed out",
        FailureKind::BusFailure => "Service unavailable",
        FailureKind::ExecutionFailure => "Action failed",
    }
}

fn refusal_label(refusal: DispatchRefusal) -> &'static str {
    match refusal {
        DispatchRefusal::PendingConsent => "Answer the pending suggestion first.",
        DispatchRefusal::InFlight => "Still thinking about the previous request.",
        DispatchRefusal::Suspended => "Suspended. Input ignored until the window ends.",
        DispatchRefusal::Disabled => "Switched off. Say the activation phrase to turn it back on.",
        DispatchRefusal::Offline => "Offline. Requests are paused.",
    }
}

pub fn describe_notice(notice: &Notice) -> String {
    match notice {
        Notice::Proposed {
            suggestion,
            double_confirmation,
        } => {
            let risk = match suggestion.risk_level {
                RiskLevel::Low => "low",
                RiskLevel::Medium => "medium",
                RiskLevel::High => "high",
            };
            let mut text = format!(
                "Suggestion: {} ({} risk)\n  {}",
                suggestion.action, risk, suggestion.description
            );
            for (i, step) in suggestion.steps.iter().enumerate() {
                text.push_str(&format!("\n  {}. {}", i + 1, step));
            }
            if *double_confirmation {
                text.push_str("\nThis action needs two confirmations. Say yes to continue.");
            } else {
                text.push_str("\nSay yes to confirm or no to cancel.");
            }
            text
        }
        Notice::AwaitingSecondConfirmation { action } => {
            format!("Confirm once more to run '{}'.", action)
        }
        Notice::Answer { text } => text.clone(),
        Notice::Cancelled { reason } => format!("Cancelled: {}", reason),
        Notice::Executed { summary } => format!("Done: {}", summary),
        Notice::Failed { kind, reason } => {
            let mut text = format!("{}: {}", failure_label(*kind), reason);
            if !kind.is_deterministic() {
                text.push_str(" You can try again.");
            }
            text
        }
        Notice::Refused(refusal) => refusal_label(*refusal).to_string(),
        Notice::Suspended => "Stopped. All activity suspended.".to_string(),
        Notice::Resumed => "Resumed.".to_string(),
        Notice::Switched { enabled: true } => "Assistant on.".to_string(),
        Notice::Switched { enabled: false } => "Assistant off.".to_string(),
        Notice::Remembered => "Noted. I will remember that.".to_string(),
        Notice::MemoryPurged => "Memory cleared.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use custodian_policy::Suggestion;

    #[test]
    fn test_double_confirmation_prompt() {
        let notice = Notice::Proposed {
            suggestion: Suggestion::new("e", "Call emergency services", "Calling 192", RiskLevel::High),
            double_confirmation: true,
        };
        let text = describe_notice(&notice);
        assert!(text.contains("high risk"));
        assert!(text.contains("two confirmations"));
    }

    #[test]
    fn test_failure_text_names_kind() {
        let notice = Notice::Failed {
            kind: FailureKind::PermissionDenied,
            reason: "network actions require the 'network' capability".to_string(),
        };
        let text = describe_notice(&notice);
        assert!(text.starts_with("Permission denied"));
        assert!(!text.contains("try again"));
    }

    #[test]
    fn test_transient_failure_invites_retry() {
        let notice = Notice::Failed {
            kind: FailureKind::BusFailure,
            reason: "connection reset".to_string(),
        };
        assert!(describe_notice(&notice).ends_with("You can try again."));
    }
}
