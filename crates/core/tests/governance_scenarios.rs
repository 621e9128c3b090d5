#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use custodian_core::*;
use custodian_executor::{ActionOutcome, ExecutorError};
use custodian_memory::{FileStore, InMemoryStore, MemoryConfig, MemoryManager};
use custodian_policy::*;
use custodian_providers::ProviderError;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn governor(settings: SettingsSnapshot) -> Governor {
    let memory = MemoryManager::open(MemoryConfig::default(), Arc::new(InMemoryStore::new()));
    Governor::new(GovernorConfig::default(), settings, memory)
}

fn active() -> SettingsSnapshot {
    SettingsSnapshot::default().with_profile(Profile::Active)
}

fn open_app() -> Suggestion {
    Suggestion::new("s1", "Open WhatsApp", "Opening WhatsApp", RiskLevel::Low)
        .with_domain(ActionDomain::System)
        .with_payload("WhatsApp")
}

fn seq_of(effects: &[Effect]) -> u64 {
    effects
        .iter()
        .find_map(|e| match e {
            Effect::Fetch(request) => Some(request.seq),
            _ => None,
        })
        .expect("no fetch effect")
}

fn cycle_of(effects: &[Effect]) -> u64 {
    effects
        .iter()
        .find_map(|e| match e {
            Effect::Execute { cycle, .. } => Some(*cycle),
            _ => None,
        })
        .expect("no execute effect")
}

fn say(gov: &mut Governor, text: &str, now: Instant) -> Vec<Effect> {
    gov.handle_input(InputEvent::Utterance(text.to_string()), now)
}

/// Dispatches a request and answers it with `suggestion`.
fn propose(gov: &mut Governor, suggestion: Suggestion, now: Instant) -> Vec<Effect> {
    let seq = seq_of(&gov.handle_input(InputEvent::Typed("help me".into()), now));
    gov.on_suggestion(seq, Ok(suggestion), now)
}

fn outcome() -> ActionOutcome {
    ActionOutcome {
        tool: "openApp".to_string(),
        summary: "Application \"WhatsApp\" has been opened".to_string(),
    }
}

#[test]
fn test_active_low_risk_system_action_runs_full_cycle() {
    let mut gov = governor(active());
    let t0 = Instant::now();

    let effects = propose(&mut gov, open_app(), t0);
    assert!(matches!(
        &effects[0],
        Effect::Notify(Notice::Proposed { double_confirmation: false, .. })
    ));
    assert_eq!(gov.consent_state(), ConsentState::WaitingForExplicitYes);
    assert_eq!(gov.status(), OperationalStatus::Ready);

    let effects = say(&mut gov, "yes", t0 + Duration::from_secs(3));
    let cycle = cycle_of(&effects);
    assert_eq!(gov.consent_state(), ConsentState::Executing);
    assert_eq!(gov.status(), OperationalStatus::Executing);

    let t1 = t0 + Duration::from_secs(4);
    gov.on_execution_result(cycle, Ok(outcome()), t1);
    assert_eq!(gov.status(), OperationalStatus::Cooldown);
    assert!(gov.pending().is_some());

    gov.poll(t1 + Duration::from_secs(2));
    assert_eq!(gov.status(), OperationalStatus::Idle);
    assert_eq!(gov.consent_state(), ConsentState::Idle);
    assert!(gov.pending().is_none());

    let messages: Vec<_> = gov.audit().entries().map(|e| e.message.clone()).collect();
    assert!(messages.len() >= 3);
    assert!(messages.iter().any(|m| m.starts_with("Awaiting confirmation")));
    assert!(messages.iter().any(|m| m.starts_with("Confirmed")));
    assert!(messages.iter().any(|m| m.starts_with("Executing")));
    assert_eq!(gov.audit().count(AuditCategory::Tool), 1);
}

#[test]
fn test_critical_emergency_needs_two_confirmations() {
    let mut gov = governor(SettingsSnapshot::default().with_profile(Profile::Critical));
    let t0 = Instant::now();

    let emergency = Suggestion::new("e1", "Call emergency services", "Calling 192", RiskLevel::Low)
        .with_domain(ActionDomain::Emergency)
        .with_intent(Intent::Emergency)
        .with_criticality(Criticality::Critical);
    let effects = propose(&mut gov, emergency, t0);
    assert!(matches!(
        &effects[0],
        Effect::Notify(Notice::Proposed { double_confirmation: true, .. })
    ));

    let effects = say(&mut gov, "yes", t0);
    assert_eq!(gov.consent_state(), ConsentState::DoubleConfirmation);
    assert!(effects.iter().all(|e| !matches!(e, Effect::Execute { .. })));

    let effects = say(&mut gov, "Yes", t0);
    cycle_of(&effects);
    assert_eq!(gov.consent_state(), ConsentState::Executing);
}

#[test]
fn test_unrecognized_answer_cancels() {
    let mut gov = governor(active());
    let t0 = Instant::now();
    propose(&mut gov, open_app(), t0);

    let effects = say(&mut gov, "yes please", t0);
    assert!(matches!(&effects[0], Effect::Notify(Notice::Cancelled { .. })));
    assert_eq!(gov.consent_state(), ConsentState::Cancelled);
    assert!(gov.pending().is_none());

    gov.poll(t0 + Duration::from_millis(1_500));
    assert_eq!(gov.consent_state(), ConsentState::Idle);
}

#[test]
fn test_denial_disarms_timeout() {
    let mut gov = governor(active());
    let t0 = Instant::now();
    propose(&mut gov, open_app(), t0);
    say(&mut gov, "no", t0);

    let before = gov.audit().entries().count();
    gov.poll(t0 + Duration::from_secs(31));
    assert_eq!(gov.audit().entries().count(), before);
    assert!(gov.next_deadline().is_none());
}

#[test]
fn test_consent_times_out_into_cancelled() {
    let mut gov = governor(active());
    let t0 = Instant::now();
    propose(&mut gov, open_app(), t0);

    assert!(gov.poll(t0 + Duration::from_secs(29)).is_empty());
    assert_eq!(gov.consent_state(), ConsentState::WaitingForExplicitYes);

    let effects = gov.poll(t0 + Duration::from_secs(30));
    assert!(matches!(&effects[0], Effect::Notify(Notice::Cancelled { reason }) if reason.contains("timed out")));
    assert_eq!(gov.consent_state(), ConsentState::Cancelled);
    assert!(gov.pending().is_none());

    let last = gov.audit().entries().last().unwrap();
    assert_eq!(last.category, AuditCategory::Governance);
    assert!(last.message.contains("timed out"));
}

#[test]
fn test_pending_slot_is_never_overwritten() {
    let mut gov = governor(active().with_mode(AssistMode::Active));
    let t0 = Instant::now();

    gov.handle_input(InputEvent::Typed("open whatsapp".into()), t0);
    let refused = gov.handle_input(InputEvent::Typed("open maps".into()), t0);
    assert_eq!(
        refused,
        vec![Effect::Notify(Notice::Refused(DispatchRefusal::InFlight))]
    );

    gov.on_suggestion(1, Ok(open_app()), t0);
    assert!(gov.handle_input(InputEvent::IdleCheck, t0).is_empty());
    assert_eq!(gov.pending().map(|s| s.id.as_str()), Some("s1"));
}

#[test]
fn test_kill_phrase_while_waiting_suspends() {
    let mut gov = governor(active());
    let t0 = Instant::now();
    propose(&mut gov, open_app(), t0);

    let effects = say(&mut gov, "STOP", t0);
    assert!(effects.contains(&Effect::Notify(Notice::Suspended)));
    assert_eq!(gov.status(), OperationalStatus::Suspended);
    assert!(gov.pending().is_none());
    assert_eq!(gov.audit().count(AuditCategory::Security), 1);

    // no consent transition or dispatch while suspended
    let effects = say(&mut gov, "yes", t0 + Duration::from_secs(1));
    assert_eq!(
        effects,
        vec![Effect::Notify(Notice::Refused(DispatchRefusal::Suspended))]
    );
    assert_eq!(gov.consent_state(), ConsentState::Idle);
}

#[test]
fn test_suspension_exits_exactly_once_after_window() {
    let mut gov = governor(active());
    let t0 = Instant::now();
    say(&mut gov, "stop", t0);

    // a repeated kill phrase neither extends nor shortens the window
    say(&mut gov, "stop", t0 + Duration::from_secs(4));

    assert!(gov.poll(t0 + Duration::from_millis(4_999)).is_empty());
    assert_eq!(gov.status(), OperationalStatus::Suspended);

    let effects = gov.poll(t0 + Duration::from_secs(5));
    assert_eq!(effects, vec![Effect::Notify(Notice::Resumed)]);
    assert_eq!(gov.status(), OperationalStatus::Idle);

    assert!(gov.poll(t0 + Duration::from_secs(20)).is_empty());
    assert_eq!(gov.audit().count(AuditCategory::Security), 2);
}

#[test]
fn test_kill_phrase_from_every_state() {
    let t0 = Instant::now();

    // analyzing
    let mut gov = governor(active());
    gov.handle_input(InputEvent::Typed("open".into()), t0);
    say(&mut gov, "abort", t0);
    assert_eq!(gov.status(), OperationalStatus::Suspended);

    // double confirmation
    let mut gov = governor(SettingsSnapshot::default().with_profile(Profile::Critical));
    let s = open_app().with_criticality(Criticality::Critical);
    propose(&mut gov, s, t0);
    say(&mut gov, "yes", t0);
    say(&mut gov, "halt", t0);
    assert_eq!(gov.status(), OperationalStatus::Suspended);
    assert!(gov.pending().is_none());

    // error display
    let mut gov = governor(active());
    let seq = seq_of(&gov.handle_input(InputEvent::Typed("x".into()), t0));
    gov.on_suggestion(seq, Err(ProviderError::Api("500".into())), t0);
    assert_eq!(gov.status(), OperationalStatus::Error);
    say(&mut gov, "stop", t0);
    assert_eq!(gov.status(), OperationalStatus::Suspended);
    gov.poll(t0 + Duration::from_secs(2));
    assert_eq!(gov.status(), OperationalStatus::Suspended);
}

#[test]
fn test_response_after_suspension_is_dropped() {
    let mut gov = governor(active());
    let t0 = Instant::now();
    let seq = seq_of(&gov.handle_input(InputEvent::Typed("open whatsapp".into()), t0));

    say(&mut gov, "stop", t0);
    let effects = gov.on_suggestion(seq, Ok(open_app()), t0);

    assert!(effects.is_empty());
    assert!(gov.pending().is_none());
    assert!(gov.memory().context().is_empty());
    assert_eq!(gov.status(), OperationalStatus::Suspended);
}

#[test]
fn test_execution_result_after_suspension_is_dropped() {
    let mut gov = governor(active());
    let t0 = Instant::now();
    propose(&mut gov, open_app(), t0);
    let cycle = cycle_of(&say(&mut gov, "yes", t0));

    let effects = say(&mut gov, "stop", t0);
    assert!(effects.contains(&Effect::AbortInFlight));

    assert!(gov.on_execution_result(cycle, Ok(outcome()), t0).is_empty());
    assert_eq!(gov.audit().count(AuditCategory::Tool), 0);
    assert_eq!(gov.status(), OperationalStatus::Suspended);
}

#[test]
fn test_failures_are_audited_once_and_revert() {
    let mut gov = governor(active());
    let t0 = Instant::now();

    let seq = seq_of(&gov.handle_input(InputEvent::Typed("x".into()), t0));
    let effects = gov.on_suggestion(seq, Err(ProviderError::Malformed("missing riskLevel".into())), t0);
    assert!(matches!(
        &effects[0],
        Effect::Notify(Notice::Failed { kind: FailureKind::StructuralInvalid, .. })
    ));
    assert_eq!(gov.audit().count(AuditCategory::Error), 1);
    assert!(gov.memory().context().is_empty());

    gov.poll(t0 + Duration::from_millis(1_500));
    assert_eq!(gov.status(), OperationalStatus::Idle);

    // capability gate
    let seq = seq_of(&gov.handle_input(InputEvent::Typed("search".into()), t0));
    let web = Suggestion::new("w", "Search the web", "x", RiskLevel::Low)
        .with_domain(ActionDomain::Network);
    let effects = gov.on_suggestion(seq, Ok(web), t0);
    assert!(matches!(
        &effects[0],
        Effect::Notify(Notice::Failed { kind: FailureKind::PermissionDenied, .. })
    ));
    assert_eq!(gov.audit().count(AuditCategory::Security), 1);
}

#[test]
fn test_policy_update_revalidates_pending() {
    let mut gov = governor(active());
    let t0 = Instant::now();
    propose(&mut gov, open_app(), t0);

    let revoked = active().with_capabilities(
        CapabilityVector::default().with(Capability::ManageApps, false),
    );
    let effects = gov.update_policy(revoked, t0);

    assert!(matches!(&effects[0], Effect::Notify(Notice::Cancelled { .. })));
    assert!(gov.pending().is_none());
    assert_eq!(gov.consent_state(), ConsentState::Cancelled);
}

#[test]
fn test_policy_update_can_raise_to_double_confirmation() {
    let mut gov = governor(active());
    let t0 = Instant::now();
    propose(&mut gov, open_app(), t0);

    let assistive = active().with_capabilities(CapabilityVector {
        critical_assistive_mode: true,
        ..CapabilityVector::default()
    });
    gov.update_policy(assistive, t0);

    say(&mut gov, "yes", t0);
    assert_eq!(gov.consent_state(), ConsentState::DoubleConfirmation);
}

#[test]
fn test_purge_works_while_suspended() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::new(dir.path()).unwrap());
    let memory = MemoryManager::open(MemoryConfig::default(), store.clone());
    let mut gov = Governor::new(GovernorConfig::default(), active(), memory);
    let t0 = Instant::now();

    propose(&mut gov, open_app(), t0);
    assert!(!gov.memory().context().is_empty());
    say(&mut gov, "stop", t0);

    gov.purge_memory().unwrap();
    assert!(gov.memory().context().is_empty());

    let reopened = MemoryManager::open(MemoryConfig::default(), store);
    assert!(reopened.durable().is_empty());
}

#[test]
fn test_audit_trail_is_mirrored_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    let memory = MemoryManager::open(MemoryConfig::default(), Arc::new(InMemoryStore::new()));
    let mut gov = Governor::new(GovernorConfig::default(), active(), memory)
        .with_audit_sink(Box::new(JsonlAuditSink::new(&path).unwrap()));

    say(&mut gov, "stop", Instant::now());

    let content = std::fs::read_to_string(&path).unwrap();
    let event: AuditEvent = serde_json::from_str(content.lines().next().unwrap()).unwrap();
    assert_eq!(event.category, AuditCategory::Security);
}

#[test]
fn test_execution_failure_reports_error() {
    let mut gov = governor(active());
    let t0 = Instant::now();
    propose(&mut gov, open_app(), t0);
    let cycle = cycle_of(&say(&mut gov, "yes", t0));

    let effects = gov.on_execution_result(
        cycle,
        Err(ExecutorError::ExecutionFailed("device busy".into())),
        t0,
    );
    assert!(matches!(
        &effects[0],
        Effect::Notify(Notice::Failed { kind: FailureKind::ExecutionFailure, .. })
    ));
    assert_eq!(gov.status(), OperationalStatus::Error);
}

#[test]
fn test_switch_off_cancels_pending_and_blocks_dispatch() {
    let mut gov = governor(active());
    let t0 = Instant::now();
    propose(&mut gov, open_app(), t0);

    let effects = say(&mut gov, "Deactivate Custodian", t0);
    assert!(effects
        .iter()
        .any(|e| matches!(e, Effect::Notify(Notice::Switched { enabled: false }))));
    assert!(!gov.is_enabled());
    assert!(gov.pending().is_none());
    assert_eq!(gov.status(), OperationalStatus::Idle);

    let effects = say(&mut gov, "open maps", t0);
    assert_eq!(
        effects,
        vec![Effect::Notify(Notice::Refused(DispatchRefusal::Disabled))]
    );

    say(&mut gov, "activate custodian", t0);
    assert!(gov.is_enabled());
    let effects = say(&mut gov, "open maps", t0);
    assert!(matches!(&effects[0], Effect::Fetch(_)));
}

#[test]
fn test_switch_phrase_is_locale_bound() {
    let mut gov = governor(active());
    let effects = say(&mut gov, "desativar custodian", Instant::now());

    assert!(gov.is_enabled());
    assert!(matches!(&effects[0], Effect::Fetch(_)));
}

#[test]
fn test_offline_refusal_is_audited_as_bus_failure() {
    let mut gov = governor(active());
    gov.set_online(false);

    say(&mut gov, "open maps", Instant::now());

    let last = gov.audit().entries().last().unwrap();
    assert_eq!(last.category, AuditCategory::Error);
    assert_eq!(last.data.as_ref().unwrap()["failure"], "BusFailure");
}

#[test]
fn test_remember_persists_durably_while_suspended() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::new(dir.path()).unwrap());
    let memory = MemoryManager::open(MemoryConfig::default(), store.clone());
    let mut gov = Governor::new(GovernorConfig::default(), active(), memory);
    let t0 = Instant::now();

    say(&mut gov, "stop", t0);
    gov.remember("my pharmacy is on Rua Augusta").unwrap();
    gov.remember("   ").unwrap();
    assert_eq!(gov.memory().durable().len(), 1);

    let reopened = MemoryManager::open(MemoryConfig::default(), store);
    assert_eq!(reopened.durable()[0].content, "my pharmacy is on Rua Augusta");
}
