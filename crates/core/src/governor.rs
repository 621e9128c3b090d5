use custodian_executor::{ActionOutcome, ActionRequest, ExecutorError};
use custodian_memory::{MemoryManager, MemoryRole, MemoryScope};
use custodian_policy::{
    classify_consent, classify_switch, AssistMode, AssistantSwitch, ConsentSignal,
    PolicyValidator, RejectionKind, SettingsSnapshot, Suggestion, Verdict,
};
use custodian_providers::{ProviderError, SuggestionRequest};
use serde_json::json;
use std::time::Instant;
use tokio::sync::watch;

use crate::audit::{AuditCategory, AuditEvent, AuditLog, AuditSink};
use crate::config::GovernorConfig;
use crate::consent::{ConsentMachine, ConsentStep, ExecutionOrder};
use crate::dispatcher::{DispatchGate, Dispatcher, Settlement};
use crate::error::{DispatchRefusal, FailureKind, GovernanceError};
use crate::killswitch::KillSwitch;
use crate::timers::{TimerKind, TimerTable};
use crate::types::{ConsentState, InputEvent, Notice, OperationalStatus};

const IDLE_CONTEXT_SCREEN: &str =
    "[ACTIVE] Reading the current screen content in real time. User is moving between applications.";
const IDLE_CONTEXT_NO_SCREEN: &str =
    "[ACTIVE] Waiting for screen-reading permission to assist actively. User is moving between applications.";

/// Work the caller must carry out on the governor's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Fetch(SuggestionRequest),
    Execute { cycle: u64, request: ActionRequest },
    /// Abandon any outstanding fetch or execution.
    AbortInFlight,
    Notify(Notice),
}

/// Single-session governance core. Owns the pending slot, timers, audit log
/// and memory; every call is synchronous and takes the current time.
pub struct Governor {
    config: GovernorConfig,
    settings: SettingsSnapshot,
    validator: PolicyValidator,
    consent: ConsentMachine,
    kill_switch: KillSwitch,
    dispatcher: Dispatcher,
    timers: TimerTable,
    audit: AuditLog,
    memory: MemoryManager,
    enabled: bool,
    online: bool,
    status: watch::Sender<OperationalStatus>,
}

impl Governor {
    pub fn new(config: GovernorConfig, settings: SettingsSnapshot, memory: MemoryManager) -> Self {
        let (status, _) = watch::channel(OperationalStatus::Idle);
        Self {
            kill_switch: KillSwitch::new(config.suspension_window()),
            audit: AuditLog::new(config.audit_capacity),
            config,
            settings,
            validator: PolicyValidator::new(),
            consent: ConsentMachine::new(),
            dispatcher: Dispatcher::new(),
            timers: TimerTable::new(),
            memory,
            enabled: true,
            online: true,
            status,
        }
    }

    pub fn with_validator(mut self, validator: PolicyValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_audit_sink(mut self, sink: Box<dyn AuditSink>) -> Self {
        self.audit = AuditLog::new(self.config.audit_capacity).with_sink(sink);
        self
    }

    pub fn status(&self) -> OperationalStatus {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<OperationalStatus> {
        self.status.subscribe()
    }

    pub fn consent_state(&self) -> ConsentState {
        self.consent.state()
    }

    pub fn pending(&self) -> Option<&Suggestion> {
        self.consent.pending()
    }

    pub fn settings(&self) -> &SettingsSnapshot {
        &self.settings
    }

    pub fn memory(&self) -> &MemoryManager {
        &self.memory
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    pub fn audit_snapshot(&self) -> Vec<AuditEvent> {
        self.audit.snapshot()
    }

    pub fn is_suspended(&self) -> bool {
        self.kill_switch.is_engaged()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    fn set_status(&mut self, status: OperationalStatus) {
        let changed = self.status.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
        if changed {
            tracing::debug!("Status -> {:?}", status);
        }
    }

    fn resting_status(&self) -> OperationalStatus {
        if self.online {
            OperationalStatus::Idle
        } else {
            OperationalStatus::Offline
        }
    }

    fn record(&mut self, category: AuditCategory, message: String, data: Option<serde_json::Value>) {
        let status = self.status();
        self.audit.record(category, status, message, data);
    }

    pub fn handle_input(&mut self, event: InputEvent, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();
        match event {
            InputEvent::IdleCheck => self.idle_check(&mut effects),
            InputEvent::Utterance(text) | InputEvent::Typed(text) => {
                self.handle_text(&text, now, &mut effects)
            }
        }
        effects
    }

    fn handle_text(&mut self, text: &str, now: Instant, effects: &mut Vec<Effect>) {
        // The kill switch is checked before anything else, in every state.
        if self.kill_switch.detects(text) {
            self.engage_kill_switch(text, now, effects);
            return;
        }

        if self.kill_switch.is_engaged() {
            tracing::debug!(
                "Input ignored while suspended ({:?} left)",
                self.kill_switch.remaining(now)
            );
            effects.push(Effect::Notify(Notice::Refused(DispatchRefusal::Suspended)));
            return;
        }

        if let Some(switch) = classify_switch(text, self.settings.language) {
            self.switch(switch, now, effects);
            return;
        }

        if self.consent.state().is_awaiting_answer() {
            let signal = classify_consent(text, self.settings.language);
            self.answer_consent(signal, now, effects);
            return;
        }

        let context = text.trim();
        if context.is_empty() {
            return;
        }
        self.dispatch(context.to_string(), true, effects);
    }

    fn idle_check(&mut self, effects: &mut Vec<Effect>) {
        if self.settings.mode != AssistMode::Active
            || self.status() != OperationalStatus::Idle
            || self.consent.state() != ConsentState::Idle
        {
            return;
        }

        let context = if self.settings.capabilities.screen_reading {
            IDLE_CONTEXT_SCREEN
        } else {
            IDLE_CONTEXT_NO_SCREEN
        };
        self.dispatch(context.to_string(), false, effects);
    }

    fn dispatch(&mut self, context: String, announce_refusal: bool, effects: &mut Vec<Effect>) {
        let gate = DispatchGate {
            slot_occupied: self.consent.is_occupied(),
            suspended: self.kill_switch.is_engaged(),
            enabled: self.enabled,
            online: self.online,
        };

        match self
            .dispatcher
            .prepare(context, &self.settings, self.memory.context(), gate)
        {
            Ok(request) => {
                self.timers.cancel(TimerKind::Display);
                self.consent.dismiss();
                self.set_status(OperationalStatus::Analyzing);
                effects.push(Effect::Fetch(request));
            }
            Err(refusal) => {
                tracing::info!("Request refused: {}", refusal);
                if let Some(kind) = refusal.failure_kind() {
                    self.record(
                        AuditCategory::Error,
                        format!("Request refused: {}", refusal),
                        Some(json!({ "failure": kind })),
                    );
                }
                if announce_refusal {
                    effects.push(Effect::Notify(Notice::Refused(refusal)));
                }
            }
        }
    }

    fn switch(&mut self, switch: AssistantSwitch, now: Instant, effects: &mut Vec<Effect>) {
        let enabled = switch == AssistantSwitch::Enable;
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;

        if enabled {
            self.record(AuditCategory::System, "Assistant switched on".to_string(), None);
            effects.push(Effect::Notify(Notice::Switched { enabled }));
            return;
        }

        // Switching off drops an unanswered proposal and any pending fetch.
        // An execution already under way is left to finish.
        let dropped = if self.consent.state().is_awaiting_answer() {
            self.timers.cancel(TimerKind::ConsentTimeout);
            self.consent.cancel()
        } else {
            None
        };
        let discarded = self.dispatcher.invalidate();
        if dropped.is_some() || self.status() == OperationalStatus::Analyzing {
            self.set_status(self.resting_status());
        }

        self.record(
            AuditCategory::System,
            "Assistant switched off".to_string(),
            Some(json!({
                "droppedSuggestion": dropped.as_ref().map(|s| s.id.clone()),
                "discardedRequest": discarded,
            })),
        );
        effects.push(Effect::Notify(Notice::Switched { enabled }));
        if dropped.is_some() {
            self.show_cancellation("Assistant switched off".to_string(), now, effects);
        }
    }

    fn engage_kill_switch(&mut self, text: &str, now: Instant, effects: &mut Vec<Effect>) {
        if !self.kill_switch.engage(&mut self.timers, now) {
            tracing::info!("Kill phrase repeated during suspension; window unchanged");
            return;
        }

        let previous = self.consent.state();
        let dropped = self.consent.abort();
        let discarded = self.dispatcher.invalidate();
        self.set_status(OperationalStatus::Suspended);
        self.record(
            AuditCategory::Security,
            "Kill switch engaged; assistant suspended".to_string(),
            Some(json!({
                "phrase": text.trim().to_lowercase(),
                "previousConsentState": previous,
                "droppedSuggestion": dropped.map(|s| s.id),
                "discardedRequest": discarded,
                "windowMs": self.config.suspension_window_ms,
                "activation": self.kill_switch.activations(),
            })),
        );

        effects.push(Effect::AbortInFlight);
        effects.push(Effect::Notify(Notice::Suspended));
    }

    fn answer_consent(&mut self, signal: ConsentSignal, now: Instant, effects: &mut Vec<Effect>) {
        match self.consent.answer(signal) {
            None => {}
            Some(ConsentStep::Escalated { action }) => {
                self.timers
                    .arm(TimerKind::ConsentTimeout, now, self.config.consent_timeout());
                self.record(
                    AuditCategory::Governance,
                    format!("First confirmation for '{}'; awaiting second confirmation", action),
                    None,
                );
                effects.push(Effect::Notify(Notice::AwaitingSecondConfirmation { action }));
            }
            Some(ConsentStep::Confirmed(order)) => {
                self.timers.cancel(TimerKind::ConsentTimeout);
                self.record(
                    AuditCategory::Governance,
                    format!("Confirmed: {}", order.suggestion().action),
                    None,
                );
                self.start_execution(order, effects);
            }
            Some(ConsentStep::Cancelled(suggestion)) => {
                self.timers.cancel(TimerKind::ConsentTimeout);
                let reason = match signal {
                    ConsentSignal::Negative => "Denied by user",
                    _ => "Answer not recognized; treated as denial",
                };
                self.set_status(self.resting_status());
                self.record(
                    AuditCategory::Governance,
                    format!("Cancelled '{}': {}", suggestion.action, reason),
                    None,
                );
                self.show_cancellation(reason.to_string(), now, effects);
            }
        }
    }

    fn show_cancellation(&mut self, reason: String, now: Instant, effects: &mut Vec<Effect>) {
        self.timers
            .arm(TimerKind::Display, now, self.config.display_delay());
        effects.push(Effect::Notify(Notice::Cancelled { reason }));
    }

    fn start_execution(&mut self, order: ExecutionOrder, effects: &mut Vec<Effect>) {
        let cycle = order.cycle();
        self.timers.cancel(TimerKind::ConsentTimeout);

        let Some(request) = self.consent.begin_execution(order) else {
            return;
        };

        self.set_status(OperationalStatus::Executing);
        self.record(
            AuditCategory::Execution,
            format!("Executing: {}", request.action),
            Some(json!({
                "suggestionId": request.suggestion_id,
                "type": request.domain.as_str(),
            })),
        );
        effects.push(Effect::Execute { cycle, request });
    }

    /// Surfaces a failure and schedules the return to idle.
    fn surface_failure(
        &mut self,
        kind: FailureKind,
        reason: String,
        now: Instant,
        effects: &mut Vec<Effect>,
    ) {
        self.set_status(OperationalStatus::Error);
        self.timers
            .arm(TimerKind::Display, now, self.config.display_delay());
        effects.push(Effect::Notify(Notice::Failed { kind, reason }));
    }

    /// Applies a response from the reasoning service.
    pub fn on_suggestion(
        &mut self,
        seq: u64,
        result: Result<Suggestion, ProviderError>,
        now: Instant,
    ) -> Vec<Effect> {
        let mut effects = Vec::new();

        match self.dispatcher.settle(seq, result, &mut self.memory) {
            Settlement::Stale => {
                tracing::debug!("Discarding stale response seq={}", seq);
            }
            Settlement::Failed { kind, reason } => {
                self.record(
                    AuditCategory::Error,
                    format!("Suggestion request failed: {}", reason),
                    Some(json!({ "failure": kind, "seq": seq })),
                );
                self.surface_failure(kind, reason, now, &mut effects);
            }
            Settlement::Accepted(suggestion) => self.govern(suggestion, now, &mut effects),
        }

        effects
    }

    fn govern(&mut self, suggestion: Suggestion, now: Instant, effects: &mut Vec<Effect>) {
        let verdict =
            self.validator
                .validate(&suggestion, self.settings.profile, &self.settings.capabilities);

        match verdict {
            Verdict::Denied { kind, reason } => {
                let category = match kind {
                    RejectionKind::PermissionDenied => AuditCategory::Security,
                    RejectionKind::RiskRejected => AuditCategory::Governance,
                };
                self.record(
                    category,
                    format!("Rejected '{}': {}", suggestion.action, reason),
                    Some(json!({
                        "suggestionId": suggestion.id,
                        "riskLevel": suggestion.risk_level,
                        "profile": self.settings.profile,
                    })),
                );
                self.surface_failure(kind.into(), reason, now, effects);
            }
            _ if !suggestion.is_suggestion => {
                self.set_status(self.resting_status());
                effects.push(Effect::Notify(Notice::Answer {
                    text: suggestion.description,
                }));
            }
            verdict => {
                let double_confirmation = verdict.requires_double_confirmation();
                match self.consent.arm(suggestion.clone(), double_confirmation) {
                    Ok(cycle) => {
                        self.timers
                            .arm(TimerKind::ConsentTimeout, now, self.config.consent_timeout());
                        self.set_status(OperationalStatus::Ready);
                        self.record(
                            AuditCategory::Governance,
                            format!("Awaiting confirmation: {}", suggestion.action),
                            Some(json!({
                                "suggestionId": suggestion.id,
                                "cycle": cycle,
                                "doubleConfirmation": double_confirmation,
                            })),
                        );
                        effects.push(Effect::Notify(Notice::Proposed {
                            suggestion,
                            double_confirmation,
                        }));
                    }
                    Err(refusal) => {
                        tracing::warn!("Could not arm consent for '{}': {}", suggestion.action, refusal);
                        effects.push(Effect::Notify(Notice::Refused(refusal)));
                    }
                }
            }
        }
    }

    /// Applies the executor's report for a consent cycle.
    pub fn on_execution_result(
        &mut self,
        cycle: u64,
        result: Result<ActionOutcome, ExecutorError>,
        now: Instant,
    ) -> Vec<Effect> {
        let mut effects = Vec::new();

        if self.consent.state() != ConsentState::Executing || self.consent.cycle() != cycle {
            tracing::debug!("Discarding execution result for cycle {}", cycle);
            return effects;
        }

        match result {
            Ok(outcome) => {
                self.consent.finish_execution(cycle);
                self.record(
                    AuditCategory::Tool,
                    format!("{}: {}", outcome.tool, outcome.summary),
                    None,
                );
                self.set_status(OperationalStatus::Cooldown);
                self.timers
                    .arm(TimerKind::Cooldown, now, self.config.cooldown());
                effects.push(Effect::Notify(Notice::Executed {
                    summary: outcome.summary,
                }));
            }
            Err(error) => {
                let dropped = self.consent.abort();
                self.record(
                    AuditCategory::Error,
                    format!("Execution failed: {}", error),
                    Some(json!({
                        "failure": FailureKind::from(&error),
                        "suggestionId": dropped.map(|s| s.id),
                    })),
                );
                self.surface_failure(FailureKind::ExecutionFailure, error.to_string(), now, &mut effects);
            }
        }

        effects
    }

    /// Fires every due timer. Timers cancelled or re-armed since they were
    /// scheduled never reach this point.
    pub fn poll(&mut self, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();

        for handle in self.timers.take_due(now) {
            match handle.kind {
                TimerKind::ConsentTimeout => {
                    if let Some(suggestion) = self.consent.expire() {
                        self.set_status(self.resting_status());
                        self.record(
                            AuditCategory::Governance,
                            format!("Cancelled '{}': confirmation timed out", suggestion.action),
                            Some(json!({ "failure": FailureKind::Timeout })),
                        );
                        self.show_cancellation("Confirmation timed out".to_string(), now, &mut effects);
                    }
                }
                TimerKind::Cooldown => {
                    if self.consent.complete_cooldown() {
                        self.set_status(self.resting_status());
                    }
                }
                TimerKind::Display => {
                    self.consent.dismiss();
                    if self.status() == OperationalStatus::Error {
                        self.set_status(self.resting_status());
                    }
                }
                TimerKind::Suspension => {
                    if self.kill_switch.release(handle) {
                        self.set_status(self.resting_status());
                        self.record(
                            AuditCategory::Security,
                            "Suspension window elapsed; assistant resumed".to_string(),
                            None,
                        );
                        effects.push(Effect::Notify(Notice::Resumed));
                    }
                }
            }
        }

        effects
    }

    /// Clears every memory scope. Allowed in any state, including suspension.
    pub fn purge_memory(&mut self) -> Result<(), GovernanceError> {
        match self.memory.purge() {
            Ok(()) => {
                self.record(AuditCategory::System, "Memory purged".to_string(), None);
                Ok(())
            }
            Err(e) => {
                self.record(
                    AuditCategory::Error,
                    format!("Memory purge could not remove persisted data: {}", e),
                    None,
                );
                Err(e.into())
            }
        }
    }

    /// Adds a line to durable memory. Allowed in any state, including
    /// suspension; blank text is ignored.
    pub fn remember(&mut self, text: &str) -> Result<(), GovernanceError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }

        let result = self.memory.record(MemoryRole::User, text, MemoryScope::Durable);
        match &result {
            Ok(()) => self.record(
                AuditCategory::System,
                "Durable memory recorded".to_string(),
                Some(json!({ "entries": self.memory.durable().len() })),
            ),
            Err(e) => self.record(
                AuditCategory::Error,
                format!("Durable memory could not be persisted: {}", e),
                None,
            ),
        }
        result.map_err(Into::into)
    }

    /// Replaces the settings snapshot. A suggestion still awaiting consent is
    /// re-validated and cancelled if the new policy no longer allows it.
    pub fn update_policy(&mut self, settings: SettingsSnapshot, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();
        let previous = std::mem::replace(&mut self.settings, settings);

        self.record(
            AuditCategory::System,
            "Policy updated".to_string(),
            Some(json!({
                "profile": self.settings.profile,
                "previousProfile": previous.profile,
                "mode": self.settings.mode,
                "language": self.settings.language,
            })),
        );

        if !self.consent.state().is_awaiting_answer() {
            return effects;
        }
        let Some(pending) = self.consent.pending().cloned() else {
            return effects;
        };

        match self
            .validator
            .validate(&pending, self.settings.profile, &self.settings.capabilities)
        {
            Verdict::Denied { reason, .. } => {
                self.timers.cancel(TimerKind::ConsentTimeout);
                self.consent.cancel();
                self.set_status(self.resting_status());
                self.record(
                    AuditCategory::Governance,
                    format!("Cancelled '{}' after policy update: {}", pending.action, reason),
                    None,
                );
                self.show_cancellation(reason, now, &mut effects);
            }
            Verdict::RequiresDoubleConfirmation => {
                if self.consent.require_double() {
                    self.timers
                        .arm(TimerKind::ConsentTimeout, now, self.config.consent_timeout());
                    self.record(
                        AuditCategory::Governance,
                        format!("'{}' now requires double confirmation", pending.action),
                        None,
                    );
                }
            }
            Verdict::Allowed => {}
        }

        effects
    }

    pub fn set_online(&mut self, online: bool) {
        if self.online == online {
            return;
        }
        self.online = online;

        let message = if online {
            "Connectivity restored"
        } else {
            "Connectivity lost"
        };
        self.record(AuditCategory::System, message.to_string(), None);

        match (online, self.status()) {
            (false, OperationalStatus::Idle) => self.set_status(OperationalStatus::Offline),
            (true, OperationalStatus::Offline) => self.set_status(OperationalStatus::Idle),
            _ => {}
        }
    }
}
