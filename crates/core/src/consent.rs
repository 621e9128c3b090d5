use custodian_executor::ActionRequest;
use custodian_policy::{ConsentSignal, Suggestion};

use crate::error::DispatchRefusal;
use crate::types::ConsentState;

#[derive(Debug, Clone)]
struct PendingConsent {
    suggestion: Suggestion,
    double_confirmation: bool,
    affirmations: u8,
}

/// Proof that a suggestion went through CONFIRMED. Only the consent machine
/// can create one, and execution can only start from one.
#[derive(Debug)]
pub struct ExecutionOrder {
    cycle: u64,
    suggestion: Suggestion,
}

impl ExecutionOrder {
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn suggestion(&self) -> &Suggestion {
        &self.suggestion
    }
}

#[derive(Debug)]
pub enum ConsentStep {
    /// First affirmation of a double-confirmation suggestion.
    Escalated { action: String },
    Confirmed(ExecutionOrder),
    Cancelled(Suggestion),
}

/// Lifecycle of the single pending-consent slot.
///
/// The slot is filled by [`ConsentMachine::arm`] and emptied on cancellation,
/// on abort, or when the post-execution cooldown completes. Every arming
/// starts a new cycle; results tagged with an older cycle are stale.
#[derive(Debug, Default)]
pub struct ConsentMachine {
    state: ConsentState,
    pending: Option<PendingConsent>,
    cycle: u64,
}

impl ConsentMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConsentState {
        self.state
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn pending(&self) -> Option<&Suggestion> {
        self.pending.as_ref().map(|p| &p.suggestion)
    }

    pub fn is_occupied(&self) -> bool {
        self.pending.is_some()
    }

    pub fn requires_double_confirmation(&self) -> bool {
        self.pending
            .as_ref()
            .map(|p| p.double_confirmation)
            .unwrap_or(false)
    }

    /// Places a suggestion in the slot and waits for an explicit yes. An
    /// occupied slot is never overwritten.
    pub fn arm(
        &mut self,
        suggestion: Suggestion,
        double_confirmation: bool,
    ) -> Result<u64, DispatchRefusal> {
        if self.pending.is_some()
            || !matches!(self.state, ConsentState::Idle | ConsentState::Cancelled)
        {
            return Err(DispatchRefusal::PendingConsent);
        }

        self.cycle += 1;
        tracing::info!(
            "Awaiting consent for '{}' (cycle {}, double={})",
            suggestion.action,
            self.cycle,
            double_confirmation
        );
        self.pending = Some(PendingConsent {
            suggestion,
            double_confirmation,
            affirmations: 0,
        });
        self.state = ConsentState::WaitingForExplicitYes;
        Ok(self.cycle)
    }

    /// Applies a classified answer. Anything but an affirmation cancels.
    pub fn answer(&mut self, signal: ConsentSignal) -> Option<ConsentStep> {
        if !self.state.is_awaiting_answer() {
            return None;
        }

        if !signal.is_affirmative() {
            return self.cancel().map(ConsentStep::Cancelled);
        }

        let pending = self.pending.as_mut()?;
        pending.affirmations += 1;

        if pending.double_confirmation && pending.affirmations < 2 {
            self.state = ConsentState::DoubleConfirmation;
            return Some(ConsentStep::Escalated {
                action: pending.suggestion.action.clone(),
            });
        }

        self.state = ConsentState::Confirmed;
        Some(ConsentStep::Confirmed(ExecutionOrder {
            cycle: self.cycle,
            suggestion: pending.suggestion.clone(),
        }))
    }

    /// Consent window ran out before an answer arrived.
    pub fn expire(&mut self) -> Option<Suggestion> {
        if !self.state.is_awaiting_answer() {
            return None;
        }
        self.cancel()
    }

    /// Cancels a suggestion that is still awaiting an answer.
    pub fn cancel(&mut self) -> Option<Suggestion> {
        if !self.state.is_awaiting_answer() {
            return None;
        }
        self.state = ConsentState::Cancelled;
        self.pending.take().map(|p| p.suggestion)
    }

    /// Raises a single-confirmation suggestion to double confirmation.
    /// Returns true if the requirement changed.
    pub fn require_double(&mut self) -> bool {
        if !self.state.is_awaiting_answer() {
            return false;
        }
        match self.pending.as_mut() {
            Some(pending) if !pending.double_confirmation => {
                pending.double_confirmation = true;
                pending.affirmations = 0;
                self.state = ConsentState::WaitingForExplicitYes;
                true
            }
            _ => false,
        }
    }

    pub fn begin_execution(&mut self, order: ExecutionOrder) -> Option<ActionRequest> {
        if self.state != ConsentState::Confirmed || order.cycle != self.cycle {
            tracing::warn!("Refusing execution order from cycle {}", order.cycle);
            return None;
        }
        self.state = ConsentState::Executing;
        Some(ActionRequest::from_suggestion(&order.suggestion))
    }

    /// Executor reported success for the current cycle.
    pub fn finish_execution(&mut self, cycle: u64) -> bool {
        if self.state != ConsentState::Executing || cycle != self.cycle {
            return false;
        }
        self.state = ConsentState::Cooldown;
        true
    }

    pub fn complete_cooldown(&mut self) -> bool {
        if self.state != ConsentState::Cooldown {
            return false;
        }
        self.pending = None;
        self.state = ConsentState::Idle;
        true
    }

    /// Leaves the cancelled display state.
    pub fn dismiss(&mut self) -> bool {
        if self.state != ConsentState::Cancelled {
            return false;
        }
        self.state = ConsentState::Idle;
        true
    }

    /// Drops whatever is in the slot from any state and starts a new cycle,
    /// so results from the old one are ignored.
    pub fn abort(&mut self) -> Option<Suggestion> {
        if self.state != ConsentState::Idle {
            tracing::info!("Consent cycle {} aborted from {:?}", self.cycle, self.state);
        }
        self.state = ConsentState::Idle;
        self.cycle += 1;
        self.pending.take().map(|p| p.suggestion)
    }
}
