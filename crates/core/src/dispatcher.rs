use custodian_memory::{MemoryContext, MemoryManager};
use custodian_policy::{SettingsSnapshot, Suggestion};
use custodian_providers::{ProviderError, SuggestionRequest};

use crate::error::{DispatchRefusal, FailureKind};

/// Conditions under which a new request may be issued.
#[derive(Debug, Clone, Copy)]
pub struct DispatchGate {
    pub slot_occupied: bool,
    pub suspended: bool,
    /// Master switch; off means no new requests at all.
    pub enabled: bool,
    pub online: bool,
}

#[derive(Debug)]
struct InFlight {
    seq: u64,
    context: String,
}

#[derive(Debug, PartialEq)]
pub enum Settlement {
    /// Response to a request that is no longer the current one.
    Stale,
    Accepted(Suggestion),
    Failed { kind: FailureKind, reason: String },
}

/// Issues sequence-tagged requests to the reasoning service, one at a time.
#[derive(Debug, Default)]
pub struct Dispatcher {
    last_seq: u64,
    in_flight: Option<InFlight>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_flight(&self) -> Option<u64> {
        self.in_flight.as_ref().map(|f| f.seq)
    }

    pub fn prepare(
        &mut self,
        context: String,
        settings: &SettingsSnapshot,
        memory: MemoryContext,
        gate: DispatchGate,
    ) -> Result<SuggestionRequest, DispatchRefusal> {
        if gate.suspended {
            return Err(DispatchRefusal::Suspended);
        }
        if !gate.enabled {
            return Err(DispatchRefusal::Disabled);
        }
        if gate.slot_occupied {
            return Err(DispatchRefusal::PendingConsent);
        }
        if self.in_flight.is_some() {
            return Err(DispatchRefusal::InFlight);
        }
        if !gate.online {
            return Err(DispatchRefusal::Offline);
        }

        self.last_seq += 1;
        let seq = self.last_seq;
        tracing::debug!("Dispatching request seq={}", seq);

        self.in_flight = Some(InFlight {
            seq,
            context: context.clone(),
        });

        Ok(SuggestionRequest {
            seq,
            context,
            profile: settings.profile,
            language: settings.language,
            capabilities: settings.capabilities.clone(),
            memory,
        })
    }

    /// Commits a response if it answers the current request. Only a
    /// successful response touches memory.
    pub fn settle(
        &mut self,
        seq: u64,
        result: Result<Suggestion, ProviderError>,
        memory: &mut MemoryManager,
    ) -> Settlement {
        if self.in_flight() != Some(seq) {
            return Settlement::Stale;
        }
        let Some(request) = self.in_flight.take() else {
            return Settlement::Stale;
        };

        match result {
            Ok(suggestion) => {
                memory.record_interaction(
                    &request.context,
                    &suggestion.description,
                    suggestion.is_task_complete,
                );
                Settlement::Accepted(suggestion)
            }
            Err(error) => {
                tracing::warn!("Request seq={} failed: {}", seq, error);
                Settlement::Failed {
                    kind: FailureKind::from(&error),
                    reason: error.to_string(),
                }
            }
        }
    }

    /// Forgets the outstanding request so its response is dropped.
    pub fn invalidate(&mut self) -> Option<u64> {
        self.in_flight.take().map(|f| f.seq)
    }
}
