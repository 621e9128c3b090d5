use custodian_executor::ExecutorError;
use custodian_memory::MemoryError;
use custodian_policy::RejectionKind;
use custodian_providers::ProviderError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure taxonomy surfaced to observers. A kill-switch activation is never
/// one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    PermissionDenied,
    RiskRejected,
    StructuralInvalid,
    Timeout,
    BusFailure,
    ExecutionFailure,
}

impl FailureKind {
    /// Local, deterministic failures. Retrying them without new input gives
    /// the same answer.
    pub fn is_deterministic(self) -> bool {
        matches!(
            self,
            FailureKind::PermissionDenied | FailureKind::RiskRejected | FailureKind::StructuralInvalid
        )
    }
}

impl From<RejectionKind> for FailureKind {
    fn from(kind: RejectionKind) -> Self {
        match kind {
            RejectionKind::PermissionDenied => FailureKind::PermissionDenied,
            RejectionKind::RiskRejected => FailureKind::RiskRejected,
        }
    }
}

impl From<&ProviderError> for FailureKind {
    fn from(error: &ProviderError) -> Self {
        if error.is_structural() {
            FailureKind::StructuralInvalid
        } else {
            FailureKind::BusFailure
        }
    }
}

impl From<&ExecutorError> for FailureKind {
    fn from(_: &ExecutorError) -> Self {
        FailureKind::ExecutionFailure
    }
}

/// Why a new request was not issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum DispatchRefusal {
    #[error("a suggestion is already pending consent")]
    PendingConsent,
    #[error("a request is already in flight")]
    InFlight,
    #[error("assistant is suspended")]
    Suspended,
    #[error("assistant is switched off")]
    Disabled,
    #[error("assistant is offline")]
    Offline,
}

impl DispatchRefusal {
    /// Refusals that also count as a surfaced failure. Losing the service
    /// connection is a bus failure; the rest are ordinary gating.
    pub fn failure_kind(self) -> Option<FailureKind> {
        match self {
            DispatchRefusal::Offline => Some(FailureKind::BusFailure),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),
    #[error("Audit sink error: {0}")]
    AuditSink(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Runtime is not running")]
    RuntimeClosed,
}
