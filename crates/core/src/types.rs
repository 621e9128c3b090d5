use custodian_policy::Suggestion;
use serde::{Deserialize, Serialize};

use crate::error::{DispatchRefusal, FailureKind};

/// Coarse status mirrored to observers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationalStatus {
    #[default]
    Idle,
    Analyzing,
    Ready,
    Executing,
    Cooldown,
    Error,
    Suspended,
    Offline,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsentState {
    #[default]
    Idle,
    WaitingForExplicitYes,
    DoubleConfirmation,
    Confirmed,
    Cancelled,
    Executing,
    Cooldown,
}

impl ConsentState {
    pub fn is_awaiting_answer(self) -> bool {
        matches!(
            self,
            ConsentState::WaitingForExplicitYes | ConsentState::DoubleConfirmation
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Final transcribed speech.
    Utterance(String),
    Typed(String),
    /// Periodic nudge emitted by the runtime while idle in active mode.
    IdleCheck,
}

/// Raw output of a transcription source.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub text: String,
    pub is_final: bool,
}

impl Transcript {
    pub fn new(text: impl Into<String>, is_final: bool) -> Self {
        Self {
            text: text.into(),
            is_final,
        }
    }

    /// Interim transcripts never become input events.
    pub fn into_event(self) -> Option<InputEvent> {
        if self.is_final && !self.text.trim().is_empty() {
            Some(InputEvent::Utterance(self.text))
        } else {
            None
        }
    }
}

/// User-facing notifications produced by governance decisions.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Proposed {
        suggestion: Suggestion,
        double_confirmation: bool,
    },
    AwaitingSecondConfirmation {
        action: String,
    },
    Answer {
        text: String,
    },
    Cancelled {
        reason: String,
    },
    Executed {
        summary: String,
    },
    Failed {
        kind: FailureKind,
        reason: String,
    },
    Refused(DispatchRefusal),
    Suspended,
    Resumed,
    /// The master switch changed.
    Switched {
        enabled: bool,
    },
    Remembered,
    MemoryPurged,
}
