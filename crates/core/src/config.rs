use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_consent_timeout_ms() -> u64 {
    30_000
}

fn default_cooldown_ms() -> u64 {
    2_000
}

fn default_display_delay_ms() -> u64 {
    1_500
}

fn default_suspension_window_ms() -> u64 {
    5_000
}

fn default_audit_capacity() -> usize {
    1_000
}

/// Timing and capacity constants for one governed session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GovernorConfig {
    #[serde(default = "default_consent_timeout_ms")]
    pub consent_timeout_ms: u64,
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
    /// How long a cancellation or error stays visible before reverting to idle.
    #[serde(default = "default_display_delay_ms")]
    pub display_delay_ms: u64,
    #[serde(default = "default_suspension_window_ms")]
    pub suspension_window_ms: u64,
    #[serde(default = "default_audit_capacity")]
    pub audit_capacity: usize,
}

impl GovernorConfig {
    pub fn consent_timeout(&self) -> Duration {
        Duration::from_millis(self.consent_timeout_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn display_delay(&self) -> Duration {
        Duration::from_millis(self.display_delay_ms)
    }

    pub fn suspension_window(&self) -> Duration {
        Duration::from_millis(self.suspension_window_ms)
    }
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            consent_timeout_ms: default_consent_timeout_ms(),
            cooldown_ms: default_cooldown_ms(),
            display_delay_ms: default_display_delay_ms(),
            suspension_window_ms: default_suspension_window_ms(),
            audit_capacity: default_audit_capacity(),
        }
    }
}
