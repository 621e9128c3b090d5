use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::lexicon::Language;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Operating posture controlling how autonomous the assistant may be.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Profile {
    #[default]
    Normal,
    Active,
    Critical,
}

impl std::str::FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NORMAL" => Ok(Profile::Normal),
            "ACTIVE" => Ok(Profile::Active),
            "CRITICAL" => Ok(Profile::Critical),
            other => Err(format!("unknown profile: {}", other)),
        }
    }
}

/// Whether the assistant only answers or also polls the screen while idle.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssistMode {
    #[default]
    Passive,
    Active,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Network,
    Calling,
    Contacts,
    Location,
    ScreenReading,
    Keyboard,
    ManageApps,
    AiMicrophone,
    UserMicrophone,
    PassiveListening,
}

impl Capability {
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Network => "network",
            Capability::Calling => "calling",
            Capability::Contacts => "contacts",
            Capability::Location => "location",
            Capability::ScreenReading => "screen_reading",
            Capability::Keyboard => "keyboard",
            Capability::ManageApps => "manage_apps",
            Capability::AiMicrophone => "ai_microphone",
            Capability::UserMicrophone => "user_microphone",
            Capability::PassiveListening => "passive_listening",
        }
    }
}

/// Fixed set of granted permissions. The governance core only ever reads it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CapabilityVector {
    pub network: bool,
    pub calling: bool,
    pub contacts: bool,
    pub location: bool,
    pub screen_reading: bool,
    pub keyboard: bool,
    pub manage_apps: bool,
    pub ai_microphone: bool,
    pub user_microphone: bool,
    pub passive_listening: bool,
    /// Every allowed action needs two confirmations while this is on.
    pub critical_assistive_mode: bool,
    pub block_dangerous_keywords: bool,
}

impl CapabilityVector {
    pub fn grants(&self, capability: Capability) -> bool {
        match capability {
            Capability::Network => self.network,
            Capability::Calling => self.calling,
            Capability::Contacts => self.contacts,
            Capability::Location => self.location,
            Capability::ScreenReading => self.screen_reading,
            Capability::Keyboard => self.keyboard,
            Capability::ManageApps => self.manage_apps,
            Capability::AiMicrophone => self.ai_microphone,
            Capability::UserMicrophone => self.user_microphone,
            Capability::PassiveListening => self.passive_listening,
        }
    }

    pub fn set(&mut self, capability: Capability, granted: bool) {
        let slot = match capability {
            Capability::Network => &mut self.network,
            Capability::Calling => &mut self.calling,
            Capability::Contacts => &mut self.contacts,
            Capability::Location => &mut self.location,
            Capability::ScreenReading => &mut self.screen_reading,
            Capability::Keyboard => &mut self.keyboard,
            Capability::ManageApps => &mut self.manage_apps,
            Capability::AiMicrophone => &mut self.ai_microphone,
            Capability::UserMicrophone => &mut self.user_microphone,
            Capability::PassiveListening => &mut self.passive_listening,
        };
        *slot = granted;
    }

    pub fn with(mut self, capability: Capability, granted: bool) -> Self {
        self.set(capability, granted);
        self
    }
}

impl Default for CapabilityVector {
    fn default() -> Self {
        Self {
            network: false,
            calling: true,
            contacts: false,
            location: false,
            screen_reading: true,
            keyboard: true,
            manage_apps: true,
            ai_microphone: false,
            user_microphone: false,
            passive_listening: false,
            critical_assistive_mode: false,
            block_dangerous_keywords: true,
        }
    }
}

/// Read-only snapshot handed over by the settings surface.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SettingsSnapshot {
    pub profile: Profile,
    pub mode: AssistMode,
    pub language: Language,
    pub capabilities: CapabilityVector,
}

impl SettingsSnapshot {
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self, PolicyError> {
        let content = tokio::fs::read_to_string(&path).await?;
        let settings: SettingsSnapshot = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    pub async fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), PolicyError> {
        let content = serde_yaml::to_string(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_mode(mut self, mode: AssistMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn with_capabilities(mut self, capabilities: CapabilityVector) -> Self {
        self.capabilities = capabilities;
        self
    }
}
