pub mod lexicon;
pub mod settings;
pub mod suggestion;
pub mod thresholds;
pub mod validator;

pub use lexicon::{
    classify_consent, classify_switch, is_hard_interrupt, AssistantSwitch, ConsentSignal, Language,
};
pub use settings::{AssistMode, Capability, CapabilityVector, PolicyError, Profile, SettingsSnapshot};
pub use suggestion::{ActionDomain, Criticality, Intent, RiskLevel, Suggestion};
pub use validator::{PolicyValidator, RejectionKind, Verdict};
