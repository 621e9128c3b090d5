pub mod audit;
pub mod config;
pub mod consent;
pub mod dispatcher;
pub mod error;
pub mod governor;
pub mod killswitch;
pub mod runtime;
pub mod timers;
pub mod types;

pub use audit::{AuditCategory, AuditEvent, AuditLog, AuditSink, JsonlAuditSink};
pub use config::GovernorConfig;
pub use consent::{ConsentMachine, ConsentStep, ExecutionOrder};
pub use dispatcher::{DispatchGate, Dispatcher, Settlement};
pub use error::{DispatchRefusal, FailureKind, GovernanceError};
pub use governor::{Effect, Governor};
pub use killswitch::KillSwitch;
pub use runtime::{GovernanceRuntime, RuntimeHandle};
pub use timers::{TimerHandle, TimerKind, TimerTable};
pub use types::*;
