pub mod simulated;
pub mod traits;

pub use simulated::{SimulatedExecutor, Tool};
pub use traits::{ActionExecutor, ActionOutcome, ActionRequest, ExecutorError};
