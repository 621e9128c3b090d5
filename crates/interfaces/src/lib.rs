pub mod render;
pub mod scripted;
pub mod terminal;
pub mod traits;

pub use render::{describe_notice, status_label};
pub use scripted::ScriptedInterface;
pub use terminal::TerminalInterface;
pub use traits::Interface;
