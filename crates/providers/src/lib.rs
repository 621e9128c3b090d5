pub mod http;
pub mod request;
pub mod scripted;
pub mod traits;
pub mod wire;

pub use http::HttpSuggestionProvider;
pub use request::SuggestionRequest;
pub use scripted::ScriptedProvider;
pub use traits::{ProviderError, SuggestionProvider};
pub use wire::parse_suggestion;
