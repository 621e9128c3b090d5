use custodian_memory::MemoryContext;
use custodian_policy::{CapabilityVector, Language, Profile};
use serde::{Deserialize, Serialize};

/// Everything the reasoning service is told about one request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRequest {
    /// Monotonic sequence number used to discard stale responses.
    pub seq: u64,
    pub context: String,
    pub profile: Profile,
    pub language: Language,
    pub capabilities: CapabilityVector,
    pub memory: MemoryContext,
}
