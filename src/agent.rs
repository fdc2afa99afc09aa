//! Agent identity

use serde::{Deserialize, Serialize};

/// Opaque identifier for a navigating agent.
///
/// The host simulation owns the id space; this crate only uses ids as
/// map keys and to tag outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u64);

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "agent#{}", self.0)
    }
}
