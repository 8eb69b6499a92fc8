use serde::{Deserialize, Serialize};

/// Counts returned by a consumer acknowledgement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AckResult {
    pub removed: usize,
    pub remaining: usize,
}
