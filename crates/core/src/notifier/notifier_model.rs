use std::time::Duration;

use serde::Serialize;

/// Result of a bounded wait on the change counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChangeObservation {
    pub counter: u64,
    #[serde(rename = "waited_ms", serialize_with = "serialize_millis")]
    pub waited: Duration,
}

impl ChangeObservation {
    /// A repeat of a caller's nonzero counter means nothing new. Zero is never
    /// cache-valid, so first-time callers always get a full payload.
    pub fn is_not_modified(&self, last_known: u64) -> bool {
        self.counter == last_known && self.counter != 0
    }

    pub fn has_new_data(&self, last_known: u64) -> bool {
        self.counter > last_known
    }
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}
