use std::time::Duration;

use async_trait::async_trait;

use super::notifier_model::ChangeObservation;
use crate::errors::Result;

/// Trait for the monotonic change counter
#[async_trait]
pub trait ChangeNotifierTrait: Send + Sync {
    async fn current(&self) -> Result<u64>;
    async fn increment(&self) -> Result<u64>;
    async fn await_change(
        &self,
        last_known: u64,
        max_wait: Duration,
        poll_interval: Duration,
    ) -> Result<ChangeObservation>;
}
