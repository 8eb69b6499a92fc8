use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::time::{sleep, Instant};

use super::notifier_model::ChangeObservation;
use super::notifier_traits::ChangeNotifierTrait;
use crate::constants::COUNTER_KEY;
use crate::errors::Result;
use crate::store::{value_as_i64, KeyValueStore};

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

pub struct ChangeNotifier {
    store: Arc<dyn KeyValueStore>,
}

impl ChangeNotifier {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        ChangeNotifier { store }
    }
}

#[async_trait]
impl ChangeNotifierTrait for ChangeNotifier {
    async fn current(&self) -> Result<u64> {
        match self.store.get(COUNTER_KEY).await? {
            Some(value) => Ok(value_as_i64(COUNTER_KEY, &value)?.max(0) as u64),
            None => Ok(0),
        }
    }

    async fn increment(&self) -> Result<u64> {
        let next = self.store.incr(COUNTER_KEY).await?;
        Ok(next.max(0) as u64)
    }

    /// Re-reads the counter every `poll_interval` until it passes `last_known`
    /// or `max_wait` elapses. Holds no lock between reads.
    async fn await_change(
        &self,
        last_known: u64,
        max_wait: Duration,
        poll_interval: Duration,
    ) -> Result<ChangeObservation> {
        let started = Instant::now();
        let interval = poll_interval.max(MIN_POLL_INTERVAL);
        let mut counter = self.current().await?;

        while counter <= last_known {
            let elapsed = started.elapsed();
            if elapsed >= max_wait {
                break;
            }
            sleep(interval.min(max_wait - elapsed)).await;
            counter = self.current().await?;
        }

        let waited = started.elapsed();
        debug!(
            "await_change last_known={} counter={} waited_ms={}",
            last_known,
            counter,
            waited.as_millis()
        );
        Ok(ChangeObservation { counter, waited })
    }
}
