#[cfg(test)]
mod tests {
    use crate::constants::QUEUE_MAX;
    use crate::donations::Donation;
    use crate::errors::{Error, ValidationError};
    use crate::queue::{
        AckResult, HistoryService, HistoryServiceTrait, QueueService, QueueServiceTrait,
    };
    use crate::store::{KeyValueStore, MemoryStore};
    use std::collections::HashSet;
    use std::sync::Arc;

    fn donation(n: usize) -> Donation {
        Donation {
            id: format!("d{}_1700000000", n),
            external_id: format!("d{}", n),
            donor_name: "Alice".to_string(),
            amount: 100,
            message: String::new(),
            received_at: 1_700_000_000,
        }
    }

    fn store() -> Arc<dyn KeyValueStore> {
        Arc::new(MemoryStore::new())
    }

    fn ids(values: &[&str]) -> HashSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_enqueue_appends_at_tail() {
        let queue = QueueService::new(store());
        assert_eq!(queue.enqueue(&donation(1)).await.unwrap(), 1);
        assert_eq!(queue.enqueue(&donation(2)).await.unwrap(), 2);

        let all = queue.peek_all().await.unwrap();
        assert_eq!(all, vec![donation(1), donation(2)]);
    }

    #[tokio::test]
    async fn test_queue_keeps_most_recent_when_over_capacity() {
        let queue = QueueService::new(store());
        let extra = 7;
        for n in 0..QUEUE_MAX + extra {
            queue.enqueue(&donation(n)).await.unwrap();
        }

        let all = queue.peek_all().await.unwrap();
        assert_eq!(all.len(), QUEUE_MAX);
        assert_eq!(all.first().unwrap(), &donation(extra));
        assert_eq!(all.last().unwrap(), &donation(QUEUE_MAX + extra - 1));
    }

    #[tokio::test]
    async fn test_acknowledge_preserves_order_of_remainder() {
        let queue = QueueService::new(store());
        for n in 1..=4 {
            queue.enqueue(&donation(n)).await.unwrap();
        }

        let result = queue
            .acknowledge(&ids(&["d2_1700000000", "d4"]))
            .await
            .unwrap();
        assert_eq!(
            result,
            AckResult {
                removed: 2,
                remaining: 2
            }
        );
        assert_eq!(
            queue.peek_all().await.unwrap(),
            vec![donation(1), donation(3)]
        );
    }

    #[tokio::test]
    async fn test_acknowledge_is_idempotent() {
        let queue = QueueService::new(store());
        queue.enqueue(&donation(1)).await.unwrap();

        queue.acknowledge(&ids(&["d1"])).await.unwrap();
        let again = queue.acknowledge(&ids(&["d1"])).await.unwrap();
        assert_eq!(
            again,
            AckResult {
                removed: 0,
                remaining: 0
            }
        );
    }

    #[tokio::test]
    async fn test_acknowledge_rejects_empty_id_set() {
        let queue = QueueService::new(store());
        let err = queue.acknowledge(&HashSet::new()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::MissingField(ref f)) if f == "processed_ids"
        ));
    }

    #[tokio::test]
    async fn test_history_is_most_recent_first_and_bounded() {
        let history = HistoryService::with_capacity(store(), 3);
        for n in 1..=5 {
            history.record(&donation(n)).await.unwrap();
        }

        let recent = history.recent(10).await.unwrap();
        assert_eq!(recent, vec![donation(5), donation(4), donation(3)]);
        assert_eq!(history.recent(1).await.unwrap(), vec![donation(5)]);
    }
}
