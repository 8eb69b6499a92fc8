use super::{get_connection, DbPool};
use crate::errors::StorageError;
use diesel::SqliteConnection;
use log::{debug, error};
use std::any::Any;
use tokio::sync::{mpsc, oneshot};
use tipstream_core::errors::{Result, StoreError};

// A write job runs against the actor's connection inside one immediate
// transaction and reports a core Result.
type Job<T> = Box<dyn FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static>;

type Envelope = (
    Job<Box<dyn Any + Send + 'static>>,
    oneshot::Sender<Result<Box<dyn Any + Send + 'static>>>,
);

const WRITER_QUEUE_DEPTH: usize = 1024;

/// Handle for sending jobs to the writer actor.
#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::Sender<Envelope>,
}

impl WriteHandle {
    /// Executes a job on the writer actor's dedicated connection.
    ///
    /// Jobs run one at a time, so a read-modify-write performed inside `job`
    /// is atomic with respect to every other write.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static + Any,
    {
        let (ret_tx, ret_rx) = oneshot::channel();

        self.tx
            .send((
                Box::new(move |c| job(c).map(|v| Box::new(v) as Box<dyn Any + Send>)),
                ret_tx,
            ))
            .await
            .map_err(|_| StoreError::Unavailable("writer actor stopped".to_string()))?;

        let boxed = ret_rx.await.map_err(|_| {
            StoreError::Unavailable("writer actor dropped the reply".to_string())
        })??;

        boxed.downcast::<T>().map(|v| *v).map_err(|_| {
            StoreError::Internal("unexpected writer actor result type".to_string()).into()
        })
    }
}

/// Spawns a background Tokio task that acts as the single writer to the database.
///
/// The actor holds one pooled connection for its lifetime and ends when every
/// `WriteHandle` has been dropped. Must be called from within a Tokio runtime.
pub fn spawn_writer(pool: &DbPool) -> Result<WriteHandle> {
    let mut conn = get_connection(pool)?;
    let (tx, mut rx) = mpsc::channel::<Envelope>(WRITER_QUEUE_DEPTH);

    tokio::spawn(async move {
        while let Some((job, reply_tx)) = rx.recv().await {
            let result: Result<Box<dyn Any + Send + 'static>> = conn
                .immediate_transaction::<_, StorageError, _>(|c| job(c).map_err(StorageError::from))
                .map_err(|e: StorageError| {
                    error!("Write transaction rolled back: {}", e);
                    e.into()
                });

            // The requester may have gone away (timeout or cancellation).
            let _ = reply_tx.send(result);
        }
        debug!("Writer actor shutting down");
    });

    Ok(WriteHandle { tx })
}
