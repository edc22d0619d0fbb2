//! Best-effort state persistence
//!
//! The in-memory domain is authoritative. Snapshots are handed to a
//! background writer after each mutation; write failures are logged and
//! never reach the caller of the mutation.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::Result;
use crate::queue::StateSnapshot;

/// Durable store for queue snapshots
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Most recent snapshot, or None if nothing was ever saved
    async fn load(&self) -> Result<Option<StateSnapshot>>;

    /// Replace the stored state
    async fn snapshot(&self, state: &StateSnapshot) -> Result<()>;
}

#[derive(Debug)]
struct Versioned {
    seq: u64,
    snapshot: StateSnapshot,
}

/// Coalescing background snapshot writer
///
/// Bursts of mutations collapse into one write of the newest snapshot.
/// Sequence numbers stop an older snapshot from overwriting a newer one.
pub struct SnapshotWriter {
    gateway: Arc<dyn PersistenceGateway>,
    tx: watch::Sender<Option<Arc<Versioned>>>,
    next_seq: AtomicU64,
    written: Arc<Mutex<u64>>,
    task: JoinHandle<()>,
}

impl SnapshotWriter {
    /// Start the background writer task
    pub fn spawn(gateway: Arc<dyn PersistenceGateway>) -> Self {
        let (tx, mut rx) = watch::channel::<Option<Arc<Versioned>>>(None);
        let written = Arc::new(Mutex::new(0u64));

        let task_gateway = Arc::clone(&gateway);
        let task_written = Arc::clone(&written);
        let task = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let latest = rx.borrow_and_update().clone();
                if let Some(versioned) = latest {
                    write_if_newer(task_gateway.as_ref(), &task_written, &versioned).await;
                }
            }
            debug!("Snapshot writer stopped");
        });

        Self {
            gateway,
            tx,
            next_seq: AtomicU64::new(1),
            written,
            task,
        }
    }

    /// Queue a snapshot for background writing
    ///
    /// Call while the snapshot's source is still locked so sequence order
    /// matches mutation order. Never blocks.
    pub fn submit(&self, snapshot: StateSnapshot) {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        self.tx.send_replace(Some(Arc::new(Versioned { seq, snapshot })));
    }

    /// Write a snapshot now and wait for the result
    pub async fn write_now(&self, snapshot: StateSnapshot) -> bool {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        write_if_newer(self.gateway.as_ref(), &self.written, &Versioned { seq, snapshot }).await
    }

    /// Sequence number of the newest snapshot on disk
    pub async fn written_seq(&self) -> u64 {
        *self.written.lock().await
    }
}

impl Drop for SnapshotWriter {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn write_if_newer(gateway: &dyn PersistenceGateway, written: &Mutex<u64>, versioned: &Versioned) -> bool {
    let mut last = written.lock().await;
    if versioned.seq <= *last {
        return true;
    }

    match gateway.snapshot(&versioned.snapshot).await {
        Ok(()) => {
            *last = versioned.seq;
            debug!(seq = versioned.seq, "Snapshot written");
            true
        }
        Err(e) => {
            warn!(seq = versioned.seq, error = %e, "Failed to persist queue snapshot");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::queue::Policy;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingGateway {
        writes: StdMutex<Vec<usize>>,
        fail: bool,
    }

    #[async_trait]
    impl PersistenceGateway for RecordingGateway {
        async fn load(&self) -> Result<Option<StateSnapshot>> {
            Ok(None)
        }

        async fn snapshot(&self, state: &StateSnapshot) -> Result<()> {
            if self.fail {
                return Err(Error::Internal("disk on fire".to_string()));
            }
            self.writes.lock().unwrap().push(state.policy.history_capacity);
            Ok(())
        }
    }

    fn snapshot_with(history_capacity: usize) -> StateSnapshot {
        StateSnapshot {
            policy: Policy {
                history_capacity,
                ..Policy::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_background_write_eventually_lands() {
        let gateway = Arc::new(RecordingGateway::default());
        let writer = SnapshotWriter::spawn(gateway.clone());

        writer.submit(snapshot_with(3));

        for _ in 0..50 {
            if writer.written_seq().await == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(*gateway.writes.lock().unwrap(), vec![3]);
    }

    #[tokio::test]
    async fn test_write_now_supersedes_queued() {
        let gateway = Arc::new(RecordingGateway::default());
        let writer = SnapshotWriter::spawn(gateway.clone());

        writer.submit(snapshot_with(1));
        assert!(writer.write_now(snapshot_with(2)).await);
        tokio::time::sleep(Duration::from_millis(50)).await;

        // The older queued snapshot must never be written after the newer one
        let writes = gateway.writes.lock().unwrap().clone();
        assert_eq!(writes.last(), Some(&2));
    }

    #[tokio::test]
    async fn test_failure_is_reported_not_propagated() {
        let gateway = Arc::new(RecordingGateway {
            fail: true,
            ..Default::default()
        });
        let writer = SnapshotWriter::spawn(gateway);

        assert!(!writer.write_now(snapshot_with(2)).await);
        assert_eq!(writer.written_seq().await, 0);
    }
}
