//! Queue service
//!
//! Owns the queue domain behind a single mutex and exposes the request-level
//! operations. Title lookup and persistence I/O always happen outside the
//! lock; events and snapshot hand-off happen inside it so their order matches
//! mutation order.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;
use ytq_common::events::{NowPlayingInfo, QueueChangeTrigger, QueueEvent};
use ytq_common::time;

use crate::error::Result;
use crate::persistence::{PersistenceGateway, SnapshotWriter};
use crate::queue::{
    parse_item_ref, Admission, Placement, Policy, PolicyUpdate, ProgressOutcome, ProgressReport, QueueDomain,
    QueueItem, QueueResult, QueueState,
};
use crate::state::SharedState;
use crate::title::TitleResolver;

/// Display name used for items the host selects directly
pub const HOST_SUBMITTER_NAME: &str = "Host";

/// Result of an accepted submission
#[derive(Debug, Clone, Serialize)]
pub struct EnqueueOutcome {
    pub item: QueueItem,
    /// `current` or `pending`
    pub placement: &'static str,
    /// 1-based position in the pending sequence; 0 when playing now
    pub position: usize,
}

impl EnqueueOutcome {
    fn new(item: QueueItem, placement: Placement) -> Self {
        match placement {
            Placement::Current => Self {
                item,
                placement: "current",
                position: 0,
            },
            Placement::Pending(position) => Self {
                item,
                placement: "pending",
                position,
            },
        }
    }
}

/// Single owner of the queue domain
pub struct QueueService {
    domain: Arc<Mutex<QueueDomain>>,
    titles: Arc<dyn TitleResolver>,
    changes: ChangeSink,
}

/// Where committed mutations are announced: SSE subscribers and the snapshot writer
#[derive(Clone)]
struct ChangeSink {
    state: Arc<SharedState>,
    writer: Option<Arc<SnapshotWriter>>,
}

impl QueueService {
    /// Service without persistence
    pub fn new(policy: Policy, titles: Arc<dyn TitleResolver>, state: Arc<SharedState>) -> Self {
        Self {
            domain: Arc::new(Mutex::new(QueueDomain::new(policy))),
            titles,
            changes: ChangeSink {
                state,
                writer: None,
            },
        }
    }

    /// Restore from the gateway (if it holds a snapshot) and persist from now on
    ///
    /// A persisted policy overrides `default_policy`. Load failures are
    /// logged and the service starts empty.
    pub async fn restore(
        default_policy: Policy,
        titles: Arc<dyn TitleResolver>,
        gateway: Arc<dyn PersistenceGateway>,
        state: Arc<SharedState>,
    ) -> Self {
        let domain = match gateway.load().await {
            Ok(Some(snapshot)) => {
                info!(
                    pending = snapshot.pending.len(),
                    history = snapshot.history.len(),
                    playing = snapshot.current.is_some(),
                    "Restored queue snapshot"
                );
                QueueDomain::from_snapshot(snapshot)
            }
            Ok(None) => {
                info!("No saved queue state, starting empty");
                QueueDomain::new(default_policy)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load saved queue state, starting empty");
                QueueDomain::new(default_policy)
            }
        };

        Self {
            domain: Arc::new(Mutex::new(domain)),
            titles,
            changes: ChangeSink {
                state,
                writer: Some(Arc::new(SnapshotWriter::spawn(gateway))),
            },
        }
    }

    pub fn shared_state(&self) -> &Arc<SharedState> {
        &self.changes.state
    }

    // ------------------------------------------------------------------
    // Read-only
    // ------------------------------------------------------------------

    pub async fn state(&self) -> QueueState {
        self.domain.lock().await.state()
    }

    pub async fn policy(&self) -> Policy {
        self.domain.lock().await.policy()
    }

    pub async fn current_name(&self, identity: &str) -> Option<String> {
        self.domain.lock().await.current_name(identity, time::now())
    }

    // ------------------------------------------------------------------
    // Submitter operations
    // ------------------------------------------------------------------

    /// Submit an item on behalf of `identity`
    ///
    /// Gates run and the throttle is stamped in one critical section. Title
    /// lookup and placement then run on a detached task, so an admitted item
    /// lands even if the caller goes away mid-request.
    pub async fn enqueue(
        &self,
        identity: &str,
        raw_ref: &str,
        proposed_name: Option<&str>,
    ) -> QueueResult<EnqueueOutcome> {
        let item_ref = parse_item_ref(raw_ref)?;

        let admission = {
            let mut domain = self.domain.lock().await;
            let admission = domain.admit(identity, &item_ref, proposed_name, time::now())?;
            if admission.name_changed {
                self.changes.persist(&domain);
            }
            admission
        };

        // No await between admission and spawn
        let commit = tokio::spawn(commit_admission(
            Arc::clone(&self.domain),
            Arc::clone(&self.titles),
            self.changes.clone(),
            admission,
        ));

        match commit.await {
            Ok(outcome) => Ok(outcome),
            Err(e) => std::panic::resume_unwind(e.into_panic()),
        }
    }

    /// Register a display name for `identity`
    pub async fn register_name(&self, identity: &str, proposed: &str) -> QueueResult<String> {
        let mut domain = self.domain.lock().await;
        let name = domain.register_name(identity, proposed, time::now())?;
        activity("rename", identity, &name, None, None);
        self.changes.persist(&domain);
        Ok(name)
    }

    // ------------------------------------------------------------------
    // Host operations
    // ------------------------------------------------------------------

    pub async fn advance(&self) -> Option<QueueItem> {
        let mut domain = self.domain.lock().await;
        let before = current_id(&domain);
        let current = domain.advance();
        log_transition("advance", current.as_ref());
        self.changes.publish(&domain, QueueChangeTrigger::HostAdvance, before);
        current
    }

    pub async fn rewind(&self) -> QueueResult<QueueItem> {
        let mut domain = self.domain.lock().await;
        let before = current_id(&domain);
        let current = domain.rewind()?;
        log_transition("rewind", Some(&current));
        self.changes.publish(&domain, QueueChangeTrigger::HostRewind, before);
        Ok(current)
    }

    /// Play `raw_ref` now without touching the pending sequence
    pub async fn select_direct(&self, identity: &str, raw_ref: &str) -> QueueResult<QueueItem> {
        let item_ref = parse_item_ref(raw_ref)?;
        let title = self.titles.resolve(&item_ref).await;

        let mut domain = self.domain.lock().await;
        let before = current_id(&domain);
        let item = QueueItem::new(item_ref, title, identity, HOST_SUBMITTER_NAME, time::now());
        let current = domain.select_direct(item);
        log_transition("select", Some(&current));
        self.changes.publish(&domain, QueueChangeTrigger::HostSelect, before);
        Ok(current)
    }

    /// Start playback from the pending head when idle
    pub async fn resume(&self) -> Option<QueueItem> {
        let mut domain = self.domain.lock().await;
        let before = current_id(&domain);
        let current = domain.resume();
        if current_id(&domain) != before {
            log_transition("resume", current.as_ref());
            self.changes.publish(&domain, QueueChangeTrigger::HostResume, before);
        }
        current
    }

    pub async fn clear_pending(&self) -> usize {
        let mut domain = self.domain.lock().await;
        let before = current_id(&domain);
        let cleared = domain.clear_pending();
        info!(target: "ytq::activity", action = "clear", cleared, "Pending queue cleared");
        self.changes.publish(&domain, QueueChangeTrigger::HostClear, before);
        cleared
    }

    /// Remove the first pending item with the given reference
    pub async fn remove_by_ref(&self, raw_ref: &str) -> QueueResult<QueueItem> {
        let item_ref = parse_item_ref(raw_ref)?;

        let mut domain = self.domain.lock().await;
        let before = current_id(&domain);
        let removed = domain.remove_by_ref(&item_ref)?;
        activity(
            "remove",
            &removed.submitter_identity,
            &removed.submitter_name,
            Some(&removed.item_ref),
            Some(&removed.display_title),
        );
        self.changes.publish(&domain, QueueChangeTrigger::HostRemove, before);
        Ok(removed)
    }

    /// Apply a progress report from the playback surface
    pub async fn report_progress(&self, mut report: ProgressReport) -> ProgressOutcome {
        report.item_ref = report.item_ref.trim().to_string();
        let now = time::now();

        let mut domain = self.domain.lock().await;
        let before = current_id(&domain);
        let outcome = domain.report_progress(report, now);

        match &outcome {
            ProgressOutcome::Recorded(progress) => {
                self.changes.state.broadcast_event(QueueEvent::ProgressUpdated {
                    item_ref: progress.item_ref.clone(),
                    position_seconds: progress.position_seconds,
                    duration_seconds: progress.duration_seconds,
                    ended: false,
                    timestamp: now,
                });
            }
            ProgressOutcome::Advanced(current) => {
                log_transition("ended", current.as_ref());
                self.changes.publish(&domain, QueueChangeTrigger::PlaybackEnded, before);
            }
            ProgressOutcome::Ignored => {
                debug!("Ignored progress report for non-current item");
            }
        }
        outcome
    }

    /// Apply a partial policy update; returns the effective policy
    pub async fn update_policy(&self, update: PolicyUpdate) -> Policy {
        let mut domain = self.domain.lock().await;
        let policy = domain.update_policy(&update);
        info!(
            target: "ytq::activity",
            action = "policy",
            submit_throttle_seconds = policy.submit_throttle_seconds,
            name_cooldown_seconds = policy.name_cooldown_seconds,
            history_capacity = policy.history_capacity,
            pending_capacity = policy.pending_capacity,
            "Policy updated"
        );
        self.changes.state.broadcast_event(QueueEvent::PolicyChanged {
            submit_throttle_seconds: policy.submit_throttle_seconds,
            name_cooldown_seconds: policy.name_cooldown_seconds,
            history_capacity: policy.history_capacity,
            pending_capacity: policy.pending_capacity,
            timestamp: time::now(),
        });
        self.changes.persist(&domain);
        policy
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Write the current state synchronously (used at shutdown)
    pub async fn persist_now(&self) -> Result<()> {
        let Some(writer) = &self.changes.writer else {
            return Ok(());
        };
        let snapshot = self.domain.lock().await.snapshot();
        if writer.write_now(snapshot).await {
            info!("Queue state saved");
        }
        Ok(())
    }
}

/// Resolve the title for an admitted submission and place it
async fn commit_admission(
    domain: Arc<Mutex<QueueDomain>>,
    titles: Arc<dyn TitleResolver>,
    changes: ChangeSink,
    admission: Admission,
) -> EnqueueOutcome {
    let title = titles.resolve(&admission.item_ref).await;

    let mut domain = domain.lock().await;
    let before = current_id(&domain);
    let name_changed = admission.name_changed;
    let (item, placement) = domain.commit_enqueue(admission, title);

    if name_changed {
        activity("rename", &item.submitter_identity, &item.submitter_name, None, None);
    }
    activity(
        "enqueue",
        &item.submitter_identity,
        &item.submitter_name,
        Some(&item.item_ref),
        Some(&item.display_title),
    );
    changes.publish(&domain, QueueChangeTrigger::UserEnqueue, before);

    EnqueueOutcome::new(item, placement)
}

impl ChangeSink {
    fn persist(&self, domain: &QueueDomain) {
        if let Some(writer) = &self.writer {
            writer.submit(domain.snapshot());
        }
    }

    /// Broadcast change events and hand a snapshot to the writer
    fn publish(&self, domain: &QueueDomain, trigger: QueueChangeTrigger, before: Option<Uuid>) {
        let now = time::now();
        let store = domain.controller().store();

        self.state.broadcast_event(QueueEvent::QueueChanged {
            trigger,
            pending_count: store.pending().len(),
            timestamp: now,
        });

        if store.current().map(|i| i.entry_id) != before {
            self.state.broadcast_event(QueueEvent::CurrentChanged {
                current: store.current().map(now_playing),
                timestamp: now,
            });
        }

        self.persist(domain);
    }
}

fn current_id(domain: &QueueDomain) -> Option<Uuid> {
    domain.controller().current().map(|i| i.entry_id)
}

fn now_playing(item: &QueueItem) -> NowPlayingInfo {
    NowPlayingInfo {
        entry_id: item.entry_id,
        item_ref: item.item_ref.clone(),
        display_title: item.display_title.clone(),
        submitter_name: item.submitter_name.clone(),
    }
}

fn activity(action: &str, identity: &str, name: &str, item_ref: Option<&str>, title: Option<&str>) {
    info!(
        target: "ytq::activity",
        action,
        identity,
        name,
        item_ref = item_ref.unwrap_or(""),
        title = title.unwrap_or(""),
        "Queue activity"
    );
}

fn log_transition(action: &str, current: Option<&QueueItem>) {
    match current {
        Some(item) => info!(
            target: "ytq::activity",
            action,
            identity = %item.submitter_identity,
            name = %item.submitter_name,
            item_ref = %item.item_ref,
            title = %item.display_title,
            "Now playing"
        ),
        None => info!(target: "ytq::activity", action, "Playback idle"),
    }
}
