//! The owning component for all queue-domain state
//!
//! Not synchronized itself: `QueueService` keeps it behind one mutex so every
//! method here runs as a single serialized step.

use chrono::{DateTime, Utc};

use super::controller::{PlaybackController, ProgressOutcome, ProgressReport};
use super::error::{QueueError, QueueResult};
use super::identity::{IdentityCooldown, NamePlan};
use super::item::QueueItem;
use super::policy::{ConfigRegistry, Policy, PolicyUpdate};
use super::snapshot::{QueueState, StateSnapshot};
use super::store::{Placement, QueueStore};
use super::throttle::SubmissionThrottle;

/// Gates passed by a submission; redeemed by `commit_enqueue`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub identity: String,
    pub item_ref: String,
    pub name: String,
    pub name_changed: bool,
    pub admitted_at: DateTime<Utc>,
}

/// Queue domain state
#[derive(Debug, Clone)]
pub struct QueueDomain {
    registry: ConfigRegistry,
    identities: IdentityCooldown,
    throttle: SubmissionThrottle,
    controller: PlaybackController,
    /// Admissions not yet committed; each holds one pending slot
    reserved: usize,
}

impl QueueDomain {
    pub fn new(policy: Policy) -> Self {
        let registry = ConfigRegistry::new(policy);
        let store = QueueStore::new(registry.policy().history_capacity);
        Self {
            registry,
            identities: IdentityCooldown::new(),
            throttle: SubmissionThrottle::new(),
            controller: PlaybackController::new(store),
            reserved: 0,
        }
    }

    pub fn from_snapshot(snapshot: StateSnapshot) -> Self {
        let registry = ConfigRegistry::new(snapshot.policy);
        let store = QueueStore::from_parts(
            snapshot.pending,
            snapshot.current,
            snapshot.history,
            registry.policy().history_capacity,
        );
        Self {
            registry,
            identities: IdentityCooldown::from_records(snapshot.identities),
            throttle: SubmissionThrottle::from_records(snapshot.throttles),
            controller: PlaybackController::new(store),
            reserved: 0,
        }
    }

    pub fn policy(&self) -> Policy {
        self.registry.policy()
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    /// Run every submission gate and stamp the throttle
    ///
    /// Order: name, capacity, throttle. Nothing is committed unless all pass.
    pub fn admit(
        &mut self,
        identity: &str,
        item_ref: &str,
        proposed_name: Option<&str>,
        now: DateTime<Utc>,
    ) -> QueueResult<Admission> {
        let policy = self.registry.policy();

        let plan: NamePlan = self.identities.plan_submission_name(
            identity,
            proposed_name,
            policy.name_cooldown_seconds,
            now,
        )?;

        if self.controller.store().pending().len() + self.reserved >= policy.pending_capacity {
            return Err(QueueError::QueueFull {
                capacity: policy.pending_capacity,
            });
        }

        self.throttle
            .check_and_stamp(identity, policy.submit_throttle_seconds, now)?;
        self.identities.apply_plan(identity, &plan, now);
        self.reserved += 1;

        Ok(Admission {
            identity: identity.to_string(),
            item_ref: item_ref.to_string(),
            name: plan.name,
            name_changed: plan.register,
            admitted_at: now,
        })
    }

    /// Place an admitted submission
    ///
    /// Capacity is not re-checked: the slot was reserved by `admit`.
    pub fn commit_enqueue(&mut self, admission: Admission, display_title: String) -> (QueueItem, Placement) {
        self.reserved = self.reserved.saturating_sub(1);
        let item = QueueItem::new(
            admission.item_ref,
            display_title,
            admission.identity,
            admission.name,
            admission.admitted_at,
        );
        let placement = self.controller.enqueue(item.clone());
        (item, placement)
    }

    pub fn register_name(&mut self, identity: &str, proposed: &str, now: DateTime<Utc>) -> QueueResult<String> {
        let cooldown = self.registry.policy().name_cooldown_seconds;
        self.identities.register_name(identity, proposed, cooldown, now)
    }

    pub fn current_name(&self, identity: &str, now: DateTime<Utc>) -> Option<String> {
        let cooldown = self.registry.policy().name_cooldown_seconds;
        self.identities
            .current_valid_name(identity, cooldown, now)
            .map(str::to_string)
    }

    pub fn advance(&mut self) -> Option<QueueItem> {
        self.controller.advance()
    }

    pub fn rewind(&mut self) -> QueueResult<QueueItem> {
        self.controller.rewind()
    }

    pub fn select_direct(&mut self, item: QueueItem) -> QueueItem {
        self.controller.select_direct(item)
    }

    pub fn resume(&mut self) -> Option<QueueItem> {
        self.controller.resume()
    }

    pub fn remove_by_ref(&mut self, item_ref: &str) -> QueueResult<QueueItem> {
        self.controller
            .remove_first(item_ref)
            .ok_or_else(|| QueueError::NotFound(item_ref.to_string()))
    }

    pub fn clear_pending(&mut self) -> usize {
        self.controller.clear_pending()
    }

    pub fn report_progress(&mut self, report: ProgressReport, now: DateTime<Utc>) -> ProgressOutcome {
        self.controller.report_progress(report, now)
    }

    /// Apply a partial policy update; shrinking history trims immediately
    pub fn update_policy(&mut self, update: &PolicyUpdate) -> Policy {
        let policy = self.registry.apply(update);
        self.controller.set_history_capacity(policy.history_capacity);
        policy
    }

    pub fn state(&self) -> QueueState {
        let store = self.controller.store();
        QueueState {
            status: self.controller.status(),
            current: store.current().cloned(),
            pending: store.pending().iter().cloned().collect(),
            history: store.history().iter().cloned().collect(),
            policy: self.registry.policy(),
            progress: self.controller.progress().cloned(),
        }
    }

    pub fn snapshot(&self) -> StateSnapshot {
        let store = self.controller.store();
        let mut identities: Vec<_> = self.identities.records().cloned().collect();
        identities.sort_by(|a, b| a.identity.cmp(&b.identity));
        let mut throttles: Vec<_> = self.throttle.records().collect();
        throttles.sort_by(|a, b| a.identity.cmp(&b.identity));

        StateSnapshot {
            pending: store.pending().iter().cloned().collect(),
            current: store.current().cloned(),
            history: store.history().iter().cloned().collect(),
            policy: self.registry.policy(),
            identities,
            throttles,
        }
    }
}
