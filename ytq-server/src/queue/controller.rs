//! Playback state machine over the current slot
//!
//! `Idle` ⇔ the current slot is empty. Every transition replaces the current
//! item and resets the last reported progress.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::QueueResult;
use super::item::QueueItem;
use super::store::{Placement, QueueStore};

/// Playback status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    Idle,
    Playing,
}

/// Last progress observed from the playback surface (not persisted)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackProgress {
    pub entry_id: Uuid,
    pub item_ref: String,
    pub position_seconds: f64,
    pub duration_seconds: f64,
    pub observed_at: DateTime<Utc>,
    pub ended: bool,
}

/// Progress report as received from the playback surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressReport {
    pub item_ref: String,
    /// Targets one specific entry when several share `item_ref`
    #[serde(default)]
    pub entry_id: Option<Uuid>,
    #[serde(default)]
    pub position_seconds: f64,
    #[serde(default)]
    pub duration_seconds: f64,
    #[serde(default)]
    pub ended: bool,
}

/// What a progress report did
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressOutcome {
    /// Stored as the latest progress
    Recorded(PlaybackProgress),
    /// End of media advanced playback; carries the new current item
    Advanced(Option<QueueItem>),
    /// Report did not refer to the current item (stale or duplicate)
    Ignored,
}

/// Orchestrates transitions on the queue store
#[derive(Debug, Clone)]
pub struct PlaybackController {
    store: QueueStore,
    progress: Option<PlaybackProgress>,
    /// Item ref auto-advanced away from; kept while the current item shares
    /// that ref and has not yet reported non-ended progress
    ended_ref: Option<String>,
}

impl PlaybackController {
    pub fn new(store: QueueStore) -> Self {
        Self {
            store,
            progress: None,
            ended_ref: None,
        }
    }

    pub fn store(&self) -> &QueueStore {
        &self.store
    }

    pub fn progress(&self) -> Option<&PlaybackProgress> {
        self.progress.as_ref()
    }

    pub fn status(&self) -> PlaybackStatus {
        if self.store.is_idle() {
            PlaybackStatus::Idle
        } else {
            PlaybackStatus::Playing
        }
    }

    pub fn current(&self) -> Option<&QueueItem> {
        self.store.current()
    }

    /// Enqueue; `Idle --enqueue--> Playing`
    pub fn enqueue(&mut self, item: QueueItem) -> Placement {
        let was_idle = self.store.is_idle();
        let placement = self.store.enqueue(item);
        if was_idle {
            self.transitioned();
        }
        placement
    }

    pub fn advance(&mut self) -> Option<QueueItem> {
        let current = self.store.advance().cloned();
        self.transitioned();
        current
    }

    pub fn rewind(&mut self) -> QueueResult<QueueItem> {
        let current = self.store.rewind()?.clone();
        self.transitioned();
        Ok(current)
    }

    pub fn select_direct(&mut self, item: QueueItem) -> QueueItem {
        let current = self.store.select_direct(item).clone();
        self.transitioned();
        current
    }

    /// Promote the pending head if idle; returns the current item either way
    pub fn resume(&mut self) -> Option<QueueItem> {
        if self.store.promote_if_idle().is_some() {
            self.transitioned();
        }
        self.store.current().cloned()
    }

    pub fn remove_first(&mut self, item_ref: &str) -> Option<QueueItem> {
        self.store.remove_first(item_ref)
    }

    pub fn clear_pending(&mut self) -> usize {
        self.store.clear_pending()
    }

    pub fn set_history_capacity(&mut self, capacity: usize) {
        self.store.set_history_capacity(capacity);
    }

    /// Apply a progress report
    ///
    /// Only reports for the current item count. The first `ended` report per
    /// current item advances; duplicates arrive after the item is no longer
    /// current and are ignored.
    pub fn report_progress(&mut self, report: ProgressReport, now: DateTime<Utc>) -> ProgressOutcome {
        let Some(current) = self.store.current() else {
            return ProgressOutcome::Ignored;
        };

        let matches = match report.entry_id {
            Some(id) => id == current.entry_id,
            None => {
                let repeated_end =
                    report.ended && self.ended_ref.as_deref() == Some(report.item_ref.as_str());
                current.item_ref == report.item_ref && !repeated_end
            }
        };
        if !matches {
            return ProgressOutcome::Ignored;
        }

        if report.ended {
            let ended_ref = current.item_ref.clone();
            let next = self.advance();
            self.ended_ref = Some(ended_ref);
            return ProgressOutcome::Advanced(next);
        }

        let progress = PlaybackProgress {
            entry_id: current.entry_id,
            item_ref: current.item_ref.clone(),
            position_seconds: report.position_seconds.max(0.0),
            duration_seconds: report.duration_seconds.max(0.0),
            observed_at: now,
            ended: false,
        };
        self.ended_ref = None;
        self.progress = Some(progress.clone());
        ProgressOutcome::Recorded(progress)
    }

    fn transitioned(&mut self) {
        self.progress = None;
        let current_ref = self.store.current().map(|i| i.item_ref.as_str());
        if self.ended_ref.as_deref() != current_ref {
            self.ended_ref = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(item_ref: &str) -> QueueItem {
        QueueItem::new(item_ref, item_ref, "10.0.0.1", "Ann", Utc::now())
    }

    fn report(item_ref: &str, ended: bool) -> ProgressReport {
        ProgressReport {
            item_ref: item_ref.to_string(),
            entry_id: None,
            position_seconds: 12.5,
            duration_seconds: 200.0,
            ended,
        }
    }

    fn controller() -> PlaybackController {
        PlaybackController::new(QueueStore::new(20))
    }

    #[test]
    fn test_idle_to_playing_on_enqueue() {
        let mut c = controller();
        assert_eq!(c.status(), PlaybackStatus::Idle);
        c.enqueue(item("a"));
        assert_eq!(c.status(), PlaybackStatus::Playing);
    }

    #[test]
    fn test_advance_to_idle_when_pending_empty() {
        let mut c = controller();
        c.enqueue(item("a"));
        assert!(c.advance().is_none());
        assert_eq!(c.status(), PlaybackStatus::Idle);
    }

    #[test]
    fn test_progress_recorded_for_current() {
        let mut c = controller();
        c.enqueue(item("a"));

        let outcome = c.report_progress(report("a", false), Utc::now());
        assert!(matches!(outcome, ProgressOutcome::Recorded(_)));
        assert_eq!(c.progress().unwrap().position_seconds, 12.5);
    }

    #[test]
    fn test_progress_for_other_item_ignored() {
        let mut c = controller();
        c.enqueue(item("a"));
        assert_eq!(c.report_progress(report("b", false), Utc::now()), ProgressOutcome::Ignored);
        assert!(c.progress().is_none());
    }

    #[test]
    fn test_duplicate_ended_reports_advance_once() {
        let mut c = controller();
        c.enqueue(item("a"));
        c.enqueue(item("b"));
        c.enqueue(item("c"));

        let first = c.report_progress(report("a", true), Utc::now());
        assert!(matches!(first, ProgressOutcome::Advanced(Some(ref i)) if i.item_ref == "b"));

        let second = c.report_progress(report("a", true), Utc::now());
        assert_eq!(second, ProgressOutcome::Ignored);
        assert_eq!(c.current().unwrap().item_ref, "b");
    }

    #[test]
    fn test_duplicate_ended_with_same_ref_next() {
        let mut c = controller();
        c.enqueue(item("a"));
        c.enqueue(item("a"));
        c.enqueue(item("z"));

        assert!(matches!(
            c.report_progress(report("a", true), Utc::now()),
            ProgressOutcome::Advanced(_)
        ));
        // Second ended report for the finished entry must not skip the repeat
        assert_eq!(c.report_progress(report("a", true), Utc::now()), ProgressOutcome::Ignored);
        assert_eq!(c.current().unwrap().item_ref, "a");
        assert_eq!(c.store().pending().len(), 1);

        // Once the repeat reports progress its own end is honored
        assert!(matches!(
            c.report_progress(report("a", false), Utc::now()),
            ProgressOutcome::Recorded(_)
        ));
        assert!(matches!(
            c.report_progress(report("a", true), Utc::now()),
            ProgressOutcome::Advanced(Some(ref i)) if i.item_ref == "z"
        ));
    }

    #[test]
    fn test_late_ended_report_after_idle_requeue() {
        let mut c = controller();
        c.enqueue(item("a"));
        assert_eq!(
            c.report_progress(report("a", true), Utc::now()),
            ProgressOutcome::Advanced(None)
        );
        assert_eq!(c.status(), PlaybackStatus::Idle);

        // Same ref queued again from idle; the stale end report must not skip it
        c.enqueue(item("a"));
        c.enqueue(item("b"));
        assert_eq!(c.report_progress(report("a", true), Utc::now()), ProgressOutcome::Ignored);
        assert_eq!(c.current().unwrap().item_ref, "a");

        assert!(matches!(
            c.report_progress(report("a", false), Utc::now()),
            ProgressOutcome::Recorded(_)
        ));
        assert!(matches!(
            c.report_progress(report("a", true), Utc::now()),
            ProgressOutcome::Advanced(Some(ref i)) if i.item_ref == "b"
        ));
    }

    #[test]
    fn test_ended_guard_dropped_for_different_ref() {
        let mut c = controller();
        c.enqueue(item("a"));
        c.report_progress(report("a", true), Utc::now());

        c.enqueue(item("b"));
        c.enqueue(item("a"));
        c.advance();
        // Guard was cleared when "b" took over, so the new "a" ends normally
        assert!(matches!(
            c.report_progress(report("a", true), Utc::now()),
            ProgressOutcome::Advanced(None)
        ));
    }

    #[test]
    fn test_ended_by_entry_id() {
        let mut c = controller();
        c.enqueue(item("a"));
        c.enqueue(item("a"));
        let first_id = c.current().unwrap().entry_id;

        let mut r = report("a", true);
        r.entry_id = Some(first_id);
        assert!(matches!(c.report_progress(r.clone(), Utc::now()), ProgressOutcome::Advanced(_)));
        assert_eq!(c.report_progress(r, Utc::now()), ProgressOutcome::Ignored);
        assert_ne!(c.current().unwrap().entry_id, first_id);
    }

    #[test]
    fn test_ended_when_idle_ignored() {
        let mut c = controller();
        assert_eq!(c.report_progress(report("a", true), Utc::now()), ProgressOutcome::Ignored);
    }

    #[test]
    fn test_transitions_reset_progress() {
        let mut c = controller();
        c.enqueue(item("a"));
        c.enqueue(item("b"));
        c.report_progress(report("a", false), Utc::now());
        assert!(c.progress().is_some());

        c.advance();
        assert!(c.progress().is_none());
    }

    #[test]
    fn test_resume_promotes_only_when_idle() {
        let mut c = PlaybackController::new(QueueStore::from_parts(
            vec![item("a"), item("b")],
            None,
            vec![],
            20,
        ));
        assert_eq!(c.resume().unwrap().item_ref, "a");
        assert_eq!(c.resume().unwrap().item_ref, "a");
        assert_eq!(c.store().pending().len(), 1);
    }

    #[test]
    fn test_resume_on_empty_is_noop() {
        let mut c = controller();
        assert!(c.resume().is_none());
        assert_eq!(c.status(), PlaybackStatus::Idle);
    }
}
