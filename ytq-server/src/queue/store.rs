//! Pending sequence, current slot and bounded history
//!
//! All operations are total: empty states are represented explicitly rather
//! than by failure. The only rejection is `rewind` with empty history.

use std::collections::VecDeque;

use super::error::{QueueError, QueueResult};
use super::item::QueueItem;

/// Where an enqueued item landed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Promoted straight into the current slot
    Current,
    /// Appended to the pending sequence (1-based position)
    Pending(usize),
}

/// Queue container
///
/// Invariants:
/// - At most one current item
/// - An item moved into `current` is never also in `pending`
/// - `history.len() <= history_capacity` after every operation
#[derive(Debug, Clone)]
pub struct QueueStore {
    pending: VecDeque<QueueItem>,
    current: Option<QueueItem>,
    /// Most recent first
    history: VecDeque<QueueItem>,
    history_capacity: usize,
}

impl QueueStore {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            pending: VecDeque::new(),
            current: None,
            history: VecDeque::new(),
            history_capacity: history_capacity.max(1),
        }
    }

    /// Rebuild from persisted parts, trimming history to capacity
    pub fn from_parts(
        pending: Vec<QueueItem>,
        current: Option<QueueItem>,
        history: Vec<QueueItem>,
        history_capacity: usize,
    ) -> Self {
        let mut store = Self::new(history_capacity);
        store.pending = pending.into();
        store.current = current;
        store.history = history.into();
        store.trim_history();
        store
    }

    pub fn current(&self) -> Option<&QueueItem> {
        self.current.as_ref()
    }

    pub fn pending(&self) -> &VecDeque<QueueItem> {
        &self.pending
    }

    pub fn history(&self) -> &VecDeque<QueueItem> {
        &self.history
    }

    pub fn history_capacity(&self) -> usize {
        self.history_capacity
    }

    pub fn is_idle(&self) -> bool {
        self.current.is_none()
    }

    /// Append to the pending tail, promoting immediately when idle
    ///
    /// Promotion takes the pending head, so FIFO order is kept even if the
    /// sequence was non-empty while idle.
    pub fn enqueue(&mut self, item: QueueItem) -> Placement {
        self.pending.push_back(item);
        if self.current.is_none() {
            self.current = self.pending.pop_front();
            if self.pending.is_empty() {
                return Placement::Current;
            }
        }
        Placement::Pending(self.pending.len())
    }

    /// Retire the current item to history and promote the pending head
    pub fn advance(&mut self) -> Option<&QueueItem> {
        if let Some(previous) = self.current.take() {
            self.push_history(previous);
        }
        self.current = self.pending.pop_front();
        self.current.as_ref()
    }

    /// Restore the most recent history item
    ///
    /// The displaced current item goes back to the pending head.
    pub fn rewind(&mut self) -> QueueResult<&QueueItem> {
        let restored = self.history.pop_front().ok_or(QueueError::NoHistory)?;
        if let Some(displaced) = self.current.take() {
            self.pending.push_front(displaced);
        }
        Ok(&*self.current.insert(restored))
    }

    /// Host bypass: play `item` now without consuming the pending sequence
    pub fn select_direct(&mut self, item: QueueItem) -> &QueueItem {
        if let Some(previous) = self.current.take() {
            self.push_history(previous);
        }
        self.current.insert(item)
    }

    /// Promote the pending head when idle; returns the new current if any
    pub fn promote_if_idle(&mut self) -> Option<&QueueItem> {
        if self.current.is_none() {
            self.current = self.pending.pop_front();
            return self.current.as_ref();
        }
        None
    }

    /// Remove the first pending item with `item_ref`
    pub fn remove_first(&mut self, item_ref: &str) -> Option<QueueItem> {
        let index = self.pending.iter().position(|i| i.item_ref == item_ref)?;
        self.pending.remove(index)
    }

    /// Empty the pending sequence; returns how many items were dropped
    pub fn clear_pending(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    /// Change the history bound, trimming immediately
    pub fn set_history_capacity(&mut self, capacity: usize) {
        self.history_capacity = capacity.max(1);
        self.trim_history();
    }

    fn push_history(&mut self, item: QueueItem) {
        self.history.push_front(item);
        self.trim_history();
    }

    fn trim_history(&mut self) {
        self.history.truncate(self.history_capacity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(item_ref: &str) -> QueueItem {
        QueueItem::new(item_ref, format!("Title {}", item_ref), "10.0.0.1", "Ann", Utc::now())
    }

    fn pending_refs(store: &QueueStore) -> Vec<&str> {
        store.pending().iter().map(|i| i.item_ref.as_str()).collect()
    }

    fn history_refs(store: &QueueStore) -> Vec<&str> {
        store.history().iter().map(|i| i.item_ref.as_str()).collect()
    }

    #[test]
    fn test_enqueue_when_idle_promotes_without_duplicate() {
        let mut store = QueueStore::new(20);
        assert_eq!(store.enqueue(item("abc")), Placement::Current);
        assert_eq!(store.current().unwrap().item_ref, "abc");
        assert!(store.pending().is_empty());
    }

    #[test]
    fn test_enqueue_fifo_order() {
        let mut store = QueueStore::new(20);
        store.enqueue(item("a"));
        assert_eq!(store.enqueue(item("b")), Placement::Pending(1));
        assert_eq!(store.enqueue(item("c")), Placement::Pending(2));
        assert_eq!(store.enqueue(item("d")), Placement::Pending(3));

        assert_eq!(store.current().unwrap().item_ref, "a");
        assert_eq!(pending_refs(&store), vec!["b", "c", "d"]);
    }

    #[test]
    fn test_enqueue_while_idle_with_leftover_pending_keeps_fifo() {
        let mut store = QueueStore::from_parts(vec![item("x")], None, vec![], 20);
        assert_eq!(store.enqueue(item("y")), Placement::Pending(1));
        assert_eq!(store.current().unwrap().item_ref, "x");
        assert_eq!(pending_refs(&store), vec!["y"]);
    }

    #[test]
    fn test_advance_moves_current_to_history() {
        let mut store = QueueStore::new(20);
        store.enqueue(item("abc"));
        store.enqueue(item("def"));

        assert_eq!(store.advance().unwrap().item_ref, "def");
        assert_eq!(history_refs(&store), vec!["abc"]);
        assert!(store.pending().is_empty());

        assert!(store.advance().is_none());
        assert!(store.is_idle());
        assert_eq!(history_refs(&store), vec!["def", "abc"]);
    }

    #[test]
    fn test_advance_on_empty_store_is_noop() {
        let mut store = QueueStore::new(20);
        assert!(store.advance().is_none());
        assert!(store.history().is_empty());
    }

    #[test]
    fn test_advance_then_rewind_restores() {
        let mut store = QueueStore::new(20);
        store.enqueue(item("a"));
        store.enqueue(item("b"));
        store.enqueue(item("c"));
        let before_current = store.current().unwrap().entry_id;

        store.advance();
        let restored = store.rewind().unwrap().entry_id;

        assert_eq!(restored, before_current);
        assert_eq!(pending_refs(&store), vec!["b", "c"]);
        assert!(store.history().is_empty());
    }

    #[test]
    fn test_rewind_empty_history_leaves_state() {
        let mut store = QueueStore::new(20);
        store.enqueue(item("a"));
        store.enqueue(item("b"));

        assert_eq!(store.rewind().unwrap_err(), QueueError::NoHistory);
        assert_eq!(store.current().unwrap().item_ref, "a");
        assert_eq!(pending_refs(&store), vec!["b"]);
    }

    #[test]
    fn test_rewind_when_idle() {
        let mut store = QueueStore::new(20);
        store.enqueue(item("a"));
        store.advance();
        assert!(store.is_idle());

        assert_eq!(store.rewind().unwrap().item_ref, "a");
        assert!(store.pending().is_empty());
    }

    #[test]
    fn test_history_capacity_drops_oldest() {
        let mut store = QueueStore::new(3);
        for r in ["a", "b", "c", "d", "e"] {
            store.enqueue(item(r));
        }
        for _ in 0..4 {
            store.advance();
        }

        assert_eq!(store.current().unwrap().item_ref, "e");
        assert_eq!(history_refs(&store), vec!["d", "c", "b"]);
    }

    #[test]
    fn test_select_direct_keeps_pending() {
        let mut store = QueueStore::new(20);
        store.enqueue(item("a"));
        store.enqueue(item("b"));

        assert_eq!(store.select_direct(item("zzz")).item_ref, "zzz");
        assert_eq!(pending_refs(&store), vec!["b"]);
        assert_eq!(history_refs(&store), vec!["a"]);
    }

    #[test]
    fn test_remove_first_only() {
        let mut store = QueueStore::new(20);
        store.enqueue(item("cur"));
        let first = item("dup");
        let first_id = first.entry_id;
        store.enqueue(first);
        store.enqueue(item("other"));
        store.enqueue(item("dup"));

        let removed = store.remove_first("dup").unwrap();
        assert_eq!(removed.entry_id, first_id);
        assert_eq!(pending_refs(&store), vec!["other", "dup"]);
        assert!(store.remove_first("missing").is_none());
    }

    #[test]
    fn test_remove_does_not_touch_current() {
        let mut store = QueueStore::new(20);
        store.enqueue(item("cur"));
        assert!(store.remove_first("cur").is_none());
        assert_eq!(store.current().unwrap().item_ref, "cur");
    }

    #[test]
    fn test_clear_pending() {
        let mut store = QueueStore::new(20);
        store.enqueue(item("a"));
        store.enqueue(item("b"));
        store.enqueue(item("c"));
        store.advance();

        assert_eq!(store.clear_pending(), 1);
        assert_eq!(store.current().unwrap().item_ref, "b");
        assert_eq!(history_refs(&store), vec!["a"]);
    }

    #[test]
    fn test_promote_if_idle() {
        let mut store = QueueStore::from_parts(vec![item("a"), item("b")], None, vec![], 20);
        assert_eq!(store.promote_if_idle().unwrap().item_ref, "a");
        assert!(store.promote_if_idle().is_none());
        assert_eq!(pending_refs(&store), vec!["b"]);
    }

    #[test]
    fn test_shrinking_capacity_trims_history() {
        let history = vec![item("h1"), item("h2"), item("h3")];
        let mut store = QueueStore::from_parts(vec![], None, history, 20);
        store.set_history_capacity(1);
        assert_eq!(history_refs(&store), vec!["h1"]);
    }
}
