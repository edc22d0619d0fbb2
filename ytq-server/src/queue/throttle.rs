//! Per-identity submission throttle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ytq_common::time::{latest, remaining_seconds};

use super::error::{QueueError, QueueResult};

/// Last accepted submission for one identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleRecord {
    pub identity: String,
    pub last_submit_at: DateTime<Utc>,
}

/// Minimum-interval gate on accepted submissions
///
/// Check and stamp happen in one call on `&mut self`; callers serialize
/// access through the domain lock.
#[derive(Debug, Clone, Default)]
pub struct SubmissionThrottle {
    records: HashMap<String, DateTime<Utc>>,
}

impl SubmissionThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = ThrottleRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|r| (r.identity, r.last_submit_at))
                .collect(),
        }
    }

    pub fn records(&self) -> impl Iterator<Item = ThrottleRecord> + '_ {
        self.records.iter().map(|(identity, at)| ThrottleRecord {
            identity: identity.clone(),
            last_submit_at: *at,
        })
    }

    /// Reject while the identity is inside its throttle window
    pub fn check(&self, identity: &str, throttle_secs: u64, now: DateTime<Utc>) -> QueueResult<()> {
        match self.records.get(identity) {
            Some(last) => match remaining_seconds(*last, now, throttle_secs) {
                0 => Ok(()),
                remaining => Err(QueueError::ThrottleActive {
                    remaining_seconds: remaining,
                }),
            },
            None => Ok(()),
        }
    }

    /// Check and, on acceptance, stamp `now` as the last submission
    pub fn check_and_stamp(
        &mut self,
        identity: &str,
        throttle_secs: u64,
        now: DateTime<Utc>,
    ) -> QueueResult<()> {
        self.check(identity, throttle_secs, now)?;
        let stamp = self
            .records
            .get(identity)
            .map_or(now, |last| latest(*last, now));
        self.records.insert(identity.to_string(), stamp);
        Ok(())
    }
}
