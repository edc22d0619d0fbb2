//! Runtime queue policy (ConfigRegistry)
//!
//! Values are read by every gate check. Updates are partial and clamped to
//! sane minimums.

use serde::{Deserialize, Serialize};
use ytq_common::config::PolicyDefaults;

/// Lowest accepted submission throttle
pub const MIN_SUBMIT_THROTTLE_SECONDS: u64 = 10;

/// Lowest accepted history / pending capacity
pub const MIN_CAPACITY: usize = 1;

/// Current runtime policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub submit_throttle_seconds: u64,
    pub name_cooldown_seconds: u64,
    pub history_capacity: usize,
    pub pending_capacity: usize,
}

impl Default for Policy {
    fn default() -> Self {
        PolicyDefaults::default().into()
    }
}

impl From<PolicyDefaults> for Policy {
    fn from(defaults: PolicyDefaults) -> Self {
        let mut policy = Self {
            submit_throttle_seconds: defaults.submit_throttle_seconds,
            name_cooldown_seconds: defaults.name_cooldown_seconds,
            history_capacity: defaults.history_capacity,
            pending_capacity: defaults.pending_capacity,
        };
        policy.clamp();
        policy
    }
}

impl Policy {
    fn clamp(&mut self) {
        self.submit_throttle_seconds = self.submit_throttle_seconds.max(MIN_SUBMIT_THROTTLE_SECONDS);
        self.history_capacity = self.history_capacity.max(MIN_CAPACITY);
        self.pending_capacity = self.pending_capacity.max(MIN_CAPACITY);
    }
}

/// Partial policy update; absent fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyUpdate {
    #[serde(default)]
    pub submit_throttle_seconds: Option<u64>,
    #[serde(default)]
    pub name_cooldown_seconds: Option<u64>,
    #[serde(default)]
    pub history_capacity: Option<usize>,
    #[serde(default)]
    pub pending_capacity: Option<usize>,
}

impl PolicyUpdate {
    pub fn is_empty(&self) -> bool {
        self.submit_throttle_seconds.is_none()
            && self.name_cooldown_seconds.is_none()
            && self.history_capacity.is_none()
            && self.pending_capacity.is_none()
    }
}

/// Owner of the mutable runtime policy
#[derive(Debug, Clone, Default)]
pub struct ConfigRegistry {
    policy: Policy,
}

impl ConfigRegistry {
    pub fn new(policy: Policy) -> Self {
        let mut policy = policy;
        policy.clamp();
        Self { policy }
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Apply a partial update, clamping each field; returns the new policy
    pub fn apply(&mut self, update: &PolicyUpdate) -> Policy {
        if let Some(v) = update.submit_throttle_seconds {
            self.policy.submit_throttle_seconds = v;
        }
        if let Some(v) = update.name_cooldown_seconds {
            self.policy.name_cooldown_seconds = v;
        }
        if let Some(v) = update.history_capacity {
            self.policy.history_capacity = v;
        }
        if let Some(v) = update.pending_capacity {
            self.policy.pending_capacity = v;
        }
        self.policy.clamp();
        self.policy
    }
}
