//! Per-identity display names with a re-registration cooldown
//!
//! A registered name is "active" for exactly one cooldown period after the
//! most recent change; after that it lapses and must be asserted again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ytq_common::time::{latest, remaining_seconds};

use super::error::{QueueError, QueueResult};

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 32;

/// Name registration state for one identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub identity: String,
    pub name: String,
    pub last_name_change_at: DateTime<Utc>,
}

/// Name to use for a submission, decided before any state is committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePlan {
    pub name: String,
    /// True when `name` is a new registration to commit
    pub register: bool,
}

/// Validate and normalize a proposed name
///
/// Pure. Allows letters, digits, inner spaces and any non-ASCII character;
/// rejects ASCII punctuation and control characters.
pub fn validate_name(proposed: &str) -> QueueResult<String> {
    let name = proposed.trim();
    let len = name.chars().count();

    if len < NAME_MIN_CHARS {
        return Err(QueueError::InvalidName(format!(
            "must be at least {} characters",
            NAME_MIN_CHARS
        )));
    }
    if len > NAME_MAX_CHARS {
        return Err(QueueError::InvalidName(format!(
            "must be at most {} characters",
            NAME_MAX_CHARS
        )));
    }

    if let Some(bad) = name
        .chars()
        .find(|c| c.is_ascii() && !(c.is_ascii_alphanumeric() || *c == ' '))
    {
        return Err(QueueError::InvalidName(format!(
            "character {:?} is not allowed",
            bad
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(QueueError::InvalidName("control characters are not allowed".to_string()));
    }

    Ok(name.to_string())
}

/// Registry of identity records
#[derive(Debug, Clone, Default)]
pub struct IdentityCooldown {
    records: HashMap<String, IdentityRecord>,
}

impl IdentityCooldown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted records
    pub fn from_records(records: impl IntoIterator<Item = IdentityRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|r| (r.identity.clone(), r))
                .collect(),
        }
    }

    pub fn records(&self) -> impl Iterator<Item = &IdentityRecord> {
        self.records.values()
    }

    pub fn record(&self, identity: &str) -> Option<&IdentityRecord> {
        self.records.get(identity)
    }

    /// Register a new name, subject to the cooldown
    ///
    /// Returns the normalized name on acceptance.
    pub fn register_name(
        &mut self,
        identity: &str,
        proposed: &str,
        cooldown_secs: u64,
        now: DateTime<Utc>,
    ) -> QueueResult<String> {
        let name = validate_name(proposed)?;
        self.check_cooldown(identity, cooldown_secs, now)?;
        self.commit(identity, &name, now);
        Ok(name)
    }

    /// Name still inside its validity window, if any
    pub fn current_valid_name(
        &self,
        identity: &str,
        cooldown_secs: u64,
        now: DateTime<Utc>,
    ) -> Option<&str> {
        self.records
            .get(identity)
            .filter(|r| remaining_seconds(r.last_name_change_at, now, cooldown_secs) > 0)
            .map(|r| r.name.as_str())
    }

    /// Decide which name a submission will carry without mutating anything
    ///
    /// A differing proposal is registered when the cooldown allows it; when
    /// the cooldown blocks it the still-active name is used instead.
    pub fn plan_submission_name(
        &self,
        identity: &str,
        proposed: Option<&str>,
        cooldown_secs: u64,
        now: DateTime<Utc>,
    ) -> QueueResult<NamePlan> {
        let active = self.current_valid_name(identity, cooldown_secs, now);

        let proposed = match proposed.map(str::trim).filter(|p| !p.is_empty()) {
            Some(p) => validate_name(p)?,
            None => {
                return active
                    .map(|name| NamePlan {
                        name: name.to_string(),
                        register: false,
                    })
                    .ok_or(QueueError::NameRequired);
            }
        };

        if active == Some(proposed.as_str()) {
            return Ok(NamePlan {
                name: proposed,
                register: false,
            });
        }

        match (self.check_cooldown(identity, cooldown_secs, now), active) {
            (Ok(()), _) => Ok(NamePlan {
                name: proposed,
                register: true,
            }),
            (Err(_), Some(active)) => Ok(NamePlan {
                name: active.to_string(),
                register: false,
            }),
            (Err(e), None) => Err(e),
        }
    }

    /// Commit a plan produced by `plan_submission_name`
    pub fn apply_plan(&mut self, identity: &str, plan: &NamePlan, now: DateTime<Utc>) {
        if plan.register {
            self.commit(identity, &plan.name, now);
        }
    }

    fn check_cooldown(&self, identity: &str, cooldown_secs: u64, now: DateTime<Utc>) -> QueueResult<()> {
        match self.records.get(identity) {
            Some(record) => {
                let remaining = remaining_seconds(record.last_name_change_at, now, cooldown_secs);
                if remaining > 0 {
                    Err(QueueError::CooldownActive {
                        remaining_seconds: remaining,
                        current_name: record.name.clone(),
                    })
                } else {
                    Ok(())
                }
            }
            None => Ok(()),
        }
    }

    fn commit(&mut self, identity: &str, name: &str, now: DateTime<Utc>) {
        let record = self
            .records
            .entry(identity.to_string())
            .or_insert_with(|| IdentityRecord {
                identity: identity.to_string(),
                name: String::new(),
                last_name_change_at: now,
            });
        record.name = name.to_string();
        record.last_name_change_at = latest(record.last_name_change_at, now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const COOLDOWN: u64 = 3600;

    #[test]
    fn test_validate_name_accepts() {
        assert_eq!(validate_name("  Ann  ").unwrap(), "Ann");
        assert_eq!(validate_name("DJ Kim 2").unwrap(), "DJ Kim 2");
        assert_eq!(validate_name("민준").unwrap(), "민준");
        assert_eq!(validate_name("Zoë ★").unwrap(), "Zoë ★");
    }

    #[test]
    fn test_validate_name_rejects() {
        for bad in ["", " ", "A", "Ann!", "a_b", "x-y", "<script>", "semi;colon"] {
            assert!(
                matches!(validate_name(bad), Err(QueueError::InvalidName(_))),
                "should reject {:?}",
                bad
            );
        }
        let long = "a".repeat(NAME_MAX_CHARS + 1);
        assert!(validate_name(&long).is_err());
        assert!(validate_name(&"a".repeat(NAME_MAX_CHARS)).is_ok());
    }

    #[test]
    fn test_first_registration_accepted() {
        let mut ids = IdentityCooldown::new();
        let now = Utc::now();
        assert_eq!(ids.register_name("1.2.3.4", "Ann", COOLDOWN, now).unwrap(), "Ann");
        assert_eq!(ids.current_valid_name("1.2.3.4", COOLDOWN, now), Some("Ann"));
    }

    #[test]
    fn test_second_registration_rejected_with_remaining() {
        let mut ids = IdentityCooldown::new();
        let now = Utc::now();
        ids.register_name("1.2.3.4", "Ann", COOLDOWN, now).unwrap();

        let err = ids
            .register_name("1.2.3.4", "Bob", COOLDOWN, now + Duration::milliseconds(200))
            .unwrap_err();

        assert_eq!(
            err,
            QueueError::CooldownActive {
                remaining_seconds: COOLDOWN,
                current_name: "Ann".to_string(),
            }
        );
        assert_eq!(ids.record("1.2.3.4").unwrap().name, "Ann");
    }

    #[test]
    fn test_invalid_name_does_not_touch_cooldown() {
        let mut ids = IdentityCooldown::new();
        let now = Utc::now();
        assert!(ids.register_name("a", "!!", COOLDOWN, now).is_err());
        assert!(ids.record("a").is_none());
    }

    #[test]
    fn test_registration_allowed_after_cooldown() {
        let mut ids = IdentityCooldown::new();
        let t0 = Utc::now();
        ids.register_name("a", "Ann", COOLDOWN, t0).unwrap();

        let later = t0 + Duration::seconds(COOLDOWN as i64);
        assert_eq!(ids.register_name("a", "Bob", COOLDOWN, later).unwrap(), "Bob");
        assert_eq!(ids.record("a").unwrap().last_name_change_at, later);
    }

    #[test]
    fn test_name_lapses_after_cooldown() {
        let mut ids = IdentityCooldown::new();
        let t0 = Utc::now();
        ids.register_name("a", "Ann", COOLDOWN, t0).unwrap();

        let just_before = t0 + Duration::seconds(COOLDOWN as i64 - 1);
        let at_expiry = t0 + Duration::seconds(COOLDOWN as i64);
        assert_eq!(ids.current_valid_name("a", COOLDOWN, just_before), Some("Ann"));
        assert_eq!(ids.current_valid_name("a", COOLDOWN, at_expiry), None);
    }

    #[test]
    fn test_change_timestamp_never_decreases() {
        let mut ids = IdentityCooldown::new();
        let t0 = Utc::now();
        ids.register_name("a", "Ann", 0, t0).unwrap();
        ids.register_name("a", "Bob", 0, t0 - Duration::seconds(30)).unwrap();
        assert_eq!(ids.record("a").unwrap().last_name_change_at, t0);
    }

    #[test]
    fn test_plan_requires_name() {
        let ids = IdentityCooldown::new();
        let err = ids.plan_submission_name("a", None, COOLDOWN, Utc::now()).unwrap_err();
        assert_eq!(err, QueueError::NameRequired);

        let err = ids.plan_submission_name("a", Some("   "), COOLDOWN, Utc::now()).unwrap_err();
        assert_eq!(err, QueueError::NameRequired);
    }

    #[test]
    fn test_plan_uses_active_name_when_blocked() {
        let mut ids = IdentityCooldown::new();
        let now = Utc::now();
        ids.register_name("a", "Ann", COOLDOWN, now).unwrap();

        let plan = ids
            .plan_submission_name("a", Some("Bob"), COOLDOWN, now + Duration::seconds(5))
            .unwrap();
        assert_eq!(
            plan,
            NamePlan {
                name: "Ann".to_string(),
                register: false
            }
        );
    }

    #[test]
    fn test_plan_same_name_is_not_a_change() {
        let mut ids = IdentityCooldown::new();
        let now = Utc::now();
        ids.register_name("a", "Ann", COOLDOWN, now).unwrap();

        let plan = ids.plan_submission_name("a", Some(" Ann "), COOLDOWN, now).unwrap();
        assert!(!plan.register);
        assert_eq!(plan.name, "Ann");
    }

    #[test]
    fn test_plan_then_apply_registers() {
        let mut ids = IdentityCooldown::new();
        let now = Utc::now();

        let plan = ids.plan_submission_name("a", Some("Ann"), COOLDOWN, now).unwrap();
        assert!(plan.register);
        assert!(ids.record("a").is_none(), "planning must not mutate");

        ids.apply_plan("a", &plan, now);
        assert_eq!(ids.current_valid_name("a", COOLDOWN, now), Some("Ann"));
    }

    #[test]
    fn test_plan_rejects_invalid_proposal() {
        let ids = IdentityCooldown::new();
        let err = ids
            .plan_submission_name("a", Some("bad!name"), COOLDOWN, Utc::now())
            .unwrap_err();
        assert!(matches!(err, QueueError::InvalidName(_)));
    }
}
