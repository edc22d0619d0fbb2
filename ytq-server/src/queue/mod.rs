//! Queue domain
//!
//! Pure, clock-injected components:
//! - `IdentityCooldown`: per-identity names with a re-registration cooldown
//! - `SubmissionThrottle`: per-identity submission interval
//! - `QueueStore`: pending sequence, current slot, bounded history
//! - `PlaybackController`: Idle/Playing transitions and progress reports
//! - `ConfigRegistry`: runtime policy
//!
//! `QueueDomain` owns all five and is the only type the service mutates.

pub mod controller;
pub mod domain;
pub mod error;
pub mod identity;
pub mod item;
pub mod policy;
pub mod snapshot;
pub mod store;
pub mod throttle;

pub use controller::{PlaybackController, PlaybackProgress, PlaybackStatus, ProgressOutcome, ProgressReport};
pub use domain::{Admission, QueueDomain};
pub use error::{QueueError, QueueResult};
pub use identity::{validate_name, IdentityCooldown, IdentityRecord};
pub use item::{fallback_title, parse_item_ref, QueueItem};
pub use policy::{ConfigRegistry, Policy, PolicyUpdate};
pub use snapshot::{QueueState, StateSnapshot};
pub use store::{Placement, QueueStore};
pub use throttle::{SubmissionThrottle, ThrottleRecord};
