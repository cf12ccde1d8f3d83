//! Status change detection.
//!
//! The decision is a pure function of the fetched status and the last one
//! seen; `NotificationState` is the owned record of the latter.

use crate::status::StatusSnapshot;

/// Outcome of comparing a fetched status against the last one seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub should_notify: bool,
    pub new_last: StatusSnapshot,
}

/// Notify iff `current` differs from `last` (or nothing was seen yet).
/// The returned `new_last` is always `current`.
pub fn check(current: StatusSnapshot, last: Option<&StatusSnapshot>) -> Decision {
    let should_notify = last != Some(&current);
    Decision {
        should_notify,
        new_last: current,
    }
}

/// Last status observed by the polling loop. Lives for the process only.
#[derive(Debug, Default)]
pub struct NotificationState {
    last: Option<StatusSnapshot>,
}

impl NotificationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&StatusSnapshot> {
        self.last.as_ref()
    }

    /// Record `current` and report whether it is a change worth notifying.
    pub fn observe(&mut self, current: StatusSnapshot) -> bool {
        let decision = check(current, self.last.as_ref());
        self.last = Some(decision.new_last);
        decision.should_notify
    }
}
