use shared::domain::{ControlStyle, UserId};

use crate::error::{PanelError, PanelResult};

pub const UNLOCKED_EMOJI: &str = "🔓";
pub const LOCKED_EMOJI: &str = "🔒";

/// Restricts navigation of a panel to the user who opened it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelLock {
    owner: UserId,
    locked: bool,
    perma_locked: bool,
}

impl PanelLock {
    pub fn new(owner: UserId, perma_locked: bool) -> Self {
        Self {
            owner,
            locked: false,
            perma_locked,
        }
    }

    pub fn owner(&self) -> UserId {
        self.owner
    }

    pub fn is_locked(&self) -> bool {
        self.perma_locked || self.locked
    }

    pub fn is_perma_locked(&self) -> bool {
        self.perma_locked
    }

    /// Flips the lock on behalf of `actor`; returns the new state.
    pub fn toggle(&mut self, actor: UserId) -> PanelResult<bool> {
        if actor != self.owner {
            return Err(PanelError::NotAuthor);
        }
        if self.perma_locked {
            return Err(PanelError::LockFixed);
        }
        self.locked = !self.locked;
        Ok(self.locked)
    }

    /// The owner may always navigate; others only while the panel is unlocked.
    pub fn may_navigate(&self, actor: UserId) -> bool {
        !self.is_locked() || actor == self.owner
    }

    pub fn appearance(&self) -> (&'static str, ControlStyle) {
        if self.is_locked() {
            (LOCKED_EMOJI, ControlStyle::Danger)
        } else {
            (UNLOCKED_EMOJI, ControlStyle::Success)
        }
    }
}

#[cfg(test)]
#[path = "tests/lock_tests.rs"]
mod tests;
