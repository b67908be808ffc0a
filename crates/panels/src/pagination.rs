#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    Start,
    Previous,
    Next,
    End,
}

impl NavAction {
    /// Reads the action from a control id such as `embed:next_page` or `review:prev_text`.
    pub fn from_control_id(id: &str) -> Option<Self> {
        let action = id.rsplit(':').next()?;
        let verb = action.split('_').next()?;
        match verb {
            "start" => Some(NavAction::Start),
            "prev" | "previous" => Some(NavAction::Previous),
            "next" => Some(NavAction::Next),
            "end" => Some(NavAction::End),
            _ => None,
        }
    }
}

/// Page index reached from `current` (1-based) by `action`.
pub fn next_page(action: NavAction, current: usize, max: usize, roll_around: bool) -> usize {
    let max = max.max(1);
    let current = current.clamp(1, max);
    match action {
        NavAction::Start => 1,
        NavAction::End => max,
        NavAction::Previous if current > 1 => current - 1,
        NavAction::Previous if roll_around => max,
        NavAction::Previous => 1,
        NavAction::Next if current < max => current + 1,
        NavAction::Next if roll_around => 1,
        NavAction::Next => max,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    current: usize,
    max: usize,
    roll_around: bool,
}

impl Pagination {
    pub fn new(start: usize, max: usize, roll_around: bool) -> Self {
        let max = max.max(1);
        Self {
            current: start.clamp(1, max),
            max,
            roll_around,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn roll_around(&self) -> bool {
        self.roll_around
    }

    pub fn is_paginated(&self) -> bool {
        self.max > 1
    }

    pub fn apply(&mut self, action: NavAction) -> usize {
        self.current = next_page(action, self.current, self.max, self.roll_around);
        self.current
    }
}

#[cfg(test)]
#[path = "tests/pagination_tests.rs"]
mod tests;
