use shared::{domain::ControlStyle, protocol::Control};

use crate::error::{PanelError, PanelResult};

pub const ROW_COUNT: u8 = 5;
pub const ROW_CAPACITY: usize = 5;

/// The controls attached to one panel message, in placement order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlGrid {
    controls: Vec<Control>,
}

impl ControlGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Places `control`, or re-enables the control already registered under the same id.
    /// Fails without touching the grid when the target row is full.
    pub fn place(&mut self, control: Control) -> PanelResult<()> {
        if let Some(existing) = self.get_mut(&control.id) {
            existing.enabled = true;
            return Ok(());
        }
        if control.row >= ROW_COUNT {
            return Err(PanelError::RowOutOfRange { row: control.row });
        }
        if self.row_len(control.row) >= ROW_CAPACITY {
            return Err(PanelError::RowFull { row: control.row });
        }
        self.controls.push(control);
        Ok(())
    }

    pub fn remove(&mut self, id: &str) {
        self.controls.retain(|control| control.id != id);
    }

    /// Removes every control matching `predicate`; returns the removed ids.
    pub fn remove_where<F>(&mut self, predicate: F) -> Vec<String>
    where
        F: Fn(&Control) -> bool,
    {
        let doomed: Vec<String> = self
            .controls
            .iter()
            .filter(|control| predicate(control))
            .map(|control| control.id.clone())
            .collect();
        for id in &doomed {
            self.remove(id);
        }
        doomed
    }

    pub fn clear(&mut self) {
        self.controls.clear();
    }

    pub fn disable_all(&mut self) {
        for control in &mut self.controls {
            control.enabled = false;
        }
    }

    pub fn restyle(&mut self, id: &str, emoji: &str, style: ControlStyle) -> bool {
        match self.get_mut(id) {
            Some(control) => {
                control.emoji = emoji.to_string();
                control.style = style;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &str) -> Option<&Control> {
        self.controls.iter().find(|control| control.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Control> {
        self.controls.iter_mut().find(|control| control.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn row_len(&self, row: u8) -> usize {
        self.controls.iter().filter(|control| control.row == row).count()
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }
}

/// Controls grouped by row in row order, skipping empty rows. Order inside a row is the
/// order of `controls`.
pub fn group_rows(controls: &[Control]) -> Vec<Vec<&Control>> {
    (0..ROW_COUNT)
        .map(|row| {
            controls
                .iter()
                .filter(|control| control.row == row)
                .collect::<Vec<_>>()
        })
        .filter(|row| !row.is_empty())
        .collect()
}

#[cfg(test)]
#[path = "tests/grid_tests.rs"]
mod tests;
