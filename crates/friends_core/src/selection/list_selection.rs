//! Row selection tracking with edit/delete gating.
//!
//! # Invariants
//! - A row id appears at most once; order is the order rows were marked.
//! - `SelectionMode::Single` never holds more than one row.
//! - Edit needs exactly one selected row, delete needs at least one.

use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// How a list reacts when another row is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// Rows accumulate (friends list, event attendee picker).
    #[default]
    Multiple,
    /// Selecting a row replaces the previous one (events list).
    Single,
}

/// Coarse selection state driving action-button enablement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Empty,
    NonEmpty,
}

/// Action rejected because the selection does not allow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionError {
    NothingSelected,
    EditRequiresSingle { selected: usize },
}

impl Display for SelectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NothingSelected => write!(f, "no rows selected"),
            Self::EditRequiresSingle { selected } => {
                write!(f, "edit requires exactly one selected row, got {selected}")
            }
        }
    }
}

impl Error for SelectionError {}

/// Selected row ids of one list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSelection<Id> {
    mode: SelectionMode,
    selected: Vec<Id>,
}

impl<Id: Copy + Eq> Default for ListSelection<Id> {
    fn default() -> Self {
        Self::new(SelectionMode::default())
    }
}

impl<Id: Copy + Eq> ListSelection<Id> {
    pub fn new(mode: SelectionMode) -> Self {
        Self {
            mode,
            selected: Vec::new(),
        }
    }

    /// Starts with `ids` already marked, e.g. an event's current attendees
    /// in the edit form. In single mode only the last id is kept.
    pub fn with_selected(mode: SelectionMode, ids: impl IntoIterator<Item = Id>) -> Self {
        let mut selection = Self::new(mode);
        for id in ids {
            selection.select(id);
        }
        selection
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Marks `id`. Returns `false` when it was already the selection.
    pub fn select(&mut self, id: Id) -> bool {
        if self.is_selected(&id) {
            return false;
        }
        if self.mode == SelectionMode::Single {
            self.selected.clear();
        }
        self.selected.push(id);
        true
    }

    /// Unmarks `id`. Returns `false` when it was not selected.
    pub fn deselect(&mut self, id: Id) -> bool {
        match self.selected.iter().position(|current| *current == id) {
            Some(index) => {
                self.selected.remove(index);
                true
            }
            None => false,
        }
    }

    /// Flips membership of `id` and returns whether it is now selected.
    pub fn toggle(&mut self, id: Id) -> bool {
        if self.deselect(id) {
            false
        } else {
            self.select(id)
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn selected(&self) -> &[Id] {
        &self.selected
    }

    pub fn is_selected(&self, id: &Id) -> bool {
        self.selected.contains(id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn state(&self) -> SelectionState {
        if self.selected.is_empty() {
            SelectionState::Empty
        } else {
            SelectionState::NonEmpty
        }
    }

    pub fn can_edit(&self) -> bool {
        self.selected.len() == 1
    }

    pub fn can_delete(&self) -> bool {
        !self.selected.is_empty()
    }

    /// Returns the single row an edit action applies to.
    pub fn edit_target(&self) -> Result<Id, SelectionError> {
        match self.selected.as_slice() {
            [] => Err(SelectionError::NothingSelected),
            [only] => Ok(*only),
            many => Err(SelectionError::EditRequiresSingle {
                selected: many.len(),
            }),
        }
    }

    /// Returns the rows a delete action applies to.
    pub fn delete_targets(&self) -> Result<Vec<Id>, SelectionError> {
        if self.selected.is_empty() {
            return Err(SelectionError::NothingSelected);
        }
        Ok(self.selected.clone())
    }
}

impl<Id: Copy + Ord> ListSelection<Id> {
    pub fn selected_set(&self) -> BTreeSet<Id> {
        self.selected.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{ListSelection, SelectionError, SelectionMode, SelectionState};

    #[test]
    fn toggle_twice_returns_to_empty() {
        let mut selection = ListSelection::new(SelectionMode::Multiple);
        assert_eq!(selection.state(), SelectionState::Empty);

        assert!(selection.toggle(7));
        assert_eq!(selection.state(), SelectionState::NonEmpty);
        assert_eq!(selection.selected(), &[7]);

        assert!(!selection.toggle(7));
        assert_eq!(selection.state(), SelectionState::Empty);
        assert!(selection.selected().is_empty());
    }

    #[test]
    fn select_and_deselect_are_not_toggles() {
        let mut selection = ListSelection::new(SelectionMode::Multiple);
        assert!(selection.select(1));
        assert!(!selection.select(1));
        assert_eq!(selection.selected(), &[1]);

        assert!(selection.deselect(1));
        assert!(!selection.deselect(1));
        assert!(selection.is_empty());
    }

    #[test]
    fn deselecting_last_row_transitions_to_empty() {
        let mut selection = ListSelection::with_selected(SelectionMode::Multiple, [1, 2]);
        selection.deselect(1);
        assert_eq!(selection.state(), SelectionState::NonEmpty);
        selection.deselect(2);
        assert_eq!(selection.state(), SelectionState::Empty);
    }

    #[test]
    fn multiple_mode_keeps_selection_order_without_duplicates() {
        let mut selection = ListSelection::new(SelectionMode::Multiple);
        selection.select(3);
        selection.select(1);
        selection.select(3);
        selection.select(2);
        assert_eq!(selection.selected(), &[3, 1, 2]);
        assert_eq!(
            selection.selected_set().into_iter().collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn single_mode_replaces_previous_row() {
        let mut selection = ListSelection::new(SelectionMode::Single);
        selection.select(1);
        selection.select(2);
        assert_eq!(selection.selected(), &[2]);

        assert!(selection.toggle(3));
        assert_eq!(selection.selected(), &[3]);

        let seeded = ListSelection::with_selected(SelectionMode::Single, [4, 5, 6]);
        assert_eq!(seeded.selected(), &[6]);
    }

    #[test]
    fn clear_is_idempotent() {
        let mut selection = ListSelection::with_selected(SelectionMode::Multiple, [1, 2, 3]);
        selection.clear();
        assert!(selection.is_empty());
        selection.clear();
        assert!(selection.is_empty());
    }

    #[test]
    fn edit_requires_exactly_one_row() {
        let mut selection = ListSelection::new(SelectionMode::Multiple);
        assert!(!selection.can_edit());
        assert_eq!(selection.edit_target(), Err(SelectionError::NothingSelected));

        selection.select(10);
        assert!(selection.can_edit());
        assert_eq!(selection.edit_target(), Ok(10));

        selection.select(11);
        assert!(!selection.can_edit());
        assert_eq!(
            selection.edit_target(),
            Err(SelectionError::EditRequiresSingle { selected: 2 })
        );
    }

    #[test]
    fn delete_requires_non_empty_selection() {
        let mut selection: ListSelection<u32> = ListSelection::default();
        assert!(!selection.can_delete());
        assert_eq!(
            selection.delete_targets(),
            Err(SelectionError::NothingSelected)
        );

        selection.select(4);
        selection.select(5);
        assert!(selection.can_delete());
        assert_eq!(selection.delete_targets(), Ok(vec![4, 5]));
    }
}
