//! Transient multi-select state for list screens.
//!
//! Selection is never persisted; callers clear it whenever the backing list
//! is reloaded.

pub mod list_selection;
