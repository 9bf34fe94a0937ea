//! Search projections over loaded records.
//!
//! # Responsibility
//! - Keep list filtering pure so it can rerun on every keystroke.

pub mod friend_filter;
