//! Flutter-facing bindings for the friends & events store.
//!
//! Everything callable from Dart lives in [`api`].

pub mod api;
