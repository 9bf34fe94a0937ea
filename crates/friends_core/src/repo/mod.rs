//! Persistence collaborator contracts and the SQLite implementation.
//!
//! # Responsibility
//! - Define fetch/save/delete access by entity type.
//! - Keep SQL details out of the relationship store.
//!
//! # Invariants
//! - Multi-row writes (event + association, friend delete + detach) run
//!   inside one transaction.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod relationship_repo;
mod schema;
