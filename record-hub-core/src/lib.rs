//! Access-control and content-hierarchy core of a multi-tenant knowledge
//! platform.
//!
//! Resources (records, record groups, connector apps) form a nested
//! containment graph; principals (users, groups, roles, teams,
//! organizations) reach them through typed grant edges. This crate computes
//! effective access roles across all grant paths and inheritance chains,
//! drives permission-filtered listing and search, and performs cascading
//! structural deletions under a collect-then-delete-then-validate
//! transaction discipline. Storage lives behind the [`store`] traits; a
//! request-handling layer consumes this crate as a library.

pub mod catalog;
pub mod error;
pub mod events;
pub mod hierarchy;
pub mod model;
pub mod mutation;
pub mod permissions;
pub mod store;

pub use error::{Error, Result};
