//! Error taxonomy shared by every engine in the crate.
//!
//! `NoAccess` is deliberately distinct from `NotFound` so callers can decide
//! whether to leak resource existence.

use thiserror::Error;

use crate::model::NodeKey;

#[derive(Debug, Error)]
pub enum Error {
    /// The principal or resource does not resolve to a node.
    #[error("{0} not found")]
    NotFound(NodeKey),

    /// The resolved role is insufficient for the requested operation.
    #[error("access denied")]
    NoAccess,

    /// A caller-supplied parameter is malformed (bad depth, bad role name,
    /// unsupported root kind).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The store reported state that contradicts the pre-computed inventory
    /// (deletion shortfall, dangling edges).
    #[error("consistency violation: {0}")]
    ConsistencyViolation(String),

    /// The storage adapter failed; the whole operation aborts and any open
    /// transaction rolls back.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

pub type Result<T> = std::result::Result<T, Error>;
