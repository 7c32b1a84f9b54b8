//! Graph store adapter boundary.
//!
//! The engines in this crate are generic over these traits; a production
//! adapter translates them to its engine's query language, while
//! [`memory::MemoryGraph`] backs the test suite. Reads outside a transaction
//! see committed state only. A transaction that is dropped without
//! [`GraphTxn::commit`] rolls back; there is no explicit abort call, so
//! every error path and cancellation gets rollback for free.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Edge, EdgeKind, EdgeMergeKey, Node, NodeKey, NodeKind, Record, User};

pub mod memory;

/// Read primitives shared by stores and open transactions.
#[async_trait]
pub trait GraphReader: Send + Sync {
    /// Fetch one node by natural key.
    async fn node(&self, key: &NodeKey) -> Result<Option<Node>>;

    /// All edges of `kind` leaving `from`.
    async fn outgoing(&self, from: &NodeKey, kind: EdgeKind) -> Result<Vec<Edge>>;

    /// All edges of `kind` arriving at `to`.
    async fn incoming(&self, to: &NodeKey, kind: EdgeKind) -> Result<Vec<Edge>>;

    /// All nodes of one kind within an organization.
    async fn nodes_in_org(&self, kind: NodeKind, org_id: &str) -> Result<Vec<Node>>;

    /// Look a user up by internal id, external id, or email.
    async fn lookup_user(&self, org_id: &str, key: &str) -> Result<Option<User>>;

    /// Look a record up by its connector revision id.
    async fn lookup_record_by_revision(
        &self,
        org_id: &str,
        revision_id: &str,
    ) -> Result<Option<Record>>;
}

/// An open transaction. Reads observe staged writes; nothing is visible to
/// other readers until [`commit`](GraphTxn::commit).
#[async_trait]
pub trait GraphTxn: GraphReader {
    /// Idempotent node upsert keyed on `(kind, id)`; attributes are
    /// overwritten wholesale.
    async fn upsert_node(&mut self, node: Node) -> Result<()>;

    /// Idempotent edge upsert keyed on [`Edge::merge_key`].
    async fn upsert_edge(&mut self, edge: Edge) -> Result<()>;

    /// Delete every edge of `kind` touching `key` in either direction.
    /// Returns the number removed.
    async fn delete_edges_touching(&mut self, key: &NodeKey, kind: EdgeKind) -> Result<u64>;

    /// Delete a single edge by merge key. Returns whether it existed.
    async fn delete_edge(&mut self, key: &EdgeMergeKey) -> Result<bool>;

    /// Delete a node. Returns whether it existed. Edges are not cascaded;
    /// callers purge them first.
    async fn delete_node(&mut self, key: &NodeKey) -> Result<bool>;

    /// Publish all staged writes atomically.
    async fn commit(self) -> Result<()>;
}

/// A handle capable of opening transactions.
#[async_trait]
pub trait GraphStore: GraphReader {
    type Txn: GraphTxn + Send;

    async fn begin(&self) -> Result<Self::Txn>;
}
