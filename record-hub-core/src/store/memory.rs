//! In-memory reference adapter.
//!
//! Transactions stage writes against a copy of the whole graph and publish
//! it on commit; dropping an uncommitted transaction discards the copy.
//! Linear scans are fine at the sizes the test suite and local tooling use.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::Result;
use crate::model::{Edge, EdgeKind, EdgeMergeKey, Node, NodeKey, NodeKind, Record, User};
use crate::store::{GraphReader, GraphStore, GraphTxn};

#[derive(Clone, Default)]
struct GraphState {
    nodes: HashMap<NodeKey, Node>,
    edges: HashMap<EdgeMergeKey, Edge>,
}

impl GraphState {
    fn node(&self, key: &NodeKey) -> Option<Node> {
        self.nodes.get(key).cloned()
    }

    fn outgoing(&self, from: &NodeKey, kind: EdgeKind) -> Vec<Edge> {
        self.edges
            .values()
            .filter(|e| e.kind() == kind && &e.from == from)
            .cloned()
            .collect()
    }

    fn incoming(&self, to: &NodeKey, kind: EdgeKind) -> Vec<Edge> {
        self.edges
            .values()
            .filter(|e| e.kind() == kind && &e.to == to)
            .cloned()
            .collect()
    }

    fn nodes_in_org(&self, kind: NodeKind, org_id: &str) -> Vec<Node> {
        self.nodes
            .values()
            .filter(|n| n.kind() == kind && n.org_id() == Some(org_id))
            .cloned()
            .collect()
    }

    fn lookup_user(&self, org_id: &str, key: &str) -> Option<User> {
        self.nodes.values().find_map(|n| match n {
            Node::User(u)
                if u.org_id == org_id
                    && (u.id == key || u.external_id == key || u.email == key) =>
            {
                Some(u.clone())
            }
            _ => None,
        })
    }

    fn lookup_record_by_revision(&self, org_id: &str, revision_id: &str) -> Option<Record> {
        self.nodes.values().find_map(|n| match n {
            Node::Record(r)
                if r.org_id == org_id
                    && r.external_revision_id.as_deref() == Some(revision_id) =>
            {
                Some(r.clone())
            }
            _ => None,
        })
    }
}

/// Shared in-memory graph.
#[derive(Clone, Default)]
pub struct MemoryGraph {
    state: Arc<RwLock<GraphState>>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Node count, committed state. Test helper.
    pub fn node_count(&self) -> usize {
        self.state.read().nodes.len()
    }

    /// Edge count, committed state. Test helper.
    pub fn edge_count(&self) -> usize {
        self.state.read().edges.len()
    }
}

#[async_trait]
impl GraphReader for MemoryGraph {
    async fn node(&self, key: &NodeKey) -> Result<Option<Node>> {
        Ok(self.state.read().node(key))
    }

    async fn outgoing(&self, from: &NodeKey, kind: EdgeKind) -> Result<Vec<Edge>> {
        Ok(self.state.read().outgoing(from, kind))
    }

    async fn incoming(&self, to: &NodeKey, kind: EdgeKind) -> Result<Vec<Edge>> {
        Ok(self.state.read().incoming(to, kind))
    }

    async fn nodes_in_org(&self, kind: NodeKind, org_id: &str) -> Result<Vec<Node>> {
        Ok(self.state.read().nodes_in_org(kind, org_id))
    }

    async fn lookup_user(&self, org_id: &str, key: &str) -> Result<Option<User>> {
        Ok(self.state.read().lookup_user(org_id, key))
    }

    async fn lookup_record_by_revision(
        &self,
        org_id: &str,
        revision_id: &str,
    ) -> Result<Option<Record>> {
        Ok(self.state.read().lookup_record_by_revision(org_id, revision_id))
    }
}

#[async_trait]
impl GraphStore for MemoryGraph {
    type Txn = MemoryTxn;

    async fn begin(&self) -> Result<MemoryTxn> {
        let staged = self.state.read().clone();
        Ok(MemoryTxn {
            shared: Arc::clone(&self.state),
            staged,
        })
    }
}

/// Snapshot transaction over a [`MemoryGraph`]. Dropping it without commit
/// leaves the shared state untouched.
pub struct MemoryTxn {
    shared: Arc<RwLock<GraphState>>,
    staged: GraphState,
}

#[async_trait]
impl GraphReader for MemoryTxn {
    async fn node(&self, key: &NodeKey) -> Result<Option<Node>> {
        Ok(self.staged.node(key))
    }

    async fn outgoing(&self, from: &NodeKey, kind: EdgeKind) -> Result<Vec<Edge>> {
        Ok(self.staged.outgoing(from, kind))
    }

    async fn incoming(&self, to: &NodeKey, kind: EdgeKind) -> Result<Vec<Edge>> {
        Ok(self.staged.incoming(to, kind))
    }

    async fn nodes_in_org(&self, kind: NodeKind, org_id: &str) -> Result<Vec<Node>> {
        Ok(self.staged.nodes_in_org(kind, org_id))
    }

    async fn lookup_user(&self, org_id: &str, key: &str) -> Result<Option<User>> {
        Ok(self.staged.lookup_user(org_id, key))
    }

    async fn lookup_record_by_revision(
        &self,
        org_id: &str,
        revision_id: &str,
    ) -> Result<Option<Record>> {
        Ok(self.staged.lookup_record_by_revision(org_id, revision_id))
    }
}

#[async_trait]
impl GraphTxn for MemoryTxn {
    async fn upsert_node(&mut self, node: Node) -> Result<()> {
        self.staged.nodes.insert(node.key(), node);
        Ok(())
    }

    async fn upsert_edge(&mut self, edge: Edge) -> Result<()> {
        self.staged.edges.insert(edge.merge_key(), edge);
        Ok(())
    }

    async fn delete_edges_touching(&mut self, key: &NodeKey, kind: EdgeKind) -> Result<u64> {
        let before = self.staged.edges.len();
        self.staged
            .edges
            .retain(|k, e| !(e.kind() == kind && (&k.from == key || &k.to == key)));
        Ok((before - self.staged.edges.len()) as u64)
    }

    async fn delete_edge(&mut self, key: &EdgeMergeKey) -> Result<bool> {
        Ok(self.staged.edges.remove(key).is_some())
    }

    async fn delete_node(&mut self, key: &NodeKey) -> Result<bool> {
        Ok(self.staged.nodes.remove(key).is_some())
    }

    async fn commit(self) -> Result<()> {
        *self.shared.write() = self.staged;
        Ok(())
    }
}
