//! All-or-nothing deletion: a storage failure or a deletion shortfall in the
//! middle of a cascade must leave the committed graph byte-for-byte
//! unchanged.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use record_hub_core::catalog::EndpointCatalog;
use record_hub_core::error::{Error, Result};
use record_hub_core::hierarchy::{search, SearchRequest};
use record_hub_core::model::{
    Edge, EdgeKind, EdgeMergeKey, Node, NodeKey, NodeKind, Record, RecordType, User,
};
use record_hub_core::mutation::{
    create_folder, create_knowledge_base, delete_subtree, upload_record, NewRecord,
};
use record_hub_core::store::memory::{MemoryGraph, MemoryTxn};
use record_hub_core::store::{GraphReader, GraphStore, GraphTxn};

#[derive(Clone, Copy)]
enum FailureMode {
    /// Return a storage error once the countdown reaches zero.
    ErrorOut,
    /// Pretend the node was already gone, producing a deletion shortfall.
    Undercount,
}

/// Store wrapper that misbehaves on the Nth `delete_node` call.
#[derive(Clone)]
struct FaultyStore {
    inner: MemoryGraph,
    countdown: Arc<AtomicUsize>,
    mode: FailureMode,
}

impl FaultyStore {
    fn new(inner: MemoryGraph, healthy_deletes: usize, mode: FailureMode) -> Self {
        Self {
            inner,
            countdown: Arc::new(AtomicUsize::new(healthy_deletes)),
            mode,
        }
    }
}

#[async_trait]
impl GraphReader for FaultyStore {
    async fn node(&self, key: &NodeKey) -> Result<Option<Node>> {
        self.inner.node(key).await
    }

    async fn outgoing(&self, from: &NodeKey, kind: EdgeKind) -> Result<Vec<Edge>> {
        self.inner.outgoing(from, kind).await
    }

    async fn incoming(&self, to: &NodeKey, kind: EdgeKind) -> Result<Vec<Edge>> {
        self.inner.incoming(to, kind).await
    }

    async fn nodes_in_org(&self, kind: NodeKind, org_id: &str) -> Result<Vec<Node>> {
        self.inner.nodes_in_org(kind, org_id).await
    }

    async fn lookup_user(&self, org_id: &str, key: &str) -> Result<Option<User>> {
        self.inner.lookup_user(org_id, key).await
    }

    async fn lookup_record_by_revision(
        &self,
        org_id: &str,
        revision_id: &str,
    ) -> Result<Option<Record>> {
        self.inner.lookup_record_by_revision(org_id, revision_id).await
    }
}

#[async_trait]
impl GraphStore for FaultyStore {
    type Txn = FaultyTxn;

    async fn begin(&self) -> Result<FaultyTxn> {
        Ok(FaultyTxn {
            inner: self.inner.begin().await?,
            countdown: Arc::clone(&self.countdown),
            mode: self.mode,
        })
    }
}

struct FaultyTxn {
    inner: MemoryTxn,
    countdown: Arc<AtomicUsize>,
    mode: FailureMode,
}

#[async_trait]
impl GraphReader for FaultyTxn {
    async fn node(&self, key: &NodeKey) -> Result<Option<Node>> {
        self.inner.node(key).await
    }

    async fn outgoing(&self, from: &NodeKey, kind: EdgeKind) -> Result<Vec<Edge>> {
        self.inner.outgoing(from, kind).await
    }

    async fn incoming(&self, to: &NodeKey, kind: EdgeKind) -> Result<Vec<Edge>> {
        self.inner.incoming(to, kind).await
    }

    async fn nodes_in_org(&self, kind: NodeKind, org_id: &str) -> Result<Vec<Node>> {
        self.inner.nodes_in_org(kind, org_id).await
    }

    async fn lookup_user(&self, org_id: &str, key: &str) -> Result<Option<User>> {
        self.inner.lookup_user(org_id, key).await
    }

    async fn lookup_record_by_revision(
        &self,
        org_id: &str,
        revision_id: &str,
    ) -> Result<Option<Record>> {
        self.inner.lookup_record_by_revision(org_id, revision_id).await
    }
}

#[async_trait]
impl GraphTxn for FaultyTxn {
    async fn upsert_node(&mut self, node: Node) -> Result<()> {
        self.inner.upsert_node(node).await
    }

    async fn upsert_edge(&mut self, edge: Edge) -> Result<()> {
        self.inner.upsert_edge(edge).await
    }

    async fn delete_edges_touching(&mut self, key: &NodeKey, kind: EdgeKind) -> Result<u64> {
        self.inner.delete_edges_touching(key, kind).await
    }

    async fn delete_edge(&mut self, key: &EdgeMergeKey) -> Result<bool> {
        self.inner.delete_edge(key).await
    }

    async fn delete_node(&mut self, key: &NodeKey) -> Result<bool> {
        let left = self.countdown.load(Ordering::SeqCst);
        if left == 0 {
            return match self.mode {
                FailureMode::ErrorOut => {
                    Err(Error::StorageUnavailable("injected fault".to_string()))
                }
                FailureMode::Undercount => Ok(false),
            };
        }
        self.countdown.store(left - 1, Ordering::SeqCst);
        self.inner.delete_node(key).await
    }

    async fn commit(self) -> Result<()> {
        self.inner.commit().await
    }
}

async fn seeded_graph() -> (MemoryGraph, NodeKey, NodeKey) {
    let store = MemoryGraph::new();
    let mut txn = store.begin().await.unwrap();
    txn.upsert_node(Node::User(User {
        id: "alice".to_string(),
        external_id: "ext-alice".to_string(),
        org_id: "org1".to_string(),
        email: "alice@example.com".to_string(),
        full_name: None,
        is_admin: false,
    }))
    .await
    .unwrap();
    txn.commit().await.unwrap();

    let alice = NodeKey::user("alice");
    let kb = create_knowledge_base(&store, &alice, "org1", "handbook")
        .await
        .unwrap();
    let folder = create_folder(&store, &alice, &kb.key(), "policies")
        .await
        .unwrap();
    for name in ["one.pdf", "two.pdf", "three.pdf"] {
        upload_record(
            &store,
            &alice,
            &folder.key(),
            NewRecord {
                name: name.to_string(),
                record_type: RecordType::File,
                mime_type: Some("application/pdf".to_string()),
                extension: Some("pdf".to_string()),
                size_in_bytes: Some(512),
                web_url: None,
            },
        )
        .await
        .unwrap();
    }
    (store, alice, kb.key())
}

async fn snapshot(store: &MemoryGraph, alice: &NodeKey, kb: &NodeKey) -> (usize, usize, Vec<String>) {
    let request = SearchRequest {
        scope: Some(kb.clone()),
        ..SearchRequest::default()
    };
    let page = search(store, alice, "org1", &request).await.unwrap();
    let mut ids: Vec<String> = page.nodes.into_iter().map(|n| n.id).collect();
    ids.sort();
    (store.node_count(), store.edge_count(), ids)
}

#[tokio::test]
async fn a_mid_cascade_storage_error_rolls_everything_back() {
    let (store, alice, kb) = seeded_graph().await;
    let before = snapshot(&store, &alice, &kb).await;
    assert_eq!(before.2.len(), 4); // folder + three records

    let faulty = FaultyStore::new(store.clone(), 2, FailureMode::ErrorOut);
    let result = delete_subtree(&faulty, &EndpointCatalog::default(), &alice, &kb).await;
    assert!(matches!(result, Err(Error::StorageUnavailable(_))));

    let after = snapshot(&store, &alice, &kb).await;
    assert_eq!(before, after);
}

#[tokio::test]
async fn a_deletion_shortfall_is_a_consistency_violation_and_rolls_back() {
    let (store, alice, kb) = seeded_graph().await;
    let before = snapshot(&store, &alice, &kb).await;

    let faulty = FaultyStore::new(store.clone(), 3, FailureMode::Undercount);
    let result = delete_subtree(&faulty, &EndpointCatalog::default(), &alice, &kb).await;
    assert!(matches!(result, Err(Error::ConsistencyViolation(_))));

    let after = snapshot(&store, &alice, &kb).await;
    assert_eq!(before, after);
}

#[tokio::test]
async fn a_healthy_cascade_commits_exactly_once() {
    let (store, alice, kb) = seeded_graph().await;

    let outcome = delete_subtree(&store, &EndpointCatalog::default(), &alice, &kb)
        .await
        .unwrap();
    assert_eq!(outcome.deleted.records, 4);
    assert_eq!(outcome.deleted.record_groups, 1);
    assert_eq!(outcome.deleted.type_docs, 3);
    assert_eq!(outcome.events.payloads.len(), 3);

    assert_eq!(store.node_count(), 1); // alice
    assert_eq!(store.edge_count(), 0);

    // the subtree is gone for search as well
    let request = SearchRequest::default();
    let page = search(&store, &alice, "org1", &request).await.unwrap();
    assert_eq!(page.total, 0);
}
