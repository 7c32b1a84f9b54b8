//! Cascading mutation protocol and the creation operations that feed it.
//!
//! Deletion follows a strict collect-then-delete-then-validate discipline
//! inside one transaction: the full inventory of dependent nodes is captured
//! before any edge is removed, every edge touching a collected node is
//! purged before any node goes away, and actual deletion counts are checked
//! against the inventory before commit. Any shortfall rolls the whole
//! transaction back.

use std::collections::{HashSet, VecDeque};

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::catalog::EndpointCatalog;
use crate::error::{Error, Result};
use crate::events::{deletion_batch, EventBatch};
use crate::model::{
    Edge, EdgeKind, IndexingStatus, Node, NodeKey, NodeKind, Origin, PrincipalType, Record,
    RecordGroup, RecordRelation, RecordType, Role, TypeDoc,
};
use crate::permissions::{principal_context, resolve_role, UNLIMITED_DEPTH};
use crate::store::{GraphReader, GraphStore, GraphTxn};

/// Per-kind deletion tallies, compared against the inventory in step 5.
#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeletedCounts {
    pub records: usize,
    pub record_groups: usize,
    pub type_docs: usize,
    pub groups: usize,
    pub roles: usize,
    pub sync_points: usize,
    pub apps: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DeleteOutcome {
    pub deleted: DeletedCounts,
    pub events: EventBatch,
}

/// Everything a subtree deletion will remove, captured before the first
/// delete. Record bodies are kept whole because the deletion events need
/// them after the nodes are gone.
#[derive(Default)]
struct Inventory {
    records: Vec<Record>,
    record_groups: Vec<NodeKey>,
    groups: Vec<NodeKey>,
    roles: Vec<NodeKey>,
    sync_points: Vec<NodeKey>,
    type_docs: Vec<NodeKey>,
    apps: Vec<NodeKey>,
}

impl Inventory {
    fn expected(&self) -> DeletedCounts {
        DeletedCounts {
            records: self.records.len(),
            record_groups: self.record_groups.len(),
            type_docs: self.type_docs.len(),
            groups: self.groups.len(),
            roles: self.roles.len(),
            sync_points: self.sync_points.len(),
            apps: self.apps.len(),
        }
    }

    fn all_keys(&self) -> Vec<NodeKey> {
        let mut keys: Vec<NodeKey> = self.records.iter().map(Record::key).collect();
        keys.extend(self.record_groups.iter().cloned());
        keys.extend(self.groups.iter().cloned());
        keys.extend(self.roles.iter().cloned());
        keys.extend(self.sync_points.iter().cloned());
        keys.extend(self.type_docs.iter().cloned());
        keys.extend(self.apps.iter().cloned());
        keys
    }
}

/// Step 1: breadth-first containment walk from the root, capturing every
/// dependent node id by kind and every `IS_OF_TYPE` payload id. Must run to
/// completion before the first delete; once edges are purged the subtree
/// can no longer be rediscovered.
async fn collect_inventory<S: GraphReader>(store: &S, root: &NodeKey) -> Result<Inventory> {
    let mut inventory = Inventory::default();
    let mut type_docs_seen: HashSet<NodeKey> = HashSet::new();
    let mut visited: HashSet<NodeKey> = HashSet::new();
    let mut queue: VecDeque<NodeKey> = VecDeque::from([root.clone()]);

    while let Some(key) = queue.pop_front() {
        if !visited.insert(key.clone()) {
            continue;
        }
        let Some(node) = store.node(&key).await? else {
            tracing::warn!(%key, "dangling reference skipped during inventory");
            continue;
        };
        match node {
            Node::Record(record) => {
                for edge in store.outgoing(&key, EdgeKind::RecordRelation).await? {
                    queue.push_back(edge.to);
                }
                for edge in store.outgoing(&key, EdgeKind::IsOfType).await? {
                    if type_docs_seen.insert(edge.to.clone()) {
                        inventory.type_docs.push(edge.to);
                    }
                }
                inventory.records.push(record);
            }
            Node::RecordGroup(_) => {
                for edge in store.incoming(&key, EdgeKind::BelongsTo).await? {
                    if matches!(edge.from.kind, NodeKind::Record | NodeKind::RecordGroup) {
                        queue.push_back(edge.from);
                    }
                }
                inventory.record_groups.push(key);
            }
            Node::App(_) => {
                for edge in store.incoming(&key, EdgeKind::BelongsTo).await? {
                    if matches!(
                        edge.from.kind,
                        NodeKind::Record
                            | NodeKind::RecordGroup
                            | NodeKind::Group
                            | NodeKind::RoleEntity
                            | NodeKind::SyncPoint
                    ) {
                        queue.push_back(edge.from);
                    }
                }
                inventory.apps.push(key);
            }
            Node::Group(_) => inventory.groups.push(key),
            Node::RoleEntity(_) => inventory.roles.push(key),
            Node::SyncPoint(_) => inventory.sync_points.push(key),
            _ => {}
        }
    }

    Ok(inventory)
}

/// `DeleteSubtree`: remove a knowledge base, folder, or connector instance
/// and everything it transitively owns. All-or-nothing; the returned event
/// batch describes every deleted content record for a publishing
/// collaborator.
pub async fn delete_subtree<S: GraphStore>(
    store: &S,
    catalog: &EndpointCatalog,
    user: &NodeKey,
    root: &NodeKey,
) -> Result<DeleteOutcome> {
    let root_node = store
        .node(root)
        .await?
        .ok_or_else(|| Error::NotFound(root.clone()))?;
    let required = match &root_node {
        Node::RecordGroup(_) | Node::App(_) => Role::Owner,
        Node::Record(record) if record.is_container => Role::FileOrganizer,
        _ => {
            return Err(Error::InvalidArgument(format!(
                "{root} is not a deletable subtree root"
            )))
        }
    };
    match resolve_role(store, user, root, UNLIMITED_DEPTH).await? {
        Some(role) if role.at_least(required) => {}
        _ => return Err(Error::NoAccess),
    }

    let mut txn = store.begin().await?;

    // Step 1: inventory, before any delete.
    let inventory = collect_inventory(&txn, root).await?;

    // Step 2: purge every edge touching a collected node, both directions,
    // every edge kind. An adapter failure here means dangling edges would
    // remain, so the whole operation aborts.
    for key in inventory.all_keys() {
        for kind in EdgeKind::ALL {
            txn.delete_edges_touching(&key, kind).await.map_err(|e| {
                Error::ConsistencyViolation(format!("edge purge failed at {key}: {e}"))
            })?;
        }
    }

    let mut actual = DeletedCounts::default();

    // Step 3: type payloads, from the ids captured in step 1; the edges
    // that located them no longer exist.
    for key in &inventory.type_docs {
        if txn.delete_node(key).await? {
            actual.type_docs += 1;
        }
    }

    // Step 4: nodes, deepest first within each bucket; records before
    // groups, connector principals and the app last.
    for record in inventory.records.iter().rev() {
        if txn.delete_node(&record.key()).await? {
            actual.records += 1;
        }
    }
    for key in inventory.record_groups.iter().rev() {
        if txn.delete_node(key).await? {
            actual.record_groups += 1;
        }
    }
    for key in inventory.roles.iter().rev() {
        if txn.delete_node(key).await? {
            actual.roles += 1;
        }
    }
    for key in inventory.groups.iter().rev() {
        if txn.delete_node(key).await? {
            actual.groups += 1;
        }
    }
    for key in inventory.sync_points.iter().rev() {
        if txn.delete_node(key).await? {
            actual.sync_points += 1;
        }
    }
    for key in inventory.apps.iter().rev() {
        if txn.delete_node(key).await? {
            actual.apps += 1;
        }
    }

    // Step 5: validate against the inventory; a shortfall means the graph
    // disagrees with what step 1 saw, and nothing may be committed.
    let expected = inventory.expected();
    if actual != expected {
        return Err(Error::ConsistencyViolation(format!(
            "deletion shortfall: expected {expected:?}, deleted {actual:?}"
        )));
    }

    // Step 6: event payloads. Best-effort by contract; nothing here can
    // fail the deletion.
    let events = deletion_batch(catalog, &inventory.records);
    tracing::debug!(
        records = actual.records,
        groups = actual.record_groups,
        payloads = events.payloads.len(),
        "subtree deletion validated"
    );

    txn.commit().await?;
    Ok(DeleteOutcome {
        deleted: actual,
        events,
    })
}

// ---------------------------------------------------------------------------
// Creation operations (the non-deletion half)
// ---------------------------------------------------------------------------

/// Caller-supplied fields of an uploaded record.
#[derive(Clone, Debug)]
pub struct NewRecord {
    pub name: String,
    pub record_type: RecordType,
    pub mime_type: Option<String>,
    pub extension: Option<String>,
    pub size_in_bytes: Option<i64>,
    pub web_url: Option<String>,
}

/// Create an empty knowledge base owned by the caller.
pub async fn create_knowledge_base<S: GraphStore>(
    store: &S,
    user: &NodeKey,
    org_id: &str,
    name: &str,
) -> Result<RecordGroup> {
    if name.trim().is_empty() {
        return Err(Error::InvalidArgument("empty knowledge base name".into()));
    }
    let ctx = principal_context(store, user).await?;
    if ctx.user.org_id != org_id {
        return Err(Error::NoAccess);
    }

    let now = Utc::now();
    let kb = RecordGroup {
        id: Uuid::new_v4().to_string(),
        org_id: org_id.to_string(),
        name: name.to_string(),
        is_knowledge_base: true,
        connector_id: None,
        web_url: None,
        created_at: now,
        updated_at: now,
    };

    let mut txn = store.begin().await?;
    txn.upsert_node(Node::RecordGroup(kb.clone())).await?;
    txn.upsert_edge(Edge::permission(
        user.clone(),
        kb.key(),
        Role::Owner,
        PrincipalType::User,
    ))
    .await?;
    txn.commit().await?;
    Ok(kb)
}

/// Resolve the containing record group and optional folder parent for a
/// creation under `parent`.
async fn content_container<S: GraphReader>(
    store: &S,
    parent: &NodeKey,
) -> Result<(NodeKey, Option<NodeKey>, String)> {
    let node = store
        .node(parent)
        .await?
        .ok_or_else(|| Error::NotFound(parent.clone()))?;
    match node {
        Node::RecordGroup(group) => Ok((group.key(), None, group.org_id)),
        Node::Record(record) if record.is_container => {
            let group = store
                .outgoing(parent, EdgeKind::BelongsTo)
                .await?
                .into_iter()
                .map(|e| e.to)
                .find(|to| to.kind == NodeKind::RecordGroup)
                .ok_or_else(|| {
                    Error::ConsistencyViolation(format!("{parent} has no containing group"))
                })?;
            Ok((group, Some(parent.clone()), record.org_id))
        }
        Node::Record(_) => Err(Error::InvalidArgument(format!(
            "{parent} is not a folder"
        ))),
        _ => Err(Error::InvalidArgument(format!(
            "{parent} cannot contain records"
        ))),
    }
}

async fn require_role<S: GraphReader>(
    store: &S,
    user: &NodeKey,
    resource: &NodeKey,
    floor: Role,
) -> Result<()> {
    match resolve_role(store, user, resource, UNLIMITED_DEPTH).await? {
        Some(role) if role.at_least(floor) => Ok(()),
        _ => Err(Error::NoAccess),
    }
}

/// Create a folder record under a knowledge base, record group, or folder.
pub async fn create_folder<S: GraphStore>(
    store: &S,
    user: &NodeKey,
    parent: &NodeKey,
    name: &str,
) -> Result<Record> {
    if name.trim().is_empty() {
        return Err(Error::InvalidArgument("empty folder name".into()));
    }
    let (group, folder_parent, org_id) = content_container(store, parent).await?;
    require_role(store, user, parent, Role::Writer).await?;

    let now = Utc::now();
    let folder = Record {
        id: Uuid::new_v4().to_string(),
        org_id,
        name: name.to_string(),
        is_container: true,
        origin: Origin::Upload,
        connector_id: None,
        record_type: None,
        indexing_status: None,
        version: 0,
        external_revision_id: None,
        extension: None,
        mime_type: None,
        size_in_bytes: None,
        web_url: None,
        summary_doc_id: None,
        virtual_record_id: None,
        created_at: now,
        updated_at: now,
    };

    let mut txn = store.begin().await?;
    txn.upsert_node(Node::Record(folder.clone())).await?;
    txn.upsert_edge(Edge::belongs_to(folder.key(), group.clone())).await?;
    txn.upsert_edge(Edge::inherit_permissions(folder.key(), group)).await?;
    if let Some(parent_folder) = folder_parent {
        txn.upsert_edge(Edge::record_relation(
            parent_folder,
            folder.key(),
            RecordRelation::ParentChild,
        ))
        .await?;
    }
    txn.commit().await?;
    Ok(folder)
}

/// Create a content record with its type payload document under a knowledge
/// base, record group, or folder.
pub async fn upload_record<S: GraphStore>(
    store: &S,
    user: &NodeKey,
    parent: &NodeKey,
    new: NewRecord,
) -> Result<Record> {
    if new.name.trim().is_empty() {
        return Err(Error::InvalidArgument("empty record name".into()));
    }
    let (group, folder_parent, org_id) = content_container(store, parent).await?;
    require_role(store, user, parent, Role::Writer).await?;

    let now = Utc::now();
    let record = Record {
        id: Uuid::new_v4().to_string(),
        org_id,
        name: new.name,
        is_container: false,
        origin: Origin::Upload,
        connector_id: None,
        record_type: Some(new.record_type),
        indexing_status: Some(IndexingStatus::NotStarted),
        version: 1,
        external_revision_id: None,
        extension: new.extension,
        mime_type: new.mime_type,
        size_in_bytes: new.size_in_bytes,
        web_url: new.web_url,
        summary_doc_id: None,
        virtual_record_id: None,
        created_at: now,
        updated_at: now,
    };
    let type_doc = TypeDoc {
        id: Uuid::new_v4().to_string(),
        record_type: new.record_type,
    };

    let mut txn = store.begin().await?;
    txn.upsert_node(Node::Record(record.clone())).await?;
    txn.upsert_node(Node::TypeDoc(type_doc.clone())).await?;
    txn.upsert_edge(Edge::belongs_to(record.key(), group.clone())).await?;
    txn.upsert_edge(Edge::inherit_permissions(record.key(), group)).await?;
    txn.upsert_edge(Edge::is_of_type(
        record.key(),
        NodeKey::new(NodeKind::TypeDoc, type_doc.id),
    ))
    .await?;
    if let Some(parent_folder) = folder_parent {
        txn.upsert_edge(Edge::record_relation(
            parent_folder,
            record.key(),
            RecordRelation::ParentChild,
        ))
        .await?;
    }
    txn.commit().await?;
    Ok(record)
}
