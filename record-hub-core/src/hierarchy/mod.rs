//! Hierarchical traversal: children listing with folders-first pagination,
//! breadcrumb trails, and permission-filtered search.

use std::collections::HashSet;

use futures::future::join_all;

use crate::error::{Error, Result};
use crate::model::{
    Crumb, EdgeKind, Node, NodeKey, NodeKind, NodeSummary, NodeType, Page, Role, SearchFilters,
    SortDirection, SortField, SortSpec, KNOWLEDGE_BASE_CONNECTOR,
};
use crate::permissions::{
    accessible_resources, principal_context, resolve_role_with_ctx, MAX_INHERIT_DEPTH,
    UNLIMITED_DEPTH,
};
use crate::store::GraphReader;

/// Breadcrumb trails stop after this many parent hops even on a healthy
/// graph; the visited set guards against cycles below that.
const BREADCRUMB_MAX_DEPTH: usize = 20;

/// One page of a container's children, folders enumerated strictly before
/// leaf records.
#[derive(Clone, Debug, PartialEq)]
pub struct Listing {
    pub folders: Vec<NodeSummary>,
    pub records: Vec<NodeSummary>,
    pub total_folders: usize,
    pub total_records: usize,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchRequest {
    /// Optional starting container or record; results are restricted to its
    /// descendants.
    pub scope: Option<NodeKey>,
    pub filters: SearchFilters,
    pub sort: SortSpec,
    pub page: Page,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SearchPage {
    pub nodes: Vec<NodeSummary>,
    pub total: usize,
}

// ---------------------------------------------------------------------------
// Parents and children
// ---------------------------------------------------------------------------

/// Content-hierarchy parent of a node. Records prefer their record-relation
/// parent over their container; record groups stop at knowledge-base apps;
/// apps are roots.
pub async fn content_parent<S: GraphReader>(
    store: &S,
    node: &NodeKey,
) -> Result<Option<NodeKey>> {
    match node.kind {
        NodeKind::Record => {
            if let Some(edge) = store
                .incoming(node, EdgeKind::RecordRelation)
                .await?
                .into_iter()
                .next()
            {
                return Ok(Some(edge.from));
            }
            Ok(store
                .outgoing(node, EdgeKind::BelongsTo)
                .await?
                .into_iter()
                .map(|e| e.to)
                .find(|to| matches!(to.kind, NodeKind::RecordGroup | NodeKind::App)))
        }
        NodeKind::RecordGroup => {
            for edge in store.outgoing(node, EdgeKind::BelongsTo).await? {
                match edge.to.kind {
                    NodeKind::RecordGroup => return Ok(Some(edge.to)),
                    NodeKind::App => {
                        let parent = store.node(&edge.to).await?;
                        if let Some(Node::App(app)) = parent {
                            if app.connector_type != KNOWLEDGE_BASE_CONNECTOR {
                                return Ok(Some(edge.to));
                            }
                        }
                    }
                    _ => {}
                }
            }
            Ok(None)
        }
        _ => Ok(None),
    }
}

async fn has_children<S: GraphReader>(store: &S, node: &NodeKey) -> Result<bool> {
    match node.kind {
        NodeKind::App | NodeKind::RecordGroup => {
            let children = store.incoming(node, EdgeKind::BelongsTo).await?;
            Ok(children
                .iter()
                .any(|e| matches!(e.from.kind, NodeKind::Record | NodeKind::RecordGroup)))
        }
        NodeKind::Record => Ok(!store
            .outgoing(node, EdgeKind::RecordRelation)
            .await?
            .is_empty()),
        _ => Ok(false),
    }
}

/// Flatten a node into its boundary summary, resolving parent linkage and
/// child presence.
pub async fn summarize<S: GraphReader>(
    store: &S,
    node: &Node,
    user_role: Option<Role>,
) -> Result<Option<NodeSummary>> {
    let key = node.key();
    let parent_id = content_parent(store, &key).await?.map(|p| p.id);
    let children = has_children(store, &key).await?;
    Ok(NodeSummary::from_node(node, parent_id, children, user_role))
}

/// Immediate children of a container, unfiltered. Records nested inside a
/// folder surface under the folder, not under the group they also belong to.
async fn raw_children<S: GraphReader>(store: &S, container: &NodeKey) -> Result<Vec<NodeKey>> {
    match container.kind {
        NodeKind::App | NodeKind::RecordGroup => {
            let mut children = Vec::new();
            for edge in store.incoming(container, EdgeKind::BelongsTo).await? {
                if !matches!(edge.from.kind, NodeKind::Record | NodeKind::RecordGroup) {
                    continue;
                }
                if edge.from.kind == NodeKind::Record
                    && !store
                        .incoming(&edge.from, EdgeKind::RecordRelation)
                        .await?
                        .is_empty()
                {
                    continue;
                }
                children.push(edge.from);
            }
            Ok(children)
        }
        NodeKind::Record => Ok(store
            .outgoing(container, EdgeKind::RecordRelation)
            .await?
            .into_iter()
            .map(|e| e.to)
            .collect()),
        _ => Err(Error::InvalidArgument(format!(
            "{container} is not a container"
        ))),
    }
}

fn sort_summaries(nodes: &mut [NodeSummary], sort: SortSpec) {
    match sort.field {
        SortField::Name => nodes.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        }),
        SortField::CreatedAt => {
            nodes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)))
        }
        SortField::UpdatedAt => {
            nodes.sort_by(|a, b| a.updated_at.cmp(&b.updated_at).then_with(|| a.id.cmp(&b.id)))
        }
        SortField::Size => nodes.sort_by(|a, b| {
            a.size_in_bytes
                .cmp(&b.size_in_bytes)
                .then_with(|| a.id.cmp(&b.id))
        }),
    }
    if sort.direction == SortDirection::Desc {
        nodes.reverse();
    }
}

fn window(items: &[NodeSummary], start: usize, len: usize) -> Vec<NodeSummary> {
    let start = start.min(items.len());
    let end = (start + len).min(items.len());
    items[start..end].to_vec()
}

/// `ListChildren`: one page of a container's children, permission-filtered
/// before pagination, sub-containers exhausted before any leaf record. A
/// window inside the folder run returns folders only; a straddling window
/// tops up with records; a window past the folder run returns records
/// offset by `skip - total_folders`.
pub async fn list_children<S: GraphReader>(
    store: &S,
    user: &NodeKey,
    container: &NodeKey,
    page: Page,
    sort: SortSpec,
) -> Result<Listing> {
    store
        .node(container)
        .await?
        .ok_or_else(|| Error::NotFound(container.clone()))?;
    let ctx = principal_context(store, user).await?;

    let children = raw_children(store, container).await?;
    let ctx = &ctx;
    let checks = children.iter().map(|child| async move {
        let role = resolve_role_with_ctx(store, ctx, child, UNLIMITED_DEPTH).await?;
        Ok::<_, Error>((child.clone(), role))
    });

    let mut folders = Vec::new();
    let mut records = Vec::new();
    for outcome in join_all(checks).await {
        let (key, role) = outcome?;
        let Some(role) = role else { continue };
        let Some(node) = store.node(&key).await? else {
            continue;
        };
        let populated = has_children(store, &key).await?;
        let Some(summary) =
            NodeSummary::from_node(&node, Some(container.id.clone()), populated, Some(role))
        else {
            continue;
        };
        if summary.node_type.is_container() {
            folders.push(summary);
        } else {
            records.push(summary);
        }
    }
    sort_summaries(&mut folders, sort);
    sort_summaries(&mut records, sort);

    let total_folders = folders.len();
    let total_records = records.len();
    let folder_page = window(&folders, page.skip, page.limit);
    let record_quota = page.limit - folder_page.len();
    let record_offset = page.skip.saturating_sub(total_folders);
    let record_page = window(&records, record_offset, record_quota);

    Ok(Listing {
        folders: folder_page,
        records: record_page,
        total_folders,
        total_records,
    })
}

// ---------------------------------------------------------------------------
// Breadcrumbs
// ---------------------------------------------------------------------------

/// `Breadcrumbs`: the trail from the root down to `node`, last element the
/// node itself. One parent lookup per level, bounded, cycle-guarded.
pub async fn breadcrumbs<S: GraphReader>(store: &S, node: &NodeKey) -> Result<Vec<Crumb>> {
    let mut trail = Vec::new();
    let mut visited: HashSet<NodeKey> = HashSet::new();
    let mut current = Some(node.clone());

    while let Some(key) = current {
        if trail.len() >= BREADCRUMB_MAX_DEPTH || !visited.insert(key.clone()) {
            break;
        }
        let Some(body) = store.node(&key).await? else {
            if trail.is_empty() {
                return Err(Error::NotFound(key));
            }
            break;
        };
        trail.push(Crumb {
            id: body.id().to_string(),
            name: body.name().to_string(),
            kind: body.kind(),
            sub_kind: NodeSummary::classify(&body),
        });
        current = content_parent(store, &key).await?;
    }

    trail.reverse();
    Ok(trail)
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// Everything below a scope node: containment and inheritance children for
/// containers, record-relation chains for records. Depth-bounded and
/// cycle-guarded like every other traversal.
async fn descendant_set<S: GraphReader>(store: &S, scope: &NodeKey) -> Result<HashSet<NodeKey>> {
    let mut seen: HashSet<NodeKey> = HashSet::new();
    let mut frontier = vec![scope.clone()];
    let mut level = 0;
    while !frontier.is_empty() && level < MAX_INHERIT_DEPTH {
        let mut next = Vec::new();
        for node in &frontier {
            let mut children: Vec<NodeKey> = Vec::new();
            match node.kind {
                NodeKind::App | NodeKind::RecordGroup => {
                    for edge in store.incoming(node, EdgeKind::BelongsTo).await? {
                        if matches!(edge.from.kind, NodeKind::Record | NodeKind::RecordGroup) {
                            children.push(edge.from);
                        }
                    }
                    for edge in store.incoming(node, EdgeKind::InheritPermissions).await? {
                        children.push(edge.from);
                    }
                }
                NodeKind::Record => {
                    for edge in store.outgoing(node, EdgeKind::RecordRelation).await? {
                        children.push(edge.to);
                    }
                }
                _ => {}
            }
            for child in children {
                if child != *scope && seen.insert(child.clone()) {
                    next.push(child);
                }
            }
        }
        frontier = next;
        level += 1;
    }
    Ok(seen)
}

/// `Search`: permission-filtered lookup over everything the principal can
/// reach, optionally restricted to one subtree. Every filter, including
/// `only_containers`, runs before pagination.
pub async fn search<S: GraphReader>(
    store: &S,
    user: &NodeKey,
    org_id: &str,
    request: &SearchRequest,
) -> Result<SearchPage> {
    let roles = accessible_resources(store, user, org_id, UNLIMITED_DEPTH).await?;

    let in_scope: Option<HashSet<NodeKey>> = match &request.scope {
        Some(scope) => {
            store
                .node(scope)
                .await?
                .ok_or_else(|| Error::NotFound(scope.clone()))?;
            Some(descendant_set(store, scope).await?)
        }
        None => None,
    };

    let mut nodes = Vec::new();
    for (key, role) in &roles {
        if let Some(scope) = &in_scope {
            if !scope.contains(key) {
                continue;
            }
        }
        let Some(body) = store.node(key).await? else {
            continue;
        };
        let Some(summary) = summarize(store, &body, Some(*role)).await? else {
            continue;
        };
        if !request.filters.matches(&summary) {
            continue;
        }
        if request.filters.only_containers
            && !(summary.has_children || summary.node_type.is_container())
        {
            continue;
        }
        if let Some(kb_ids) = &request.filters.kb_ids {
            if !kb_root_matches(store, key, kb_ids).await? {
                continue;
            }
        }
        nodes.push(summary);
    }

    sort_summaries(&mut nodes, request.sort);
    let total = nodes.len();
    let nodes = window(&nodes, request.page.skip, request.page.limit);
    Ok(SearchPage { nodes, total })
}

/// Knowledge-base filter: the node, or an inheritance ancestor of it, must
/// be one of the requested KBs.
async fn kb_root_matches<S: GraphReader>(
    store: &S,
    node: &NodeKey,
    kb_ids: &[String],
) -> Result<bool> {
    let targets =
        crate::permissions::permission_targets(store, node, MAX_INHERIT_DEPTH).await?;
    Ok(targets
        .iter()
        .any(|t| t.kind == NodeKind::RecordGroup && kb_ids.contains(&t.id)))
}

/// Knowledge bases the principal can reach, paged. The degenerate unscoped
/// search restricted to knowledge-base roots.
pub async fn list_knowledge_bases<S: GraphReader>(
    store: &S,
    user: &NodeKey,
    org_id: &str,
    page: Page,
    sort: SortSpec,
) -> Result<SearchPage> {
    let request = SearchRequest {
        scope: None,
        filters: SearchFilters {
            node_types: Some(vec![NodeType::KnowledgeBase]),
            ..SearchFilters::default()
        },
        sort,
        page,
    };
    search(store, user, org_id, &request).await
}
