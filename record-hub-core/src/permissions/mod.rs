//! Permission resolution across grant paths and inheritance chains.
//!
//! A principal can reach a resource through five independent grant paths
//! (direct, group, role entity, team, organization), each evaluated against
//! the resource and every ancestor on its `INHERIT_PERMISSIONS` chain. The
//! effective role is the max-priority role over all of them. The reduction
//! is associative and commutative, so per-target lookups run concurrently
//! and merge in any order.

use std::collections::{HashMap, HashSet};

use futures::future::join_all;

use crate::error::{Error, Result};
use crate::model::{
    max_role, App, AppScope, Edge, EdgeKind, EntityClass, Node, NodeKey, NodeKind, Origin,
    PrincipalType, Role, User,
};
use crate::store::GraphReader;

/// Depth cap applied to inheritance traversal. Callers requesting
/// "unlimited" depth get this bound.
pub const MAX_INHERIT_DEPTH: usize = 100;

/// Caller-facing sentinel for "follow the chain as far as the cap allows".
pub const UNLIMITED_DEPTH: i64 = -1;

/// The closed set of grant paths. Adding a path means adding a variant and
/// an arm in [`role_along_path`]; there is no other dispatch site.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrantPath {
    Direct,
    ViaGroup,
    ViaRole,
    ViaTeam,
    ViaOrg,
}

impl GrantPath {
    pub const ALL: [GrantPath; 5] = [
        GrantPath::Direct,
        GrantPath::ViaGroup,
        GrantPath::ViaRole,
        GrantPath::ViaTeam,
        GrantPath::ViaOrg,
    ];
}

/// Everything about a principal the path evaluation needs, loaded once per
/// operation: memberships, org, and the set of connectors the user can see.
#[derive(Clone, Debug)]
pub struct PrincipalContext {
    pub user: User,
    pub user_key: NodeKey,
    pub groups: HashSet<NodeKey>,
    pub role_entities: HashSet<NodeKey>,
    /// Team membership with the role carried on the user→team edge; that
    /// role, not the team's own grant, is what the member exercises.
    pub teams: HashMap<NodeKey, Role>,
    pub org: Option<NodeKey>,
    /// Connector ids reachable through an app-access edge.
    pub app_ids: HashSet<String>,
}

/// Resolve a principal key from an internal id, external id, or email.
pub async fn lookup_principal<S: GraphReader>(
    store: &S,
    org_id: &str,
    any_id: &str,
) -> Result<NodeKey> {
    match store.lookup_user(org_id, any_id).await? {
        Some(user) => Ok(NodeKey::user(user.id)),
        None => Err(Error::NotFound(NodeKey::user(any_id))),
    }
}

/// Load the principal context for a user.
pub async fn principal_context<S: GraphReader>(
    store: &S,
    user: &NodeKey,
) -> Result<PrincipalContext> {
    let node = store
        .node(user)
        .await?
        .ok_or_else(|| Error::NotFound(user.clone()))?;
    let Node::User(user_body) = node else {
        return Err(Error::InvalidArgument(format!(
            "{user} is not a user principal"
        )));
    };

    let mut ctx = PrincipalContext {
        user: user_body,
        user_key: user.clone(),
        groups: HashSet::new(),
        role_entities: HashSet::new(),
        teams: HashMap::new(),
        org: None,
        app_ids: HashSet::new(),
    };

    for edge in store.outgoing(user, EdgeKind::Permission).await? {
        match edge.to.kind {
            NodeKind::Group => {
                ctx.groups.insert(edge.to);
            }
            NodeKind::RoleEntity => {
                ctx.role_entities.insert(edge.to);
            }
            NodeKind::Team => {
                if let Some(role) = edge.role() {
                    ctx.teams.insert(edge.to, role);
                }
            }
            _ => {}
        }
    }

    for edge in store.outgoing(user, EdgeKind::BelongsTo).await? {
        if let crate::model::EdgeBody::BelongsTo {
            entity: Some(EntityClass::Organization),
        } = edge.body
        {
            ctx.org = Some(edge.to);
        }
    }

    for edge in store.outgoing(user, EdgeKind::AppAccess).await? {
        ctx.app_ids.insert(edge.to.id);
    }

    Ok(ctx)
}

/// Translate a caller depth into a traversal bound. `-1` means the default
/// cap; anything below is malformed and rejected before traversal starts.
fn depth_cap(depth: i64) -> Result<usize> {
    if depth < UNLIMITED_DEPTH {
        return Err(Error::InvalidArgument(format!("bad depth {depth}")));
    }
    if depth == UNLIMITED_DEPTH {
        return Ok(MAX_INHERIT_DEPTH);
    }
    Ok((depth as usize).min(MAX_INHERIT_DEPTH))
}

/// The permission target set: the resource plus every ancestor reachable
/// over `INHERIT_PERMISSIONS`, bounded by `cap` levels. Chains may skip
/// levels, so this walks edges rather than the containment hierarchy.
pub async fn permission_targets<S: GraphReader>(
    store: &S,
    resource: &NodeKey,
    cap: usize,
) -> Result<Vec<NodeKey>> {
    let mut targets = vec![resource.clone()];
    let mut visited: HashSet<NodeKey> = HashSet::from([resource.clone()]);
    let mut frontier = vec![resource.clone()];
    let mut level = 0;
    while !frontier.is_empty() && level < cap {
        let mut next = Vec::new();
        for node in &frontier {
            for edge in store.outgoing(node, EdgeKind::InheritPermissions).await? {
                if visited.insert(edge.to.clone()) {
                    targets.push(edge.to.clone());
                    next.push(edge.to);
                }
            }
        }
        frontier = next;
        level += 1;
    }
    Ok(targets)
}

/// Evaluate one grant path against the permission edges arriving at a
/// single target. Pure: the grants were fetched once for all five paths.
pub fn role_along_path(path: GrantPath, ctx: &PrincipalContext, grants: &[Edge]) -> Option<Role> {
    let mut best = None;
    for grant in grants {
        let (Some(role), Some(grantor)) = (grant.role(), grant.grantor()) else {
            continue;
        };
        let effective = match path {
            GrantPath::Direct => {
                (grantor == PrincipalType::User && grant.from == ctx.user_key).then_some(role)
            }
            GrantPath::ViaGroup => (grant.from.kind == NodeKind::Group
                && ctx.groups.contains(&grant.from))
            .then_some(role),
            GrantPath::ViaRole => (grant.from.kind == NodeKind::RoleEntity
                && ctx.role_entities.contains(&grant.from))
            .then_some(role),
            // Team grants confer the member's own team role on the target.
            GrantPath::ViaTeam => (grantor == PrincipalType::Team)
                .then(|| ctx.teams.get(&grant.from).copied())
                .flatten(),
            GrantPath::ViaOrg => {
                (grantor == PrincipalType::Org && Some(&grant.from) == ctx.org.as_ref())
                    .then_some(role)
            }
        };
        best = max_role(best, effective);
    }
    best
}

async fn resolve_target<S: GraphReader>(
    store: &S,
    ctx: &PrincipalContext,
    target: &NodeKey,
) -> Result<Option<Role>> {
    let grants = store.incoming(target, EdgeKind::Permission).await?;
    Ok(GrantPath::ALL
        .iter()
        .fold(None, |acc, path| {
            max_role(acc, role_along_path(*path, ctx, &grants))
        }))
}

/// Connector-origin resources are invisible without app access, whatever
/// grants exist.
fn passes_connector_gate(node: &Node, ctx: &PrincipalContext) -> bool {
    let connector = match node {
        Node::Record(r) if r.origin == Origin::Connector => r.connector_id.as_deref(),
        Node::RecordGroup(g) => g.connector_id.as_deref(),
        _ => None,
    };
    match connector {
        Some(id) => ctx.app_ids.contains(id),
        None => true,
    }
}

/// App-level access uses its own rule, not the grant paths.
pub fn app_role(ctx: &PrincipalContext, app: &App) -> Option<Role> {
    if !ctx.app_ids.contains(&app.id) {
        return None;
    }
    let role = match app.scope {
        AppScope::Personal if ctx.user.is_admin => Role::Owner,
        AppScope::Team if app.created_by == ctx.user.id => Role::Owner,
        AppScope::Team if ctx.user.is_admin => Role::Editor,
        _ => Role::Reader,
    };
    Some(role)
}

/// `ResolveRole`: the single highest-priority role a principal holds on a
/// resource, or `None` for no access. `depth` bounds the inheritance walk
/// (`-1` = default cap).
pub async fn resolve_role<S: GraphReader>(
    store: &S,
    user: &NodeKey,
    resource: &NodeKey,
    depth: i64,
) -> Result<Option<Role>> {
    let cap = depth_cap(depth)?;
    let ctx = principal_context(store, user).await?;
    resolve_role_bounded(store, &ctx, resource, cap).await
}

/// Same as [`resolve_role`] with a pre-built context, for callers that
/// check many resources for one principal.
pub async fn resolve_role_with_ctx<S: GraphReader>(
    store: &S,
    ctx: &PrincipalContext,
    resource: &NodeKey,
    depth: i64,
) -> Result<Option<Role>> {
    let cap = depth_cap(depth)?;
    resolve_role_bounded(store, ctx, resource, cap).await
}

async fn resolve_role_bounded<S: GraphReader>(
    store: &S,
    ctx: &PrincipalContext,
    resource: &NodeKey,
    cap: usize,
) -> Result<Option<Role>> {
    let node = store
        .node(resource)
        .await?
        .ok_or_else(|| Error::NotFound(resource.clone()))?;
    match &node {
        Node::App(app) => Ok(app_role(ctx, app)),
        Node::Record(_) | Node::RecordGroup(_) => {
            if !passes_connector_gate(&node, ctx) {
                return Ok(None);
            }
            let targets = permission_targets(store, resource, cap).await?;
            let lookups = targets.iter().map(|t| resolve_target(store, ctx, t));
            let mut best = None;
            for outcome in join_all(lookups).await {
                best = max_role(best, outcome?);
            }
            Ok(best)
        }
        _ => Err(Error::InvalidArgument(format!(
            "{resource} is not an access-controlled resource"
        ))),
    }
}

fn merge_grant(roles: &mut HashMap<NodeKey, Role>, key: NodeKey, role: Role) {
    if !matches!(key.kind, NodeKind::Record | NodeKind::RecordGroup) {
        return;
    }
    let merged = max_role(roles.get(&key).copied(), Some(role));
    if let Some(r) = merged {
        roles.insert(key, r);
    }
}

/// `ResolveAccessibleResources`: every record, record group, and app in the
/// organization the principal can reach, with the effective role on each.
/// Grant seeds come from the same five paths, then flow down the reverse
/// inheritance edges breadth-first; the connector gate is applied once at
/// the end against the principal's app set. Attribute filters are the
/// caller's post-processing step; nothing here is re-derived per filter.
pub async fn accessible_resources<S: GraphReader>(
    store: &S,
    user: &NodeKey,
    org_id: &str,
    depth: i64,
) -> Result<HashMap<NodeKey, Role>> {
    let cap = depth_cap(depth)?;
    let ctx = principal_context(store, user).await?;
    let mut roles: HashMap<NodeKey, Role> = HashMap::new();

    for edge in store.outgoing(&ctx.user_key, EdgeKind::Permission).await? {
        if edge.grantor() == Some(PrincipalType::User) {
            if let Some(role) = edge.role() {
                merge_grant(&mut roles, edge.to, role);
            }
        }
    }
    for group in ctx.groups.iter().chain(ctx.role_entities.iter()) {
        for edge in store.outgoing(group, EdgeKind::Permission).await? {
            if let Some(role) = edge.role() {
                merge_grant(&mut roles, edge.to, role);
            }
        }
    }
    for (team, member_role) in &ctx.teams {
        for edge in store.outgoing(team, EdgeKind::Permission).await? {
            if edge.grantor() == Some(PrincipalType::Team) {
                merge_grant(&mut roles, edge.to, *member_role);
            }
        }
    }
    if let Some(org) = &ctx.org {
        for edge in store.outgoing(org, EdgeKind::Permission).await? {
            if edge.grantor() == Some(PrincipalType::Org) {
                if let Some(role) = edge.role() {
                    merge_grant(&mut roles, edge.to, role);
                }
            }
        }
    }

    // Flow grants down to everything that inherits from a granted container.
    let mut frontier: Vec<(NodeKey, Role)> =
        roles.iter().map(|(k, r)| (k.clone(), *r)).collect();
    let mut level = 0;
    while !frontier.is_empty() && level < cap {
        let mut next = Vec::new();
        for (node, role) in frontier {
            for edge in store.incoming(&node, EdgeKind::InheritPermissions).await? {
                let child = edge.from;
                let current = roles.get(&child).copied();
                if current.map_or(true, |r| role.priority() > r.priority()) {
                    roles.insert(child.clone(), role);
                    next.push((child, role));
                }
            }
        }
        frontier = next;
        level += 1;
    }

    // One pass of origin gating and org scoping over the materialized set.
    let keys: Vec<NodeKey> = roles.keys().cloned().collect();
    for key in keys {
        let keep = match store.node(&key).await? {
            Some(node) => {
                node.org_id() == Some(org_id) && passes_connector_gate(&node, &ctx)
            }
            None => false,
        };
        if !keep {
            roles.remove(&key);
        }
    }

    for app_id in &ctx.app_ids {
        let key = NodeKey::app(app_id.clone());
        if let Some(Node::App(app)) = store.node(&key).await? {
            if app.org_id == org_id {
                if let Some(role) = app_role(&ctx, &app) {
                    roles.insert(key, role);
                }
            }
        }
    }

    Ok(roles)
}
