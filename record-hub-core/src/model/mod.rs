//! Canonical resource and principal model.
//!
//! Every engine in this crate speaks this one vocabulary; translation to a
//! concrete storage engine's wire format (labels, `_from`/`_to` handles, …)
//! is the adapter's problem and never leaks past the store traits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Connector type of the built-in upload connector. RecordGroups created by
/// direct upload (knowledge bases) hang off an App of this type, which is
/// hidden from breadcrumbs.
pub const KNOWLEDGE_BASE_CONNECTOR: &str = "KNOWLEDGE_BASE";

// ---------------------------------------------------------------------------
// Node identity
// ---------------------------------------------------------------------------

/// Every node kind the core stores or traverses.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    User,
    Group,
    RoleEntity,
    Team,
    Organization,
    Record,
    RecordGroup,
    App,
    TypeDoc,
    SyncPoint,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::User => "user",
            NodeKind::Group => "group",
            NodeKind::RoleEntity => "role",
            NodeKind::Team => "team",
            NodeKind::Organization => "organization",
            NodeKind::Record => "record",
            NodeKind::RecordGroup => "recordGroup",
            NodeKind::App => "app",
            NodeKind::TypeDoc => "typeDoc",
            NodeKind::SyncPoint => "syncPoint",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Natural key of a node: `(kind, id)`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct NodeKey {
    pub kind: NodeKind,
    pub id: String,
}

impl NodeKey {
    pub fn new(kind: NodeKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn user(id: impl Into<String>) -> Self {
        Self::new(NodeKind::User, id)
    }

    pub fn record(id: impl Into<String>) -> Self {
        Self::new(NodeKind::Record, id)
    }

    pub fn record_group(id: impl Into<String>) -> Self {
        Self::new(NodeKind::RecordGroup, id)
    }

    pub fn app(id: impl Into<String>) -> Self {
        Self::new(NodeKind::App, id)
    }
}

impl std::fmt::Display for NodeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// Access roles, ordered by the fixed priority table. `Organizer`/`Admin`
/// and `FileOrganizer`/`Editor` are aliases at the same priority.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Owner,
    Organizer,
    Admin,
    FileOrganizer,
    Editor,
    Writer,
    Commenter,
    Reader,
}

impl Role {
    /// Priority used when reducing grant paths; higher wins.
    pub fn priority(&self) -> u8 {
        match self {
            Role::Owner => 6,
            Role::Organizer | Role::Admin => 5,
            Role::FileOrganizer | Role::Editor => 4,
            Role::Writer => 3,
            Role::Commenter => 2,
            Role::Reader => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "OWNER",
            Role::Organizer => "ORGANIZER",
            Role::Admin => "ADMIN",
            Role::FileOrganizer => "FILEORGANIZER",
            Role::Editor => "EDITOR",
            Role::Writer => "WRITER",
            Role::Commenter => "COMMENTER",
            Role::Reader => "READER",
        }
    }

    pub fn parse(s: &str) -> Result<Role> {
        match s.to_ascii_uppercase().as_str() {
            "OWNER" => Ok(Role::Owner),
            "ORGANIZER" => Ok(Role::Organizer),
            "ADMIN" => Ok(Role::Admin),
            "FILEORGANIZER" => Ok(Role::FileOrganizer),
            "EDITOR" => Ok(Role::Editor),
            "WRITER" => Ok(Role::Writer),
            "COMMENTER" => Ok(Role::Commenter),
            "READER" => Ok(Role::Reader),
            other => Err(Error::InvalidArgument(format!("unknown role {other:?}"))),
        }
    }

    pub fn at_least(&self, floor: Role) -> bool {
        self.priority() >= floor.priority()
    }
}

/// Max-priority merge of two optional roles. Associative and commutative,
/// so concurrent path results can be folded in any order.
pub fn max_role(a: Option<Role>, b: Option<Role>) -> Option<Role> {
    match (a, b) {
        (Some(x), Some(y)) => Some(if y.priority() > x.priority() { y } else { x }),
        (Some(x), None) => Some(x),
        (None, y) => y,
    }
}

/// Which principal kind issued a permission edge.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrincipalType {
    User,
    Group,
    Role,
    Team,
    Org,
}

// ---------------------------------------------------------------------------
// Node payloads
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Origin {
    Upload,
    Connector,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppScope {
    Personal,
    Team,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordType {
    File,
    Mail,
    Message,
    Ticket,
    WebPage,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndexingStatus {
    NotStarted,
    InProgress,
    Completed,
    Failed,
}

/// A document unit. Folders are records with `is_container` set.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    pub org_id: String,
    pub name: String,
    pub is_container: bool,
    pub origin: Origin,
    pub connector_id: Option<String>,
    pub record_type: Option<RecordType>,
    pub indexing_status: Option<IndexingStatus>,
    pub version: u64,
    pub external_revision_id: Option<String>,
    pub extension: Option<String>,
    pub mime_type: Option<String>,
    pub size_in_bytes: Option<i64>,
    pub web_url: Option<String>,
    pub summary_doc_id: Option<String>,
    pub virtual_record_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record {
    pub fn key(&self) -> NodeKey {
        NodeKey::record(self.id.clone())
    }
}

/// Container of records. Knowledge bases are record groups with
/// `is_knowledge_base` and no further parent.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecordGroup {
    pub id: String,
    pub org_id: String,
    pub name: String,
    pub is_knowledge_base: bool,
    pub connector_id: Option<String>,
    pub web_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecordGroup {
    pub fn key(&self) -> NodeKey {
        NodeKey::record_group(self.id.clone())
    }
}

/// A connector instance; root of a connector-origin subtree.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct App {
    pub id: String,
    pub org_id: String,
    pub name: String,
    /// Connector type, e.g. `DRIVE`, `GMAIL`, or [`KNOWLEDGE_BASE_CONNECTOR`].
    pub connector_type: String,
    pub scope: AppScope,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl App {
    pub fn key(&self) -> NodeKey {
        NodeKey::app(self.id.clone())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    /// External-facing id, distinct from the internal id. Both are lookup keys.
    pub external_id: String,
    pub org_id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub is_admin: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub org_id: String,
    pub name: String,
    pub connector_id: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoleEntity {
    pub id: String,
    pub org_id: String,
    pub name: String,
    pub connector_id: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    pub org_id: String,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    pub name: String,
}

/// Type-specific payload document a record links to through `IS_OF_TYPE`.
/// The payload detail (file blocks, mail headers, …) lives outside this core.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TypeDoc {
    pub id: String,
    pub record_type: RecordType,
}

/// Connector sync bookmark, owned by its App.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncPoint {
    pub id: String,
    pub connector_id: String,
}

/// A typed node, tagged by kind.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Node {
    User(User),
    Group(Group),
    RoleEntity(RoleEntity),
    Team(Team),
    Organization(Organization),
    Record(Record),
    RecordGroup(RecordGroup),
    App(App),
    TypeDoc(TypeDoc),
    SyncPoint(SyncPoint),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::User(_) => NodeKind::User,
            Node::Group(_) => NodeKind::Group,
            Node::RoleEntity(_) => NodeKind::RoleEntity,
            Node::Team(_) => NodeKind::Team,
            Node::Organization(_) => NodeKind::Organization,
            Node::Record(_) => NodeKind::Record,
            Node::RecordGroup(_) => NodeKind::RecordGroup,
            Node::App(_) => NodeKind::App,
            Node::TypeDoc(_) => NodeKind::TypeDoc,
            Node::SyncPoint(_) => NodeKind::SyncPoint,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Node::User(n) => &n.id,
            Node::Group(n) => &n.id,
            Node::RoleEntity(n) => &n.id,
            Node::Team(n) => &n.id,
            Node::Organization(n) => &n.id,
            Node::Record(n) => &n.id,
            Node::RecordGroup(n) => &n.id,
            Node::App(n) => &n.id,
            Node::TypeDoc(n) => &n.id,
            Node::SyncPoint(n) => &n.id,
        }
    }

    pub fn key(&self) -> NodeKey {
        NodeKey::new(self.kind(), self.id())
    }

    pub fn name(&self) -> &str {
        match self {
            Node::User(n) => &n.email,
            Node::Group(n) => &n.name,
            Node::RoleEntity(n) => &n.name,
            Node::Team(n) => &n.name,
            Node::Organization(n) => &n.name,
            Node::Record(n) => &n.name,
            Node::RecordGroup(n) => &n.name,
            Node::App(n) => &n.name,
            Node::TypeDoc(n) => &n.id,
            Node::SyncPoint(n) => &n.id,
        }
    }

    pub fn org_id(&self) -> Option<&str> {
        match self {
            Node::User(n) => Some(&n.org_id),
            Node::Group(n) => Some(&n.org_id),
            Node::RoleEntity(n) => Some(&n.org_id),
            Node::Team(n) => Some(&n.org_id),
            Node::Organization(n) => Some(&n.id),
            Node::Record(n) => Some(&n.org_id),
            Node::RecordGroup(n) => Some(&n.org_id),
            Node::App(n) => Some(&n.org_id),
            Node::TypeDoc(_) | Node::SyncPoint(_) => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Node::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_record_group(&self) -> Option<&RecordGroup> {
        match self {
            Node::RecordGroup(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_app(&self) -> Option<&App> {
        match self {
            Node::App(a) => Some(a),
            _ => None,
        }
    }

    /// Connector this node was synced from, when any.
    pub fn connector_id(&self) -> Option<&str> {
        match self {
            Node::Record(r) => r.connector_id.as_deref(),
            Node::RecordGroup(g) => g.connector_id.as_deref(),
            Node::Group(g) => g.connector_id.as_deref(),
            Node::RoleEntity(r) => r.connector_id.as_deref(),
            Node::App(a) => Some(&a.id),
            Node::SyncPoint(s) => Some(&s.connector_id),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Edges
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    Permission,
    BelongsTo,
    RecordRelation,
    InheritPermissions,
    IsOfType,
    AppAccess,
    EntityRelation,
}

impl EdgeKind {
    /// Every edge kind, in the order the cascading purge walks them.
    pub const ALL: [EdgeKind; 7] = [
        EdgeKind::Permission,
        EdgeKind::BelongsTo,
        EdgeKind::RecordRelation,
        EdgeKind::InheritPermissions,
        EdgeKind::IsOfType,
        EdgeKind::AppAccess,
        EdgeKind::EntityRelation,
    ];
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordRelation {
    ParentChild,
    Attachment,
}

/// Entity class a `BELONGS_TO` edge points into when it crosses out of the
/// content hierarchy.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityClass {
    Organization,
    KnowledgeBase,
}

/// Typed edge payload. The variant determines the [`EdgeKind`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "edgeKind", rename_all = "camelCase")]
pub enum EdgeBody {
    Permission {
        role: Role,
        grantor: PrincipalType,
    },
    BelongsTo {
        entity: Option<EntityClass>,
    },
    RecordRelation {
        relation: RecordRelation,
    },
    InheritPermissions,
    IsOfType,
    AppAccess,
    /// Free-form relation between two entities. Distinct `relation` values
    /// between the same pair coexist as separate edges.
    EntityRelation {
        relation: String,
        props: serde_json::Value,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Edge {
    pub from: NodeKey,
    pub to: NodeKey,
    pub body: EdgeBody,
}

/// Merge key for idempotent edge upserts: `(from, to, kind)`, plus the
/// relation discriminator for entity-relation edges.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EdgeMergeKey {
    pub from: NodeKey,
    pub to: NodeKey,
    pub kind: EdgeKind,
    pub discriminator: Option<String>,
}

impl Edge {
    pub fn new(from: NodeKey, to: NodeKey, body: EdgeBody) -> Self {
        Self { from, to, body }
    }

    pub fn permission(from: NodeKey, to: NodeKey, role: Role, grantor: PrincipalType) -> Self {
        Self::new(from, to, EdgeBody::Permission { role, grantor })
    }

    pub fn belongs_to(from: NodeKey, to: NodeKey) -> Self {
        Self::new(from, to, EdgeBody::BelongsTo { entity: None })
    }

    pub fn belongs_to_entity(from: NodeKey, to: NodeKey, entity: EntityClass) -> Self {
        Self::new(
            from,
            to,
            EdgeBody::BelongsTo {
                entity: Some(entity),
            },
        )
    }

    pub fn record_relation(from: NodeKey, to: NodeKey, relation: RecordRelation) -> Self {
        Self::new(from, to, EdgeBody::RecordRelation { relation })
    }

    pub fn inherit_permissions(from: NodeKey, to: NodeKey) -> Self {
        Self::new(from, to, EdgeBody::InheritPermissions)
    }

    pub fn is_of_type(from: NodeKey, to: NodeKey) -> Self {
        Self::new(from, to, EdgeBody::IsOfType)
    }

    pub fn app_access(from: NodeKey, to: NodeKey) -> Self {
        Self::new(from, to, EdgeBody::AppAccess)
    }

    pub fn entity_relation(
        from: NodeKey,
        to: NodeKey,
        relation: impl Into<String>,
        props: serde_json::Value,
    ) -> Self {
        Self::new(
            from,
            to,
            EdgeBody::EntityRelation {
                relation: relation.into(),
                props,
            },
        )
    }

    pub fn kind(&self) -> EdgeKind {
        match &self.body {
            EdgeBody::Permission { .. } => EdgeKind::Permission,
            EdgeBody::BelongsTo { .. } => EdgeKind::BelongsTo,
            EdgeBody::RecordRelation { .. } => EdgeKind::RecordRelation,
            EdgeBody::InheritPermissions => EdgeKind::InheritPermissions,
            EdgeBody::IsOfType => EdgeKind::IsOfType,
            EdgeBody::AppAccess => EdgeKind::AppAccess,
            EdgeBody::EntityRelation { .. } => EdgeKind::EntityRelation,
        }
    }

    pub fn merge_key(&self) -> EdgeMergeKey {
        let discriminator = match &self.body {
            EdgeBody::EntityRelation { relation, .. } => Some(relation.clone()),
            _ => None,
        };
        EdgeMergeKey {
            from: self.from.clone(),
            to: self.to.clone(),
            kind: self.kind(),
            discriminator,
        }
    }

    /// Role carried by a permission edge, if this is one.
    pub fn role(&self) -> Option<Role> {
        match &self.body {
            EdgeBody::Permission { role, .. } => Some(*role),
            _ => None,
        }
    }

    pub fn grantor(&self) -> Option<PrincipalType> {
        match &self.body {
            EdgeBody::Permission { grantor, .. } => Some(*grantor),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Pagination, sorting, filters
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page {
    pub skip: usize,
    pub limit: usize,
}

impl Page {
    pub fn new(skip: usize, limit: usize) -> Self {
        Self { skip, limit }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: 50,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    Name,
    CreatedAt,
    UpdatedAt,
    Size,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

/// Inclusive range filter, both bounds optional.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RangeFilter<T> {
    pub gte: Option<T>,
    pub lte: Option<T>,
}

impl<T: PartialOrd + Copy> RangeFilter<T> {
    pub fn contains(&self, value: Option<T>) -> bool {
        let Some(v) = value else {
            return self.gte.is_none() && self.lte.is_none();
        };
        if let Some(lo) = self.gte {
            if v < lo {
                return false;
            }
        }
        if let Some(hi) = self.lte {
            if v > hi {
                return false;
            }
        }
        true
    }
}

/// Outward node classification used by listings and search.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum NodeType {
    App,
    #[serde(rename = "kb")]
    KnowledgeBase,
    RecordGroup,
    Folder,
    Record,
}

impl NodeType {
    pub fn is_container(&self) -> bool {
        !matches!(self, NodeType::Record)
    }
}

/// Named optional filters applied after roles are resolved; none of them
/// re-derives access.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchFilters {
    pub search: Option<String>,
    pub node_types: Option<Vec<NodeType>>,
    pub record_types: Option<Vec<RecordType>>,
    pub origins: Option<Vec<Origin>>,
    pub connector_ids: Option<Vec<String>>,
    pub kb_ids: Option<Vec<String>>,
    pub indexing_status: Option<Vec<IndexingStatus>>,
    pub created_at: Option<RangeFilter<DateTime<Utc>>>,
    pub updated_at: Option<RangeFilter<DateTime<Utc>>>,
    pub size: Option<RangeFilter<i64>>,
    pub only_containers: bool,
}

impl SearchFilters {
    /// Attribute match against an already-summarized node. `only_containers`
    /// is handled by the caller as its own pre-pagination stage.
    pub fn matches(&self, node: &NodeSummary) -> bool {
        if let Some(q) = &self.search {
            if !node.name.to_lowercase().contains(&q.to_lowercase()) {
                return false;
            }
        }
        if let Some(kinds) = &self.node_types {
            if !kinds.contains(&node.node_type) {
                return false;
            }
        }
        if let Some(types) = &self.record_types {
            match node.record_type {
                Some(t) if types.contains(&t) => {}
                _ => return false,
            }
        }
        if let Some(origins) = &self.origins {
            match node.origin {
                Some(o) if origins.contains(&o) => {}
                _ => return false,
            }
        }
        if let Some(ids) = &self.connector_ids {
            match &node.connector {
                Some(c) if ids.contains(c) => {}
                _ => return false,
            }
        }
        if let Some(statuses) = &self.indexing_status {
            match node.indexing_status {
                Some(s) if statuses.contains(&s) => {}
                _ => return false,
            }
        }
        if let Some(range) = &self.created_at {
            if !range.contains(node.created_at) {
                return false;
            }
        }
        if let Some(range) = &self.updated_at {
            if !range.contains(node.updated_at) {
                return false;
            }
        }
        if let Some(range) = &self.size {
            if !range.contains(node.size_in_bytes) {
                return false;
            }
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Output shapes
// ---------------------------------------------------------------------------

/// Flattened node view handed across the library boundary.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeSummary {
    pub id: String,
    pub name: String,
    pub node_type: NodeType,
    pub parent_id: Option<String>,
    pub origin: Option<Origin>,
    pub connector: Option<String>,
    pub record_type: Option<RecordType>,
    pub indexing_status: Option<IndexingStatus>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub size_in_bytes: Option<i64>,
    pub mime_type: Option<String>,
    pub web_url: Option<String>,
    pub has_children: bool,
    pub user_role: Option<Role>,
}

impl NodeSummary {
    /// Outward classification of a node. Returns `None` for node kinds that
    /// never surface in listings (principals, payload docs, sync points).
    pub fn classify(node: &Node) -> Option<NodeType> {
        match node {
            Node::App(_) => Some(NodeType::App),
            Node::RecordGroup(g) if g.is_knowledge_base => Some(NodeType::KnowledgeBase),
            Node::RecordGroup(_) => Some(NodeType::RecordGroup),
            Node::Record(r) if r.is_container => Some(NodeType::Folder),
            Node::Record(_) => Some(NodeType::Record),
            _ => None,
        }
    }

    pub fn from_node(
        node: &Node,
        parent_id: Option<String>,
        has_children: bool,
        user_role: Option<Role>,
    ) -> Option<NodeSummary> {
        let node_type = Self::classify(node)?;
        let mut summary = NodeSummary {
            id: node.id().to_string(),
            name: node.name().to_string(),
            node_type,
            parent_id,
            origin: None,
            connector: None,
            record_type: None,
            indexing_status: None,
            created_at: None,
            updated_at: None,
            size_in_bytes: None,
            mime_type: None,
            web_url: None,
            has_children,
            user_role,
        };
        match node {
            Node::Record(r) => {
                summary.origin = Some(r.origin);
                summary.connector = r.connector_id.clone();
                summary.record_type = r.record_type;
                summary.indexing_status = r.indexing_status;
                summary.created_at = Some(r.created_at);
                summary.updated_at = Some(r.updated_at);
                summary.size_in_bytes = r.size_in_bytes;
                summary.mime_type = r.mime_type.clone();
                summary.web_url = r.web_url.clone();
            }
            Node::RecordGroup(g) => {
                summary.origin = Some(if g.is_knowledge_base {
                    Origin::Upload
                } else {
                    Origin::Connector
                });
                summary.connector = g.connector_id.clone();
                summary.created_at = Some(g.created_at);
                summary.updated_at = Some(g.updated_at);
                summary.web_url = g.web_url.clone();
            }
            Node::App(a) => {
                summary.connector = Some(a.id.clone());
                summary.created_at = Some(a.created_at);
                summary.updated_at = Some(a.updated_at);
            }
            _ => {}
        }
        Some(summary)
    }
}

/// One level of a breadcrumb trail.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Crumb {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    pub sub_kind: Option<NodeType>,
}

#[cfg(test)]
mod tests;
