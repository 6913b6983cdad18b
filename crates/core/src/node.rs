use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identity of a configured connection. Load completions address their
/// database through this, never through an index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatabaseId(String);

impl DatabaseId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatabaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    Database,
    Schema,
    Table,
    Column,
}

impl NodeKind {
    #[must_use]
    pub fn from_depth(depth: usize) -> Option<Self> {
        match depth {
            0 => Some(Self::Database),
            1 => Some(Self::Schema),
            2 => Some(Self::Table),
            3 => Some(Self::Column),
            _ => None,
        }
    }

    #[must_use]
    pub fn depth(self) -> usize {
        match self {
            Self::Database => 0,
            Self::Schema => 1,
            Self::Table => 2,
            Self::Column => 3,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::Schema => "schema",
            Self::Table => "table",
            Self::Column => "column",
        }
    }
}

/// Load and expansion state of a node's children.
///
/// Expansion requires a completed load, so an unmaterialized node can never
/// report itself as expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChildState {
    #[default]
    Unloaded,
    Collapsed,
    Expanded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch<T> {
    state: ChildState,
    children: Vec<T>,
}

impl<T> Default for Branch<T> {
    fn default() -> Self {
        Self {
            state: ChildState::Unloaded,
            children: Vec::new(),
        }
    }
}

impl<T> Branch<T> {
    #[must_use]
    pub fn state(&self) -> ChildState {
        self.state
    }

    #[must_use]
    pub fn is_materialized(&self) -> bool {
        !matches!(self.state, ChildState::Unloaded)
    }

    #[must_use]
    pub fn is_expanded(&self) -> bool {
        matches!(self.state, ChildState::Expanded)
    }

    #[must_use]
    pub fn children(&self) -> &[T] {
        &self.children
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.children.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.children.get_mut(index)
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.children.iter_mut()
    }

    /// Returns whether the state changed. Unloaded branches stay unloaded.
    pub(crate) fn expand(&mut self) -> bool {
        if self.state == ChildState::Collapsed {
            self.state = ChildState::Expanded;
            return true;
        }
        false
    }

    pub(crate) fn collapse(&mut self) -> bool {
        if self.state == ChildState::Expanded {
            self.state = ChildState::Collapsed;
            return true;
        }
        false
    }

    /// Replaces the children and leaves the branch expanded.
    pub(crate) fn replace(&mut self, children: Vec<T>) {
        self.children = children;
        self.state = ChildState::Expanded;
    }

    /// Materializes an unloaded branch as collapsed. Returns `false` and keeps
    /// the current children when the branch was already loaded.
    pub(crate) fn fill(&mut self, children: Vec<T>) -> bool {
        if self.is_materialized() {
            return false;
        }
        self.children = children;
        self.state = ChildState::Collapsed;
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseNode {
    pub id: DatabaseId,
    pub name: String,
    pub host: String,
    pub connected: bool,
    pub schemas: Branch<SchemaNode>,
}

impl DatabaseNode {
    #[must_use]
    pub fn new(id: DatabaseId, name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            host: host.into(),
            connected: false,
            schemas: Branch::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaNode {
    pub name: String,
    pub tables: Branch<TableNode>,
}

impl SchemaNode {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Branch::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNode {
    pub name: String,
    pub columns: Branch<ColumnNode>,
}

impl TableNode {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Branch::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNode {
    pub name: String,
    pub data_type: String,
    pub max_length: Option<u64>,
}

impl ColumnNode {
    #[must_use]
    pub fn type_label(&self) -> String {
        match self.max_length {
            Some(length) => format!("{}({length})", self.data_type),
            None => self.data_type.clone(),
        }
    }
}

/// Borrowed view of a node of any kind.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Database(&'a DatabaseNode),
    Schema(&'a SchemaNode),
    Table(&'a TableNode),
    Column(&'a ColumnNode),
}

impl<'a> NodeRef<'a> {
    #[must_use]
    pub fn kind(self) -> NodeKind {
        match self {
            Self::Database(_) => NodeKind::Database,
            Self::Schema(_) => NodeKind::Schema,
            Self::Table(_) => NodeKind::Table,
            Self::Column(_) => NodeKind::Column,
        }
    }

    #[must_use]
    pub fn name(self) -> &'a str {
        match self {
            Self::Database(database) => &database.name,
            Self::Schema(schema) => &schema.name,
            Self::Table(table) => &table.name,
            Self::Column(column) => &column.name,
        }
    }

    #[must_use]
    pub fn state(self) -> Option<ChildState> {
        match self {
            Self::Database(database) => Some(database.schemas.state()),
            Self::Schema(schema) => Some(schema.tables.state()),
            Self::Table(table) => Some(table.columns.state()),
            Self::Column(_) => None,
        }
    }

    #[must_use]
    pub fn is_expanded(self) -> bool {
        matches!(self.state(), Some(ChildState::Expanded))
    }

    #[must_use]
    pub fn is_materialized(self) -> bool {
        matches!(
            self.state(),
            Some(ChildState::Collapsed | ChildState::Expanded)
        )
    }

    #[must_use]
    pub fn child_count(self) -> usize {
        match self {
            Self::Database(database) => database.schemas.len(),
            Self::Schema(schema) => schema.tables.len(),
            Self::Table(table) => table.columns.len(),
            Self::Column(_) => 0,
        }
    }

    #[must_use]
    pub fn child(self, index: usize) -> Option<NodeRef<'a>> {
        match self {
            Self::Database(database) => database.schemas.get(index).map(NodeRef::Schema),
            Self::Schema(schema) => schema.tables.get(index).map(NodeRef::Table),
            Self::Table(table) => table.columns.get(index).map(NodeRef::Column),
            Self::Column(_) => None,
        }
    }

    /// True when the node's children are currently drawn below it.
    #[must_use]
    pub fn shows_children(self) -> bool {
        self.is_expanded() && self.child_count() > 0
    }

    /// Secondary text drawn after the name: host for databases, type for columns.
    #[must_use]
    pub fn detail(self) -> Option<String> {
        match self {
            Self::Database(database) => Some(database.host.clone()),
            Self::Column(column) => Some(column.type_label()),
            Self::Schema(_) | Self::Table(_) => None,
        }
    }
}
