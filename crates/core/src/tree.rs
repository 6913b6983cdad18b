use thiserror::Error;

use crate::cursor::Cursor;
use crate::loader::{ColumnsByTable, LoadRequest, LoadedChildren, SchemaInfo, TableInfo};
use crate::node::{
    Branch, ChildState, ColumnNode, DatabaseId, DatabaseNode, NodeKind, NodeRef, SchemaNode,
    TableNode,
};
use crate::path::TreePath;
use crate::registry::RegistryEntry;

/// Raised when a load completion names a node that is not in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("database `{0}` is not in the tree")]
    DatabaseNotFound(DatabaseId),
    #[error("schema `{schema}` is not loaded under `{database}`")]
    SchemaNotFound { database: DatabaseId, schema: String },
    #[error("table `{schema}.{table}` is not loaded under `{database}`")]
    TableNotFound {
        database: DatabaseId,
        schema: String,
        table: String,
    },
    #[error("load result does not match request for {0}")]
    MismatchedPayload(String),
}

/// What an expand/collapse/toggle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeChange {
    Unchanged,
    Expanded,
    Collapsed,
    /// Children were never fetched; nothing changed yet.
    Load(LoadRequest),
}

/// One drawn line of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleRow {
    pub path: TreePath,
    pub kind: NodeKind,
    pub name: String,
    pub detail: Option<String>,
    pub state: Option<ChildState>,
    pub offline: bool,
}

enum BranchMut<'a> {
    Schemas(&'a mut Branch<SchemaNode>),
    Tables(&'a mut Branch<TableNode>),
    Columns(&'a mut Branch<ColumnNode>),
}

impl BranchMut<'_> {
    fn expand(self) -> bool {
        match self {
            Self::Schemas(branch) => branch.expand(),
            Self::Tables(branch) => branch.expand(),
            Self::Columns(branch) => branch.expand(),
        }
    }

    fn collapse(self) -> bool {
        match self {
            Self::Schemas(branch) => branch.collapse(),
            Self::Tables(branch) => branch.collapse(),
            Self::Columns(branch) => branch.collapse(),
        }
    }
}

/// Owner of the database forest. Index lookups never fail loudly: an
/// out-of-range index yields `None` and mutations become no-ops.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeState {
    databases: Vec<DatabaseNode>,
}

impl TreeState {
    #[must_use]
    pub fn from_entries(entries: &[RegistryEntry]) -> Self {
        let databases = entries
            .iter()
            .map(|entry| {
                let mut node = DatabaseNode::new(
                    entry.id.clone(),
                    entry.database_name.clone(),
                    entry.host.clone(),
                );
                node.connected = entry.connected;
                node
            })
            .collect();
        Self { databases }
    }

    #[must_use]
    pub fn databases(&self) -> &[DatabaseNode] {
        &self.databases
    }

    #[must_use]
    pub fn database_count(&self) -> usize {
        self.databases.len()
    }

    #[must_use]
    pub fn database(&self, db: usize) -> Option<&DatabaseNode> {
        self.databases.get(db)
    }

    #[must_use]
    pub fn schema(&self, db: usize, schema: usize) -> Option<&SchemaNode> {
        self.database(db)?.schemas.get(schema)
    }

    #[must_use]
    pub fn table(&self, db: usize, schema: usize, table: usize) -> Option<&TableNode> {
        self.schema(db, schema)?.tables.get(table)
    }

    #[must_use]
    pub fn column(
        &self,
        db: usize,
        schema: usize,
        table: usize,
        column: usize,
    ) -> Option<&ColumnNode> {
        self.table(db, schema, table)?.columns.get(column)
    }

    #[must_use]
    pub fn node(&self, path: &TreePath) -> Option<NodeRef<'_>> {
        let (first, rest) = path.as_slice().split_first()?;
        let mut node = NodeRef::Database(self.databases.get(*first)?);
        for &index in rest {
            node = node.child(index)?;
        }
        Some(node)
    }

    #[must_use]
    pub fn contains(&self, path: &TreePath) -> bool {
        self.node(path).is_some()
    }

    /// Child count below `parent`, or the database count for `None`.
    #[must_use]
    pub fn children_len(&self, parent: Option<&TreePath>) -> usize {
        match parent {
            None => self.databases.len(),
            Some(path) => self.node(path).map_or(0, NodeRef::child_count),
        }
    }

    #[must_use]
    pub fn current_database(&self, cursor: &Cursor) -> Option<&DatabaseNode> {
        self.database(cursor.db_index()?)
    }

    #[must_use]
    pub fn current_schema(&self, cursor: &Cursor) -> Option<&SchemaNode> {
        self.schema(cursor.db_index()?, cursor.schema_index()?)
    }

    #[must_use]
    pub fn current_table(&self, cursor: &Cursor) -> Option<&TableNode> {
        self.table(
            cursor.db_index()?,
            cursor.schema_index()?,
            cursor.table_index()?,
        )
    }

    #[must_use]
    pub fn current_column(&self, cursor: &Cursor) -> Option<&ColumnNode> {
        self.column(
            cursor.db_index()?,
            cursor.schema_index()?,
            cursor.table_index()?,
            cursor.column_index()?,
        )
    }

    #[must_use]
    pub fn has_children(&self, cursor: &Cursor) -> bool {
        self.node(&cursor.path())
            .is_some_and(|node| node.child_count() > 0)
    }

    #[must_use]
    pub fn is_expanded(&self, cursor: &Cursor) -> bool {
        self.node(&cursor.path()).is_some_and(NodeRef::is_expanded)
    }

    pub fn expand(&mut self, cursor: &Cursor) -> TreeChange {
        self.expand_path(cursor.path())
    }

    pub fn expand_path(&mut self, path: TreePath) -> TreeChange {
        match self.node(&path).and_then(NodeRef::state) {
            None | Some(ChildState::Expanded) => TreeChange::Unchanged,
            Some(ChildState::Unloaded) => self
                .load_request_for(&path)
                .map_or(TreeChange::Unchanged, TreeChange::Load),
            Some(ChildState::Collapsed) => {
                if self.branch_mut(&path).is_some_and(BranchMut::expand) {
                    TreeChange::Expanded
                } else {
                    TreeChange::Unchanged
                }
            }
        }
    }

    /// Collapses the node under the cursor if it is expanded; otherwise
    /// collapses the nearest expanded ancestor and moves the cursor onto it,
    /// so repeated collapses walk up the hierarchy.
    pub fn collapse(&mut self, cursor: &mut Cursor) -> TreeChange {
        let path = cursor.path();
        if self.collapse_path(path) {
            return TreeChange::Collapsed;
        }

        let mut candidate = path.parent();
        while let Some(ancestor) = candidate {
            if self.collapse_path(ancestor) {
                cursor.set_path(ancestor);
                return TreeChange::Collapsed;
            }
            candidate = ancestor.parent();
        }
        TreeChange::Unchanged
    }

    pub fn toggle(&mut self, cursor: &Cursor) -> TreeChange {
        let path = cursor.path();
        if self.collapse_path(path) {
            return TreeChange::Collapsed;
        }
        self.expand_path(path)
    }

    fn collapse_path(&mut self, path: TreePath) -> bool {
        self.branch_mut(&path).is_some_and(BranchMut::collapse)
    }

    fn branch_mut(&mut self, path: &TreePath) -> Option<BranchMut<'_>> {
        match *path.as_slice() {
            [db] => self
                .databases
                .get_mut(db)
                .map(|database| BranchMut::Schemas(&mut database.schemas)),
            [db, schema] => self
                .databases
                .get_mut(db)?
                .schemas
                .get_mut(schema)
                .map(|schema| BranchMut::Tables(&mut schema.tables)),
            [db, schema, table] => self
                .databases
                .get_mut(db)?
                .schemas
                .get_mut(schema)?
                .tables
                .get_mut(table)
                .map(|table| BranchMut::Columns(&mut table.columns)),
            _ => None,
        }
    }

    /// The request that would materialize the children of `path`.
    #[must_use]
    pub fn load_request_for(&self, path: &TreePath) -> Option<LoadRequest> {
        match *path.as_slice() {
            [db] => Some(LoadRequest::Schemas {
                database: self.database(db)?.id.clone(),
            }),
            [db, schema] => Some(LoadRequest::Tables {
                database: self.database(db)?.id.clone(),
                schema: self.schema(db, schema)?.name.clone(),
            }),
            [db, schema, table] => Some(LoadRequest::Columns {
                database: self.database(db)?.id.clone(),
                schema: self.schema(db, schema)?.name.clone(),
                table: self.table(db, schema, table)?.name.clone(),
            }),
            _ => None,
        }
    }

    #[must_use]
    pub fn find_database(&self, id: &DatabaseId) -> Option<usize> {
        self.databases.iter().position(|database| &database.id == id)
    }

    #[must_use]
    pub fn find_schema(&self, db: usize, name: &str) -> Option<usize> {
        self.database(db)?
            .schemas
            .children()
            .iter()
            .position(|schema| schema.name == name)
    }

    #[must_use]
    pub fn find_table(&self, db: usize, schema: usize, name: &str) -> Option<usize> {
        self.schema(db, schema)?
            .tables
            .children()
            .iter()
            .position(|table| table.name == name)
    }

    fn database_by_id_mut(&mut self, id: &DatabaseId) -> Result<&mut DatabaseNode, TreeError> {
        self.databases
            .iter_mut()
            .find(|database| &database.id == id)
            .ok_or_else(|| TreeError::DatabaseNotFound(id.clone()))
    }

    fn schema_by_name_mut(
        &mut self,
        id: &DatabaseId,
        schema: &str,
    ) -> Result<&mut SchemaNode, TreeError> {
        self.database_by_id_mut(id)?
            .schemas
            .iter_mut()
            .find(|node| node.name == schema)
            .ok_or_else(|| TreeError::SchemaNotFound {
                database: id.clone(),
                schema: schema.to_string(),
            })
    }

    pub fn set_schemas(
        &mut self,
        id: &DatabaseId,
        schemas: Vec<SchemaInfo>,
    ) -> Result<(), TreeError> {
        let database = self.database_by_id_mut(id)?;
        database
            .schemas
            .replace(schemas.into_iter().map(SchemaNode::from).collect());
        database.connected = true;
        Ok(())
    }

    pub fn set_tables(
        &mut self,
        id: &DatabaseId,
        schema: &str,
        tables: Vec<TableInfo>,
    ) -> Result<(), TreeError> {
        self.schema_by_name_mut(id, schema)?
            .tables
            .replace(tables.into_iter().map(TableNode::from).collect());
        Ok(())
    }

    /// Applies a schema-wide column listing. `expand_table` gets its columns
    /// replaced and expanded; other unloaded tables named in `columns` become
    /// materialized and stay collapsed. Tables that already hold columns keep
    /// them. A target the listing omits expands with no columns.
    pub fn set_columns(
        &mut self,
        id: &DatabaseId,
        schema: &str,
        mut columns: ColumnsByTable,
        expand_table: Option<&str>,
    ) -> Result<(), TreeError> {
        let schema_node = self.schema_by_name_mut(id, schema)?;
        if let Some(target) = expand_table {
            if !schema_node
                .tables
                .children()
                .iter()
                .any(|table| table.name == target)
            {
                return Err(TreeError::TableNotFound {
                    database: id.clone(),
                    schema: schema.to_string(),
                    table: target.to_string(),
                });
            }
        }

        for table in schema_node.tables.iter_mut() {
            let is_target = expand_table == Some(table.name.as_str());
            match columns.remove(&table.name) {
                Some(listed) => {
                    let nodes = listed.into_iter().map(ColumnNode::from).collect();
                    if is_target {
                        table.columns.replace(nodes);
                    } else {
                        table.columns.fill(nodes);
                    }
                }
                None if is_target => table.columns.replace(Vec::new()),
                None => {}
            }
        }
        Ok(())
    }

    /// Routes a finished load to the matching `set_*` call.
    pub fn apply_loaded(
        &mut self,
        request: &LoadRequest,
        children: LoadedChildren,
    ) -> Result<(), TreeError> {
        match (request, children) {
            (LoadRequest::Schemas { database }, LoadedChildren::Schemas(schemas)) => {
                self.set_schemas(database, schemas)
            }
            (LoadRequest::Tables { database, schema }, LoadedChildren::Tables(tables)) => {
                self.set_tables(database, schema, tables)
            }
            (
                LoadRequest::Columns {
                    database,
                    schema,
                    table,
                },
                LoadedChildren::Columns(columns),
            ) => self.set_columns(database, schema, columns, Some(table)),
            (request, _) => Err(TreeError::MismatchedPayload(request.describe())),
        }
    }

    /// Extends `path` through expanded nodes, always taking the last child.
    #[must_use]
    pub fn last_visible_descendant(&self, path: TreePath) -> TreePath {
        let mut path = path;
        while let Some(node) = self.node(&path) {
            if !node.shows_children() {
                break;
            }
            let Some(next) = path.child(node.child_count() - 1) else {
                break;
            };
            path = next;
        }
        path
    }

    /// Nearest visible node to `path`: the longest prefix that still resolves
    /// through expanded parents, with an out-of-range index pulled back to the
    /// last child at that level.
    #[must_use]
    pub fn clamp_path(&self, path: TreePath) -> TreePath {
        let first = path.get(0).unwrap_or(0);
        let mut clamped = TreePath::root(first.min(self.databases.len().saturating_sub(1)));
        if first >= self.databases.len() {
            return clamped;
        }

        for depth in 1..path.len() {
            let Some(node) = self.node(&clamped) else {
                break;
            };
            if !node.shows_children() {
                break;
            }
            let requested = path.get(depth).unwrap_or(0);
            let index = requested.min(node.child_count() - 1);
            if !clamped.push(index) || index != requested {
                break;
            }
        }
        clamped
    }

    /// Depth-first pre-order walk over every node whose ancestors are all
    /// expanded. Search, line numbering and drawing all go through here.
    pub fn walk_visible<'a>(&'a self, mut visit: impl FnMut(TreePath, NodeRef<'a>)) {
        for (index, database) in self.databases.iter().enumerate() {
            walk_node(TreePath::root(index), NodeRef::Database(database), &mut visit);
        }
    }

    #[must_use]
    pub fn visible_rows(&self) -> Vec<VisibleRow> {
        let mut rows = Vec::new();
        self.walk_visible(|path, node| {
            rows.push(VisibleRow {
                path,
                kind: node.kind(),
                name: node.name().to_string(),
                detail: node.detail(),
                state: node.state(),
                offline: matches!(node, NodeRef::Database(database) if !database.connected),
            });
        });
        rows
    }

    #[must_use]
    pub fn visible_paths(&self) -> Vec<TreePath> {
        let mut paths = Vec::new();
        self.walk_visible(|path, _| paths.push(path));
        paths
    }

    #[must_use]
    pub fn visible_len(&self) -> usize {
        let mut count = 0;
        self.walk_visible(|_, _| count += 1);
        count
    }

    /// Zero-based position of `path` among the visible rows.
    #[must_use]
    pub fn row_of(&self, path: &TreePath) -> Option<usize> {
        let mut position = 0;
        let mut found = None;
        self.walk_visible(|candidate, _| {
            if found.is_none() {
                if candidate == *path {
                    found = Some(position);
                }
                position += 1;
            }
        });
        found
    }

    /// One-based line number of `path`; the first database is line 1.
    #[must_use]
    pub fn line_of(&self, path: &TreePath) -> Option<usize> {
        self.row_of(path).map(|row| row + 1)
    }
}

fn walk_node<'a, F>(path: TreePath, node: NodeRef<'a>, visit: &mut F)
where
    F: FnMut(TreePath, NodeRef<'a>),
{
    visit(path, node);
    if !node.is_expanded() {
        return;
    }
    for index in 0..node.child_count() {
        if let (Some(child), Some(child_path)) = (node.child(index), path.child(index)) {
            walk_node(child_path, child, visit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{TreeChange, TreeError, TreeState};
    use crate::cursor::Cursor;
    use crate::loader::{LoadRequest, LoadedChildren};
    use crate::node::{ChildState, DatabaseId, NodeKind};
    use crate::path::TreePath;
    use crate::test_support::{columns, path, sample_tree, schemas, tables, two_databases};

    fn names(tree: &TreeState) -> Vec<String> {
        tree.visible_rows().into_iter().map(|row| row.name).collect()
    }

    #[test]
    fn lookups_return_none_out_of_range() {
        let tree = sample_tree();
        assert!(tree.database(2).is_none());
        assert!(tree.schema(0, 9).is_none());
        assert!(tree.table(1, 0, 0).is_none());
        assert!(tree.column(0, 0, 0, 2).is_none());
        assert_eq!(tree.column(0, 0, 0, 1).map(|c| c.name.as_str()), Some("email"));
        assert!(tree.node(&path(&[0, 0, 5])).is_none());
    }

    #[test]
    fn current_lookups_stop_at_cursor_depth() {
        let tree = sample_tree();
        let cursor = Cursor::at(path(&[0, 1]));
        assert_eq!(tree.current_database(&cursor).map(|d| d.name.as_str()), Some("app"));
        assert_eq!(tree.current_schema(&cursor).map(|s| s.name.as_str()), Some("sales"));
        assert!(tree.current_table(&cursor).is_none());
        assert!(tree.current_column(&cursor).is_none());
    }

    #[test]
    fn columns_never_report_children() {
        let tree = sample_tree();
        let cursor = Cursor::at(path(&[0, 0, 0, 0]));
        assert!(!tree.has_children(&cursor));
        assert!(!tree.is_expanded(&cursor));
        assert!(tree.has_children(&Cursor::at(path(&[0, 0, 0]))));
    }

    #[test]
    fn expanding_unmaterialized_node_requests_a_load_without_mutating() {
        let mut tree = two_databases();
        let before = tree.clone();

        let change = tree.expand(&Cursor::at(path(&[0])));
        assert_eq!(
            change,
            TreeChange::Load(LoadRequest::Schemas {
                database: DatabaseId::new("db0")
            })
        );
        assert_eq!(tree, before);
    }

    #[test]
    fn expand_requests_carry_identifiers_for_each_level() {
        let mut tree = sample_tree();
        assert_eq!(
            tree.expand(&Cursor::at(path(&[0, 1, 0]))),
            TreeChange::Load(LoadRequest::Columns {
                database: DatabaseId::new("db0"),
                schema: "sales".to_string(),
                table: "coordinates".to_string(),
            })
        );
        assert_eq!(
            tree.expand(&Cursor::at(path(&[0, 0, 0, 0]))),
            TreeChange::Unchanged
        );
    }

    #[test]
    fn collapse_then_expand_restores_children_without_loading() {
        let mut tree = sample_tree();
        let mut cursor = Cursor::at(path(&[0, 0]));
        let before = names(&tree);

        assert_eq!(tree.collapse(&mut cursor), TreeChange::Collapsed);
        assert_eq!(cursor.path(), path(&[0, 0]));
        assert!(!tree.is_expanded(&cursor));
        assert_eq!(tree.expand(&cursor), TreeChange::Expanded);
        assert_eq!(names(&tree), before);
    }

    #[test]
    fn collapse_on_unexpanded_table_collapses_schema_and_moves_up() {
        let mut tree = sample_tree();
        let mut cursor = Cursor::at(path(&[0, 0, 1]));

        assert_eq!(tree.collapse(&mut cursor), TreeChange::Collapsed);
        assert_eq!(cursor.path(), path(&[0, 0]));
        assert_eq!(
            tree.schema(0, 0).map(|schema| schema.tables.state()),
            Some(ChildState::Collapsed)
        );
    }

    #[test]
    fn repeated_collapse_walks_up_to_the_database() {
        let mut tree = sample_tree();
        let mut cursor = Cursor::at(path(&[0, 0, 0, 1]));

        tree.collapse(&mut cursor);
        assert_eq!(cursor.path(), path(&[0, 0, 0]));
        tree.collapse(&mut cursor);
        assert_eq!(cursor.path(), path(&[0, 0]));
        tree.collapse(&mut cursor);
        assert_eq!(cursor.path(), path(&[0]));
        tree.collapse(&mut cursor);
        assert_eq!(cursor.path(), path(&[0]));
        assert_eq!(tree.collapse(&mut cursor), TreeChange::Unchanged);
    }

    #[test]
    fn toggle_twice_restores_expansion() {
        let mut tree = sample_tree();
        let cursor = Cursor::at(path(&[0, 1]));
        assert_eq!(tree.toggle(&cursor), TreeChange::Collapsed);
        assert_eq!(tree.toggle(&cursor), TreeChange::Expanded);
        assert!(tree.is_expanded(&cursor));

        let collapsed = Cursor::at(path(&[0, 0, 1]));
        assert_eq!(tree.toggle(&collapsed), TreeChange::Expanded);
        assert_eq!(tree.toggle(&collapsed), TreeChange::Collapsed);
    }

    #[test]
    fn set_schemas_resolves_database_by_id() {
        let mut tree = two_databases();
        tree.set_schemas(&DatabaseId::new("db0"), schemas(&["public", "sales"]))
            .expect("db0 exists");

        let database = tree.database(0).expect("db0 exists");
        assert!(database.schemas.is_expanded());
        assert!(database.connected);
        assert_eq!(names(&tree), vec!["db0", "public", "sales", "db1"]);
    }

    #[test]
    fn set_columns_reports_missing_targets() {
        let mut tree = sample_tree();
        let err = tree
            .set_columns(&DatabaseId::new("nope"), "public", columns(&[]), None)
            .expect_err("unknown database");
        assert_eq!(err, TreeError::DatabaseNotFound(DatabaseId::new("nope")));

        let before = tree.clone();
        let err = tree
            .set_columns(&DatabaseId::new("db0"), "missing", columns(&[]), None)
            .expect_err("unknown schema");
        assert!(matches!(err, TreeError::SchemaNotFound { .. }));

        let err = tree
            .set_columns(
                &DatabaseId::new("db0"),
                "public",
                columns(&[("users", "id")]),
                Some("ghost"),
            )
            .expect_err("unknown table");
        assert!(matches!(err, TreeError::TableNotFound { .. }));
        assert_eq!(tree, before);
    }

    #[test]
    fn set_columns_fills_siblings_and_expands_only_the_target() {
        let mut tree = sample_tree();
        tree.set_columns(
            &DatabaseId::new("db0"),
            "sales",
            columns(&[("coordinates", "lat lng"), ("invoices", "id")]),
            Some("invoices"),
        )
        .expect("sales exists");

        let coordinates = tree.table(0, 1, 0).expect("coordinates exists");
        assert_eq!(coordinates.columns.state(), ChildState::Collapsed);
        assert_eq!(coordinates.columns.len(), 2);
        let invoices = tree.table(0, 1, 1).expect("invoices exists");
        assert!(invoices.columns.is_expanded());

        assert_eq!(
            tree.expand(&Cursor::at(path(&[0, 1, 0]))),
            TreeChange::Expanded
        );
    }

    #[test]
    fn column_load_keeps_columns_of_loaded_siblings() {
        let mut tree = sample_tree();
        tree.set_columns(
            &DatabaseId::new("db0"),
            "public",
            columns(&[("users", "only"), ("orders", "a")]),
            Some("orders"),
        )
        .expect("public exists");

        let users = tree.table(0, 0, 0).expect("users exists");
        assert!(users.columns.is_expanded());
        let kept = users
            .columns
            .children()
            .iter()
            .map(|column| column.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(kept, vec!["id", "email"]);

        let orders = tree.table(0, 0, 1).expect("orders exists");
        assert!(orders.columns.is_expanded());
        assert_eq!(orders.columns.len(), 1);
    }

    #[test]
    fn table_missing_from_listing_expands_empty() {
        let mut tree = sample_tree();
        tree.set_columns(&DatabaseId::new("db0"), "sales", columns(&[]), Some("coordinates"))
            .expect("sales exists");
        let coordinates = tree.table(0, 1, 0).expect("coordinates exists");
        assert!(coordinates.columns.is_expanded());
        assert!(coordinates.columns.is_empty());
        assert!(tree.table(0, 1, 1).is_some_and(|t| !t.columns.is_materialized()));
    }

    #[test]
    fn apply_loaded_rejects_mismatched_payloads() {
        let mut tree = two_databases();
        let request = LoadRequest::Schemas {
            database: DatabaseId::new("db0"),
        };
        let err = tree
            .apply_loaded(&request, LoadedChildren::Tables(tables(&["users"])))
            .expect_err("payload does not match");
        assert!(matches!(err, TreeError::MismatchedPayload(_)));
    }

    #[test]
    fn last_visible_descendant_follows_last_expanded_children() {
        let mut tree = sample_tree();
        assert_eq!(tree.last_visible_descendant(path(&[0])), path(&[0, 1, 1]));
        assert_eq!(tree.last_visible_descendant(path(&[0, 0])), path(&[0, 0, 1]));
        assert_eq!(tree.last_visible_descendant(path(&[1])), path(&[1]));

        tree.set_columns(&DatabaseId::new("db0"), "public", columns(&[]), Some("orders"))
            .expect("public exists");
        assert_eq!(tree.last_visible_descendant(path(&[0, 0])), path(&[0, 0, 1]));
    }

    #[test]
    fn clamp_path_keeps_longest_resolvable_prefix() {
        let mut tree = sample_tree();
        assert_eq!(tree.clamp_path(path(&[0, 0, 0, 1])), path(&[0, 0, 0, 1]));
        assert_eq!(tree.clamp_path(path(&[0, 0, 9, 3])), path(&[0, 0, 1]));
        assert_eq!(tree.clamp_path(path(&[7])), path(&[1]));
        assert_eq!(tree.clamp_path(path(&[1, 0])), path(&[1]));

        let mut cursor = Cursor::at(path(&[0, 0]));
        tree.collapse(&mut cursor);
        assert_eq!(tree.clamp_path(path(&[0, 0, 0, 1])), path(&[0, 0]));
    }

    #[test]
    fn visible_rows_follow_pre_order_and_skip_collapsed_subtrees() {
        let tree = sample_tree();
        assert_eq!(
            names(&tree),
            vec![
                "app",
                "public",
                "users",
                "id",
                "email",
                "orders",
                "sales",
                "coordinates",
                "invoices",
                "analytics"
            ]
        );
        let rows = tree.visible_rows();
        assert_eq!(rows[3].kind, NodeKind::Column);
        assert_eq!(rows[3].detail.as_deref(), Some("int"));
        assert!(!rows[0].offline);
        assert!(rows[9].offline);
    }

    #[test]
    fn line_numbers_start_at_one_and_increase() {
        let tree = sample_tree();
        assert_eq!(tree.line_of(&path(&[0])), Some(1));
        assert_eq!(tree.line_of(&path(&[0, 1])), Some(7));
        assert_eq!(tree.line_of(&path(&[1])), Some(10));
        assert_eq!(tree.line_of(&path(&[0, 0, 1, 0])), None);

        let lines = tree
            .visible_paths()
            .iter()
            .map(|p| tree.line_of(p).expect("visible path has a line"))
            .collect::<Vec<_>>();
        assert!(lines.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(tree.visible_len(), lines.len());
    }

    #[test]
    fn find_helpers_resolve_names_to_indices() {
        let tree = sample_tree();
        assert_eq!(tree.find_database(&DatabaseId::new("db1")), Some(1));
        assert_eq!(tree.find_schema(0, "sales"), Some(1));
        assert_eq!(tree.find_table(0, 1, "invoices"), Some(1));
        assert!(tree.find_table(0, 1, "users").is_none());
        assert_eq!(tree.children_len(None), 2);
        assert_eq!(tree.children_len(Some(&TreePath::root(0))), 2);
    }
}
