use std::collections::BTreeSet;

use crate::cursor::Cursor;
use crate::loader::{LoadCompletion, LoadRequest};
use crate::node::{DatabaseId, NodeKind};
use crate::path::TreePath;
use crate::registry::RegistryEntry;
use crate::search::{Highlight, SearchInput, TreeSearch};
use crate::tree::{TreeChange, TreeState, VisibleRow};
use crate::viewport::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExplorerAction {
    MoveUp,
    MoveDown,
    PageUp,
    PageDown,
    Home,
    End,
    Expand,
    Collapse,
    Toggle,
    Activate,
    StartSearch,
    NextMatch,
    PrevMatch,
}

/// Work the caller has to carry out after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExplorerEffect {
    None,
    Load(LoadRequest),
    /// Qualified name of the activated column, for the query editor.
    Selected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// A visible row decorated with everything the renderer needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplorerRow {
    pub row: VisibleRow,
    pub selected: bool,
    pub highlight: Highlight,
    pub loading: bool,
}

/// Screen model for the schema tree: owns the tree, cursor, search and
/// viewport, and tracks which loads are in flight.
#[derive(Debug, Clone)]
pub struct Explorer {
    tree: TreeState,
    cursor: Cursor,
    search: TreeSearch,
    viewport: Viewport,
    pending: BTreeSet<LoadRequest>,
}

impl Explorer {
    #[must_use]
    pub fn new(entries: &[RegistryEntry], width: u16, height: u16) -> Self {
        Self {
            tree: TreeState::from_entries(entries),
            cursor: Cursor::new(),
            search: TreeSearch::new(),
            viewport: Viewport::new(width, height),
            pending: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn tree(&self) -> &TreeState {
        &self.tree
    }

    #[must_use]
    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    #[must_use]
    pub fn search(&self) -> &TreeSearch {
        &self.search
    }

    #[must_use]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    #[must_use]
    pub fn pending_loads(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_loading(&self, path: &TreePath) -> bool {
        self.tree
            .load_request_for(path)
            .is_some_and(|request| self.pending.contains(&request))
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.viewport.resize(width, height);
        self.sync_viewport();
    }

    pub fn apply(&mut self, action: ExplorerAction) -> ExplorerEffect {
        if self.tree.database_count() == 0 {
            return ExplorerEffect::None;
        }

        let effect = match action {
            ExplorerAction::MoveUp => {
                self.cursor.move_up(&self.tree);
                ExplorerEffect::None
            }
            ExplorerAction::MoveDown => {
                self.cursor.move_down(&self.tree);
                ExplorerEffect::None
            }
            ExplorerAction::PageUp => {
                for _ in 0..self.viewport.visible_height() {
                    if !self.cursor.move_up(&self.tree) {
                        break;
                    }
                }
                ExplorerEffect::None
            }
            ExplorerAction::PageDown => {
                for _ in 0..self.viewport.visible_height() {
                    if !self.cursor.move_down(&self.tree) {
                        break;
                    }
                }
                ExplorerEffect::None
            }
            ExplorerAction::Home => {
                self.cursor.set_path(TreePath::root(0));
                ExplorerEffect::None
            }
            ExplorerAction::End => {
                let last = TreePath::root(self.tree.database_count() - 1);
                self.cursor
                    .set_path(self.tree.last_visible_descendant(last));
                ExplorerEffect::None
            }
            ExplorerAction::Expand => {
                let change = self.tree.expand(&self.cursor);
                self.after_change(change)
            }
            ExplorerAction::Collapse => {
                let change = self.tree.collapse(&mut self.cursor);
                self.after_change(change)
            }
            ExplorerAction::Toggle => {
                let change = self.tree.toggle(&self.cursor);
                self.after_change(change)
            }
            ExplorerAction::Activate => match self.qualified_column_name() {
                Some(name) => ExplorerEffect::Selected(name),
                None => {
                    let change = self.tree.toggle(&self.cursor);
                    self.after_change(change)
                }
            },
            ExplorerAction::StartSearch => {
                self.search.enable();
                ExplorerEffect::None
            }
            ExplorerAction::NextMatch => {
                self.search.next_match(&mut self.cursor);
                ExplorerEffect::None
            }
            ExplorerAction::PrevMatch => {
                self.search.prev_match(&mut self.cursor);
                ExplorerEffect::None
            }
        };

        self.sync_viewport();
        effect
    }

    pub fn search_input(&mut self, input: SearchInput) {
        self.search.handle_input(input, &self.tree, &mut self.cursor);
        self.sync_viewport();
    }

    /// Applies a finished load. Failures produce a notice; results for nodes
    /// that no longer exist are logged and dropped.
    pub fn apply_completion(&mut self, completion: LoadCompletion) -> Option<Notice> {
        let LoadCompletion { request, result } = completion;
        self.pending.remove(&request);

        let children = match result {
            Ok(children) => children,
            Err(error) => {
                log::error!("failed to load {}: {error}", request.describe());
                return Some(Notice::error(format!(
                    "Could not load {}: {error}",
                    request.describe()
                )));
            }
        };

        if let Err(error) = self.tree.apply_loaded(&request, children) {
            log::warn!("discarding load result: {error}");
            return None;
        }
        log::debug!("applied {}", request.describe());
        self.settle_filled_siblings(&request);

        let clamped = self.tree.clamp_path(self.cursor.path());
        self.cursor.set_path(clamped);
        self.search.rescan(&self.tree);
        self.sync_viewport();
        None
    }

    /// A schema-wide column listing also loads sibling tables; their own
    /// requests no longer count as in flight.
    fn settle_filled_siblings(&mut self, applied: &LoadRequest) {
        let LoadRequest::Columns {
            database, schema, ..
        } = applied
        else {
            return;
        };
        let tree = &self.tree;
        self.pending.retain(|pending| match pending {
            LoadRequest::Columns {
                database: db,
                schema: s,
                table,
            } if db == database && s == schema => !table_is_loaded(tree, db, s, table),
            _ => true,
        });
    }

    /// Rows inside the viewport window, top to bottom.
    #[must_use]
    pub fn rows(&self) -> Vec<ExplorerRow> {
        let range = self.viewport.visible_range();
        let cursor = self.cursor.path();
        self.tree
            .visible_rows()
            .into_iter()
            .skip(range.start)
            .take(range.len())
            .map(|row| ExplorerRow {
                selected: row.path == cursor,
                highlight: self.search.highlight(&row.path),
                loading: self.is_loading(&row.path),
                row,
            })
            .collect()
    }

    /// Breadcrumb of names from the database down to the cursor.
    #[must_use]
    pub fn selection_label(&self) -> String {
        let path = self.cursor.path();
        (1..=path.len())
            .filter_map(|len| path.prefix(len))
            .filter_map(|prefix| self.tree.node(&prefix))
            .map(|node| node.name())
            .collect::<Vec<_>>()
            .join(" / ")
    }

    fn qualified_column_name(&self) -> Option<String> {
        if self.cursor.level() != NodeKind::Column {
            return None;
        }
        let schema = self.tree.current_schema(&self.cursor)?;
        let table = self.tree.current_table(&self.cursor)?;
        let column = self.tree.current_column(&self.cursor)?;
        Some(format!("{}.{}.{}", schema.name, table.name, column.name))
    }

    fn after_change(&mut self, change: TreeChange) -> ExplorerEffect {
        match change {
            TreeChange::Load(request) => {
                if self.pending.insert(request.clone()) {
                    log::debug!("requesting {}", request.describe());
                    ExplorerEffect::Load(request)
                } else {
                    ExplorerEffect::None
                }
            }
            TreeChange::Expanded | TreeChange::Collapsed => {
                self.search.rescan(&self.tree);
                ExplorerEffect::None
            }
            TreeChange::Unchanged => ExplorerEffect::None,
        }
    }

    fn sync_viewport(&mut self) {
        self.viewport.clamp_to(self.tree.visible_len());
        if let Some(row) = self.tree.row_of(&self.cursor.path()) {
            self.viewport.adjust_scroll_to_cursor(row);
        }
    }
}

fn table_is_loaded(tree: &TreeState, database: &DatabaseId, schema: &str, table: &str) -> bool {
    tree.find_database(database)
        .and_then(|db| {
            let s = tree.find_schema(db, schema)?;
            let t = tree.find_table(db, s, table)?;
            tree.table(db, s, t)
        })
        .is_some_and(|node| node.columns.is_materialized())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{Explorer, ExplorerAction, ExplorerEffect, NoticeLevel};
    use crate::loader::{LoadCompletion, LoadError, LoadRequest, LoadedChildren};
    use crate::node::{ChildState, DatabaseId, NodeRef};
    use crate::registry::RegistryEntry;
    use crate::search::{Highlight, SearchInput};
    use crate::test_support::{columns, entries, path, schemas, tables};

    fn explorer() -> Explorer {
        Explorer::new(&entries(), 80, 8)
    }

    fn children_for(request: &LoadRequest) -> LoadedChildren {
        match request {
            LoadRequest::Schemas { .. } => LoadedChildren::Schemas(schemas(&["public", "sales"])),
            LoadRequest::Tables { schema, .. } if schema == "public" => {
                LoadedChildren::Tables(tables(&["users", "orders"]))
            }
            LoadRequest::Tables { .. } => {
                LoadedChildren::Tables(tables(&["coordinates", "invoices"]))
            }
            LoadRequest::Columns { .. } => LoadedChildren::Columns(columns(&[
                ("users", "id email"),
                ("orders", "id total"),
                ("coordinates", "lat lng"),
            ])),
        }
    }

    fn complete(explorer: &mut Explorer, effect: ExplorerEffect) {
        let ExplorerEffect::Load(request) = effect else {
            panic!("expected a load request, got {effect:?}");
        };
        let result = Ok(children_for(&request));
        assert!(explorer
            .apply_completion(LoadCompletion { request, result })
            .is_none());
    }

    fn expand_all_of_first_database(explorer: &mut Explorer) {
        let effect = explorer.apply(ExplorerAction::Expand);
        complete(explorer, effect);
        explorer.apply(ExplorerAction::MoveDown);
        let effect = explorer.apply(ExplorerAction::Expand);
        complete(explorer, effect);
    }

    #[test]
    fn sibling_filled_by_column_load_is_no_longer_loading() {
        let mut explorer = explorer();
        expand_all_of_first_database(&mut explorer);

        explorer.apply(ExplorerAction::MoveDown);
        let ExplorerEffect::Load(users) = explorer.apply(ExplorerAction::Expand) else {
            panic!("users columns are not loaded yet");
        };
        explorer.apply(ExplorerAction::MoveDown);
        assert_eq!(explorer.cursor().path(), path(&[0, 0, 1]));
        let ExplorerEffect::Load(orders) = explorer.apply(ExplorerAction::Expand) else {
            panic!("orders columns are not loaded yet");
        };
        assert_eq!(explorer.pending_loads(), 2);

        let result = Ok(children_for(&users));
        assert!(explorer
            .apply_completion(LoadCompletion {
                request: users,
                result,
            })
            .is_none());
        assert_eq!(explorer.pending_loads(), 0);
        assert!(!explorer.is_loading(&path(&[0, 0, 1])));
        assert_eq!(explorer.cursor().path(), path(&[0, 0, 1]));

        let result = Ok(children_for(&orders));
        assert!(explorer
            .apply_completion(LoadCompletion {
                request: orders,
                result,
            })
            .is_none());
        let orders = explorer.tree().table(0, 0, 1).expect("orders exists");
        assert!(orders.columns.is_expanded());
        assert_eq!(orders.columns.len(), 2);
    }

    #[test]
    fn load_completion_after_cursor_moved_leaves_cursor_alone() {
        let mut explorer = Explorer::new(
            &[
                RegistryEntry::new("db0", "localhost", "db0"),
                RegistryEntry::new("db1", "localhost", "db1"),
            ],
            80,
            20,
        );

        let ExplorerEffect::Load(request) = explorer.apply(ExplorerAction::Expand) else {
            panic!("expanding an unloaded database should request schemas");
        };
        assert_eq!(
            request,
            LoadRequest::Schemas {
                database: DatabaseId::new("db0")
            }
        );
        explorer.apply(ExplorerAction::MoveDown);
        assert_eq!(explorer.cursor().path(), path(&[1]));

        explorer.apply_completion(LoadCompletion {
            request,
            result: Ok(LoadedChildren::Schemas(schemas(&["public", "sales"]))),
        });

        let db0 = explorer.tree().database(0).expect("db0 exists");
        let names = db0
            .schemas
            .children()
            .iter()
            .map(|schema| schema.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["public", "sales"]);
        assert!(db0.schemas.is_expanded());
        assert_eq!(explorer.cursor().path(), path(&[1]));
        assert_eq!(explorer.pending_loads(), 0);
    }

    #[test]
    fn duplicate_expands_issue_one_request_while_in_flight() {
        let mut explorer = explorer();
        assert!(matches!(
            explorer.apply(ExplorerAction::Expand),
            ExplorerEffect::Load(_)
        ));
        assert!(explorer.is_loading(&path(&[0])));
        assert_eq!(explorer.apply(ExplorerAction::Toggle), ExplorerEffect::None);
        assert_eq!(explorer.pending_loads(), 1);
        assert!(explorer.rows()[0].loading);
    }

    #[test]
    fn failed_load_notifies_once_and_allows_retry() {
        let mut explorer = explorer();
        let ExplorerEffect::Load(request) = explorer.apply(ExplorerAction::Expand) else {
            panic!("expected a load request");
        };

        let notice = explorer
            .apply_completion(LoadCompletion {
                request,
                result: Err(LoadError::backend("connection refused")),
            })
            .expect("failure should surface a notice");
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.message.contains("connection refused"));

        let db0 = explorer.tree().database(0).expect("db0 exists");
        assert_eq!(db0.schemas.state(), ChildState::Unloaded);
        assert!(!explorer.is_loading(&path(&[0])));
        assert!(matches!(
            explorer.apply(ExplorerAction::Expand),
            ExplorerEffect::Load(_)
        ));
    }

    #[test]
    fn stale_completion_is_discarded_without_notice() {
        let mut explorer = explorer();
        let before = explorer.tree().clone();
        let notice = explorer.apply_completion(LoadCompletion {
            request: LoadRequest::Tables {
                database: DatabaseId::new("db0"),
                schema: "gone".to_string(),
            },
            result: Ok(LoadedChildren::Tables(tables(&["t"]))),
        });
        assert!(notice.is_none());
        assert_eq!(explorer.tree(), &before);
    }

    #[test]
    fn completions_in_reverse_order_both_apply() {
        let mut explorer = explorer();
        let ExplorerEffect::Load(first) = explorer.apply(ExplorerAction::Expand) else {
            panic!("expected a load request");
        };
        explorer.apply(ExplorerAction::MoveDown);
        let ExplorerEffect::Load(second) = explorer.apply(ExplorerAction::Expand) else {
            panic!("expected a load request");
        };

        for request in [second, first] {
            let result = Ok(children_for(&request));
            explorer.apply_completion(LoadCompletion { request, result });
        }

        let rows = explorer.tree().visible_rows();
        assert_eq!(rows.len(), 6);
        assert_eq!(explorer.cursor().path(), path(&[1]));
        assert_eq!(explorer.tree().line_of(&explorer.cursor().path()), Some(4));
    }

    #[test]
    fn collapse_and_reexpand_never_reloads() {
        let mut explorer = explorer();
        expand_all_of_first_database(&mut explorer);
        assert_eq!(explorer.cursor().path(), path(&[0, 0]));

        assert_eq!(explorer.apply(ExplorerAction::Collapse), ExplorerEffect::None);
        assert_eq!(explorer.apply(ExplorerAction::Expand), ExplorerEffect::None);
        assert_eq!(explorer.pending_loads(), 0);
        assert_eq!(explorer.tree().visible_len(), 6);
    }

    #[test]
    fn activate_on_column_selects_qualified_name() {
        let mut explorer = explorer();
        expand_all_of_first_database(&mut explorer);
        explorer.apply(ExplorerAction::MoveDown);
        let effect = explorer.apply(ExplorerAction::Activate);
        complete(&mut explorer, effect);
        explorer.apply(ExplorerAction::MoveDown);
        explorer.apply(ExplorerAction::MoveDown);

        assert_eq!(explorer.cursor().path(), path(&[0, 0, 0, 1]));
        assert_eq!(
            explorer.apply(ExplorerAction::Activate),
            ExplorerEffect::Selected("public.users.email".to_string())
        );
        assert_eq!(explorer.selection_label(), "app / public / users / email");
    }

    #[test]
    fn page_and_end_keep_cursor_in_view() {
        let mut explorer = explorer();
        expand_all_of_first_database(&mut explorer);
        let visible_height = explorer.viewport().visible_height();
        assert_eq!(visible_height, 5);

        explorer.apply(ExplorerAction::End);
        assert_eq!(explorer.cursor().path(), path(&[1]));
        let rows = explorer.rows();
        assert_eq!(rows.len(), visible_height);
        assert!(rows.last().is_some_and(|row| row.selected));

        explorer.apply(ExplorerAction::PageUp);
        assert_eq!(explorer.cursor().path(), path(&[0]));
        assert_eq!(explorer.viewport().scroll_offset(), 0);

        explorer.apply(ExplorerAction::PageDown);
        assert_eq!(explorer.tree().row_of(&explorer.cursor().path()), Some(5));
        explorer.apply(ExplorerAction::Home);
        assert_eq!(explorer.cursor().path(), path(&[0]));
    }

    #[test]
    fn search_through_explorer_highlights_rows() {
        let mut explorer = explorer();
        expand_all_of_first_database(&mut explorer);
        explorer.apply(ExplorerAction::StartSearch);
        for ch in "ord".chars() {
            explorer.search_input(SearchInput::Char(ch));
        }
        explorer.search_input(SearchInput::Enter);
        assert!(!explorer.search().is_editing());
        assert_eq!(explorer.cursor().path(), path(&[0, 0, 1]));

        let current = explorer
            .rows()
            .into_iter()
            .find(|row| row.selected)
            .expect("cursor row is visible");
        assert_eq!(current.highlight, Highlight::Current);

        explorer.apply(ExplorerAction::NextMatch);
        assert_eq!(explorer.cursor().path(), path(&[0, 0, 1]));
    }

    #[test]
    fn empty_registry_ignores_actions() {
        let mut explorer = Explorer::new(&[], 80, 20);
        for action in [
            ExplorerAction::MoveDown,
            ExplorerAction::End,
            ExplorerAction::Expand,
            ExplorerAction::Collapse,
        ] {
            assert_eq!(explorer.apply(action), ExplorerEffect::None);
        }
        assert!(explorer.rows().is_empty());
        assert_eq!(explorer.selection_label(), "");
    }

    #[derive(Debug, Clone)]
    enum Step {
        Act(ExplorerAction),
        DeliverOldest,
        DeliverNewest,
        Fail,
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            4 => prop::sample::select(vec![
                ExplorerAction::MoveUp,
                ExplorerAction::MoveDown,
                ExplorerAction::PageUp,
                ExplorerAction::PageDown,
                ExplorerAction::Home,
                ExplorerAction::End,
                ExplorerAction::Expand,
                ExplorerAction::Collapse,
                ExplorerAction::Toggle,
                ExplorerAction::Activate,
                ExplorerAction::NextMatch,
            ])
            .prop_map(Step::Act),
            1 => Just(Step::DeliverOldest),
            1 => Just(Step::DeliverNewest),
            1 => Just(Step::Fail),
        ]
    }

    proptest! {
        #[test]
        fn cursor_stays_valid_under_interleaved_loads(steps in proptest::collection::vec(step(), 1..60)) {
            let mut explorer = explorer();
            let mut in_flight: Vec<LoadRequest> = Vec::new();

            for step in steps {
                match step {
                    Step::Act(action) => {
                        if let ExplorerEffect::Load(request) = explorer.apply(action) {
                            in_flight.push(request);
                        }
                    }
                    Step::DeliverOldest | Step::DeliverNewest | Step::Fail if in_flight.is_empty() => {}
                    Step::DeliverOldest => {
                        let request = in_flight.remove(0);
                        let result = Ok(children_for(&request));
                        explorer.apply_completion(LoadCompletion { request, result });
                    }
                    Step::DeliverNewest => {
                        let Some(request) = in_flight.pop() else { continue };
                        let result = Ok(children_for(&request));
                        explorer.apply_completion(LoadCompletion { request, result });
                    }
                    Step::Fail => {
                        let request = in_flight.remove(0);
                        let result = Err(LoadError::backend("timeout"));
                        let notice = explorer.apply_completion(LoadCompletion { request, result });
                        prop_assert!(notice.is_some());
                    }
                }

                let cursor = explorer.cursor().path();
                prop_assert!(explorer.tree().contains(&cursor));
                let row = explorer.tree().row_of(&cursor);
                prop_assert!(row.is_some());
                prop_assert!(explorer.viewport().visible_range().contains(&row.unwrap_or_default()));

                let mut consistent = true;
                explorer.tree().walk_visible(|_, node: NodeRef<'_>| {
                    if node.is_expanded() && !node.is_materialized() {
                        consistent = false;
                    }
                });
                prop_assert!(consistent);
            }
        }
    }
}
