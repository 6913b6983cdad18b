use crate::node::NodeKind;
use crate::path::TreePath;
use crate::tree::TreeState;

/// The focused node. Movement follows what is drawn, so it depends on the
/// expansion state of the tree it is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    path: TreePath,
}

impl Cursor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn at(path: TreePath) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> TreePath {
        self.path
    }

    pub fn set_path(&mut self, path: TreePath) {
        self.path = path;
    }

    #[must_use]
    pub fn level(&self) -> NodeKind {
        self.path.level()
    }

    #[must_use]
    pub fn db_index(&self) -> Option<usize> {
        self.path.get(0)
    }

    #[must_use]
    pub fn schema_index(&self) -> Option<usize> {
        self.path.get(1)
    }

    #[must_use]
    pub fn table_index(&self) -> Option<usize> {
        self.path.get(2)
    }

    #[must_use]
    pub fn column_index(&self) -> Option<usize> {
        self.path.get(3)
    }

    /// Number of nodes sharing the cursor's ancestor at `depth`.
    #[must_use]
    pub fn sibling_count(&self, tree: &TreeState, depth: usize) -> usize {
        if depth == 0 {
            return tree.database_count();
        }
        self.path
            .prefix(depth)
            .map_or(0, |parent| tree.children_len(Some(&parent)))
    }

    /// Moves to the row drawn directly above. Returns `false` at the first
    /// database, where the cursor stays put.
    pub fn move_up(&mut self, tree: &TreeState) -> bool {
        let index = self.path.last();
        if index > 0 {
            let mut sibling = self.path;
            sibling.set_last(index - 1);
            if !tree.contains(&sibling) {
                return false;
            }
            self.path = tree.last_visible_descendant(sibling);
            return true;
        }

        match self.path.parent() {
            Some(parent) => {
                self.path = parent;
                true
            }
            None => false,
        }
    }

    /// Moves to the row drawn directly below. Returns `false` on the last
    /// visible row; top-level wraparound is left to the caller.
    pub fn move_down(&mut self, tree: &TreeState) -> bool {
        if tree.node(&self.path).is_some_and(|node| node.shows_children()) {
            if let Some(child) = self.path.child(0) {
                self.path = child;
                return true;
            }
        }

        for depth in (0..self.path.len()).rev() {
            let Some(index) = self.path.get(depth) else {
                continue;
            };
            if index + 1 < self.sibling_count(tree, depth) {
                self.path.truncate(depth + 1);
                self.path.set_last(index + 1);
                return true;
            }
        }
        false
    }
}
