use crate::cursor::Cursor;
use crate::path::TreePath;
use crate::tree::TreeState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    pub path: TreePath,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchInput {
    Char(char),
    Backspace,
    Enter,
    Escape,
}

/// How a row should be highlighted while a search is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Highlight {
    #[default]
    None,
    Match,
    Current,
}

impl Highlight {
    #[must_use]
    pub fn is_match(self) -> bool {
        !matches!(self, Self::None)
    }

    #[must_use]
    pub fn is_current(self) -> bool {
        matches!(self, Self::Current)
    }
}

/// Case-insensitive substring search over the visible part of the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeSearch {
    editing: bool,
    query: String,
    matches: Vec<SearchMatch>,
    current: Option<usize>,
}

impl TreeSearch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_editing(&self) -> bool {
        self.editing
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub fn matches(&self) -> &[SearchMatch] {
        &self.matches
    }

    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    #[must_use]
    pub fn current_match(&self) -> Option<&SearchMatch> {
        self.matches.get(self.current?)
    }

    /// Starts a fresh query in input mode.
    pub fn enable(&mut self) {
        self.clear();
        self.editing = true;
    }

    pub fn clear(&mut self) {
        self.editing = false;
        self.query.clear();
        self.matches.clear();
        self.current = None;
    }

    /// Rescans the visible rows for the current query and jumps the cursor to
    /// the first match.
    pub fn update_matches(&mut self, tree: &TreeState, cursor: &mut Cursor) {
        self.collect(tree);
        self.current = None;
        if let Some(first) = self.matches.first() {
            self.current = Some(0);
            cursor.set_path(first.path);
        }
    }

    /// Recomputes matches after the tree changed shape without moving the
    /// cursor. The current match survives if it is still visible.
    pub fn rescan(&mut self, tree: &TreeState) {
        if self.query.is_empty() {
            return;
        }
        let previous = self.current_match().map(|found| found.path);
        self.collect(tree);
        self.current = previous
            .and_then(|path| self.matches.iter().position(|found| found.path == path))
            .or_else(|| (!self.matches.is_empty()).then_some(0));
    }

    fn collect(&mut self, tree: &TreeState) {
        self.matches.clear();
        if self.query.is_empty() {
            return;
        }

        let needle = self.query.to_lowercase();
        tree.walk_visible(|path, node| {
            if node.name().to_lowercase().contains(&needle) {
                self.matches.push(SearchMatch {
                    path,
                    name: node.name().to_string(),
                });
            }
        });
    }

    pub fn next_match(&mut self, cursor: &mut Cursor) -> bool {
        self.step(cursor, 1)
    }

    pub fn prev_match(&mut self, cursor: &mut Cursor) -> bool {
        self.step(cursor, self.matches.len().saturating_sub(1))
    }

    fn step(&mut self, cursor: &mut Cursor, forward: usize) -> bool {
        let count = self.matches.len();
        if count == 0 {
            return false;
        }
        let next = (self.current.unwrap_or(0) + forward) % count;
        self.current = Some(next);
        cursor.set_path(self.matches[next].path);
        true
    }

    #[must_use]
    pub fn highlight(&self, path: &TreePath) -> Highlight {
        // Matches are collected in pre-order, which is also `TreePath` order.
        match self.matches.binary_search_by(|candidate| candidate.path.cmp(path)) {
            Ok(index) if Some(index) == self.current => Highlight::Current,
            Ok(_) => Highlight::Match,
            Err(_) => Highlight::None,
        }
    }

    /// Applies one key of search input. Returns whether the query changed.
    pub fn handle_input(
        &mut self,
        input: SearchInput,
        tree: &TreeState,
        cursor: &mut Cursor,
    ) -> bool {
        match input {
            SearchInput::Escape => {
                self.clear();
                false
            }
            SearchInput::Enter => {
                self.editing = false;
                false
            }
            SearchInput::Backspace => {
                if self.query.pop().is_none() {
                    return false;
                }
                self.update_matches(tree, cursor);
                true
            }
            SearchInput::Char(ch) => {
                if ch.is_control() {
                    return false;
                }
                self.query.push(ch);
                self.update_matches(tree, cursor);
                true
            }
        }
    }
}
