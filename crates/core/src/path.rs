use std::cmp::Ordering;
use std::fmt;

use crate::node::NodeKind;

pub const MAX_DEPTH: usize = 4;

/// Address of one node in the tree: the child index chosen at each level,
/// starting from the database list.
///
/// Stored inline so cursor moves never allocate. Slots past `len` are kept
/// zeroed, which keeps the derived equality and hashing consistent with
/// [`TreePath::as_slice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreePath {
    len: u8,
    idx: [usize; MAX_DEPTH],
}

impl TreePath {
    #[must_use]
    pub fn root(database: usize) -> Self {
        Self {
            len: 1,
            idx: [database, 0, 0, 0],
        }
    }

    #[must_use]
    pub fn from_slice(indices: &[usize]) -> Option<Self> {
        if indices.is_empty() || indices.len() > MAX_DEPTH {
            return None;
        }
        let mut idx = [0; MAX_DEPTH];
        idx[..indices.len()].copy_from_slice(indices);
        Some(Self {
            len: u8::try_from(indices.len()).ok()?,
            idx,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        usize::from(self.len)
    }

    /// Always false; a path addresses at least a database.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.len() - 1
    }

    #[must_use]
    pub fn level(&self) -> NodeKind {
        NodeKind::from_depth(self.depth()).unwrap_or(NodeKind::Column)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.idx[..self.len()]
    }

    #[must_use]
    pub fn get(&self, depth: usize) -> Option<usize> {
        self.as_slice().get(depth).copied()
    }

    #[must_use]
    pub fn last(&self) -> usize {
        self.idx[self.depth()]
    }

    pub fn set_last(&mut self, index: usize) {
        let depth = self.depth();
        self.idx[depth] = index;
    }

    /// Returns `false` when the path is already at column depth.
    pub fn push(&mut self, index: usize) -> bool {
        if self.len() == MAX_DEPTH {
            return false;
        }
        self.idx[self.len()] = index;
        self.len += 1;
        true
    }

    #[must_use]
    pub fn child(&self, index: usize) -> Option<Self> {
        let mut child = *self;
        child.push(index).then_some(child)
    }

    /// Shortens the path to `len` entries; a length of zero is ignored.
    pub fn truncate(&mut self, len: usize) {
        if len == 0 || len >= self.len() {
            return;
        }
        for slot in &mut self.idx[len..] {
            *slot = 0;
        }
        self.len = u8::try_from(len).unwrap_or(1);
    }

    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.len() == 1 {
            return None;
        }
        let mut parent = *self;
        parent.truncate(self.len() - 1);
        Some(parent)
    }

    #[must_use]
    pub fn prefix(&self, len: usize) -> Option<Self> {
        if len == 0 || len > self.len() {
            return None;
        }
        let mut prefix = *self;
        prefix.truncate(len);
        Some(prefix)
    }
}

impl Default for TreePath {
    fn default() -> Self {
        Self::root(0)
    }
}

// Lexicographic order over the used indices is depth-first pre-order.
impl Ord for TreePath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_slice().cmp(other.as_slice())
    }
}

impl PartialOrd for TreePath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, index) in self.as_slice().iter().enumerate() {
            if position > 0 {
                f.write_str("/")?;
            }
            write!(f, "{index}")?;
        }
        Ok(())
    }
}
