//! Selection model - focused chapters captured as root-to-node paths

use crate::{ChapterId, ChapterTree};
use serde::{Deserialize, Serialize};

/// Sequence of chapter handles from the root down to a chapter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChapterPath(Vec<ChapterId>);

impl ChapterPath {
    /// Capture the current path of an attached chapter
    pub fn of(tree: &ChapterTree, id: ChapterId) -> Option<Self> {
        tree.path_to(id).map(Self)
    }

    pub fn segments(&self) -> &[ChapterId] {
        &self.0
    }

    /// The chapter this path points at
    pub fn target(&self) -> Option<ChapterId> {
        self.0.last().copied()
    }

    /// Resolve against the tree rooted at `root`.
    ///
    /// The first segment must be `root` and every segment must still be the
    /// parent of the next one; otherwise the path no longer matches. Paths
    /// into detached subtrees never resolve.
    pub fn resolve(&self, tree: &ChapterTree, root: ChapterId) -> Option<ChapterId> {
        let (first, rest) = self.0.split_first()?;
        if *first != root || tree.get(root)?.parent().is_some() {
            return None;
        }
        let mut current = root;
        for &segment in rest {
            if tree.parent_of(segment) != Some(current) {
                return None;
            }
            current = segment;
        }
        Some(current)
    }
}

/// Ordered set of focused chapter paths
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    paths: Vec<ChapterPath>,
}

impl Selection {
    /// An empty selection
    pub fn empty() -> Self {
        Self::default()
    }

    /// Capture paths for chapters, skipping unknown handles and duplicates
    pub fn capture(tree: &ChapterTree, chapters: &[ChapterId]) -> Self {
        let mut selection = Self::empty();
        for &id in chapters {
            if let Some(path) = ChapterPath::of(tree, id) {
                selection.push(path);
            }
        }
        selection
    }

    fn push(&mut self, path: ChapterPath) {
        if !self.paths.contains(&path) {
            self.paths.push(path);
        }
    }

    pub fn paths(&self) -> &[ChapterPath] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Chapters whose paths still resolve, in selection order
    pub fn resolve(&self, tree: &ChapterTree, root: ChapterId) -> Vec<ChapterId> {
        self.paths.iter().filter_map(|p| p.resolve(tree, root)).collect()
    }

    /// Drop paths that no longer resolve
    pub fn retain_resolvable(&mut self, tree: &ChapterTree, root: ChapterId) {
        self.paths.retain(|p| p.resolve(tree, root).is_some());
    }

    /// Whether the selection contains a path ending at `id`
    pub fn contains(&self, id: ChapterId) -> bool {
        self.paths.iter().any(|p| p.target() == Some(id))
    }
}
