use crate::tree::TreeNode;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

/// The set of checked paths, iterated in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    order: Vec<String>,
    members: HashSet<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.members.contains(path)
    }

    pub fn insert(&mut self, path: &str) -> bool {
        if !self.members.insert(path.to_owned()) {
            return false;
        }
        self.order.push(path.to_owned());
        true
    }

    pub fn remove(&mut self, path: &str) -> bool {
        if !self.members.remove(path) {
            return false;
        }
        self.order.retain(|p| p != path);
        true
    }

    /// Removes every given path with a single pass over the order, so bulk
    /// deselects stay linear. Returns how many were removed.
    pub fn remove_many<S: AsRef<str>>(&mut self, paths: &[S]) -> usize {
        let removed = paths
            .iter()
            .filter(|p| self.members.remove(p.as_ref()))
            .count();
        if removed > 0 {
            let members = &self.members;
            self.order.retain(|p| members.contains(p));
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn first(&self) -> Option<&str> {
        self.order.first().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for Selection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut selection = Selection::new();
        for path in iter {
            selection.insert(path.as_ref());
        }
        selection
    }
}

/// Last explicit include/exclude decision per path. Entries outlive the path's
/// visibility under the current filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionMemory {
    intents: HashMap<String, bool>,
}

impl SelectionMemory {
    pub fn remember(&mut self, path: &str, on: bool) {
        self.intents.insert(path.to_owned(), on);
    }

    pub fn intent(&self, path: &str) -> Option<bool> {
        self.intents.get(path).copied()
    }

    /// Whether `path` should be selected when it (re)appears. Unknown paths are.
    pub fn wants(&self, path: &str) -> bool {
        self.intent(path).unwrap_or(true)
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }
}

/// Selection of filtered, non-binary files plus the memory of what the user
/// asked for. Memory is written only by the explicit actions here, never by
/// [`SelectionManager::reconcile`].
#[derive(Debug, Clone, Default)]
pub struct SelectionManager {
    selection: Selection,
    memory: SelectionMemory,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn memory(&self) -> &SelectionMemory {
        &self.memory
    }

    /// Forgets all intent and selects every given path. Used on a fresh load.
    pub fn reset<S: AsRef<str>>(&mut self, selectable: &[S]) {
        self.memory = SelectionMemory::default();
        self.selection = selectable.iter().map(AsRef::as_ref).collect();
        debug!("Selection reset to {} paths", self.selection.len());
    }

    /// Rebuilds the selection for a new filtered set, honoring memory.
    pub fn reconcile<S: AsRef<str>>(&mut self, selectable: &[S]) {
        self.selection = reconcile(selectable, &self.memory);
        debug!(
            "Reconciled selection: {} of {} paths selected",
            self.selection.len(),
            selectable.len()
        );
    }

    pub fn toggle_file(&mut self, path: &str, on: bool) {
        self.mark(path, on);
    }

    /// Applies one explicit decision to many paths at once (folder toggles,
    /// select-all, select-none).
    pub fn toggle_many<S: AsRef<str>>(&mut self, paths: &[S], on: bool) {
        if on {
            for path in paths {
                self.selection.insert(path.as_ref());
            }
        } else {
            self.selection.remove_many(paths);
        }
        for path in paths {
            self.memory.remember(path.as_ref(), on);
        }
        debug!("Marked {} paths as {}", paths.len(), on);
    }

    /// Checked iff the folder has at least one selectable descendant and all of
    /// them are selected. Computed on demand, never stored.
    pub fn folder_checked(&self, folder: &TreeNode) -> bool {
        folder_checked(folder, &self.selection)
    }

    fn mark(&mut self, path: &str, on: bool) {
        trace!("Marking {} as {}", path, on);
        if on {
            self.selection.insert(path);
        } else {
            self.selection.remove(path);
        }
        self.memory.remember(path, on);
    }
}

/// Selects each path whose remembered intent is `true` or absent.
pub fn reconcile<S: AsRef<str>>(selectable: &[S], memory: &SelectionMemory) -> Selection {
    selectable
        .iter()
        .map(AsRef::as_ref)
        .filter(|p| memory.wants(p))
        .collect()
}

pub fn folder_checked(folder: &TreeNode, selection: &Selection) -> bool {
    let files = folder.descendant_files();
    !files.is_empty() && files.iter().all(|p| selection.contains(p))
}
