use crate::file::VFile;
use crate::filter::filter_files;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, trace};

/// Directories shallower than this start out expanded.
const EXPANDED_DEPTH: usize = 2;

/// A node in the file tree. Directories have children; files hold their
/// [`VFile`]. A node can end up with both when one ingested path is also the
/// directory prefix of another.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub path: String,
    pub name: String,
    pub children: Vec<TreeNode>,
    pub file: Option<Arc<VFile>>,
    pub expanded: bool,
}

impl TreeNode {
    pub fn root() -> Self {
        TreeNode {
            path: String::new(),
            name: String::new(),
            children: Vec::new(),
            file: None,
            expanded: true,
        }
    }

    fn directory(path: String, name: &str, depth: usize) -> Self {
        TreeNode {
            path,
            name: name.to_owned(),
            children: Vec::new(),
            file: None,
            expanded: depth < EXPANDED_DEPTH,
        }
    }

    fn leaf(path: String, name: &str, file: Arc<VFile>) -> Self {
        TreeNode {
            path,
            name: name.to_owned(),
            children: Vec::new(),
            file: Some(file),
            expanded: false,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.file.is_none() || !self.children.is_empty()
    }

    pub fn is_file(&self) -> bool {
        self.file.is_some()
    }

    /// Finds the node at `path` (slash-separated, relative to this node).
    /// The empty path is this node.
    pub fn find(&self, path: &str) -> Option<&TreeNode> {
        if path.is_empty() {
            return Some(self);
        }
        let mut current = self;
        for segment in path.split('/') {
            current = current.children.iter().find(|c| c.name == segment)?;
        }
        Some(current)
    }

    /// Paths of every non-binary file strictly below this node, in tree order.
    pub fn descendant_files(&self) -> Vec<String> {
        let mut out = Vec::new();
        for child in &self.children {
            child.collect_files(&mut out);
        }
        out
    }

    fn collect_files(&self, out: &mut Vec<String>) {
        if let Some(file) = &self.file {
            if !file.binary {
                out.push(file.path.clone());
            }
        }
        for child in &self.children {
            child.collect_files(out);
        }
    }

    fn insert(&mut self, segments: &[&str], depth: usize, file: &Arc<VFile>) {
        let Some((name, rest)) = segments.split_first() else {
            return;
        };
        let terminal = rest.is_empty();

        let index = match find_child(&self.children, name) {
            Some(index) => index,
            None => {
                let path = join_path(&self.path, name);
                let child = if terminal {
                    TreeNode::leaf(path, name, Arc::clone(file))
                } else {
                    TreeNode::directory(path, name, depth)
                };
                insert_sorted(&mut self.children, child)
            }
        };

        let child = &mut self.children[index];
        let was_dir = child.is_dir();
        if terminal {
            if child.file.is_some() {
                trace!("Replacing file at {}", child.path);
            }
            child.file = Some(Arc::clone(file));
        } else {
            child.insert(rest, depth + 1, file);
        }
        // A path collision can flip a node between file and directory.
        if child.is_dir() != was_dir {
            self.children.sort_by(sibling_order);
        }
    }
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_owned()
    } else {
        format!("{}/{}", parent, name)
    }
}

fn sibling_order(a: &TreeNode, b: &TreeNode) -> Ordering {
    b.is_dir()
        .cmp(&a.is_dir())
        .then_with(|| a.name.cmp(&b.name))
}

/// Siblings are kept sorted, so a name is looked up with one binary search
/// per node kind.
fn find_child(children: &[TreeNode], name: &str) -> Option<usize> {
    [true, false].into_iter().find_map(|dir| {
        children
            .binary_search_by(|c| {
                (!c.is_dir())
                    .cmp(&!dir)
                    .then_with(|| c.name.as_str().cmp(name))
            })
            .ok()
    })
}

fn insert_sorted(children: &mut Vec<TreeNode>, child: TreeNode) -> usize {
    let index = children.partition_point(|c| sibling_order(c, &child) == Ordering::Less);
    children.insert(index, child);
    index
}

/// Builds the tree of files that pass the filters. Always a fresh tree.
pub fn build_tree(files: &[Arc<VFile>], include: &[String], exclude: &[String]) -> TreeNode {
    let filtered = filter_files(files, include, exclude);
    let mut root = TreeNode::root();
    for file in &filtered {
        let segments: Vec<&str> = file.path.split('/').collect();
        root.insert(&segments, 0, file);
    }
    debug!("Built tree with {} files", filtered.len());
    root
}
