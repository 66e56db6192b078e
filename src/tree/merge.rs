//! Tree merge: place one leaf at the end of a directory chain.
//!
//! Lookups are type-discriminating at every level. A directory and a file with the
//! same name are different siblings, and a file leaf never matches a subdataset
//! leaf of the same name. Existing nodes keep their position and their children;
//! only a leaf's own scalar attributes are updated in place.

use super::node::{CatalogNode, DirectoryNode, FileNode, SubdatasetNode};

/// Split a relative path into its non-empty segments; `.` segments are dropped.
pub fn path_segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .map(str::to_string)
        .collect()
}

/// Split a path into its directory chain and final leaf name.
pub fn split_leaf_path(path: &str) -> Option<(Vec<String>, String)> {
    let mut segments = path_segments(path);
    let name = segments.pop()?;
    Some((segments, name))
}

/// Terminal node to place in the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Leaf {
    File {
        name: String,
        content_byte_size: i64,
        url: String,
    },
    Dataset {
        name: String,
        dataset_id: String,
        dataset_version: String,
    },
}

impl Leaf {
    pub fn name(&self) -> &str {
        match self {
            Leaf::File { name, .. } | Leaf::Dataset { name, .. } => name,
        }
    }

    fn matches(&self, node: &CatalogNode) -> bool {
        match (self, node) {
            (Leaf::File { name, .. }, CatalogNode::File(file)) => file.name == *name,
            (Leaf::Dataset { name, .. }, CatalogNode::Dataset(sub)) => sub.name == *name,
            _ => false,
        }
    }

    /// Overwrite the scalar attributes of a matching node; returns whether anything changed.
    fn update(self, node: &mut CatalogNode) -> bool {
        match (self, node) {
            (
                Leaf::File {
                    content_byte_size,
                    url,
                    ..
                },
                CatalogNode::File(file),
            ) => {
                let changed = file.content_byte_size != content_byte_size || file.url != url;
                file.content_byte_size = content_byte_size;
                file.url = url;
                changed
            }
            (
                Leaf::Dataset {
                    dataset_id,
                    dataset_version,
                    ..
                },
                CatalogNode::Dataset(sub),
            ) => {
                let changed = sub.dataset_id != dataset_id || sub.dataset_version != dataset_version;
                sub.dataset_id = dataset_id;
                sub.dataset_version = dataset_version;
                changed
            }
            _ => false,
        }
    }

    fn into_node(self) -> CatalogNode {
        match self {
            Leaf::File {
                name,
                content_byte_size,
                url,
            } => CatalogNode::File(FileNode {
                name,
                content_byte_size,
                url,
            }),
            Leaf::Dataset {
                name,
                dataset_id,
                dataset_version,
            } => CatalogNode::Dataset(SubdatasetNode {
                name,
                dataset_id,
                dataset_version,
            }),
        }
    }
}

/// What a merge did to the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// A new leaf (and possibly directories) was appended.
    Inserted,
    /// An existing leaf's attributes changed.
    Updated,
    Unchanged,
}

/// Insert or update `leaf` below the directory chain `dirs`, starting at `children`.
pub fn merge_leaf(children: &mut Vec<CatalogNode>, dirs: &[String], leaf: Leaf) -> MergeOutcome {
    let Some((segment, rest)) = dirs.split_first() else {
        return place_leaf(children, leaf);
    };

    for node in children.iter_mut() {
        if let CatalogNode::Directory(dir) = node {
            if dir.name == *segment {
                return merge_leaf(&mut dir.children, rest, leaf);
            }
        }
    }

    let mut dir = DirectoryNode::new(segment.clone());
    merge_leaf(&mut dir.children, rest, leaf);
    children.push(CatalogNode::Directory(dir));
    MergeOutcome::Inserted
}

fn place_leaf(children: &mut Vec<CatalogNode>, leaf: Leaf) -> MergeOutcome {
    if let Some(existing) = children.iter_mut().find(|node| leaf.matches(node)) {
        return if leaf.update(existing) {
            MergeOutcome::Updated
        } else {
            MergeOutcome::Unchanged
        };
    }
    children.push(leaf.into_node());
    MergeOutcome::Inserted
}
