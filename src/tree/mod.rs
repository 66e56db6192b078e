//! Catalog tree: node variants and the leaf merge.

pub mod merge;
pub mod node;

pub use merge::{merge_leaf, path_segments, split_leaf_path, Leaf, MergeOutcome};
pub use node::{
    CatalogNode, DatasetNode, DirectoryNode, FileNode, SubdatasetNode, SubdatasetRef, UNKNOWN_SIZE,
};
