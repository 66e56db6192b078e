//! Metacat: incremental, content-addressed metadata catalogs
//!
//! Ingests flat streams of extractor metadata records, normalizes them through a
//! translator registry, and merges them into a per-dataset tree persisted as JSON
//! blobs keyed by hashes of the dataset identity.

pub mod catalog;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod logging;
pub mod record;
pub mod store;
pub mod tooling;
pub mod translate;
pub mod tree;
pub mod types;
