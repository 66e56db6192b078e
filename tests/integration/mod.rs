//! Integration tests for catalog construction

mod blob_store;
mod cli_contracts;
mod concurrent_ingest;
mod idempotence;
mod ingest_scenarios;
mod support;
