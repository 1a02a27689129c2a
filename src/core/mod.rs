//! Core engine for installer-notes
//!
//! - **config**: installer-notes.toml parsing, environment overlay and validation
//! - **context**: collaborators built once per run (chart source, forge clients)
//! - **error**: error types with contextual help messages and exit codes
//! - **inventory**: component metadata and installer snapshots
//! - **reconcile**: diff two snapshots into a removal report and merged inventory
//! - **notes**: categorize generated notes into emoji sections
//! - **synthesize**: per-component notes across owners with fallbacks
//! - **release**: publish the document as the installer release
//! - **changelog**: prepend the document to the cumulative changelog

pub mod changelog;
pub mod config;
pub mod context;
pub mod error;
pub mod inventory;
pub mod notes;
pub mod reconcile;
pub mod release;
pub mod synthesize;
