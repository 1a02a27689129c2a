//! CLI commands for installer-notes
//!
//! - **generate**: full run (scan, reconcile, synthesize, write, publish, changelog)
//! - **reconcile**: show the removal report and merged inventory of two installer versions
//! - **categorize**: render a raw generated-notes body into sections
//!
//! Commands that touch charts or forges accept `&RunContext`.

pub mod categorize;
pub mod generate;
pub mod reconcile;

pub use categorize::run_categorize;
pub use generate::{GenerateOptions, run_generate};
pub use reconcile::run_reconcile;
