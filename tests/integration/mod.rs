//! Integration tests for installer-notes
//!
//! Each test builds a temporary chart tree and a directory-backed forge, then
//! runs the compiled binary against them.

mod helpers;

mod test_categorize;
mod test_generate;
mod test_reconcile;
