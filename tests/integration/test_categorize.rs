//! Tests for the `categorize` command

use crate::helpers::*;
use anyhow::Result;
use std::io::Write;
use std::process::{Command, Stdio};

#[test]
fn test_categorize_file() -> Result<()> {
  let dir = tempfile::TempDir::new()?;
  let notes = dir.path().join("notes.md");
  std::fs::write(
    &notes,
    "## What's Changed\n\
     * fix: b by @b in https://github.com/o/r/pull/2\n\
     * feat: a by @a in https://github.com/o/r/pull/1\n",
  )?;

  let output = run_installer_notes(dir.path(), &["categorize", "notes.md"])?;
  assert_eq!(
    String::from_utf8_lossy(&output.stdout),
    "\n### ✨ Features\n- feat: a ([link](https://github.com/o/r/pull/1)) by @a\n\
     \n### 🐛 Bug Fixes\n- fix: b ([link](https://github.com/o/r/pull/2)) by @b\n\n"
  );
  Ok(())
}

#[test]
fn test_categorize_stdin() -> Result<()> {
  let dir = tempfile::TempDir::new()?;
  let mut child = Command::new(env!("CARGO_BIN_EXE_installer-notes"))
    .current_dir(dir.path())
    .arg("categorize")
    .stdin(Stdio::piped())
    .stdout(Stdio::piped())
    .spawn()?;
  child
    .stdin
    .take()
    .expect("piped stdin")
    .write_all(b"* docs: guide by @c in https://github.com/o/r/pull/3\n")?;
  let output = child.wait_with_output()?;

  assert!(output.status.success());
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("### 📚 Documentation\n- docs: guide"));
  Ok(())
}

#[test]
fn test_categorize_missing_file() -> Result<()> {
  let dir = tempfile::TempDir::new()?;
  let output = run_installer_notes_raw(dir.path(), &["categorize", "absent.md"])?;
  assert!(!output.status.success());
  Ok(())
}
