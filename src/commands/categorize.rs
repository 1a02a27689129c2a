use crate::core::error::{NotesResult, ResultExt};
use crate::core::notes::categorize;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// Run the categorize command
///
/// Renders a raw generate-notes body read from `file`, or stdin when absent.
pub fn run_categorize(file: Option<&Path>) -> NotesResult<()> {
  let raw = match file {
    Some(path) => fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?,
    None => {
      let mut buf = String::new();
      io::stdin().read_to_string(&mut buf).context("Failed to read notes from stdin")?;
      buf
    }
  };

  let notes = categorize(&raw);
  tracing::debug!(bullets = notes.len(), "categorized notes");
  print!("{}", notes.to_markdown());
  Ok(())
}
