//! Running changelog maintenance with optimistic concurrency
//!
//! The changelog is one persisted document. Each run prepends a
//! `# Release <version>` block above the existing history, guarded by the
//! concurrency token returned by the read. A stale token fails the update;
//! there is no automatic retry.

use crate::core::error::{NotesResult, ResultExt};
use crate::forge::ArtifactStore;

/// Separator between two releases in the changelog
pub const RELEASE_SEPARATOR: &str = "<br><br>";

/// Where the running changelog lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogLocation {
  pub owner: String,
  pub repo: String,
  pub path: String,
}

impl ChangelogLocation {
  pub fn display(&self) -> String {
    format!("{}/{}/{}", self.owner, self.repo, self.path)
  }
}

/// What the update did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangelogUpdate {
  /// Changelog did not exist and was created
  Created,
  /// New release prepended above existing history
  Prepended,
}

/// New changelog content for `version`, given the current content if any
pub fn render_changelog(version: &str, document: &str, existing: Option<&str>) -> String {
  match existing {
    None => format!("# Release {}\n\n{}\n\n", version, document),
    Some(history) => format!("# Release {}\n\n{}\n{}\n{}", version, document, RELEASE_SEPARATOR, history),
  }
}

/// Read-modify-write the changelog at `location`
pub fn append_release(
  store: &dyn ArtifactStore,
  location: &ChangelogLocation,
  version: &str,
  document: &str,
) -> NotesResult<ChangelogUpdate> {
  let existing = store
    .read_artifact(&location.owner, &location.repo, &location.path)
    .with_context(|| format!("Failed to read changelog {}", location.display()))?;

  let message = format!("docs: add release notes for {}", version);
  match existing {
    None => {
      tracing::info!(changelog = %location.display(), "changelog not found, creating it");
      let content = render_changelog(version, document, None);
      store
        .write_artifact(&location.owner, &location.repo, &location.path, &content, &message, None)
        .with_context(|| format!("Failed to create changelog {}", location.display()))?;
      Ok(ChangelogUpdate::Created)
    }
    Some(artifact) => {
      tracing::debug!(changelog = %location.display(), token = %artifact.token, "prepending release to changelog");
      let content = render_changelog(version, document, Some(&artifact.content));
      store
        .write_artifact(
          &location.owner,
          &location.repo,
          &location.path,
          &content,
          &message,
          Some(&artifact.token),
        )
        .with_context(|| format!("Failed to update changelog {}", location.display()))?;
      Ok(ChangelogUpdate::Prepended)
    }
  }
}
