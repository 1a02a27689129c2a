//! Publish the synthesized notes as the installer's release body

use crate::core::error::{NotesResult, ResultExt};
use crate::forge::{NewRelease, ReleaseHost};

/// What publication did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Publication {
  Created { id: u64 },
  Updated { id: u64 },
}

/// Release title for an installer version range
pub fn release_title(product: &str, previous: &str, current: &str) -> String {
  format!("Release Notes For {} {} ... {}", product, previous, current)
}

/// Replace the body of the release for `tag`, creating it (as latest) when missing
pub fn publish_release(
  host: &dyn ReleaseHost,
  owner: &str,
  repo: &str,
  tag: &str,
  title: &str,
  body: &str,
) -> NotesResult<Publication> {
  let existing = host
    .get_release(owner, repo, tag)
    .with_context(|| format!("Failed to look up release {} on {}/{}", tag, owner, repo))?;

  match existing {
    Some(release) => {
      let updated = host
        .update_release(owner, repo, release.id, body)
        .with_context(|| format!("Could not edit release {} on {}/{}", tag, owner, repo))?;
      tracing::info!(owner, repo, tag, id = updated.id, "release edited");
      Ok(Publication::Updated { id: updated.id })
    }
    None => {
      tracing::info!(owner, repo, tag, "release not found, creating it");
      let created = host
        .create_release(
          owner,
          repo,
          &NewRelease {
            tag,
            name: title,
            body,
            make_latest: true,
          },
        )
        .with_context(|| format!("Could not create release {} on {}/{}", tag, owner, repo))?;
      tracing::info!(owner, repo, tag, id = created.id, "release created");
      Ok(Publication::Created { id: created.id })
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::forge::{ForgeError, Release};
  use std::cell::RefCell;

  #[derive(Default)]
  struct RecordingHost {
    releases: RefCell<Vec<Release>>,
    fail_lookup: bool,
  }

  impl ReleaseHost for RecordingHost {
    fn get_release(&self, _owner: &str, _repo: &str, tag: &str) -> Result<Option<Release>, ForgeError> {
      if self.fail_lookup {
        return Err(ForgeError::Transport("connection reset".to_string()));
      }
      Ok(self.releases.borrow().iter().find(|r| r.tag == tag).cloned())
    }

    fn create_release(&self, _owner: &str, _repo: &str, release: &NewRelease<'_>) -> Result<Release, ForgeError> {
      let created = Release {
        id: self.releases.borrow().len() as u64 + 10,
        tag: release.tag.to_string(),
        name: Some(release.name.to_string()),
        body: release.body.to_string(),
      };
      self.releases.borrow_mut().push(created.clone());
      Ok(created)
    }

    fn update_release(&self, _owner: &str, _repo: &str, id: u64, body: &str) -> Result<Release, ForgeError> {
      let mut releases = self.releases.borrow_mut();
      let release = releases
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or(ForgeError::NotFound { resource: id.to_string() })?;
      release.body = body.to_string();
      Ok(release.clone())
    }
  }

  #[test]
  fn test_creates_missing_release() {
    let host = RecordingHost::default();
    let title = release_title("Krateo", "2.5.0", "2.5.1");
    let outcome = publish_release(&host, "org", "installer-chart", "2.5.1", &title, "body").unwrap();

    assert_eq!(outcome, Publication::Created { id: 10 });
    let releases = host.releases.borrow();
    assert_eq!(releases[0].name.as_deref(), Some("Release Notes For Krateo 2.5.0 ... 2.5.1"));
  }

  #[test]
  fn test_updates_existing_release_in_place() {
    let host = RecordingHost::default();
    publish_release(&host, "org", "installer-chart", "2.5.1", "t", "old").unwrap();
    let outcome = publish_release(&host, "org", "installer-chart", "2.5.1", "t", "new").unwrap();

    assert_eq!(outcome, Publication::Updated { id: 10 });
    assert_eq!(host.releases.borrow().len(), 1);
    assert_eq!(host.releases.borrow()[0].body, "new");
  }

  #[test]
  fn test_lookup_failure_is_reported() {
    let host = RecordingHost {
      fail_lookup: true,
      ..Default::default()
    };
    let err = publish_release(&host, "org", "installer-chart", "2.5.1", "t", "b").unwrap_err();
    assert!(err.to_string().contains("Failed to look up release 2.5.1"));
  }
}
