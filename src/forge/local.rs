//! Filesystem forge - the GitHub capabilities mirrored onto a directory tree
//!
//! Layout under the root:
//!
//! ```text
//! <owner>/<repo>/notes/<tag>.md                 generated notes, automatic range
//! <owner>/<repo>/notes/<previous>...<tag>.md    generated notes, explicit range
//! <owner>/<repo>/releases/<tag>.json            published releases
//! <owner>/<repo>/contents/<path>                persisted artifacts
//! ```
//!
//! Concurrency tokens are the SHA-256 of the artifact bytes.

use super::{ArtifactStore, ForgeError, NewRelease, NotesGenerator, Release, ReleaseHost, StoredArtifact};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Forge backed by a local directory
pub struct LocalForge {
  root: PathBuf,
}

#[derive(Serialize, Deserialize)]
struct ReleaseRecord {
  id: u64,
  tag: String,
  name: Option<String>,
  body: String,
  make_latest: bool,
}

impl From<&ReleaseRecord> for Release {
  fn from(r: &ReleaseRecord) -> Self {
    Release {
      id: r.id,
      tag: r.tag.clone(),
      name: r.name.clone(),
      body: r.body.clone(),
    }
  }
}

/// SHA-256 hex digest used as the concurrency token
pub fn content_token(bytes: &[u8]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(bytes);
  hex::encode(hasher.finalize())
}

impl LocalForge {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  fn repo_dir(&self, owner: &str, repo: &str) -> PathBuf {
    self.root.join(owner).join(repo)
  }

  fn releases_dir(&self, owner: &str, repo: &str) -> PathBuf {
    self.repo_dir(owner, repo).join("releases")
  }

  fn load_releases(&self, owner: &str, repo: &str) -> Result<Vec<(PathBuf, ReleaseRecord)>, ForgeError> {
    let dir = self.releases_dir(owner, repo);
    if !dir.exists() {
      return Ok(Vec::new());
    }
    let mut records = Vec::new();
    for entry in fs::read_dir(&dir)? {
      let path = entry?.path();
      if path.extension().is_some_and(|e| e == "json") {
        let record: ReleaseRecord = serde_json::from_str(&fs::read_to_string(&path)?)?;
        records.push((path, record));
      }
    }
    records.sort_by_key(|(_, r)| r.id);
    Ok(records)
  }

  fn save_release(path: &Path, record: &ReleaseRecord) -> Result<(), ForgeError> {
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(record)?)?;
    Ok(())
  }
}

impl NotesGenerator for LocalForge {
  fn generate_notes(
    &self,
    owner: &str,
    repo: &str,
    tag: &str,
    previous_tag: Option<&str>,
  ) -> Result<String, ForgeError> {
    let notes_dir = self.repo_dir(owner, repo).join("notes");
    let mut candidates = Vec::new();
    if let Some(prev) = previous_tag.filter(|p| !p.is_empty()) {
      candidates.push(notes_dir.join(format!("{}...{}.md", prev, tag)));
    }
    candidates.push(notes_dir.join(format!("{}.md", tag)));

    for candidate in candidates {
      if candidate.is_file() {
        return Ok(fs::read_to_string(candidate)?);
      }
    }
    Err(ForgeError::NotFound {
      resource: format!("{}/{}@{}", owner, repo, tag),
    })
  }
}

impl ReleaseHost for LocalForge {
  fn get_release(&self, owner: &str, repo: &str, tag: &str) -> Result<Option<Release>, ForgeError> {
    Ok(
      self
        .load_releases(owner, repo)?
        .iter()
        .find(|(_, r)| r.tag == tag)
        .map(|(_, r)| r.into()),
    )
  }

  fn create_release(&self, owner: &str, repo: &str, release: &NewRelease<'_>) -> Result<Release, ForgeError> {
    let existing = self.load_releases(owner, repo)?;
    if existing.iter().any(|(_, r)| r.tag == release.tag) {
      return Err(ForgeError::Api {
        status: 422,
        message: format!("release for tag {} already exists", release.tag),
      });
    }
    let record = ReleaseRecord {
      id: existing.last().map(|(_, r)| r.id + 1).unwrap_or(1),
      tag: release.tag.to_string(),
      name: Some(release.name.to_string()),
      body: release.body.to_string(),
      make_latest: release.make_latest,
    };
    let path = self.releases_dir(owner, repo).join(format!("{}.json", release.tag));
    Self::save_release(&path, &record)?;
    Ok((&record).into())
  }

  fn update_release(&self, owner: &str, repo: &str, id: u64, body: &str) -> Result<Release, ForgeError> {
    let (path, mut record) = self
      .load_releases(owner, repo)?
      .into_iter()
      .find(|(_, r)| r.id == id)
      .ok_or_else(|| ForgeError::NotFound {
        resource: format!("{}/{} release #{}", owner, repo, id),
      })?;
    record.body = body.to_string();
    Self::save_release(&path, &record)?;
    Ok((&record).into())
  }
}

impl ArtifactStore for LocalForge {
  fn read_artifact(&self, owner: &str, repo: &str, path: &str) -> Result<Option<StoredArtifact>, ForgeError> {
    let file = self.repo_dir(owner, repo).join("contents").join(path);
    if !file.is_file() {
      return Ok(None);
    }
    let bytes = fs::read(&file)?;
    let token = content_token(&bytes);
    let content = String::from_utf8(bytes)?;
    Ok(Some(StoredArtifact { content, token }))
  }

  fn write_artifact(
    &self,
    owner: &str,
    repo: &str,
    path: &str,
    content: &str,
    _message: &str,
    expected_token: Option<&str>,
  ) -> Result<(), ForgeError> {
    let file = self.repo_dir(owner, repo).join("contents").join(path);
    let current = if file.is_file() {
      Some(content_token(&fs::read(&file)?))
    } else {
      None
    };
    if current.as_deref() != expected_token {
      return Err(ForgeError::Conflict {
        resource: format!("{}/{}/{}", owner, repo, path),
      });
    }
    if let Some(parent) = file.parent() {
      fs::create_dir_all(parent)?;
    }
    fs::write(&file, content)?;
    Ok(())
  }
}
