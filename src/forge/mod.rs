//! Source-control platform capabilities consumed by the release-notes engine
//!
//! The engine never talks HTTP itself. It sees three capabilities:
//!
//! - **NotesGenerator**: commit-based notes for a tag range
//! - **ReleaseHost**: one published release object per tag
//! - **ArtifactStore**: persisted documents guarded by a concurrency token
//!
//! Implementations:
//!
//! - **github**: GitHub REST API over a blocking reqwest client
//! - **local**: directory tree with the same semantics (offline runs, tests)

pub mod github;
pub mod local;

pub use github::GitHubForge;
pub use local::LocalForge;

use std::fmt;

/// Errors emitted by forge implementations
#[derive(Debug)]
pub enum ForgeError {
  /// Requested object does not exist
  NotFound { resource: String },

  /// Write rejected because the artifact changed since it was read
  Conflict { resource: String },

  /// API request failed with a structured status code
  Api { status: u16, message: String },

  /// Request transport failed (DNS, TLS, timeout, ...)
  Transport(String),

  /// Payload could not be decoded
  Decode(String),
}

impl ForgeError {
  pub(crate) fn help_message(&self) -> Option<String> {
    match self {
      ForgeError::Conflict { resource } => Some(format!(
        "{} was modified concurrently. Re-run to rebuild it from the latest revision.",
        resource
      )),
      ForgeError::Api { status: 401, .. } | ForgeError::Api { status: 403, .. } => {
        Some("Check that TOKEN grants access to the organization (contents and releases write).".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for ForgeError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ForgeError::NotFound { resource } => write!(f, "not found: {}", resource),
      ForgeError::Conflict { resource } => write!(f, "stale concurrency token for {}", resource),
      ForgeError::Api { status, message } => write!(f, "forge API error ({}): {}", status, message),
      ForgeError::Transport(msg) => write!(f, "forge transport error: {}", msg),
      ForgeError::Decode(msg) => write!(f, "forge decode error: {}", msg),
    }
  }
}

impl std::error::Error for ForgeError {}

impl From<reqwest::Error> for ForgeError {
  fn from(value: reqwest::Error) -> Self {
    Self::Transport(value.to_string())
  }
}

impl From<serde_json::Error> for ForgeError {
  fn from(value: serde_json::Error) -> Self {
    Self::Decode(value.to_string())
  }
}

impl From<base64::DecodeError> for ForgeError {
  fn from(value: base64::DecodeError) -> Self {
    Self::Decode(value.to_string())
  }
}

impl From<std::string::FromUtf8Error> for ForgeError {
  fn from(value: std::string::FromUtf8Error) -> Self {
    Self::Decode(value.to_string())
  }
}

impl From<std::io::Error> for ForgeError {
  fn from(value: std::io::Error) -> Self {
    Self::Transport(value.to_string())
  }
}

/// A published release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
  pub id: u64,
  pub tag: String,
  pub name: Option<String>,
  pub body: String,
}

/// Arguments for creating a release
#[derive(Debug, Clone)]
pub struct NewRelease<'a> {
  pub tag: &'a str,
  pub name: &'a str,
  pub body: &'a str,
  pub make_latest: bool,
}

/// A persisted document and the token that guards its next write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
  pub content: String,
  pub token: String,
}

/// Commit-based changelog for a tag range
pub trait NotesGenerator: Send + Sync {
  /// Generate the raw notes body for `tag`.
  ///
  /// `previous_tag = None` lets the platform infer the range.
  fn generate_notes(
    &self,
    owner: &str,
    repo: &str,
    tag: &str,
    previous_tag: Option<&str>,
  ) -> Result<String, ForgeError>;
}

/// Release objects keyed by tag
pub trait ReleaseHost {
  /// Look up the release for `tag`; `Ok(None)` when there is none
  fn get_release(&self, owner: &str, repo: &str, tag: &str) -> Result<Option<Release>, ForgeError>;

  fn create_release(&self, owner: &str, repo: &str, release: &NewRelease<'_>) -> Result<Release, ForgeError>;

  /// Replace the body of an existing release
  fn update_release(&self, owner: &str, repo: &str, id: u64, body: &str) -> Result<Release, ForgeError>;
}

/// Persisted documents with optimistic concurrency
pub trait ArtifactStore {
  /// Read an artifact; `Ok(None)` when it does not exist
  fn read_artifact(&self, owner: &str, repo: &str, path: &str) -> Result<Option<StoredArtifact>, ForgeError>;

  /// Write an artifact.
  ///
  /// `expected_token = None` creates the artifact. With a token the write is
  /// rejected with [`ForgeError::Conflict`] when the stored revision differs.
  fn write_artifact(
    &self,
    owner: &str,
    repo: &str,
    path: &str,
    content: &str,
    message: &str,
    expected_token: Option<&str>,
  ) -> Result<(), ForgeError>;
}

/// Every capability the driver needs from one authenticated client
pub trait ForgeClient: NotesGenerator + ReleaseHost + ArtifactStore {}

impl<T: NotesGenerator + ReleaseHost + ArtifactStore> ForgeClient for T {}
