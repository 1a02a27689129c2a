//! GitHub REST backend over a blocking reqwest client
//!
//! One `GitHubForge` holds one credential. Multi-organization runs build one
//! instance per (organization, token) pair.

use super::{ArtifactStore, ForgeError, NewRelease, NotesGenerator, Release, ReleaseHost, StoredArtifact};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Method;
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("installer-notes/", env!("CARGO_PKG_VERSION"));

/// GitHub client bound to a single credential
pub struct GitHubForge {
  http: Client,
  api_url: String,
  token: Option<String>,
}

#[derive(Serialize)]
struct GenerateNotesRequest<'a> {
  tag_name: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  previous_tag_name: Option<&'a str>,
}

#[derive(Deserialize)]
struct GeneratedNotes {
  body: String,
}

#[derive(Deserialize)]
struct ReleasePayload {
  id: u64,
  tag_name: String,
  name: Option<String>,
  body: Option<String>,
}

impl From<ReleasePayload> for Release {
  fn from(p: ReleasePayload) -> Self {
    Release {
      id: p.id,
      tag: p.tag_name,
      name: p.name,
      body: p.body.unwrap_or_default(),
    }
  }
}

#[derive(Serialize)]
struct CreateReleaseRequest<'a> {
  tag_name: &'a str,
  name: &'a str,
  body: &'a str,
  make_latest: &'a str,
}

#[derive(Serialize)]
struct UpdateReleaseRequest<'a> {
  body: &'a str,
}

#[derive(Deserialize)]
struct ContentsPayload {
  sha: String,
  #[serde(default)]
  content: Option<String>,
  #[serde(default)]
  encoding: Option<String>,
}

#[derive(Serialize)]
struct PutContentsRequest<'a> {
  message: &'a str,
  content: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  sha: Option<&'a str>,
}

#[derive(Deserialize)]
struct ApiMessage {
  message: String,
}

impl GitHubForge {
  /// Build a client for `api_url` (e.g. `https://api.github.com`)
  pub fn new(api_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, ForgeError> {
    let http = Client::builder().timeout(timeout).user_agent(USER_AGENT).build()?;
    Ok(Self {
      http,
      api_url: api_url.trim_end_matches('/').to_string(),
      token: token.filter(|t| !t.is_empty()),
    })
  }

  fn request(&self, method: Method, path: &str) -> RequestBuilder {
    let mut rb = self
      .http
      .request(method, format!("{}{}", self.api_url, path))
      .header("Accept", "application/vnd.github+json")
      .header("X-GitHub-Api-Version", API_VERSION);
    if let Some(ref token) = self.token {
      rb = rb.bearer_auth(token);
    }
    rb
  }

  fn send(&self, rb: RequestBuilder) -> Result<Response, ForgeError> {
    Ok(rb.send()?)
  }

  fn parse<T: DeserializeOwned>(resp: Response, resource: &str) -> Result<T, ForgeError> {
    let status = resp.status();
    if status.is_success() {
      let text = resp.text()?;
      return Ok(serde_json::from_str(&text)?);
    }
    Err(Self::status_error(status, resp, resource))
  }

  fn status_error(status: StatusCode, resp: Response, resource: &str) -> ForgeError {
    let body = resp.text().unwrap_or_default();
    tracing::debug!(%status, resource, body = %body, "GitHub API error response");
    api_error(status, body, resource)
  }
}

impl NotesGenerator for GitHubForge {
  fn generate_notes(
    &self,
    owner: &str,
    repo: &str,
    tag: &str,
    previous_tag: Option<&str>,
  ) -> Result<String, ForgeError> {
    let resource = format!("{}/{}@{}", owner, repo, tag);
    let rb = self
      .request(Method::POST, &format!("/repos/{}/{}/releases/generate-notes", owner, repo))
      .json(&GenerateNotesRequest {
        tag_name: tag,
        previous_tag_name: previous_tag.filter(|p| !p.is_empty()),
      });
    let notes: GeneratedNotes = Self::parse(self.send(rb)?, &resource)?;
    Ok(notes.body)
  }
}

impl ReleaseHost for GitHubForge {
  fn get_release(&self, owner: &str, repo: &str, tag: &str) -> Result<Option<Release>, ForgeError> {
    let resource = format!("{}/{} release {}", owner, repo, tag);
    let rb = self.request(Method::GET, &format!("/repos/{}/{}/releases/tags/{}", owner, repo, tag));
    match Self::parse::<ReleasePayload>(self.send(rb)?, &resource) {
      Ok(payload) => Ok(Some(payload.into())),
      Err(ForgeError::NotFound { .. }) => Ok(None),
      Err(e) => Err(e),
    }
  }

  fn create_release(&self, owner: &str, repo: &str, release: &NewRelease<'_>) -> Result<Release, ForgeError> {
    let resource = format!("{}/{} release {}", owner, repo, release.tag);
    let rb = self
      .request(Method::POST, &format!("/repos/{}/{}/releases", owner, repo))
      .json(&CreateReleaseRequest {
        tag_name: release.tag,
        name: release.name,
        body: release.body,
        make_latest: if release.make_latest { "true" } else { "false" },
      });
    Ok(Self::parse::<ReleasePayload>(self.send(rb)?, &resource)?.into())
  }

  fn update_release(&self, owner: &str, repo: &str, id: u64, body: &str) -> Result<Release, ForgeError> {
    let resource = format!("{}/{} release #{}", owner, repo, id);
    let rb = self
      .request(Method::PATCH, &format!("/repos/{}/{}/releases/{}", owner, repo, id))
      .json(&UpdateReleaseRequest { body });
    Ok(Self::parse::<ReleasePayload>(self.send(rb)?, &resource)?.into())
  }
}

impl ArtifactStore for GitHubForge {
  fn read_artifact(&self, owner: &str, repo: &str, path: &str) -> Result<Option<StoredArtifact>, ForgeError> {
    let resource = format!("{}/{}/{}", owner, repo, path);
    let rb = self.request(Method::GET, &format!("/repos/{}/{}/contents/{}", owner, repo, path));
    let payload = match Self::parse::<ContentsPayload>(self.send(rb)?, &resource) {
      Ok(payload) => payload,
      Err(ForgeError::NotFound { .. }) => return Ok(None),
      Err(e) => return Err(e),
    };
    let content = decode_contents(&payload)?;
    Ok(Some(StoredArtifact {
      content,
      token: payload.sha,
    }))
  }

  fn write_artifact(
    &self,
    owner: &str,
    repo: &str,
    path: &str,
    content: &str,
    message: &str,
    expected_token: Option<&str>,
  ) -> Result<(), ForgeError> {
    let resource = format!("{}/{}/{}", owner, repo, path);
    let rb = self
      .request(Method::PUT, &format!("/repos/{}/{}/contents/{}", owner, repo, path))
      .json(&PutContentsRequest {
        message,
        content: STANDARD.encode(content.as_bytes()),
        sha: expected_token,
      });
    let resp = self.send(rb)?;
    let status = resp.status();
    if status.is_success() {
      return Ok(());
    }
    Err(contents_write_error(Self::status_error(status, resp, &resource), resource))
  }
}

fn api_error(status: StatusCode, body: String, resource: &str) -> ForgeError {
  if status == StatusCode::NOT_FOUND {
    return ForgeError::NotFound {
      resource: resource.to_string(),
    };
  }
  let message = serde_json::from_str::<ApiMessage>(&body)
    .map(|m| m.message)
    .unwrap_or(body);
  ForgeError::Api {
    status: status.as_u16(),
    message,
  }
}

/// Map a rejected contents write onto `Conflict` when the sha check failed
///
/// 409 is a sha mismatch. 422 covers both a missing sha for a file created
/// since the read and plain validation failures, so only a message naming
/// the sha counts as a conflict.
fn contents_write_error(err: ForgeError, resource: String) -> ForgeError {
  match err {
    ForgeError::Api { status: 409, .. } => ForgeError::Conflict { resource },
    ForgeError::Api { status: 422, ref message } if message.contains("sha") => ForgeError::Conflict { resource },
    other => other,
  }
}

/// Decode the base64 body of a contents response (GitHub wraps it at 60 columns)
fn decode_contents(payload: &ContentsPayload) -> Result<String, ForgeError> {
  match payload.encoding.as_deref() {
    Some("base64") | None => {}
    Some(other) => {
      return Err(ForgeError::Decode(format!("unsupported content encoding '{}'", other)));
    }
  }
  let raw: String = payload
    .content
    .as_deref()
    .unwrap_or_default()
    .chars()
    .filter(|c| !c.is_whitespace())
    .collect();
  let bytes = STANDARD.decode(raw)?;
  Ok(String::from_utf8(bytes)?)
}
