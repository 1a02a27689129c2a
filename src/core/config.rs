//! installer-notes configuration: file discovery, defaults and overlays
//!
//! Env and flag overlays are applied after loading, then `validate` runs once
//! in `RunContext::build`.

use crate::core::error::{ConfigError, NotesResult, ResultExt};
use crate::core::inventory::{FallbackTable, PackageCoordinates};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for installer-notes
///
/// Layered as built-in defaults, then the config file, then environment
/// variables, then CLI flags. The file is searched in order:
/// installer-notes.toml, .installer-notes.toml, .config/installer-notes.toml
///
/// # Example
///
/// ```toml
/// [installer]
/// version = "2.5.1"
/// previous_version = "2.5.0"
///
/// [github]
/// organizations = ["krateoplatformops", "krateoplatformops-blueprints"]
///
/// [fallback_repositories]
/// finops-composition-definition-parser = "finops-composition-definition-parser-chart"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotesConfig {
  #[serde(default)]
  pub installer: InstallerConfig,
  #[serde(default)]
  pub github: GitHubConfig,
  #[serde(default)]
  pub changelog: ChangelogConfig,
  #[serde(default)]
  pub output: OutputConfig,
  #[serde(default)]
  pub charts: ChartsConfig,
  #[serde(default)]
  pub forge: ForgeConfig,
  /// Component key → repository queried when the image name does not resolve
  #[serde(default)]
  pub fallback_repositories: BTreeMap<String, String>,
}

/// The installer chart whose versions are compared
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerConfig {
  /// Chart repository holding the installer chart
  pub registry: String,
  /// Installer chart name in the registry
  pub chart: String,
  /// Repository receiving the release (under `github.installer_organization`)
  pub github_repository: String,
  pub version: String,
  pub previous_version: String,
  /// Top-level values.yaml section listing components
  pub values_key: String,
}

impl Default for InstallerConfig {
  fn default() -> Self {
    Self {
      registry: "https://charts.krateo.io/".to_string(),
      chart: "installer".to_string(),
      github_repository: "installer-chart".to_string(),
      version: "2.5.1".to_string(),
      previous_version: "2.5.0".to_string(),
      values_key: "krateoplatformops".to_string(),
    }
  }
}

impl InstallerConfig {
  pub fn current(&self) -> PackageCoordinates {
    self.coordinates(&self.version)
  }

  pub fn previous(&self) -> PackageCoordinates {
    self.coordinates(&self.previous_version)
  }

  fn coordinates(&self, version: &str) -> PackageCoordinates {
    PackageCoordinates {
      registry: self.registry.clone(),
      name: self.chart.clone(),
      version: version.to_string(),
    }
  }
}

/// Forge owners and credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
  /// Paired with `organizations` by position; a single token is shared
  pub tokens: Vec<String>,
  /// Owner of the installer and changelog repositories
  pub installer_organization: String,
  /// Owners tried in order when fetching component notes
  pub organizations: Vec<String>,
  pub api_url: String,
  pub timeout_secs: u64,
}

impl Default for GitHubConfig {
  fn default() -> Self {
    Self {
      tokens: Vec::new(),
      installer_organization: "krateoplatformops".to_string(),
      organizations: vec!["krateoplatformops".to_string(), "krateoplatformops-blueprints".to_string()],
      api_url: "https://api.github.com".to_string(),
      timeout_secs: 30,
    }
  }
}

impl GitHubConfig {
  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }

  /// Pair every organization with its credential
  ///
  /// - no tokens: every owner is unauthenticated
  /// - one token: shared by every owner
  /// - one token per owner: paired by position
  pub fn owner_credentials(&self) -> NotesResult<Vec<(String, Option<String>)>> {
    let owners = &self.organizations;
    match self.tokens.len() {
      0 => Ok(owners.iter().map(|o| (o.clone(), None)).collect()),
      1 => Ok(owners.iter().map(|o| (o.clone(), Some(self.tokens[0].clone()))).collect()),
      n if n == owners.len() => Ok(
        owners
          .iter()
          .zip(&self.tokens)
          .map(|(o, t)| (o.clone(), Some(t.clone())))
          .collect(),
      ),
      n => Err(
        ConfigError::Invalid {
          field: "github.tokens".to_string(),
          reason: format!("{} tokens for {} organizations", n, owners.len()),
        }
        .into(),
      ),
    }
  }

  /// Token for the installer organization: its paired token, else the first one
  pub fn installer_token(&self) -> NotesResult<Option<String>> {
    let paired = self
      .owner_credentials()?
      .into_iter()
      .find(|(owner, _)| owner == &self.installer_organization)
      .and_then(|(_, token)| token);
    Ok(paired.or_else(|| self.tokens.first().cloned()))
  }
}

/// Where the cumulative changelog lives
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangelogConfig {
  /// Repository under `github.installer_organization`
  pub repository: String,
  pub path: String,
}

impl Default for ChangelogConfig {
  fn default() -> Self {
    Self {
      repository: "krateo".to_string(),
      path: "RELEASE_NOTES.md".to_string(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
  /// Local release notes file
  pub path: PathBuf,
  /// Product name used in the release title
  pub product: String,
}

impl Default for OutputConfig {
  fn default() -> Self {
    Self {
      path: PathBuf::from("./release_notes.md"),
      product: "Krateo".to_string(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartsConfig {
  /// Scratch directory for `helm pull --untar`
  pub work_dir: PathBuf,
  /// Pre-unpacked chart tree (`<root>/<chart>/<version>`) used instead of helm
  pub local_root: Option<PathBuf>,
}

impl Default for ChartsConfig {
  fn default() -> Self {
    Self {
      work_dir: PathBuf::from("./charts"),
      local_root: None,
    }
  }
}

/// Forge backend selection; GitHub unless a local root is set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgeConfig {
  pub local_root: Option<PathBuf>,
}

impl NotesConfig {
  /// Find config file in search order: installer-notes.toml, .installer-notes.toml, .config/installer-notes.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("installer-notes.toml"),
      path.join(".installer-notes.toml"),
      path.join(".config").join("installer-notes.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load the config file
  ///
  /// An explicit path must exist. Without one, the search locations under
  /// `dir` are tried and built-in defaults are used when none exists.
  pub fn load(dir: &Path, explicit: Option<&Path>) -> NotesResult<Self> {
    let config_path = match explicit {
      Some(path) if !path.exists() => {
        return Err(ConfigError::NotFound { path: path.to_path_buf() }.into());
      }
      Some(path) => path.to_path_buf(),
      None => match Self::find_config_path(dir) {
        Some(path) => path,
        None => {
          tracing::debug!(dir = %dir.display(), "no config file found, using defaults");
          return Ok(Self::default());
        }
      },
    };

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config: NotesConfig = toml_edit::de::from_str(&content)
      .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;
    tracing::debug!(path = %config_path.display(), "loaded config");
    Ok(config)
  }

  /// Overlay environment variables through `lookup`
  ///
  /// Empty values are ignored.
  pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("INSTALLER_CHART_REGISTRY") {
      self.installer.registry = v;
    }
    if let Some(v) = get("INSTALLER_CHART_REPOSITORY") {
      self.installer.chart = v;
    }
    if let Some(v) = get("INSTALLER_CHART_GITHUB_REPOSITORY") {
      self.installer.github_repository = v;
    }
    if let Some(v) = get("INSTALLER_CHART_VERSION") {
      self.installer.version = v;
    }
    if let Some(v) = get("INSTALLER_CHART_VERSION_PREVIOUS") {
      self.installer.previous_version = v;
    }
    if let Some(v) = get("TOKEN") {
      self.github.tokens = split_list(&v);
    }
    if let Some(v) = get("INSTALLER_ORGANIZATION") {
      self.github.installer_organization = v;
    }
    if let Some(v) = get("ORGANIZATIONS") {
      self.github.organizations = split_list(&v);
    }
    if let Some(v) = get("GITHUB_API_URL") {
      self.github.api_url = v;
    }
    if let Some(v) = get("KRATEO_REPOSITORY") {
      self.changelog.repository = v;
    }
  }

  /// Overlay the process environment
  pub fn apply_process_env(&mut self) {
    self.apply_env(|key| std::env::var(key).ok());
  }

  /// Overlay explicit command-line flags (highest precedence)
  pub fn apply_overrides(&mut self, overrides: &Overrides) {
    if let Some(v) = &overrides.version {
      self.installer.version = v.clone();
    }
    if let Some(v) = &overrides.previous_version {
      self.installer.previous_version = v.clone();
    }
    if let Some(p) = &overrides.output {
      self.output.path = p.clone();
    }
    if let Some(p) = &overrides.local_charts {
      self.charts.local_root = Some(p.clone());
    }
    if let Some(p) = &overrides.local_forge {
      self.forge.local_root = Some(p.clone());
    }
  }

  /// Validate the merged configuration
  pub fn validate(&self) -> NotesResult<()> {
    for (field, value) in [
      ("installer.version", &self.installer.version),
      ("installer.previous_version", &self.installer.previous_version),
      ("installer.chart", &self.installer.chart),
      ("installer.registry", &self.installer.registry),
      ("installer.values_key", &self.installer.values_key),
      ("github.installer_organization", &self.github.installer_organization),
    ] {
      if value.trim().is_empty() {
        return Err(ConfigError::MissingField { field: field.to_string() }.into());
      }
    }

    if self.github.organizations.is_empty() {
      return Err(
        ConfigError::MissingField {
          field: "github.organizations".to_string(),
        }
        .into(),
      );
    }
    if let Some(pos) = self.github.organizations.iter().position(|o| o.trim().is_empty()) {
      return Err(
        ConfigError::Invalid {
          field: "github.organizations".to_string(),
          reason: format!("entry {} is blank", pos + 1),
        }
        .into(),
      );
    }

    if self.github.timeout_secs == 0 {
      return Err(
        ConfigError::Invalid {
          field: "github.timeout_secs".to_string(),
          reason: "must be greater than zero".to_string(),
        }
        .into(),
      );
    }

    self.github.owner_credentials()?;
    Ok(())
  }

  pub fn fallback_table(&self) -> FallbackTable {
    FallbackTable::new(self.fallback_repositories.clone())
  }
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
  pub version: Option<String>,
  pub previous_version: Option<String>,
  pub output: Option<PathBuf>,
  pub local_charts: Option<PathBuf>,
  pub local_forge: Option<PathBuf>,
}

/// Split a comma separated list, dropping empty items
fn split_list(raw: &str) -> Vec<String> {
  raw
    .split(',')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(String::from)
    .collect()
}
