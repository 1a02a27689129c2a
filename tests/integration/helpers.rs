//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Environment variables that would leak host configuration into a run
const HOST_ENV: &[&str] = &[
  "TOKEN",
  "ORGANIZATIONS",
  "INSTALLER_ORGANIZATION",
  "INSTALLER_CHART_REGISTRY",
  "INSTALLER_CHART_REPOSITORY",
  "INSTALLER_CHART_GITHUB_REPOSITORY",
  "INSTALLER_CHART_VERSION",
  "INSTALLER_CHART_VERSION_PREVIOUS",
  "GITHUB_API_URL",
  "KRATEO_REPOSITORY",
  "RUST_LOG",
];

/// One component entry of an installer's values.yaml
pub struct Component<'a> {
  pub key: &'a str,
  pub chart: &'a str,
  pub version: &'a str,
  /// `image.repository`; `None` leaves the image section out
  pub image: Option<&'a str>,
}

/// A working directory with a local chart tree, a local forge and a config file
pub struct TestSetup {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestSetup {
  /// Two organizations (`org-a` owns the installer), installer 1.0.0 → 2.0.0
  pub fn new() -> Result<Self> {
    Self::with_extra_config("")
  }

  /// Same as `new`, with raw TOML appended to the config
  pub fn with_extra_config(extra: &str) -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();
    fs::create_dir_all(path.join("charts"))?;
    fs::create_dir_all(path.join("forge"))?;

    let config = format!(
      r#"[installer]
version = "2.0.0"
previous_version = "1.0.0"

[github]
installer_organization = "org-a"
organizations = ["org-a", "org-b"]

[charts]
local_root = "{charts}"

[forge]
local_root = "{forge}"

[output]
path = "release_notes.md"
product = "Krateo"
{extra}"#,
      charts = path.join("charts").display(),
      forge = path.join("forge").display(),
      extra = extra,
    );
    fs::write(path.join("installer-notes.toml"), config)?;

    Ok(Self { _root: root, path })
  }

  /// Write an unpacked installer chart with the given components
  pub fn add_installer(&self, version: &str, components: &[Component<'_>]) -> Result<()> {
    let dir = self.path.join("charts/installer").join(version);
    fs::create_dir_all(&dir)?;
    fs::write(
      dir.join("Chart.yaml"),
      format!("apiVersion: v2\nname: installer\nversion: {}\n", version),
    )?;

    let mut values = String::from("krateoplatformops:\n");
    for c in components {
      values.push_str(&format!(
        "  {}:\n    chart:\n      name: {}\n      version: {}\n      repository: https://charts.krateo.io\n",
        c.key, c.chart, c.version
      ));
      if let Some(image) = c.image {
        values.push_str(&format!("    image:\n      repository: {}\n", image));
      }
    }
    fs::write(dir.join("values.yaml"), values)?;
    Ok(())
  }

  /// Write an unpacked component chart
  pub fn add_chart(&self, name: &str, version: &str, app_version: &str) -> Result<()> {
    let dir = self.path.join("charts").join(name).join(version);
    fs::create_dir_all(&dir)?;
    fs::write(
      dir.join("Chart.yaml"),
      format!(
        "apiVersion: v2\nname: {}\nversion: {}\nappVersion: \"{}\"\n",
        name, version, app_version
      ),
    )?;
    Ok(())
  }

  /// Generated notes served for `<owner>/<repo>`; `range` is `<prev>...<tag>` or `<tag>`
  pub fn add_notes(&self, owner: &str, repo: &str, range: &str, body: &str) -> Result<()> {
    let dir = self.path.join("forge").join(owner).join(repo).join("notes");
    fs::create_dir_all(&dir)?;
    fs::write(dir.join(format!("{}.md", range)), body)?;
    Ok(())
  }

  /// Seed a file in the forge contents of `<owner>/<repo>`
  pub fn add_content(&self, owner: &str, repo: &str, path: &str, content: &str) -> Result<()> {
    let file = self.path.join("forge").join(owner).join(repo).join("contents").join(path);
    if let Some(parent) = file.parent() {
      fs::create_dir_all(parent)?;
    }
    fs::write(file, content)?;
    Ok(())
  }

  pub fn read_file(&self, rel: &str) -> Result<String> {
    let file = self.path.join(rel);
    fs::read_to_string(&file).with_context(|| format!("Failed to read {}", file.display()))
  }

  pub fn read_forge(&self, rel: &str) -> Result<String> {
    self.read_file(&format!("forge/{}", rel))
  }

  pub fn file_exists(&self, rel: &str) -> bool {
    self.path.join(rel).exists()
  }

  /// Body of the installer release `tag` stored by the local forge
  pub fn release_body(&self, tag: &str) -> Result<String> {
    let raw = self.read_forge(&format!("org-a/installer-chart/releases/{}.json", tag))?;
    let record: serde_json::Value = serde_json::from_str(&raw)?;
    record["body"]
      .as_str()
      .map(String::from)
      .context("release record has no body")
  }
}

/// Run the binary, returning its output whatever the exit status
pub fn run_installer_notes_raw(cwd: &Path, args: &[&str]) -> Result<Output> {
  let bin = env!("CARGO_BIN_EXE_installer-notes");

  let mut cmd = Command::new(bin);
  cmd.current_dir(cwd).args(args);
  for key in HOST_ENV {
    cmd.env_remove(key);
  }
  cmd.output().context("Failed to run installer-notes")
}

/// Run the binary and fail unless it exits successfully
pub fn run_installer_notes(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = run_installer_notes_raw(cwd, args)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "installer-notes command failed: installer-notes {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}
