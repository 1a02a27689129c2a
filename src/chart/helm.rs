//! System helm backend
//!
//! Runs `helm pull --untar` in an isolated environment. Each pull replaces any
//! previous unpack of the same chart under the working directory.

use super::ChartSource;
use crate::core::error::{ChartError, HELM_MISSING, NotesResult, ResultExt};
use crate::core::inventory::PackageCoordinates;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::Command;

/// Environment variables forwarded to helm; everything else is cleared
const FORWARDED_ENV: &[&str] = &[
  "PATH",
  "HOME",
  "HTTPS_PROXY",
  "HTTP_PROXY",
  "NO_PROXY",
  "https_proxy",
  "http_proxy",
  "no_proxy",
];

/// Chart puller using the system `helm` binary
pub struct HelmCli {
  work_dir: PathBuf,
  binary: PathBuf,
}

impl HelmCli {
  pub fn new(work_dir: impl Into<PathBuf>) -> Self {
    Self {
      work_dir: work_dir.into(),
      binary: PathBuf::from("helm"),
    }
  }

  /// Use a specific helm executable instead of the one on PATH
  pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
    self.binary = binary.into();
    self
  }

  /// Arguments for `helm pull` of one chart
  fn pull_args(&self, chart: &PackageCoordinates) -> Vec<String> {
    let mut args = vec!["pull".to_string()];
    if chart.registry.starts_with("oci://") {
      args.push(format!("{}/{}", chart.registry.trim_end_matches('/'), chart.name));
    } else {
      args.push(chart.name.clone());
      args.push("--repo".to_string());
      args.push(chart.registry.clone());
    }
    args.extend([
      "--version".to_string(),
      chart.version.clone(),
      "--untar".to_string(),
      "--untardir".to_string(),
      self.work_dir.display().to_string(),
    ]);
    args
  }

  /// Create a helm command with an isolated environment
  ///
  /// - Clears environment variables
  /// - Forwards PATH, HOME, proxies and every HELM_* / XDG_* variable
  fn helm_cmd(&self) -> Command {
    let mut cmd = Command::new(&self.binary);
    cmd.env_clear();
    for (key, value) in std::env::vars() {
      if FORWARDED_ENV.contains(&key.as_str()) || key.starts_with("HELM_") || key.starts_with("XDG_") {
        cmd.env(key, value);
      }
    }
    cmd
  }
}

impl ChartSource for HelmCli {
  fn pull(&self, chart: &PackageCoordinates) -> NotesResult<PathBuf> {
    fs::create_dir_all(&self.work_dir)
      .with_context(|| format!("Failed to create chart working directory {}", self.work_dir.display()))?;

    let target = self.work_dir.join(&chart.name);
    if target.exists() {
      fs::remove_dir_all(&target).with_context(|| format!("Failed to clear previous unpack at {}", target.display()))?;
    }

    let output = match self.helm_cmd().args(self.pull_args(chart)).output() {
      Ok(output) => output,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        return Err(
          ChartError::PullFailed {
            chart: chart.name.clone(),
            version: chart.version.clone(),
            stderr: format!("{}: {}", HELM_MISSING, self.binary.display()),
          }
          .into(),
        );
      }
      Err(e) => return Err(e.into()),
    };

    if !output.status.success() {
      return Err(
        ChartError::PullFailed {
          chart: chart.name.clone(),
          version: chart.version.clone(),
          stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
        .into(),
      );
    }

    tracing::debug!(
      chart = %chart.name,
      version = %chart.version,
      result = %String::from_utf8_lossy(&output.stdout).trim(),
      "helm pull result"
    );
    Ok(target)
  }

  fn cleanup(&self) -> NotesResult<()> {
    if self.work_dir.exists() {
      fs::remove_dir_all(&self.work_dir)
        .with_context(|| format!("Failed to remove chart working directory {}", self.work_dir.display()))?;
    }
    Ok(())
  }
}
