//! Run context - build once, pass to every command
//!
//! ```text
//! main.rs:
//!   NotesConfig::load() + env + flags -> RunContext::build() -> &RunContext
//!   |
//!   v
//! commands/generate.rs, reconcile.rs:
//!   fn run_*(ctx: &RunContext, ...)
//! ```
//!
//! The context owns the chart source and one forge client per organization,
//! so commands never construct collaborators themselves.

use crate::chart::{ChartSource, HelmCli, InventoryScanner, LocalCharts};
use crate::core::config::NotesConfig;
use crate::core::error::{NotesResult, ResultExt};
use crate::core::inventory::{FallbackTable, Inventory, PackageCoordinates};
use crate::core::synthesize::{OwnerClient, Synthesizer};
use crate::forge::{ForgeClient, GitHubForge, LocalForge};
use std::sync::Arc;

/// Shared collaborators for a single run
pub struct RunContext {
  pub config: Arc<NotesConfig>,
  fallback: FallbackTable,
  charts: Box<dyn ChartSource>,
  /// One client per organization, in configuration order
  owners: Vec<(String, Arc<dyn ForgeClient>)>,
  /// Client for the installer organization (release and changelog)
  installer_forge: Arc<dyn ForgeClient>,
}

impl RunContext {
  /// Build collaborators from a validated configuration
  pub fn build(config: NotesConfig) -> NotesResult<Self> {
    config.validate()?;

    let charts: Box<dyn ChartSource> = match &config.charts.local_root {
      Some(root) => {
        tracing::info!(root = %root.display(), "using local chart tree");
        Box::new(LocalCharts::new(root))
      }
      None => Box::new(HelmCli::new(&config.charts.work_dir)),
    };

    let mut owners = Vec::new();
    for (owner, token) in config.github.owner_credentials()? {
      let forge = make_forge(&config, token).with_context(|| format!("Failed to create client for {}", owner))?;
      owners.push((owner, forge));
    }
    let installer_forge = make_forge(&config, config.github.installer_token()?)
      .with_context(|| format!("Failed to create client for {}", config.github.installer_organization))?;

    Ok(Self {
      fallback: config.fallback_table(),
      config: Arc::new(config),
      charts,
      owners,
      installer_forge,
    })
  }

  pub fn forge(&self) -> &dyn ForgeClient {
    self.installer_forge.as_ref()
  }

  /// Scan one installer version into an inventory
  pub fn scan(&self, installer: &PackageCoordinates) -> NotesResult<Inventory> {
    tracing::info!(chart = %installer.name, version = %installer.version, "scanning installer chart");
    InventoryScanner::new(self.charts.as_ref(), &self.config.installer.values_key, &self.fallback).scan(installer)
  }

  /// Scan the current then the previous installer version
  ///
  /// The chart working area is cleared between the two scans.
  pub fn scan_versions(&self) -> NotesResult<(Inventory, Inventory)> {
    let current = self
      .scan(&self.config.installer.current())
      .with_context(|| format!("Failed to scan installer {}", self.config.installer.version))?;
    self.cleanup_charts()?;
    let previous = self
      .scan(&self.config.installer.previous())
      .with_context(|| format!("Failed to scan installer {}", self.config.installer.previous_version))?;
    Ok((current, previous))
  }

  /// Remove pulled charts (no-op for a local chart tree)
  pub fn cleanup_charts(&self) -> NotesResult<()> {
    self.charts.cleanup()
  }

  /// Notes synthesizer over every configured organization
  pub fn synthesizer(&self, jobs: Option<usize>) -> Synthesizer {
    let owners = self
      .owners
      .iter()
      .map(|(owner, forge)| OwnerClient::new(owner.clone(), forge.clone()))
      .collect();
    let synthesizer = Synthesizer::new(owners, self.fallback.clone());
    match jobs {
      Some(n) => synthesizer.with_jobs(n),
      None => synthesizer,
    }
  }
}

fn make_forge(config: &NotesConfig, token: Option<String>) -> NotesResult<Arc<dyn ForgeClient>> {
  if let Some(root) = &config.forge.local_root {
    return Ok(Arc::new(LocalForge::new(root)));
  }
  let forge = GitHubForge::new(&config.github.api_url, token, config.github.timeout())?;
  Ok(Arc::new(forge))
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn test_build_with_local_backends() {
    let dir = TempDir::new().unwrap();
    let mut config = NotesConfig::default();
    config.charts.local_root = Some(dir.path().join("charts"));
    config.forge.local_root = Some(dir.path().join("forge"));
    config.github.tokens = vec!["t".to_string()];

    let ctx = RunContext::build(config).unwrap();
    assert_eq!(ctx.synthesizer(Some(2)).owners().len(), 2);
    // Local chart tree is never removed
    ctx.cleanup_charts().unwrap();
  }

  #[test]
  fn test_build_rejects_token_mismatch() {
    let mut config = NotesConfig::default();
    config.forge.local_root = Some("/tmp/forge".into());
    config.github.tokens = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    assert!(RunContext::build(config).is_err());
  }
}
