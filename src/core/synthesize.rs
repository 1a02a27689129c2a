//! Release-notes synthesis across all merged components
//!
//! Resolution order for one component, per owner (first success wins):
//!
//! 1. `generate_notes(owner, image_name, app_version, previous_app_version)`
//! 2. on failure, if the component key has a fallback repository:
//!    `generate_notes(owner, fallback, package_version, <automatic range>)`
//!
//! Owners are tried in configuration order. A component that no owner
//! resolves contributes nothing; the batch never aborts because of it.

use crate::core::error::NotesResult;
use crate::core::inventory::{FallbackTable, MergedEntry, MergedInventory};
use crate::core::notes::{CategorizedNotes, categorize};
use crate::core::reconcile::RemovalReport;
use crate::forge::NotesGenerator;
use crate::ui::progress::ComponentProgress;
use rayon::prelude::*;
use std::sync::Arc;

/// A notes client bound to one organization's credential
#[derive(Clone)]
pub struct OwnerClient {
  pub owner: String,
  pub notes: Arc<dyn NotesGenerator>,
}

impl OwnerClient {
  pub fn new(owner: impl Into<String>, notes: Arc<dyn NotesGenerator>) -> Self {
    Self {
      owner: owner.into(),
      notes,
    }
  }
}

/// Which lookup produced a component's notes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
  /// Image name with the application version range
  Primary,
  /// Fallback repository with the package version, automatic range
  Fallback,
}

/// Rendered notes for one component
#[derive(Debug, Clone)]
pub struct ComponentNotes {
  pub key: String,
  /// Repository the notes came from (image name or fallback name)
  pub repository: String,
  /// Tag the notes were generated for
  pub version: String,
  pub owner: String,
  pub resolution: Resolution,
  pub notes: CategorizedNotes,
}

impl ComponentNotes {
  pub fn heading(&self) -> String {
    format!("{} v{}", self.repository, self.version)
  }

  pub fn to_markdown(&self) -> String {
    format!("## {}\n### What's Changed\n{}\n\n", self.heading(), self.notes.to_markdown())
  }
}

/// Outcome of a synthesis batch
#[derive(Debug, Clone, Default)]
pub struct Synthesis {
  /// Resolved components, in merged-inventory order
  pub components: Vec<ComponentNotes>,
  /// Component keys nothing could be generated for
  pub unresolved: Vec<String>,
}

impl Synthesis {
  /// Concatenated component blocks
  pub fn to_markdown(&self) -> String {
    self.components.iter().map(ComponentNotes::to_markdown).collect()
  }
}

/// Final document: removal report, blank line, component blocks
pub fn assemble_document(removed: &RemovalReport, synthesis: &Synthesis) -> String {
  format!("{}\n{}", removed.to_markdown(), synthesis.to_markdown())
}

/// Builds release notes from the owner clients and the fallback table
pub struct Synthesizer {
  owners: Vec<OwnerClient>,
  fallback: FallbackTable,
  jobs: Option<usize>,
}

impl Synthesizer {
  pub fn new(owners: Vec<OwnerClient>, fallback: FallbackTable) -> Self {
    Self {
      owners,
      fallback,
      jobs: None,
    }
  }

  /// Bound the number of components fetched concurrently (`1` = sequential)
  pub fn with_jobs(mut self, jobs: usize) -> Self {
    self.jobs = Some(jobs.max(1));
    self
  }

  pub fn owners(&self) -> &[OwnerClient] {
    &self.owners
  }

  /// Resolve one component through the owner and fallback chain
  pub fn resolve(&self, entry: &MergedEntry) -> Option<ComponentNotes> {
    let component = &entry.component;
    if entry.is_new() {
      tracing::warn!(key = %component.key, image = %component.image_name, "empty previous version, using automatic range");
    }

    for client in &self.owners {
      tracing::info!(
        key = %component.key,
        owner = %client.owner,
        image = %component.image_name,
        from = %entry.previous_app_version,
        to = %component.app_version,
        "generating release notes"
      );
      match client.notes.generate_notes(
        &client.owner,
        &component.image_name,
        &component.app_version,
        entry.previous_tag(),
      ) {
        Ok(body) => {
          return Some(ComponentNotes {
            key: component.key.clone(),
            repository: component.image_name.clone(),
            version: component.app_version.clone(),
            owner: client.owner.clone(),
            resolution: Resolution::Primary,
            notes: categorize(&body),
          });
        }
        Err(err) => {
          tracing::warn!(
            key = %component.key,
            owner = %client.owner,
            image = %component.image_name,
            error = %err,
            "release notes generation failed"
          );
        }
      }

      let Some(alternate) = self.fallback.get(&component.key) else {
        continue;
      };
      tracing::info!(
        key = %component.key,
        owner = %client.owner,
        repository = alternate,
        tag = %component.package.version,
        "retrying with fallback repository and chart version"
      );
      match client
        .notes
        .generate_notes(&client.owner, alternate, &component.package.version, None)
      {
        Ok(body) => {
          return Some(ComponentNotes {
            key: component.key.clone(),
            repository: alternate.to_string(),
            version: component.package.version.clone(),
            owner: client.owner.clone(),
            resolution: Resolution::Fallback,
            notes: categorize(&body),
          });
        }
        Err(err) => {
          tracing::warn!(
            key = %component.key,
            owner = %client.owner,
            repository = alternate,
            error = %err,
            "fallback release notes generation failed"
          );
        }
      }
    }

    tracing::error!(key = %component.key, image = %component.image_name, "no release notes generated, skipping component");
    None
  }

  /// Resolve every merged entry; per-component fetches run in parallel and
  /// results keep merged-inventory order.
  pub fn synthesize(&self, merged: &MergedInventory, progress: Option<&ComponentProgress>) -> NotesResult<Synthesis> {
    let run = || -> Vec<(String, Option<ComponentNotes>)> {
      merged
        .par_iter()
        .map(|entry| {
          let resolved = self.resolve(entry);
          if let Some(p) = progress {
            p.inc();
          }
          (entry.component.key.clone(), resolved)
        })
        .collect()
    };

    let results = match self.jobs {
      Some(jobs) => rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?.install(run),
      None => run(),
    };

    let mut synthesis = Synthesis::default();
    for (key, resolved) in results {
      match resolved {
        Some(notes) => synthesis.components.push(notes),
        None => synthesis.unresolved.push(key),
      }
    }
    Ok(synthesis)
  }
}
