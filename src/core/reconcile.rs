//! Inventory reconciliation - diff two installer snapshots
//!
//! Every current component becomes a [`MergedEntry`]. A previous snapshot
//! entry contributes its application version only when the upstream image is
//! unchanged; identity changes are treated as replacement, so the old identity
//! is reported as removed and the new one gets an automatic notes range.

use crate::core::inventory::{ComponentMetadata, Inventory, MergedEntry, MergedInventory};
use serde::Serialize;
use std::fmt;

/// Heading of the removal report
pub const REMOVED_HEADING: &str = "## Removed Charts";

/// Line emitted when nothing was removed
pub const NOTHING_REMOVED: &str = "Nothing removed";

/// Why a previous component is listed as removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalKind {
  /// Key disappeared from the installer
  Dropped,
  /// Key persisted but points at a different upstream image
  Renamed,
}

/// One removal line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Removal {
  pub key: String,
  pub image_name: String,
  pub app_version: String,
  pub kind: RemovalKind,
}

impl Removal {
  fn from_previous(previous: &ComponentMetadata, kind: RemovalKind) -> Self {
    Self {
      key: previous.key.clone(),
      image_name: previous.image_name.clone(),
      app_version: previous.app_version.clone(),
      kind,
    }
  }
}

/// Components gone from the current installer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RemovalReport {
  pub removals: Vec<Removal>,
}

impl RemovalReport {
  pub fn is_empty(&self) -> bool {
    self.removals.is_empty()
  }

  /// Render the markdown block (heading always present)
  pub fn to_markdown(&self) -> String {
    let mut out = String::new();
    out.push_str(REMOVED_HEADING);
    out.push('\n');
    if self.removals.is_empty() {
      out.push_str(NOTHING_REMOVED);
      out.push('\n');
      return out;
    }
    for r in &self.removals {
      out.push_str(&format!("- {} v{}: Removed\n", r.image_name, r.app_version));
    }
    out
  }
}

impl fmt::Display for RemovalReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.to_markdown())
  }
}

/// Result of reconciling two snapshots
#[derive(Debug, Clone, Default, Serialize)]
pub struct Reconciliation {
  pub merged: MergedInventory,
  pub removed: RemovalReport,
}

/// Diff `current` against `previous`.
///
/// Removal lines list dropped keys first, then renamed keys; both groups are
/// in component-key order.
pub fn reconcile(current: &Inventory, previous: &Inventory) -> Reconciliation {
  let mut removals: Vec<Removal> = previous
    .iter()
    .filter(|(key, _)| !current.contains_key(*key))
    .map(|(_, prev)| Removal::from_previous(prev, RemovalKind::Dropped))
    .collect();

  let mut merged = Vec::with_capacity(current.len());
  for (key, component) in current {
    let previous_app_version = match previous.get(key) {
      None => {
        tracing::debug!(key = %key, image = %component.image_name, "new component");
        String::new()
      }
      Some(prev) if prev.image_name != component.image_name => {
        tracing::info!(
          key = %key,
          from = %prev.image_name,
          to = %component.image_name,
          "component upstream changed, treating as replacement"
        );
        removals.push(Removal::from_previous(prev, RemovalKind::Renamed));
        String::new()
      }
      Some(prev) => prev.app_version.clone(),
    };
    merged.push(MergedEntry {
      component: component.clone(),
      previous_app_version,
    });
  }

  Reconciliation {
    merged,
    removed: RemovalReport { removals },
  }
}
