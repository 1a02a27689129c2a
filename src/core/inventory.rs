//! Component inventory data model
//!
//! An inventory is one installer snapshot: component key → metadata. Keys are
//! kept in a `BTreeMap` so every report built from an inventory is ordered by
//! component key.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Where a sub-chart package can be fetched from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageCoordinates {
  /// Chart repository URL
  pub registry: String,
  /// Chart name inside the repository
  pub name: String,
  /// Chart (package) version, not the application version
  pub version: String,
}

/// One component of an installer snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentMetadata {
  /// Stable identifier within the installer values
  pub key: String,
  /// Upstream repository name used to query notes
  pub image_name: String,
  pub package: PackageCoordinates,
  /// Version of the running application inside the package
  pub app_version: String,
}

impl ComponentMetadata {
  /// Build metadata, substituting the package version when the chart declares
  /// no application version.
  pub fn new(
    key: impl Into<String>,
    image_name: impl Into<String>,
    package: PackageCoordinates,
    app_version: Option<String>,
  ) -> Self {
    let app_version = app_version
      .filter(|v| !v.trim().is_empty())
      .unwrap_or_else(|| package.version.clone());
    Self {
      key: key.into(),
      image_name: image_name.into(),
      package,
      app_version,
    }
  }
}

impl fmt::Display for ComponentMetadata {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} v{} (chart {}@{} from {})",
      self.image_name, self.app_version, self.package.name, self.package.version, self.package.registry
    )
  }
}

/// One installer snapshot, ordered by component key
pub type Inventory = BTreeMap<String, ComponentMetadata>;

/// A current component annotated with the version it is upgraded from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedEntry {
  #[serde(flatten)]
  pub component: ComponentMetadata,
  /// Empty when the component is new or its upstream identity changed
  pub previous_app_version: String,
}

impl MergedEntry {
  /// True when there is no previous tag to diff against
  pub fn is_new(&self) -> bool {
    self.previous_app_version.is_empty()
  }

  /// Previous tag for the notes query; `None` means automatic range
  pub fn previous_tag(&self) -> Option<&str> {
    if self.is_new() {
      None
    } else {
      Some(&self.previous_app_version)
    }
  }
}

/// Merged entries in component-key order
pub type MergedInventory = Vec<MergedEntry>;

/// Immutable component key → alternate repository name table
///
/// Used when a component's image name does not resolve to a repository
/// (missing `image.repository`, or notes generation failing for the image).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FallbackTable(BTreeMap<String, String>);

impl FallbackTable {
  pub fn new(entries: BTreeMap<String, String>) -> Self {
    Self(entries)
  }

  /// Alternate repository name for a component key
  pub fn get(&self, component_key: &str) -> Option<&str> {
    self.0.get(component_key).map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FallbackTable {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
  }
}
