//! Inventory discovery from an installer chart
//!
//! The installer's `values.yaml` lists its components under one section:
//!
//! ```yaml
//! krateoplatformops:
//!   core-provider:
//!     chart:
//!       name: core-provider
//!       version: 0.24.2
//!       repository: https://charts.krateo.io
//!     image:
//!       repository: ghcr.io/krateoplatformops/core-provider
//! ```
//!
//! Each component's sub-chart is pulled to read `appVersion` from its
//! `Chart.yaml`. Entries that cannot be resolved are skipped with a warning;
//! only an unusable installer is fatal.

use super::ChartSource;
use crate::core::error::{ChartError, NotesResult, ResultExt};
use crate::core::inventory::{ComponentMetadata, FallbackTable, Inventory, PackageCoordinates};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;

/// Builds inventories from installer chart snapshots
pub struct InventoryScanner<'a> {
  source: &'a dyn ChartSource,
  values_key: &'a str,
  fallback: &'a FallbackTable,
}

impl<'a> InventoryScanner<'a> {
  pub fn new(source: &'a dyn ChartSource, values_key: &'a str, fallback: &'a FallbackTable) -> Self {
    Self {
      source,
      values_key,
      fallback,
    }
  }

  /// Pull `installer` and resolve every component it declares
  pub fn scan(&self, installer: &PackageCoordinates) -> NotesResult<Inventory> {
    let installer_dir = self.source.pull(installer).with_context(|| {
      format!(
        "There was an error while pulling installer chart {} {}",
        installer.name, installer.version
      )
    })?;

    let values_path = installer_dir.join("values.yaml");
    let raw = fs::read_to_string(&values_path).with_context(|| format!("Failed to read {}", values_path.display()))?;
    let values: Value =
      serde_yaml::from_str(&raw).with_context(|| format!("Failed to parse {}", values_path.display()))?;

    let section = values
      .get(self.values_key)
      .and_then(Value::as_mapping)
      .ok_or_else(|| ChartError::ValuesSection {
        key: self.values_key.to_string(),
      })?;

    let mut inventory = Inventory::new();
    for (key, value) in section {
      let Some(key) = key.as_str() else {
        tracing::warn!(key = ?key, "skipping non-string component key");
        continue;
      };
      if let Some(component) = self.resolve_component(key, value) {
        tracing::debug!(key, component = %component, "resolved component");
        inventory.insert(key.to_string(), component);
      }
    }

    if inventory.is_empty() {
      return Err(
        ChartError::NoEntries {
          key: self.values_key.to_string(),
        }
        .into(),
      );
    }
    Ok(inventory)
  }

  fn resolve_component(&self, key: &str, value: &Value) -> Option<ComponentMetadata> {
    let Some(entry) = value.as_mapping() else {
      tracing::warn!(key, "skipping: not a map");
      return None;
    };
    let Some(chart) = entry.get("chart") else {
      tracing::warn!(key, "skipping: no chart field");
      return None;
    };
    let Some(chart) = chart.as_mapping() else {
      tracing::warn!(key, "skipping: chart is not a map");
      return None;
    };

    let mut fields = [None, None, None];
    for (slot, field) in fields.iter_mut().zip(["name", "version", "repository"]) {
      match string_field(chart, field) {
        Some(v) => *slot = Some(v),
        None => {
          tracing::warn!(key, field, "skipping: chart.{} is not a string", field);
          return None;
        }
      }
    }
    let [Some(name), Some(version), Some(registry)] = fields else {
      return None;
    };
    let package = PackageCoordinates { registry, name, version };

    let image_name = match image_name(entry) {
      Some(image) => image,
      None => match self.fallback.get(key) {
        Some(alternate) => {
          tracing::info!(key, repository = alternate, "no image.repository, using fallback repository");
          alternate.to_string()
        }
        None => {
          tracing::warn!(key, "skipping: no image.repository and no fallback repository");
          return None;
        }
      },
    };

    let chart_dir = match self.source.pull(&package) {
      Ok(dir) => dir,
      Err(err) => {
        tracing::warn!(key, chart = %package.name, version = %package.version, error = %err, "skipping: failed to download chart");
        return None;
      }
    };

    let app_version = match read_app_version(&chart_dir) {
      Ok(v) => v,
      Err(err) => {
        tracing::warn!(key, chart = %package.name, error = %err, "skipping: failed to obtain chart appVersion");
        return None;
      }
    };

    Some(ComponentMetadata::new(key, image_name, package, app_version))
  }
}

/// String value of a chart field; numeric YAML scalars (`version: 1.0`) are accepted
fn string_field(map: &Mapping, field: &str) -> Option<String> {
  scalar_string(map.get(field)?)
}

fn scalar_string(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

/// Last path segment of `image.repository`
fn image_name(entry: &Mapping) -> Option<String> {
  let repository = entry.get("image")?.as_mapping()?.get("repository")?.as_str()?;
  let name = repository.trim_end_matches('/').rsplit('/').next()?;
  if name.is_empty() { None } else { Some(name.to_string()) }
}

/// `appVersion` from `<dir>/Chart.yaml`; `None` when the chart declares none
fn read_app_version(chart_dir: &Path) -> NotesResult<Option<String>> {
  let path = chart_dir.join("Chart.yaml");
  let raw = fs::read_to_string(&path).with_context(|| format!("Failed to read Chart.yaml at {}", path.display()))?;
  let chart: Value = serde_yaml::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))?;
  Ok(chart.get("appVersion").and_then(scalar_string))
}
