//! Chart retrieval and inventory discovery
//!
//! - **helm**: pull and unpack charts with the system `helm` binary
//! - **local**: serve pre-unpacked charts from a directory tree
//! - **scanner**: turn an installer chart's values into an [`Inventory`]
//!
//! [`Inventory`]: crate::core::inventory::Inventory

pub mod helm;
pub mod local;
pub mod scanner;

pub use helm::HelmCli;
pub use local::LocalCharts;
pub use scanner::InventoryScanner;

use crate::core::error::NotesResult;
use crate::core::inventory::PackageCoordinates;
use std::path::PathBuf;

/// Something that can materialize a chart as an unpacked directory
pub trait ChartSource: Sync {
  /// Fetch `chart` and return the directory holding its `Chart.yaml`
  fn pull(&self, chart: &PackageCoordinates) -> NotesResult<PathBuf>;

  /// Remove whatever `pull` left behind
  fn cleanup(&self) -> NotesResult<()> {
    Ok(())
  }
}
