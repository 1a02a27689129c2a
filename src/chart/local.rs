//! Pre-unpacked charts laid out as `<root>/<chart>/<version>/`

use super::ChartSource;
use crate::core::error::{ChartError, NotesResult};
use crate::core::inventory::PackageCoordinates;
use std::path::PathBuf;

/// Chart source reading from a local directory tree (never cleaned up)
pub struct LocalCharts {
  root: PathBuf,
}

impl LocalCharts {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }
}

impl ChartSource for LocalCharts {
  fn pull(&self, chart: &PackageCoordinates) -> NotesResult<PathBuf> {
    let dir = self.root.join(&chart.name).join(&chart.version);
    if !dir.is_dir() {
      return Err(ChartError::LocalChartMissing { path: dir }.into());
    }
    tracing::debug!(chart = %chart.name, version = %chart.version, path = %dir.display(), "using local chart");
    Ok(dir)
  }
}
