//! Tests for the `reconcile` command

use crate::helpers::*;
use anyhow::Result;

fn rename_setup() -> Result<TestSetup> {
  let setup = TestSetup::new()?;
  setup.add_installer(
    "1.0.0",
    &[
      Component {
        key: "core",
        chart: "core-provider",
        version: "0.1.0",
        image: Some("ghcr.io/org-a/core-provider"),
      },
      Component {
        key: "gateway",
        chart: "gateway",
        version: "0.1.0",
        image: Some("ghcr.io/org-a/old-gateway"),
      },
    ],
  )?;
  setup.add_installer(
    "2.0.0",
    &[
      Component {
        key: "core",
        chart: "core-provider",
        version: "0.1.0",
        image: Some("ghcr.io/org-a/core-provider"),
      },
      Component {
        key: "gateway",
        chart: "gateway",
        version: "0.2.0",
        image: Some("ghcr.io/org-a/new-gateway"),
      },
    ],
  )?;
  setup.add_chart("core-provider", "0.1.0", "0.1.0")?;
  setup.add_chart("gateway", "0.1.0", "1.0.0")?;
  setup.add_chart("gateway", "0.2.0", "2.0.0")?;
  Ok(setup)
}

#[test]
fn test_reconcile_reports_rename_as_removal() -> Result<()> {
  let setup = rename_setup()?;

  let output = run_installer_notes(&setup.path, &["--quiet", "reconcile"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("## Removed Charts\n- old-gateway v1.0.0: Removed\n"));
  assert!(stdout.contains("(gateway changed upstream)"));
  assert!(stdout.contains("new-gateway"));
  assert!(stdout.contains("(new)"));
  Ok(())
}

#[test]
fn test_reconcile_json() -> Result<()> {
  let setup = rename_setup()?;

  let output = run_installer_notes(&setup.path, &["--quiet", "reconcile", "--json"])?;
  let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;

  let merged = json["merged"].as_array().expect("merged array");
  assert_eq!(merged.len(), 2);
  assert_eq!(merged[0]["key"], "core");
  assert_eq!(merged[0]["previous_app_version"], "0.1.0");
  assert_eq!(merged[1]["image_name"], "new-gateway");
  assert_eq!(merged[1]["previous_app_version"], "");

  let removals = json["removed"]["removals"].as_array().expect("removals array");
  assert_eq!(removals.len(), 1);
  assert_eq!(removals[0]["kind"], "renamed");

  // Nothing written or published
  assert!(!setup.file_exists("release_notes.md"));
  Ok(())
}

#[test]
fn test_reconcile_identical_versions() -> Result<()> {
  let setup = rename_setup()?;

  let output = run_installer_notes(
    &setup.path,
    &["--quiet", "reconcile", "--previous-version", "2.0.0"],
  )?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("## Removed Charts\nNothing removed\n"));
  Ok(())
}

#[test]
fn test_reconcile_rejects_missing_config_file() -> Result<()> {
  let setup = rename_setup()?;

  let output = run_installer_notes_raw(&setup.path, &["reconcile", "--config", "missing.toml"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("Configuration file not found"));
  Ok(())
}
