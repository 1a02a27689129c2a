//! Tests for the `generate` command

use crate::helpers::*;
use anyhow::Result;

const CORE_NOTES: &str = "## What's Changed
* feat: widgets by @alice in https://github.com/org-a/core-provider/pull/1
* fix: crash by @bob in https://github.com/org-a/core-provider/pull/2
* not a commit line

**Full Changelog**: https://github.com/org-a/core-provider/compare/0.1.0...0.2.0
";

const NEWBIE_NOTES: &str = "* docs: guide by @carol in https://github.com/org-b/newbie/pull/3\n";

/// Installer 1.0.0 → 2.0.0: `core` upgraded, `legacy` dropped, `newbie` added
/// (its notes only exist under the second organization)
fn upgrade_setup(extra_config: &str) -> Result<TestSetup> {
  let setup = TestSetup::with_extra_config(extra_config)?;
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
        key: "legacy",
        chart: "legacy",
        version: "0.1.0",
        image: Some("ghcr.io/org-a/legacy"),
      },
    ],
  )?;
  setup.add_installer(
    "2.0.0",
    &[
      Component {
        key: "core",
        chart: "core-provider",
        version: "0.2.0",
        image: Some("ghcr.io/org-a/core-provider"),
      },
      Component {
        key: "newbie",
        chart: "newbie",
        version: "0.1.0",
        image: Some("ghcr.io/org-b/newbie"),
      },
    ],
  )?;
  setup.add_chart("core-provider", "0.1.0", "0.1.0")?;
  setup.add_chart("core-provider", "0.2.0", "0.2.0")?;
  setup.add_chart("legacy", "0.1.0", "0.1.0")?;
  setup.add_chart("newbie", "0.1.0", "1.0.0")?;

  setup.add_notes("org-a", "core-provider", "0.1.0...0.2.0", CORE_NOTES)?;
  setup.add_notes("org-b", "newbie", "1.0.0", NEWBIE_NOTES)?;
  Ok(setup)
}

fn expected_document() -> String {
  [
    "## Removed Charts\n- legacy v0.1.0: Removed\n",
    "\n",
    "## core-provider v0.2.0\n### What's Changed\n",
    "\n### ✨ Features\n- feat: widgets ([link](https://github.com/org-a/core-provider/pull/1)) by @alice\n",
    "\n### 🐛 Bug Fixes\n- fix: crash ([link](https://github.com/org-a/core-provider/pull/2)) by @bob\n",
    "\n\n\n",
    "## newbie v1.0.0\n### What's Changed\n",
    "\n### 📚 Documentation\n- docs: guide ([link](https://github.com/org-b/newbie/pull/3)) by @carol\n",
    "\n\n\n",
  ]
  .concat()
}

#[test]
fn test_generate_writes_document_release_and_changelog() -> Result<()> {
  let setup = upgrade_setup("")?;

  let output = run_installer_notes(&setup.path, &["--quiet", "generate"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  let document = setup.read_file("release_notes.md")?;
  assert_eq!(document, expected_document());

  // Release created with the document as body
  assert_eq!(setup.release_body("2.0.0")?, document);
  let release = setup.read_forge("org-a/installer-chart/releases/2.0.0.json")?;
  assert!(release.contains("Release Notes For Krateo 1.0.0 ... 2.0.0"));

  // New changelog
  let changelog = setup.read_forge("org-a/krateo/contents/RELEASE_NOTES.md")?;
  assert_eq!(changelog, format!("# Release 2.0.0\n\n{}\n\n", document));

  assert!(stdout.contains("Created release 2.0.0"));
  assert!(stdout.contains("Created changelog"));
  Ok(())
}

#[test]
fn test_generate_twice_updates_release_and_prepends_changelog() -> Result<()> {
  let setup = upgrade_setup("")?;

  run_installer_notes(&setup.path, &["--quiet", "generate"])?;
  let output = run_installer_notes(&setup.path, &["--quiet", "generate"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("Updated release 2.0.0"));

  let releases: Vec<_> = std::fs::read_dir(setup.path.join("forge/org-a/installer-chart/releases"))?.collect();
  assert_eq!(releases.len(), 1);

  let document = expected_document();
  let first = format!("# Release 2.0.0\n\n{}\n\n", document);
  let changelog = setup.read_forge("org-a/krateo/contents/RELEASE_NOTES.md")?;
  assert_eq!(changelog, format!("# Release 2.0.0\n\n{}\n<br><br>\n{}", document, first));
  Ok(())
}

#[test]
fn test_generate_prepends_existing_history() -> Result<()> {
  let setup = upgrade_setup("")?;
  setup.add_content("org-a", "krateo", "RELEASE_NOTES.md", "# Release 1.0.0\n\nold\n\n")?;

  run_installer_notes(&setup.path, &["--quiet", "generate", "--no-publish"])?;

  let changelog = setup.read_forge("org-a/krateo/contents/RELEASE_NOTES.md")?;
  assert!(changelog.starts_with("# Release 2.0.0\n\n## Removed Charts\n"));
  assert!(changelog.ends_with("\n<br><br>\n# Release 1.0.0\n\nold\n\n"));
  assert!(!setup.file_exists("forge/org-a/installer-chart/releases"));
  Ok(())
}

#[test]
fn test_generate_uses_fallback_repository() -> Result<()> {
  let setup = TestSetup::with_extra_config("\n[fallback_repositories]\nfinops = \"finops-chart\"\n")?;
  setup.add_installer(
    "1.0.0",
    &[Component {
      key: "finops",
      chart: "finops-operator",
      version: "0.2.0",
      image: None,
    }],
  )?;
  setup.add_installer(
    "2.0.0",
    &[Component {
      key: "finops",
      chart: "finops-operator",
      version: "0.3.0",
      image: None,
    }],
  )?;
  setup.add_chart("finops-operator", "0.2.0", "0.2.0")?;
  setup.add_chart("finops-operator", "0.3.0", "1.4.0")?;
  // Fallback lookup uses the package version and an automatic range
  setup.add_notes(
    "org-b",
    "finops-chart",
    "0.3.0",
    "* feat: budgets by @dana in https://github.com/org-b/finops-chart/pull/7\n",
  )?;

  run_installer_notes(
    &setup.path,
    &["--quiet", "generate", "--no-publish", "--no-changelog", "--output", "notes.md"],
  )?;

  let document = setup.read_file("notes.md")?;
  assert!(document.starts_with("## Removed Charts\nNothing removed\n\n"));
  assert!(document.contains("## finops-chart v0.3.0\n### What's Changed\n\n### ✨ Features\n"));
  assert!(!setup.file_exists("release_notes.md"));
  assert!(!setup.file_exists("forge/org-a/krateo"));
  Ok(())
}

#[test]
fn test_generate_skips_component_without_notes() -> Result<()> {
  let setup = upgrade_setup("")?;
  std::fs::remove_dir_all(setup.path.join("forge/org-b/newbie"))?;

  let output = run_installer_notes(&setup.path, &["--quiet", "generate", "--no-publish", "--no-changelog"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  let document = setup.read_file("release_notes.md")?;
  assert!(document.contains("## core-provider v0.2.0"));
  assert!(!document.contains("newbie"));
  assert!(stdout.contains("1 component(s) without notes"));
  Ok(())
}

#[test]
fn test_failed_publication_still_updates_changelog() -> Result<()> {
  let setup = upgrade_setup("")?;
  // A file where the releases directory should be makes every release lookup fail
  std::fs::create_dir_all(setup.path.join("forge/org-a/installer-chart"))?;
  std::fs::write(setup.path.join("forge/org-a/installer-chart/releases"), "")?;

  let output = run_installer_notes_raw(&setup.path, &["--quiet", "generate"])?;
  assert!(!output.status.success());

  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("release publication"));

  // Local file and changelog were still produced
  assert_eq!(setup.read_file("release_notes.md")?, expected_document());
  assert!(setup.file_exists("forge/org-a/krateo/contents/RELEASE_NOTES.md"));
  Ok(())
}

#[test]
fn test_generate_fails_for_missing_installer_version() -> Result<()> {
  let setup = upgrade_setup("")?;

  let output = run_installer_notes_raw(&setup.path, &["--quiet", "generate", "--installer-version", "9.9.9"])?;
  assert!(!output.status.success());
  assert!(String::from_utf8_lossy(&output.stderr).contains("9.9.9"));
  assert!(!setup.file_exists("release_notes.md"));
  Ok(())
}
