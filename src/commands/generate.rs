use crate::core::changelog::{ChangelogLocation, ChangelogUpdate, append_release};
use crate::core::context::RunContext;
use crate::core::error::{NotesError, NotesResult, ResultExt};
use crate::core::reconcile::reconcile;
use crate::core::release::{Publication, publish_release, release_title};
use crate::core::synthesize::assemble_document;
use crate::ui::progress::ComponentProgress;
use std::fs;

/// Options for `installer-notes generate`
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
  /// Skip publishing the installer release
  pub no_publish: bool,
  /// Skip updating the running changelog
  pub no_changelog: bool,
  /// Bound the notes fetching pool
  pub jobs: Option<usize>,
  pub quiet: bool,
}

/// Run the generate command
///
/// Scanning, reconciliation and synthesis are fatal on failure. Publication
/// and the changelog update are independent steps: a failure is reported and
/// the remaining steps still run, then the command fails.
pub fn run_generate(ctx: &RunContext, opts: &GenerateOptions) -> NotesResult<()> {
  let config = &ctx.config;
  let installer = &config.installer;

  let scanned = ctx.scan_versions();
  if let Err(e) = ctx.cleanup_charts() {
    tracing::warn!(error = %e, "failed to remove chart working directory");
  }
  let (current, previous) = scanned?;

  let reconciliation = reconcile(&current, &previous);
  println!(
    "📦 {} component(s), {} removed",
    reconciliation.merged.len(),
    reconciliation.removed.removals.len()
  );

  let progress = ComponentProgress::for_batch(reconciliation.merged.len(), "Generating notes", opts.quiet);
  let synthesis = ctx
    .synthesizer(opts.jobs)
    .synthesize(&reconciliation.merged, progress.as_ref())?;
  let document = assemble_document(&reconciliation.removed, &synthesis);

  fs::write(&config.output.path, &document)
    .with_context(|| format!("Failed to write release notes to {}", config.output.path.display()))?;
  println!("✅ Release notes written to {}", config.output.path.display());

  let mut failures: Vec<(&str, NotesError)> = Vec::new();

  if opts.no_publish {
    println!("⏭️  Release publication skipped");
  } else {
    let owner = &config.github.installer_organization;
    let title = release_title(&config.output.product, &installer.previous_version, &installer.version);
    match publish_release(
      ctx.forge(),
      owner,
      &installer.github_repository,
      &installer.version,
      &title,
      &document,
    ) {
      Ok(Publication::Created { id }) => println!(
        "✅ Created release {} on {}/{} (id {})",
        installer.version, owner, installer.github_repository, id
      ),
      Ok(Publication::Updated { id }) => println!(
        "✅ Updated release {} on {}/{} (id {})",
        installer.version, owner, installer.github_repository, id
      ),
      Err(e) => {
        tracing::error!(owner = %owner, repo = %installer.github_repository, tag = %installer.version, error = %e, "release publication failed");
        failures.push(("release publication", e));
      }
    }
  }

  if opts.no_changelog {
    println!("⏭️  Changelog update skipped");
  } else {
    let location = ChangelogLocation {
      owner: config.github.installer_organization.clone(),
      repo: config.changelog.repository.clone(),
      path: config.changelog.path.clone(),
    };
    match append_release(ctx.forge(), &location, &installer.version, &document) {
      Ok(ChangelogUpdate::Created) => println!("✅ Created changelog {}", location.display()),
      Ok(ChangelogUpdate::Prepended) => println!("✅ Updated changelog {}", location.display()),
      Err(e) => {
        tracing::error!(changelog = %location.display(), error = %e, "changelog update failed");
        failures.push(("changelog update", e));
      }
    }
  }

  println!();
  println!(
    "📋 {} release notes generated, {} component(s) without notes",
    synthesis.components.len(),
    synthesis.unresolved.len()
  );
  for key in &synthesis.unresolved {
    println!("   ⚠️  {}", key);
  }

  if failures.is_empty() {
    return Ok(());
  }
  for (step, e) in &failures {
    println!("   ❌ {}: {}", step, e);
  }
  let count = failures.len();
  let (step, first) = failures.remove(0);
  Err(first.context(format!("{} step(s) failed, first: {}", count, step)))
}
