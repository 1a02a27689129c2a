use crate::core::context::RunContext;
use crate::core::error::{NotesResult, ResultExt};
use crate::core::reconcile::{RemovalKind, reconcile};

/// Run the reconcile command
///
/// Scans both installer versions and prints the removal report followed by
/// the merged inventory.
pub fn run_reconcile(ctx: &RunContext, json: bool) -> NotesResult<()> {
  let scanned = ctx.scan_versions();
  let cleanup = ctx.cleanup_charts();
  let (current, previous) = scanned?;
  cleanup?;

  let reconciliation = reconcile(&current, &previous);

  if json {
    println!(
      "{}",
      serde_json::to_string_pretty(&reconciliation).context("Failed to serialize reconciliation")?
    );
    return Ok(());
  }

  let installer = &ctx.config.installer;
  println!(
    "📊 Installer {} {} ... {}",
    installer.chart, installer.previous_version, installer.version
  );
  println!();
  print!("{}", reconciliation.removed);
  for removal in &reconciliation.removed.removals {
    if removal.kind == RemovalKind::Renamed {
      println!("   ({} changed upstream)", removal.key);
    }
  }
  println!();

  println!("{:<40} {:<40} {:<20} PREVIOUS", "KEY", "IMAGE", "VERSION");
  println!("{:-<120}", "");
  for entry in &reconciliation.merged {
    let component = &entry.component;
    let previous = if entry.is_new() { "(new)" } else { entry.previous_app_version.as_str() };
    println!(
      "{:<40} {:<40} {:<20} {}",
      component.key, component.image_name, component.app_version, previous
    );
  }
  println!();

  Ok(())
}
