mod chart;
mod commands;
mod core;
mod forge;
mod ui;

use clap::{Args, Parser, Subcommand};
use core::config::{NotesConfig, Overrides};
use core::context::RunContext;
use core::error::{NotesError, NotesResult, print_error};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Release notes for a Helm installer chart, aggregated from its components
#[derive(Parser)]
#[command(name = "installer-notes")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  /// Config file (default: search installer-notes.toml in the working directory)
  #[arg(long, global = true)]
  config: Option<PathBuf>,
  /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
  #[arg(short, long, global = true, action = clap::ArgAction::Count)]
  verbose: u8,
  /// Only print warnings and errors, no progress bars
  #[arg(short, long, global = true)]
  quiet: bool,
  #[command(subcommand)]
  command: Commands,
}

/// Overrides shared by commands that scan installer charts
#[derive(Args)]
struct RunArgs {
  /// Installer version to document
  #[arg(long = "installer-version")]
  installer_version: Option<String>,
  /// Installer version to compare against
  #[arg(long)]
  previous_version: Option<String>,
  /// Read pre-unpacked charts from <DIR>/<chart>/<version> instead of helm
  #[arg(long, value_name = "DIR")]
  local_charts: Option<PathBuf>,
  /// Use a directory-backed forge instead of GitHub (useful for testing)
  #[arg(long, value_name = "DIR")]
  local_forge: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
  /// Generate release notes, publish the release and update the changelog
  Generate {
    #[command(flatten)]
    run: RunArgs,
    /// Local release notes file
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Do not create or edit the installer release
    #[arg(long)]
    no_publish: bool,
    /// Do not update the running changelog
    #[arg(long)]
    no_changelog: bool,
    /// Number of components fetched concurrently
    #[arg(short, long)]
    jobs: Option<usize>,
  },

  /// Show removed components and the merged inventory
  Reconcile {
    #[command(flatten)]
    run: RunArgs,
    /// Output results in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Render a raw generated-notes body (file or stdin) into sections
  Categorize {
    /// Notes file (default: stdin)
    file: Option<PathBuf>,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

/// Logs go to stderr so stdout stays usable for `--json` and `categorize`
fn init_tracing(verbose: u8, quiet: bool) {
  let level = match (quiet, verbose) {
    (true, _) => "warn",
    (false, 0) => "info",
    (false, 1) => "debug",
    (false, _) => "trace",
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .init();
}

/// Defaults, then config file, then environment, then flags
fn build_context(config_path: Option<&Path>, overrides: Overrides) -> NotesResult<RunContext> {
  let cwd = std::env::current_dir()?;
  let mut config = NotesConfig::load(&cwd, config_path)?;
  config.apply_process_env();
  config.apply_overrides(&overrides);
  RunContext::build(config)
}

impl RunArgs {
  fn into_overrides(self, output: Option<PathBuf>) -> Overrides {
    Overrides {
      version: self.installer_version,
      previous_version: self.previous_version,
      output,
      local_charts: self.local_charts,
      local_forge: self.local_forge,
    }
  }
}

fn main() {
  let cli = Cli::parse();
  init_tracing(cli.verbose, cli.quiet);

  let result = match cli.command {
    Commands::Generate {
      run,
      output,
      no_publish,
      no_changelog,
      jobs,
    } => build_context(cli.config.as_deref(), run.into_overrides(output)).and_then(|ctx| {
      commands::run_generate(
        &ctx,
        &commands::GenerateOptions {
          no_publish,
          no_changelog,
          jobs,
          quiet: cli.quiet,
        },
      )
    }),
    Commands::Reconcile { run, json } => build_context(cli.config.as_deref(), run.into_overrides(None))
      .and_then(|ctx| commands::run_reconcile(&ctx, json)),
    Commands::Categorize { file } => commands::run_categorize(file.as_deref()),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: NotesError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
