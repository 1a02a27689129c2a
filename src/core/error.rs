//! Error types for installer-notes with contextual messages and exit codes
//!
//! A single error type categorizes failures and carries an optional help line
//! that `print_error` shows under the message.

use crate::forge::ForgeError;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for installer-notes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args, missing files)
  User = 1,
  /// System error (helm, network, I/O)
  System = 2,
  /// Concurrent modification of a persisted artifact
  Conflict = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for installer-notes
#[derive(Debug)]
pub enum NotesError {
  /// Configuration errors
  Config(ConfigError),

  /// Chart pull / scan errors
  Chart(ChartError),

  /// Source-control platform errors
  Forge(ForgeError),

  /// Write rejected by a concurrency token, with the failed step's context
  Conflict {
    source: ForgeError,
    context: Option<String>,
  },

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl NotesError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    NotesError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    NotesError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  ///
  /// Structured variants are folded into a message so the context is never lost.
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      NotesError::Message { message, context, help } => NotesError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      NotesError::Conflict { source, context } => NotesError::Conflict {
        source,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
      },
      other => {
        let help = other.help_message();
        NotesError::Message {
          message: ctx_str,
          context: Some(other.to_string()),
          help,
        }
      }
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      NotesError::Config(_) => ExitCode::User,
      NotesError::Chart(_) => ExitCode::System,
      NotesError::Conflict { .. } => ExitCode::Conflict,
      NotesError::Forge(_) => ExitCode::System,
      NotesError::Io(_) => ExitCode::System,
      NotesError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      NotesError::Config(e) => e.help_message(),
      NotesError::Chart(e) => e.help_message(),
      NotesError::Forge(e) => e.help_message(),
      NotesError::Conflict { source, .. } => source.help_message(),
      NotesError::Message { help, .. } => help.clone(),
      NotesError::Io(_) => None,
    }
  }

  /// True when the error is an optimistic-concurrency rejection
  pub fn is_conflict(&self) -> bool {
    matches!(self, NotesError::Conflict { .. })
  }
}

impl fmt::Display for NotesError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      NotesError::Config(e) => write!(f, "{}", e),
      NotesError::Chart(e) => write!(f, "{}", e),
      NotesError::Forge(e) => write!(f, "{}", e),
      NotesError::Conflict { source, context } => {
        if let Some(ctx) = context {
          writeln!(f, "{}", ctx)?;
        }
        write!(f, "{}", source)
      }
      NotesError::Io(e) => write!(f, "I/O error: {}", e),
      NotesError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for NotesError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      NotesError::Io(e) => Some(e),
      NotesError::Forge(e) | NotesError::Conflict { source: e, .. } => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for NotesError {
  fn from(err: io::Error) -> Self {
    NotesError::Io(err)
  }
}

impl From<ForgeError> for NotesError {
  fn from(err: ForgeError) -> Self {
    match err {
      ForgeError::Conflict { .. } => NotesError::Conflict {
        source: err,
        context: None,
      },
      other => NotesError::Forge(other),
    }
  }
}

impl From<ChartError> for NotesError {
  fn from(err: ChartError) -> Self {
    NotesError::Chart(err)
  }
}

impl From<ConfigError> for NotesError {
  fn from(err: ConfigError) -> Self {
    NotesError::Config(err)
  }
}

impl From<String> for NotesError {
  fn from(msg: String) -> Self {
    NotesError::message(msg)
  }
}

impl From<&str> for NotesError {
  fn from(msg: &str) -> Self {
    NotesError::message(msg)
  }
}

impl From<toml_edit::de::Error> for NotesError {
  fn from(err: toml_edit::de::Error) -> Self {
    NotesError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<serde_json::Error> for NotesError {
  fn from(err: serde_json::Error) -> Self {
    NotesError::message(format!("JSON error: {}", err))
  }
}

impl From<serde_yaml::Error> for NotesError {
  fn from(err: serde_yaml::Error) -> Self {
    NotesError::message(format!("YAML error: {}", err))
  }
}

impl From<rayon::ThreadPoolBuildError> for NotesError {
  fn from(err: rayon::ThreadPoolBuildError) -> Self {
    NotesError::message(format!("Worker pool error: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for NotesError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    NotesError::message(format!("UTF-8 conversion error: {}", err))
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// Explicit --config path does not exist
  NotFound { path: PathBuf },

  /// Missing or empty required field
  MissingField { field: String },

  /// Field present but unusable
  Invalid { field: String, reason: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NotFound { .. } => {
        Some("Drop the --config flag to fall back to installer-notes.toml discovery.".to_string())
      }
      ConfigError::MissingField { field } => Some(format!(
        "Set `{}` in installer-notes.toml or pass the matching flag/environment variable.",
        field
      )),
      ConfigError::Invalid { field, .. } if field == "github.tokens" => Some(
        "Provide one token shared by every organization, or one token per organization in the same order.".to_string(),
      ),
      ConfigError::Invalid { .. } => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NotFound { path } => {
        write!(f, "Configuration file not found: {}", path.display())
      }
      ConfigError::MissingField { field } => {
        write!(f, "Missing required field in config: {}", field)
      }
      ConfigError::Invalid { field, reason } => {
        write!(f, "Invalid value for {}: {}", field, reason)
      }
    }
  }
}

/// Marker carried in `PullFailed::stderr` when the helm binary cannot be spawned
pub const HELM_MISSING: &str = "helm executable not found";

/// Chart pull and inventory scan errors
#[derive(Debug)]
pub enum ChartError {
  /// helm binary failed or is missing
  PullFailed { chart: String, version: String, stderr: String },

  /// Pre-unpacked chart directory missing
  LocalChartMissing { path: PathBuf },

  /// values.yaml did not contain the expected section
  ValuesSection { key: String },

  /// Scan produced nothing usable
  NoEntries { key: String },
}

impl ChartError {
  fn help_message(&self) -> Option<String> {
    match self {
      ChartError::PullFailed { stderr, .. } => {
        if stderr.contains(HELM_MISSING) {
          Some("Install helm (https://helm.sh) and make sure it is on PATH.".to_string())
        } else {
          Some("Check the chart registry URL and that the requested version is published.".to_string())
        }
      }
      ChartError::LocalChartMissing { .. } => {
        Some("Local chart roots are laid out as <root>/<chart>/<version>/ with Chart.yaml inside.".to_string())
      }
      ChartError::ValuesSection { key } => Some(format!(
        "Set `installer.values_key` if the installer lists its components under a section other than '{}'.",
        key
      )),
      ChartError::NoEntries { .. } => None,
    }
  }
}

impl fmt::Display for ChartError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ChartError::PullFailed { chart, version, stderr } => {
        write!(f, "helm pull {} --version {} failed\n{}", chart, version, stderr)
      }
      ChartError::LocalChartMissing { path } => {
        write!(f, "Unpacked chart not found at: {}", path.display())
      }
      ChartError::ValuesSection { key } => {
        write!(f, "{} key not found or not a map in values.yaml", key)
      }
      ChartError::NoEntries { key } => {
        write!(f, "no valid entries found in {} section", key)
      }
    }
  }
}

/// Result type alias for installer-notes
pub type NotesResult<T> = Result<T, NotesError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> NotesResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> NotesResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<NotesError>,
{
  fn context(self, ctx: impl Into<String>) -> NotesResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> NotesResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &NotesError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
