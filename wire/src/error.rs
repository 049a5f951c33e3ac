use std::fmt::Write as _;
use std::path::PathBuf;

use thiserror::Error;

use crate::loader::PendingModule;

/// The main error type for the `fibre_wire` library.
#[derive(Debug, Error)]
pub enum WireError {
  /// A factory asked for a name that no reachable scope binds.
  #[error("Dependency module does not exist: {0}")]
  MissingDependency(String),

  #[error("Module at '{}' is not a factory, ignoring", .location.display())]
  NotCallable { location: PathBuf },

  /// The retry loop stopped making progress. Every module still pending is
  /// listed with the last error it produced.
  #[error("Dependency error on the following modules (might be a circular dependency):{}", describe_pending(.modules))]
  UnresolvableSet { modules: Vec<PendingModule> },

  #[error("Failed to reload '{}': {source}", .location.display())]
  Reload {
    location: PathBuf,
    #[source]
    source: Box<WireError>,
  },

  #[error("Binding '{name}' is not a {expected}")]
  TypeMismatch { name: String, expected: &'static str },

  #[error("Malformed module source '{}': {message}", .location.display())]
  Manifest { location: PathBuf, message: String },

  #[error("I/O error on '{}': {source}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Configuration file not found: {0}")]
  ConfigNotFound(String),

  #[error("Failed to read configuration file: {0}")]
  ConfigRead(#[from] std::io::Error),

  #[error("Failed to parse configuration: {0}")]
  ConfigParse(String),

  #[error("File watcher error: {0}")]
  Watch(String),

  /// Raised by user factories and lifecycle hooks.
  #[error("{0}")]
  Factory(String),
}

impl WireError {
  /// Convenience constructor for errors raised from inside a factory or hook.
  pub fn factory(message: impl Into<String>) -> Self {
    WireError::Factory(message.into())
  }

  /// The pending set carried by an [`WireError::UnresolvableSet`], if any.
  pub fn pending_modules(&self) -> Option<&[PendingModule]> {
    match self {
      WireError::UnresolvableSet { modules } => Some(modules),
      _ => None,
    }
  }

  pub fn is_missing_dependency(&self) -> bool {
    matches!(self, WireError::MissingDependency(_))
  }
}

fn describe_pending(modules: &[PendingModule]) -> String {
  let mut out = String::new();
  for pending in modules {
    let _ = write!(
      out,
      "\n  {}: {}",
      pending.location.display(),
      pending.last_error
    );
  }
  out
}

/// A specialized `Result` type for `fibre_wire` operations.
pub type Result<T, E = WireError> = std::result::Result<T, E>;
