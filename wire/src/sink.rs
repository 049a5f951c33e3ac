//! Log and error sinks shared by every container of a tree.

use crate::error::WireError;
use tracing::Level;

/// Receives leveled, human-readable notices about imports and registrations.
pub trait LogSink: Send + Sync {
  fn log(&self, level: Level, message: &str);
}

/// Receives non-fatal errors, e.g. a source that does not export a factory
/// or a failed hot swap.
pub trait ErrorSink: Send + Sync {
  fn report(&self, error: &WireError);
}

/// The default sink. Forwards everything to `tracing` under the
/// `fibre_wire` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
  fn log(&self, level: Level, message: &str) {
    match level {
      Level::ERROR => tracing::error!(target: "fibre_wire", "{}", message),
      Level::WARN => tracing::warn!(target: "fibre_wire", "{}", message),
      Level::INFO => tracing::info!(target: "fibre_wire", "{}", message),
      Level::DEBUG => tracing::debug!(target: "fibre_wire", "{}", message),
      _ => tracing::trace!(target: "fibre_wire", "{}", message),
    }
  }
}

impl ErrorSink for TracingSink {
  fn report(&self, error: &WireError) {
    tracing::warn!(target: "fibre_wire", error = %error, "non-fatal container error");
  }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl LogSink for NullSink {
  fn log(&self, _level: Level, _message: &str) {}
}

impl ErrorSink for NullSink {
  fn report(&self, _error: &WireError) {}
}
