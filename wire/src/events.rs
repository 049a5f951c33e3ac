//! Hot-swap notifications.

use crate::error::WireError;
use crate::module::Module;
use parking_lot::RwLock;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// The kinds of event a container tree emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
  /// A watched module was reloaded and merged into its existing instance.
  Change,
  /// A reload failed; the existing instance was left untouched.
  ChangeError,
}

impl fmt::Display for EventKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      EventKind::Change => write!(f, "change"),
      EventKind::ChangeError => write!(f, "changeerror"),
    }
  }
}

#[derive(Debug, Clone)]
pub enum ContainerEvent {
  /// `instance` is the original, identity-preserved instance.
  Change {
    location: PathBuf,
    instance: Arc<Module>,
  },
  ChangeError {
    location: PathBuf,
    error: Arc<WireError>,
  },
}

impl ContainerEvent {
  pub fn kind(&self) -> EventKind {
    match self {
      ContainerEvent::Change { .. } => EventKind::Change,
      ContainerEvent::ChangeError { .. } => EventKind::ChangeError,
    }
  }

  pub fn location(&self) -> &PathBuf {
    match self {
      ContainerEvent::Change { location, .. } | ContainerEvent::ChangeError { location, .. } => {
        location
      }
    }
  }
}

type Handler = Arc<dyn Fn(&ContainerEvent) + Send + Sync>;

/// A cloneable handle to a set of event handlers.
///
/// Every container of a tree shares one bus; separate trees can share one by
/// passing it to [`ContainerBuilder::events`](crate::ContainerBuilder::events).
#[derive(Clone, Default)]
pub struct EventBus {
  handlers: Arc<RwLock<Vec<(EventKind, Handler)>>>,
}

impl EventBus {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn on(&self, kind: EventKind, handler: impl Fn(&ContainerEvent) + Send + Sync + 'static) {
    self.handlers.write().push((kind, Arc::new(handler)));
  }

  pub fn emit(&self, event: &ContainerEvent) {
    // Snapshot so handlers may subscribe further without deadlocking.
    let kind = event.kind();
    let matching: Vec<Handler> = self
      .handlers
      .read()
      .iter()
      .filter(|(k, _)| *k == kind)
      .map(|(_, h)| h.clone())
      .collect();
    for handler in matching {
      handler(event);
    }
  }

  pub fn handler_count(&self) -> usize {
    self.handlers.read().len()
  }
}

impl fmt::Debug for EventBus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("EventBus")
      .field("handlers", &self.handler_count())
      .finish()
  }
}
