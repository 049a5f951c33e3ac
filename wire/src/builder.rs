//! `ContainerBuilder`: the options a container is constructed with.

use crate::config::{WireConfig, DEFAULT_POLL_INTERVAL, DEFAULT_RESERVED_FILE};
use crate::container::{Container, Inner, Shared};
use crate::events::EventBus;
use crate::hotswap::HotSwap;
use crate::sink::{ErrorSink, LogSink, TracingSink};
use crate::source::{ManifestSource, ModuleSource};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

/// Builds a [`Container`].
///
/// ```
/// use fibre_wire::Container;
///
/// let shared = Container::new();
/// shared.add_value("x", 1_u32);
///
/// let app = Container::builder().name("app").dependency(shared.clone()).build();
/// assert_eq!(*app.get_as::<u32>("x").unwrap(), 1);
/// ```
pub struct ContainerBuilder {
  name: Option<String>,
  parent: Option<Container>,
  dependencies: Vec<Container>,
  hotswap: bool,
  log: Option<Arc<dyn LogSink>>,
  err: Option<Arc<dyn ErrorSink>>,
  events: Option<EventBus>,
  source: Option<Arc<dyn ModuleSource>>,
  extensions: Option<Vec<String>>,
  reserved_file: String,
  poll_interval: Duration,
}

impl Default for ContainerBuilder {
  fn default() -> Self {
    Self {
      name: None,
      parent: None,
      dependencies: Vec::new(),
      hotswap: false,
      log: None,
      err: None,
      events: None,
      source: None,
      extensions: None,
      reserved_file: DEFAULT_RESERVED_FILE.to_string(),
      poll_interval: DEFAULT_POLL_INTERVAL,
    }
  }
}

impl ContainerBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn name(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  /// Sets the parent scope. The link is weak; the parent is not kept alive
  /// and does not learn about this container (see
  /// [`Container::create_namespace`] for that).
  pub fn parent(mut self, parent: &Container) -> Self {
    self.parent = Some(parent.clone());
    self
  }

  /// Appends a sibling container to consult on local misses.
  pub fn dependency(mut self, container: Container) -> Self {
    self.dependencies.push(container);
    self
  }

  pub fn dependencies(mut self, containers: impl IntoIterator<Item = Container>) -> Self {
    self.dependencies.extend(containers);
    self
  }

  pub fn hotswap(mut self, enabled: bool) -> Self {
    self.hotswap = enabled;
    self
  }

  pub fn log_sink(mut self, sink: impl LogSink + 'static) -> Self {
    self.log = Some(Arc::new(sink));
    self
  }

  pub fn error_sink(mut self, sink: impl ErrorSink + 'static) -> Self {
    self.err = Some(Arc::new(sink));
    self
  }

  /// Shares an existing event bus instead of creating a new one.
  pub fn events(mut self, events: EventBus) -> Self {
    self.events = Some(events);
    self
  }

  pub fn source(mut self, source: impl ModuleSource + 'static) -> Self {
    self.source = Some(Arc::new(source));
    self
  }

  pub fn shared_source(mut self, source: Arc<dyn ModuleSource>) -> Self {
    self.source = Some(source);
    self
  }

  pub fn reserved_file(mut self, file_name: impl Into<String>) -> Self {
    self.reserved_file = file_name.into();
    self
  }

  pub fn poll_interval(mut self, interval: Duration) -> Self {
    self.poll_interval = interval;
    self
  }

  /// Applies a loaded [`WireConfig`]. Its extensions only matter when no
  /// explicit source is set.
  pub fn config(mut self, config: &WireConfig) -> Self {
    self.hotswap = config.hotswap;
    self.poll_interval = config.poll_interval;
    self.reserved_file = config.reserved_file.clone();
    self.extensions = Some(config.extensions.clone());
    self
  }

  pub fn build(self) -> Container {
    let source = self.source.unwrap_or_else(|| {
      let manifests = match self.extensions {
        Some(extensions) => ManifestSource::new().with_extensions(extensions),
        None => ManifestSource::new(),
      };
      Arc::new(manifests)
    });

    let shared = Shared {
      log: self.log.unwrap_or_else(|| Arc::new(TracingSink)),
      err: self.err.unwrap_or_else(|| Arc::new(TracingSink)),
      events: self.events.unwrap_or_default(),
      source,
      reserved_file: self.reserved_file,
      watches: HotSwap::new(self.poll_interval),
    };

    Container::from_inner(Arc::new(Inner {
      name: self.name,
      parent: self.parent.as_ref().map(|p| Arc::downgrade(&p.inner)),
      dependencies: self.dependencies,
      context: DashMap::new(),
      namespaces: DashMap::new(),
      hotswap: self.hotswap,
      shared: Arc::new(shared),
    }))
  }
}
