//! The `Container` struct: bindings, namespaces and scoped lookup.

use crate::builder::ContainerBuilder;
use crate::events::{ContainerEvent, EventBus, EventKind};
use crate::hotswap::HotSwap;
use crate::module::{bind, Binding};
use crate::sink::{ErrorSink, LogSink};
use crate::source::ModuleSource;
use dashmap::DashMap;
use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::Level;

/// The name every container answers with itself.
pub const SELF_BINDING: &str = "container";

/// State shared by every container of one tree.
pub(crate) struct Shared {
  pub(crate) log: Arc<dyn LogSink>,
  pub(crate) err: Arc<dyn ErrorSink>,
  pub(crate) events: EventBus,
  pub(crate) source: Arc<dyn ModuleSource>,
  pub(crate) reserved_file: String,
  pub(crate) watches: HotSwap,
}

pub(crate) struct Inner {
  pub(crate) name: Option<String>,
  pub(crate) parent: Option<Weak<Inner>>,
  pub(crate) dependencies: Vec<Container>,
  pub(crate) context: DashMap<String, Binding>,
  pub(crate) namespaces: DashMap<String, Container>,
  pub(crate) hotswap: bool,
  pub(crate) shared: Arc<Shared>,
}

/// A dependency-injection scope.
///
/// A container holds name bindings, an optional parent link, a table of named
/// child namespaces and an ordered list of sibling containers consulted when a
/// name is not bound locally. `Container` is a cheap, cloneable handle; clones
/// refer to the same scope and compare equal.
#[derive(Clone)]
pub struct Container {
  pub(crate) inner: Arc<Inner>,
}

impl Default for Container {
  fn default() -> Self {
    Self::new()
  }
}

impl Container {
  /// Creates a root container with default sinks and a [`ManifestSource`](crate::ManifestSource).
  pub fn new() -> Self {
    ContainerBuilder::default().build()
  }

  pub fn builder() -> ContainerBuilder {
    ContainerBuilder::default()
  }

  pub(crate) fn from_inner(inner: Arc<Inner>) -> Self {
    Self { inner }
  }

  pub(crate) fn shared(&self) -> &Shared {
    &self.inner.shared
  }

  pub(crate) fn log(&self, level: Level, message: &str) {
    self.inner.shared.log.log(level, message);
  }

  pub fn name(&self) -> Option<&str> {
    self.inner.name.as_deref()
  }

  /// The parent scope, if this container is a namespace and its parent is alive.
  pub fn parent(&self) -> Option<Container> {
    self
      .inner
      .parent
      .as_ref()
      .and_then(Weak::upgrade)
      .map(Container::from_inner)
  }

  /// Sibling containers, in lookup order.
  pub fn dependencies(&self) -> &[Container] {
    &self.inner.dependencies
  }

  pub fn is_hotswap(&self) -> bool {
    self.inner.hotswap
  }

  /// The event bus shared by this container tree.
  pub fn events(&self) -> &EventBus {
    &self.inner.shared.events
  }

  // --- Registration ---

  /// Binds an existing shared instance under `name`, keeping its identity.
  pub fn add<T: Any + Send + Sync>(&self, name: impl Into<String>, instance: Arc<T>) {
    self.add_binding(name, instance);
  }

  /// Binds a plain value under `name`.
  pub fn add_value<T: Any + Send + Sync>(&self, name: impl Into<String>, value: T) {
    self.add_binding(name, bind(value));
  }

  /// Binds `instance` under `name`. The last write wins; overwriting an
  /// existing binding logs a warning.
  pub fn add_binding(&self, name: impl Into<String>, instance: Binding) {
    let name = name.into();
    let replaced = self.inner.context.insert(name.clone(), instance).is_some();
    if replaced || name == SELF_BINDING {
      self.log(
        Level::WARN,
        &format!("Module with name: '{}' already exists, overriding", name),
      );
    }
  }

  /// Names bound directly in this container, excluding the self binding.
  pub fn bindings(&self) -> Vec<String> {
    let mut names: Vec<String> = self.inner.context.iter().map(|e| e.key().clone()).collect();
    names.sort();
    names
  }

  // --- Lookup ---

  fn get_local(&self, name: &str) -> Option<Binding> {
    if let Some(found) = self.inner.context.get(name).map(|e| e.value().clone()) {
      return Some(found);
    }
    (name == SELF_BINDING).then(|| bind(self.clone()))
  }

  /// Looks `name` up in this scope.
  ///
  /// Order: local bindings; then, for a namespace, the parent's view of this
  /// namespace (see [`Container::get_from_namespace`]); then each sibling
  /// container in order. Returns `None` when nothing binds the name.
  pub fn get(&self, name: &str) -> Option<Binding> {
    if let Some(found) = self.get_local(name) {
      return Some(found);
    }
    if let (Some(namespace), Some(parent)) = (self.name(), self.parent()) {
      if let Some(found) = parent.get_from_namespace(namespace, name) {
        return Some(found);
      }
    }
    self
      .inner
      .dependencies
      .iter()
      .find_map(|sibling| sibling.get(name))
  }

  /// Looks `name` up and downcasts it to `T`.
  pub fn get_as<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
    self.get(name)?.downcast::<T>().ok()
  }

  /// Looks `name` up on behalf of the child namespace `namespace`.
  ///
  /// Tries this container first. On a miss, each sibling is asked through its
  /// own namespace of the same name when it has one, or through its root
  /// scope otherwise.
  pub fn get_from_namespace(&self, namespace: &str, name: &str) -> Option<Binding> {
    self.get(name).or_else(|| {
      self
        .inner
        .dependencies
        .iter()
        .find_map(|sibling| match sibling.namespace(namespace) {
          Some(child) => child.get(name),
          None => sibling.get(name),
        })
    })
  }

  // --- Namespaces ---

  /// Creates a child namespace that shares this container's sinks, event bus,
  /// source and hot-swap setting, and registers it under `name`.
  pub fn create_namespace(&self, name: impl Into<String>) -> Container {
    let name = name.into();
    let child = Container::from_inner(Arc::new(Inner {
      name: Some(name.clone()),
      parent: Some(Arc::downgrade(&self.inner)),
      dependencies: Vec::new(),
      context: DashMap::new(),
      namespaces: DashMap::new(),
      hotswap: self.inner.hotswap,
      shared: self.inner.shared.clone(),
    }));
    if self.inner.namespaces.insert(name.clone(), child.clone()).is_some() {
      tracing::debug!(target: "fibre_wire", namespace = %name, "replaced existing namespace");
    }
    child
  }

  pub fn namespace(&self, name: &str) -> Option<Container> {
    self.inner.namespaces.get(name).map(|e| e.value().clone())
  }

  pub fn namespaces(&self) -> Vec<String> {
    let mut names: Vec<String> = self.inner.namespaces.iter().map(|e| e.key().clone()).collect();
    names.sort();
    names
  }

  // --- Events ---

  /// Subscribes to `change` or `changeerror` events of this container tree.
  pub fn on(&self, kind: EventKind, handler: impl Fn(&ContainerEvent) + Send + Sync + 'static) {
    self.inner.shared.events.on(kind, handler);
  }
}

impl PartialEq for Container {
  fn eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.inner, &other.inner)
  }
}

impl Eq for Container {}

impl fmt::Debug for Container {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Container")
      .field("name", &self.inner.name)
      .field("bindings", &self.bindings())
      .field("namespaces", &self.namespaces())
      .field("dependencies", &self.inner.dependencies.len())
      .field("hotswap", &self.inner.hotswap)
      .finish()
  }
}
