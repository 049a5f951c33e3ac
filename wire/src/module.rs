//! Module instances: mutable records with a stable identity.
//!
//! A [`Module`] is always handed out as an `Arc<Module>`. Holders keep the
//! `Arc`, so the identity every component captured never changes; a hot swap
//! rewrites the record behind it instead of replacing the reference.

use crate::error::{Result, WireError};
use parking_lot::RwLock;
use std::any::{type_name, Any};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A shared, type-erased value bound in a container or stored in a module field.
pub type Binding = Arc<dyn Any + Send + Sync>;

/// Wraps any value as a [`Binding`].
pub fn bind<T: Any + Send + Sync>(value: T) -> Binding {
  Arc::new(value)
}

/// Runs once, right after a module is constructed by a fresh import.
pub type InitHook = Arc<dyn Fn(&Module) -> Result<()> + Send + Sync>;

/// Runs on the fresh instance during a hot swap, receiving the instance being
/// refreshed so state can be carried over before the merge.
pub type RefreshHook = Arc<dyn Fn(&Module, &Module) -> Result<()> + Send + Sync>;

#[derive(Default, Clone)]
struct Record {
  fields: BTreeMap<String, Binding>,
  init: Option<InitHook>,
  refresh: Option<RefreshHook>,
}

/// A module instance produced by a factory.
#[derive(Default)]
pub struct Module {
  record: RwLock<Record>,
}

impl Module {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn builder() -> ModuleBuilder {
    ModuleBuilder::default()
  }

  /// Returns a field by name.
  pub fn field(&self, name: &str) -> Option<Binding> {
    self.record.read().fields.get(name).cloned()
  }

  /// Returns a field downcast to `T`, or `None` if it is absent or of another type.
  pub fn field_as<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
    self.field(name)?.downcast::<T>().ok()
  }

  /// Like [`Module::field_as`] but reports why the field could not be read.
  pub fn require<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
    let field = self
      .field(name)
      .ok_or_else(|| WireError::factory(format!("module has no field '{}'", name)))?;
    field.downcast::<T>().map_err(|_| WireError::TypeMismatch {
      name: name.to_string(),
      expected: type_name::<T>(),
    })
  }

  pub fn has_field(&self, name: &str) -> bool {
    self.record.read().fields.contains_key(name)
  }

  pub fn field_names(&self) -> Vec<String> {
    self.record.read().fields.keys().cloned().collect()
  }

  pub fn set<T: Any + Send + Sync>(&self, name: impl Into<String>, value: T) {
    self.set_binding(name, bind(value));
  }

  pub fn set_binding(&self, name: impl Into<String>, value: Binding) {
    self.record.write().fields.insert(name.into(), value);
  }

  pub fn has_init_hook(&self) -> bool {
    self.record.read().init.is_some()
  }

  pub fn has_refresh_hook(&self) -> bool {
    self.record.read().refresh.is_some()
  }

  pub(crate) fn run_init(&self) -> Result<()> {
    // The hook may read or write fields, so the lock is released first.
    let hook = self.record.read().init.clone();
    match hook {
      Some(hook) => hook(self),
      None => Ok(()),
    }
  }

  /// Runs the refresh hook against `previous`. If the hook fails, `previous`
  /// is restored to the state it had before the call.
  pub(crate) fn run_refresh(&self, previous: &Module) -> Result<()> {
    let Some(hook) = self.record.read().refresh.clone() else {
      return Ok(());
    };
    let saved = previous.record.read().clone();
    hook(self, previous).inspect_err(|_| *previous.record.write() = saved)
  }

  /// Copies every field and hook of `fresh` onto `self`. Fields that only
  /// exist on `self` are kept.
  pub(crate) fn merge_from(&self, fresh: &Module) {
    let incoming = fresh.record.read().clone();
    let mut record = self.record.write();
    record.fields.extend(incoming.fields);
    if incoming.init.is_some() {
      record.init = incoming.init;
    }
    if incoming.refresh.is_some() {
      record.refresh = incoming.refresh;
    }
  }
}

impl fmt::Debug for Module {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let record = self.record.read();
    f.debug_struct("Module")
      .field("fields", &record.fields.keys().collect::<Vec<_>>())
      .field("init", &record.init.is_some())
      .field("refresh", &record.refresh.is_some())
      .finish()
  }
}

/// Assembles a [`Module`] before it is shared.
#[derive(Default)]
pub struct ModuleBuilder {
  record: Record,
}

impl ModuleBuilder {
  pub fn field<T: Any + Send + Sync>(self, name: impl Into<String>, value: T) -> Self {
    self.binding(name, bind(value))
  }

  pub fn binding(mut self, name: impl Into<String>, value: Binding) -> Self {
    self.record.fields.insert(name.into(), value);
    self
  }

  pub fn on_init(mut self, hook: impl Fn(&Module) -> Result<()> + Send + Sync + 'static) -> Self {
    self.record.init = Some(Arc::new(hook));
    self
  }

  pub fn on_refresh(
    mut self,
    hook: impl Fn(&Module, &Module) -> Result<()> + Send + Sync + 'static,
  ) -> Self {
    self.record.refresh = Some(Arc::new(hook));
    self
  }

  pub fn build(self) -> Arc<Module> {
    Arc::new(Module {
      record: RwLock::new(self.record),
    })
  }

  /// Builds the module and erases it into a [`Binding`], ready to be
  /// returned from a factory.
  pub fn into_binding(self) -> Binding {
    self.build()
  }
}
