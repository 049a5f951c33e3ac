//! Resolution of a factory's signature against a container.

use crate::container::Container;
use crate::error::{Result, WireError};
use crate::factory::Factory;
use crate::module::{Binding, Module};
use std::any::{type_name, Any};
use std::sync::Arc;

/// The resolved arguments of one factory invocation, in signature order.
#[derive(Clone, Default)]
pub struct Dependencies {
  entries: Vec<(String, Binding)>,
}

impl Dependencies {
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// The raw binding at `index`.
  pub fn binding(&self, index: usize) -> Option<&Binding> {
    self.entries.get(index).map(|(_, binding)| binding)
  }

  /// The raw binding resolved for `name`.
  pub fn binding_named(&self, name: &str) -> Option<&Binding> {
    self
      .entries
      .iter()
      .find(|(n, _)| n == name)
      .map(|(_, binding)| binding)
  }

  /// The argument at `index`, downcast to `T`.
  pub fn at<T: Any + Send + Sync>(&self, index: usize) -> Result<Arc<T>> {
    let (name, binding) = self
      .entries
      .get(index)
      .ok_or_else(|| WireError::factory(format!("no dependency at position {}", index)))?;
    downcast(name, binding)
  }

  /// The argument resolved for `name`, downcast to `T`.
  pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
    let binding = self
      .binding_named(name)
      .ok_or_else(|| WireError::factory(format!("'{}' is not part of this signature", name)))?;
    downcast(name, binding)
  }

  /// Shorthand for `get::<Module>(name)`.
  pub fn module(&self, name: &str) -> Result<Arc<Module>> {
    self.get::<Module>(name)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &Binding)> {
    self.entries.iter().map(|(name, binding)| (name.as_str(), binding))
  }
}

fn downcast<T: Any + Send + Sync>(name: &str, binding: &Binding) -> Result<Arc<T>> {
  binding
    .clone()
    .downcast::<T>()
    .map_err(|_| WireError::TypeMismatch {
      name: name.to_string(),
      expected: type_name::<T>(),
    })
}

impl Container {
  /// Looks up every name of `factory`'s signature, in order. Stops at the
  /// first name nothing binds.
  pub fn resolve(&self, factory: &Factory) -> Result<Dependencies> {
    let entries = factory
      .signature()
      .iter()
      .map(|name| {
        self
          .get(name)
          .map(|binding| (name.to_string(), binding))
          .ok_or_else(|| WireError::MissingDependency(name.to_string()))
      })
      .collect::<Result<Vec<_>>>()?;
    Ok(Dependencies { entries })
  }

  /// Resolves `factory` and invokes it, returning whatever it produced.
  /// Nothing is registered.
  pub fn exec(&self, factory: &Factory) -> Result<Binding> {
    let dependencies = self.resolve(factory)?;
    factory.invoke(&dependencies)
  }
}
