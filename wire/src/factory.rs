//! Factories: named constructors with an explicit dependency signature.

use crate::error::Result;
use crate::module::Binding;
use crate::resolver::Dependencies;
use crate::signature::Signature;
use std::fmt;
use std::sync::Arc;

type Construct = Arc<dyn Fn(&Dependencies) -> Result<Binding> + Send + Sync>;

/// A callable that declares the names it depends on and, given their
/// resolved values in that order, produces one module instance.
///
/// ```
/// use fibre_wire::{Container, Factory, Module};
///
/// let container = Container::new();
/// container.add_value("greeting", String::from("hello"));
///
/// let factory = Factory::new(|deps| {
///   let greeting = deps.get::<String>("greeting")?;
///   Ok(Module::builder().field("text", format!("{}, world", greeting)).into_binding())
/// })
/// .named("greeter")
/// .inject(["greeting"]);
///
/// container.import_module(factory, Default::default()).unwrap();
/// let greeter = container.get_as::<Module>("greeter").unwrap();
/// assert_eq!(*greeter.field_as::<String>("text").unwrap(), "hello, world");
/// ```
#[derive(Clone)]
pub struct Factory {
  name: Option<String>,
  signature: Signature,
  construct: Construct,
}

impl Factory {
  /// An anonymous factory with no dependencies.
  pub fn new(construct: impl Fn(&Dependencies) -> Result<Binding> + Send + Sync + 'static) -> Self {
    Self {
      name: None,
      signature: Signature::empty(),
      construct: Arc::new(construct),
    }
  }

  /// Sets the canonical name the instance is registered under.
  pub fn named(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  /// Declares the ordered dependency names.
  pub fn inject<I, S>(mut self, names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.signature = Signature::new(names);
    self
  }

  pub fn with_signature(mut self, signature: Signature) -> Self {
    self.signature = signature;
    self
  }

  /// The canonical name, `None` for anonymous factories.
  pub fn name(&self) -> Option<&str> {
    self.name.as_deref()
  }

  pub fn signature(&self) -> &Signature {
    &self.signature
  }

  pub(crate) fn invoke(&self, dependencies: &Dependencies) -> Result<Binding> {
    (self.construct)(dependencies)
  }
}

impl fmt::Debug for Factory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.name {
      Some(name) => write!(f, "Factory({}{})", name, self.signature),
      None => write!(f, "Factory(<anonymous>{})", self.signature),
    }
  }
}
