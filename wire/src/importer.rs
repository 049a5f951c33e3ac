//! Importing a single module: obtain a factory, run it, register the result.

use crate::container::Container;
use crate::error::{Result, WireError};
use crate::factory::Factory;
use crate::module::{Binding, Module};
use crate::source::Export;
use std::path::{Path, PathBuf};
use tracing::Level;

/// Whether an import is a first load or a hot-swap reload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImportMode {
  #[default]
  Fresh,
  /// Bypasses the source's cache, skips the init hook and does not register
  /// the result. A non-factory export is left for the caller to report.
  Reload,
}

/// Something that can be imported: a factory or a location to load one from.
#[derive(Debug, Clone)]
pub enum ImportTarget {
  Factory(Factory),
  Location(PathBuf),
}

impl From<Factory> for ImportTarget {
  fn from(factory: Factory) -> Self {
    ImportTarget::Factory(factory)
  }
}

impl From<PathBuf> for ImportTarget {
  fn from(location: PathBuf) -> Self {
    ImportTarget::Location(location)
  }
}

impl From<&Path> for ImportTarget {
  fn from(location: &Path) -> Self {
    ImportTarget::Location(location.to_path_buf())
  }
}

impl From<&str> for ImportTarget {
  fn from(location: &str) -> Self {
    ImportTarget::Location(PathBuf::from(location))
  }
}

impl Container {
  /// Imports one module into this container.
  ///
  /// Returns `Ok(None)` when the location does not export a factory (the
  /// problem goes to the error sink). Otherwise the factory is resolved and
  /// invoked; a fresh [`Module`] gets its init hook run, and a named fresh
  /// import is bound under its name. Resolution failures surface as
  /// [`WireError::MissingDependency`]; every other error is returned as is.
  pub fn import_module(
    &self,
    target: impl Into<ImportTarget>,
    mode: ImportMode,
  ) -> Result<Option<Binding>> {
    let (factory, location) = match target.into() {
      ImportTarget::Factory(factory) => (factory, None),
      ImportTarget::Location(location) => {
        if mode == ImportMode::Reload {
          self.log(Level::INFO, &format!("CHANGED: {}", location.display()));
        }
        match self
          .shared()
          .source
          .load(&location, mode == ImportMode::Reload)?
        {
          Export::Factory(factory) => (factory, Some(location)),
          Export::Opaque(description) => {
            tracing::debug!(target: "fibre_wire", export = %description, "ignoring non-factory export");
            // A failed reload is reported once, as a whole, by the hot swap.
            if mode == ImportMode::Fresh {
              self
                .shared()
                .err
                .report(&WireError::NotCallable { location });
            }
            return Ok(None);
          }
        }
      }
    };

    let dependencies = self.resolve(&factory)?;
    if let (Some(location), ImportMode::Fresh) = (&location, mode) {
      self.log(
        Level::INFO,
        &format!("Importing module: {}", location.display()),
      );
    }
    let instance = factory.invoke(&dependencies)?;

    if mode == ImportMode::Fresh {
      if let Ok(module) = instance.clone().downcast::<Module>() {
        module.run_init()?;
      }
    }

    match (factory.name(), mode) {
      (Some(name), ImportMode::Fresh) => self.add_binding(name, instance.clone()),
      (None, ImportMode::Fresh) => self.log(
        Level::WARN,
        "Not a named module, executing it only; it will not be added to the context",
      ),
      (_, ImportMode::Reload) => {}
    }

    Ok(Some(instance))
  }
}
