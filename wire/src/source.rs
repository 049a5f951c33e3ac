//! Source-module services: turning a location into a [`Factory`].

use crate::error::{Result, WireError};
use crate::factory::Factory;
use crate::loader::walk_tree;
use crate::module::{Binding, ModuleBuilder};
use crate::resolver::Dependencies;
use crate::signature::Signature;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What a source location exports.
#[derive(Clone, Debug)]
pub enum Export {
  Factory(Factory),
  /// Something that is not a factory. Importing it reports a
  /// [`WireError::NotCallable`] to the error sink and produces nothing.
  Opaque(String),
}

/// Loads factories from named locations and enumerates a source tree.
pub trait ModuleSource: Send + Sync {
  /// Returns what `location` exports. With `reload` set, any cached result
  /// for `location` must be bypassed and refreshed.
  fn load(&self, location: &Path, reload: bool) -> Result<Export>;

  /// Whether `location` looks like a module this source can load.
  fn accepts(&self, location: &Path) -> bool {
    let _ = location;
    true
  }

  /// Lists every loadable location under `root`, skipping dotfiles and the
  /// reserved filename.
  fn discover(&self, root: &Path, reserved_file: &str) -> Result<Vec<PathBuf>> {
    walk_tree(root, reserved_file, |path| self.accepts(path))
  }

  /// The on-disk path to poll for `location`, or `None` when the location is
  /// not backed by a file.
  fn watch_path(&self, location: &Path) -> Option<PathBuf> {
    let _ = location;
    None
  }
}

/// Hooks and derived fields that a manifest opts into with `behavior: <name>`.
pub type Behavior = Arc<dyn Fn(ModuleBuilder, &Dependencies) -> Result<ModuleBuilder> + Send + Sync>;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModuleManifest {
  #[serde(default)]
  name: Option<String>,
  #[serde(default)]
  inject: Signature,
  #[serde(default)]
  behavior: Option<String>,
  #[serde(default)]
  fields: BTreeMap<String, serde_yaml::Value>,
}

/// Reads YAML module manifests from disk.
///
/// ```yaml
/// name: greeter
/// inject: [config]
/// fields:
///   greeting: hello
/// ```
///
/// The instance gets every manifest field as a `serde_yaml::Value` plus each
/// injected dependency under its own name. Parsed factories are cached per
/// location until a reload.
pub struct ManifestSource {
  extensions: Vec<String>,
  behaviors: HashMap<String, Behavior>,
  cache: DashMap<PathBuf, Export>,
}

impl Default for ManifestSource {
  fn default() -> Self {
    Self::new()
  }
}

impl ManifestSource {
  pub fn new() -> Self {
    Self {
      extensions: vec!["yaml".to_string(), "yml".to_string()],
      behaviors: HashMap::new(),
      cache: DashMap::new(),
    }
  }

  pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.extensions = extensions.into_iter().map(Into::into).collect();
    self
  }

  /// Registers a behavior that manifests can name.
  pub fn behavior(
    mut self,
    name: impl Into<String>,
    behavior: impl Fn(ModuleBuilder, &Dependencies) -> Result<ModuleBuilder> + Send + Sync + 'static,
  ) -> Self {
    self.behaviors.insert(name.into(), Arc::new(behavior));
    self
  }

  pub fn is_cached(&self, location: &Path) -> bool {
    self.cache.contains_key(location)
  }

  fn parse(&self, location: &Path) -> Result<Export> {
    let text = fs::read_to_string(location).map_err(|source| WireError::Io {
      path: location.to_path_buf(),
      source,
    })?;
    let malformed = |message: String| WireError::Manifest {
      location: location.to_path_buf(),
      message,
    };

    let document: serde_yaml::Value =
      serde_yaml::from_str(&text).map_err(|e| malformed(e.to_string()))?;
    if !document.is_mapping() {
      return Ok(Export::Opaque(format!("{:?}", document)));
    }
    let manifest: ModuleManifest =
      serde_yaml::from_value(document).map_err(|e| malformed(e.to_string()))?;

    let behavior = match &manifest.behavior {
      Some(name) => Some(
        self
          .behaviors
          .get(name)
          .cloned()
          .ok_or_else(|| malformed(format!("unknown behavior '{}'", name)))?,
      ),
      None => None,
    };

    Ok(Export::Factory(manifest_factory(manifest, behavior)))
  }
}

fn manifest_factory(manifest: ModuleManifest, behavior: Option<Behavior>) -> Factory {
  let ModuleManifest {
    name,
    inject,
    fields,
    ..
  } = manifest;

  let factory = Factory::new(move |deps: &Dependencies| -> Result<Binding> {
    let mut builder = fields
      .iter()
      .fold(ModuleBuilder::default(), |b, (key, value)| {
        b.field(key.clone(), value.clone())
      });
    for (dep_name, value) in deps.iter() {
      builder = builder.binding(dep_name, value.clone());
    }
    if let Some(behavior) = &behavior {
      builder = behavior(builder, deps)?;
    }
    Ok(builder.into_binding())
  })
  .with_signature(inject);

  match name {
    Some(name) => factory.named(name),
    None => factory,
  }
}

impl ModuleSource for ManifestSource {
  fn load(&self, location: &Path, reload: bool) -> Result<Export> {
    if !reload {
      if let Some(cached) = self.cache.get(location) {
        return Ok(cached.value().clone());
      }
    }
    let export = self.parse(location)?;
    self.cache.insert(location.to_path_buf(), export.clone());
    Ok(export)
  }

  fn accepts(&self, location: &Path) -> bool {
    location
      .extension()
      .and_then(|ext| ext.to_str())
      .map(|ext| self.extensions.iter().any(|e| e == ext))
      .unwrap_or(false)
  }

  fn watch_path(&self, location: &Path) -> Option<PathBuf> {
    Some(location.to_path_buf())
  }
}

impl fmt::Debug for ManifestSource {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ManifestSource")
      .field("extensions", &self.extensions)
      .field("behaviors", &self.behaviors.keys().collect::<Vec<_>>())
      .field("cached", &self.cache.len())
      .finish()
  }
}

/// An in-process source: factories registered under virtual locations.
///
/// Discovery yields locations in registration order, which makes it handy
/// for exercising load order. Replacing an export and calling
/// [`Container::file_changed`](crate::Container::file_changed) simulates an
/// edit of that location.
#[derive(Clone, Default)]
pub struct MemorySource {
  entries: Arc<RwLock<Vec<(PathBuf, Export)>>>,
}

impl MemorySource {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers (or replaces) the factory exported at `location`.
  pub fn insert(&self, location: impl Into<PathBuf>, factory: Factory) {
    self.set(location.into(), Export::Factory(factory));
  }

  /// Registers a non-factory export at `location`.
  pub fn insert_opaque(&self, location: impl Into<PathBuf>, description: impl Into<String>) {
    self.set(location.into(), Export::Opaque(description.into()));
  }

  pub fn remove(&self, location: &Path) -> bool {
    let mut entries = self.entries.write();
    let before = entries.len();
    entries.retain(|(path, _)| path != location);
    entries.len() != before
  }

  pub fn len(&self) -> usize {
    self.entries.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.read().is_empty()
  }

  fn set(&self, location: PathBuf, export: Export) {
    let mut entries = self.entries.write();
    match entries.iter_mut().find(|(path, _)| *path == location) {
      Some(slot) => slot.1 = export,
      None => entries.push((location, export)),
    }
  }
}

impl ModuleSource for MemorySource {
  fn load(&self, location: &Path, _reload: bool) -> Result<Export> {
    self
      .entries
      .read()
      .iter()
      .find(|(path, _)| path == location)
      .map(|(_, export)| export.clone())
      .ok_or_else(|| WireError::Io {
        path: location.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "no module registered"),
      })
  }

  fn discover(&self, root: &Path, reserved_file: &str) -> Result<Vec<PathBuf>> {
    Ok(
      self
        .entries
        .read()
        .iter()
        .map(|(path, _)| path)
        .filter(|path| path.starts_with(root))
        .filter(|path| {
          path
            .strip_prefix(root)
            .map(|relative| {
              !relative.components().any(|c| {
                c.as_os_str()
                  .to_str()
                  .map(|s| s.starts_with('.'))
                  .unwrap_or(false)
              })
            })
            .unwrap_or(false)
        })
        .filter(|path| path.file_name().and_then(|n| n.to_str()) != Some(reserved_file))
        .cloned()
        .collect(),
    )
  }
}

impl fmt::Debug for MemorySource {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MemorySource")
      .field("locations", &self.len())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  fn write(dir: &Path, file: &str, body: &str) -> PathBuf {
    let path = dir.join(file);
    let mut f = fs::File::create(&path).unwrap();
    f.write_all(body.as_bytes()).unwrap();
    path
  }

  #[test]
  fn manifest_parses_name_and_signature() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "a.yaml", "name: a\ninject: b, c\n");

    let export = ManifestSource::new().load(&path, false).unwrap();
    let Export::Factory(factory) = export else {
      panic!("expected a factory");
    };

    assert_eq!(factory.name(), Some("a"));
    assert_eq!(factory.signature().names(), ["b", "c"]);
  }

  #[test]
  fn non_mapping_document_is_opaque() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "list.yaml", "- 1\n- 2\n");

    let export = ManifestSource::new().load(&path, false).unwrap();
    assert!(matches!(export, Export::Opaque(_)));
  }

  #[test]
  fn malformed_yaml_is_a_manifest_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "bad.yaml", "name: [unclosed\n");

    let err = ManifestSource::new().load(&path, false).unwrap_err();
    assert!(matches!(err, WireError::Manifest { .. }));
  }

  #[test]
  fn unknown_behavior_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "a.yaml", "name: a\nbehavior: nope\n");

    let err = ManifestSource::new().load(&path, false).unwrap_err();
    assert!(err.to_string().contains("unknown behavior"));
  }

  #[test]
  fn reload_bypasses_the_cache() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "a.yaml", "name: first\n");
    let source = ManifestSource::new();

    source.load(&path, false).unwrap();
    write(dir.path(), "a.yaml", "name: second\n");

    let cached = source.load(&path, false).unwrap();
    let fresh = source.load(&path, true).unwrap();

    let name = |export: Export| match export {
      Export::Factory(f) => f.name().map(str::to_string),
      Export::Opaque(_) => None,
    };
    assert_eq!(name(cached).as_deref(), Some("first"));
    assert_eq!(name(fresh).as_deref(), Some("second"));
  }

  #[test]
  fn accepts_only_configured_extensions() {
    let source = ManifestSource::new().with_extensions(["wire"]);
    assert!(source.accepts(Path::new("mods/a.wire")));
    assert!(!source.accepts(Path::new("mods/a.yaml")));
    assert!(!source.accepts(Path::new("mods/README")));
  }

  #[test]
  fn memory_discovery_keeps_registration_order_and_filters() {
    let source = MemorySource::new();
    let noop = Factory::new(|_| Ok(crate::module::bind(())));
    source.insert("root/b", noop.clone());
    source.insert("root/a", noop.clone());
    source.insert("root/.hidden/c", noop.clone());
    source.insert("root/index", noop.clone());
    source.insert("elsewhere/d", noop);

    let found = source.discover(Path::new("root"), "index").unwrap();
    assert_eq!(found, vec![PathBuf::from("root/b"), PathBuf::from("root/a")]);
  }
}
