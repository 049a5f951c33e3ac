mod common;

use common::{holder, versioned};
use fibre_wire::{Container, MemorySource, Module, WireError};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn memory_container(entries: &[(&str, fibre_wire::Factory)]) -> Container {
  let source = MemorySource::new();
  for (location, factory) in entries {
    source.insert(*location, factory.clone());
  }
  Container::builder().source(source).build()
}

fn write(dir: &Path, file: &str, body: &str) -> PathBuf {
  let path = dir.join(file);
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).unwrap();
  }
  fs::write(&path, body).unwrap();
  path
}

#[test]
fn test_load_order_does_not_matter() {
  for reversed in [false, true] {
    // Arrange
    let mut entries = vec![
      ("mods/a", versioned("a", 1)),
      ("mods/b", holder("b", &["a"])),
    ];
    if reversed {
      entries.reverse();
    }
    let container = memory_container(&entries);

    // Act
    container.load_dir("mods").unwrap();

    // Assert
    let a = container.get_as::<Module>("a").unwrap();
    let b = container.get_as::<Module>("b").unwrap();
    assert!(Arc::ptr_eq(&b.field_as::<Module>("a").unwrap(), &a));
  }
}

#[test]
fn test_chain_discovered_backwards_resolves_over_several_passes() {
  let container = memory_container(&[
    ("mods/c", holder("c", &["b"])),
    ("mods/b", holder("b", &["a"])),
    ("mods/a", versioned("a", 1)),
  ]);

  container.load_dir("mods").unwrap();

  let a = container.get_as::<Module>("a").unwrap();
  let b = container.get_as::<Module>("b").unwrap();
  let c = container.get_as::<Module>("c").unwrap();
  assert!(Arc::ptr_eq(&c.field_as::<Module>("b").unwrap(), &b));
  assert!(Arc::ptr_eq(&b.field_as::<Module>("a").unwrap(), &a));
}

#[test]
fn test_unresolvable_set_lists_the_stuck_module() {
  // Arrange
  let container = memory_container(&[
    ("mods/a", versioned("a", 1)),
    ("mods/b", holder("b", &["a", "ghost"])),
  ]);

  // Act
  let err = container.load_dir("mods").unwrap_err();

  // Assert
  let pending = err.pending_modules().expect("expected an unresolvable set");
  assert_eq!(pending.len(), 1);
  assert_eq!(pending[0].location, PathBuf::from("mods/b"));
  assert_eq!(
    pending[0].last_error.to_string(),
    "Dependency module does not exist: ghost"
  );
  // Modules that could load stay loaded.
  assert!(container.get("a").is_some());
  assert!(container.get("b").is_none());
}

#[test]
fn test_cycle_surfaces_as_unresolvable_set() {
  let container = memory_container(&[
    ("mods/a", holder("a", &["b"])),
    ("mods/b", holder("b", &["a"])),
  ]);

  let err = container.load_dir("mods").unwrap_err();

  let pending = err.pending_modules().unwrap();
  let locations: Vec<_> = pending.iter().map(|p| p.location.clone()).collect();
  assert_eq!(locations, vec![PathBuf::from("mods/a"), PathBuf::from("mods/b")]);
  assert!(err.to_string().contains("might be a circular dependency"));
}

#[test]
fn test_other_errors_abort_immediately() {
  let failing = fibre_wire::Factory::new(|_| Err(WireError::factory("boom"))).named("failing");
  let container = memory_container(&[
    ("mods/a", holder("a", &["later"])),
    ("mods/failing", failing),
    ("mods/later", versioned("later", 1)),
  ]);

  let err = container.load_dir("mods").unwrap_err();

  assert_eq!(err.to_string(), "boom");
  // Nothing after the failure was attempted.
  assert!(container.get("later").is_none());
}

#[test]
fn test_load_dir_from_disk_in_any_order() {
  // Arrange: `one` sorts before `two` but depends on it.
  let dir = tempfile::tempdir().unwrap();
  write(
    dir.path(),
    "one.yaml",
    "name: one\ninject: two\nfields:\n  label: first\n",
  );
  write(dir.path(), "nested/two.yaml", "name: two\nfields:\n  label: second\n");
  let container = Container::new();

  // Act
  container.load_dir(dir.path()).unwrap();

  // Assert
  let one = container.get_as::<Module>("one").unwrap();
  let two = container.get_as::<Module>("two").unwrap();
  assert!(Arc::ptr_eq(&one.field_as::<Module>("two").unwrap(), &two));
  assert_eq!(
    *one.field_as::<serde_yaml::Value>("label").unwrap(),
    serde_yaml::Value::from("first")
  );
}

#[cfg(unix)]
#[test]
fn test_load_dir_imports_symlinked_modules() {
  // Arrange: `a` lives outside the tree and is linked in; `b` depends on it.
  let shared = tempfile::tempdir().unwrap();
  let target = write(shared.path(), "a.yaml", "name: a\n");
  let dir = tempfile::tempdir().unwrap();
  std::os::unix::fs::symlink(&target, dir.path().join("a.yaml")).unwrap();
  write(dir.path(), "b.yaml", "name: b\ninject: a\n");
  let container = Container::new();

  // Act
  container.load_dir(dir.path()).unwrap();

  // Assert
  let a = container.get_as::<Module>("a").unwrap();
  let b = container.get_as::<Module>("b").unwrap();
  assert!(Arc::ptr_eq(&b.field_as::<Module>("a").unwrap(), &a));
}

#[test]
fn test_load_dir_from_disk_reports_missing_dependency() {
  let dir = tempfile::tempdir().unwrap();
  write(dir.path(), "one.yaml", "name: one\ninject: [two]\n");
  write(dir.path(), "two.yaml", "name: two\ninject: [three]\n");

  let err = Container::new().load_dir(dir.path()).unwrap_err();

  let pending = err.pending_modules().unwrap();
  assert_eq!(pending.len(), 2);
  let two = pending
    .iter()
    .find(|p| p.location.ends_with("two.yaml"))
    .unwrap();
  assert_eq!(
    two.last_error.to_string(),
    "Dependency module does not exist: three"
  );
}

#[test]
fn test_load_dir_skips_reserved_hidden_and_foreign_files() {
  let dir = tempfile::tempdir().unwrap();
  write(dir.path(), "a.yaml", "name: a\n");
  write(dir.path(), "fibre_wire.yaml", "hotswap: true\n");
  write(dir.path(), ".draft.yaml", "name: draft\n");
  write(dir.path(), "README.md", "# modules\n");
  let container = Container::new();

  container.load_dir(dir.path()).unwrap();

  assert_eq!(container.bindings(), vec!["a".to_string()]);
}

#[test]
fn test_load_dir_aborts_on_malformed_manifest() {
  let dir = tempfile::tempdir().unwrap();
  write(dir.path(), "a.yaml", "name: [unclosed\n");

  let err = Container::new().load_dir(dir.path()).unwrap_err();

  assert!(matches!(err, WireError::Manifest { .. }));
}

#[test]
fn test_load_dir_missing_root_is_an_io_error() {
  let dir = tempfile::tempdir().unwrap();
  let err = Container::new()
    .load_dir(dir.path().join("absent"))
    .unwrap_err();
  assert!(matches!(err, WireError::Io { .. }));
}

#[test]
fn test_load_file_does_not_retry() {
  let dir = tempfile::tempdir().unwrap();
  write(dir.path(), "b.yaml", "name: b\ninject: a\n");
  write(dir.path(), "a.yaml", "name: a\n");
  let container = Container::new();

  let err = container.load_file(dir.path(), "b.yaml").unwrap_err();
  assert!(err.is_missing_dependency());

  container.load_file(dir.path(), "a.yaml").unwrap();
  container.load_file(dir.path(), "b.yaml").unwrap();
  assert!(container.get("b").is_some());
}

#[test]
fn test_load_file_on_directory_loads_everything_below() {
  let dir = tempfile::tempdir().unwrap();
  write(dir.path(), "group/a.yaml", "name: a\n");
  write(dir.path(), "group/b.yaml", "name: b\ninject: a\n");
  let container = Container::new();

  container.load_file(dir.path(), "group").unwrap();

  assert_eq!(container.bindings(), vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn test_load_dir_with_hands_over_every_location() {
  let container = memory_container(&[
    ("mods/a", versioned("a", 1)),
    ("mods/b", holder("b", &["a"])),
  ]);
  let mut seen = Vec::new();

  container
    .load_dir_with("mods", |location, target| {
      assert_eq!(*target, container);
      seen.push(location.to_path_buf());
      Ok(())
    })
    .unwrap();

  assert_eq!(seen, vec![PathBuf::from("mods/a"), PathBuf::from("mods/b")]);
  assert!(container.bindings().is_empty());
}

#[test]
fn test_hotswap_container_watches_loaded_modules() {
  let source = MemorySource::new();
  source.insert("mods/b", holder("b", &["a"]));
  source.insert("mods/a", versioned("a", 1));
  source.insert_opaque("mods/data", "not a factory");
  let container = Container::builder().source(source).hotswap(true).build();

  container.load_dir("mods").unwrap();

  assert_eq!(
    container.watched(),
    vec![PathBuf::from("mods/a"), PathBuf::from("mods/b")]
  );
}

#[test]
fn test_plain_container_watches_nothing() {
  let container = memory_container(&[("mods/a", versioned("a", 1))]);

  container.load_dir("mods").unwrap();

  assert!(!container.is_watching("mods/a"));
}

#[test]
fn test_modules_load_into_a_namespace() {
  let root = Container::new();
  root.add_value("shared", 1_u8);
  let source = MemorySource::new();
  source.insert("plugins/p", holder("p", &["shared"]));
  let plugins = Container::builder()
    .name("plugins")
    .parent(&root)
    .source(source)
    .build();

  plugins.load_dir("plugins").unwrap();

  assert!(plugins.get("p").is_some());
  assert!(root.get("p").is_none());
}
