mod common;

use common::{holder, versioned};
use fibre_wire::{
  global, resolve, Container, Factory, ImportMode, MemorySource, Module, WireConfig,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

#[test]
fn test_multi_level_chain_through_global() {
  // Arrange
  global().add_value("chain_url", String::from("postgres://host/db"));
  let database = Factory::new(|deps| {
    let url = deps.get::<String>("chain_url")?;
    Ok(Module::builder().field("url", (*url).clone()).into_binding())
  })
  .named("chain_database")
  .inject(["chain_url"]);
  let users = Factory::new(|deps| {
    Ok(Module::builder().binding("database", deps.module("chain_database")?).into_binding())
  })
  .named("chain_users")
  .inject(["chain_database"]);

  // Act
  global().import_module(database, ImportMode::Fresh).unwrap();
  global().import_module(users, ImportMode::Fresh).unwrap();

  // Assert
  let users = resolve!(Module, "chain_users");
  let database = users.field_as::<Module>("database").unwrap();
  assert_eq!(*database.field_as::<String>("url").unwrap(), "postgres://host/db");
}

#[test]
fn test_concurrent_lookups_and_registrations() {
  let container = Container::new();
  container.add_value("base", 0_u64);
  let hits = Arc::new(AtomicUsize::new(0));

  thread::scope(|s| {
    for worker in 0..8 {
      let container = &container;
      let hits = hits.clone();
      s.spawn(move || {
        container.add_value(format!("worker_{worker}"), worker as u64);
        for _ in 0..100 {
          if container.get("base").is_some() {
            hits.fetch_add(1, Ordering::Relaxed);
          }
        }
      });
    }
  });

  assert_eq!(hits.load(Ordering::Relaxed), 800);
  assert_eq!(container.bindings().len(), 9);
}

#[test]
fn test_namespaces_across_sibling_trees() {
  // Arrange: a shared library tree with its own `reports` namespace.
  let library = Container::builder().name("library").build();
  library.add_value("theme", "dark");
  library.create_namespace("reports").add_value("renderer", "pdf");

  let app = Container::builder().dependency(library.clone()).build();
  let reports = app.create_namespace("reports");
  let admin = app.create_namespace("admin");

  // Act / Assert: namespaced bindings only reach the equivalent namespace,
  // root bindings reach every namespace.
  assert_eq!(*reports.get_as::<&str>("renderer").unwrap(), "pdf");
  assert!(admin.get("renderer").is_none());
  assert_eq!(*reports.get_as::<&str>("theme").unwrap(), "dark");
  assert_eq!(*admin.get_as::<&str>("theme").unwrap(), "dark");
}

#[test]
fn test_configured_tree_loads_in_memory_modules() {
  let config = WireConfig::from_yaml_str("hotswap: true\npoll_interval: 20ms\n").unwrap();
  let source = MemorySource::new();
  source.insert("app/b", holder("b", &["a"]));
  source.insert("app/a", versioned("a", 1));

  let container = Container::builder().config(&config).source(source).build();
  container.load_dir("app").unwrap();

  assert!(container.is_hotswap());
  assert_eq!(container.watched().len(), 2);
  let b = container.get_as::<Module>("b").unwrap();
  assert!(Arc::ptr_eq(
    &b.field_as::<Module>("a").unwrap(),
    &container.get_as::<Module>("a").unwrap()
  ));
}
