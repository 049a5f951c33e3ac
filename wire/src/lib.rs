//! # Fibre Wire
//!
//! A hierarchical dependency-injection container that loads factories from a
//! file tree, resolves their declared dependencies through scoped namespaces
//! and sibling containers, and hot swaps loaded modules in place.
//!
//! ## Core Concepts
//!
//! - **Container**: a scope of name bindings with an optional parent, named
//!   child namespaces and an ordered list of sibling containers consulted on
//!   a local miss. Every container binds itself as `"container"`.
//! - **Factory**: a constructor with an optional name and an explicit,
//!   ordered list of dependency names.
//! - **Module**: the mutable record a factory usually produces. Holders keep
//!   its `Arc`; a hot swap rewrites the fields behind it.
//! - **Directory loading**: [`Container::load_dir`] imports every module
//!   under a directory regardless of discovery order, retrying modules whose
//!   dependencies are not bound yet until nothing more can load.
//! - **Hot swap**: with `hotswap` enabled, loaded files are polled; on a
//!   change the module is rebuilt and merged into the existing instance, and
//!   a `change` or `changeerror` event is emitted.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_wire::{Container, Factory, ImportMode, Module};
//! use std::sync::Arc;
//!
//! let container = Container::new();
//!
//! let database = Factory::new(|_| {
//!   Ok(Module::builder().field("url", String::from("postgres://localhost/app")).into_binding())
//! })
//! .named("database");
//!
//! let users = Factory::new(|deps| {
//!   let database = deps.module("database")?;
//!   Ok(Module::builder().binding("database", database).into_binding())
//! })
//! .named("users")
//! .inject(["database"]);
//!
//! container.import_module(database, ImportMode::Fresh).unwrap();
//! container.import_module(users, ImportMode::Fresh).unwrap();
//!
//! let users = container.get_as::<Module>("users").unwrap();
//! let database = container.get_as::<Module>("database").unwrap();
//! assert!(Arc::ptr_eq(&users.field_as::<Module>("database").unwrap(), &database));
//! ```

mod builder;
pub mod config;
mod container;
mod error;
mod events;
mod factory;
mod global;
mod hotswap;
mod importer;
mod loader;
mod macros;
mod module;
mod resolver;
mod signature;
pub mod sink;
mod source;

pub use builder::ContainerBuilder;
pub use config::{find_config_file, WireConfig};
pub use container::{Container, SELF_BINDING};
pub use error::{Result, WireError};
pub use events::{ContainerEvent, EventBus, EventKind};
pub use factory::Factory;
pub use global::global;
pub use importer::{ImportMode, ImportTarget};
pub use loader::PendingModule;
pub use module::{bind, Binding, InitHook, Module, ModuleBuilder, RefreshHook};
pub use resolver::Dependencies;
pub use signature::Signature;
pub use sink::{ErrorSink, LogSink, NullSink, TracingSink};
pub use source::{Behavior, Export, ManifestSource, MemorySource, ModuleSource};
