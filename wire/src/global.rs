//! The global root container and access function.

use crate::container::Container;
use once_cell::sync::Lazy;

// Created on first access with default sinks and a `ManifestSource`.
static GLOBAL_CONTAINER: Lazy<Container> = Lazy::new(Container::new);

/// Provides a reference to the process-wide root container.
///
/// Handy for small applications that do not want to pass a container
/// around. Namespaces created on it live as long as the process.
///
/// # Examples
///
/// ```
/// use fibre_wire::global;
///
/// global().add_value("banner", String::from("Hello from global!"));
/// assert!(global().get("banner").is_some());
/// ```
pub fn global() -> &'static Container {
  &GLOBAL_CONTAINER
}
