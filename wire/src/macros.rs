//! Public macros for ergonomic lookups.

/// Looks a binding up, panicking if nothing binds the name.
///
/// Without a container the global one is used. With a type, the binding is
/// downcast and the macro also panics on a type mismatch. For non-panicking
/// lookups use [`Container::get`](crate::Container::get) or
/// [`Container::get_as`](crate::Container::get_as).
///
/// # Panics
///
/// Panics if the name is not bound in any reachable scope, or if it is bound
/// to a value of another type.
///
/// # Examples
///
/// ```
/// use fibre_wire::{global, resolve, Container};
///
/// global().add_value("port", 8080_u16);
/// let port = resolve!(u16, "port");
/// assert_eq!(*port, 8080);
///
/// let local = Container::new();
/// local.add_value("host", String::from("localhost"));
/// let host = resolve!(in local, String, "host");
/// assert_eq!(*host, "localhost");
/// ```
#[macro_export]
macro_rules! resolve {
    // resolve!(in container, Type, "name")
    (in $container:expr, $type:ty, $name:expr) => {
        $container
            .get_as::<$type>($name)
            .unwrap_or_else(|| {
                panic!(
                    "Failed to resolve required binding '{}' as {}",
                    $name,
                    std::any::type_name::<$type>()
                )
            })
    };

    // resolve!(in container, "name")
    (in $container:expr, $name:expr) => {
        $container
            .get($name)
            .unwrap_or_else(|| panic!("Failed to resolve required binding '{}'", $name))
    };

    // resolve!(Type, "name")
    ($type:ty, $name:expr) => {
        $crate::global()
            .get_as::<$type>($name)
            .unwrap_or_else(|| {
                panic!(
                    "Failed to resolve required binding '{}' as {}",
                    $name,
                    std::any::type_name::<$type>()
                )
            })
    };

    // resolve!("name")
    ($name:expr) => {
        $crate::global()
            .get($name)
            .unwrap_or_else(|| panic!("Failed to resolve required binding '{}'", $name))
    };
}
