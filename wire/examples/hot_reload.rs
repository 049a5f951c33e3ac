use fibre_wire::{Container, ContainerEvent, EventKind, Module};
use std::fs;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// Loads two manifests from a scratch directory, then edits one of them and
// waits for the watcher to swap the change in.
fn main() -> Result<(), Box<dyn std::error::Error>> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let dir = std::env::temp_dir().join("fibre_wire_hot_reload");
  fs::create_dir_all(&dir)?;
  let greeter = dir.join("greeter.yaml");
  // `app` is written first but loads second; directory loading retries it.
  fs::write(dir.join("app.yaml"), "name: app\ninject: greeter\n")?;
  fs::write(&greeter, "name: greeter\nfields:\n  greeting: hello\n")?;

  let container = Container::builder()
    .hotswap(true)
    .poll_interval(Duration::from_millis(100))
    .build();
  container.load_dir(&dir)?;

  let (tx, rx) = std::sync::mpsc::channel();
  let tx = std::sync::Mutex::new(tx);
  container.on(EventKind::Change, move |event| {
    if let Ok(tx) = tx.lock() {
      let _ = tx.send(event.location().clone());
    }
  });
  container.on(EventKind::ChangeError, |event| {
    if let ContainerEvent::ChangeError { error, .. } = event {
      println!("reload failed: {}", error);
    }
  });

  let app = container.get_as::<Module>("app").ok_or("app was not loaded")?;
  let held = app.require::<Module>("greeter")?;
  println!("before: {:?}", held.field("greeting").and_then(|g| g.downcast::<serde_yaml::Value>().ok()));

  fs::write(&greeter, "name: greeter\nfields:\n  greeting: bonjour\n")?;
  let changed = rx.recv_timeout(Duration::from_secs(5))?;
  println!("swapped {}", changed.display());
  println!("after:  {:?}", held.field("greeting").and_then(|g| g.downcast::<serde_yaml::Value>().ok()));

  fs::remove_dir_all(&dir)?;
  Ok(())
}
