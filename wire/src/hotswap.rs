//! In-place hot swapping of loaded modules.
//!
//! A reload builds a fresh instance from the changed location and copies its
//! fields onto the instance that was registered originally. The registered
//! `Arc<Module>` is never replaced, so everything holding it sees the new
//! fields. Reloads of one location are serialized by a per-entry gate; a
//! failed reload leaves the instance untouched and is reported through a
//! `changeerror` event.

use crate::container::{Container, Inner};
use crate::error::{Result, WireError};
use crate::events::ContainerEvent;
use crate::importer::ImportMode;
use crate::module::{Binding, Module};
use dashmap::DashMap;
use notify::{Config, Event, PollWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::Duration;

pub(crate) struct WatchEntry {
  location: PathBuf,
  watch_path: Option<PathBuf>,
  container: Weak<Inner>,
  instance: Arc<Module>,
  gate: Mutex<()>,
}

type Entries = Arc<DashMap<PathBuf, Arc<WatchEntry>>>;

/// The watch registry of one container tree, plus the polling watcher that
/// feeds it. The watcher thread is only started once a file-backed module
/// is registered.
pub(crate) struct HotSwap {
  poll_interval: Duration,
  entries: Entries,
  watcher: Mutex<Option<PollWatcher>>,
}

impl HotSwap {
  pub(crate) fn new(poll_interval: Duration) -> Self {
    Self {
      poll_interval,
      entries: Arc::new(DashMap::new()),
      watcher: Mutex::new(None),
    }
  }

  fn entry(&self, location: &Path) -> Option<Arc<WatchEntry>> {
    self.entries.get(location).map(|e| e.value().clone())
  }

  fn register(&self, entry: Arc<WatchEntry>) -> Result<()> {
    let watch_path = entry.watch_path.clone();
    self.entries.insert(entry.location.clone(), entry);
    match watch_path {
      Some(path) => self.poll(&path),
      None => Ok(()),
    }
  }

  fn poll(&self, path: &Path) -> Result<()> {
    let mut slot = self.watcher.lock();
    if slot.is_none() {
      let entries = self.entries.clone();
      let config = Config::default()
        .with_poll_interval(self.poll_interval)
        .with_compare_contents(true);
      let watcher = PollWatcher::new(
        move |res: notify::Result<Event>| match res {
          Ok(event) if is_mutation(&event) => {
            for path in &event.paths {
              dispatch(&entries, path);
            }
          }
          Ok(_) => {}
          Err(e) => tracing::warn!(target: "fibre_wire", error = %e, "file watcher error"),
        },
        config,
      )
      .map_err(|e| WireError::Watch(e.to_string()))?;
      *slot = Some(watcher);
    }
    if let Some(watcher) = slot.as_mut() {
      watcher
        .watch(path, RecursiveMode::NonRecursive)
        .map_err(|e| WireError::Watch(format!("{}: {}", path.display(), e)))?;
    }
    tracing::debug!(target: "fibre_wire", path = %path.display(), "watching for changes");
    Ok(())
  }
}

fn is_mutation(event: &Event) -> bool {
  matches!(
    event.kind,
    notify::EventKind::Modify(_) | notify::EventKind::Create(_) | notify::EventKind::Remove(_)
  )
}

fn find_entry(entries: &Entries, matches: impl Fn(&Path) -> bool) -> Option<Arc<WatchEntry>> {
  let found = entries
    .iter()
    .find(|e| e.value().watch_path.as_deref().map(&matches).unwrap_or(false))
    .map(|e| e.value().clone());
  found
}

fn dispatch(entries: &Entries, path: &Path) {
  let mut entry = find_entry(entries, |watched| watched == path);
  if entry.is_none() {
    if let Ok(wanted) = path.canonicalize() {
      entry = find_entry(entries, |watched| {
        watched.canonicalize().map(|p| p == wanted).unwrap_or(false)
      });
    }
  }

  let Some(entry) = entry else {
    tracing::trace!(target: "fibre_wire", path = %path.display(), "change on an unregistered path");
    return;
  };
  if let Some(inner) = entry.container.upgrade() {
    Container::from_inner(inner).refresh(&entry);
  }
}

impl Container {
  /// Registers a freshly loaded instance for hot swapping. Only [`Module`]
  /// instances can be refreshed in place; anything else is left unwatched.
  pub(crate) fn watch(&self, location: &Path, instance: Binding) -> Result<()> {
    let Ok(instance) = instance.downcast::<Module>() else {
      tracing::debug!(target: "fibre_wire", location = %location.display(), "instance is not a module, not watching");
      return Ok(());
    };
    let entry = Arc::new(WatchEntry {
      location: location.to_path_buf(),
      watch_path: self.shared().source.watch_path(location),
      container: Arc::downgrade(&self.inner),
      instance,
      gate: Mutex::new(()),
    });
    self.shared().watches.register(entry)
  }

  /// Whether `location` is registered for hot swapping in this container tree.
  pub fn is_watching(&self, location: impl AsRef<Path>) -> bool {
    self.shared().watches.entries.contains_key(location.as_ref())
  }

  /// Every location registered for hot swapping in this container tree.
  pub fn watched(&self) -> Vec<PathBuf> {
    let mut locations: Vec<PathBuf> = self
      .shared()
      .watches
      .entries
      .iter()
      .map(|e| e.key().clone())
      .collect();
    locations.sort();
    locations
  }

  /// Reloads the module registered for `location` and merges it into the
  /// existing instance.
  ///
  /// The file watcher calls this on its own; it can also be called directly
  /// when changes are detected some other way. Never fails: the outcome is a
  /// `change` or a `changeerror` event. Locations that are not registered
  /// are ignored.
  pub fn file_changed(&self, location: impl AsRef<Path>) {
    let location = location.as_ref();
    let Some(entry) = self.shared().watches.entry(location) else {
      tracing::debug!(target: "fibre_wire", location = %location.display(), "change on an unwatched location");
      return;
    };
    // The module is reimported in the container that first loaded it.
    let owner = entry
      .container
      .upgrade()
      .map(Container::from_inner)
      .unwrap_or_else(|| self.clone());
    owner.refresh(&entry);
  }

  fn refresh(&self, entry: &WatchEntry) {
    let serialized = entry.gate.lock();
    let outcome = self.swap(&entry.location, &entry.instance);
    // Handlers may trigger another reload of this location.
    drop(serialized);
    let event = match outcome {
      Ok(()) => ContainerEvent::Change {
        location: entry.location.clone(),
        instance: entry.instance.clone(),
      },
      Err(source) => {
        let error = WireError::Reload {
          location: entry.location.clone(),
          source: Box::new(source),
        };
        self.shared().err.report(&error);
        ContainerEvent::ChangeError {
          location: entry.location.clone(),
          error: Arc::new(error),
        }
      }
    };
    self.events().emit(&event);
  }

  fn swap(&self, location: &Path, original: &Arc<Module>) -> Result<()> {
    let fresh = self
      .import_module(location, ImportMode::Reload)?
      .ok_or_else(|| WireError::NotCallable {
        location: location.to_path_buf(),
      })?;
    let fresh = fresh.downcast::<Module>().map_err(|_| {
      WireError::factory(format!(
        "reloading '{}' did not produce a module",
        location.display()
      ))
    })?;

    fresh.run_refresh(original)?;
    if !Arc::ptr_eq(&fresh, original) {
      original.merge_from(&fresh);
    }
    Ok(())
  }
}
