//! Directory loading with retry-until-fixpoint resolution.
//!
//! Files are discovered in an order that has nothing to do with their
//! dependencies. Every file is attempted once; those that fail only because
//! a dependency is not bound yet are queued and retried in passes. A pass
//! that leaves the queue the same size means nothing more can load, and the
//! whole queue is reported. This does not tell a missing binding apart from
//! a cycle among the queued modules.

use crate::container::Container;
use crate::error::{Result, WireError};
use crate::importer::ImportMode;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// A location whose import is deferred until its dependencies are bound.
#[derive(Debug)]
pub struct PendingModule {
  pub location: PathBuf,
  pub last_error: WireError,
}

impl Container {
  /// Imports every module under `root`, in whatever order their dependencies
  /// allow.
  ///
  /// Fails with [`WireError::UnresolvableSet`] when a retry pass makes no
  /// progress; any error other than a missing dependency aborts immediately.
  pub fn load_dir(&self, root: impl AsRef<Path>) -> Result<()> {
    let root = root.as_ref();
    let locations = self
      .shared()
      .source
      .discover(root, &self.shared().reserved_file)?;
    tracing::debug!(target: "fibre_wire", root = %root.display(), files = locations.len(), "loading directory");

    let mut pending = Vec::new();
    for location in locations {
      self.attempt(location, &mut pending)?;
    }

    let mut pass = 0_usize;
    while !pending.is_empty() {
      pass += 1;
      let previous = pending.len();
      let mut still_pending = Vec::new();
      for module in pending {
        self.attempt(module.location, &mut still_pending)?;
      }
      tracing::debug!(target: "fibre_wire", pass, previous, remaining = still_pending.len(), "retry pass finished");

      if !still_pending.is_empty() && still_pending.len() == previous {
        return Err(WireError::UnresolvableSet {
          modules: still_pending,
        });
      }
      pending = still_pending;
    }
    Ok(())
  }

  /// Hands every location under `root` to `import` instead of importing it.
  /// No retries happen; the callback owns the whole import.
  pub fn load_dir_with<F>(&self, root: impl AsRef<Path>, mut import: F) -> Result<()>
  where
    F: FnMut(&Path, &Container) -> Result<()>,
  {
    let locations = self
      .shared()
      .source
      .discover(root.as_ref(), &self.shared().reserved_file)?;
    for location in locations {
      import(&location, self)?;
    }
    Ok(())
  }

  /// Imports `dir/file`, or every module under it when it is a directory,
  /// without retries: a missing dependency is returned to the caller.
  pub fn load_file(&self, dir: impl AsRef<Path>, file: impl AsRef<Path>) -> Result<()> {
    let location = dir.as_ref().join(file);
    if location.is_dir() {
      let locations = self
        .shared()
        .source
        .discover(&location, &self.shared().reserved_file)?;
      for nested in locations {
        self.load_location(&nested)?;
      }
      Ok(())
    } else {
      self.load_location(&location)
    }
  }

  fn attempt(&self, location: PathBuf, pending: &mut Vec<PendingModule>) -> Result<()> {
    match self.load_location(&location) {
      Err(error) if error.is_missing_dependency() => {
        pending.push(PendingModule {
          location,
          last_error: error,
        });
        Ok(())
      }
      other => other,
    }
  }

  fn load_location(&self, location: &Path) -> Result<()> {
    if let Some(instance) = self.import_module(location, ImportMode::Fresh)? {
      if self.is_hotswap() {
        self.watch(location, instance)?;
      }
    }
    Ok(())
  }
}

fn is_hidden(entry: &DirEntry) -> bool {
  entry
    .file_name()
    .to_str()
    .map(|name| name.starts_with('.'))
    .unwrap_or(false)
}

/// Recursively lists files under `root` in file-name order, skipping hidden
/// entries (and everything below hidden directories) and `reserved_file`.
/// Symbolic links are followed; a link loop is an I/O error.
pub(crate) fn walk_tree(
  root: &Path,
  reserved_file: &str,
  accept: impl Fn(&Path) -> bool,
) -> Result<Vec<PathBuf>> {
  let mut found = Vec::new();
  let walker = WalkDir::new(root)
    .follow_links(true)
    .min_depth(1)
    .sort_by_file_name()
    .into_iter()
    .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

  for entry in walker {
    let entry = entry.map_err(|e| {
      let path = e.path().unwrap_or(root).to_path_buf();
      WireError::Io {
        path,
        source: e.into(),
      }
    })?;
    if !entry.file_type().is_file() || entry.file_name() == reserved_file {
      continue;
    }
    if accept(entry.path()) {
      found.push(entry.into_path());
    }
  }
  Ok(found)
}
