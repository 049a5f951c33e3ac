#![allow(dead_code)]

use fibre_wire::{Binding, ErrorSink, Factory, LogSink, Module, WireError};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::Level;

/// Records everything sent to the log and error sinks.
#[derive(Clone, Default)]
pub struct CaptureSink {
  pub logs: Arc<Mutex<Vec<(Level, String)>>>,
  pub errors: Arc<Mutex<Vec<String>>>,
}

impl CaptureSink {
  pub fn warnings(&self) -> Vec<String> {
    self
      .logs
      .lock()
      .iter()
      .filter(|(level, _)| *level == Level::WARN)
      .map(|(_, message)| message.clone())
      .collect()
  }

  pub fn infos(&self) -> Vec<String> {
    self
      .logs
      .lock()
      .iter()
      .filter(|(level, _)| *level == Level::INFO)
      .map(|(_, message)| message.clone())
      .collect()
  }

  pub fn error_messages(&self) -> Vec<String> {
    self.errors.lock().clone()
  }
}

impl LogSink for CaptureSink {
  fn log(&self, level: Level, message: &str) {
    self.logs.lock().push((level, message.to_string()));
  }
}

impl ErrorSink for CaptureSink {
  fn report(&self, error: &WireError) {
    self.errors.lock().push(error.to_string());
  }
}

/// A named factory producing a module that keeps each dependency under its name.
pub fn holder(name: &str, deps: &[&str]) -> Factory {
  Factory::new(|resolved| {
    let mut builder = Module::builder();
    for (dep, value) in resolved.iter() {
      builder = builder.binding(dep, value.clone());
    }
    Ok(builder.into_binding())
  })
  .named(name)
  .inject(deps.iter().copied())
}

/// A named factory producing a module with a single `version` field.
pub fn versioned(name: &str, version: u32) -> Factory {
  Factory::new(move |_| Ok(Module::builder().field("version", version).into_binding())).named(name)
}

pub fn as_module(binding: Binding) -> Arc<Module> {
  binding.downcast::<Module>().expect("binding is not a module")
}
