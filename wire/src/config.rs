//! YAML configuration for container trees.

use crate::error::{Result, WireError};
use serde::{Deserialize, Deserializer};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG_BASE_NAME: &str = "fibre_wire";
const DEFAULT_CONFIG_EXTENSION: &str = "yaml";

/// The filename directory loading skips by default.
pub const DEFAULT_RESERVED_FILE: &str = "fibre_wire.yaml";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Settings for a container tree.
///
/// ```yaml
/// hotswap: true
/// poll_interval: 250ms
/// reserved_file: fibre_wire.yaml
/// extensions: [yaml, yml]
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct WireConfig {
  #[serde(default)]
  pub hotswap: bool,
  #[serde(default = "default_poll_interval", deserialize_with = "deserialize_duration")]
  pub poll_interval: Duration,
  #[serde(default = "default_reserved_file")]
  pub reserved_file: String,
  #[serde(default = "default_extensions")]
  pub extensions: Vec<String>,
}

fn default_poll_interval() -> Duration {
  DEFAULT_POLL_INTERVAL
}

fn default_reserved_file() -> String {
  DEFAULT_RESERVED_FILE.to_string()
}

fn default_extensions() -> Vec<String> {
  vec!["yaml".to_string(), "yml".to_string()]
}

fn deserialize_duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
  let text = String::deserialize(deserializer)?;
  humantime::parse_duration(&text).map_err(serde::de::Error::custom)
}

impl Default for WireConfig {
  fn default() -> Self {
    Self {
      hotswap: false,
      poll_interval: DEFAULT_POLL_INTERVAL,
      reserved_file: default_reserved_file(),
      extensions: default_extensions(),
    }
  }
}

impl WireConfig {
  pub fn from_yaml_str(text: &str) -> Result<Self> {
    if text.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(text).map_err(|e| WireError::ConfigParse(e.to_string()))
  }

  pub fn from_file(path: &Path) -> Result<Self> {
    tracing::debug!(target: "fibre_wire", path = %path.display(), "reading configuration");
    let text = fs::read_to_string(path)?;
    Self::from_yaml_str(&text)
  }
}

/// Finds the configuration file in the working directory, preferring an
/// environment-specific `fibre_wire.<env>.yaml` over `fibre_wire.yaml`.
///
/// The environment comes from `environment_suffix`, else `FIBRE_ENV`, else
/// `APP_ENV`.
pub fn find_config_file(environment_suffix: Option<&str>) -> Result<PathBuf> {
  find_config_file_in(Path::new("."), environment_suffix)
}

pub(crate) fn find_config_file_in(dir: &Path, environment_suffix: Option<&str>) -> Result<PathBuf> {
  let base_name = DEFAULT_CONFIG_BASE_NAME;
  let extension = DEFAULT_CONFIG_EXTENSION;

  let env_from_var = environment_suffix
    .map(|s| s.to_string())
    .or_else(|| env::var("FIBRE_ENV").ok())
    .or_else(|| env::var("APP_ENV").ok());

  let mut files_to_check: Vec<String> = Vec::new();
  if let Some(env_str) = &env_from_var {
    if !env_str.is_empty() {
      files_to_check.push(format!("{}.{}.{}", base_name, env_str, extension));
    }
  }
  files_to_check.push(format!("{}.{}", base_name, extension));

  for file_name in &files_to_check {
    let path = dir.join(file_name);
    if path.is_file() {
      return Ok(path);
    }
  }

  Err(WireError::ConfigNotFound(format!(
    "Searched for: {:?} in {:?}. Provide a config file or check FIBRE_ENV/APP_ENV.",
    files_to_check, dir
  )))
}
