//! Dependency signatures: the ordered list of names a factory asks for.

use serde::{Deserialize, Deserializer};
use std::fmt;

/// The ordered dependency names of one factory.
///
/// Signatures are always declared explicitly. The only textual form accepted
/// is a plain list of names separated by commas and/or whitespace, which is
/// what a manifest's `inject: "a, b"` shorthand deserializes through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Signature {
  names: Vec<String>,
}

impl Signature {
  /// An empty signature; the factory takes no dependencies.
  pub fn empty() -> Self {
    Self::default()
  }

  /// Builds a signature from names, preserving their order.
  pub fn new<I, S>(names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      names: names.into_iter().map(Into::into).collect(),
    }
  }

  /// Splits `text` on commas and whitespace. A single bare name yields a
  /// one-element signature and blank input yields an empty one.
  pub fn parse(text: &str) -> Self {
    Self::new(
      text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty()),
    )
  }

  pub fn names(&self) -> &[String] {
    &self.names
  }

  pub fn len(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.names.iter().map(String::as_str)
  }
}

impl fmt::Display for Signature {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "({})", self.names.join(", "))
  }
}

impl<S: Into<String>> FromIterator<S> for Signature {
  fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
    Self::new(iter)
  }
}

// Manifests may write `inject: db`, `inject: "db, cache"` or `inject: [db, cache]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum InjectRaw {
  Text(String),
  List(Vec<String>),
}

impl<'de> Deserialize<'de> for Signature {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let raw = Option::<InjectRaw>::deserialize(deserializer)?;
    Ok(match raw {
      None => Signature::empty(),
      Some(InjectRaw::Text(text)) => Signature::parse(&text),
      Some(InjectRaw::List(names)) => Signature::new(names),
    })
  }
}
