//! Paths as reported by the build graph.
//!
//! A `FilePath` remembers where a file comes from, which decides how the
//! generated project refers to it later on:
//! - project:   relative to the workspace root
//! - external:  fetched into an external repository
//! - generated: written by the build into its output tree
//! - internal:  owned by the generator itself, inside the project bundle
//!
//! The compact JSON form is either a bare string, which is a visible project
//! file, or a record with the keys `_` (path), `t` (type), `f` (folder) and
//! `i` (include in navigator).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde::de::Error as DeError;
use std::cmp::Ordering;
use std::fmt;
use std::ops::Add;

use crate::error::DecodeError;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum PathType {
  #[serde(rename = "p")] Project,
  #[serde(rename = "e")] External,
  #[serde(rename = "g")] Generated,
  #[serde(rename = "i")] Internal
}

impl Default for PathType {
  fn default() -> Self { PathType::Project }
}

impl PathType {
  pub fn rank(self) -> u8 {
    match self {
      PathType::Project   => 0,
      PathType::External  => 1,
      PathType::Generated => 2,
      PathType::Internal  => 3
    }
  }
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct FilePath {
  pub path_type:            PathType,
  pub path:                 String,
  pub is_folder:            bool,
  pub include_in_navigator: bool
}

impl FilePath {
  pub fn new(path_type: PathType, path: &str) -> Self {
    FilePath {
      path_type,
      path:                 normalize(path),
      is_folder:            false,
      include_in_navigator: true
    }
  }

  pub fn project  (path: &str) -> Self { Self::new(PathType::Project,   path) }
  pub fn external (path: &str) -> Self { Self::new(PathType::External,  path) }
  pub fn generated(path: &str) -> Self { Self::new(PathType::Generated, path) }
  pub fn internal (path: &str) -> Self { Self::new(PathType::Internal,  path) }

  pub fn folder(mut self) -> Self {
    self.is_folder = true;
    self
  }

  pub fn hidden(mut self) -> Self {
    self.include_in_navigator = false;
    self
  }

  /// Drops the last path component. The parent of a folder is never itself
  /// treated as a folder.
  pub fn parent(&self) -> FilePath {
    let path = match self.path.rfind('/') {
      Some(i) => self.path[..i].to_string(),
      None    => String::new()
    };
    FilePath {
      path,
      path_type:            self.path_type,
      is_folder:            false,
      include_in_navigator: self.include_in_navigator
    }
  }

  /// Appends `component` to the path. The result is never a folder.
  pub fn join(&self, component: &str) -> FilePath {
    let path = match self.path.is_empty() {
      true  => normalize(component),
      false => normalize(&[self.path.as_str(), component].join("/"))
    };
    FilePath {
      path,
      path_type:            self.path_type,
      is_folder:            false,
      include_in_navigator: self.include_in_navigator
    }
  }

  pub fn file_name(&self) -> &str {
    match self.path.rfind('/') {
      Some(i) => &self.path[i + 1..],
      None    => &self.path
    }
  }

  pub fn extension(&self) -> Option<&str> {
    let name = self.file_name();
    match name.rfind('.') {
      Some(0) | None => None,
      Some(i)        => Some(&name[i + 1..])
    }
  }

  pub fn components(&self) -> impl Iterator<Item = &str> {
    self.path.split('/').filter(|c| !c.is_empty())
  }

  fn is_bare(&self) -> bool {
    self.path_type == PathType::Project && !self.is_folder && self.include_in_navigator
  }

  /// Decodes either the bare string or the tagged record form.
  pub fn decode(value: &serde_json::Value) -> Result<FilePath, DecodeError> {
    match value {
      serde_json::Value::String(s) => Ok(FilePath::project(s)),
      serde_json::Value::Object(_) => {
        let tagged: Tagged = serde_json::from_value(value.clone())
          .map_err(|e| DecodeError::MalformedPath(format!("{} in {}", e, value)))?;
        Ok(FilePath {
          path_type:            tagged.path_type,
          path:                 normalize(&tagged.path),
          is_folder:            tagged.is_folder,
          include_in_navigator: tagged.include_in_navigator
        })
      },
      other => Err(DecodeError::MalformedPath(format!("expected a string or an object, got {}", other)))
    }
  }

  pub fn encode(&self) -> serde_json::Value {
    match self.is_bare() {
      true  => serde_json::Value::String(self.path.clone()),
      false => serde_json::to_value(Tagged {
        path:                 self.path.clone(),
        path_type:            self.path_type,
        is_folder:            self.is_folder,
        include_in_navigator: self.include_in_navigator
      }).unwrap_or(serde_json::Value::Null)
    }
  }
}

fn normalize(path: &str) -> String {
  let mut s = path;
  while let Some(rest) = s.strip_prefix("./") {
    s = rest;
  }
  s.trim_end_matches('/').to_string()
}

fn default_true() -> bool { true }
fn is_true(b: &bool) -> bool { *b }
fn is_false(b: &bool) -> bool { !*b }
fn is_project(t: &PathType) -> bool { *t == PathType::Project }

#[derive(Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct Tagged {
  #[serde(rename = "_")]
  path: String,

  #[serde(rename = "t", default, skip_serializing_if = "is_project")]
  path_type: PathType,

  #[serde(rename = "f", default, skip_serializing_if = "is_false")]
  is_folder: bool,

  #[serde(rename = "i", default = "default_true", skip_serializing_if = "is_true")]
  include_in_navigator: bool
}

impl<'de> Deserialize<'de> for FilePath {
  fn deserialize<D>(d: D) -> Result<Self, D::Error> where D: Deserializer<'de> {
    let value = serde_json::Value::deserialize(d)?;
    FilePath::decode(&value).map_err(D::Error::custom)
  }
}

impl Serialize for FilePath {
  fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error> where S: Serializer {
    self.encode().serialize(s)
  }
}

/// Path first, then provenance, then folders before plain files. The
/// navigator flag only breaks the remaining ties so that the order agrees
/// with equality.
impl Ord for FilePath {
  fn cmp(&self, o: &Self) -> Ordering {
    self.path.cmp(&o.path)
      .then_with(|| self.path_type.rank().cmp(&o.path_type.rank()))
      .then_with(|| o.is_folder.cmp(&self.is_folder))
      .then_with(|| self.include_in_navigator.cmp(&o.include_in_navigator))
  }
}

impl PartialOrd for FilePath {
  fn partial_cmp(&self, o: &Self) -> Option<Ordering> {
    Some(self.cmp(o))
  }
}

impl fmt::Display for FilePath {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let tag = match self.path_type {
      PathType::Project   => "",
      PathType::External  => "external:",
      PathType::Generated => "generated:",
      PathType::Internal  => "internal:"
    };
    write!(f, "{}{}{}", tag, self.path, if self.is_folder { "/" } else { "" })
  }
}

/// Appends a raw suffix to the path, ie `model + "/M.xcdatamodel"`. The
/// result is never a folder.
impl Add<&str> for &FilePath {
  type Output = FilePath;

  fn add(self, suffix: &str) -> FilePath {
    FilePath {
      path:                 [self.path.as_str(), suffix].concat(),
      path_type:            self.path_type,
      is_folder:            false,
      include_in_navigator: self.include_in_navigator
    }
  }
}

impl From<&str> for FilePath {
  fn from(s: &str) -> Self {
    FilePath::project(s)
  }
}
