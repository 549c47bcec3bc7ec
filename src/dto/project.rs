use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::dto::path::FilePath;
use crate::dto::target::{BuildSettings, Target, TargetID};
use crate::error::{DecodeError, Error};

/// The whole build graph as reported by the build system query.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Project {
  pub name:                 String,
  pub bazel_workspace_name: String,
  pub label:                String,
  pub configuration:        String,

  #[serde(default)]
  pub build_settings: BuildSettings,

  pub targets: BTreeMap<TargetID, Target>,

  #[serde(default)]
  pub target_merges: BTreeMap<TargetID, BTreeSet<TargetID>>,

  #[serde(default)]
  pub invalid_target_merges: BTreeMap<TargetID, BTreeSet<TargetID>>,

  #[serde(default)]
  pub extra_files: BTreeSet<FilePath>,

  #[serde(default)]
  pub xccurrentversions: Vec<XCCurrentVersion>
}

/// Selects the current version of a versioned model container.
#[derive(Clone, Debug, Deserialize, Eq, Ord, PartialEq, PartialOrd)]
#[serde(deny_unknown_fields)]
pub struct XCCurrentVersion {
  pub container: FilePath,
  pub version:   String
}

impl Project {
  pub fn from_slice(bytes: &[u8]) -> Result<Self, DecodeError> {
    Ok(serde_json::from_slice(bytes)?)
  }

  pub fn load(path: &Path) -> Result<Self, Error> {
    let bytes = std::fs::read(path)?;
    Ok(Self::from_slice(&bytes)?)
  }
}
