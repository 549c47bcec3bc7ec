use clap::{App, ArgMatches};
use semver::Version;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::dto::{BuildMode, Project};
use crate::gen::Options;
use crate::platform::Precedence;
use crate::scheme::SchemeVersions;

pub trait Command {
  fn init<'a, 'b>(&self, cmd: App<'a, 'b>) -> App<'a, 'b>;

  fn run(&self, ctx: &Context) -> RunResult;
}

pub type DynResult<T> = Result<T, Box<dyn Error>>;
pub type RunResult    = DynResult<()>;

pub type Commands = BTreeMap<&'static str, Box<dyn Command>>;

pub struct Context<'a> {
  pub commands: Commands,

  pub args:    &'a ArgMatches<'a>,
  pub project: &'a Project,
  pub options: Options
}

/// Settings read from `GRAPHPROJ_*` environment variables.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Env {
  pub build_mode: Option<BuildMode>,
  /// An `EnvFilter` directive.
  pub log:        Option<String>
}

pub const ENV_PREFIX:  &str = "GRAPHPROJ_";
pub const CONFIG_FILE: &str = "graphproj.toml";

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
  pub min_version:                 String,
  pub build_mode:                  BuildMode,
  pub internal_directory_name:     String,
  pub bazel_integration_directory: PathBuf,
  pub scheme:                      SchemeVersions,
  pub products:                    ProductsConfig
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ProductsConfig {
  /// Lowest priority first.
  pub platform_precedence: Precedence
}

impl Default for Config {
  fn default() -> Self {
    Config {
      min_version:                 String::new(),
      build_mode:                  BuildMode::default(),
      internal_directory_name:     "rules_xcodeproj".to_string(),
      bazel_integration_directory: PathBuf::from("bazel"),
      scheme:                      SchemeVersions::default(),
      products:                    ProductsConfig::default()
    }
  }
}

impl Config {
  pub fn from_slice(bytes: &[u8]) -> DynResult<Self> {
    Ok(toml::from_slice(bytes)?)
  }

  /// A missing file leaves every setting at its default.
  pub fn load(path: &Path) -> DynResult<Self> {
    match std::fs::read(path) {
      Ok(bytes)                                          => Self::from_slice(&bytes),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
      Err(e)                                             => Err(e.into())
    }
  }

  /// Layers the environment and the command line over the file.
  pub fn options(&self,
                 env:              &Env,
                 build_mode:       Option<BuildMode>,
                 project:          &Project,
                 workspace:        &Path,
                 output_directory: &Path) -> Options
  {
    let output_path = output_directory.join(format!("{}.xcodeproj", project.name));
    let workspace_output_path = pathdiff::diff_paths(&output_path, workspace)
      .unwrap_or_else(|| output_path.clone());

    Options {
      build_mode:                  build_mode.or(env.build_mode).unwrap_or(self.build_mode),
      project_root_directory:      workspace.to_path_buf(),
      output_path,
      workspace_output_path,
      internal_directory_name:     self.internal_directory_name.clone(),
      bazel_integration_directory: workspace.join(&self.bazel_integration_directory),
      scheme_versions:             self.scheme.clone(),
      precedence:                  self.products.platform_precedence.clone()
    }
  }
}

#[derive(Debug)]
pub struct MinVerError {
  expected: Version,
  current:  Version
}

impl fmt::Display for MinVerError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "Project does not support this version: expected {} but running {}",
           self.expected, self.current)
  }
}

impl Error for MinVerError {}

pub fn is_supported(min_version: &str, current: &str) -> DynResult<()> {
  if !min_version.is_empty() {
    let expected = Version::parse(min_version)?;
    let current  = Version::parse(current)?;
    if expected > current {
      return Err(Box::new(MinVerError { expected, current }))
    }
  }
  Ok(())
}
