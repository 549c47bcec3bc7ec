use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// How the generated project builds: with Xcode's own build system, or by
/// proxying every build through Bazel.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
  Xcode,
  Bazel
}

impl Default for BuildMode {
  fn default() -> Self { BuildMode::Xcode }
}

impl BuildMode {
  pub fn allows_generated_info_plists(self) -> bool {
    match self {
      BuildMode::Xcode => true,
      BuildMode::Bazel => false
    }
  }

  /// Bazel builds set their output groups from a scheme pre-action.
  pub fn uses_bazel_mode_build_scripts(self) -> bool {
    match self {
      BuildMode::Xcode => false,
      BuildMode::Bazel => true
    }
  }

  pub fn requires_lldb_init(self) -> bool {
    match self {
      BuildMode::Xcode => false,
      BuildMode::Bazel => true
    }
  }

  pub fn uses_bazel_environment_variables(self) -> bool {
    match self {
      BuildMode::Xcode => false,
      BuildMode::Bazel => true
    }
  }

  pub fn to_str(self) -> &'static str {
    match self {
      BuildMode::Xcode => "xcode",
      BuildMode::Bazel => "bazel"
    }
  }
}

impl FromStr for BuildMode {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "xcode" => Ok(BuildMode::Xcode),
      "bazel" => Ok(BuildMode::Bazel),
      _       => Err(format!("Unknown build mode '{}', expected 'xcode' or 'bazel'", s))
    }
  }
}

impl fmt::Display for BuildMode {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str(self.to_str())
  }
}
