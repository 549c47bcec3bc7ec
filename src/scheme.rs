//! Model of the `.xcscheme` documents written next to the project.

use serde::Deserialize;

use crate::dto::{BuildMode, EnvironmentVariable};
use crate::error::{PreconditionError, precondition};
use crate::pbx::{ObjectId, PbxTarget};

pub const BUILD_OUTPUT_GROUPS_TITLE: &str = "Set Bazel Build Output Groups";
pub const LLDB_INIT_FILE:            &str = "$(BAZEL_LLDB_INIT)";

/// Format versions stamped on every scheme.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SchemeVersions {
  pub last_upgrade_version: String,
  pub base_version:         String,
  /// Schemes using a custom LLDB init file need a newer format.
  pub lldb_init_version:    String
}

impl Default for SchemeVersions {
  fn default() -> Self {
    SchemeVersions {
      last_upgrade_version: "1320".to_string(),
      base_version:         "1.3".to_string(),
      lldb_init_version:    "1.7".to_string()
    }
  }
}

impl SchemeVersions {
  pub fn version_for(&self, build_mode: BuildMode) -> &str {
    match build_mode.requires_lldb_init() {
      true  => &self.lldb_init_version,
      false => &self.base_version
    }
  }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BuildableReference {
  pub referenced_container: String,
  pub blueprint_identifier: ObjectId,
  pub buildable_name:       String,
  pub blueprint_name:       String
}

impl BuildableReference {
  pub fn new(target: &PbxTarget, referenced_container: &str) -> Result<Self, PreconditionError> {
    let buildable_name = match target.buildable_name() {
      Some(n) => n.to_string(),
      None    => return precondition(format!("Target \"{}\" has no product to build", target.name))
    };
    Ok(BuildableReference {
      referenced_container: referenced_container.to_string(),
      blueprint_identifier: target.id.clone(),
      buildable_name,
      blueprint_name:       target.name.clone()
    })
  }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildFor {
  Running,
  Testing,
  Profiling,
  Archiving,
  Analyzing
}

impl BuildFor {
  pub const ALL: [BuildFor; 5] = [
    BuildFor::Running, BuildFor::Testing, BuildFor::Profiling, BuildFor::Archiving, BuildFor::Analyzing
  ];

  pub fn attribute(self) -> &'static str {
    match self {
      BuildFor::Running   => "buildForRunning",
      BuildFor::Testing   => "buildForTesting",
      BuildFor::Profiling => "buildForProfiling",
      BuildFor::Archiving => "buildForArchiving",
      BuildFor::Analyzing => "buildForAnalyzing"
    }
  }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BuildActionEntry {
  pub reference: BuildableReference,
  pub build_for: Vec<BuildFor>
}

/// A shell script run before an action.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExecutionAction {
  pub script_text:           String,
  pub title:                 String,
  pub environment_buildable: Option<BuildableReference>
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BuildAction {
  pub entries:                     Vec<BuildActionEntry>,
  pub pre_actions:                 Vec<ExecutionAction>,
  pub parallelize_build:           bool,
  pub build_implicit_dependencies: bool
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestableReference {
  pub skipped:   bool,
  pub reference: BuildableReference
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestAction {
  pub build_configuration:   String,
  pub macro_expansion:       Option<BuildableReference>,
  pub testables:             Vec<TestableReference>,
  pub custom_lldb_init_file: Option<String>
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LaunchAction {
  pub build_configuration:   String,
  pub runnable:              Option<BuildableReference>,
  pub macro_expansion:       Option<BuildableReference>,
  pub environment_variables: Option<Vec<EnvironmentVariable>>,
  pub custom_lldb_init_file: Option<String>
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProfileAction {
  pub build_configuration: String,
  pub runnable:            Option<BuildableReference>
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AnalyzeAction {
  pub build_configuration: String
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ArchiveAction {
  pub build_configuration:         String,
  pub reveal_archive_in_organizer: bool
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct XCScheme {
  pub name:                 String,
  pub last_upgrade_version: String,
  pub base_version:         String,
  pub build_action:         BuildAction,
  pub test_action:          TestAction,
  pub launch_action:        LaunchAction,
  pub profile_action:       ProfileAction,
  pub analyze_action:       AnalyzeAction,
  pub archive_action:       ArchiveAction
}

/// The shared part of the project bundle, `xcshareddata/`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct XCSharedData {
  pub schemes: Vec<XCScheme>
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::dto::ProductType;

  #[test]
  fn versions_depend_on_lldb_init() {
    let v = SchemeVersions::default();
    assert_eq!(v.version_for(BuildMode::Xcode), "1.3");
    assert_eq!(v.version_for(BuildMode::Bazel), "1.7");
  }

  #[test]
  fn references_need_a_buildable_name() {
    let app = PbxTarget::mock_native("A 2", ProductType::Application, Some("A.app"));
    let r   = BuildableReference::new(&app, "container:P.xcodeproj").unwrap();
    assert_eq!(r.buildable_name, "A.app");
    assert_eq!(r.blueprint_name, "A 2");
    assert_eq!(r.blueprint_identifier, app.id);

    let bare = PbxTarget::mock_native("R 1", ProductType::Bundle, None);
    assert_eq!(BuildableReference::new(&bare, "container:P.xcodeproj").unwrap_err().message,
               "Target \"R 1\" has no product to build");
  }
}
