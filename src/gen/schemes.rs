use crate::dto::BuildMode;
use crate::error::PreconditionError;
use crate::gen::targets::PbxTargets;
use crate::pbx::PbxTarget;
use crate::resolver::FilePathResolver;
use crate::scheme::*;
use crate::sort::sort_localized_standard_by;

const NATIVE_PRE_ACTION: &str = concat!("mkdir -p \"${BAZEL_BUILD_OUTPUT_GROUPS_FILE%/*}\"\n",
                                        "echo \"b $BAZEL_TARGET_ID\" > \"$BAZEL_BUILD_OUTPUT_GROUPS_FILE\"\n");

const AGGREGATE_PRE_ACTION: &str = concat!("if [[ -s \"$BAZEL_BUILD_OUTPUT_GROUPS_FILE\" ]]; then\n",
                                           "    rm \"$BAZEL_BUILD_OUTPUT_GROUPS_FILE\"\n",
                                           "fi\n");

/// Tells the `BazelDependencies` target which output groups the scheme's
/// target needs. Building the aggregate alone clears the request.
fn build_pre_action(target: &PbxTarget, reference: &BuildableReference) -> ExecutionAction {
  let script = match target.is_native() {
    true  => NATIVE_PRE_ACTION,
    false => AGGREGATE_PRE_ACTION
  };
  ExecutionAction {
    script_text:           script.to_string(),
    title:                 BUILD_OUTPUT_GROUPS_TITLE.to_string(),
    environment_buildable: Some(reference.clone())
  }
}

fn create_scheme(build_mode: BuildMode, container: &str, target: &PbxTarget,
                 versions: &SchemeVersions) -> Result<XCScheme, PreconditionError>
{
  let reference     = BuildableReference::new(target, container)?;
  let configuration = target.default_build_configuration_name().to_string();
  let testable      = target.is_testable();
  let runnable      = match target.is_launchable() && !testable {
    true  => Some(reference.clone()),
    false => None
  };
  let lldb_init = match build_mode.requires_lldb_init() {
    true  => Some(LLDB_INIT_FILE.to_string()),
    false => None
  };
  let pre_actions = match build_mode.uses_bazel_mode_build_scripts() {
    true  => vec!(build_pre_action(target, &reference)),
    false => Vec::new()
  };

  Ok(XCScheme {
    name:                 target.scheme_name(),
    last_upgrade_version: versions.last_upgrade_version.clone(),
    base_version:         versions.version_for(build_mode).to_string(),
    build_action:         BuildAction {
      entries:                     vec!(BuildActionEntry { reference: reference.clone(), build_for: BuildFor::ALL.to_vec() }),
      pre_actions,
      parallelize_build:           true,
      build_implicit_dependencies: true
    },
    test_action:          TestAction {
      build_configuration:   configuration.clone(),
      macro_expansion:       None,
      testables:             match testable {
        true  => vec!(TestableReference { skipped: false, reference: reference.clone() }),
        false => Vec::new()
      },
      custom_lldb_init_file: lldb_init.clone()
    },
    launch_action:        LaunchAction {
      build_configuration:   configuration.clone(),
      runnable:              runnable.clone(),
      macro_expansion:       match testable {
        true  => Some(reference),
        false => None
      },
      environment_variables: match build_mode.uses_bazel_environment_variables() {
        true  => target.launch_environment_variables(),
        false => None
      },
      custom_lldb_init_file: lldb_init
    },
    profile_action:       ProfileAction {
      build_configuration: configuration.clone(),
      runnable
    },
    analyze_action:       AnalyzeAction {
      build_configuration: configuration.clone()
    },
    archive_action:       ArchiveAction {
      build_configuration:         configuration,
      reveal_archive_in_organizer: true
    }
  })
}

/// One scheme per target, sorted by name.
pub fn create_schemes(build_mode: BuildMode,
                      resolver:   &FilePathResolver,
                      targets:    &PbxTargets,
                      versions:   &SchemeVersions) -> Result<Vec<XCScheme>, PreconditionError>
{
  let container = resolver.container_reference();
  let mut schemes = targets.values()
    .map(|t| create_scheme(build_mode, &container, t, versions))
    .collect::<Result<Vec<_>, _>>()?;
  sort_localized_standard_by(&mut schemes, |s| s.name.clone());
  Ok(schemes)
}

pub fn create_shared_data(schemes: Vec<XCScheme>) -> XCSharedData {
  XCSharedData { schemes }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::consolidate::ConsolidatedTargetKey;
  use crate::dto::ProductType;
  use pretty_assertions::assert_eq;

  fn targets() -> PbxTargets {
    let mut targets = PbxTargets::new();
    targets.insert(ConsolidatedTargetKey::bazel_dependencies(), PbxTarget::mock_aggregate("BazelDependencies"));
    targets.insert("A 1".into(), PbxTarget::mock_native("A 1", ProductType::StaticLibrary, Some("libA.a")));
    targets.insert("B 2".into(), PbxTarget::mock_native("B 2", ProductType::UnitTestBundle, Some("B.xctest")));
    targets.insert("A 2".into(), PbxTarget::mock_native("A 2", ProductType::Application, Some("A.app")));
    targets
  }

  fn schemes(build_mode: BuildMode) -> Vec<XCScheme> {
    let resolver = FilePathResolver::new("r_xcp", "some/Project.xcodeproj");
    create_schemes(build_mode, &resolver, &targets(), &SchemeVersions::default()).unwrap()
  }

  fn reference(targets: &PbxTargets, key: &str) -> BuildableReference {
    let key = match key {
      "BazelDependencies" => ConsolidatedTargetKey::bazel_dependencies(),
      k                   => k.into()
    };
    BuildableReference::new(&targets[&key], "container:some/Project.xcodeproj").unwrap()
  }

  #[test]
  fn xcode_mode() {
    let t = targets();
    let s = schemes(BuildMode::Xcode);
    let names: Vec<&str> = s.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["A 1", "A 2", "B 2", "BazelDependencies"]);

    let app = &s[1];
    assert_eq!(app.base_version, "1.3");
    assert_eq!(app.last_upgrade_version, "1320");
    assert!(app.build_action.pre_actions.is_empty());
    assert!(app.build_action.parallelize_build);
    assert_eq!(app.build_action.entries[0].build_for, BuildFor::ALL.to_vec());
    assert_eq!(app.build_action.entries[0].reference, reference(&t, "A 2"));
    assert_eq!(app.launch_action.runnable, Some(reference(&t, "A 2")));
    assert_eq!(app.profile_action.runnable, Some(reference(&t, "A 2")));
    assert_eq!(app.launch_action.macro_expansion, None);
    assert_eq!(app.launch_action.environment_variables, None);
    assert_eq!(app.launch_action.custom_lldb_init_file, None);
    assert!(app.test_action.testables.is_empty());
    assert!(app.archive_action.reveal_archive_in_organizer);
    assert_eq!(app.archive_action.build_configuration, "Debug");

    let test = &s[2];
    assert_eq!(test.test_action.testables, vec!(TestableReference { skipped: false, reference: reference(&t, "B 2") }));
    assert_eq!(test.launch_action.runnable, None);
    assert_eq!(test.launch_action.macro_expansion, Some(reference(&t, "B 2")));

    let lib = &s[0];
    assert_eq!(lib.launch_action.runnable, None);
    assert_eq!(lib.launch_action.macro_expansion, None);

    let deps = &s[3];
    assert_eq!(deps.build_action.entries[0].reference.buildable_name, "BazelDependencies");
  }

  #[test]
  fn bazel_mode() {
    let t = targets();
    let s = schemes(BuildMode::Bazel);

    let app = &s[1];
    assert_eq!(app.base_version, "1.7");
    assert_eq!(app.build_action.pre_actions, vec!(ExecutionAction {
      script_text:           NATIVE_PRE_ACTION.to_string(),
      title:                 "Set Bazel Build Output Groups".to_string(),
      environment_buildable: Some(reference(&t, "A 2"))
    }));
    assert_eq!(app.launch_action.custom_lldb_init_file.as_deref(), Some("$(BAZEL_LLDB_INIT)"));
    assert_eq!(app.test_action.custom_lldb_init_file.as_deref(), Some("$(BAZEL_LLDB_INIT)"));
    assert_eq!(app.launch_action.environment_variables, ProductType::Application.bazel_launch_environment_variables());

    let lib = &s[0];
    assert_eq!(lib.launch_action.environment_variables, None);

    let test = &s[2];
    assert_eq!(test.name, "B 2");
    assert_eq!(test.last_upgrade_version, "1320");
    assert_eq!(test.base_version, "1.7");
    assert_eq!(test.test_action.testables, vec!(TestableReference { skipped: false, reference: reference(&t, "B 2") }));
    assert_eq!(test.launch_action.runnable, None);
    assert_eq!(test.launch_action.macro_expansion, Some(reference(&t, "B 2")));
    assert_eq!(test.build_action.pre_actions, vec!(ExecutionAction {
      script_text:           NATIVE_PRE_ACTION.to_string(),
      title:                 BUILD_OUTPUT_GROUPS_TITLE.to_string(),
      environment_buildable: Some(reference(&t, "B 2"))
    }));
    assert_eq!(test.test_action.custom_lldb_init_file.as_deref(), Some(LLDB_INIT_FILE));
    assert_eq!(test.launch_action.custom_lldb_init_file.as_deref(), Some(LLDB_INIT_FILE));

    let deps = &s[3];
    assert_eq!(deps.build_action.pre_actions[0].script_text, AGGREGATE_PRE_ACTION);
  }

  #[test]
  fn targets_without_products_are_fatal() {
    let mut t = targets();
    t.insert("R 1".into(), PbxTarget::mock_native("R 1", ProductType::Bundle, None));
    let resolver = FilePathResolver::new("r_xcp", "P.xcodeproj");
    assert!(create_schemes(BuildMode::Xcode, &resolver, &t, &SchemeVersions::default()).is_err());
  }
}
