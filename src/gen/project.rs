use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::path::Path;

use crate::dto::{BuildMode, Project};
use crate::error::PreconditionError;
use crate::gen::targets::PbxTargets;
use crate::pbx::{ConfigurationList, Element, ObjectId, PbxProj, PbxProject, PbxTarget, SourceTree};
use crate::pbx::project::COMPATIBILITY_VERSION;
use crate::resolver::{FilePathResolver, display};
use crate::scheme::{SchemeVersions, XCSharedData};
use crate::sort::sort_localized_standard_by;
use crate::xcode::XcodeProj;

/// Creates the project root with an empty main group. Targets and files are
/// added by later stages.
pub fn create_project(build_mode:             BuildMode,
                      project:                &Project,
                      project_root_directory: &Path,
                      resolver:               &FilePathResolver,
                      versions:               &SchemeVersions) -> PbxProj
{
  let mut settings = project.build_settings.clone();
  settings.extend(project_settings(build_mode, resolver));

  let last_upgrade = match versions.last_upgrade_version.parse::<u64>() {
    Ok(n)  => json!(n),
    Err(_) => json!(versions.last_upgrade_version)
  };

  let mut attributes = BTreeMap::new();
  attributes.insert("BuildIndependentTargetsInParallel".to_string(), json!(1));
  attributes.insert("LastSwiftUpdateCheck".to_string(), last_upgrade.clone());
  attributes.insert("LastUpgradeCheck".to_string(), last_upgrade);

  PbxProj::new(PbxProject {
    id:                    ObjectId::new("PBXProject", &project.name),
    name:                  project.name.clone(),
    configuration_list:    ConfigurationList::new(&["PBXProject/", &project.name].concat(), settings),
    compatibility_version: COMPATIBILITY_VERSION.to_string(),
    development_region:    "en".to_string(),
    project_dir_path:      display(project_root_directory),
    attributes,
    main_group:            Element::group(ObjectId::new("PBXGroup", "main"), None, None, SourceTree::Group, Vec::new()),
    product_ref_group:     None,
    targets:               Vec::new()
  })
}

/// The main group with the file tree and the products group, in that order.
pub fn populate_main_group(main_group: &Element, root_elements: Vec<Element>, products_group: Element) -> Element {
  let mut children = root_elements;
  children.push(products_group);
  Element::group(main_group.id.clone(), main_group.name.clone(), main_group.path.clone(),
                 main_group.source_tree, children)
}

/// Attaches the targets to the project, the aggregate first then the native
/// targets by name.
pub fn create_xcodeproj(mut pbx_proj: PbxProj,
                        targets:      PbxTargets,
                        shared_data:  XCSharedData) -> Result<XcodeProj, PreconditionError>
{
  let mut ordered: Vec<PbxTarget> = targets.into_iter().map(|(_, t)| t).collect();
  sort_localized_standard_by(&mut ordered, |t| t.name.clone());
  ordered.sort_by_key(PbxTarget::is_native);

  pbx_proj.root_mut()?.targets = ordered;
  Ok(XcodeProj { pbx_proj, shared_data })
}

fn project_settings(build_mode: BuildMode, resolver: &FilePathResolver) -> BTreeMap<String, Value> {
  let mut s = BTreeMap::new();
  let mut set = |k: &str, v: Value| { s.insert(k.to_string(), v); };

  set("BAZEL_EXTERNAL",                    json!("$(LINKS_DIR)/external"));
  set("BAZEL_OUT",                         json!("$(BUILD_DIR)/real-bazel-out"));
  set("BUILT_PRODUCTS_DIR",                json!("$(INDEXING_BUILT_PRODUCTS_DIR__$(INDEX_ENABLE_BUILD_ARENA))"));
  set("CONFIGURATION_BUILD_DIR",           json!("$(BUILD_DIR)/$(BAZEL_PACKAGE_BIN_DIR)"));
  set("DEPLOYMENT_LOCATION",               json!("$(INDEXING_DEPLOYMENT_LOCATION__$(INDEX_ENABLE_BUILD_ARENA))"));
  set("DSTROOT",                           json!("$(PROJECT_TEMP_DIR)"));
  set("GEN_DIR",                           json!("$(LINKS_DIR)/gen_dir"));
  set("INDEXING_BUILT_PRODUCTS_DIR__",     json!("$(BUILD_DIR)"));
  set("INDEXING_BUILT_PRODUCTS_DIR__NO",   json!("$(INDEXING_BUILT_PRODUCTS_DIR__)"));
  set("INDEXING_BUILT_PRODUCTS_DIR__YES",  json!("$(CONFIGURATION_BUILD_DIR)"));
  set("INDEXING_DEPLOYMENT_LOCATION__",    json!(true));
  set("INDEXING_DEPLOYMENT_LOCATION__NO",  json!("$(INDEXING_DEPLOYMENT_LOCATION__)"));
  set("INDEXING_DEPLOYMENT_LOCATION__YES", json!(false));
  set("INSTALL_PATH",                      json!("$(BAZEL_PACKAGE_BIN_DIR)/$(TARGET_NAME)/bin"));
  set("INTERNAL_DIR",                      json!(["$(PROJECT_FILE_PATH)/", &resolver.internal_directory_name].concat()));
  set("LINKS_DIR",                         json!("$(INTERNAL_DIR)/links"));
  set("SUPPORTS_MACCATALYST",              json!(false));
  set("SWIFT_OPTIMIZATION_LEVEL",          json!("-Onone"));
  set("TARGET_TEMP_DIR",                   json!("$(PROJECT_TEMP_DIR)/$(BAZEL_PACKAGE_BIN_DIR)/$(TARGET_NAME)"));

  if build_mode.uses_bazel_mode_build_scripts() {
    set("BAZEL_BUILD_OUTPUT_GROUPS_FILE", json!("$(BUILD_DIR)/bazel_build_output_groups"));
    set("BAZEL_INTEGRATION_DIR",          json!("$(INTERNAL_DIR)/bazel"));
    set("BAZEL_LLDB_INIT",                json!("$(BUILD_DIR)/bazel.lldbinit"));
    set("CC",                             json!("$(BAZEL_INTEGRATION_DIR)/cc.sh"));
    set("CODE_SIGNING_ALLOWED",           json!(false));
    set("LD",                             json!("$(BAZEL_INTEGRATION_DIR)/ld.sh"));
    set("LIBTOOL",                        json!("$(BAZEL_INTEGRATION_DIR)/libtool.sh"));
    set("SWIFT_EXEC",                     json!("$(BAZEL_INTEGRATION_DIR)/swiftc.py"));
    set("SWIFT_USE_INTEGRATED_DRIVER",    json!(false));
  }
  s
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  fn project() -> Project {
    let mut p = Project::default();
    p.name = "Bazel".to_string();
    p.build_settings.insert("ALWAYS_SEARCH_USER_PATHS".to_string(), json!(false));
    p.build_settings.insert("SUPPORTS_MACCATALYST".to_string(), json!(true));
    p
  }

  fn settings(p: &PbxProj) -> &BTreeMap<String, Value> {
    &p.root().unwrap().configuration_list.configurations[0].build_settings
  }

  #[test]
  fn xcode_mode() {
    let resolver = FilePathResolver::new("r_xcp", "X.xcodeproj");
    let p = create_project(BuildMode::Xcode, &project(), Path::new("/dev/project"),
                           &resolver, &SchemeVersions::default());
    let root = p.root().unwrap();

    assert_eq!(root.name, "Bazel");
    assert_eq!(root.compatibility_version, "Xcode 13.0");
    assert_eq!(root.development_region, "en");
    assert_eq!(root.project_dir_path, "/dev/project");
    assert_eq!(root.attributes["LastUpgradeCheck"], json!(1320));
    assert_eq!(root.attributes["BuildIndependentTargetsInParallel"], json!(1));
    assert!(root.main_group.children().is_empty());
    assert!(root.targets.is_empty());

    let s = settings(&p);
    assert_eq!(s["ALWAYS_SEARCH_USER_PATHS"], json!(false));
    assert_eq!(s["SUPPORTS_MACCATALYST"], json!(false));
    assert_eq!(s["INTERNAL_DIR"], json!("$(PROJECT_FILE_PATH)/r_xcp"));
    assert!(!s.contains_key("BAZEL_LLDB_INIT"));
    assert!(!s.contains_key("CC"));
  }

  #[test]
  fn main_group_ends_with_products() {
    let resolver = FilePathResolver::new("r_xcp", "X.xcodeproj");
    let p = create_project(BuildMode::Xcode, &project(), Path::new("/dev/project"),
                           &resolver, &SchemeVersions::default());
    let main = &p.root().unwrap().main_group;
    let file = |n: &str| Element::group(ObjectId::new("PBXGroup", n), None, Some(n.to_string()),
                                        SourceTree::Group, Vec::new());

    let populated = populate_main_group(main, vec!(file("b"), file("a")), file("Products"));
    let names: Vec<&str> = populated.children().iter().map(Element::display_name).collect();
    assert_eq!(names, vec!["b", "a", "Products"]);
    assert_eq!(populated.id, main.id);
  }

  #[test]
  fn aggregate_targets_come_first() {
    let resolver = FilePathResolver::new("r_xcp", "X.xcodeproj");
    let p = create_project(BuildMode::Xcode, &project(), Path::new("/dev/project"),
                           &resolver, &SchemeVersions::default());
    let mut targets = PbxTargets::new();
    targets.insert("A 1".into(), PbxTarget::mock_native("Zed", crate::dto::ProductType::StaticLibrary, Some("libZ.a")));
    targets.insert("A 2".into(), PbxTarget::mock_native("app 10", crate::dto::ProductType::Application, Some("A.app")));
    targets.insert("A 3".into(), PbxTarget::mock_native("app 9", crate::dto::ProductType::Application, Some("B.app")));
    targets.insert("bazel_dependencies".into(), PbxTarget::mock_aggregate("BazelDependencies"));

    let x = create_xcodeproj(p, targets, XCSharedData::default()).unwrap();
    let names: Vec<&str> = x.pbx_proj.root().unwrap().targets.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["BazelDependencies", "app 9", "app 10", "Zed"]);

    let empty = PbxProj { object_version: 55, root_object: None };
    assert!(create_xcodeproj(empty, PbxTargets::new(), XCSharedData::default()).is_err());
  }

  #[test]
  fn bazel_mode() {
    let resolver = FilePathResolver::new("r_xcp", "X.xcodeproj");
    let p = create_project(BuildMode::Bazel, &project(), Path::new("/dev/project"),
                           &resolver, &SchemeVersions::default());
    let s = settings(&p);
    assert_eq!(s["BAZEL_LLDB_INIT"], json!("$(BUILD_DIR)/bazel.lldbinit"));
    assert_eq!(s["BAZEL_BUILD_OUTPUT_GROUPS_FILE"], json!("$(BUILD_DIR)/bazel_build_output_groups"));
    assert_eq!(s["LD"], json!("$(BAZEL_INTEGRATION_DIR)/ld.sh"));
    assert_eq!(s["CODE_SIGNING_ALLOWED"], json!(false));
  }
}
