//! Project targets: the `BazelDependencies` aggregate every target depends
//! on, then one native target per disambiguated target.

use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet};

use crate::consolidate::{ConsolidatedTargetKey, ConsolidatedTargets, DisambiguatedTarget, DisambiguatedTargets};
use crate::dto::{BuildMode, FilePath, PathType, ProductType, Target};
use crate::error::{PreconditionError, precondition};
use crate::gen::files::{self, Files};
use crate::gen::products::{Products, canonical, canonical_member};
use crate::pbx::{BuildFile, BuildPhase, BuildPhaseKind, ConfigurationList, ObjectId,
                 PbxTarget, ProductReference, TargetKind};
use crate::platform::Precedence;
use crate::resolver::FilePathResolver;
use crate::sort::sort_localized_standard_by;

pub const BAZEL_DEPENDENCIES_TARGET_NAME: &str = "BazelDependencies";

const ALL_PLATFORMS: &str = concat!("watchsimulator watchos macosx iphonesimulator iphoneos ",
                                    "driverkit appletvsimulator appletvos");

pub type PbxTargets = BTreeMap<ConsolidatedTargetKey, PbxTarget>;

fn internal_file_list(name: &str) -> String {
  ["$(INTERNAL_DIR)/", name].concat()
}

fn shell_script(owner: &str, name: &str, script: String,
                inputs: Vec<String>, outputs: Vec<String>) -> BuildPhase
{
  BuildPhase {
    id:    ObjectId::new("PBXShellScriptBuildPhase", &[owner, "/", name].concat()),
    kind:  BuildPhaseKind::ShellScript {
      name:                   name.to_string(),
      script,
      input_paths:            Vec::new(),
      output_paths:           Vec::new(),
      input_file_list_paths:  inputs,
      output_file_list_paths: outputs
    },
    files: Vec::new()
  }
}

const LINK_SCRIPT: &str = r#"set -euo pipefail

if [ "$ACTION" == "indexbuild" ]; then
  # Index builds use their own output base so they never wait on the lock
  # held by a normal build.
  output_base="$OBJROOT/bazel_output_base"
fi

output_path=$(env -i \
  DEVELOPER_DIR="$DEVELOPER_DIR" \
  HOME="$HOME" \
  PATH="$PATH" \
  USER="$USER" \
  "$BAZEL_PATH" \
  ${output_base:+--output_base "$output_base"} \
  info \
  --experimental_convenience_symlinks=ignore \
  output_path)
external="${output_path%/*/*/*}/external"

if [ "$ACTION" != "indexbuild" ]; then
  mkdir -p "$LINKS_DIR"
  cd "$LINKS_DIR"

  # Keeps Bazel from recursing into the `external` symlink.
  touch BUILD

  rm -rf external
  rm -rf gen_dir
  ln -sf "$external" external
  ln -sf "$BUILD_DIR/bazel-out" gen_dir
fi

cd "$BUILD_DIR"

rm -rf external
rm -rf real-bazel-out
ln -sf "$external" external
ln -sf "$output_path" real-bazel-out
ln -sfn "$PROJECT_DIR" SRCROOT

"#;

const COPY_SCRIPT: &str = r#"set -euo pipefail

cd "$BAZEL_OUT"

rsync \
  --files-from "$INTERNAL_DIR/generated.rsynclist" \
  --chmod=u+w \
  -L \
  . \
  "$BUILD_DIR/bazel-out"
"#;

fn generate_files_script(build_mode: BuildMode, label: &str, configuration: &str) -> String {
  let groups = match build_mode.uses_bazel_mode_build_scripts() {
    false => format!("output_groups='generated_inputs {}'\n", configuration),
    true  => format!(concat!("if [[ -s \"$BAZEL_BUILD_OUTPUT_GROUPS_FILE\" ]]; then\n",
                             "  output_groups=$(paste -sd, \"$BAZEL_BUILD_OUTPUT_GROUPS_FILE\")\n",
                             "else\n",
                             "  output_groups='generated_inputs {}'\n",
                             "fi\n"),
                     configuration)
  };
  let build = format!(concat!("\n",
                              "cd \"$SRCROOT\"\n",
                              "\n",
                              "env -i \\\n",
                              "  DEVELOPER_DIR=\"$DEVELOPER_DIR\" \\\n",
                              "  HOME=\"$HOME\" \\\n",
                              "  PATH=\"$PATH\" \\\n",
                              "  USER=\"$USER\" \\\n",
                              "  \"$BAZEL_PATH\" \\\n",
                              "  ${{output_base:+--output_base \"$output_base\"}} \\\n",
                              "  build \\\n",
                              "  --experimental_convenience_symlinks=ignore \\\n",
                              "  \"--output_groups=$output_groups\" \\\n",
                              "  {}\n"),
                      label);
  [LINK_SCRIPT, &groups, &build].concat()
}

/// The aggregate target creating the links the project relies on and
/// building the generated inputs. There is none without targets.
pub fn add_bazel_dependencies_target(build_mode:    BuildMode,
                                     files:         &Files,
                                     resolver:      &FilePathResolver,
                                     label:         &str,
                                     configuration: &str,
                                     consolidated:  &ConsolidatedTargets) -> Result<Option<PbxTarget>, PreconditionError>
{
  if consolidated.targets.is_empty() {
    return Ok(None);
  }

  for list in &[files::EXTERNAL_FILE_LIST, files::GENERATED_FILE_LIST] {
    if !files.contains_key(&FilePath::internal(list)) {
      return precondition(format!("\"{}\" not found in `files`", list));
    }
  }

  let owner = ["PBXAggregateTarget/", BAZEL_DEPENDENCIES_TARGET_NAME].concat();
  let mut phases = vec!(shell_script(
    &owner, "Generate Files",
    generate_files_script(build_mode, label, configuration),
    Vec::new(),
    vec!(internal_file_list(files::EXTERNAL_FILE_LIST), internal_file_list(files::GENERATED_FILE_LIST))
  ));
  if files.contains_key(&FilePath::internal(files::GENERATED_RSYNC_LIST)) {
    phases.push(shell_script(
      &owner, "Copy Files",
      COPY_SCRIPT.to_string(),
      vec!(internal_file_list(files::GENERATED_FILE_LIST)),
      vec!(internal_file_list("generated.copied.xcfilelist"))
    ));
  }

  let mut settings = BTreeMap::new();
  settings.insert("ALLOW_TARGET_PLATFORM_SPECIALIZATION".to_string(), json!(true));
  settings.insert("BAZEL_PACKAGE_BIN_DIR".to_string(),                json!(resolver.internal_directory_name));
  settings.insert("INDEX_FORCE_SCRIPT_EXECUTION".to_string(),         json!(true));
  settings.insert("SUPPORTED_PLATFORMS".to_string(),                  json!(ALL_PLATFORMS));
  settings.insert("SUPPORTS_MACCATALYST".to_string(),                 json!(true));
  settings.insert("TARGET_NAME".to_string(),                          json!(BAZEL_DEPENDENCIES_TARGET_NAME));

  Ok(Some(PbxTarget {
    id:                 ObjectId::new("PBXAggregateTarget", &ConsolidatedTargetKey::bazel_dependencies().to_string()),
    name:               BAZEL_DEPENDENCIES_TARGET_NAME.to_string(),
    kind:               TargetKind::Aggregate,
    build_phases:       phases,
    configuration_list: ConfigurationList::new(&owner, settings),
    dependencies:       Vec::new()
  }))
}

/// Collects the build files of one phase, skipping hidden files and files
/// already present through their variant or version group.
struct PhaseBuilder {
  phase: BuildPhase
}

impl PhaseBuilder {
  fn new(target: &ObjectId, kind: BuildPhaseKind) -> Self {
    let mut phase = BuildPhase { id: target.clone(), kind, files: Vec::new() };
    phase.id = ObjectId::new(phase.isa(), &[target.as_str(), "/", phase.display_name()].concat());
    PhaseBuilder { phase }
  }

  fn push(&mut self, file_ref: &ObjectId, name: &str, settings: Option<BTreeMap<String, String>>) {
    if self.phase.files.iter().any(|f| &f.file_ref == file_ref) {
      return;
    }
    self.phase.files.push(BuildFile {
      id:       ObjectId::new("PBXBuildFile", &[self.phase.id.as_str(), "/", file_ref.as_str()].concat()),
      file_ref: file_ref.clone(),
      name:     name.to_string(),
      settings
    });
  }

  fn push_path(&mut self, files: &Files, path: &FilePath,
               settings: Option<BTreeMap<String, String>>) -> Result<(), PreconditionError>
  {
    match files.get(path) {
      Some(f) => {
        if let Some((id, name)) = f.reference() {
          self.push(id, name, settings);
        }
        Ok(())
      },
      None => precondition(format!("File \"{}\" not found in `files`", path))
    }
  }

  fn push_product(&mut self, product: &ProductReference) {
    self.push(&product.id, &product.name, None);
  }

  fn build(self, phases: &mut Vec<BuildPhase>) {
    if !self.phase.files.is_empty() {
      phases.push(self.phase);
    }
  }
}

fn build_phases(id:            &ObjectId,
                target:        &DisambiguatedTarget,
                disambiguated: &DisambiguatedTargets,
                products:      &Products,
                files:         &Files) -> Result<Vec<BuildPhase>, PreconditionError>
{
  let inputs = target.target.inputs();
  let linker = target.target.linker_inputs();
  let mut phases = Vec::new();

  let mut headers = PhaseBuilder::new(id, BuildPhaseKind::Headers);
  for p in &inputs.hdrs {
    headers.push_path(files, p, None)?;
  }
  headers.build(&mut phases);

  let mut sources = PhaseBuilder::new(id, BuildPhaseKind::Sources);
  for p in &inputs.srcs {
    sources.push_path(files, p, None)?;
  }
  for p in &inputs.non_arc_srcs {
    let mut settings = BTreeMap::new();
    settings.insert("COMPILER_FLAGS".to_string(), "-fno-objc-arc".to_string());
    sources.push_path(files, p, Some(settings))?;
  }
  if files::needs_compile_stub(&inputs, target.target.product_type()) {
    sources.push_path(files, &files::compile_stub(), None)?;
  }
  sources.build(&mut phases);

  let mut frameworks = PhaseBuilder::new(id, BuildPhaseKind::Frameworks);
  for p in linker.dynamic_frameworks.iter().chain(&linker.static_frameworks) {
    match (p.path_type, products.by_file_path.get(p)) {
      (PathType::Generated, Some(product)) => frameworks.push_product(product),
      (PathType::Generated, None)          => {},
      _                                    => frameworks.push_path(files, p, None)?
    }
  }
  frameworks.build(&mut phases);

  let mut resources = PhaseBuilder::new(id, BuildPhaseKind::Resources);
  for p in &inputs.resources {
    resources.push_path(files, p, None)?;
  }
  for dep in target.target.resource_bundle_dependencies() {
    let key = match disambiguated.keys.get(dep) {
      Some(k) => k,
      None    => return precondition(format!("Resource bundle \"{}\" not found in `disambiguated_targets`", dep))
    };
    resources.push_product(products.for_target(key)?);
  }
  sort_localized_standard_by(&mut resources.phase.files, |f| f.name.clone());
  resources.build(&mut phases);

  Ok(phases)
}

/// One native target per disambiguated target, each depending on the
/// aggregate target. The aggregate is part of the result.
pub fn add_targets(disambiguated:      &DisambiguatedTargets,
                   products:           &Products,
                   files:              &Files,
                   bazel_dependencies: Option<PbxTarget>) -> Result<PbxTargets, PreconditionError>
{
  let mut targets = PbxTargets::new();

  for (key, target) in &disambiguated.targets {
    let id      = ObjectId::new("PBXNativeTarget", &key.to_string());
    let product = products.for_target(key)?;
    let mut pbx = PbxTarget {
      build_phases:       build_phases(&id, target, disambiguated, products, files)?,
      id,
      name:               target.name.clone(),
      kind:               TargetKind::Native {
        product_type: target.target.product_type(),
        product_name: target.target.product_name().to_string(),
        product:      Some(product.clone())
      },
      configuration_list: ConfigurationList::empty(&["PBXNativeTarget/", &key.to_string()].concat()),
      dependencies:       Vec::new()
    };
    if let Some(deps) = &bazel_dependencies {
      pbx.add_dependency(deps);
    }
    targets.insert(key.clone(), pbx);
  }

  if let Some(deps) = bazel_dependencies {
    targets.insert(ConsolidatedTargetKey::bazel_dependencies(), deps);
  }
  tracing::debug!("Added {} targets", targets.len());
  Ok(targets)
}

/// Sets `name` to the canonical member's value, and adds an SDK conditional
/// variant for every other member whose value differs.
fn set_conditional<F>(settings: &mut BTreeMap<String, Value>, name: &str,
                      members: &[(&str, &Target)], value: F)
  where F: Fn(&str, &Target) -> Value
{
  let base = value(members[0].0, members[0].1);
  for (id, t) in &members[1..] {
    let v = value(id, t);
    if v != base {
      settings.insert(format!("{}[sdk={}*]", name, t.platform.name), v);
    }
  }
  settings.insert(name.to_string(), base);
}

fn target_settings(key:           &ConsolidatedTargetKey,
                   target:        &DisambiguatedTarget,
                   disambiguated: &DisambiguatedTargets,
                   build_mode:    BuildMode,
                   resolver:      &FilePathResolver,
                   precedence:    &Precedence) -> Result<BTreeMap<String, Value>, PreconditionError>
{
  let consolidated = &target.target;
  let (main_id, main) = canonical_member(consolidated, precedence);
  let mut members: Vec<(&str, &Target)> = consolidated.targets.iter()
    .filter(|(id, _)| *id != main_id)
    .map(|(id, t)| (id.as_str(), t))
    .collect();
  members.sort_by(|a, b| b.1.platform.name.cmp(&a.1.platform.name));
  members.insert(0, (main_id.as_str(), main));

  let mut s = main.build_settings.clone();
  for (_, t) in &members[1..] {
    for (k, v) in &t.build_settings {
      if s.get(k) != Some(v) && !k.contains("[sdk=") {
        s.insert(format!("{}[sdk={}*]", k, t.platform.name), v.clone());
      }
    }
  }

  set_conditional(&mut s, "ARCHS", &members, |_, t| json!(t.platform.arch));
  set_conditional(&mut s, "BAZEL_TARGET_ID", &members, |id, _| json!(id));
  set_conditional(&mut s, "BAZEL_PACKAGE_BIN_DIR", &members, |_, t| {
    json!(["bazel-out/", &t.product.path.parent().path].concat())
  });
  for (_, t) in &members {
    let (_, deployment_target) = t.platform.os.sdk_info();
    s.entry(deployment_target.to_string()).or_insert_with(|| json!(t.platform.minimum_os_version));
  }

  let mut platforms: Vec<&str> = Vec::new();
  for (_, t) in &members {
    if !platforms.contains(&t.platform.name.as_str()) {
      platforms.push(&t.platform.name);
    }
  }
  s.insert("SDKROOT".to_string(),             json!(main.platform.os.sdk_info().0));
  s.insert("SUPPORTED_PLATFORMS".to_string(), json!(platforms.join(" ")));
  s.insert("PRODUCT_NAME".to_string(),        json!(consolidated.product_name()));
  s.insert("TARGET_NAME".to_string(),         json!(target.name));

  if build_mode.allows_generated_info_plists() {
    s.insert("GENERATE_INFOPLIST_FILE".to_string(), json!("YES"));
  }

  let inputs = consolidated.inputs();
  if let Some(p) = &inputs.entitlements {
    s.insert("CODE_SIGN_ENTITLEMENTS".to_string(), json!(resolver.resolve(p)));
  }
  if let Some(p) = &inputs.pch {
    s.insert("GCC_PREFIX_HEADER".to_string(), json!(resolver.resolve(p)));
  }

  if let Some(host_id) = &main.test_host {
    let host = match disambiguated.keys.get(host_id).and_then(|k| disambiguated.targets.get(k)) {
      Some(h) => h,
      None    => return precondition(format!("Test host \"{}\" for \"{}\" not found in `disambiguated_targets`",
                                             host_id, key))
    };
    match consolidated.product_type() {
      ProductType::UITestBundle => {
        s.insert("TEST_TARGET_NAME".to_string(), json!(host.name));
      },
      _ => {
        let product = &canonical(&host.target, precedence).product;
        s.insert("TEST_HOST".to_string(),
                 json!(format!("$(BUILD_DIR)/bazel-out/{}/{}", product.path.path, product.name)));
        s.insert("BUNDLE_LOADER".to_string(), json!("$(TEST_HOST)"));
      }
    }
  }

  Ok(s)
}

pub fn set_target_configurations(disambiguated: &DisambiguatedTargets,
                                 build_mode:    BuildMode,
                                 mut targets:   PbxTargets,
                                 resolver:      &FilePathResolver,
                                 precedence:    &Precedence) -> Result<PbxTargets, PreconditionError>
{
  for (key, target) in &disambiguated.targets {
    let settings = target_settings(key, target, disambiguated, build_mode, resolver, precedence)?;
    let pbx = match targets.get_mut(key) {
      Some(t) => t,
      None    => return precondition(format!("Target \"{}\" not found in `pbx_targets`", key))
    };
    pbx.configuration_list = ConfigurationList::new(&["PBXNativeTarget/", &key.to_string()].concat(), settings);
  }
  Ok(targets)
}

/// Adds an edge for every dependency of every member, once per target and
/// never to itself.
pub fn set_target_dependencies(disambiguated: &DisambiguatedTargets,
                               mut targets:   PbxTargets) -> Result<PbxTargets, PreconditionError>
{
  for (key, target) in &disambiguated.targets {
    let mut dependencies = BTreeSet::new();
    for id in target.target.dependencies() {
      match disambiguated.keys.get(id) {
        Some(k) if k == key => {},
        Some(k)             => { dependencies.insert(k); },
        None                => return precondition(format!("Target \"{}\" not found in `disambiguated_targets`", id))
      }
    }

    let mut pbx = match targets.remove(key) {
      Some(t) => t,
      None    => return precondition(format!("Target \"{}\" not found in `pbx_targets`", key))
    };
    for dep in dependencies {
      match targets.get(dep) {
        Some(t) => pbx.add_dependency(t),
        None    => return precondition(format!("Target \"{}\" not found in `pbx_targets`", dep))
      }
    }
    targets.insert(key.clone(), pbx);
  }
  Ok(targets)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::consolidate::disambiguate;
  use crate::gen::files::{File, create_files_and_groups};
  use crate::gen::products::create_products;
  use crate::gen::schemes::create_schemes;
  use crate::log::StubLogger;
  use crate::platform::Platform;
  use crate::scheme::{BUILD_OUTPUT_GROUPS_TITLE, BuildableReference, LLDB_INIT_FILE, SchemeVersions, TestableReference};
  use pretty_assertions::assert_eq;

  struct Fixture {
    disambiguated: DisambiguatedTargets,
    products:      Products,
    files:         Files
  }

  fn targets() -> Vec<(&'static str, Target)> {
    let mut app = Target::mock("//a:A", "a1b2c", ProductType::Application, "A", FilePath::generated("a1b2c/bin/A 2/A.app"))
      .with_dependencies(&["A 1"])
      .with_resources(&["Localized.strings".into()]);
    app.resource_bundle_dependencies.insert("R 1".to_string());
    app.inputs.entitlements = Some("app.entitlements".into());
    app.linker_inputs.dynamic_frameworks.insert("a/Fram.framework".into());

    let mut lib = Target::mock("//a:A", "a1b2c", ProductType::StaticLibrary, "A", FilePath::generated("a1b2c/bin/A 1/libA.a"))
      .with_srcs(&["a/x.swift".into()]);
    lib.inputs.non_arc_srcs.insert("a/y.m".into());
    lib.inputs.hdrs.insert("a/x.h".into());

    let mut test = Target::mock("//b:B", "a1b2c", ProductType::UnitTestBundle, "B", FilePath::generated("a1b2c/bin/B 2/B.xctest"))
      .with_srcs(&["b/t.swift".into()])
      .with_dependencies(&["A 1", "A 2", "B 2"]);
    test.test_host = Some("A 2".to_string());

    let bundle = Target::mock("//r:R", "a1b2c", ProductType::Bundle, "R", FilePath::generated("a1b2c/bin/R 1/R.bundle"))
      .with_resources(&["r/X.txt".into(), "r/Base.lproj/Y.xib".into(), "r/en.lproj/Y.strings".into()]);

    vec!(("A 1", lib), ("A 2", app), ("B 2", test), ("R 1", bundle))
  }

  fn fixture(build_mode: BuildMode, targets: Vec<(&str, Target)>) -> Fixture {
    let map = targets.into_iter().map(|(id, t)| (id.to_string(), t)).collect();
    let partition = crate::consolidate::default_partition(&map);
    let consolidated = ConsolidatedTargets::new(map, partition).unwrap();
    let (files, _) = create_files_and_groups(build_mode, &consolidated, &BTreeSet::new(), &[],
                                             &resolver(), &StubLogger::default()).unwrap();
    let (products, _) = create_products(&consolidated, &Precedence::default());
    Fixture { disambiguated: disambiguate(&consolidated).unwrap(), products, files }
  }

  fn resolver() -> FilePathResolver {
    FilePathResolver::new("rules_xcodeproj", "P.xcodeproj")
  }

  fn consolidated(f: &Fixture) -> ConsolidatedTargets {
    ConsolidatedTargets {
      keys:    f.disambiguated.keys.clone(),
      targets: f.disambiguated.targets.iter().map(|(k, t)| (k.clone(), t.target.clone())).collect()
    }
  }

  fn all(f: &Fixture, build_mode: BuildMode) -> PbxTargets {
    let deps = add_bazel_dependencies_target(build_mode, &f.files, &resolver(), "//:p", "z9y8x", &consolidated(f)).unwrap();
    let targets = add_targets(&f.disambiguated, &f.products, &f.files, deps).unwrap();
    let targets = set_target_configurations(&f.disambiguated, build_mode, targets, &resolver(), &Precedence::default()).unwrap();
    set_target_dependencies(&f.disambiguated, targets).unwrap()
  }

  fn phase_files<'a>(t: &'a PbxTarget, name: &str) -> Vec<&'a str> {
    t.build_phases.iter()
      .filter(|p| p.display_name() == name)
      .flat_map(|p| p.files.iter().map(|f| f.name.as_str()))
      .collect()
  }

  fn setting<'a>(t: &'a PbxTarget, name: &str) -> Option<&'a Value> {
    t.configuration_list.configurations[0].build_settings.get(name)
  }

  #[test]
  fn bazel_dependencies_target() {
    let f = fixture(BuildMode::Xcode, targets());
    let t = add_bazel_dependencies_target(BuildMode::Xcode, &f.files, &resolver(), "//:p", "z9y8x", &consolidated(&f))
      .unwrap().unwrap();

    assert_eq!(t.name, "BazelDependencies");
    assert!(!t.is_native());
    let phases: Vec<&str> = t.build_phases.iter().map(|p| p.display_name()).collect();
    assert_eq!(phases, vec!["Generate Files", "Copy Files"]);
    match &t.build_phases[0].kind {
      BuildPhaseKind::ShellScript { script, output_file_list_paths, .. } => {
        assert!(script.ends_with("\"--output_groups=$output_groups\" \\\n  //:p\n"));
        assert!(script.contains("output_groups='generated_inputs z9y8x'\n"));
        assert_eq!(output_file_list_paths, &vec!["$(INTERNAL_DIR)/external.xcfilelist",
                                                 "$(INTERNAL_DIR)/generated.xcfilelist"]);
      },
      other => panic!("unexpected {:?}", other)
    }
    assert_eq!(setting(&t, "BAZEL_PACKAGE_BIN_DIR"), Some(&json!("rules_xcodeproj")));
    assert_eq!(setting(&t, "TARGET_NAME"), Some(&json!("BazelDependencies")));
    assert_eq!(setting(&t, "SUPPORTS_MACCATALYST"), Some(&json!(true)));

    let f = fixture(BuildMode::Bazel, targets());
    let t = add_bazel_dependencies_target(BuildMode::Bazel, &f.files, &resolver(), "//:p", "z9y8x", &consolidated(&f))
      .unwrap().unwrap();
    assert_eq!(t.build_phases.len(), 1);
    match &t.build_phases[0].kind {
      BuildPhaseKind::ShellScript { script, .. } => assert!(script.contains("paste -sd, \"$BAZEL_BUILD_OUTPUT_GROUPS_FILE\"")),
      other                                      => panic!("unexpected {:?}", other)
    }

    let empty = ConsolidatedTargets { keys: BTreeMap::new(), targets: BTreeMap::new() };
    assert_eq!(add_bazel_dependencies_target(BuildMode::Xcode, &f.files, &resolver(), "//:p", "z9y8x", &empty), Ok(None));
  }

  #[test]
  fn build_phases_come_from_files_and_products() {
    let f = fixture(BuildMode::Xcode, targets());
    let t = all(&f, BuildMode::Xcode);

    let lib = &t[&"A 1".into()];
    assert_eq!(phase_files(lib, "Headers"), vec!["x.h"]);
    assert_eq!(phase_files(lib, "Sources"), vec!["x.swift", "y.m"]);
    let non_arc = lib.build_phases.iter().find(|p| p.display_name() == "Sources").unwrap().files[1].settings.clone();
    assert_eq!(non_arc.unwrap()["COMPILER_FLAGS"], "-fno-objc-arc");

    let app = &t[&"A 2".into()];
    assert_eq!(phase_files(app, "Sources"), vec![files::COMPILE_STUB]);
    assert_eq!(phase_files(app, "Frameworks"), vec!["Fram.framework"]);
    assert_eq!(phase_files(app, "Resources"), vec!["Localized.strings", "R.bundle"]);

    let bundle = &t[&"R 1".into()];
    assert_eq!(phase_files(bundle, "Sources"), Vec::<&str>::new());
    assert_eq!(phase_files(bundle, "Resources"), vec!["X.txt", "Y.xib"]);
  }

  #[test]
  fn every_target_depends_on_bazel_dependencies() {
    let f = fixture(BuildMode::Xcode, targets());
    let t = all(&f, BuildMode::Xcode);
    let deps = &t[&ConsolidatedTargetKey::bazel_dependencies()];

    let names = |k: &str| t[&k.into()].dependencies.iter().map(|d| d.target_name.as_str()).collect::<Vec<_>>();
    assert_eq!(names("A 1"), vec!["BazelDependencies"]);
    assert_eq!(names("A 2"), vec!["BazelDependencies", "A (macOS) (a1b2c) (A 1)"]);
    assert_eq!(names("B 2"), vec!["BazelDependencies", "A (macOS) (a1b2c) (A 1)", "A (macOS) (a1b2c) (A 2)"]);
    assert!(deps.dependencies.is_empty());
    assert_eq!(t[&"A 2".into()].dependencies[0].target, deps.id);
  }

  #[test]
  fn configurations_carry_target_settings() {
    let f = fixture(BuildMode::Xcode, targets());
    let t = all(&f, BuildMode::Xcode);

    let app = &t[&"A 2".into()];
    assert_eq!(setting(app, "PRODUCT_NAME"), Some(&json!("A")));
    assert_eq!(setting(app, "TARGET_NAME"), Some(&json!(app.name)));
    assert_eq!(setting(app, "SDKROOT"), Some(&json!("macosx")));
    assert_eq!(setting(app, "ARCHS"), Some(&json!("arm64")));
    assert_eq!(setting(app, "BAZEL_TARGET_ID"), Some(&json!("A 2")));
    assert_eq!(setting(app, "BAZEL_PACKAGE_BIN_DIR"), Some(&json!("bazel-out/a1b2c/bin/A 2")));
    assert_eq!(setting(app, "CODE_SIGN_ENTITLEMENTS"), Some(&json!("$(PROJECT_DIR)/app.entitlements")));
    assert_eq!(setting(app, "GENERATE_INFOPLIST_FILE"), Some(&json!("YES")));
    assert_eq!(setting(app, "MACOSX_DEPLOYMENT_TARGET"), Some(&json!("11.0")));

    let test = &t[&"B 2".into()];
    assert_eq!(setting(test, "TEST_HOST"), Some(&json!("$(BUILD_DIR)/bazel-out/a1b2c/bin/A 2/A.app/A")));
    assert_eq!(setting(test, "BUNDLE_LOADER"), Some(&json!("$(TEST_HOST)")));

    let f = fixture(BuildMode::Bazel, targets());
    let t = all(&f, BuildMode::Bazel);
    assert_eq!(setting(&t[&"A 2".into()], "GENERATE_INFOPLIST_FILE"), None);
  }

  #[test]
  fn platform_variants_get_sdk_conditionals() {
    let t = |id: &str, platform: Platform| {
      let mut t = Target::mock("//t:T", "a1b2c", ProductType::StaticLibrary, "T",
                               FilePath::generated(&format!("a1b2c/bin/{}/T.a", id)))
        .with_srcs(&["t.swift".into()])
        .with_platform(platform);
      t.build_settings.insert("SWIFT_VERSION".to_string(), json!("5"));
      t
    };
    let mut device = t("T 1", Platform::device());
    device.build_settings.insert("SWIFT_VERSION".to_string(), json!("4"));
    let f = fixture(BuildMode::Xcode, vec!(("T 1", device), ("T 2", t("T 2", Platform::simulator())),
                                           ("T 3", t("T 3", Platform::macos()))));
    let targets = all(&f, BuildMode::Xcode);
    let target  = &targets[&ConsolidatedTargetKey::new(vec!("T 1", "T 2", "T 3"))];

    assert_eq!(setting(target, "BAZEL_TARGET_ID"), Some(&json!("T 3")));
    assert_eq!(setting(target, "BAZEL_TARGET_ID[sdk=iphoneos*]"), Some(&json!("T 1")));
    assert_eq!(setting(target, "BAZEL_TARGET_ID[sdk=iphonesimulator*]"), Some(&json!("T 2")));
    assert_eq!(setting(target, "BAZEL_PACKAGE_BIN_DIR[sdk=iphoneos*]"), Some(&json!("bazel-out/a1b2c/bin/T 1")));
    assert_eq!(setting(target, "ARCHS"), Some(&json!("arm64")));
    assert_eq!(setting(target, "ARCHS[sdk=iphonesimulator*]"), Some(&json!("x86_64")));
    assert_eq!(setting(target, "ARCHS[sdk=iphoneos*]"), None);
    assert_eq!(setting(target, "SWIFT_VERSION"), Some(&json!("5")));
    assert_eq!(setting(target, "SWIFT_VERSION[sdk=iphoneos*]"), Some(&json!("4")));
    assert_eq!(setting(target, "SDKROOT"), Some(&json!("macosx")));
    assert_eq!(setting(target, "SUPPORTED_PLATFORMS"), Some(&json!("macosx iphonesimulator iphoneos")));
    assert_eq!(setting(target, "IPHONEOS_DEPLOYMENT_TARGET"), Some(&json!("11.0")));
  }

  #[test]
  fn hosted_test_scheme_in_bazel_mode() {
    let f = fixture(BuildMode::Bazel, targets());
    let t = all(&f, BuildMode::Bazel);
    let schemes = create_schemes(BuildMode::Bazel, &resolver(), &t, &SchemeVersions::default()).unwrap();

    let test = &t[&"B 2".into()];
    let host = &t[&"A 2".into()];
    assert!(test.dependencies.iter().any(|d| d.target == host.id));

    let scheme    = schemes.iter().find(|s| s.name == test.scheme_name()).unwrap();
    let reference = BuildableReference::new(test, "container:P.xcodeproj").unwrap();
    assert_eq!((scheme.last_upgrade_version.as_str(), scheme.base_version.as_str()), ("1320", "1.7"));
    assert_eq!(scheme.test_action.testables, vec!(TestableReference { skipped: false, reference: reference.clone() }));
    assert_eq!(scheme.launch_action.runnable, None);
    assert_eq!(scheme.launch_action.macro_expansion, Some(reference.clone()));
    assert_eq!(scheme.build_action.pre_actions.len(), 1);
    assert_eq!(scheme.build_action.pre_actions[0].title, BUILD_OUTPUT_GROUPS_TITLE);
    assert!(scheme.build_action.pre_actions[0].script_text.contains("echo \"b $BAZEL_TARGET_ID\""));
    assert_eq!(scheme.build_action.pre_actions[0].environment_buildable, Some(reference));
    assert_eq!(scheme.test_action.custom_lldb_init_file.as_deref(), Some(LLDB_INIT_FILE));
    assert_eq!(scheme.launch_action.custom_lldb_init_file.as_deref(), Some(LLDB_INIT_FILE));
  }

  #[test]
  fn missing_files_and_dependencies_are_fatal() {
    let f = fixture(BuildMode::Xcode, targets());
    let mut files = f.files.clone();
    files.remove(&FilePath::project("a/x.swift"));
    assert_eq!(add_targets(&f.disambiguated, &f.products, &files, None).unwrap_err().message,
               "File \"a/x.swift\" not found in `files`");

    let mut broken = targets();
    broken[0].1.dependencies.insert("Z 9".to_string());
    let f = fixture(BuildMode::Xcode, broken);
    let targets = add_targets(&f.disambiguated, &f.products, &f.files, None).unwrap();
    assert_eq!(set_target_dependencies(&f.disambiguated, targets).unwrap_err().message,
               "Target \"Z 9\" not found in `disambiguated_targets`");

    let mut hidden = f.files.clone();
    hidden.insert(FilePath::project("a/x.swift"), File::Hidden);
    assert!(add_targets(&f.disambiguated, &f.products, &hidden, None).is_ok());
  }
}
