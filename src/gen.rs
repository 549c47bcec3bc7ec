//! The generation pipeline.
//!
//! Every stage is a method of `Environment` whose default body is the
//! production implementation. The `Generator` only sequences the stages and
//! reports warnings, tests swap individual stages out.

pub mod files;
pub mod products;
pub mod project;
pub mod schemes;
pub mod targets;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::consolidate::{self, ConsolidatedTargets, DisambiguatedTargets, InvalidMerge};
use crate::dto::{BuildMode, FilePath, Project, Target, TargetID, XCCurrentVersion};
use crate::error::{Error, PreconditionError, precondition};
use crate::log::Logger;
use crate::pbx::{Element, PbxProj, PbxTarget};
use crate::platform::Precedence;
use crate::resolver::FilePathResolver;
use crate::scheme::{SchemeVersions, XCScheme, XCSharedData};
use crate::xcode::{self, XcodeProj};

pub use files::{File, Files};
pub use products::Products;
pub use targets::PbxTargets;

/// Everything the pipeline needs besides the project itself.
#[derive(Clone, Debug)]
pub struct Options {
  pub build_mode:                  BuildMode,
  /// Directory the project's source paths are relative to.
  pub project_root_directory:      PathBuf,
  /// The `.xcodeproj` bundle to write.
  pub output_path:                 PathBuf,
  /// `output_path` relative to the workspace root.
  pub workspace_output_path:       PathBuf,
  pub internal_directory_name:     String,
  pub bazel_integration_directory: PathBuf,
  pub scheme_versions:             SchemeVersions,
  pub precedence:                  Precedence
}

pub trait Environment {
  fn create_project(&self,
                    build_mode:             BuildMode,
                    project:                &Project,
                    project_root_directory: &Path,
                    resolver:               &FilePathResolver,
                    versions:               &SchemeVersions) -> PbxProj
  {
    project::create_project(build_mode, project, project_root_directory, resolver, versions)
  }

  fn process_target_merges(&self,
                           targets: &mut BTreeMap<TargetID, Target>,
                           merges:  &BTreeMap<TargetID, BTreeSet<TargetID>>) -> Vec<InvalidMerge>
  {
    consolidate::apply_merges(targets, merges)
  }

  fn consolidate_targets(&self, targets: BTreeMap<TargetID, Target>) -> Result<ConsolidatedTargets, PreconditionError> {
    let partition = consolidate::default_partition(&targets);
    ConsolidatedTargets::new(targets, partition)
  }

  fn create_files_and_groups(&self,
                             build_mode:        BuildMode,
                             consolidated:      &ConsolidatedTargets,
                             extra_files:       &BTreeSet<FilePath>,
                             xccurrentversions: &[XCCurrentVersion],
                             resolver:          &FilePathResolver,
                             logger:            &dyn Logger) -> Result<(Files, Vec<Element>), PreconditionError>
  {
    files::create_files_and_groups(build_mode, consolidated, extra_files, xccurrentversions, resolver, logger)
  }

  fn create_products(&self, consolidated: &ConsolidatedTargets, precedence: &Precedence) -> (Products, Element) {
    products::create_products(consolidated, precedence)
  }

  fn populate_main_group(&self, main_group: &Element, root_elements: Vec<Element>, products_group: Element) -> Element {
    project::populate_main_group(main_group, root_elements, products_group)
  }

  fn disambiguate_targets(&self, consolidated: &ConsolidatedTargets) -> Result<DisambiguatedTargets, PreconditionError> {
    consolidate::disambiguate(consolidated)
  }

  fn add_bazel_dependencies_target(&self,
                                   build_mode:    BuildMode,
                                   files:         &Files,
                                   resolver:      &FilePathResolver,
                                   label:         &str,
                                   configuration: &str,
                                   consolidated:  &ConsolidatedTargets) -> Result<Option<PbxTarget>, PreconditionError>
  {
    targets::add_bazel_dependencies_target(build_mode, files, resolver, label, configuration, consolidated)
  }

  fn add_targets(&self,
                 disambiguated:      &DisambiguatedTargets,
                 products:           &Products,
                 files:              &Files,
                 bazel_dependencies: Option<PbxTarget>) -> Result<PbxTargets, PreconditionError>
  {
    targets::add_targets(disambiguated, products, files, bazel_dependencies)
  }

  fn set_target_configurations(&self,
                               disambiguated: &DisambiguatedTargets,
                               build_mode:    BuildMode,
                               targets:       PbxTargets,
                               resolver:      &FilePathResolver,
                               precedence:    &Precedence) -> Result<PbxTargets, PreconditionError>
  {
    targets::set_target_configurations(disambiguated, build_mode, targets, resolver, precedence)
  }

  fn set_target_dependencies(&self,
                             disambiguated: &DisambiguatedTargets,
                             targets:       PbxTargets) -> Result<PbxTargets, PreconditionError>
  {
    targets::set_target_dependencies(disambiguated, targets)
  }

  fn create_schemes(&self,
                    build_mode: BuildMode,
                    resolver:   &FilePathResolver,
                    targets:    &PbxTargets,
                    versions:   &SchemeVersions) -> Result<Vec<XCScheme>, PreconditionError>
  {
    schemes::create_schemes(build_mode, resolver, targets, versions)
  }

  fn create_shared_data(&self, schemes: Vec<XCScheme>) -> XCSharedData {
    schemes::create_shared_data(schemes)
  }

  fn create_xcodeproj(&self,
                      pbx_proj:    PbxProj,
                      targets:     PbxTargets,
                      shared_data: XCSharedData) -> Result<XcodeProj, PreconditionError>
  {
    project::create_xcodeproj(pbx_proj, targets, shared_data)
  }

  fn write_xcodeproj(&self,
                     xcodeproj:                   &XcodeProj,
                     build_mode:                  BuildMode,
                     files:                       &Files,
                     internal_directory_name:     &str,
                     bazel_integration_directory: &Path,
                     output_path:                 &Path) -> Result<(), Error>
  {
    xcode::write(xcodeproj, build_mode, files, internal_directory_name, bazel_integration_directory, output_path)
  }
}

/// Binds every stage to its production implementation.
pub struct DefaultEnvironment;

impl Environment for DefaultEnvironment {}

pub struct Generator<'a> {
  pub env:    &'a dyn Environment,
  pub logger: &'a dyn Logger
}

impl<'a> Generator<'a> {
  pub fn new(env: &'a dyn Environment, logger: &'a dyn Logger) -> Self {
    Generator { env, logger }
  }

  pub fn generate(&self, project: &Project, options: &Options) -> Result<(), Error> {
    let env        = self.env;
    let build_mode = options.build_mode;
    let resolver   = FilePathResolver::new(&options.internal_directory_name, &options.workspace_output_path);

    let mut pbx_proj = env.create_project(build_mode, project, &options.project_root_directory,
                                          &resolver, &options.scheme_versions);

    let mut targets = project.targets.clone();
    let invalid     = env.process_target_merges(&mut targets, &project.target_merges);
    self.warn_invalid_merges(&project.targets, &invalid, &project.invalid_target_merges)?;
    tracing::debug!("{} targets left after merging", targets.len());

    let consolidated = env.consolidate_targets(targets)?;
    let (files, root_elements) = env.create_files_and_groups(
      build_mode, &consolidated, &project.extra_files, &project.xccurrentversions, &resolver, self.logger)?;
    let (products, products_group) = env.create_products(&consolidated, &options.precedence);

    let root = pbx_proj.root_mut()?;
    let products_group_id = products_group.id.clone();
    root.main_group        = env.populate_main_group(&root.main_group, root_elements, products_group);
    root.product_ref_group = Some(products_group_id);

    let disambiguated = env.disambiguate_targets(&consolidated)?;
    disambiguated.validate()?;

    let bazel_dependencies = env.add_bazel_dependencies_target(
      build_mode, &files, &resolver, &project.label, &project.configuration, &consolidated)?;
    let targets = env.add_targets(&disambiguated, &products, &files, bazel_dependencies)?;
    let targets = env.set_target_configurations(&disambiguated, build_mode, targets, &resolver, &options.precedence)?;
    let targets = env.set_target_dependencies(&disambiguated, targets)?;

    let schemes     = env.create_schemes(build_mode, &resolver, &targets, &options.scheme_versions)?;
    let shared_data = env.create_shared_data(schemes);
    let xcodeproj   = env.create_xcodeproj(pbx_proj, targets, shared_data)?;

    env.write_xcodeproj(&xcodeproj, build_mode, &files, &options.internal_directory_name,
                        &options.bazel_integration_directory, &options.output_path)?;

    tracing::info!("Generated {} targets and {} schemes in {}",
                   xcodeproj.pbx_proj.root()?.targets.len(),
                   xcodeproj.shared_data.schemes.len(),
                   options.output_path.display());
    Ok(())
  }

  /// One warning per rejected destination, naming both ends the way the
  /// project reported them before merging.
  fn warn_invalid_merges(&self,
                         targets:  &BTreeMap<TargetID, Target>,
                         invalid:  &[InvalidMerge],
                         reported: &BTreeMap<TargetID, BTreeSet<TargetID>>) -> Result<(), PreconditionError>
  {
    let mut all: BTreeMap<&TargetID, BTreeSet<&TargetID>> = BTreeMap::new();
    for m in invalid {
      all.entry(&m.source).or_default().extend(&m.destinations);
    }
    for (source, destinations) in reported {
      all.entry(source).or_default().extend(destinations);
    }

    let describe = |id: &TargetID| match targets.get(id) {
      Some(t) => Ok(format!("{} ({})", t.label, t.configuration)),
      None    => precondition(format!("Target \"{}\" not found in `targets`", id))
    };
    for (source, destinations) in all {
      let source = describe(source)?;
      for destination in destinations {
        self.logger.warning(&format!("Was unable to merge \"{}\" into \"{}\"", source, describe(destination)?));
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::consolidate::{ConsolidatedTargetKey, DisambiguatedTarget};
  use crate::dto::ProductType;
  use crate::log::StubLogger;
  use pretty_assertions::assert_eq;
  use std::cell::RefCell;

  /// Runs the production stages while recording the order they ran in.
  #[derive(Default)]
  struct Recorder {
    calls:     RefCell<Vec<&'static str>>,
    written:   RefCell<Option<XcodeProj>>,
    duplicate: bool
  }

  impl Recorder {
    fn record(&self, stage: &'static str) {
      self.calls.borrow_mut().push(stage);
    }
  }

  impl Environment for Recorder {
    fn create_project(&self, build_mode: BuildMode, project: &Project, root: &Path,
                      resolver: &FilePathResolver, versions: &SchemeVersions) -> PbxProj
    {
      self.record("create_project");
      project::create_project(build_mode, project, root, resolver, versions)
    }

    fn process_target_merges(&self, targets: &mut BTreeMap<TargetID, Target>,
                             merges: &BTreeMap<TargetID, BTreeSet<TargetID>>) -> Vec<InvalidMerge>
    {
      self.record("process_target_merges");
      consolidate::apply_merges(targets, merges)
    }

    fn consolidate_targets(&self, targets: BTreeMap<TargetID, Target>) -> Result<ConsolidatedTargets, PreconditionError> {
      self.record("consolidate_targets");
      let partition = consolidate::default_partition(&targets);
      ConsolidatedTargets::new(targets, partition)
    }

    fn create_files_and_groups(&self, build_mode: BuildMode, consolidated: &ConsolidatedTargets,
                               extra_files: &BTreeSet<FilePath>, xccurrentversions: &[XCCurrentVersion],
                               resolver: &FilePathResolver, logger: &dyn Logger) -> Result<(Files, Vec<Element>), PreconditionError>
    {
      self.record("create_files_and_groups");
      files::create_files_and_groups(build_mode, consolidated, extra_files, xccurrentversions, resolver, logger)
    }

    fn create_products(&self, consolidated: &ConsolidatedTargets, precedence: &Precedence) -> (Products, Element) {
      self.record("create_products");
      products::create_products(consolidated, precedence)
    }

    fn populate_main_group(&self, main_group: &Element, root_elements: Vec<Element>, products_group: Element) -> Element {
      self.record("populate_main_group");
      project::populate_main_group(main_group, root_elements, products_group)
    }

    fn disambiguate_targets(&self, consolidated: &ConsolidatedTargets) -> Result<DisambiguatedTargets, PreconditionError> {
      self.record("disambiguate_targets");
      let mut d = consolidate::disambiguate(consolidated)?;
      if self.duplicate {
        for t in d.targets.values_mut() {
          t.name = "Same".to_string();
        }
      }
      Ok(d)
    }

    fn add_bazel_dependencies_target(&self, build_mode: BuildMode, files: &Files, resolver: &FilePathResolver,
                                     label: &str, configuration: &str,
                                     consolidated: &ConsolidatedTargets) -> Result<Option<PbxTarget>, PreconditionError>
    {
      self.record("add_bazel_dependencies_target");
      targets::add_bazel_dependencies_target(build_mode, files, resolver, label, configuration, consolidated)
    }

    fn add_targets(&self, disambiguated: &DisambiguatedTargets, products: &Products, files: &Files,
                   bazel_dependencies: Option<PbxTarget>) -> Result<PbxTargets, PreconditionError>
    {
      self.record("add_targets");
      targets::add_targets(disambiguated, products, files, bazel_dependencies)
    }

    fn set_target_configurations(&self, disambiguated: &DisambiguatedTargets, build_mode: BuildMode,
                                 targets: PbxTargets, resolver: &FilePathResolver,
                                 precedence: &Precedence) -> Result<PbxTargets, PreconditionError>
    {
      self.record("set_target_configurations");
      targets::set_target_configurations(disambiguated, build_mode, targets, resolver, precedence)
    }

    fn set_target_dependencies(&self, disambiguated: &DisambiguatedTargets,
                               targets: PbxTargets) -> Result<PbxTargets, PreconditionError>
    {
      self.record("set_target_dependencies");
      targets::set_target_dependencies(disambiguated, targets)
    }

    fn create_schemes(&self, build_mode: BuildMode, resolver: &FilePathResolver, targets: &PbxTargets,
                      versions: &SchemeVersions) -> Result<Vec<XCScheme>, PreconditionError>
    {
      self.record("create_schemes");
      schemes::create_schemes(build_mode, resolver, targets, versions)
    }

    fn create_shared_data(&self, schemes: Vec<XCScheme>) -> XCSharedData {
      self.record("create_shared_data");
      schemes::create_shared_data(schemes)
    }

    fn create_xcodeproj(&self, pbx_proj: PbxProj, targets: PbxTargets,
                        shared_data: XCSharedData) -> Result<XcodeProj, PreconditionError>
    {
      self.record("create_xcodeproj");
      project::create_xcodeproj(pbx_proj, targets, shared_data)
    }

    fn write_xcodeproj(&self, xcodeproj: &XcodeProj, _: BuildMode, _: &Files, _: &str, _: &Path,
                       _: &Path) -> Result<(), Error>
    {
      self.record("write_xcodeproj");
      *self.written.borrow_mut() = Some(xcodeproj.clone());
      Ok(())
    }
  }

  fn project() -> Project {
    let mut p = Project::default();
    p.name          = "P".to_string();
    p.label         = "//:xcodeproj".to_string();
    p.configuration = "z9y8x".to_string();

    let lib  = Target::mock("//a:Lib", "a1b2c", ProductType::StaticLibrary, "Lib", FilePath::generated("a1b2c/bin/A 1/libLib.a"))
      .with_srcs(&["a/lib.swift".into()]);
    let app  = Target::mock("//a:A", "a1b2c", ProductType::Application, "A", FilePath::generated("a1b2c/bin/A 2/A.app"))
      .with_dependencies(&["A 1"]);
    let mut test = Target::mock("//b:B", "a1b2c", ProductType::UnitTestBundle, "B", FilePath::generated("a1b2c/bin/B 2/B.xctest"))
      .with_srcs(&["b/t.swift".into()])
      .with_dependencies(&["A 2"]);
    test.test_host = Some("A 2".to_string());
    let other = Target::mock("//c:C", "d4e5f", ProductType::StaticLibrary, "C", FilePath::generated("d4e5f/bin/C 1/libC.a"))
      .with_srcs(&["c/c.swift".into()]);

    for (id, t) in vec!(("A 1", lib), ("A 2", app), ("B 2", test), ("C 1", other)) {
      p.targets.insert(id.to_string(), t);
    }
    p.target_merges.insert("A 1".to_string(), vec!("A 2".to_string()).into_iter().collect());
    p.target_merges.insert("C 1".to_string(), vec!("A 1".to_string()).into_iter().collect());
    p.invalid_target_merges.insert("B 2".to_string(), vec!("C 1".to_string()).into_iter().collect());
    p
  }

  fn options() -> Options {
    Options {
      build_mode:                  BuildMode::Xcode,
      project_root_directory:      PathBuf::from("/tmp/ws"),
      output_path:                 PathBuf::from("/tmp/ws/out/P.xcodeproj"),
      workspace_output_path:       PathBuf::from("out/P.xcodeproj"),
      internal_directory_name:     "rules_xcodeproj".to_string(),
      bazel_integration_directory: PathBuf::from("/tmp/ws/bazel"),
      scheme_versions:             SchemeVersions::default(),
      precedence:                  Precedence::default()
    }
  }

  #[test]
  fn stages_run_in_order() {
    let env    = Recorder::default();
    let logger = StubLogger::default();
    Generator::new(&env, &logger).generate(&project(), &options()).unwrap();

    assert_eq!(*env.calls.borrow(), vec![
      "create_project",
      "process_target_merges",
      "consolidate_targets",
      "create_files_and_groups",
      "create_products",
      "populate_main_group",
      "disambiguate_targets",
      "add_bazel_dependencies_target",
      "add_targets",
      "set_target_configurations",
      "set_target_dependencies",
      "create_schemes",
      "create_shared_data",
      "create_xcodeproj",
      "write_xcodeproj"
    ]);

    let written = env.written.borrow();
    let x       = written.as_ref().unwrap();
    let root    = x.pbx_proj.root().unwrap();
    let names: Vec<&str> = root.targets.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["BazelDependencies", "A", "B", "C"]);

    let products = root.main_group.children().last().unwrap();
    assert_eq!(products.display_name(), "Products");
    assert_eq!(root.product_ref_group.as_ref(), Some(&products.id));

    let schemes: Vec<&str> = x.shared_data.schemes.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(schemes, vec!["A", "B", "BazelDependencies", "C"]);
  }

  #[test]
  fn invalid_merges_become_warnings() {
    let env    = Recorder::default();
    let logger = StubLogger::default();
    Generator::new(&env, &logger).generate(&project(), &options()).unwrap();

    assert_eq!(*logger.warnings.borrow(), vec![
      "Was unable to merge \"//b:B (a1b2c)\" into \"//c:C (d4e5f)\"",
      "Was unable to merge \"//c:C (d4e5f)\" into \"//a:Lib (a1b2c)\""
    ]);
  }

  #[test]
  fn unknown_merge_targets_are_fatal() {
    let mut p = project();
    p.invalid_target_merges.insert("X 1".to_string(), vec!("A 2".to_string()).into_iter().collect());
    let env    = Recorder::default();
    let logger = StubLogger::default();
    let err    = Generator::new(&env, &logger).generate(&p, &options()).unwrap_err();

    assert_eq!(err.to_string(), "Target \"X 1\" not found in `targets`");
    assert_eq!(env.calls.borrow().last(), Some(&"process_target_merges"));
  }

  #[test]
  fn duplicate_names_stop_before_targets_are_built() {
    let env    = Recorder { duplicate: true, ..Recorder::default() };
    let logger = StubLogger::default();
    let err    = Generator::new(&env, &logger).generate(&project(), &options()).unwrap_err();

    assert!(err.to_string().contains("are both named \"Same\""), "{}", err);
    assert_eq!(env.calls.borrow().last(), Some(&"disambiguate_targets"));
    assert!(env.written.borrow().is_none());
  }

  #[test]
  fn missing_disambiguation_is_fatal() {
    struct Forgetful;
    impl Environment for Forgetful {
      fn disambiguate_targets(&self, c: &ConsolidatedTargets) -> Result<DisambiguatedTargets, PreconditionError> {
        let mut d = consolidate::disambiguate(c)?;
        let key = ConsolidatedTargetKey::from("C 1");
        let t: Option<DisambiguatedTarget> = d.targets.remove(&key);
        assert!(t.is_some());
        Ok(d)
      }
      fn write_xcodeproj(&self, _: &XcodeProj, _: BuildMode, _: &Files, _: &str, _: &Path,
                         _: &Path) -> Result<(), Error>
      {
        unreachable!()
      }
    }
    let logger = StubLogger::default();
    let err    = Generator::new(&Forgetful, &logger).generate(&project(), &options()).unwrap_err();
    assert_eq!(err.to_string(), "Consolidated target \"C 1\" has no disambiguated name");
  }
}
