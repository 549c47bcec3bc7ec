//! Builds the navigator tree from every path the targets reference.
//!
//! Each path type roots at its own place: project files directly in the main
//! group, the others inside a synthesized group pointing at the matching
//! symlink in the internal directory. Directories become groups, except for
//! a few bundle formats that Xcode treats as a single file:
//! - `*.lproj/F`         One variant group per file stem, one child per region.
//! - `*.xcdatamodeld/V`  One version group, one child per model version.
//! - `*.xcassets`, ...   A single file reference for the whole bundle.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::consolidate::ConsolidatedTargets;
use crate::dto::{BuildMode, FilePath, Inputs, PathType, ProductType, XCCurrentVersion};
use crate::error::PreconditionError;
use crate::log::Logger;
use crate::pbx::{Element, ElementKind, FileReference, ObjectId, SourceTree};
use crate::resolver::{FilePathResolver, display};
use crate::sort::sort_grouped_localized_standard;

pub const EXTERNAL_GROUP_NAME:  &str = "Bazel External Repositories";
pub const GENERATED_GROUP_NAME: &str = "Bazel Generated Files";

pub const COMPILE_STUB:         &str = "CompileStub.m";
pub const EXTERNAL_FILE_LIST:   &str = "external.xcfilelist";
pub const GENERATED_FILE_LIST:  &str = "generated.xcfilelist";
pub const GENERATED_RSYNC_LIST: &str = "generated.rsynclist";

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum File {
  /// Shown in the navigator. Variant and version group members all point to
  /// their group. Internal files carry the content to write.
  Reference {
    id:      ObjectId,
    name:    String,
    content: Option<String>
  },
  /// Written into the internal directory, never shown.
  NonReferenced {
    content: String
  },
  /// Known to the build, hidden from the navigator.
  Hidden
}

impl File {
  pub fn reference(&self) -> Option<(&ObjectId, &str)> {
    match self {
      File::Reference { id, name, .. } => Some((id, name)),
      _                                => None
    }
  }

  pub fn content(&self) -> Option<&str> {
    match self {
      File::Reference { content, .. }  => content.as_deref(),
      File::NonReferenced { content }  => Some(content),
      File::Hidden                     => None
    }
  }
}

pub type Files = BTreeMap<FilePath, File>;

/// Targets without a source file still need something to compile. Resource
/// bundles have no binary at all.
pub fn needs_compile_stub(inputs: &Inputs, product_type: ProductType) -> bool {
  inputs.srcs.is_empty() && inputs.non_arc_srcs.is_empty() && product_type != ProductType::Bundle
}

pub fn compile_stub() -> FilePath {
  FilePath::internal(COMPILE_STUB)
}

/// Last known file type for a path extension.
fn file_type(ext: Option<&str>) -> &'static str {
  match ext.unwrap_or("") {
    "a"                  => "archive.ar",
    "bundle"             => "wrapper.plug-in",
    "c"                  => "sourcecode.c.c",
    "cc" | "cpp" | "cxx" => "sourcecode.cpp.cpp",
    "entitlements"       => "text.plist.entitlements",
    "framework"          => "wrapper.framework",
    "h" | "pch"          => "sourcecode.c.h",
    "hpp"                => "sourcecode.cpp.h",
    "jpg" | "jpeg"       => "image.jpeg",
    "json"               => "text.json",
    "m"                  => "sourcecode.c.objc",
    "md"                 => "net.daringfireball.markdown",
    "mm"                 => "sourcecode.cpp.objcpp",
    "modulemap"          => "sourcecode.module-map",
    "plist"              => "text.plist.xml",
    "png"                => "image.png",
    "storyboard"         => "file.storyboard",
    "strings"            => "text.plist.strings",
    "swift"              => "sourcecode.swift",
    "xcassets"           => "folder.assetcatalog",
    "xcdatamodel"        => "wrapper.xcdatamodel",
    "xib"                => "file.xib",
    "xml"                => "text.xml",
    _                    => "text"
  }
}

fn extension(component: &str) -> Option<&str> {
  match component.rfind('.') {
    Some(0) | None => None,
    Some(i)        => Some(&component[i + 1..])
  }
}

/// Directories shown as a single file.
fn is_opaque_bundle(component: &str) -> bool {
  match extension(component) {
    Some("xcassets") | Some("bundle") | Some("framework") | Some("scnassets") => true,
    _                                                                         => false
  }
}

fn stem(name: &str) -> &str {
  match name.rfind('.') {
    Some(0) | None => name,
    Some(i)        => &name[..i]
  }
}

fn find_mut<'a>(elements: &'a mut [Element], id: &ObjectId) -> Option<&'a mut Element> {
  for e in elements.iter_mut() {
    if &e.id == id {
      return Some(e);
    }
    let found = match &mut e.kind {
      ElementKind::File(_)                          => None,
      ElementKind::Group(c)                         |
      ElementKind::VariantGroup(c)                  |
      ElementKind::VersionGroup { children: c, .. } => find_mut(c, id)
    };
    if found.is_some() {
      return found;
    }
  }
  None
}

/// Finds the child with `id` among `siblings`, creating it when missing.
fn child<'a, F>(siblings: &'a mut Vec<Element>, id: &ObjectId, create: F) -> &'a mut Element
  where F: FnOnce() -> Element
{
  let i = match siblings.iter().position(|e| &e.id == id) {
    Some(i) => i,
    None    => {
      siblings.push(create());
      siblings.len() - 1
    }
  };
  &mut siblings[i]
}

#[derive(Default)]
struct Tree {
  /// Top-level elements per path type, indexed by `PathType::rank`.
  roots:          [Vec<Element>; 4],
  /// Element each inserted path resolves to.
  members:        BTreeMap<FilePath, ObjectId>,
  /// Version groups with the container path they were created for.
  version_groups: Vec<(FilePath, ObjectId)>
}

impl Tree {
  fn insert(&mut self, path: &FilePath) -> Result<(), PreconditionError> {
    let components: Vec<&str> = path.components().collect();
    let mut siblings = &mut self.roots[path.path_type.rank() as usize];
    let mut dir      = FilePath::new(path.path_type, "");

    for (i, &c) in components.iter().enumerate() {
      let here = dir.join(c);
      let last = i + 1 == components.len();

      if !last && c.ends_with(".lproj") {
        let rest   = components[i + 1..].join("/");
        let region = stem(c);
        let group  = ObjectId::new("PBXVariantGroup", &dir.join(stem(&rest)).to_string());
        let name   = rest.clone();
        let parent = child(siblings, &group, || Element::variant_group(group.clone(), name, Vec::new()));
        let id     = ObjectId::new("PBXFileReference", &path.to_string());
        let ext    = extension(&rest);
        child(parent.sortable_children_mut().ok_or_else(|| nested(path))?, &id, || {
          Element::file(id.clone(), Some(region.to_string()), Some([c, "/", rest.as_str()].concat()),
                        SourceTree::Group, FileReference::last_known(file_type(ext)))
        });
        self.members.insert(path.clone(), group);
        return Ok(());
      }

      if c.ends_with(".xcdatamodeld") {
        let group = ObjectId::new("XCVersionGroup", &here.to_string());
        let model = child(siblings, &group, || Element::version_group(group.clone(), c.to_string(), Vec::new(), None));
        if let Some(version) = components.get(i + 1) {
          let id = ObjectId::new("PBXFileReference", &here.join(version).to_string());
          if model.children().iter().all(|e| e.id != id) {
            model.push(Element::file(id, None, Some(version.to_string()), SourceTree::Group,
                                     FileReference::last_known(file_type(extension(version)))));
          }
        }
        if self.version_groups.iter().all(|(_, g)| *g != group) {
          self.version_groups.push((here, group.clone()));
        }
        self.members.insert(path.clone(), group);
        return Ok(());
      }

      if last || is_opaque_bundle(c) {
        let id = ObjectId::new("PBXFileReference", &here.to_string());
        let kind = match last && path.is_folder {
          true  => "folder",
          false => file_type(extension(c))
        };
        child(siblings, &id, || {
          Element::file(id.clone(), None, Some(c.to_string()), SourceTree::Group, FileReference::last_known(kind))
        });
        self.members.insert(path.clone(), id);
        return Ok(());
      }

      let id = ObjectId::new("PBXGroup", &here.to_string());
      siblings = child(siblings, &id, || {
        Element::group(id.clone(), None, Some(c.to_string()), SourceTree::Group, Vec::new())
      }).sortable_children_mut().ok_or_else(|| nested(path))?;
      dir = here;
    }
    Ok(())
  }

  fn set_current_versions(&mut self, current: &[XCCurrentVersion], logger: &dyn Logger) {
    let selected: HashMap<(PathType, &str), &str> = current.iter()
      .map(|v| ((v.container.path_type, v.container.path.as_str()), v.version.as_str()))
      .collect();

    for (container, group) in &self.version_groups {
      let version = match selected.get(&(container.path_type, container.path.as_str())) {
        Some(v) => *v,
        None    => continue
      };
      let id   = ObjectId::new("PBXFileReference", &container.join(version).to_string());
      let root = &mut self.roots[container.path_type.rank() as usize];
      if let Some(Element { kind: ElementKind::VersionGroup { children, current_version, .. }, .. }) = find_mut(root, group) {
        match children.iter().any(|c| c.id == id) {
          true  => *current_version = Some(id),
          false => logger.warning(&format!("Version \"{}\" not found in \"{}\"", version, container))
        }
      }
    }
  }
}

fn nested(path: &FilePath) -> PreconditionError {
  PreconditionError::new(format!("Path \"{}\" is nested inside a file", path))
}

/// Variant groups are named after their base localization, or their first
/// variant when there is none.
fn name_variant_groups(elements: &mut [Element]) {
  for e in elements.iter_mut() {
    if let ElementKind::VariantGroup(children) = &e.kind {
      let base = children.iter().find(|c| c.name.as_deref() == Some("Base")).or_else(|| children.first());
      if let Some(path) = base.and_then(|c| c.path.as_deref()) {
        let name = path.splitn(2, '/').nth(1).unwrap_or(path).to_string();
        e.name = Some(name);
      }
    }
    if let Some(children) = e.sortable_children_mut() {
      name_variant_groups(children);
    }
  }
}

fn file_list<'a, I: Iterator<Item = &'a FilePath>>(paths: I, line: impl Fn(&FilePath) -> String) -> String {
  paths.map(|p| line(p) + "\n").collect()
}

/// Creates the navigator elements and the map from every known path to what
/// represents it. Top-level elements come sorted, followed by the external,
/// generated and internal groups.
pub fn create_files_and_groups(build_mode:        BuildMode,
                               consolidated:      &ConsolidatedTargets,
                               extra_files:       &BTreeSet<FilePath>,
                               xccurrentversions: &[XCCurrentVersion],
                               resolver:          &FilePathResolver,
                               logger:            &dyn Logger) -> Result<(Files, Vec<Element>), PreconditionError>
{
  let mut paths: BTreeSet<FilePath> = extra_files.clone();
  let mut stub = false;
  for target in consolidated.targets.values() {
    for t in target.targets.values() {
      paths.extend(t.inputs.all().into_iter().cloned());
      paths.extend(t.linker_inputs.dynamic_frameworks.iter()
                   .chain(&t.linker_inputs.static_frameworks)
                   .filter(|p| p.path_type != PathType::Generated)
                   .cloned());
      stub |= needs_compile_stub(&t.inputs, t.product.product_type);
    }
  }
  if stub {
    paths.insert(compile_stub());
  }

  let mut tree = Tree::default();
  for p in paths.iter().filter(|p| p.include_in_navigator && !p.path.is_empty()) {
    tree.insert(p)?;
  }
  tree.set_current_versions(xccurrentversions, logger);

  let [mut project, mut external, mut generated, mut internal] = tree.roots;
  for roots in vec!(&mut project, &mut external, &mut generated, &mut internal) {
    name_variant_groups(roots);
    sort_grouped_localized_standard(roots);
  }

  let links = resolver.links_directory();
  let mut root_elements = project;
  let synthesized = vec!(
    (external,  EXTERNAL_GROUP_NAME,                       links.join("external"),          PathType::External),
    (generated, GENERATED_GROUP_NAME,                      links.join("gen_dir"),           PathType::Generated),
    (internal,  resolver.internal_directory_name.as_str(), resolver.internal_directory(), PathType::Internal)
  );
  for (children, name, path, path_type) in synthesized {
    if children.is_empty() {
      continue;
    }
    let id = ObjectId::new("PBXGroup", &FilePath::new(path_type, "").to_string());
    root_elements.push(Element::group(id, Some(name.to_string()), Some(display(&path)), SourceTree::Group, children));
  }

  let mut names = HashMap::new();
  let mut all   = Vec::new();
  for e in &root_elements {
    e.walk(&mut all);
  }
  for e in all {
    names.insert(e.id.clone(), e.display_name().to_string());
  }

  let mut files = Files::new();
  for p in &paths {
    let file = match tree.members.get(p) {
      Some(id) => File::Reference {
        id:      id.clone(),
        name:    names.get(id).cloned().unwrap_or_default(),
        content: match p.path_type == PathType::Internal && p.path == COMPILE_STUB {
          true  => Some(String::new()),
          false => None
        }
      },
      None => File::Hidden
    };
    files.insert(p.clone(), file);
  }

  let of_type = |t: PathType| paths.iter().filter(move |p| p.path_type == t);
  files.insert(FilePath::internal(EXTERNAL_FILE_LIST), File::NonReferenced {
    content: file_list(of_type(PathType::External), |p| resolver.resolve(p))
  });
  files.insert(FilePath::internal(GENERATED_FILE_LIST), File::NonReferenced {
    content: file_list(of_type(PathType::Generated), |p| resolver.resolve(p))
  });
  if !build_mode.uses_bazel_mode_build_scripts() {
    files.insert(FilePath::internal(GENERATED_RSYNC_LIST), File::NonReferenced {
      content: file_list(of_type(PathType::Generated), |p| p.path.clone())
    });
  }

  tracing::debug!("Created {} file elements for {} paths", names.len(), paths.len());
  Ok((files, root_elements))
}
