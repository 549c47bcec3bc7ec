//! Navigator tree nodes.
//!
//! Xcode shows files through a tree of `PBXFileElement` objects:
//! - PBXFileReference  A single file, or a folder added as an opaque unit.
//! - PBXGroup          Container for other elements.
//! - PBXVariantGroup   Gathers the localized variants of a single resource.
//! - XCVersionGroup    Gathers the versions of a Core Data model.
//!
//! Variant and version groups have children but Xcode sorts them like files.
//! Folder references are the opposite and sort like groups. The rank used for
//! that is decided once, when the element is created.

use crate::pbx::id::ObjectId;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SourceTree {
  Group,
  Absolute,
  SourceRoot,
  BuiltProductsDir,
  DeveloperDir,
  SdkRoot
}

impl SourceTree {
  pub fn to_str(self) -> &'static str {
    match self {
      SourceTree::Group            => "\"<group>\"",
      SourceTree::Absolute         => "\"<absolute>\"",
      SourceTree::SourceRoot       => "SOURCE_ROOT",
      SourceTree::BuiltProductsDir => "BUILT_PRODUCTS_DIR",
      SourceTree::DeveloperDir     => "DEVELOPER_DIR",
      SourceTree::SdkRoot          => "SDKROOT"
    }
  }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FileReference {
  pub last_known_file_type: Option<String>,
  pub explicit_file_type:   Option<String>,
  pub include_in_index:     Option<bool>
}

impl FileReference {
  pub fn last_known(file_type: &str) -> Self {
    FileReference {
      last_known_file_type: Some(file_type.to_string()),
      ..Default::default()
    }
  }

  pub fn explicit(file_type: &str) -> Self {
    FileReference {
      explicit_file_type: Some(file_type.to_string()),
      include_in_index:   Some(false),
      ..Default::default()
    }
  }

  pub fn is_folder(&self) -> bool {
    self.last_known_file_type.as_deref() == Some("folder")
  }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ElementKind {
  File(FileReference),
  Group(Vec<Element>),
  VariantGroup(Vec<Element>),
  VersionGroup {
    children:           Vec<Element>,
    current_version:    Option<ObjectId>,
    version_group_type: String
  }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Element {
  pub id:          ObjectId,
  pub name:        Option<String>,
  pub path:        Option<String>,
  pub source_tree: SourceTree,
  pub kind:        ElementKind,
  rank:            i8
}

impl Element {
  fn new(id: ObjectId, name: Option<String>, path: Option<String>,
         source_tree: SourceTree, kind: ElementKind) -> Self
  {
    let rank = match &kind {
      ElementKind::Group(_)                 => -1,
      ElementKind::File(f) if f.is_folder() => -1,
      _                                     =>  0
    };
    Element { id, name, path, source_tree, kind, rank }
  }

  pub fn file(id: ObjectId, name: Option<String>, path: Option<String>,
              source_tree: SourceTree, file: FileReference) -> Self
  {
    Self::new(id, name, path, source_tree, ElementKind::File(file))
  }

  pub fn group(id: ObjectId, name: Option<String>, path: Option<String>,
               source_tree: SourceTree, children: Vec<Element>) -> Self
  {
    Self::new(id, name, path, source_tree, ElementKind::Group(children))
  }

  pub fn variant_group(id: ObjectId, name: String, children: Vec<Element>) -> Self {
    Self::new(id, Some(name), None, SourceTree::Group, ElementKind::VariantGroup(children))
  }

  pub fn version_group(id: ObjectId, path: String, children: Vec<Element>,
                       current_version: Option<ObjectId>) -> Self
  {
    Self::new(id, None, Some(path), SourceTree::Group, ElementKind::VersionGroup {
      children,
      current_version,
      version_group_type: "wrapper.xcdatamodel".to_string()
    })
  }

  /// -1 for groups and folders, 0 for everything sorted as a file.
  pub fn sort_rank(&self) -> i8 {
    self.rank
  }

  pub fn display_name(&self) -> &str {
    self.name.as_deref()
      .or_else(|| self.path.as_deref())
      .unwrap_or("")
  }

  /// The name, then the name again, then the path. Elements with an explicit
  /// name that differs from their path still order consistently against
  /// elements that only have one of them.
  pub fn name_path_sort_string(&self) -> String {
    [self.display_name(),
     self.name.as_deref().unwrap_or(""),
     self.path.as_deref().unwrap_or("")].join("\t")
  }

  pub fn isa(&self) -> &'static str {
    match &self.kind {
      ElementKind::File(_)             => "PBXFileReference",
      ElementKind::Group(_)            => "PBXGroup",
      ElementKind::VariantGroup(_)     => "PBXVariantGroup",
      ElementKind::VersionGroup { .. } => "XCVersionGroup"
    }
  }

  pub fn children(&self) -> &[Element] {
    match &self.kind {
      ElementKind::File(_)                          => &[],
      ElementKind::Group(c)                         |
      ElementKind::VariantGroup(c)                  |
      ElementKind::VersionGroup { children: c, .. } => c.as_slice()
    }
  }

  /// Children of every element that has them, files have none.
  pub fn sortable_children_mut(&mut self) -> Option<&mut Vec<Element>> {
    match &mut self.kind {
      ElementKind::Group(c)                         |
      ElementKind::VariantGroup(c)                  |
      ElementKind::VersionGroup { children: c, .. } => Some(c),
      ElementKind::File(_)                          => None
    }
  }

  pub fn push(&mut self, child: Element) {
    match &mut self.kind {
      ElementKind::Group(c)                         |
      ElementKind::VariantGroup(c)                  |
      ElementKind::VersionGroup { children: c, .. } => c.push(child),
      ElementKind::File(_)                          => unreachable!("files have no children")
    }
  }

  /// Depth-first, parents before their children.
  pub fn walk<'a>(&'a self, out: &mut Vec<&'a Element>) {
    out.push(self);
    for c in self.children() {
      c.walk(out);
    }
  }

  pub fn find(&self, id: &ObjectId) -> Option<&Element> {
    if &self.id == id {
      return Some(self);
    }
    self.children().iter().find_map(|c| c.find(id))
  }
}
