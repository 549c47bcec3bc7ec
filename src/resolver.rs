use std::path::{Path, PathBuf};

use crate::dto::{FilePath, PathType};

/// Maps `FilePath`s to the strings the project file uses for them.
#[derive(Clone, Debug, PartialEq)]
pub struct FilePathResolver {
  pub internal_directory_name: String,
  /// Path of the `.xcodeproj` bundle, relative to the workspace root.
  pub workspace_output_path:   PathBuf
}

impl FilePathResolver {
  pub fn new<P: Into<PathBuf>>(internal_directory_name: &str, workspace_output_path: P) -> Self {
    FilePathResolver {
      internal_directory_name: internal_directory_name.to_string(),
      workspace_output_path:   workspace_output_path.into()
    }
  }

  /// What schemes use to refer to the project holding their targets.
  pub fn container_reference(&self) -> String {
    ["container:", &display(&self.workspace_output_path)].concat()
  }

  /// The internal directory, relative to the workspace root.
  pub fn internal_directory(&self) -> PathBuf {
    self.workspace_output_path.join(&self.internal_directory_name)
  }

  /// Symlinks to the external repositories and the output tree live here.
  pub fn links_directory(&self) -> PathBuf {
    self.internal_directory().join("links")
  }

  /// The path as seen from a build setting or a script.
  pub fn resolve(&self, path: &FilePath) -> String {
    let root = match path.path_type {
      PathType::Project   => "$(PROJECT_DIR)",
      PathType::External  => "$(BAZEL_EXTERNAL)",
      PathType::Generated => "$(BAZEL_OUT)",
      PathType::Internal  => "$(INTERNAL_DIR)"
    };
    match path.path.is_empty() {
      true  => root.to_string(),
      false => [root, "/", &path.path].concat()
    }
  }
}

pub fn display(path: &Path) -> String {
  path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn resolves_every_path_type() {
    let r = FilePathResolver::new("rules_xcodeproj", "examples/foo/Foo.xcodeproj");
    assert_eq!(r.container_reference(), "container:examples/foo/Foo.xcodeproj");
    assert_eq!(display(&r.links_directory()), "examples/foo/Foo.xcodeproj/rules_xcodeproj/links");

    assert_eq!(r.resolve(&FilePath::project("a/b.c")), "$(PROJECT_DIR)/a/b.c");
    assert_eq!(r.resolve(&FilePath::external("repo/a.swift")), "$(BAZEL_EXTERNAL)/repo/a.swift");
    assert_eq!(r.resolve(&FilePath::generated("v/a.txt")), "$(BAZEL_OUT)/v/a.txt");
    assert_eq!(r.resolve(&FilePath::internal("CompileStub.m")), "$(INTERNAL_DIR)/CompileStub.m");
    assert_eq!(r.resolve(&FilePath::internal("")), "$(INTERNAL_DIR)");
  }
}
