//! The `.xcodeproj` bundle and how it lands on disk.
//!
//! Layout of the bundle:
//! - project.pbxproj                     The object graph.
//! - xcshareddata/xcschemes/*.xcscheme   One scheme per target.
//! - <internal>/                         Generated support files.
//! - <internal>/bazel/                   Integration scripts, Bazel mode only.
//!
//! Files are only rewritten when their content changes, Xcode reloads the
//! project whenever it sees one of them touched.

pub mod pbxproj;
pub mod xcscheme;

use std::collections::BTreeSet;
use std::fs::{create_dir_all, read, read_dir, remove_file};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::dto::{BuildMode, PathType};
use crate::error::Result;
use crate::gen::Files;
use crate::pbx::PbxProj;
use crate::scheme::XCSharedData;

const SCHEMES_DIRECTORY:     &str = "xcshareddata/xcschemes";
const SCHEME_EXTENSION:      &str = "xcscheme";
const INTEGRATION_DIRECTORY: &str = "bazel";

#[derive(Clone, Debug, PartialEq)]
pub struct XcodeProj {
  pub pbx_proj:    PbxProj,
  pub shared_data: XCSharedData
}

/// Writes `content` unless the file already holds exactly that. Returns
/// whether anything was written.
fn write_if_changed(path: &Path, content: &[u8]) -> Result<bool> {
  if let Ok(existing) = read(path) {
    if existing == content {
      return Ok(false);
    }
  }
  if let Some(parent) = path.parent() {
    create_dir_all(parent)?;
  }
  std::fs::write(path, content)?;
  debug!(path = %path.display(), "wrote");
  Ok(true)
}

fn write_schemes(shared_data: &XCSharedData, output_path: &Path) -> Result<()> {
  let dir = output_path.join(SCHEMES_DIRECTORY);
  create_dir_all(&dir)?;

  let mut written = BTreeSet::new();
  for scheme in &shared_data.schemes {
    let path = dir.join(format!("{}.{}", scheme.name, SCHEME_EXTENSION));
    write_if_changed(&path, xcscheme::encode(scheme).as_bytes())?;
    written.insert(path);
  }

  for entry in read_dir(&dir)? {
    let path = entry?.path();
    let stale = path.extension().map_or(false, |e| e == SCHEME_EXTENSION) && !written.contains(&path);
    if stale {
      remove_file(&path)?;
      debug!(path = %path.display(), "removed stale scheme");
    }
  }
  Ok(())
}

fn write_internal_files(files: &Files, internal_directory: &Path) -> Result<()> {
  for (path, file) in files {
    if path.path_type != PathType::Internal {
      continue;
    }
    if let Some(content) = file.content() {
      write_if_changed(&internal_directory.join(&path.path), content.as_bytes())?;
    }
  }
  Ok(())
}

/// Mirrors every file under `src` into `dst`.
fn copy_directory(src: &Path, dst: &Path) -> Result<()> {
  let pattern = src.join("**").join("*");
  for m in glob::glob(&pattern.to_string_lossy())? {
    let path = m.map_err(glob::GlobError::into_error)?;
    if path.is_dir() {
      continue;
    }
    let relative = match path.strip_prefix(src) {
      Ok(r)  => PathBuf::from(r),
      Err(_) => continue
    };
    write_if_changed(&dst.join(relative), &read(&path)?)?;
  }
  Ok(())
}

/// Writes the whole bundle to `output_path`.
pub fn write(xcodeproj:                   &XcodeProj,
             build_mode:                  BuildMode,
             files:                       &Files,
             internal_directory_name:     &str,
             bazel_integration_directory: &Path,
             output_path:                 &Path) -> Result<()>
{
  create_dir_all(output_path)?;

  let mut pbxproj = Vec::new();
  pbxproj::encode(&xcodeproj.pbx_proj, &mut pbxproj)?;
  write_if_changed(&output_path.join("project.pbxproj"), &pbxproj)?;

  write_schemes(&xcodeproj.shared_data, output_path)?;

  let internal_directory = output_path.join(internal_directory_name);
  write_internal_files(files, &internal_directory)?;
  if build_mode.uses_bazel_mode_build_scripts() {
    copy_directory(bazel_integration_directory, &internal_directory.join(INTEGRATION_DIRECTORY))?;
  }
  Ok(())
}
