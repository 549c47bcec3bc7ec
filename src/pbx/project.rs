use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{PreconditionError, precondition};
use crate::pbx::element::Element;
use crate::pbx::id::ObjectId;
use crate::pbx::target::{ConfigurationList, PbxTarget};

pub const COMPATIBILITY_VERSION: &str = "Xcode 13.0";
pub const OBJECT_VERSION:        u32  = 55;

/// The PBXProject root object.
#[derive(Clone, Debug, PartialEq)]
pub struct PbxProject {
  pub id:                    ObjectId,
  pub name:                  String,
  pub configuration_list:    ConfigurationList,
  pub compatibility_version: String,
  pub development_region:    String,
  pub project_dir_path:      String,
  pub attributes:            BTreeMap<String, Value>,
  pub main_group:            Element,
  pub product_ref_group:     Option<ObjectId>,
  pub targets:               Vec<PbxTarget>
}

/// The object graph of a project file. Targets are only attached to the root
/// object once every stage is done with them.
#[derive(Clone, Debug, PartialEq)]
pub struct PbxProj {
  pub object_version: u32,
  pub root_object:    Option<PbxProject>
}

impl PbxProj {
  pub fn new(root: PbxProject) -> Self {
    PbxProj {
      object_version: OBJECT_VERSION,
      root_object:    Some(root)
    }
  }

  pub fn root(&self) -> Result<&PbxProject, PreconditionError> {
    match &self.root_object {
      Some(r) => Ok(r),
      None    => precondition("`root_object` not set on `pbx_proj`")
    }
  }

  pub fn root_mut(&mut self) -> Result<&mut PbxProject, PreconditionError> {
    match &mut self.root_object {
      Some(r) => Ok(r),
      None    => precondition("`root_object` not set on `pbx_proj`")
    }
  }
}
