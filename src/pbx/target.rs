use serde_json::Value;
use std::collections::BTreeMap;

use crate::dto::{EnvironmentVariable, ProductType};
use crate::pbx::id::ObjectId;

pub const DEFAULT_CONFIGURATION_NAME: &str = "Debug";

#[derive(Clone, Debug, PartialEq)]
pub struct Configuration {
  pub id:             ObjectId,
  pub name:           String,
  pub build_settings: BTreeMap<String, Value>
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConfigurationList {
  pub id:                         ObjectId,
  pub configurations:             Vec<Configuration>,
  pub default_configuration_name: String
}

impl ConfigurationList {
  pub fn new(owner: &str, settings: BTreeMap<String, Value>) -> Self {
    let name = DEFAULT_CONFIGURATION_NAME.to_string();
    ConfigurationList {
      id:                         ObjectId::new("XCConfigurationList", owner),
      configurations:             vec!(Configuration {
        id:             ObjectId::new("XCBuildConfiguration", &[owner, "/", &name].concat()),
        name:           name.clone(),
        build_settings: settings
      }),
      default_configuration_name: name
    }
  }

  pub fn empty(owner: &str) -> Self {
    ConfigurationList {
      id:                         ObjectId::new("XCConfigurationList", owner),
      configurations:             Vec::new(),
      default_configuration_name: DEFAULT_CONFIGURATION_NAME.to_string()
    }
  }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BuildFile {
  pub id:       ObjectId,
  pub file_ref: ObjectId,
  pub name:     String,
  pub settings: Option<BTreeMap<String, String>>
}

#[derive(Clone, Debug, PartialEq)]
pub enum BuildPhaseKind {
  Sources,
  Frameworks,
  Resources,
  Headers,
  ShellScript {
    name:                   String,
    script:                 String,
    input_paths:            Vec<String>,
    output_paths:           Vec<String>,
    input_file_list_paths:  Vec<String>,
    output_file_list_paths: Vec<String>
  }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BuildPhase {
  pub id:    ObjectId,
  pub kind:  BuildPhaseKind,
  pub files: Vec<BuildFile>
}

impl BuildPhase {
  pub fn isa(&self) -> &'static str {
    match self.kind {
      BuildPhaseKind::Sources            => "PBXSourcesBuildPhase",
      BuildPhaseKind::Frameworks         => "PBXFrameworksBuildPhase",
      BuildPhaseKind::Resources          => "PBXResourcesBuildPhase",
      BuildPhaseKind::Headers            => "PBXHeadersBuildPhase",
      BuildPhaseKind::ShellScript { .. } => "PBXShellScriptBuildPhase"
    }
  }

  pub fn display_name(&self) -> &str {
    match &self.kind {
      BuildPhaseKind::Sources                  => "Sources",
      BuildPhaseKind::Frameworks               => "Frameworks",
      BuildPhaseKind::Resources                => "Resources",
      BuildPhaseKind::Headers                  => "Headers",
      BuildPhaseKind::ShellScript { name, .. } => name
    }
  }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProductReference {
  pub id:   ObjectId,
  /// File name of the product, ie "App.app".
  pub name: String
}

#[derive(Clone, Debug, PartialEq)]
pub enum TargetKind {
  /// A target Xcode knows how to build by itself.
  Native {
    product_type: ProductType,
    product_name: String,
    product:      Option<ProductReference>
  },
  /// A target whose work is entirely done by its build phases.
  Aggregate
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TargetDependency {
  pub id:          ObjectId,
  pub proxy_id:    ObjectId,
  pub target:      ObjectId,
  pub target_name: String
}

#[derive(Clone, Debug, PartialEq)]
pub struct PbxTarget {
  pub id:                 ObjectId,
  pub name:               String,
  pub kind:               TargetKind,
  pub build_phases:       Vec<BuildPhase>,
  pub configuration_list: ConfigurationList,
  pub dependencies:       Vec<TargetDependency>
}

impl PbxTarget {
  pub fn isa(&self) -> &'static str {
    match self.kind {
      TargetKind::Native { .. } => "PBXNativeTarget",
      TargetKind::Aggregate     => "PBXAggregateTarget"
    }
  }

  pub fn is_native(&self) -> bool {
    match self.kind {
      TargetKind::Native { .. } => true,
      TargetKind::Aggregate     => false
    }
  }

  pub fn product_type(&self) -> Option<ProductType> {
    match self.kind {
      TargetKind::Native { product_type, .. } => Some(product_type),
      TargetKind::Aggregate                   => None
    }
  }

  pub fn is_testable(&self) -> bool {
    self.product_type().map_or(false, ProductType::is_test_bundle)
  }

  pub fn is_launchable(&self) -> bool {
    self.product_type().map_or(false, ProductType::is_launchable)
  }

  pub fn default_build_configuration_name(&self) -> &str {
    &self.configuration_list.default_configuration_name
  }

  /// Scheme file names can't contain path separators.
  pub fn scheme_name(&self) -> String {
    self.name.replace('/', "_")
  }

  pub fn launch_environment_variables(&self) -> Option<Vec<EnvironmentVariable>> {
    self.product_type().and_then(ProductType::bazel_launch_environment_variables)
  }

  /// The name a scheme refers to this target by. Native targets are referred
  /// to by their product, which they must therefore have.
  pub fn buildable_name(&self) -> Option<&str> {
    match &self.kind {
      TargetKind::Native { product, .. } => product.as_ref().map(|p| p.name.as_str()),
      TargetKind::Aggregate              => Some(&self.name)
    }
  }

  pub fn add_dependency(&mut self, target: &PbxTarget) {
    if self.dependencies.iter().any(|d| d.target == target.id) {
      return;
    }
    let identity = [self.id.as_str(), "->", target.id.as_str()].concat();
    self.dependencies.push(TargetDependency {
      id:          ObjectId::new("PBXTargetDependency", &identity),
      proxy_id:    ObjectId::new("PBXContainerItemProxy", &identity),
      target:      target.id.clone(),
      target_name: target.name.clone()
    });
  }
}

#[cfg(test)]
impl PbxTarget {
  pub fn mock_native(name: &str, product_type: ProductType, product: Option<&str>) -> Self {
    PbxTarget {
      id:                 ObjectId::new("PBXNativeTarget", name),
      name:               name.to_string(),
      kind:               TargetKind::Native {
        product_type,
        product_name: name.to_string(),
        product:      product.map(|p| ProductReference {
          id:   ObjectId::new("PBXFileReference", p),
          name: p.to_string()
        })
      },
      build_phases:       Vec::new(),
      configuration_list: ConfigurationList::new(name, BTreeMap::new()),
      dependencies:       Vec::new()
    }
  }

  pub fn mock_aggregate(name: &str) -> Self {
    PbxTarget {
      id:                 ObjectId::new("PBXAggregateTarget", name),
      name:               name.to_string(),
      kind:               TargetKind::Aggregate,
      build_phases:       Vec::new(),
      configuration_list: ConfigurationList::new(name, BTreeMap::new()),
      dependencies:       Vec::new()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn trait_queries() {
    let test = PbxTarget::mock_native("B 2", ProductType::UnitTestBundle, Some("B.xctest"));
    assert!(test.is_testable());
    assert!(!test.is_launchable());
    assert!(test.is_native());
    assert_eq!(test.buildable_name(), Some("B.xctest"));
    assert_eq!(test.default_build_configuration_name(), "Debug");

    let agg = PbxTarget::mock_aggregate("BazelDependencies");
    assert!(!agg.is_native());
    assert!(!agg.is_testable());
    assert_eq!(agg.buildable_name(), Some("BazelDependencies"));
    assert!(agg.launch_environment_variables().is_none());
  }

  #[test]
  fn scheme_names_replace_slashes() {
    let t = PbxTarget::mock_native("a/b (c)", ProductType::Bundle, None);
    assert_eq!(t.scheme_name(), "a_b (c)");
    assert_eq!(t.buildable_name(), None);
  }

  #[test]
  fn dependencies_are_not_duplicated() {
    let mut a = PbxTarget::mock_native("A", ProductType::Application, Some("A.app"));
    let b     = PbxTarget::mock_native("B", ProductType::StaticLibrary, Some("libB.a"));
    a.add_dependency(&b);
    a.add_dependency(&b);
    assert_eq!(a.dependencies.len(), 1);
    assert_eq!(a.dependencies[0].target_name, "B");
  }
}
