use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::dto::path::FilePath;
use crate::platform::Platform;

/// Identifies a single build system target, ie "//app:App ios-x86_64-min11.0-applebin_ios-ST-1a2b3c".
pub type TargetID = String;

/// Build settings are forwarded as-is, only their presence matters here.
pub type BuildSettings = BTreeMap<String, serde_json::Value>;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ProductType {
  #[serde(rename = "com.apple.product-type.application")]
  Application,
  #[serde(rename = "com.apple.product-type.application.on-demand-install-capable")]
  OnDemandInstallCapableApplication,
  #[serde(rename = "com.apple.product-type.application.messages")]
  MessagesApplication,
  #[serde(rename = "com.apple.product-type.application.watchapp")]
  WatchApp,
  #[serde(rename = "com.apple.product-type.application.watchapp2")]
  Watch2App,
  #[serde(rename = "com.apple.product-type.application.watchapp2-container")]
  Watch2AppContainer,
  #[serde(rename = "com.apple.product-type.tool")]
  CommandLineTool,
  #[serde(rename = "com.apple.product-type.bundle")]
  Bundle,
  #[serde(rename = "com.apple.product-type.bundle.unit-test")]
  UnitTestBundle,
  #[serde(rename = "com.apple.product-type.bundle.ui-testing")]
  UITestBundle,
  #[serde(rename = "com.apple.product-type.framework")]
  Framework,
  #[serde(rename = "com.apple.product-type.framework.static")]
  StaticFramework,
  #[serde(rename = "com.apple.product-type.library.dynamic")]
  DynamicLibrary,
  #[serde(rename = "com.apple.product-type.library.static")]
  StaticLibrary,
  #[serde(rename = "com.apple.product-type.app-extension")]
  AppExtension,
  #[serde(rename = "com.apple.product-type.app-extension.messages")]
  MessagesExtension,
  #[serde(rename = "com.apple.product-type.tv-app-extension")]
  TVExtension,
  #[serde(rename = "com.apple.product-type.watchkit-extension")]
  WatchExtension,
  #[serde(rename = "com.apple.product-type.watchkit2-extension")]
  Watch2Extension,
  #[serde(rename = "com.apple.product-type.xpc-service")]
  XPCService
}

impl ProductType {
  pub fn identifier(self) -> &'static str {
    match self {
      Self::Application                       => "com.apple.product-type.application",
      Self::OnDemandInstallCapableApplication => "com.apple.product-type.application.on-demand-install-capable",
      Self::MessagesApplication               => "com.apple.product-type.application.messages",
      Self::WatchApp                          => "com.apple.product-type.application.watchapp",
      Self::Watch2App                         => "com.apple.product-type.application.watchapp2",
      Self::Watch2AppContainer                => "com.apple.product-type.application.watchapp2-container",
      Self::CommandLineTool                   => "com.apple.product-type.tool",
      Self::Bundle                            => "com.apple.product-type.bundle",
      Self::UnitTestBundle                    => "com.apple.product-type.bundle.unit-test",
      Self::UITestBundle                      => "com.apple.product-type.bundle.ui-testing",
      Self::Framework                         => "com.apple.product-type.framework",
      Self::StaticFramework                   => "com.apple.product-type.framework.static",
      Self::DynamicLibrary                    => "com.apple.product-type.library.dynamic",
      Self::StaticLibrary                     => "com.apple.product-type.library.static",
      Self::AppExtension                      => "com.apple.product-type.app-extension",
      Self::MessagesExtension                 => "com.apple.product-type.app-extension.messages",
      Self::TVExtension                       => "com.apple.product-type.tv-app-extension",
      Self::WatchExtension                    => "com.apple.product-type.watchkit-extension",
      Self::Watch2Extension                   => "com.apple.product-type.watchkit2-extension",
      Self::XPCService                        => "com.apple.product-type.xpc-service"
    }
  }

  /// Value of `explicitFileType` on the product's file reference.
  pub fn file_type(self) -> &'static str {
    match self {
      Self::Application                       |
      Self::OnDemandInstallCapableApplication |
      Self::MessagesApplication               |
      Self::WatchApp                          |
      Self::Watch2App                         |
      Self::Watch2AppContainer                => "wrapper.application",
      Self::CommandLineTool                   => "compiled.mach-o.executable",
      Self::Bundle                            |
      Self::UnitTestBundle                    |
      Self::UITestBundle                      => "wrapper.cfbundle",
      Self::Framework                         => "wrapper.framework",
      Self::StaticFramework                   => "wrapper.framework.static",
      Self::DynamicLibrary                    => "compiled.mach-o.dylib",
      Self::StaticLibrary                     => "archive.ar",
      Self::AppExtension                      |
      Self::MessagesExtension                 |
      Self::TVExtension                       |
      Self::WatchExtension                    |
      Self::Watch2Extension                   => "wrapper.app-extension",
      Self::XPCService                        => "wrapper.xpc-service"
    }
  }

  pub fn is_launchable(self) -> bool {
    match self {
      Self::Application                       |
      Self::OnDemandInstallCapableApplication |
      Self::MessagesApplication               |
      Self::WatchApp                          |
      Self::Watch2App                         |
      Self::Watch2AppContainer                |
      Self::CommandLineTool                   |
      Self::XPCService                        => true,
      _                                       => false
    }
  }

  pub fn is_test_bundle(self) -> bool {
    match self {
      Self::UnitTestBundle | Self::UITestBundle => true,
      _                                         => false
    }
  }

  /// Variables the launch action forwards when Bazel drives the build.
  pub fn bazel_launch_environment_variables(self) -> Option<Vec<EnvironmentVariable>> {
    match self.is_launchable() || self.is_test_bundle() {
      true  => Some(bazel_launch_variables()),
      false => None
    }
  }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EnvironmentVariable {
  pub variable: String,
  pub value:    String,
  pub enabled:  bool
}

pub fn bazel_launch_variables() -> Vec<EnvironmentVariable> {
  let var = |variable: &str, value: &str| EnvironmentVariable {
    variable: variable.to_string(),
    value:    value.to_string(),
    enabled:  true
  };
  vec!(
    var("BUILD_WORKING_DIRECTORY", "$(BUILT_PRODUCTS_DIR)"),
    var("BUILD_WORKSPACE_DIRECTORY", "$(BUILD_WORKSPACE_DIRECTORY)")
  )
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Product {
  #[serde(rename = "type")]
  pub product_type: ProductType,
  pub name:         String,
  pub path:         FilePath
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct Inputs {
  pub srcs:         BTreeSet<FilePath>,
  pub non_arc_srcs: BTreeSet<FilePath>,
  pub hdrs:         BTreeSet<FilePath>,
  pub resources:    BTreeSet<FilePath>,
  pub pch:          Option<FilePath>,
  pub entitlements: Option<FilePath>
}

impl Inputs {
  /// Every input file, sorted.
  pub fn all(&self) -> BTreeSet<&FilePath> {
    self.srcs.iter()
      .chain(&self.non_arc_srcs)
      .chain(&self.hdrs)
      .chain(&self.resources)
      .chain(&self.pch)
      .chain(&self.entitlements)
      .collect()
  }

  pub fn merge(&mut self, o: &Inputs) {
    self.srcs.extend(o.srcs.iter().cloned());
    self.non_arc_srcs.extend(o.non_arc_srcs.iter().cloned());
    self.hdrs.extend(o.hdrs.iter().cloned());
    self.resources.extend(o.resources.iter().cloned());
    if self.pch.is_none() {
      self.pch = o.pch.clone();
    }
    if self.entitlements.is_none() {
      self.entitlements = o.entitlements.clone();
    }
  }
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct LinkerInputs {
  pub dynamic_frameworks: BTreeSet<FilePath>,
  pub static_frameworks:  BTreeSet<FilePath>,
  pub static_libraries:   BTreeSet<FilePath>
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Target {
  pub label:         String,
  pub configuration: String,
  pub platform:      Platform,
  pub product:       Product,

  #[serde(default)]
  pub build_settings: BuildSettings,

  #[serde(default)]
  pub inputs: Inputs,

  #[serde(default)]
  pub linker_inputs: LinkerInputs,

  #[serde(default)]
  pub test_host: Option<TargetID>,

  #[serde(default)]
  pub resource_bundle_dependencies: BTreeSet<TargetID>,

  #[serde(default)]
  pub dependencies: BTreeSet<TargetID>
}

impl Target {
  /// The target name part of the label, ie "App" for "//app:App".
  pub fn label_name(&self) -> &str {
    match self.label.rfind(':') {
      Some(i) => &self.label[i + 1..],
      None    => self.label.rsplit('/').next().unwrap_or(&self.label)
    }
  }
}

#[cfg(test)]
impl Target {
  pub fn mock(label: &str, configuration: &str, product_type: ProductType, name: &str, path: FilePath) -> Self {
    Target {
      label:                        label.to_string(),
      configuration:                configuration.to_string(),
      platform:                     Platform::macos(),
      product:                      Product { product_type, name: name.to_string(), path },
      build_settings:               BuildSettings::new(),
      inputs:                       Inputs::default(),
      linker_inputs:                LinkerInputs::default(),
      test_host:                    None,
      resource_bundle_dependencies: BTreeSet::new(),
      dependencies:                 BTreeSet::new()
    }
  }

  pub fn with_platform(mut self, platform: Platform) -> Self {
    self.platform = platform;
    self
  }

  pub fn with_dependencies(mut self, deps: &[&str]) -> Self {
    self.dependencies = deps.iter().map(|d| d.to_string()).collect();
    self
  }

  pub fn with_srcs(mut self, srcs: &[FilePath]) -> Self {
    self.inputs.srcs = srcs.iter().cloned().collect();
    self
  }

  pub fn with_resources(mut self, resources: &[FilePath]) -> Self {
    self.inputs.resources = resources.iter().cloned().collect();
    self
  }
}
