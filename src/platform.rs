use serde::Deserialize;
use std::fmt;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Os {
  #[serde(rename = "macOS")]   MacOS,
  #[serde(rename = "iOS")]     IOS,
  #[serde(rename = "tvOS")]    TVOS,
  #[serde(rename = "watchOS")] WatchOS
}

impl Os {
  pub fn to_str(self) -> &'static str {
    match self {
      Os::MacOS   => "macOS",
      Os::IOS     => "iOS",
      Os::TVOS    => "tvOS",
      Os::WatchOS => "watchOS"
    }
  }

  /// The SDKROOT value and the deployment target setting for this OS.
  pub fn sdk_info(self) -> (&'static str, &'static str) {
    match self {
      Os::MacOS   => ("macosx",    "MACOSX_DEPLOYMENT_TARGET"),
      Os::IOS     => ("iphoneos",  "IPHONEOS_DEPLOYMENT_TARGET"),
      Os::TVOS    => ("appletvos", "TVOS_DEPLOYMENT_TARGET"),
      Os::WatchOS => ("watchos",   "WATCHOS_DEPLOYMENT_TARGET")
    }
  }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
  Device,
  Simulator
}

#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[serde(deny_unknown_fields)]
pub struct Platform {
  /// The SDK variant name, ie "iphonesimulator".
  pub name: String,
  pub os:   Os,
  pub arch: String,

  pub minimum_os_version: String,

  #[serde(default)]
  pub environment: Option<Environment>
}

impl Platform {
  pub fn macos() -> Self {
    Platform {
      name:               "macosx".to_string(),
      os:                 Os::MacOS,
      arch:               "arm64".to_string(),
      minimum_os_version: "11.0".to_string(),
      environment:        None
    }
  }

  pub fn device() -> Self {
    Platform {
      name:               "iphoneos".to_string(),
      os:                 Os::IOS,
      arch:               "arm64".to_string(),
      minimum_os_version: "11.0".to_string(),
      environment:        Some(Environment::Device)
    }
  }

  pub fn simulator() -> Self {
    Platform {
      name:               "iphonesimulator".to_string(),
      os:                 Os::IOS,
      arch:               "x86_64".to_string(),
      minimum_os_version: "11.0".to_string(),
      environment:        Some(Environment::Simulator)
    }
  }

  pub fn class(&self) -> PlatformClass {
    match (self.os, self.environment) {
      (Os::MacOS, _)                    => PlatformClass::MacOS,
      (_, Some(Environment::Simulator)) => PlatformClass::Simulator,
      _                                 => PlatformClass::Device
    }
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self.environment {
      Some(Environment::Simulator) => write!(f, "{} Simulator", self.os.to_str()),
      _                            => f.write_str(self.os.to_str())
    }
  }
}

/// Coarse platform buckets used to pick one canonical product path when a
/// consolidated target builds for several platforms.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[serde(rename_all = "lowercase")]
pub enum PlatformClass {
  Simulator,
  Device,
  MacOS
}

/// Ranks platform classes from lowest to highest priority.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Precedence(pub Vec<PlatformClass>);

impl Default for Precedence {
  fn default() -> Self {
    Precedence(vec!(PlatformClass::Simulator, PlatformClass::Device, PlatformClass::MacOS))
  }
}

impl Precedence {
  /// Unlisted classes rank below every listed one.
  pub fn rank(&self, class: PlatformClass) -> usize {
    self.0.iter().position(|c| *c == class).map(|i| i + 1).unwrap_or(0)
  }
}
