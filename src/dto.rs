pub mod build_mode;
pub mod path;
pub mod project;
pub mod target;

pub use build_mode::BuildMode;
pub use path::{FilePath, PathType};
pub use project::{Project, XCCurrentVersion};
pub use target::{BuildSettings, EnvironmentVariable, Inputs, LinkerInputs, Product, ProductType, Target, TargetID};
