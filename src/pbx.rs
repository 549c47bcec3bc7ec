//! In-memory model of the Xcode project object graph.
//!
//! Only the objects the generator emits are modeled. Each object carries its
//! own identifier, references between objects are made through those.

pub mod element;
pub mod id;
pub mod project;
pub mod target;

pub use element::{Element, ElementKind, FileReference, SourceTree};
pub use id::ObjectId;
pub use project::{PbxProj, PbxProject};
pub use target::{BuildFile, BuildPhase, BuildPhaseKind, Configuration, ConfigurationList,
                 PbxTarget, ProductReference, TargetDependency, TargetKind};
