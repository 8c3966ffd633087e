//! EaseCI core library: project/pipeline registry.
//!
//! - [`types`]: entities, ids and the [`RegistryFile`] aggregate
//! - [`error`]: [`RegistryError`]
//! - [`store`]: locking and the persisted JSON document
//! - [`registry`]: the [`Registry`] facade and its operations
//! - [`paths`]: workspace file layout

pub mod error;
pub mod paths;
pub mod registry;
pub mod store;
pub mod types;

pub use error::{Entity, Reason, RegistryError};
pub use registry::Registry;
pub use types::{
    GroupId, NewProject, NewProjectGroup, PipelineId, PipelineMetadata, PipelinePointer,
    PipelinePointerId, Project, ProjectGroup, ProjectId, RegistryFile, SECURED_GROUP_ID,
    SECURED_NAME, SECURED_PROJECT_ID,
};
