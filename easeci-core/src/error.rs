//! Error types for easeci-core.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::PipelineId;

/// Which kind of registry entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    ProjectGroup,
    Project,
    PipelinePointer,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::ProjectGroup => write!(f, "project group"),
            Entity::Project => write!(f, "project"),
            Entity::PipelinePointer => write!(f, "pipeline pointer"),
        }
    }
}

/// Closed set of rule violations an engine operation can report.
///
/// Every one of these is raised before the aggregate is touched, so a caller
/// can correct its input and retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    NotFound,
    NameConflict,
    DuplicateId,
    SecuredEntity,
}

/// All errors that can arise from registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A referenced group, project or pointer id does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: u64 },

    /// A name uniqueness rule would be broken.
    #[error("{entity} named '{name}' already exists")]
    NameConflict { entity: Entity, name: String },

    /// The pipeline id is already referenced somewhere in the registry.
    #[error("pipeline {pipeline_id} is already registered")]
    DuplicateId { pipeline_id: PipelineId },

    /// Attempted removal or rename of a reserved `other` entity.
    #[error("{entity} {id} is secured and cannot be removed or renamed")]
    SecuredEntity { entity: Entity, id: u64 },

    /// No id is left to assign; the highest id in use is `u64::MAX`.
    #[error("no {entity} id left to assign")]
    IdsExhausted { entity: Entity },

    /// The persisted document exists but is not a valid registry.
    #[error("projects structure at {path} is corrupted: {source}")]
    StorageCorruption {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// I/O failure while reading or writing the persisted document.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error (write path).
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// `dirs::home_dir()` returned `None`; cannot locate `~/.easeci/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}

impl RegistryError {
    /// The domain reason code, or `None` for storage and environment failures.
    pub fn reason(&self) -> Option<Reason> {
        match self {
            RegistryError::NotFound { .. } => Some(Reason::NotFound),
            RegistryError::NameConflict { .. } => Some(Reason::NameConflict),
            RegistryError::DuplicateId { .. } => Some(Reason::DuplicateId),
            RegistryError::SecuredEntity { .. } => Some(Reason::SecuredEntity),
            RegistryError::StorageCorruption { .. }
            | RegistryError::IdsExhausted { .. }
            | RegistryError::Io { .. }
            | RegistryError::Json(_)
            | RegistryError::HomeNotFound => None,
        }
    }

    pub(crate) fn not_found(entity: Entity, id: impl Into<u64>) -> Self {
        RegistryError::NotFound { entity, id: id.into() }
    }

    pub(crate) fn name_conflict(entity: Entity, name: impl Into<String>) -> Self {
        RegistryError::NameConflict { entity, name: name.into() }
    }
}

/// Structural rule broken by a deserialized document.
///
/// Surfaced to callers wrapped in [`RegistryError::StorageCorruption`].
#[derive(Debug, Error)]
pub enum InvariantViolation {
    #[error("secured project group 0 is missing")]
    MissingSecuredGroup,

    #[error("secured project 0 is missing from project group 0")]
    MissingSecuredProject,

    #[error("secured {entity} 0 is named '{name}' instead of 'other'")]
    SecuredNameChanged { entity: Entity, name: String },

    #[error("secured project 0 is not the first project of project group 0")]
    SecuredProjectNotFirst,

    #[error("pipeline pointer ids of project {0} are exhausted")]
    PointerIdsExhausted(u64),

    #[error("duplicate project group name '{0}'")]
    DuplicateGroupName(String),

    #[error("project {0} appears in more than one group")]
    DuplicateProjectId(u64),

    #[error("pipeline {0} is referenced more than once")]
    DuplicatePipelineId(PipelineId),

    #[error("pipeline pointer {pointer} claims project {claimed} but lives in project {actual}")]
    DanglingPointer { pointer: u64, claimed: u64, actual: u64 },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RegistryError {
    RegistryError::Io {
        path: path.into(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_carry_reason() {
        let err = RegistryError::not_found(Entity::Project, 7u64);
        assert_eq!(err.reason(), Some(Reason::NotFound));
        assert_eq!(err.to_string(), "project 7 not found");

        let err = RegistryError::name_conflict(Entity::ProjectGroup, "team-a");
        assert_eq!(err.reason(), Some(Reason::NameConflict));
        assert!(err.to_string().contains("'team-a'"));
    }

    #[test]
    fn storage_errors_have_no_reason() {
        assert_eq!(RegistryError::HomeNotFound.reason(), None);
        assert!(RegistryError::HomeNotFound.to_string().contains("home directory"));

        let err = RegistryError::IdsExhausted { entity: Entity::Project };
        assert_eq!(err.reason(), None);
        assert_eq!(err.to_string(), "no project id left to assign");
    }
}
