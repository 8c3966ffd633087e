//! Registry facade.
//!
//! A [`Registry`] is constructed once by whoever owns the process (server
//! start-up, CLI `main`, a test) and handed to callers by reference. There is
//! no global instance.
//!
//! # API pattern
//!
//! Every constructor has two forms:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! Engine operations live in three submodules, one per capability group:
//! `groups`, `projects` and `pointers`.

use std::path::{Path, PathBuf};

use crate::error::RegistryError;
use crate::paths::{self, projects_structure_path};
use crate::store::RegistryStore;
use crate::types::{
    GroupId, PipelinePointer, PipelinePointerId, Project, ProjectGroup, ProjectId, RegistryFile,
};

mod groups;
mod pointers;
mod projects;

/// Handle to the project/pipeline registry.
#[derive(Debug)]
pub struct Registry {
    store: RegistryStore,
}

impl Registry {
    /// Opens the registry stored under `<home>/.easeci/workspace/`.
    ///
    /// The document is read (or seeded) immediately, so a corrupted file is
    /// reported here rather than on the first operation.
    pub fn open_at(home: &Path) -> Result<Self, RegistryError> {
        Self::from_path(projects_structure_path(home))
    }

    /// `open_at` convenience wrapper.
    pub fn open() -> Result<Self, RegistryError> {
        Self::open_at(&paths::home()?)
    }

    /// Opens the registry backed by the document at `path`.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let store = RegistryStore::at(path);
        store.read(|_| ())?;
        Ok(Self { store })
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Drops the in-memory aggregate and reloads it from disk, seeding the
    /// initial state again if the document was removed.
    pub fn reset(&self) -> Result<(), RegistryError> {
        self.store.reset();
        self.store.read(|_| ())
    }

    /// A consistent copy of the whole registry.
    pub fn snapshot(&self) -> Result<RegistryFile, RegistryError> {
        self.store.load()
    }

    pub fn project_group(&self, id: GroupId) -> Result<Option<ProjectGroup>, RegistryError> {
        self.store.read(|registry| registry.group(id).cloned())
    }

    pub fn project(&self, id: ProjectId) -> Result<Option<Project>, RegistryError> {
        self.store.read(|registry| registry.project(id).cloned())
    }

    pub fn pipeline_pointer(
        &self,
        project_id: ProjectId,
        pointer_id: PipelinePointerId,
    ) -> Result<Option<PipelinePointer>, RegistryError> {
        self.store.read(|registry| {
            registry
                .project(project_id)
                .and_then(|project| project.pipeline(pointer_id))
                .cloned()
        })
    }
}
