//! Pipeline pointer operations.
//!
//! A pipeline pointer is created once the pipeline-definition loader has
//! parsed a definition; its [`PipelineMetadata`] carries everything the
//! pointer stores.

use crate::error::{Entity, RegistryError};
use crate::types::{
    PipelineMetadata, PipelinePointer, PipelinePointerId, ProjectId, RegistryFile,
};

use super::Registry;

impl Registry {
    /// Appends a pointer to `metadata.project_id`.
    ///
    /// Checked in this order: the project exists (`NotFound`), the pipeline
    /// id is new to the whole registry (`DuplicateId`), the name is new to
    /// the project (`NameConflict`).
    pub fn create_pipeline_pointer(
        &self,
        metadata: PipelineMetadata,
    ) -> Result<PipelinePointer, RegistryError> {
        let project_id = metadata.project_id;
        let pointer = self.store.with_exclusive_access(|registry| {
            if registry.project(project_id).is_none() {
                return Err(RegistryError::not_found(Entity::Project, project_id));
            }
            if registry.contains_pipeline(&metadata.pipeline_id) {
                return Err(RegistryError::DuplicateId {
                    pipeline_id: metadata.pipeline_id,
                });
            }
            let project = registry
                .project_mut(project_id)
                .ok_or_else(|| RegistryError::not_found(Entity::Project, project_id))?;
            if project.has_pipeline_named(&metadata.name) {
                return Err(RegistryError::name_conflict(Entity::PipelinePointer, metadata.name));
            }

            let pointer = PipelinePointer {
                project_id,
                pipeline_pointer_id: PipelinePointerId(0),
                pipeline_id: metadata.pipeline_id,
                name: metadata.name,
                easefile_path: metadata.easefile_path,
                pipeline_file_path: metadata.pipeline_file_path,
                tag: metadata.tag,
                description: metadata.description,
                created_date: metadata.created_date,
            };
            let id = project.adopt_pointer(pointer).ok_or(RegistryError::IdsExhausted {
                entity: Entity::PipelinePointer,
            })?;
            project
                .pipeline(id)
                .cloned()
                .ok_or_else(|| RegistryError::not_found(Entity::PipelinePointer, id))
        })?;
        tracing::info!(
            project_id = %project_id,
            pointer_id = %pointer.pipeline_pointer_id,
            pipeline_id = %pointer.pipeline_id,
            "pipeline pointer created"
        );
        Ok(pointer)
    }

    /// Removes a pointer from its project and returns it.
    pub fn delete_pipeline_pointer(
        &self,
        project_id: ProjectId,
        pointer_id: PipelinePointerId,
    ) -> Result<PipelinePointer, RegistryError> {
        let removed = self.store.with_exclusive_access(|registry| {
            let project = registry
                .project_mut(project_id)
                .ok_or_else(|| RegistryError::not_found(Entity::Project, project_id))?;
            project
                .pipelines
                .shift_remove(&pointer_id)
                .ok_or_else(|| RegistryError::not_found(Entity::PipelinePointer, pointer_id))
        })?;
        tracing::info!(
            project_id = %project_id,
            pointer_id = %pointer_id,
            pipeline_id = %removed.pipeline_id,
            "pipeline pointer removed"
        );
        Ok(removed)
    }

    /// Renames a pointer. Returns `NameConflict` if another pointer of the
    /// same project already uses `name`.
    pub fn rename_pipeline_pointer(
        &self,
        project_id: ProjectId,
        pointer_id: PipelinePointerId,
        name: impl Into<String>,
    ) -> Result<PipelinePointer, RegistryError> {
        let name = name.into();
        self.edit_pointer(
            project_id,
            pointer_id,
            |registry| {
                let taken = registry.project(project_id).is_some_and(|project| {
                    project
                        .pipelines
                        .values()
                        .any(|p| p.pipeline_pointer_id != pointer_id && p.name == name)
                });
                if taken {
                    return Err(RegistryError::name_conflict(
                        Entity::PipelinePointer,
                        name.clone(),
                    ));
                }
                Ok(())
            },
            |pointer| pointer.name = name.clone(),
        )
    }

    pub fn change_pipeline_pointer_tag(
        &self,
        project_id: ProjectId,
        pointer_id: PipelinePointerId,
        tag: impl Into<String>,
    ) -> Result<PipelinePointer, RegistryError> {
        let tag = tag.into();
        self.edit_pointer(project_id, pointer_id, |_| Ok(()), |pointer| pointer.tag = Some(tag))
    }

    pub fn change_pipeline_pointer_description(
        &self,
        project_id: ProjectId,
        pointer_id: PipelinePointerId,
        description: impl Into<String>,
    ) -> Result<PipelinePointer, RegistryError> {
        let description = description.into();
        self.edit_pointer(
            project_id,
            pointer_id,
            |_| Ok(()),
            |pointer| pointer.description = Some(description),
        )
    }

    fn edit_pointer<C, A>(
        &self,
        project_id: ProjectId,
        pointer_id: PipelinePointerId,
        check: C,
        apply: A,
    ) -> Result<PipelinePointer, RegistryError>
    where
        C: FnOnce(&RegistryFile) -> Result<(), RegistryError>,
        A: FnOnce(&mut PipelinePointer),
    {
        let pointer = self.store.with_exclusive_access(|registry| {
            let project = registry
                .project(project_id)
                .ok_or_else(|| RegistryError::not_found(Entity::Project, project_id))?;
            if project.pipeline(pointer_id).is_none() {
                return Err(RegistryError::not_found(Entity::PipelinePointer, pointer_id));
            }
            check(registry)?;
            let pointer = registry
                .project_mut(project_id)
                .and_then(|project| project.pipelines.get_mut(&pointer_id))
                .ok_or_else(|| RegistryError::not_found(Entity::PipelinePointer, pointer_id))?;
            apply(pointer);
            Ok(pointer.clone())
        })?;
        tracing::info!(
            project_id = %project_id,
            pointer_id = %pointer_id,
            "pipeline pointer modified"
        );
        Ok(pointer)
    }
}
