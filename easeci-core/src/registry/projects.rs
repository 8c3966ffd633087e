//! Project operations.

use crate::error::{Entity, RegistryError};
use crate::types::{
    GroupId, NewProject, Project, ProjectId, RegistryFile, SECURED_NAME, SECURED_PROJECT_ID,
};

use super::Registry;

impl Registry {
    /// Creates an empty project at the end of `request.group_id`.
    ///
    /// The id is the number of projects in the whole registry. Names only
    /// have to be unique among the projects of the same group.
    pub fn create_project(&self, request: NewProject) -> Result<Project, RegistryError> {
        let group_id = request.group_id;
        let project = self.store.with_exclusive_access(|registry| {
            let group = registry
                .group(group_id)
                .ok_or_else(|| RegistryError::not_found(Entity::ProjectGroup, group_id))?;
            if group.has_project_named(&request.name) {
                return Err(RegistryError::name_conflict(Entity::Project, request.name));
            }

            let id = registry
                .next_project_id()
                .ok_or(RegistryError::IdsExhausted { entity: Entity::Project })?;
            let project = Project::new(
                id,
                request.name,
                request.tag,
                request.description,
            );
            if !registry.insert_project(group_id, project.clone()) {
                return Err(RegistryError::not_found(Entity::ProjectGroup, group_id));
            }
            Ok(project)
        })?;
        tracing::info!(
            group_id = %group_id,
            project_id = %project.id,
            name = %project.name,
            "project created"
        );
        Ok(project)
    }

    /// Removes a project from `group_id` and returns it as it was.
    ///
    /// - hard: the project's pipeline pointers are discarded with it.
    /// - soft: they are appended to the secured project first, receiving new
    ///   pointer ids there.
    ///
    /// Asking to remove the secured project from the secured group is *not*
    /// an error: nothing changes and `Ok(None)` is returned. This deliberately differs from
    /// [`Registry::delete_project_group`], which rejects its secured entity
    /// with `SecuredEntity`. Reconcile both together if either changes.
    pub fn delete_project(
        &self,
        group_id: GroupId,
        project_id: ProjectId,
        hard: bool,
    ) -> Result<Option<Project>, RegistryError> {
        let removed = self.store.with_exclusive_access(|registry| {
            let group = registry
                .group(group_id)
                .ok_or_else(|| RegistryError::not_found(Entity::ProjectGroup, group_id))?;
            if group.project(project_id).is_none() {
                return Err(RegistryError::not_found(Entity::Project, project_id));
            }
            if project_id == SECURED_PROJECT_ID {
                return Ok(None);
            }

            let removed = registry
                .remove_project(project_id)
                .ok_or_else(|| RegistryError::not_found(Entity::Project, project_id))?;
            if !hard && !removed.pipelines.is_empty() {
                let secured = registry
                    .project_mut(SECURED_PROJECT_ID)
                    .ok_or_else(|| RegistryError::not_found(Entity::Project, SECURED_PROJECT_ID))?;
                for pointer in removed.pipelines.values() {
                    secured.adopt_pointer(pointer.clone()).ok_or(RegistryError::IdsExhausted {
                        entity: Entity::PipelinePointer,
                    })?;
                }
            }
            Ok(Some(removed))
        })?;

        match &removed {
            Some(project) => tracing::info!(
                group_id = %group_id,
                project_id = %project.id,
                hard,
                pipelines = project.pipelines.len(),
                "project removed"
            ),
            None => tracing::warn!(project_id = %project_id, "removal of secured project denied"),
        }
        Ok(removed)
    }

    /// Renames a project. Returns `NameConflict` if a sibling project in the
    /// same group already uses `name`, and `SecuredEntity` when the secured
    /// project would lose its `other` name.
    pub fn rename_project(
        &self,
        project_id: ProjectId,
        name: impl Into<String>,
    ) -> Result<Project, RegistryError> {
        let name = name.into();
        self.edit_project(
            project_id,
            |registry| {
                if project_id == SECURED_PROJECT_ID && name != SECURED_NAME {
                    return Err(RegistryError::SecuredEntity {
                        entity: Entity::Project,
                        id: project_id.0,
                    });
                }
                let siblings = registry
                    .project_owner(project_id)
                    .and_then(|group| registry.group(group));
                let taken = siblings.is_some_and(|group| {
                    group.projects.values().any(|p| p.id != project_id && p.name == name)
                });
                if taken {
                    return Err(RegistryError::name_conflict(Entity::Project, name.clone()));
                }
                Ok(())
            },
            |project| project.name = name.clone(),
        )
    }

    pub fn change_project_tag(
        &self,
        project_id: ProjectId,
        tag: impl Into<String>,
    ) -> Result<Project, RegistryError> {
        let tag = tag.into();
        self.edit_project(project_id, |_| Ok(()), |project| project.tag = Some(tag))
    }

    pub fn change_project_description(
        &self,
        project_id: ProjectId,
        description: impl Into<String>,
    ) -> Result<Project, RegistryError> {
        let description = description.into();
        self.edit_project(
            project_id,
            |_| Ok(()),
            |project| project.description = Some(description),
        )
    }

    fn edit_project<C, A>(
        &self,
        project_id: ProjectId,
        check: C,
        apply: A,
    ) -> Result<Project, RegistryError>
    where
        C: FnOnce(&RegistryFile) -> Result<(), RegistryError>,
        A: FnOnce(&mut Project),
    {
        let project = self.store.with_exclusive_access(|registry| {
            if registry.project(project_id).is_none() {
                return Err(RegistryError::not_found(Entity::Project, project_id));
            }
            check(registry)?;
            let project = registry
                .project_mut(project_id)
                .ok_or_else(|| RegistryError::not_found(Entity::Project, project_id))?;
            apply(project);
            project.touch();
            Ok(project.clone())
        })?;
        tracing::info!(project_id = %project.id, "project modified");
        Ok(project)
    }
}
