//! Project group operations.

use crate::error::{Entity, RegistryError};
use crate::types::{
    GroupId, NewProjectGroup, ProjectGroup, RegistryFile, SECURED_GROUP_ID, SECURED_NAME,
};

use super::Registry;

impl Registry {
    /// Creates an empty project group. Its id is the current group count.
    ///
    /// Returns `NameConflict` if a group with the same (case-sensitive) name
    /// already exists.
    pub fn create_project_group(
        &self,
        request: NewProjectGroup,
    ) -> Result<ProjectGroup, RegistryError> {
        let group = self.store.with_exclusive_access(|registry| {
            if registry.has_group_named(&request.name) {
                return Err(RegistryError::name_conflict(Entity::ProjectGroup, request.name));
            }
            let id = registry.next_group_id().ok_or(RegistryError::IdsExhausted {
                entity: Entity::ProjectGroup,
            })?;
            let group = ProjectGroup::new(
                id,
                request.name,
                request.tag,
                request.description,
            );
            registry.insert_group(group.clone());
            Ok(group)
        })?;
        tracing::info!(group_id = %group.id, name = %group.name, "project group created");
        Ok(group)
    }

    /// Removes a project group and returns it as it was before removal.
    ///
    /// - hard: its projects and their pipeline pointers are discarded.
    /// - soft: its projects, pointers included, are appended to the secured
    ///   group before the group itself is removed.
    ///
    /// Returns `NotFound` for an unknown id and `SecuredEntity` for the
    /// secured group. Compare [`Registry::delete_project`], which treats its
    /// secured entity as a silent no-op instead.
    pub fn delete_project_group(
        &self,
        group_id: GroupId,
        hard: bool,
    ) -> Result<ProjectGroup, RegistryError> {
        let removed = self.store.with_exclusive_access(|registry| {
            if registry.group(group_id).is_none() {
                return Err(RegistryError::not_found(Entity::ProjectGroup, group_id));
            }
            if group_id == SECURED_GROUP_ID {
                return Err(RegistryError::SecuredEntity {
                    entity: Entity::ProjectGroup,
                    id: group_id.0,
                });
            }

            let removed = registry
                .remove_group(group_id)
                .ok_or_else(|| RegistryError::not_found(Entity::ProjectGroup, group_id))?;
            if !hard {
                for project in removed.projects.values() {
                    registry.insert_project(SECURED_GROUP_ID, project.clone());
                }
            }
            Ok(removed)
        })?;
        tracing::info!(
            group_id = %removed.id,
            hard,
            projects = removed.projects.len(),
            "project group removed"
        );
        Ok(removed)
    }

    /// Renames a project group. Returns `NameConflict` if another group
    /// already uses `name`, and `SecuredEntity` when the secured group would
    /// lose its `other` name.
    pub fn rename_project_group(
        &self,
        group_id: GroupId,
        name: impl Into<String>,
    ) -> Result<ProjectGroup, RegistryError> {
        let name = name.into();
        self.edit_group(
            group_id,
            |registry| {
                if group_id == SECURED_GROUP_ID && name != SECURED_NAME {
                    return Err(RegistryError::SecuredEntity {
                        entity: Entity::ProjectGroup,
                        id: group_id.0,
                    });
                }
                if registry.groups().any(|g| g.id != group_id && g.name == name) {
                    return Err(RegistryError::name_conflict(Entity::ProjectGroup, name.clone()));
                }
                Ok(())
            },
            |group| group.name = name.clone(),
        )
    }

    pub fn change_project_group_tag(
        &self,
        group_id: GroupId,
        tag: impl Into<String>,
    ) -> Result<ProjectGroup, RegistryError> {
        let tag = tag.into();
        self.edit_group(group_id, |_| Ok(()), |group| group.tag = Some(tag))
    }

    pub fn change_project_group_description(
        &self,
        group_id: GroupId,
        description: impl Into<String>,
    ) -> Result<ProjectGroup, RegistryError> {
        let description = description.into();
        self.edit_group(group_id, |_| Ok(()), |group| group.description = Some(description))
    }

    /// Validates with `check`, then applies `apply` to the group in place and
    /// stamps its last-modified date.
    fn edit_group<C, A>(
        &self,
        group_id: GroupId,
        check: C,
        apply: A,
    ) -> Result<ProjectGroup, RegistryError>
    where
        C: FnOnce(&RegistryFile) -> Result<(), RegistryError>,
        A: FnOnce(&mut ProjectGroup),
    {
        let group = self.store.with_exclusive_access(|registry| {
            if registry.group(group_id).is_none() {
                return Err(RegistryError::not_found(Entity::ProjectGroup, group_id));
            }
            check(registry)?;
            let group = registry
                .group_mut(group_id)
                .ok_or_else(|| RegistryError::not_found(Entity::ProjectGroup, group_id))?;
            apply(group);
            group.touch();
            Ok(group.clone())
        })?;
        tracing::info!(group_id = %group.id, "project group modified");
        Ok(group)
    }
}
