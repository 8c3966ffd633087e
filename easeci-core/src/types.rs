//! Domain types for the EaseCI project registry.
//!
//! The persisted document is a nested sequence (groups → projects →
//! pipelines). In memory every level is an [`IndexMap`] keyed by id, so
//! lookups are direct while listing order stays the insertion order.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Entity, InvariantViolation};

/// Name shared by the secured group and the secured project.
pub const SECURED_NAME: &str = "other";

/// Id of the reserved, non-removable project group.
pub const SECURED_GROUP_ID: GroupId = GroupId(0);

/// Id of the reserved, non-removable project inside the secured group.
pub const SECURED_PROJECT_ID: ProjectId = ProjectId(0);

const SECURED_GROUP_DESCRIPTION: &str = "Unassigned projects";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

numeric_id!(
    /// Registry-assigned id of a project group.
    GroupId
);
numeric_id!(
    /// Registry-assigned id of a project, unique across all groups.
    ProjectId
);
numeric_id!(
    /// Per-project id of a pipeline pointer. Not to be confused with [`PipelineId`].
    PipelinePointerId
);

/// Externally assigned identifier of a parsed pipeline definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PipelineId(pub String);

impl fmt::Display for PipelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for PipelineId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PipelineId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Keyed sequences
// ---------------------------------------------------------------------------

/// An entity that carries its own id.
pub(crate) trait Keyed {
    type Key: Copy + Eq + Hash + fmt::Display;

    fn key(&self) -> Self::Key;
}

/// Serializes an id-keyed map as a plain sequence of its values and rebuilds
/// the map on the way back in, rejecting repeated ids.
mod keyed_seq {
    use indexmap::IndexMap;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::Keyed;

    pub(super) fn serialize<S, V>(map: &IndexMap<V::Key, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        V: Keyed + Serialize,
    {
        serializer.collect_seq(map.values())
    }

    pub(super) fn deserialize<'de, D, V>(deserializer: D) -> Result<IndexMap<V::Key, V>, D::Error>
    where
        D: Deserializer<'de>,
        V: Keyed + Deserialize<'de>,
    {
        let items = Vec::<V>::deserialize(deserializer)?;
        let mut map = IndexMap::with_capacity(items.len());
        for item in items {
            let key = item.key();
            if map.insert(key, item).is_some() {
                return Err(D::Error::custom(format_args!("duplicate id {key}")));
            }
        }
        Ok(map)
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// A registry record linking a project to an already-parsed pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelinePointer {
    pub project_id: ProjectId,
    pub pipeline_pointer_id: PipelinePointerId,
    pub pipeline_id: PipelineId,
    pub name: String,
    /// Location of the source definition, copied verbatim from the metadata.
    pub easefile_path: PathBuf,
    /// Location of the generated pipeline file, copied verbatim from the metadata.
    pub pipeline_file_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_date: DateTime<Utc>,
}

impl Keyed for PipelinePointer {
    type Key = PipelinePointerId;

    fn key(&self) -> PipelinePointerId {
        self.pipeline_pointer_id
    }
}

/// A project: a named, ordered collection of pipeline pointers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_date: Option<DateTime<Utc>>,
    /// Number of pointers ever created in this project; the next pointer id.
    #[serde(default)]
    pub next_pipeline_pointer_id: u64,
    #[serde(default, with = "keyed_seq")]
    pub pipelines: IndexMap<PipelinePointerId, PipelinePointer>,
}

impl Keyed for Project {
    type Key = ProjectId;

    fn key(&self) -> ProjectId {
        self.id
    }
}

impl Project {
    pub(crate) fn new(
        id: ProjectId,
        name: String,
        tag: Option<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            id,
            name,
            tag,
            description,
            created_date: Utc::now(),
            last_modified_date: None,
            next_pipeline_pointer_id: 0,
            pipelines: IndexMap::new(),
        }
    }

    /// Appends `pointer` under the next unused pointer id, rewriting its
    /// owner and id fields to point here. Returns the assigned id, or `None`
    /// once the pointer id space of this project is used up.
    pub(crate) fn adopt_pointer(&mut self, mut pointer: PipelinePointer) -> Option<PipelinePointerId> {
        let id = PipelinePointerId(self.next_pipeline_pointer_id);
        self.next_pipeline_pointer_id = self.next_pipeline_pointer_id.checked_add(1)?;
        pointer.project_id = self.id;
        pointer.pipeline_pointer_id = id;
        self.pipelines.insert(id, pointer);
        Some(id)
    }

    pub fn pipeline(&self, id: PipelinePointerId) -> Option<&PipelinePointer> {
        self.pipelines.get(&id)
    }

    pub fn has_pipeline_named(&self, name: &str) -> bool {
        self.pipelines.values().any(|p| p.name == name)
    }

    pub(crate) fn touch(&mut self) {
        self.last_modified_date = Some(Utc::now());
    }
}

/// A project group: the top level of the registry hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectGroup {
    pub id: GroupId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_date: Option<DateTime<Utc>>,
    #[serde(default, with = "keyed_seq")]
    pub projects: IndexMap<ProjectId, Project>,
}

impl Keyed for ProjectGroup {
    type Key = GroupId;

    fn key(&self) -> GroupId {
        self.id
    }
}

impl ProjectGroup {
    pub(crate) fn new(
        id: GroupId,
        name: String,
        tag: Option<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            id,
            name,
            tag,
            description,
            created_date: Utc::now(),
            last_modified_date: None,
            projects: IndexMap::new(),
        }
    }

    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        self.projects.get(&id)
    }

    pub fn has_project_named(&self, name: &str) -> bool {
        self.projects.values().any(|p| p.name == name)
    }

    pub(crate) fn touch(&mut self) {
        self.last_modified_date = Some(Utc::now());
    }
}

/// Input handed over by the pipeline-definition loader when a pipeline has
/// been parsed and must be registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineMetadata {
    pub pipeline_id: PipelineId,
    pub project_id: ProjectId,
    pub name: String,
    pub tag: Option<String>,
    pub description: Option<String>,
    pub created_date: DateTime<Utc>,
    pub easefile_path: PathBuf,
    pub pipeline_file_path: PathBuf,
}

/// Pre-validated request to create a project group.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewProjectGroup {
    pub name: String,
    pub tag: Option<String>,
    pub description: Option<String>,
}

/// Pre-validated request to create a project inside `group_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub group_id: GroupId,
    pub name: String,
    pub tag: Option<String>,
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Root aggregate
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistryDocument {
    #[serde(with = "keyed_seq")]
    project_groups: IndexMap<GroupId, ProjectGroup>,
}

/// Root of the registry: every project group, in listing order.
///
/// Only the crate mutates it, so the project → group index cannot drift
/// from the groups it describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RegistryDocument", into = "RegistryDocument")]
pub struct RegistryFile {
    groups: IndexMap<GroupId, ProjectGroup>,
    project_owner: HashMap<ProjectId, GroupId>,
}

impl RegistryFile {
    /// The seeded state: the secured `other` group holding the secured
    /// `other` project, no pipelines.
    pub fn initial_state() -> Self {
        let mut group = ProjectGroup::new(
            SECURED_GROUP_ID,
            SECURED_NAME.to_owned(),
            None,
            Some(SECURED_GROUP_DESCRIPTION.to_owned()),
        );
        let project = Project::new(SECURED_PROJECT_ID, SECURED_NAME.to_owned(), None, None);
        group.projects.insert(project.id, project);

        let mut registry = Self {
            groups: IndexMap::new(),
            project_owner: HashMap::new(),
        };
        registry.insert_group(group);
        registry
    }

    pub fn groups(&self) -> impl Iterator<Item = &ProjectGroup> {
        self.groups.values()
    }

    pub fn group(&self, id: GroupId) -> Option<&ProjectGroup> {
        self.groups.get(&id)
    }

    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        let group = self.project_owner.get(&id)?;
        self.groups.get(group)?.projects.get(&id)
    }

    /// Id of the group currently holding project `id`.
    pub fn project_owner(&self, id: ProjectId) -> Option<GroupId> {
        self.project_owner.get(&id).copied()
    }

    pub fn secured_group(&self) -> Option<&ProjectGroup> {
        self.group(SECURED_GROUP_ID)
    }

    pub fn secured_project(&self) -> Option<&Project> {
        self.project(SECURED_PROJECT_ID)
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn project_count(&self) -> usize {
        self.project_owner.len()
    }

    pub fn pointer_count(&self) -> usize {
        self.groups
            .values()
            .flat_map(|g| g.projects.values())
            .map(|p| p.pipelines.len())
            .sum()
    }

    pub fn has_group_named(&self, name: &str) -> bool {
        self.groups.values().any(|g| g.name == name)
    }

    /// Whether any project already points at `pipeline_id`.
    pub fn contains_pipeline(&self, pipeline_id: &PipelineId) -> bool {
        self.groups
            .values()
            .flat_map(|g| g.projects.values())
            .flat_map(|p| p.pipelines.values())
            .any(|pointer| &pointer.pipeline_id == pipeline_id)
    }

    /// Next group id: the current group count, or one past the highest id
    /// when that count is already taken after a removal. `None` when the
    /// highest id is `u64::MAX`.
    pub(crate) fn next_group_id(&self) -> Option<GroupId> {
        next_free_id(self.groups.keys().map(|id| id.0), self.groups.len()).map(GroupId)
    }

    /// Next project id, following the same policy as [`Self::next_group_id`]
    /// over every project in the registry.
    pub(crate) fn next_project_id(&self) -> Option<ProjectId> {
        let taken = self.project_owner.keys().map(|id| id.0);
        next_free_id(taken, self.project_owner.len()).map(ProjectId)
    }

    pub(crate) fn group_mut(&mut self, id: GroupId) -> Option<&mut ProjectGroup> {
        self.groups.get_mut(&id)
    }

    pub(crate) fn project_mut(&mut self, id: ProjectId) -> Option<&mut Project> {
        let group = self.project_owner.get(&id)?;
        self.groups.get_mut(group)?.projects.get_mut(&id)
    }

    pub(crate) fn insert_group(&mut self, group: ProjectGroup) {
        for id in group.projects.keys() {
            self.project_owner.insert(*id, group.id);
        }
        self.groups.insert(group.id, group);
    }

    /// Removes the group and forgets its projects. Order of the remaining
    /// groups is preserved.
    pub(crate) fn remove_group(&mut self, id: GroupId) -> Option<ProjectGroup> {
        let group = self.groups.shift_remove(&id)?;
        for project in group.projects.keys() {
            self.project_owner.remove(project);
        }
        Some(group)
    }

    /// Appends `project` to `group_id`; `false` if the group does not exist.
    pub(crate) fn insert_project(&mut self, group_id: GroupId, project: Project) -> bool {
        let Some(group) = self.groups.get_mut(&group_id) else {
            return false;
        };
        self.project_owner.insert(project.id, group_id);
        group.projects.insert(project.id, project);
        true
    }

    pub(crate) fn remove_project(&mut self, id: ProjectId) -> Option<Project> {
        let group = self.project_owner.remove(&id)?;
        self.groups.get_mut(&group)?.projects.shift_remove(&id)
    }
}

fn next_free_id(taken: impl Iterator<Item = u64> + Clone, count: usize) -> Option<u64> {
    let candidate = count as u64;
    if !taken.clone().any(|id| id == candidate) {
        return Some(candidate);
    }
    taken.max().map_or(Some(0), |max| max.checked_add(1))
}

impl TryFrom<RegistryDocument> for RegistryFile {
    type Error = InvariantViolation;

    fn try_from(document: RegistryDocument) -> Result<Self, Self::Error> {
        let secured = document
            .project_groups
            .get(&SECURED_GROUP_ID)
            .ok_or(InvariantViolation::MissingSecuredGroup)?;
        if secured.name != SECURED_NAME {
            return Err(InvariantViolation::SecuredNameChanged {
                entity: Entity::ProjectGroup,
                name: secured.name.clone(),
            });
        }
        let (index, _, secured_project) = secured
            .projects
            .get_full(&SECURED_PROJECT_ID)
            .ok_or(InvariantViolation::MissingSecuredProject)?;
        if secured_project.name != SECURED_NAME {
            return Err(InvariantViolation::SecuredNameChanged {
                entity: Entity::Project,
                name: secured_project.name.clone(),
            });
        }
        if index != 0 {
            return Err(InvariantViolation::SecuredProjectNotFirst);
        }

        let mut names = HashSet::new();
        let mut pipelines = HashSet::new();
        let mut project_owner = HashMap::new();
        let mut groups = document.project_groups;

        for group in groups.values_mut() {
            if !names.insert(group.name.clone()) {
                return Err(InvariantViolation::DuplicateGroupName(group.name.clone()));
            }
            for project in group.projects.values_mut() {
                if project_owner.insert(project.id, group.id).is_some() {
                    return Err(InvariantViolation::DuplicateProjectId(project.id.0));
                }
                for pointer in project.pipelines.values() {
                    if pointer.project_id != project.id {
                        return Err(InvariantViolation::DanglingPointer {
                            pointer: pointer.pipeline_pointer_id.0,
                            claimed: pointer.project_id.0,
                            actual: project.id.0,
                        });
                    }
                    if !pipelines.insert(pointer.pipeline_id.clone()) {
                        return Err(InvariantViolation::DuplicatePipelineId(
                            pointer.pipeline_id.clone(),
                        ));
                    }
                }
                // Documents written without the counter still never reuse an id.
                let floor = match project.pipelines.keys().map(|id| id.0).max() {
                    Some(max) => max
                        .checked_add(1)
                        .ok_or(InvariantViolation::PointerIdsExhausted(project.id.0))?,
                    None => 0,
                };
                project.next_pipeline_pointer_id = project.next_pipeline_pointer_id.max(floor);
            }
        }

        Ok(Self {
            groups,
            project_owner,
        })
    }
}

impl From<RegistryFile> for RegistryDocument {
    fn from(registry: RegistryFile) -> Self {
        Self {
            project_groups: registry.groups,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
