//! Pipeline pointer creation, removal and edits.

use std::path::PathBuf;

use chrono::{TimeZone, Utc};
use easeci_core::{
    NewProject, PipelineId, PipelineMetadata, PipelinePointerId, ProjectId, Reason, Registry,
    RegistryError, SECURED_GROUP_ID, SECURED_PROJECT_ID,
};
use rstest::{fixture, rstest};

struct Workspace {
    _home: assert_fs::TempDir,
    registry: Registry,
}

#[fixture]
fn workspace() -> Workspace {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let registry = Registry::open_at(home.path()).expect("open registry");
    Workspace {
        _home: home,
        registry,
    }
}

fn metadata(project_id: ProjectId, pipeline_id: &str, name: &str) -> PipelineMetadata {
    PipelineMetadata {
        pipeline_id: PipelineId::from(pipeline_id),
        project_id,
        name: name.to_string(),
        tag: Some("Tag v1.0".to_string()),
        description: Some("Builds the service".to_string()),
        created_date: Utc.with_ymd_and_hms(2020, 11, 22, 10, 0, 0).unwrap(),
        easefile_path: PathBuf::from("/ws/easefiles/Easefile"),
        pipeline_file_path: PathBuf::from(format!("/ws/pipelines/{pipeline_id}.pipe")),
    }
}

fn pointer_count(registry: &Registry, project_id: ProjectId) -> usize {
    registry
        .project(project_id)
        .expect("read")
        .expect("project")
        .pipelines
        .len()
}

// ---------------------------------------------------------------------------
// 1. Create
// ---------------------------------------------------------------------------

#[rstest]
fn create_copies_metadata_verbatim(workspace: Workspace) {
    let registry = &workspace.registry;
    let meta = metadata(SECURED_PROJECT_ID, "P1", "build");

    let pointer = registry.create_pipeline_pointer(meta.clone()).expect("create");
    assert_eq!(pointer.pipeline_pointer_id, PipelinePointerId(0));
    assert_eq!(pointer.project_id, meta.project_id);
    assert_eq!(pointer.pipeline_id, meta.pipeline_id);
    assert_eq!(pointer.name, meta.name);
    assert_eq!(pointer.tag, meta.tag);
    assert_eq!(pointer.description, meta.description);
    assert_eq!(pointer.created_date, meta.created_date);
    assert_eq!(pointer.easefile_path, meta.easefile_path);
    assert_eq!(pointer.pipeline_file_path, meta.pipeline_file_path);

    assert_eq!(pointer_count(registry, SECURED_PROJECT_ID), 1);
    let stored = registry
        .pipeline_pointer(SECURED_PROJECT_ID, PipelinePointerId(0))
        .expect("read");
    assert_eq!(stored, Some(pointer));
}

#[rstest]
fn duplicate_pipeline_id_is_rejected(workspace: Workspace) {
    let registry = &workspace.registry;
    registry
        .create_pipeline_pointer(metadata(SECURED_PROJECT_ID, "P1", "build"))
        .expect("first");

    let err = registry
        .create_pipeline_pointer(metadata(SECURED_PROJECT_ID, "P1", "Another test name"))
        .unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateId { .. }), "got: {err}");
    assert_eq!(err.reason(), Some(Reason::DuplicateId));
    assert_eq!(pointer_count(registry, SECURED_PROJECT_ID), 1);
}

#[rstest]
fn duplicate_pipeline_id_in_other_project_is_rejected(workspace: Workspace) {
    let registry = &workspace.registry;
    let project = registry
        .create_project(NewProject {
            group_id: SECURED_GROUP_ID,
            name: "svc".into(),
            tag: None,
            description: None,
        })
        .expect("project");
    registry
        .create_pipeline_pointer(metadata(SECURED_PROJECT_ID, "P1", "build"))
        .expect("first");

    let err = registry
        .create_pipeline_pointer(metadata(project.id, "P1", "build"))
        .unwrap_err();
    assert_eq!(err.reason(), Some(Reason::DuplicateId), "got: {err}");
    assert_eq!(pointer_count(registry, project.id), 0);
}

#[rstest]
fn duplicate_name_in_project_is_name_conflict(workspace: Workspace) {
    let registry = &workspace.registry;
    registry
        .create_pipeline_pointer(metadata(SECURED_PROJECT_ID, "P1", "build"))
        .expect("first");

    let err = registry
        .create_pipeline_pointer(metadata(SECURED_PROJECT_ID, "P2", "build"))
        .unwrap_err();
    assert!(matches!(err, RegistryError::NameConflict { .. }), "got: {err}");
    assert_eq!(pointer_count(registry, SECURED_PROJECT_ID), 1);
}

#[rstest]
fn unknown_project_is_not_found(workspace: Workspace) {
    let registry = &workspace.registry;
    let err = registry
        .create_pipeline_pointer(metadata(ProjectId(3), "P1", "build"))
        .unwrap_err();
    assert!(matches!(err, RegistryError::NotFound { id: 3, .. }), "got: {err}");
    assert_eq!(registry.snapshot().expect("snapshot").pointer_count(), 0);
}

#[rstest]
fn pointer_ids_are_never_reused(workspace: Workspace) {
    let registry = &workspace.registry;
    for (i, id) in ["P1", "P2", "P3"].into_iter().enumerate() {
        let pointer = registry
            .create_pipeline_pointer(metadata(SECURED_PROJECT_ID, id, &format!("p{i}")))
            .expect("create");
        assert_eq!(pointer.pipeline_pointer_id, PipelinePointerId(i as u64));
    }
    registry
        .delete_pipeline_pointer(SECURED_PROJECT_ID, PipelinePointerId(2))
        .expect("delete");

    let next = registry
        .create_pipeline_pointer(metadata(SECURED_PROJECT_ID, "P4", "p4"))
        .expect("create");
    assert_eq!(next.pipeline_pointer_id, PipelinePointerId(3));
}

// ---------------------------------------------------------------------------
// 2. Delete
// ---------------------------------------------------------------------------

#[rstest]
fn delete_returns_removed_pointer(workspace: Workspace) {
    let registry = &workspace.registry;
    let pointer = registry
        .create_pipeline_pointer(metadata(SECURED_PROJECT_ID, "P1", "build"))
        .expect("create");

    let removed = registry
        .delete_pipeline_pointer(SECURED_PROJECT_ID, PipelinePointerId(0))
        .expect("delete");
    assert_eq!(removed, pointer);
    assert_eq!(pointer_count(registry, SECURED_PROJECT_ID), 0);
    assert!(!registry
        .snapshot()
        .expect("snapshot")
        .contains_pipeline(&PipelineId::from("P1")));
}

#[rstest]
#[case::unknown_pointer(SECURED_PROJECT_ID, PipelinePointerId(10))]
#[case::unknown_project(ProjectId(1), PipelinePointerId(0))]
fn delete_missing_is_not_found(
    workspace: Workspace,
    #[case] project_id: ProjectId,
    #[case] pointer_id: PipelinePointerId,
) {
    let registry = &workspace.registry;
    registry
        .create_pipeline_pointer(metadata(SECURED_PROJECT_ID, "P1", "build"))
        .expect("create");

    let err = registry
        .delete_pipeline_pointer(project_id, pointer_id)
        .unwrap_err();
    assert_eq!(err.reason(), Some(Reason::NotFound), "got: {err}");
    assert_eq!(pointer_count(registry, SECURED_PROJECT_ID), 1);
}

// ---------------------------------------------------------------------------
// 3. Edit
// ---------------------------------------------------------------------------

#[rstest]
fn rename_tag_and_describe(workspace: Workspace) {
    let registry = &workspace.registry;
    registry
        .create_pipeline_pointer(metadata(SECURED_PROJECT_ID, "P1", "build"))
        .expect("create");
    let id = PipelinePointerId(0);

    let renamed = registry
        .rename_pipeline_pointer(SECURED_PROJECT_ID, id, "New pipeline name")
        .expect("rename");
    assert_eq!(renamed.name, "New pipeline name");

    let tagged = registry
        .change_pipeline_pointer_tag(SECURED_PROJECT_ID, id, "Tag v2.0")
        .expect("tag");
    assert_eq!(tagged.tag.as_deref(), Some("Tag v2.0"));

    let described = registry
        .change_pipeline_pointer_description(
            SECURED_PROJECT_ID,
            id,
            "This is new description of this pipeline.",
        )
        .expect("describe");
    assert_eq!(
        described.description.as_deref(),
        Some("This is new description of this pipeline.")
    );
    assert_eq!(described.name, "New pipeline name");

    let stored = registry
        .pipeline_pointer(SECURED_PROJECT_ID, id)
        .expect("read")
        .expect("present");
    assert_eq!(stored, described);
}

#[rstest]
fn rename_to_sibling_name_is_name_conflict(workspace: Workspace) {
    let registry = &workspace.registry;
    registry
        .create_pipeline_pointer(metadata(SECURED_PROJECT_ID, "P1", "build"))
        .expect("create");
    registry
        .create_pipeline_pointer(metadata(SECURED_PROJECT_ID, "P2", "deploy"))
        .expect("create");

    let err = registry
        .rename_pipeline_pointer(SECURED_PROJECT_ID, PipelinePointerId(1), "build")
        .unwrap_err();
    assert_eq!(err.reason(), Some(Reason::NameConflict), "got: {err}");
}

#[rstest]
fn edit_missing_pointer_is_not_found(workspace: Workspace) {
    let registry = &workspace.registry;
    let err = registry
        .change_pipeline_pointer_tag(SECURED_PROJECT_ID, PipelinePointerId(0), "x")
        .unwrap_err();
    assert!(matches!(err, RegistryError::NotFound { .. }), "got: {err}");
}
