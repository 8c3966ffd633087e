//! End-to-end scenarios and concurrent access against one registry.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use chrono::Utc;
use easeci_core::{
    GroupId, NewProject, NewProjectGroup, PipelineId, PipelineMetadata, PipelinePointerId,
    ProjectId, Reason, Registry, RegistryError, SECURED_GROUP_ID, SECURED_NAME,
    SECURED_PROJECT_ID,
};

fn metadata(project_id: ProjectId, pipeline_id: &str, name: &str) -> PipelineMetadata {
    PipelineMetadata {
        pipeline_id: PipelineId::from(pipeline_id),
        project_id,
        name: name.to_string(),
        tag: None,
        description: None,
        created_date: Utc::now(),
        easefile_path: PathBuf::from("/ws/Easefile"),
        pipeline_file_path: PathBuf::from(format!("/ws/{pipeline_id}.pipe")),
    }
}

#[test]
fn pointer_in_initial_state_then_duplicate() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let registry = Registry::open_at(home.path()).expect("open");

    let snapshot = registry.snapshot().expect("snapshot");
    assert_eq!(snapshot.group_count(), 1);
    assert_eq!(snapshot.secured_group().expect("group").name, SECURED_NAME);
    assert_eq!(snapshot.secured_project().expect("project").name, SECURED_NAME);
    assert_eq!(snapshot.pointer_count(), 0);

    let pointer = registry
        .create_pipeline_pointer(metadata(SECURED_PROJECT_ID, "P1", "build"))
        .expect("create");
    assert_eq!(pointer.pipeline_pointer_id, PipelinePointerId(0));
    let other = registry.project(SECURED_PROJECT_ID).expect("read").expect("other");
    assert_eq!(other.pipelines.len(), 1);

    let err = registry
        .create_pipeline_pointer(metadata(SECURED_PROJECT_ID, "P1", "build"))
        .unwrap_err();
    assert_eq!(err.reason(), Some(Reason::DuplicateId));
    assert_eq!(registry.snapshot().expect("snapshot").pointer_count(), 1);
}

#[test]
fn group_with_project_soft_deleted() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let registry = Registry::open_at(home.path()).expect("open");

    let group = registry
        .create_project_group(NewProjectGroup {
            name: "team-a".into(),
            ..Default::default()
        })
        .expect("group");
    assert_eq!(group.id, GroupId(1));
    assert!(group.projects.is_empty());

    let project = registry
        .create_project(NewProject {
            group_id: group.id,
            name: "svc".into(),
            tag: None,
            description: None,
        })
        .expect("project");
    assert_eq!(project.id, ProjectId(1));
    assert!(project.pipelines.is_empty());

    registry.delete_project_group(group.id, false).expect("soft delete");

    let snapshot = registry.snapshot().expect("snapshot");
    assert_eq!(snapshot.group_count(), 1);
    let other = snapshot.secured_group().expect("other");
    let names: Vec<&str> = other.projects.values().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec![SECURED_NAME, "svc"]);
}

#[test]
fn missing_pointer_under_valid_project() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let registry = Registry::open_at(home.path()).expect("open");
    registry
        .create_pipeline_pointer(metadata(SECURED_PROJECT_ID, "P1", "build"))
        .expect("create");

    let err = registry
        .delete_pipeline_pointer(SECURED_PROJECT_ID, PipelinePointerId(7))
        .unwrap_err();
    assert!(matches!(err, RegistryError::NotFound { id: 7, .. }), "got: {err}");
    let other = registry.project(SECURED_PROJECT_ID).expect("read").expect("other");
    assert_eq!(other.pipelines.len(), 1);
}

#[test]
fn secured_entities_survive_everything() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let registry = Registry::open_at(home.path()).expect("open");

    for hard in [false, true] {
        registry.delete_project_group(SECURED_GROUP_ID, hard).unwrap_err();
        assert!(registry
            .delete_project(SECURED_GROUP_ID, SECURED_PROJECT_ID, hard)
            .expect("no error")
            .is_none());
    }

    let snapshot = registry.snapshot().expect("snapshot");
    assert!(snapshot.secured_group().is_some());
    assert!(snapshot.secured_project().is_some());
}

#[test]
fn concurrent_creators_never_collide() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 5;

    let home = assert_fs::TempDir::new().expect("tempdir");
    let registry = Arc::new(Registry::open_at(home.path()).expect("open"));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    let project = registry
                        .create_project(NewProject {
                            group_id: SECURED_GROUP_ID,
                            name: format!("svc-{t}-{i}"),
                            tag: None,
                            description: None,
                        })
                        .expect("project");
                    registry
                        .create_pipeline_pointer(metadata(
                            project.id,
                            &format!("P-{t}-{i}"),
                            "build",
                        ))
                        .expect("pointer");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread");
    }

    let snapshot = registry.snapshot().expect("snapshot");
    assert_eq!(snapshot.project_count(), 1 + THREADS * PER_THREAD);
    assert_eq!(snapshot.pointer_count(), THREADS * PER_THREAD);

    let mut ids: Vec<u64> = snapshot
        .groups()
        .flat_map(|g| g.projects.keys())
        .map(|id| id.0)
        .collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 1 + THREADS * PER_THREAD);

    registry.reset().expect("reset");
    assert_eq!(registry.snapshot().expect("reloaded"), snapshot);
}
