//! `easeci pipeline add|rm|rename|tag|describe`

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Subcommand};
use colored::Colorize;

use easeci_core::{
    PipelineId, PipelineMetadata, PipelinePointerId, ProjectId, Registry, SECURED_PROJECT_ID,
};

/// Manage pipeline pointers inside projects.
#[derive(Subcommand, Debug)]
pub enum PipelineCommand {
    /// Register a parsed pipeline under a project.
    Add(AddArgs),

    /// Remove a pipeline pointer from its project.
    Rm { project: u64, pointer: u64 },

    /// Rename a pipeline pointer.
    Rename {
        project: u64,
        pointer: u64,
        name: String,
    },

    /// Change the tag of a pipeline pointer.
    Tag {
        project: u64,
        pointer: u64,
        tag: String,
    },

    /// Change the description of a pipeline pointer.
    Describe {
        project: u64,
        pointer: u64,
        description: String,
    },
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Owning project. Defaults to the `other` project.
    #[arg(long, short = 'p', default_value_t = SECURED_PROJECT_ID.0)]
    pub project: u64,

    /// Identifier of the pipeline; must be unique across the registry.
    #[arg(long)]
    pub pipeline_id: String,

    /// Pointer name; must be unique within the project.
    #[arg(long, short = 'n')]
    pub name: String,

    /// Easefile the pipeline was parsed from.
    #[arg(long)]
    pub easefile: PathBuf,

    /// Serialized pipeline file.
    #[arg(long)]
    pub pipeline_file: PathBuf,

    #[arg(long, short = 't')]
    pub tag: Option<String>,

    #[arg(long, short = 'd')]
    pub description: Option<String>,
}

pub fn run(registry: &Registry, cmd: PipelineCommand) -> Result<()> {
    match cmd {
        PipelineCommand::Add(args) => {
            let project = args.project;
            let pointer = registry
                .create_pipeline_pointer(PipelineMetadata {
                    pipeline_id: PipelineId(args.pipeline_id),
                    project_id: ProjectId(args.project),
                    name: args.name,
                    tag: args.tag,
                    description: args.description,
                    created_date: Utc::now(),
                    easefile_path: args.easefile,
                    pipeline_file_path: args.pipeline_file,
                })
                .with_context(|| format!("failed to register pipeline in project {project}"))?;
            println!(
                "{} Registered pipeline '{}' as pointer {} in project {}",
                "✓".green(),
                pointer.name,
                pointer.pipeline_pointer_id,
                pointer.project_id
            );
        }
        PipelineCommand::Rm { project, pointer } => {
            let removed = registry
                .delete_pipeline_pointer(ProjectId(project), PipelinePointerId(pointer))
                .with_context(|| {
                    format!("failed to remove pointer {pointer} from project {project}")
                })?;
            println!(
                "{} Removed pipeline '{}' ({})",
                "✓".green(),
                removed.name,
                removed.pipeline_id
            );
        }
        PipelineCommand::Rename {
            project,
            pointer,
            name,
        } => {
            let renamed = registry
                .rename_pipeline_pointer(ProjectId(project), PipelinePointerId(pointer), name)
                .with_context(|| format!("failed to rename pointer {pointer}"))?;
            println!(
                "{} Renamed pointer {} to '{}'",
                "✓".green(),
                renamed.pipeline_pointer_id,
                renamed.name
            );
        }
        PipelineCommand::Tag {
            project,
            pointer,
            tag,
        } => {
            let tagged = registry
                .change_pipeline_pointer_tag(ProjectId(project), PipelinePointerId(pointer), tag)
                .with_context(|| format!("failed to change tag of pointer {pointer}"))?;
            println!("{} Tagged pipeline '{}'", "✓".green(), tagged.name);
        }
        PipelineCommand::Describe {
            project,
            pointer,
            description,
        } => {
            let described = registry
                .change_pipeline_pointer_description(
                    ProjectId(project),
                    PipelinePointerId(pointer),
                    description,
                )
                .with_context(|| format!("failed to change description of pointer {pointer}"))?;
            println!("{} Updated description of pipeline '{}'", "✓".green(), described.name);
        }
    }
    Ok(())
}
